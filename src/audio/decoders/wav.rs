use std::path::Path;

use symphonia::core::codecs::{
    CodecType, CODEC_TYPE_PCM_ALAW, CODEC_TYPE_PCM_F32LE, CODEC_TYPE_PCM_F64LE,
    CODEC_TYPE_PCM_MULAW, CODEC_TYPE_PCM_S16LE, CODEC_TYPE_PCM_S24LE, CODEC_TYPE_PCM_S32LE,
    CODEC_TYPE_PCM_U8,
};

use crate::audio::decoders::stream::SymphoniaStream;
use crate::audio::AudioDecoder;
use crate::error::DecodeError;
use crate::models::{AudioCodec, SampleBlock, TrackMetadata};

const WAV_CODECS: [CodecType; 8] = [
    CODEC_TYPE_PCM_U8,
    CODEC_TYPE_PCM_S16LE,
    CODEC_TYPE_PCM_S24LE,
    CODEC_TYPE_PCM_S32LE,
    CODEC_TYPE_PCM_F32LE,
    CODEC_TYPE_PCM_F64LE,
    CODEC_TYPE_PCM_ALAW,
    CODEC_TYPE_PCM_MULAW,
];

/// WAV (RIFF/PCM) decoder
pub struct WavDecoder {
    stream: SymphoniaStream,
}

impl WavDecoder {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let stream = SymphoniaStream::open(path.as_ref(), "WAV", |codec| WAV_CODECS.contains(&codec))?;
        Ok(Self { stream })
    }
}

impl AudioDecoder for WavDecoder {
    fn codec(&self) -> AudioCodec {
        AudioCodec::Wav
    }

    fn decode(&mut self, block: &mut SampleBlock) -> usize {
        self.stream.decode_into(block)
    }

    fn metadata(&self) -> &TrackMetadata {
        self.stream.metadata()
    }

    fn position_frames(&self) -> u64 {
        self.stream.position_frames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{capture_logs, logged_at_least};
    use tempfile::TempDir;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            for ch in 0..channels {
                writer.write_sample(((i * 7 + ch as usize) % 2000) as i16 - 1000).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_wav_metadata_from_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 2, 22050, 22050 * 2);

        let decoder = WavDecoder::new(&path).unwrap();
        let meta = decoder.metadata();
        assert_eq!(meta.sample_rate, 22050);
        assert_eq!(meta.channels, 2);
        assert_eq!(meta.total_frames, Some(44100));
        assert_eq!(meta.duration_ms(), 2000);
        assert_eq!((&meta.artist, &meta.title, &meta.album), (&None, &None, &None));
        assert_eq!(decoder.codec(), AudioCodec::Wav);
    }

    #[test]
    fn test_wav_samples_survive_decoding() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ramp.wav");
        write_wav(&path, 1, 8000, 10);

        let mut decoder = WavDecoder::new(&path).unwrap();
        let mut block = SampleBlock::new(16, 1);
        assert_eq!(decoder.decode(&mut block), 10);

        let expected: Vec<i16> = (0..10).map(|i| ((i * 7) % 2000) as i16 - 1000).collect();
        assert_eq!(block.samples(), expected.as_slice());
        assert_eq!(decoder.decode(&mut block), 0);
    }

    #[test]
    fn test_blocks_never_exceed_capacity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("long.wav");
        write_wav(&path, 2, 44100, 10_000);

        let mut decoder = WavDecoder::new(&path).unwrap();
        let mut block = SampleBlock::new(333, 2);
        let mut total = 0u64;
        loop {
            let frames = decoder.decode(&mut block);
            if frames == 0 {
                break;
            }
            assert!(frames <= 333);
            assert_eq!(block.samples().len(), frames * 2);
            total += frames as u64;
            assert_eq!(decoder.position_frames(), total);
        }
        assert_eq!(total, 10_000);
    }

    #[test]
    fn test_mismatched_block_ends_track_without_warnings() {
        capture_logs();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, 8000, 100);

        let mut decoder = WavDecoder::new(&path).unwrap();
        let mut mono = SampleBlock::new(16, 1);
        assert_eq!(decoder.decode(&mut mono), 0);
        assert!(mono.is_empty());

        // Decoder problems surface while the status line is drawn
        assert_eq!(logged_at_least(log::Level::Warn, "smp_player::audio::decoders"), 0);
        assert!(logged_at_least(log::Level::Debug, "smp_player::audio::decoders::stream") > 0);
    }
}
