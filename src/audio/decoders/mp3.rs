use std::path::Path;

use symphonia::core::codecs::CODEC_TYPE_MP3;

use crate::audio::decoders::stream::SymphoniaStream;
use crate::audio::AudioDecoder;
use crate::error::DecodeError;
use crate::models::{AudioCodec, SampleBlock, TrackMetadata};

/// MP3 audio decoder implementation using symphonia.
///
/// Tags usually come from an ID3v2 block read during format detection. Duration
/// is only known when the stream carries a Xing/LAME header or is CBR.
pub struct Mp3Decoder {
    stream: SymphoniaStream,
}

impl Mp3Decoder {
    /// Create a new MP3 decoder for the given file path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let stream = SymphoniaStream::open(path.as_ref(), "MP3", |codec| codec == CODEC_TYPE_MP3)?;
        Ok(Self { stream })
    }
}

impl AudioDecoder for Mp3Decoder {
    fn codec(&self) -> AudioCodec {
        AudioCodec::Mp3
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
