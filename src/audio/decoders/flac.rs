use std::path::Path;

use symphonia::core::codecs::CODEC_TYPE_FLAC;

use crate::audio::decoders::stream::SymphoniaStream;
use crate::audio::AudioDecoder;
use crate::error::DecodeError;
use crate::models::{AudioCodec, SampleBlock, TrackMetadata};

/// FLAC decoder. STREAMINFO always carries the total sample count, so the
/// duration is known up front; tags come from the Vorbis comment block.
/// 24-bit streams are reduced to 16-bit by the sample conversion.
pub struct FlacDecoder {
    stream: SymphoniaStream,
}

impl FlacDecoder {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let stream = SymphoniaStream::open(path.as_ref(), "FLAC", |codec| codec == CODEC_TYPE_FLAC)?;
        Ok(Self { stream })
    }
}

impl AudioDecoder for FlacDecoder {
    fn codec(&self) -> AudioCodec {
        AudioCodec::Flac
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
