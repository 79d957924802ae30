use std::path::Path;

use symphonia::core::codecs::CODEC_TYPE_VORBIS;

use crate::audio::decoders::stream::SymphoniaStream;
use crate::audio::AudioDecoder;
use crate::error::DecodeError;
use crate::models::{AudioCodec, SampleBlock, TrackMetadata};

/// OGG Vorbis decoder. Only the Vorbis codec is accepted inside the OGG
/// container; an Opus or FLAC-in-OGG stream fails to open.
pub struct OggDecoder {
    stream: SymphoniaStream,
}

impl OggDecoder {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let stream =
            SymphoniaStream::open(path.as_ref(), "OGG Vorbis", |codec| codec == CODEC_TYPE_VORBIS)?;
        Ok(Self { stream })
    }
}

impl AudioDecoder for OggDecoder {
    fn codec(&self) -> AudioCodec {
        AudioCodec::OggVorbis
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
