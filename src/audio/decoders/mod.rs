pub mod stream;
pub mod flac;
pub mod wav;
pub mod mp3;
pub mod ogg;

pub use flac::FlacDecoder;
pub use wav::WavDecoder;
pub use mp3::Mp3Decoder;
pub use ogg::OggDecoder;

use std::path::Path;

use crate::audio::AudioDecoder;
use crate::error::DecodeError;
use crate::models::AudioCodec;

/// Open a decoder for `path`. The variant is picked from the file extension
/// alone, once, before the file is touched.
pub fn open(path: &Path) -> Result<Box<dyn AudioDecoder>, DecodeError> {
    let codec = AudioCodec::from_path(path).ok_or_else(|| DecodeError::UnsupportedFormat {
        path: path.display().to_string(),
    })?;

    let decoder: Box<dyn AudioDecoder> = match codec {
        AudioCodec::Mp3 => Box::new(Mp3Decoder::new(path)?),
        AudioCodec::Flac => Box::new(FlacDecoder::new(path)?),
        AudioCodec::OggVorbis => Box::new(OggDecoder::new(path)?),
        AudioCodec::Wav => Box::new(WavDecoder::new(path)?),
    };

    Ok(decoder)
}
