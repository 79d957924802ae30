pub mod engine;
pub mod decoders;
pub mod device;
pub mod buffer;
pub mod metadata;
pub mod sink;

use crate::error::AudioError;
use crate::models::{AudioCodec, SampleBlock, TrackMetadata};

// Re-export device management types
pub use device::{ConfigCandidate, DeviceManager};

// Re-export decoder types
pub use decoders::{FlacDecoder, Mp3Decoder, OggDecoder, WavDecoder};

// Re-export buffer and sink types
pub use buffer::{sample_queue, SampleConsumer, SampleProducer};
pub use sink::{CpalSink, CpalSinkOpener};

pub use engine::{Transport, TrackEnd};
pub use metadata::MetadataExtractor;

/// Core trait for audio decoding functionality.
///
/// A decoder owns one open file for its whole lifetime; dropping it releases
/// the file and every codec resource exactly once.
pub trait AudioDecoder {
    /// Which format variant this is
    fn codec(&self) -> AudioCodec;

    /// Fill `block` with up to `block.capacity_frames()` interleaved frames.
    /// Returns the number of frames produced; 0 signals exhaustion or an
    /// unrecoverable decode error, which callers treat alike.
    fn decode(&mut self, block: &mut SampleBlock) -> usize;

    /// Metadata populated at open time
    fn metadata(&self) -> &TrackMetadata;

    /// Frames decoded so far
    fn position_frames(&self) -> u64;
}

/// Blocking PCM output.
///
/// Streaming is started or stopped without closing the device; a stopped
/// sink keeps whatever it had queued until `flush` drops it.
pub trait AudioSink {
    /// Queue a block, blocking until the device accepted all of it
    fn write(&mut self, block: &SampleBlock) -> Result<(), AudioError>;

    fn start(&mut self) -> Result<(), AudioError>;

    fn stop(&mut self) -> Result<(), AudioError>;

    /// Wait until queued audio has been played
    fn drain(&mut self) -> Result<(), AudioError>;

    /// Drop queued audio that has not reached the device yet
    fn flush(&mut self);

    /// Release the device. Calling it again is a no-op.
    fn close(&mut self);

    fn is_started(&self) -> bool;

    fn sample_rate(&self) -> u32;

    fn channels(&self) -> u16;
}

/// Opens sinks for a given track format
pub trait SinkOpener {
    fn open(&mut self, sample_rate: u32, channels: u16) -> Result<Box<dyn AudioSink>, AudioError>;
}
