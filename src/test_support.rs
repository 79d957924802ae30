//! In-memory decoder and sink doubles shared by the unit and integration tests.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::{Mutex, Once};

use crate::audio::{AudioDecoder, AudioSink, SinkOpener};
use crate::error::AudioError;
use crate::models::{AudioCodec, SampleBlock, TrackMetadata};

/// Produces `total_frames` frames where every sample of frame `n` is `n as i16`
pub struct MockDecoder {
    metadata: TrackMetadata,
    total_frames: u64,
    produced: u64,
}

impl MockDecoder {
    pub fn new(sample_rate: u32, channels: u16, total_frames: u64) -> Self {
        Self {
            metadata: TrackMetadata::new(sample_rate, channels, Some(total_frames)),
            total_frames,
            produced: 0,
        }
    }

    pub fn with_tags(mut self, artist: &str, title: &str) -> Self {
        self.metadata.artist = Some(artist.to_string());
        self.metadata.title = Some(title.to_string());
        self
    }
}

impl AudioDecoder for MockDecoder {
    fn codec(&self) -> AudioCodec {
        AudioCodec::Wav
    }

    fn decode(&mut self, block: &mut SampleBlock) -> usize {
        let channels = block.channels() as usize;
        let remaining = (self.total_frames - self.produced) as usize;
        let frames = remaining.min(block.capacity_frames());

        let storage = block.storage_mut();
        for frame in 0..frames {
            let value = (self.produced + frame as u64) as i16;
            storage[frame * channels..(frame + 1) * channels].fill(value);
        }
        block.set_frames(frames);
        self.produced += frames as u64;
        frames
    }

    fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    fn position_frames(&self) -> u64 {
        self.produced
    }
}

/// Everything a `RecordingSink` saw
#[derive(Debug, Default)]
pub struct SinkLog {
    pub samples: Vec<i16>,
    pub writes: usize,
    pub starts: usize,
    pub stops: usize,
    pub drains: usize,
    pub flushes: usize,
    pub closes: usize,
    /// Samples written and neither drained nor flushed yet
    pub pending: usize,
    /// Fail every write after this many succeeded
    pub fail_after_writes: Option<usize>,
}

/// Sink that records instead of playing
pub struct RecordingSink {
    log: Rc<RefCell<SinkLog>>,
    sample_rate: u32,
    channels: u16,
    started: bool,
    closed: bool,
}

impl RecordingSink {
    pub fn new(sample_rate: u32, channels: u16) -> (Self, Rc<RefCell<SinkLog>>) {
        let log = Rc::new(RefCell::new(SinkLog::default()));
        let sink = Self {
            log: Rc::clone(&log),
            sample_rate,
            channels,
            started: false,
            closed: false,
        };
        (sink, log)
    }
}

impl AudioSink for RecordingSink {
    fn write(&mut self, block: &SampleBlock) -> Result<(), AudioError> {
        let mut log = self.log.borrow_mut();
        if self.closed {
            return Err(AudioError::StreamError("sink is closed".to_string()));
        }
        if !self.started {
            return Err(AudioError::StreamError("write on a stopped sink".to_string()));
        }
        if log.fail_after_writes.map_or(false, |limit| log.writes >= limit) {
            return Err(AudioError::WriteFailed("device unplugged".to_string()));
        }
        log.samples.extend_from_slice(block.samples());
        log.pending += block.samples().len();
        log.writes += 1;
        Ok(())
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.started = true;
        self.log.borrow_mut().starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.started = false;
        self.log.borrow_mut().stops += 1;
        Ok(())
    }

    fn drain(&mut self) -> Result<(), AudioError> {
        let mut log = self.log.borrow_mut();
        log.drains += 1;
        log.pending = 0;
        Ok(())
    }

    fn flush(&mut self) {
        let mut log = self.log.borrow_mut();
        log.flushes += 1;
        log.pending = 0;
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.started = false;
            self.log.borrow_mut().closes += 1;
        }
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }
}

/// Opener handing out `RecordingSink`s and keeping their logs
#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Vec<(u32, u16)>,
    pub logs: Vec<Rc<RefCell<SinkLog>>>,
    /// Refuse to open sinks for this sample rate
    pub reject_rate: Option<u32>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// All samples written across every sink opened so far
    pub fn all_samples(&self) -> Vec<i16> {
        self.logs
            .iter()
            .flat_map(|log| log.borrow().samples.clone())
            .collect()
    }
}

impl SinkOpener for RecordingOpener {
    fn open(&mut self, sample_rate: u32, channels: u16) -> Result<Box<dyn AudioSink>, AudioError> {
        if self.reject_rate == Some(sample_rate) {
            return Err(AudioError::UnsupportedParameters {
                sample_rate,
                channels,
                reason: "rejected by test opener".to_string(),
            });
        }
        let (sink, log) = RecordingSink::new(sample_rate, channels);
        self.opened.push((sample_rate, channels));
        self.logs.push(log);
        Ok(Box::new(sink))
    }
}

/// Path of a committed audio file under `tests/fixtures`
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

/// Decode until exhaustion in blocks of `block_frames`.
/// Returns the number of calls that produced frames and every sample seen.
pub fn decode_to_end(decoder: &mut dyn AudioDecoder, block_frames: usize) -> (usize, Vec<i16>) {
    let mut block = SampleBlock::new(block_frames, decoder.metadata().channels);
    let mut calls = 0;
    let mut samples = Vec::new();
    while decoder.decode(&mut block) > 0 {
        calls += 1;
        samples.extend_from_slice(block.samples());
    }
    (calls, samples)
}

/// Expected samples for `frames` frames of a `MockDecoder`
pub fn mock_samples(frames: u64, channels: u16) -> Vec<i16> {
    (0..frames)
        .flat_map(|n| std::iter::repeat(n as i16).take(channels as usize))
        .collect()
}

static LOG_RECORDS: Mutex<Vec<(log::Level, String)>> = Mutex::new(Vec::new());

/// Logger that keeps every record's level and target in memory
struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        if let Ok(mut records) = LOG_RECORDS.lock() {
            records.push((record.level(), record.target().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE_LOGGER: CaptureLogger = CaptureLogger;

/// Route `log` records of the whole test binary into memory
pub fn capture_logs() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        if log::set_logger(&CAPTURE_LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    });
}

/// Captured records from targets under `prefix` at `level` or more severe
pub fn logged_at_least(level: log::Level, prefix: &str) -> usize {
    LOG_RECORDS
        .lock()
        .map(|records| {
            records
                .iter()
                .filter(|(lvl, target)| *lvl <= level && target.starts_with(prefix))
                .count()
        })
        .unwrap_or(0)
}
