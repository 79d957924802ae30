use std::sync::{Arc, OnceLock};
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BuildStreamError, Stream};
use log::{debug, error, info};

use crate::audio::buffer::{sample_queue, PushError, SampleProducer};
use crate::audio::device::DeviceManager;
use crate::audio::{AudioSink, SinkOpener};
use crate::error::AudioError;
use crate::models::SampleBlock;

/// Blocks of headroom queued ahead of the device
const QUEUED_BLOCKS: usize = 2;

/// Extra time allowed for the device to play out its queue on drain
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// First error reported by the stream's error callback
type FailureSlot = Arc<OnceLock<String>>;

fn read_failure(slot: &FailureSlot) -> Option<String> {
    slot.get().cloned()
}

/// Output sink backed by a cpal stream.
///
/// The stream callback pulls from a lock-free sample queue; `write` blocks
/// while that queue is full, so the main loop is paced by the device.
pub struct CpalSink {
    stream: Option<Stream>,
    queue: SampleProducer,
    failure: FailureSlot,
    started: bool,
    sample_rate: u32,
    channels: u16,
}

impl CpalSink {
    /// Open `device_name` (or the default device) for 16-bit output
    pub fn open(
        device_name: Option<&str>,
        sample_rate: u32,
        channels: u16,
        block_frames: usize,
    ) -> Result<Self, AudioError> {
        let manager = DeviceManager::new();
        let device = manager.select_device(device_name)?;
        let device_label = device.name().unwrap_or_else(|_| "unknown device".to_string());

        let candidates = DeviceManager::candidates(&device)?;
        let config = crate::audio::device::negotiate(&candidates, sample_rate, channels)?;

        let (queue, mut consumer) = sample_queue(block_frames * QUEUED_BLOCKS, channels, sample_rate);
        let failure: FailureSlot = Arc::new(OnceLock::new());

        let stream = {
            let failure = Arc::clone(&failure);
            device.build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    consumer.pop_into(data);
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    let _ = failure.set(err.to_string());
                },
                None,
            )
        }
        .map_err(|e| match e {
            BuildStreamError::StreamConfigNotSupported => AudioError::UnsupportedParameters {
                sample_rate,
                channels,
                reason: "stream configuration rejected by the device".to_string(),
            },
            other => AudioError::DeviceUnavailable(format!("Failed to build output stream: {}", other)),
        })?;

        info!(
            "Opened audio device '{}' at {} Hz, {} channel(s), s16",
            device_label, sample_rate, channels
        );

        Ok(Self {
            stream: Some(stream),
            queue,
            failure,
            started: false,
            sample_rate,
            channels,
        })
    }

    fn check_failure(&self) -> Result<(), AudioError> {
        match read_failure(&self.failure) {
            Some(reason) => Err(AudioError::WriteFailed(reason)),
            None => Ok(()),
        }
    }

    fn stream(&self) -> Result<&Stream, AudioError> {
        self.stream
            .as_ref()
            .ok_or_else(|| AudioError::StreamError("sink is closed".to_string()))
    }
}

impl AudioSink for CpalSink {
    fn write(&mut self, block: &SampleBlock) -> Result<(), AudioError> {
        self.check_failure()?;
        if !self.started {
            return Err(AudioError::StreamError("write on a stopped sink".to_string()));
        }
        if block.channels() != self.channels {
            return Err(AudioError::StreamError(format!(
                "block has {} channels, sink has {}",
                block.channels(),
                self.channels
            )));
        }

        let failure = Arc::clone(&self.failure);
        self.queue
            .push_blocking(block.samples(), || read_failure(&failure))
            .map_err(|PushError::Aborted(reason)| AudioError::WriteFailed(reason))
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.check_failure()?;
        self.stream()?
            .play()
            .map_err(|e| AudioError::StreamError(format!("Failed to start stream: {}", e)))?;
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.stream()?
            .pause()
            .map_err(|e| AudioError::StreamError(format!("Failed to stop stream: {}", e)))?;
        self.started = false;
        Ok(())
    }

    fn drain(&mut self) -> Result<(), AudioError> {
        if !self.started {
            return Ok(());
        }
        let timeout = self.queue.buffered_duration() + DRAIN_GRACE;
        if !self.queue.wait_until_empty(timeout) {
            debug!("Drain timed out with {} frames queued", self.queue.queued_frames());
        }
        self.check_failure()
    }

    fn flush(&mut self) {
        self.queue.discard_queued();
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.queue.discard_queued();
            let _ = stream.pause();
            drop(stream);
            self.started = false;
            debug!("Audio device closed");
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

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Opens `CpalSink`s on a fixed device with a fixed block size
pub struct CpalSinkOpener {
    device_name: Option<String>,
    block_frames: usize,
}

impl CpalSinkOpener {
    pub fn new(device_name: Option<String>, block_frames: usize) -> Self {
        Self {
            device_name,
            block_frames,
        }
    }
}

impl SinkOpener for CpalSinkOpener {
    fn open(&mut self, sample_rate: u32, channels: u16) -> Result<Box<dyn AudioSink>, AudioError> {
        let sink = CpalSink::open(self.device_name.as_deref(), sample_rate, channels, self.block_frames)?;
        Ok(Box::new(sink))
    }
}
