use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// How long a blocked writer sleeps before trying the queue again
const WAIT_SLICE: Duration = Duration::from_millis(2);

/// Why a blocking push gave up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    /// The consumer side reported a failure
    Aborted(String),
}

/// Running sample counts shared by both halves of the queue.
///
/// `discard_until` is a position in the pushed stream: the consumer drops
/// everything before it instead of playing it.
#[derive(Debug, Default)]
struct QueueCounters {
    pushed: AtomicU64,
    popped: AtomicU64,
    discard_until: AtomicU64,
}

/// Writer half of the sample queue, owned by the main loop
pub struct SampleProducer {
    inner: HeapProd<i16>,
    counters: Arc<QueueCounters>,
    pushed: u64,
    channels: u16,
    sample_rate: u32,
}

/// Reader half of the sample queue, moved into the device callback.
/// Never blocks and never allocates.
pub struct SampleConsumer {
    inner: HeapCons<i16>,
    counters: Arc<QueueCounters>,
    popped: u64,
}

/// Create a lock-free SPSC queue of interleaved i16 samples holding
/// `capacity_frames` frames.
///
/// The producer blocks while the queue is full; this is the backpressure that
/// paces decoding to the device.
pub fn sample_queue(capacity_frames: usize, channels: u16, sample_rate: u32) -> (SampleProducer, SampleConsumer) {
    let channels = channels.max(1);
    let capacity = capacity_frames.max(1) * channels as usize;
    let (prod, cons) = HeapRb::<i16>::new(capacity).split();
    let counters = Arc::new(QueueCounters::default());

    (
        SampleProducer {
            inner: prod,
            counters: Arc::clone(&counters),
            pushed: 0,
            channels,
            sample_rate,
        },
        SampleConsumer {
            inner: cons,
            counters,
            popped: 0,
        },
    )
}

impl SampleProducer {
    /// Queue every sample of `data`, sleeping while the queue is full.
    /// `failure` is polled while blocked; when it yields a reason the push is abandoned.
    pub fn push_blocking<F>(&mut self, data: &[i16], failure: F) -> Result<(), PushError>
    where
        F: Fn() -> Option<String>,
    {
        let mut remaining = data;

        while !remaining.is_empty() {
            if let Some(reason) = failure() {
                return Err(PushError::Aborted(reason));
            }

            let written = self.inner.push_slice(remaining);
            if written == 0 {
                thread::sleep(WAIT_SLICE);
                continue;
            }

            self.pushed += written as u64;
            self.counters.pushed.store(self.pushed, Ordering::Release);
            remaining = &remaining[written..];
        }

        Ok(())
    }

    /// Samples queued and not yet played or marked for discarding
    pub fn queued_samples(&self) -> usize {
        let consumed = self
            .counters
            .popped
            .load(Ordering::Acquire)
            .max(self.counters.discard_until.load(Ordering::Acquire));
        self.pushed.saturating_sub(consumed) as usize
    }

    pub fn queued_frames(&self) -> usize {
        self.queued_samples() / self.channels as usize
    }

    /// Mark everything queued so far as stale. The consumer drops it on its
    /// next pull; samples pushed afterwards play normally.
    pub fn discard_queued(&mut self) {
        self.counters.discard_until.store(self.pushed, Ordering::Release);
    }

    /// Sleep until the consumer has taken every queued sample or `timeout` passed.
    /// Returns true when the queue is empty.
    pub fn wait_until_empty(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.queued_samples() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(WAIT_SLICE);
        }
        true
    }

    /// Get the duration of audio currently in the queue
    pub fn buffered_duration(&self) -> Duration {
        if self.sample_rate > 0 {
            Duration::from_secs_f64(self.queued_frames() as f64 / self.sample_rate as f64)
        } else {
            Duration::from_secs(0)
        }
    }
}

impl SampleConsumer {
    /// Fill `out` from the queue, padding with silence.
    /// Returns the number of real samples copied.
    pub fn pop_into(&mut self, out: &mut [i16]) -> usize {
        let discard_until = self.counters.discard_until.load(Ordering::Acquire);
        while self.popped < discard_until {
            if self.inner.try_pop().is_none() {
                break;
            }
            self.popped += 1;
        }

        let count = self.inner.pop_slice(out);
        out[count..].fill(0);

        self.popped += count as u64;
        self.counters.popped.store(self.popped, Ordering::Release);
        count
    }
}
