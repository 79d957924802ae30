use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Environment variable holding the log level
pub const LOG_LEVEL_ENV: &str = "SMP_LOG_LEVEL";

/// Playback event for logging and debugging
#[derive(Debug, Clone)]
pub struct PlaybackEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: PlaybackEventType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEventType {
    TrackOpened,
    TrackSkipped,
    PlaybackPaused,
    PlaybackResumed,
    PlaybackStopped,
    FileRejected,
    DeviceOpened,
    DeviceError,
}

impl PlaybackEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackEventType::TrackOpened => "TRACK_OPENED",
            PlaybackEventType::TrackSkipped => "TRACK_SKIPPED",
            PlaybackEventType::PlaybackPaused => "PLAYBACK_PAUSED",
            PlaybackEventType::PlaybackResumed => "PLAYBACK_RESUMED",
            PlaybackEventType::PlaybackStopped => "PLAYBACK_STOPPED",
            PlaybackEventType::FileRejected => "FILE_REJECTED",
            PlaybackEventType::DeviceOpened => "DEVICE_OPENED",
            PlaybackEventType::DeviceError => "DEVICE_ERROR",
        }
    }
}

/// Logger for playback events. Keeps a bounded history next to the `log` output.
#[derive(Clone)]
pub struct PlaybackLogger {
    events: Arc<Mutex<VecDeque<PlaybackEvent>>>,
    max_events: usize,
}

impl PlaybackLogger {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            max_events: 1000,
        }
    }

    /// Initialize logging. Level comes from `SMP_LOG_LEVEL`, default `warn`
    /// so that the status line is not interleaved with chatter.
    pub fn init() -> Result<(), log::SetLoggerError> {
        let log_level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "warn".to_string());

        let mut builder = env_logger::Builder::new();

        // Raw mode turns off output post-processing; end records with CR LF
        builder.format(|buf, record| {
            use std::io::Write;
            write!(
                buf,
                "{} [{}] [{}:{}] {}\r\n",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        });

        builder.filter_level(Self::parse_level(&log_level));
        builder.try_init()?;

        info!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    /// Map a level name to a filter, falling back to `warn`
    pub fn parse_level(level: &str) -> log::LevelFilter {
        match level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            "off" => log::LevelFilter::Off,
            _ => log::LevelFilter::Warn,
        }
    }

    /// Log a playback event
    pub fn log_event(&self, event_type: PlaybackEventType, details: String) {
        match event_type {
            PlaybackEventType::TrackOpened
            | PlaybackEventType::DeviceOpened
            | PlaybackEventType::PlaybackStopped => {
                info!("[{}] {}", event_type.as_str(), details);
            }
            PlaybackEventType::PlaybackPaused
            | PlaybackEventType::PlaybackResumed
            | PlaybackEventType::TrackSkipped => {
                debug!("[{}] {}", event_type.as_str(), details);
            }
            PlaybackEventType::FileRejected => {
                warn!("[{}] {}", event_type.as_str(), details);
            }
            PlaybackEventType::DeviceError => {
                error!("[{}] {}", event_type.as_str(), details);
            }
        }

        let event = PlaybackEvent {
            timestamp: Utc::now(),
            event_type,
            details,
        };

        let mut events = self.events.lock().unwrap_or_else(|p| p.into_inner());
        events.push_back(event);
        while events.len() > self.max_events {
            events.pop_front();
        }
    }

    pub fn log_track_opened(&self, path: &str, codec: &str, sample_rate: u32, channels: u16) {
        self.log_event(
            PlaybackEventType::TrackOpened,
            format!("{} ({}, {} Hz, {} ch)", path, codec, sample_rate, channels),
        );
    }

    pub fn log_paused(&self, position_ms: u64) {
        self.log_event(
            PlaybackEventType::PlaybackPaused,
            format!("Paused at {:.2}s", position_ms as f64 / 1000.0),
        );
    }

    pub fn log_resumed(&self, position_ms: u64) {
        self.log_event(
            PlaybackEventType::PlaybackResumed,
            format!("Resumed at {:.2}s", position_ms as f64 / 1000.0),
        );
    }

    pub fn log_stopped(&self, reason: &str) {
        self.log_event(PlaybackEventType::PlaybackStopped, format!("Playback stopped: {}", reason));
    }

    pub fn log_skipped(&self, path: &str) {
        self.log_event(PlaybackEventType::TrackSkipped, format!("Skipped {}", path));
    }

    pub fn log_file_rejected(&self, reason: &str) {
        self.log_event(PlaybackEventType::FileRejected, reason.to_string());
    }

    pub fn log_device_opened(&self, sample_rate: u32, channels: u16) {
        self.log_event(
            PlaybackEventType::DeviceOpened,
            format!("Output configured for {} Hz, {} ch", sample_rate, channels),
        );
    }

    pub fn log_device_error(&self, error: &str) {
        self.log_event(PlaybackEventType::DeviceError, error.to_string());
    }

    /// Snapshot of the recorded events, oldest first
    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.events
            .lock()
            .map(|events| events.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Recorded events of one type
    pub fn events_of(&self, event_type: PlaybackEventType) -> Vec<PlaybackEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.event_type == event_type)
            .collect()
    }
}

impl Default for PlaybackLogger {
    fn default() -> Self {
        Self::new()
    }
}
