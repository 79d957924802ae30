use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::audio::decoders;
use crate::audio::engine::{PlaybackIo, TrackEnd, Transport};
use crate::audio::{AudioSink, SinkOpener};
use crate::cli::input::InputSource;
use crate::cli::status::StatusDisplay;
use crate::config::PlayerConfig;
use crate::error::{AudioError, PlayerError, TerminalError};
use crate::logging::PlaybackLogger;

/// Process-wide quit request.
///
/// Set from the signal handler or the keyboard, read by the playback loop
/// once per iteration. It only ever goes from false to true.
#[derive(Debug, Clone, Default)]
pub struct QuitFlag(Arc<AtomicBool>);

impl QuitFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Route SIGINT and SIGTERM to this flag instead of killing the process
    pub fn install_signal_handler(&self) -> Result<(), ctrlc::Error> {
        let flag = self.clone();
        ctrlc::set_handler(move || flag.request())
    }
}

/// What happened over a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Tracks that reached a terminal condition
    pub played: usize,
    /// Files that could not be opened, with the reason shown to the user
    pub failed: Vec<(PathBuf, String)>,
    /// The run ended on a quit request
    pub quit: bool,
}

impl RunSummary {
    /// 0, or 1 in strict mode when any file failed to open
    pub fn exit_code(&self, strict: bool) -> i32 {
        if strict && !self.failed.is_empty() {
            1
        } else {
            0
        }
    }
}

/// Plays a list of files in order.
///
/// Owns the open sink across tracks and reopens it only when the next
/// track's sample rate or channel count differs. A file that fails to open
/// is reported and skipped; sink and terminal errors end the run.
pub struct PlayerSession<O: SinkOpener> {
    opener: O,
    sink: Option<Box<dyn AudioSink>>,
    transport: Transport,
    quit: QuitFlag,
    logger: PlaybackLogger,
}

impl<O: SinkOpener> PlayerSession<O> {
    pub fn new(config: &PlayerConfig, opener: O, quit: QuitFlag, logger: PlaybackLogger) -> Self {
        Self {
            opener,
            sink: None,
            transport: Transport::new(config.block_frames, config.pause_poll(), logger.clone()),
            quit,
            logger,
        }
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Play `files` in order. `errors` receives one line per unplayable file.
    pub fn run<W: Write>(
        &mut self,
        files: &[PathBuf],
        input: &mut dyn InputSource,
        display: &mut StatusDisplay<W>,
        errors: &mut dyn Write,
    ) -> Result<RunSummary, PlayerError> {
        let result = self.play_all(files, input, display, errors);

        match &result {
            Ok(summary) if !summary.quit => self.release_sink(true),
            _ => self.release_sink(false),
        }
        result
    }

    fn play_all<W: Write>(
        &mut self,
        files: &[PathBuf],
        input: &mut dyn InputSource,
        display: &mut StatusDisplay<W>,
        errors: &mut dyn Write,
    ) -> Result<RunSummary, PlayerError> {
        let mut summary = RunSummary::default();

        for path in files {
            if self.quit.is_set() {
                summary.quit = true;
                break;
            }

            let mut decoder = match decoders::open(path) {
                Ok(decoder) => decoder,
                Err(e) => {
                    let message = e.user_message();
                    self.logger.log_file_rejected(&message);
                    write!(errors, "{}\r\n", message).map_err(TerminalError::Io)?;
                    summary.failed.push((path.clone(), message));
                    continue;
                }
            };

            let (sample_rate, channels) = {
                let metadata = decoder.metadata();
                (metadata.sample_rate, metadata.channels)
            };
            self.ensure_sink(sample_rate, channels)?;
            let sink = self
                .sink
                .as_deref_mut()
                .ok_or_else(|| AudioError::DeviceUnavailable("output was not opened".to_string()))?;

            let mut io = PlaybackIo {
                sink,
                input: &mut *input,
                display: &mut *display,
                quit: &self.quit,
            };
            let end = self.transport.play(path, decoder.as_mut(), &mut io)?;
            drop(decoder);
            summary.played += 1;

            if end == TrackEnd::Quit {
                summary.quit = true;
                break;
            }
        }

        info!(
            "Run finished: {} played, {} failed{}",
            summary.played,
            summary.failed.len(),
            if summary.quit { ", quit" } else { "" }
        );
        Ok(summary)
    }

    /// Keep the open sink if it matches, otherwise open a fresh one
    fn ensure_sink(&mut self, sample_rate: u32, channels: u16) -> Result<(), AudioError> {
        let reusable = self
            .sink
            .as_ref()
            .map_or(false, |sink| sink.sample_rate() == sample_rate && sink.channels() == channels);

        if !reusable {
            // Let the previous track finish playing before switching formats
            self.release_sink(true);

            let sink = self.opener.open(sample_rate, channels).map_err(|e| {
                self.logger.log_device_error(&e.to_string());
                e
            })?;
            self.logger.log_device_opened(sample_rate, channels);
            self.sink = Some(sink);
        } else {
            debug!("Reusing sink at {} Hz, {} ch", sample_rate, channels);
        }
        Ok(())
    }

    fn release_sink(&mut self, drain: bool) {
        if let Some(mut sink) = self.sink.take() {
            if drain {
                if let Err(e) = sink.drain() {
                    warn!("Failed to drain audio output: {}", e);
                }
            }
            sink.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::input::{Command, ScriptedInput};
    use crate::logging::PlaybackEventType;
    use crate::test_support::RecordingOpener;
    use std::time::Duration;

    fn session(opener: RecordingOpener, quit: &QuitFlag) -> (PlayerSession<RecordingOpener>, PlaybackLogger) {
        let logger = PlaybackLogger::new();
        let config = PlayerConfig {
            block_frames: 64,
            pause_poll_ms: 1,
            ..PlayerConfig::default()
        };
        (PlayerSession::new(&config, opener, quit.clone(), logger.clone()), logger)
    }

    fn display() -> StatusDisplay<Vec<u8>> {
        StatusDisplay::new(Vec::new(), 20, Duration::ZERO).with_columns(80)
    }

    #[test]
    fn test_quit_flag() {
        let flag = QuitFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_set());
        clone.request();
        assert!(flag.is_set());
        clone.request();
        assert!(flag.is_set());
    }

    #[test]
    fn test_exit_codes() {
        let mut summary = RunSummary::default();
        assert_eq!(summary.exit_code(false), 0);
        assert_eq!(summary.exit_code(true), 0);

        summary.failed.push((PathBuf::from("x.txt"), "unsupported".to_string()));
        assert_eq!(summary.exit_code(false), 0);
        assert_eq!(summary.exit_code(true), 1);
    }

    #[test]
    fn test_unplayable_files_are_reported_and_skipped() {
        let quit = QuitFlag::new();
        let (mut session, logger) = session(RecordingOpener::new(), &quit);
        let files = vec![PathBuf::from("notes.txt"), PathBuf::from("/nonexistent/a.mp3")];
        let mut errors = Vec::new();

        let summary = session
            .run(&files, &mut ScriptedInput::default(), &mut display(), &mut errors)
            .unwrap();

        assert_eq!(summary.played, 0);
        assert_eq!(summary.failed.len(), 2);
        assert!(!summary.quit);
        assert!(session.opener().opened.is_empty(), "no sink without a playable file");

        let errors = String::from_utf8(errors).unwrap();
        assert!(errors.contains("notes.txt: unsupported format"));
        assert!(errors.contains("a.mp3"));
        assert_eq!(errors.matches("\r\n").count(), 2);
        assert_eq!(logger.events_of(PlaybackEventType::FileRejected).len(), 2);
    }

    #[test]
    fn test_quit_before_start_plays_nothing() {
        let quit = QuitFlag::new();
        quit.request();
        let (mut session, _) = session(RecordingOpener::new(), &quit);

        let summary = session
            .run(
                &[PathBuf::from("notes.txt")],
                &mut ScriptedInput::new([Command::None]),
                &mut display(),
                &mut Vec::new(),
            )
            .unwrap();

        assert!(summary.quit);
        assert!(summary.failed.is_empty(), "nothing was attempted");
    }
}
