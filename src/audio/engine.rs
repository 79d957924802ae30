use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

use log::{debug, trace};

use crate::audio::{AudioDecoder, AudioSink};
use crate::cli::input::{Command, InputSource};
use crate::cli::status::{StatusDisplay, StatusView};
use crate::error::{PlayerError, TerminalError};
use crate::logging::PlaybackLogger;
use crate::models::{frames_to_ms, PlaybackState, SampleBlock};
use crate::session::QuitFlag;

/// Why playback of a track stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEnd {
    /// The decoder ran out of frames (or failed for good)
    Finished,
    /// The user asked for the next track
    Skipped,
    /// The user or a signal asked to quit
    Quit,
}

/// Outcome of applying one command to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Paused,
    Resumed,
    Stop(TrackEnd),
}

/// I/O collaborators for one track
pub struct PlaybackIo<'a, W: Write> {
    pub sink: &'a mut dyn AudioSink,
    pub input: &'a mut dyn InputSource,
    pub display: &'a mut StatusDisplay<W>,
    pub quit: &'a QuitFlag,
}

/// Transport state machine: Stopped, Playing, Paused.
///
/// One call to `play` runs a track from Stopped through Playing/Paused
/// back to Stopped, pulling fixed-size blocks from the decoder and writing
/// them to the sink. The sink's blocking write paces the loop.
pub struct Transport {
    state: PlaybackState,
    block_frames: usize,
    pause_poll: Duration,
    logger: PlaybackLogger,
}

impl Transport {
    pub fn new(block_frames: usize, pause_poll: Duration, logger: PlaybackLogger) -> Self {
        Self {
            state: PlaybackState::Stopped,
            block_frames: block_frames.max(1),
            pause_poll,
            logger,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Apply a command to the current state
    pub fn apply(&mut self, command: Command) -> Step {
        match (self.state, command) {
            (PlaybackState::Stopped, _) => Step::Continue,
            (_, Command::Quit) => {
                self.state = PlaybackState::Stopped;
                Step::Stop(TrackEnd::Quit)
            }
            (_, Command::NextTrack) => {
                self.state = PlaybackState::Stopped;
                Step::Stop(TrackEnd::Skipped)
            }
            (PlaybackState::Playing, Command::TogglePause) => {
                self.state = PlaybackState::Paused;
                Step::Paused
            }
            (PlaybackState::Paused, Command::TogglePause) => {
                self.state = PlaybackState::Playing;
                Step::Resumed
            }
            (_, Command::None) => Step::Continue,
        }
    }

    /// Play one track to a terminal condition.
    ///
    /// The state is Stopped again when this returns, whether it succeeded or not.
    pub fn play<W: Write>(
        &mut self,
        path: &Path,
        decoder: &mut dyn AudioDecoder,
        io: &mut PlaybackIo<'_, W>,
    ) -> Result<TrackEnd, PlayerError> {
        let result = self.run(path, decoder, io);
        self.state = PlaybackState::Stopped;
        result
    }

    fn run<W: Write>(
        &mut self,
        path: &Path,
        decoder: &mut dyn AudioDecoder,
        io: &mut PlaybackIo<'_, W>,
    ) -> Result<TrackEnd, PlayerError> {
        let metadata = decoder.metadata().clone();
        let title = metadata.display_name(path);
        let duration_ms = metadata.duration_ms();
        let mut block = SampleBlock::new(self.block_frames, metadata.channels);

        self.logger.log_track_opened(
            &path.display().to_string(),
            decoder.codec().name(),
            metadata.sample_rate,
            metadata.channels,
        );

        if !io.sink.is_started() {
            io.sink.start()?;
        }
        self.state = PlaybackState::Playing;

        let mut view = StatusView {
            title: &title,
            position_ms: 0,
            duration_ms,
            state: self.state,
        };
        io.display.draw(&view, true).map_err(TerminalError::Io)?;

        let end = loop {
            let command = if io.quit.is_set() {
                Command::Quit
            } else {
                io.input.poll()?
            };

            let position_ms = frames_to_ms(decoder.position_frames(), metadata.sample_rate);
            let step = self.apply(command);
            match step {
                Step::Stop(end) => break end,
                Step::Paused => {
                    io.sink.stop()?;
                    self.logger.log_paused(position_ms);
                }
                Step::Resumed => {
                    io.sink.start()?;
                    self.logger.log_resumed(position_ms);
                }
                Step::Continue => {}
            }

            if self.state == PlaybackState::Playing {
                let frames = decoder.decode(&mut block);
                if frames == 0 {
                    self.state = PlaybackState::Stopped;
                    break TrackEnd::Finished;
                }
                io.sink.write(&block)?;
                trace!("Wrote {} frames, position {}", frames, decoder.position_frames());
            } else {
                thread::sleep(self.pause_poll);
            }

            view.position_ms = frames_to_ms(decoder.position_frames(), metadata.sample_rate);
            view.state = self.state;
            let state_changed = step != Step::Continue;
            io.display.draw(&view, state_changed).map_err(TerminalError::Io)?;
        };

        match end {
            TrackEnd::Finished => self.logger.log_stopped("end of stream"),
            TrackEnd::Skipped => {
                // Whatever is still queued belongs to the track being left
                io.sink.flush();
                self.logger.log_skipped(&path.display().to_string());
            }
            TrackEnd::Quit => self.logger.log_stopped("quit requested"),
        }
        debug!(
            "{} ended ({:?}) after {} frames",
            path.display(),
            end,
            decoder.position_frames()
        );

        view.position_ms = frames_to_ms(decoder.position_frames(), metadata.sample_rate);
        view.state = PlaybackState::Stopped;
        io.display.draw(&view, true).map_err(TerminalError::Io)?;
        io.display.commit().map_err(TerminalError::Io)?;

        Ok(end)
    }
}
