use std::collections::VecDeque;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::error::TerminalError;
use crate::session::QuitFlag;

/// Transport command decoded from a single keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    Quit,
    NextTrack,
    None,
}

impl Command {
    /// Classify one input byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b' ' => Command::TogglePause,
            b'q' | b'Q' => Command::Quit,
            b'n' | b'N' => Command::NextTrack,
            // ETX, what Ctrl-C produces once the tty stops generating SIGINT
            0x03 => Command::Quit,
            _ => Command::None,
        }
    }

    fn from_key(key: &KeyEvent) -> Self {
        if key.kind == KeyEventKind::Release {
            return Command::None;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,
            KeyCode::Char(c) if c.is_ascii() => Command::from_byte(c as u8),
            _ => Command::None,
        }
    }
}

/// Source of transport commands. `poll` must return immediately.
pub trait InputSource {
    fn poll(&mut self) -> Result<Command, TerminalError>;
}

/// Keyboard poller over the raw-mode terminal
pub struct KeyboardInput {
    quit: QuitFlag,
}

impl KeyboardInput {
    pub fn new(quit: QuitFlag) -> Self {
        Self { quit }
    }
}

impl InputSource for KeyboardInput {
    fn poll(&mut self) -> Result<Command, TerminalError> {
        // Zero timeout: only consume an event that is already queued
        if !event::poll(Duration::ZERO)? {
            return Ok(Command::None);
        }

        let command = match event::read()? {
            Event::Key(key) => Command::from_key(&key),
            _ => Command::None,
        };

        if command == Command::Quit {
            self.quit.request();
        }
        Ok(command)
    }
}

/// Replays a fixed list of commands, then reports nothing.
/// Used to drive playback without a terminal.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    commands: VecDeque<Command>,
    polls: usize,
}

impl ScriptedInput {
    pub fn new(commands: impl IntoIterator<Item = Command>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
            polls: 0,
        }
    }

    /// Emit `command` on poll number `at` (0-based), `None` before it
    pub fn at(at: usize, command: Command) -> Self {
        let mut commands = vec![Command::None; at];
        commands.push(command);
        Self::new(commands)
    }

    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Result<Command, TerminalError> {
        self.polls += 1;
        Ok(self.commands.pop_front().unwrap_or(Command::None))
    }
}
