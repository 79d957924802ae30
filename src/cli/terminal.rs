use std::io::{self, Write};

use crossterm::{cursor, execute, terminal};
use log::{debug, warn};

use crate::error::TerminalError;

/// Fallback when the terminal does not report its size
pub const DEFAULT_COLUMNS: u16 = 80;

/// Current terminal width in columns
pub fn columns() -> u16 {
    match terminal::size() {
        Ok((cols, _)) if cols > 0 => cols,
        _ => DEFAULT_COLUMNS,
    }
}

/// Puts the terminal in raw mode with a hidden cursor for as long as it lives.
///
/// Dropping the guard restores the previous mode, so every exit path out of
/// playback (including errors and panics that unwind) leaves a usable shell.
pub struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    pub fn enter() -> Result<Self, TerminalError> {
        terminal::enable_raw_mode().map_err(TerminalError::SetupFailed)?;
        let guard = Self { active: true };

        execute!(io::stdout(), cursor::Hide)?;
        debug!("Terminal switched to raw mode");
        Ok(guard)
    }

    /// Restore the terminal now. Later calls (and `Drop`) do nothing.
    pub fn restore(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, cursor::Show) {
            warn!("Failed to show cursor: {}", e);
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Failed to leave raw mode: {}", e);
        }
        let _ = stdout.flush();
        debug!("Terminal restored");
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.restore();
    }
}
