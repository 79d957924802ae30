use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::MoveUp;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

use crate::cli::terminal;
use crate::models::PlaybackState;

/// Narrowest bar drawn, however small the terminal
pub const MIN_BAR_WIDTH: usize = 10;

const FILL: char = '=';
const MARKER: char = '>';
const TRACK: char = '-';

/// Everything the status display shows for one frame
#[derive(Debug, Clone, Copy)]
pub struct StatusView<'a> {
    pub title: &'a str,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub state: PlaybackState,
}

/// Format milliseconds as `MM:SS`, or `H:MM:SS` from one hour up
pub fn format_time(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Progress bar of exactly `width` cells.
///
/// `current / total` of the cells are filled, the next one holds the
/// position marker and the rest are unfilled. An unknown total (0) draws
/// an empty bar.
pub fn progress_bar(current: u64, total: u64, width: usize) -> String {
    if total == 0 {
        return TRACK.to_string().repeat(width);
    }

    let filled = ((current.min(total) as u128 * width as u128) / total as u128) as usize;
    if filled >= width {
        return FILL.to_string().repeat(width);
    }

    let mut bar = String::with_capacity(width);
    bar.extend(std::iter::repeat(FILL).take(filled));
    bar.push(MARKER);
    bar.extend(std::iter::repeat(TRACK).take(width - filled - 1));
    bar
}

fn state_suffix(state: PlaybackState) -> String {
    match state {
        PlaybackState::Playing => String::new(),
        other => format!(" ({})", other.as_str()),
    }
}

/// Cut `text` to at most `max` characters
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Render the two status lines for a terminal `columns` wide.
/// Pure: no terminal access, no escape sequences.
pub fn render_lines(view: &StatusView<'_>, columns: u16, bar_width: usize) -> (String, String) {
    let columns = columns as usize;
    let elapsed = format_time(view.position_ms);
    let total = format_time(view.duration_ms);
    let suffix = state_suffix(view.state);

    // "elapsed [" + "] total" + suffix, plus one spare column so the
    // line never wraps
    let overhead = elapsed.len() + total.len() + 4 + suffix.len() + 1;
    let width = bar_width
        .min(columns.saturating_sub(overhead))
        .max(MIN_BAR_WIDTH);

    let title = truncate(view.title, columns.saturating_sub(1).max(1));
    let progress = format!(
        "{} [{}] {}{}",
        elapsed,
        progress_bar(view.position_ms, view.duration_ms, width),
        total,
        suffix
    );
    (title, progress)
}

/// In-place status display.
///
/// Each draw clears and rewrites both lines, then moves the cursor back to
/// the first one so the next draw overwrites. Draws are throttled to the
/// refresh interval unless forced.
pub struct StatusDisplay<W: Write> {
    out: W,
    bar_width: usize,
    refresh: Duration,
    columns: Option<u16>,
    last_draw: Option<Instant>,
    drawn: bool,
}

impl StatusDisplay<io::Stdout> {
    pub fn stdout(bar_width: usize, refresh: Duration) -> Self {
        Self::new(io::stdout(), bar_width, refresh)
    }
}

impl<W: Write> StatusDisplay<W> {
    pub fn new(out: W, bar_width: usize, refresh: Duration) -> Self {
        Self {
            out,
            bar_width,
            refresh,
            columns: None,
            last_draw: None,
            drawn: false,
        }
    }

    /// Render for a fixed width instead of asking the terminal
    pub fn with_columns(mut self, columns: u16) -> Self {
        self.columns = Some(columns);
        self
    }

    fn columns(&self) -> u16 {
        self.columns.unwrap_or_else(terminal::columns)
    }

    /// Redraw if forced or the refresh interval has passed.
    /// Returns whether anything was written.
    pub fn draw(&mut self, view: &StatusView<'_>, force: bool) -> io::Result<bool> {
        let due = match self.last_draw {
            Some(at) => at.elapsed() >= self.refresh,
            None => true,
        };
        if !force && !due {
            return Ok(false);
        }

        let (title, progress) = render_lines(view, self.columns(), self.bar_width);
        queue!(
            self.out,
            Print('\r'),
            Clear(ClearType::CurrentLine),
            Print(title),
            Print("\r\n"),
            Clear(ClearType::CurrentLine),
            Print(progress),
            Print('\r'),
            MoveUp(1)
        )?;
        self.out.flush()?;

        self.last_draw = Some(Instant::now());
        self.drawn = true;
        Ok(true)
    }

    /// Leave the last drawn status on screen and move below it
    pub fn commit(&mut self) -> io::Result<()> {
        if !self.drawn {
            return Ok(());
        }
        self.out.write_all(b"\r\n\r\n")?;
        self.out.flush()?;
        self.drawn = false;
        self.last_draw = None;
        Ok(())
    }

    pub fn output(&self) -> &W {
        &self.out
    }
}
