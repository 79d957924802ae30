use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;

use crate::config::PlayerConfig;

pub mod input;
pub mod status;
pub mod terminal;

pub use input::{Command, InputSource, KeyboardInput};
pub use status::StatusDisplay;
pub use terminal::TerminalGuard;


/// Terminal audio player for MP3, FLAC, OGG Vorbis and WAV files
#[derive(Debug, Parser)]
#[command(name = "smp")]
#[command(version)]
#[command(about = "Play audio files in the terminal")]
#[command(after_help = "Keys: space = pause/resume, n = next file, q = quit")]
pub struct CliApp {
    /// Audio files to play, in order
    #[arg(value_name = "FILE", required_unless_present = "list_devices")]
    pub files: Vec<PathBuf>,

    /// Frames decoded and written per iteration
    #[arg(long, value_name = "FRAMES")]
    pub block_frames: Option<usize>,

    /// Output device name (see --list-devices)
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,

    /// Configuration file [default: ~/.config/smp/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the available output devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Exit with status 1 if any file could not be opened
    #[arg(long)]
    pub strict: bool,
}

/// What parsing the command line resolved to
#[derive(Debug)]
pub enum Invocation {
    Run(CliApp),
    /// Help or version text, to print on stdout with exit status 0
    Info(String),
    /// Usage error, to print on stderr with exit status 1
    Usage(String),
}

impl CliApp {
    /// Parse arguments without exiting the process
    pub fn parse_from_args<I, T>(args: I) -> Invocation
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(app) => Invocation::Run(app),
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Invocation::Info(e.to_string()),
                _ => Invocation::Usage(e.to_string()),
            },
        }
    }

    /// Fold the command line flags into the loaded configuration
    pub fn apply_overrides(&self, config: &mut PlayerConfig) {
        if let Some(block_frames) = self.block_frames {
            config.block_frames = block_frames;
        }
        if let Some(device) = &self.device {
            config.preferred_device = Some(device.clone());
        }
    }
}
