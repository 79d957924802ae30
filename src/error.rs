use thiserror::Error;

/// Main player error type
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Terminal error: {0}")]
    Terminal(#[from] TerminalError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PlayerError {
    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PlayerError::Audio(err) => err.user_message(),
            PlayerError::Decode(err) => err.user_message(),
            PlayerError::Terminal(err) => err.user_message(),
            PlayerError::Config(err) => err.user_message(),
        }
    }

    /// Whether the error aborts the whole run rather than a single file
    pub fn is_fatal(&self) -> bool {
        match self {
            PlayerError::Audio(_) => true,
            PlayerError::Decode(_) => false,
            PlayerError::Terminal(_) => true,
            PlayerError::Config(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PlayerError::Audio(_) => ErrorSeverity::Critical,
            PlayerError::Decode(DecodeError::UnsupportedFormat { .. }) => ErrorSeverity::Warning,
            PlayerError::Decode(_) => ErrorSeverity::Error,
            PlayerError::Terminal(_) => ErrorSeverity::Critical,
            PlayerError::Config(_) => ErrorSeverity::Warning,
        }
    }
}

/// Error severity levels for logging and user feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }

    pub fn log_level(&self) -> log::Level {
        match self {
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error => log::Level::Error,
            ErrorSeverity::Critical => log::Level::Error,
        }
    }
}

/// Audio output errors. All of them are fatal for the run.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Unsupported parameters: {sample_rate} Hz, {channels} channel(s), {reason}")]
    UnsupportedParameters {
        sample_rate: u32,
        channels: u16,
        reason: String,
    },

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Device write failed: {0}")]
    WriteFailed(String),
}

impl AudioError {
    pub fn user_message(&self) -> String {
        match self {
            AudioError::DeviceUnavailable(msg) => {
                format!("No usable audio output device: {}", msg)
            }
            AudioError::UnsupportedParameters { sample_rate, channels, reason } => {
                format!(
                    "The audio device cannot play 16-bit {} Hz audio with {} channel(s): {}",
                    sample_rate, channels, reason
                )
            }
            AudioError::StreamError(msg) => {
                format!("Audio stream could not be controlled: {}", msg)
            }
            AudioError::WriteFailed(msg) => {
                format!("Audio playback interrupted: {}", msg)
            }
        }
    }

    /// Setup errors happen before any sample was written
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            AudioError::DeviceUnavailable(_) | AudioError::UnsupportedParameters { .. }
        )
    }
}

/// Audio decoding errors. These are local to one file.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unsupported format: {path}")]
    UnsupportedFormat { path: String },

    #[error("Failed to open {path}: {reason}")]
    OpenFailed { path: String, reason: String },
}

impl DecodeError {
    pub fn open_failed(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        DecodeError::OpenFailed {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            DecodeError::UnsupportedFormat { path } => {
                format!("{}: unsupported format (supported: mp3, flac, ogg, wav)", path)
            }
            DecodeError::OpenFailed { path, reason } => {
                format!("{}: {}", path, reason)
            }
        }
    }
}

/// Terminal setup and I/O errors
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("Failed to enter raw mode: {0}")]
    SetupFailed(std::io::Error),

    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TerminalError {
    pub fn user_message(&self) -> String {
        match self {
            TerminalError::SetupFailed(err) => {
                format!("Cannot take control of the terminal (is stdin a TTY?): {}", err)
            }
            TerminalError::Io(err) => format!("Terminal I/O failed: {}", err),
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    ConfigDirNotFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::ConfigDirNotFound => {
                "Cannot find the configuration directory".to_string()
            }
            ConfigError::IoError(err) => {
                format!("Cannot access configuration file: {}", err)
            }
            ConfigError::DeserializationError(_) => {
                "Configuration file is corrupted or has invalid format".to_string()
            }
            ConfigError::InvalidValue { field, reason } => {
                format!("Configuration value '{}' is invalid: {}", field, reason)
            }
        }
    }
}
