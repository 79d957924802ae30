use std::path::Path;

/// Track metadata populated by a decoder when it opens a file.
/// Immutable afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackMetadata {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Total frame count as reported by the container, if known
    pub total_frames: Option<u64>,
}

impl TrackMetadata {
    pub fn new(sample_rate: u32, channels: u16, total_frames: Option<u64>) -> Self {
        Self {
            sample_rate,
            channels,
            total_frames,
            ..Default::default()
        }
    }

    /// Duration in milliseconds, 0 when the frame count is unknown
    pub fn duration_ms(&self) -> u64 {
        match self.total_frames {
            Some(frames) => frames_to_ms(frames, self.sample_rate),
            None => 0,
        }
    }

    /// "Artist – Title", either half alone, or the bare file name
    pub fn display_name(&self, path: &Path) -> String {
        match (&self.artist, &self.title) {
            (Some(artist), Some(title)) => format!("{} – {}", artist, title),
            (Some(artist), None) => artist.clone(),
            (None, Some(title)) => title.clone(),
            (None, None) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

/// Convert a frame count to milliseconds at the given rate
pub fn frames_to_ms(frames: u64, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    (frames as u128 * 1000 / sample_rate as u128) as u64
}

/// Supported audio codecs, selected purely by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    Mp3,
    Flac,
    OggVorbis,
    Wav,
}

impl AudioCodec {
    pub const ALL: [AudioCodec; 4] = [
        AudioCodec::Mp3,
        AudioCodec::Flac,
        AudioCodec::OggVorbis,
        AudioCodec::Wav,
    ];

    /// Get the human-readable name of the codec
    pub fn name(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "MP3",
            AudioCodec::Flac => "FLAC",
            AudioCodec::OggVorbis => "OGG Vorbis",
            AudioCodec::Wav => "WAV",
        }
    }

    /// Get file extensions associated with this codec
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            AudioCodec::Mp3 => &["mp3"],
            AudioCodec::Flac => &["flac"],
            AudioCodec::OggVorbis => &["ogg", "oga"],
            AudioCodec::Wav => &["wav", "wave"],
        }
    }

    /// Case-insensitive lookup in the extension table
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|codec| codec.extensions().contains(&extension.as_str()))
    }

    /// Format detection for a path; `None` for unknown or missing extensions
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Transport state of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }
}

/// A reusable block of interleaved signed 16-bit frames.
///
/// The frame capacity is fixed at construction; decoders fill at most
/// `capacity_frames()` frames per call.
#[derive(Debug, Clone)]
pub struct SampleBlock {
    samples: Vec<i16>,
    channels: u16,
    frames: usize,
}

impl SampleBlock {
    pub fn new(capacity_frames: usize, channels: u16) -> Self {
        let channels = channels.max(1);
        Self {
            samples: vec![0; capacity_frames * channels as usize],
            channels,
            frames: 0,
        }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn capacity_frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Number of valid frames currently held
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// The valid interleaved samples
    pub fn samples(&self) -> &[i16] {
        &self.samples[..self.frames * self.channels as usize]
    }

    /// Whole backing storage, for decoders to fill before calling `set_frames`
    pub fn storage_mut(&mut self) -> &mut [i16] {
        &mut self.samples
    }

    pub fn set_frames(&mut self, frames: usize) {
        self.frames = frames.min(self.capacity_frames());
    }

    pub fn clear(&mut self) {
        self.frames = 0;
    }
}
