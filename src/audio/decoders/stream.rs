use std::fs::File;
use std::path::Path;

use log::debug;
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{CodecType, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::metadata::MetadataExtractor;
use crate::error::DecodeError;
use crate::models::{SampleBlock, TrackMetadata};

/// Corrupt packets are skipped; this many in a row end the track.
const MAX_CONSECUTIVE_DECODE_ERRORS: usize = 3;

// Everything below runs while the status line is live, so problems are
// logged at debug level only.

/// Format reader + codec pair shared by every format variant.
///
/// Packets rarely line up with the caller's block size, so decoded samples
/// that do not fit into the current block are kept in `pending` and handed
/// out first on the next call.
pub struct SymphoniaStream {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    metadata: TrackMetadata,
    /// Conversion buffer and its frame capacity
    sample_buffer: Option<(u64, SampleBuffer<i16>)>,
    pending: Vec<i16>,
    pending_offset: usize,
    frames_decoded: u64,
    finished: bool,
}

impl SymphoniaStream {
    /// Detect the format of `path` and open the first track whose codec passes `accept`.
    /// `label` names the format in error messages.
    pub fn open(
        path: &Path,
        label: &str,
        accept: impl Fn(CodecType) -> bool,
    ) -> Result<Self, DecodeError> {
        let file = File::open(path).map_err(|e| DecodeError::open_failed(path, e))?;

        let media_source = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext_str) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(ext_str);
        }

        let mut opened = symphonia::default::get_probe()
            .format(&hint, media_source, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| DecodeError::open_failed(path, format!("{} format not recognised: {}", label, e)))?;

        let (track_id, codec_params) = opened
            .format
            .tracks()
            .iter()
            .find(|t| accept(t.codec_params.codec))
            .map(|t| (t.id, t.codec_params.clone()))
            .ok_or_else(|| DecodeError::open_failed(path, format!("no {} audio track found", label)))?;

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::open_failed(path, format!("{} decoder: {}", label, e)))?;

        let sample_rate = codec_params
            .sample_rate
            .filter(|rate| *rate > 0)
            .ok_or_else(|| DecodeError::open_failed(path, "stream does not declare a sample rate"))?;
        let channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .filter(|count| *count > 0)
            .ok_or_else(|| DecodeError::open_failed(path, "stream does not declare its channels"))?;

        let mut metadata = TrackMetadata::new(sample_rate, channels, codec_params.n_frames);
        MetadataExtractor::apply_leading(&mut opened.metadata, &mut metadata);
        if let Some(revision) = opened.format.metadata().skip_to_latest() {
            MetadataExtractor::apply_revision(revision, &mut metadata);
        }

        debug!(
            "Opened {} stream {}: {} Hz, {} ch, {:?} frames",
            label,
            path.display(),
            sample_rate,
            channels,
            codec_params.n_frames
        );

        Ok(Self {
            format_reader: opened.format,
            decoder,
            track_id,
            metadata,
            sample_buffer: None,
            pending: Vec::new(),
            pending_offset: 0,
            frames_decoded: 0,
            finished: false,
        })
    }

    pub fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    /// Frames handed out so far
    pub fn position_frames(&self) -> u64 {
        self.frames_decoded
    }

    /// Fill `block` with up to its capacity in frames.
    /// Returns the number of frames produced; 0 means the stream is done.
    pub fn decode_into(&mut self, block: &mut SampleBlock) -> usize {
        let channels = self.metadata.channels as usize;
        if block.channels() as usize != channels {
            debug!(
                "Block has {} channels but stream has {}; ending track",
                block.channels(),
                channels
            );
            block.clear();
            return 0;
        }

        let wanted = block.capacity_frames() * channels;
        let mut filled = 0;

        while filled < wanted {
            if self.pending_offset >= self.pending.len() && !self.refill() {
                break;
            }
            let available = &self.pending[self.pending_offset..];
            let take = available.len().min(wanted - filled);
            block.storage_mut()[filled..filled + take].copy_from_slice(&available[..take]);
            self.pending_offset += take;
            filled += take;
        }

        let frames = filled / channels;
        block.set_frames(frames);
        self.frames_decoded += frames as u64;
        frames
    }

    /// Decode the next packet of our track into `pending`. False at end of stream.
    fn refill(&mut self) -> bool {
        if self.finished {
            return false;
        }

        let mut consecutive_errors = 0;
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref err))
                    if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("End of stream after {} frames", self.frames_decoded);
                    return self.finish();
                }
                Err(SymphoniaError::ResetRequired) => {
                    debug!("Stream requires a decoder reset; ending track");
                    return self.finish();
                }
                Err(err) => {
                    debug!("Failed to read packet: {}", err);
                    return self.finish();
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    Self::store(&mut self.sample_buffer, &mut self.pending, decoded);
                    self.pending_offset = 0;
                    if self.pending.is_empty() {
                        continue;
                    }
                    return true;
                }
                Err(SymphoniaError::DecodeError(msg)) => {
                    consecutive_errors += 1;
                    debug!("Skipping corrupt packet ({}): {}", consecutive_errors, msg);
                    if consecutive_errors > MAX_CONSECUTIVE_DECODE_ERRORS {
                        return self.finish();
                    }
                }
                Err(err) => {
                    debug!("Unrecoverable decode error: {}", err);
                    return self.finish();
                }
            }
        }
    }

    fn store(
        sample_buffer: &mut Option<(u64, SampleBuffer<i16>)>,
        pending: &mut Vec<i16>,
        decoded: AudioBufferRef<'_>,
    ) {
        let spec = *decoded.spec();
        let capacity = decoded.capacity() as u64;

        let too_small = match sample_buffer {
            Some((frames, _)) => *frames < capacity,
            None => true,
        };
        if too_small {
            *sample_buffer = Some((capacity, SampleBuffer::<i16>::new(capacity, spec)));
        }

        pending.clear();
        if let Some((_, buf)) = sample_buffer.as_mut() {
            buf.copy_interleaved_ref(decoded);
            pending.extend_from_slice(buf.samples());
        }
    }

    fn finish(&mut self) -> bool {
        self.finished = true;
        self.pending.clear();
        self.pending_offset = 0;
        false
    }
}
