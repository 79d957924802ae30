use symphonia::core::meta::{MetadataRevision, StandardTagKey, Value};
use symphonia::core::probe::ProbedMetadata;

use crate::models::TrackMetadata;

/// Collects artist/title/album tags into `TrackMetadata`.
///
/// Tags may live in two places: metadata found ahead of the stream (ID3v2 before an MP3
/// stream) and container metadata (Vorbis comments, RIFF INFO). Missing tags
/// leave fields empty; tag problems are never errors.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Apply the latest revision found ahead of the stream, if any
    pub fn apply_leading(leading: &mut ProbedMetadata, metadata: &mut TrackMetadata) {
        if let Some(mut leading_meta) = leading.get() {
            if let Some(revision) = leading_meta.skip_to_latest() {
                Self::apply_revision(revision, metadata);
            }
        }
    }

    /// Copy recognised tags from a revision. Later revisions overwrite earlier ones.
    pub fn apply_revision(revision: &MetadataRevision, metadata: &mut TrackMetadata) {
        for tag in revision.tags() {
            let Some(std_key) = tag.std_key else { continue };
            let Some(text) = Self::text_value(&tag.value) else { continue };

            match std_key {
                StandardTagKey::Artist => metadata.artist = Some(text),
                StandardTagKey::AlbumArtist if metadata.artist.is_none() => {
                    metadata.artist = Some(text)
                }
                StandardTagKey::TrackTitle => metadata.title = Some(text),
                StandardTagKey::Album => metadata.album = Some(text),
                _ => {}
            }
        }
    }

    fn text_value(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => {
                let trimmed = s.trim_matches(char::from(0)).trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            _ => None,
        }
    }
}
