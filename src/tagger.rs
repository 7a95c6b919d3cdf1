//! Tag embedding abstraction and lofty implementation

use crate::error::JobError;
use crate::types::TrackTags;
use lofty::config::{ParseOptions, WriteOptions};
use lofty::file::TaggedFileExt;
use lofty::prelude::{Accessor, TagExt};
use lofty::probe::Probe;
use lofty::tag::Tag;
use std::path::Path;

/// Abstraction over metadata embedding in produced audio files
///
/// Writing is field-wise: absent fields in the tag set are left untouched
/// on the file, never cleared, so re-tagging with the same set is
/// idempotent.
pub trait Tagger: Send + Sync {
    /// Write every present field of `tags` to the file at `path`
    fn write_tags(&self, path: &Path, tags: &TrackTags) -> crate::Result<()>;

    /// Read the recognized fields back from the file at `path`
    fn read_tags(&self, path: &Path) -> crate::Result<TrackTags>;

    /// Human-readable implementation name
    fn name(&self) -> &'static str;
}

/// Parse a `"<position>/<group size>"` track number into its two parts.
fn parse_track_number(value: &str) -> Option<(u32, u32)> {
    let (pos, total) = value.split_once('/')?;
    Some((pos.parse().ok()?, total.parse().ok()?))
}

fn tagging_error(path: &Path, reason: impl std::fmt::Display) -> crate::Error {
    crate::Error::Job(JobError::Tagging {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    })
}

/// Tagger backed by the `lofty` crate
///
/// Uses the file's primary tag (ID3v2 for MP3), creating one when the
/// file carries none yet.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoftyTagger;

impl LoftyTagger {
    /// Create a new lofty-backed tagger
    pub fn new() -> Self {
        Self
    }
}

impl Tagger for LoftyTagger {
    fn write_tags(&self, path: &Path, tags: &TrackTags) -> crate::Result<()> {
        let mut tagged_file = Probe::open(path)
            .map_err(|e| tagging_error(path, e))?
            .options(ParseOptions::new().read_properties(false))
            .read()
            .map_err(|e| tagging_error(path, e))?;

        if tagged_file.primary_tag_mut().is_none() {
            let tag_type = tagged_file.primary_tag_type();
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let Some(tag) = tagged_file.primary_tag_mut() else {
            return Err(tagging_error(path, "file format accepts no tags"));
        };

        tag.set_title(tags.title.clone());
        if let Some(album) = &tags.album {
            tag.set_album(album.clone());
        }
        if let Some(track_number) = &tags.track_number {
            let (position, total) = parse_track_number(track_number).ok_or_else(|| {
                tagging_error(
                    path,
                    format!("malformed track number {track_number:?}, expected \"pos/total\""),
                )
            })?;
            tag.set_track(position);
            tag.set_track_total(total);
        }

        tag.save_to_path(path, WriteOptions::default())
            .map_err(|e| tagging_error(path, e))?;
        Ok(())
    }

    fn read_tags(&self, path: &Path) -> crate::Result<TrackTags> {
        let tagged_file = Probe::open(path)
            .map_err(|e| tagging_error(path, e))?
            .options(ParseOptions::new().read_properties(false))
            .read()
            .map_err(|e| tagging_error(path, e))?;

        let Some(tag) = tagged_file.primary_tag() else {
            return Err(tagging_error(path, "file carries no tag"));
        };

        let title = tag
            .title()
            .map(|t| t.to_string())
            .ok_or_else(|| tagging_error(path, "file carries no title tag"))?;
        let album = tag.album().map(|a| a.to_string());
        let track_number = match (tag.track(), tag.track_total()) {
            (Some(position), Some(total)) => Some(format!("{position}/{total}")),
            (Some(position), None) => Some(position.to_string()),
            _ => None,
        };

        Ok(TrackTags {
            title,
            album,
            track_number,
        })
    }

    fn name(&self) -> &'static str {
        "lofty"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Minimal valid RIFF/WAVE file: PCM fmt chunk plus a tiny data chunk.
    fn write_minimal_wav(path: &Path) {
        let mut bytes: Vec<u8> = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&44u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
        bytes.extend_from_slice(&44100u32.to_le_bytes());
        bytes.extend_from_slice(&88200u32.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn parse_track_number_accepts_pos_slash_total() {
        assert_eq!(parse_track_number("1/2"), Some((1, 2)));
        assert_eq!(parse_track_number("12/12"), Some((12, 12)));
        assert_eq!(parse_track_number("3"), None);
        assert_eq!(parse_track_number("a/b"), None);
        assert_eq!(parse_track_number(""), None);
    }

    #[test]
    fn tags_round_trip_through_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("track.wav");
        write_minimal_wav(&path);

        let tagger = LoftyTagger::new();
        let tags = TrackTags {
            title: "1. Opener".to_string(),
            album: Some("Show (vocal)".to_string()),
            track_number: Some("1/2".to_string()),
        };
        tagger.write_tags(&path, &tags).unwrap();

        let back = tagger.read_tags(&path).unwrap();
        assert_eq!(back, tags);
    }

    #[test]
    fn rewriting_the_same_tags_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("track.wav");
        write_minimal_wav(&path);

        let tagger = LoftyTagger::new();
        let tags = TrackTags {
            title: "2. Closer".to_string(),
            album: Some("Show (drums)".to_string()),
            track_number: Some("2/3".to_string()),
        };
        tagger.write_tags(&path, &tags).unwrap();
        tagger.write_tags(&path, &tags).unwrap();

        assert_eq!(tagger.read_tags(&path).unwrap(), tags);
    }

    #[test]
    fn absent_fields_leave_existing_values_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("track.wav");
        write_minimal_wav(&path);

        let tagger = LoftyTagger::new();
        tagger
            .write_tags(
                &path,
                &TrackTags {
                    title: "Original".to_string(),
                    album: Some("Album".to_string()),
                    track_number: Some("1/1".to_string()),
                },
            )
            .unwrap();

        // Title-only rewrite must not clear album or track number
        tagger
            .write_tags(&path, &TrackTags::title_only("Renamed"))
            .unwrap();

        let back = tagger.read_tags(&path).unwrap();
        assert_eq!(back.title, "Renamed");
        assert_eq!(back.album.as_deref(), Some("Album"));
        assert_eq!(back.track_number.as_deref(), Some("1/1"));
    }

    #[test]
    fn malformed_track_number_is_a_tagging_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("track.wav");
        write_minimal_wav(&path);

        let tagger = LoftyTagger::new();
        let err = tagger
            .write_tags(
                &path,
                &TrackTags {
                    title: "Bad".to_string(),
                    album: None,
                    track_number: Some("three".to_string()),
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Job(JobError::Tagging { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_tagging_error() {
        let tagger = LoftyTagger::new();
        let err = tagger
            .write_tags(
                Path::new("/nonexistent/track.mp3"),
                &TrackTags::title_only("x"),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Job(JobError::Tagging { .. })
        ));
    }
}
