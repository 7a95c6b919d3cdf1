//! Core types for yt-audio-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::JobError;

/// Opaque identifier for a video on the remote source
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Create a new VideoId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VideoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for VideoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Descriptive metadata to embed in a produced audio file.
///
/// Unset fields are left untouched on the file, never cleared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTags {
    /// Track title
    pub title: String,

    /// Album name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    /// Track position formatted as `"<position>/<group_size>"`, 1-based
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_number: Option<String>,
}

impl TrackTags {
    /// Tags carrying only a title
    pub fn title_only(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            album: None,
            track_number: None,
        }
    }
}

/// One unit of acquisition-and-tagging work.
///
/// A pure value: never mutated after planning completes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRequest {
    /// Identifier resolvable by the remote source
    pub source_id: VideoId,

    /// Override for the output file's base name; if absent, derived from the
    /// source's reported title at fetch time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Metadata to embed; if absent, only the title tag is set, from the
    /// source's reported title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_set: Option<TrackTags>,
}

impl TrackRequest {
    /// A bare request with no name override and no tags
    pub fn bare(source_id: impl Into<VideoId>) -> Self {
        Self {
            source_id: source_id.into(),
            display_name: None,
            tag_set: None,
        }
    }
}

/// Why a job was skipped without being treated as a failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The source reported the video as unplayable
    Unplayable,
    /// The source could not report a duration for the video
    UnknownDuration,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Unplayable => write!(f, "unplayable"),
            SkipReason::UnknownDuration => write!(f, "unknown duration"),
        }
    }
}

/// Terminal result of executing one track request.
///
/// Outcomes are independent; there is no ordering relationship between the
/// outcomes of different jobs in a batch.
#[derive(Debug)]
pub enum JobOutcome {
    /// The job produced a tagged audio file at the given path
    Succeeded(PathBuf),
    /// The job was skipped before any file was produced
    Skipped(SkipReason),
    /// The job failed at some step; no retry is attempted
    Failed(JobError),
}

impl JobOutcome {
    /// Whether this outcome is a success
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded(_))
    }
}

/// One track request paired with its terminal outcome
#[derive(Debug)]
pub struct JobReport {
    /// The request that was executed
    pub request: TrackRequest,
    /// The terminal outcome
    pub outcome: JobOutcome,
}

/// Event emitted during batch and job lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// An input file was parsed into track requests
    FileParsed {
        /// The input file
        file: PathBuf,
        /// Number of track requests produced
        tracks: usize,
    },

    /// An input file could not be parsed; the rest of the batch proceeds
    ParseFailed {
        /// The input file
        file: PathBuf,
        /// Error message
        error: String,
    },

    /// A job started executing
    JobStarted {
        /// Video id of the job
        id: VideoId,
    },

    /// A job is fetching the audio stream
    Fetching {
        /// Video id of the job
        id: VideoId,
        /// Resolved output base name
        name: String,
    },

    /// A job is transcoding the fetched file
    Converting {
        /// Video id of the job
        id: VideoId,
        /// The intermediate file being converted
        input: PathBuf,
    },

    /// A job is writing tags to the produced file
    Tagging {
        /// Video id of the job
        id: VideoId,
        /// The file being tagged
        path: PathBuf,
    },

    /// A job was skipped without producing a file
    JobSkipped {
        /// Video id of the job
        id: VideoId,
        /// Why the job was skipped
        reason: SkipReason,
    },

    /// A job completed successfully
    JobCompleted {
        /// Video id of the job
        id: VideoId,
        /// Final output path
        path: PathBuf,
    },

    /// A job failed at some step
    JobFailed {
        /// Video id of the job
        id: VideoId,
        /// Step where the failure occurred
        step: String,
        /// Error message
        error: String,
    },

    /// All dispatched jobs have reached a terminal outcome
    BatchComplete {
        /// Number of jobs that succeeded
        succeeded: usize,
        /// Number of jobs that were skipped
        skipped: usize,
        /// Number of jobs that failed
        failed: usize,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_id_display_and_conversions() {
        let id = VideoId::new("dQw4w9WgXcQ");
        assert_eq!(id.to_string(), "dQw4w9WgXcQ");
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(VideoId::from("abc"), VideoId::new("abc"));
        assert_eq!(VideoId::from(String::from("abc")), VideoId::new("abc"));
    }

    #[test]
    fn video_id_serializes_transparently() {
        let id = VideoId::new("abc123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc123\"");
        let back: VideoId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn track_request_bare_has_no_name_or_tags() {
        let req = TrackRequest::bare("abc123");
        assert_eq!(req.source_id, VideoId::new("abc123"));
        assert!(req.display_name.is_none());
        assert!(req.tag_set.is_none());
    }

    #[test]
    fn track_tags_optional_fields_are_omitted_from_json() {
        let tags = TrackTags::title_only("Opener");
        let json = serde_json::to_string(&tags).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["title"], "Opener");
        assert!(parsed.get("album").is_none());
        assert!(parsed.get("track_number").is_none());
    }

    #[test]
    fn event_serializes_with_snake_case_tag() {
        let event = Event::JobSkipped {
            id: VideoId::new("abc"),
            reason: SkipReason::Unplayable,
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "job_skipped");
        assert_eq!(parsed["reason"], "unplayable");
    }

    #[test]
    fn outcome_success_predicate() {
        assert!(JobOutcome::Succeeded(PathBuf::from("/out/a.mp3")).is_success());
        assert!(!JobOutcome::Skipped(SkipReason::Unplayable).is_success());
        assert!(
            !JobOutcome::Failed(JobError::Fetch {
                id: "a".into(),
                reason: "net".into()
            })
            .is_success()
        );
    }
}
