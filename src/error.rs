//! Error types for yt-audio-dl
//!
//! Two layers mirror the two failure scopes of the batch:
//! - [`Error`] covers crate-level failures (bad input files, configuration,
//!   I/O around the output directory)
//! - [`JobError`] covers failures inside a single track job, tagged with the
//!   step that produced them
//!
//! Skips (unplayable video, unknown duration) are job *outcomes*, not
//! errors; see [`crate::types::SkipReason`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for yt-audio-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for yt-audio-dl
#[derive(Debug, Error)]
pub enum Error {
    /// An input file is missing a required field or is not valid JSON.
    /// Aborts parsing of that file only; the rest of the batch proceeds.
    #[error("malformed input file {file}: {reason}")]
    MalformedInput {
        /// The input file that failed to parse
        file: PathBuf,
        /// What was wrong, naming the offending key where known
        reason: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "output_dir")
        key: Option<String>,
    },

    /// External tool missing or unrunnable (yt-dlp, ffmpeg)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Failure inside a single track job
    #[error("job error: {0}")]
    Job(#[from] JobError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Job-scoped errors, each variant naming the pipeline step it came from.
///
/// A job that hits one of these is abandoned without retry; other jobs in
/// the batch are unaffected.
#[derive(Debug, Error)]
pub enum JobError {
    /// Metadata probe against the remote source failed (network,
    /// unrecognized id, unparseable response)
    #[error("probe failed for {id}: {reason}")]
    Probe {
        /// The video id being probed
        id: String,
        /// The reason the probe failed
        reason: String,
    },

    /// Fetching the audio stream failed
    #[error("fetch failed for {id}: {reason}")]
    Fetch {
        /// The video id being fetched
        id: String,
        /// The reason the fetch failed
        reason: String,
    },

    /// The transcoder rejected or could not process the fetched file
    #[error("conversion failed for {input}: {reason}")]
    Conversion {
        /// The intermediate file that could not be converted
        input: PathBuf,
        /// The reason conversion failed
        reason: String,
    },

    /// Tag write was rejected (e.g., malformed field value)
    #[error("tagging failed for {path}: {reason}")]
    Tagging {
        /// The output file that could not be tagged
        path: PathBuf,
        /// The reason tagging failed
        reason: String,
    },

    /// A name collision at the output path, when collisions are configured
    /// as errors
    #[error("output collision at {path}: {reason}")]
    Collision {
        /// The path where the collision occurred
        path: PathBuf,
        /// The reason for the collision
        reason: String,
    },
}

impl JobError {
    /// Short machine-readable name of the step that produced this error
    pub fn step(&self) -> &'static str {
        match self {
            JobError::Probe { .. } => "probe",
            JobError::Fetch { .. } => "fetch",
            JobError::Conversion { .. } => "convert",
            JobError::Tagging { .. } => "tag",
            JobError::Collision { .. } => "collision",
        }
    }
}
