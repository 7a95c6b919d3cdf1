//! Configuration types for yt-audio-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How to handle a name collision at the output path
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCollisionAction {
    /// Overwrite the existing file (last writer wins)
    #[default]
    Overwrite,
    /// Add a numeric suffix until the name is unique
    Rename,
    /// Fail the job if the output file already exists
    Skip,
}

/// External tool paths (yt-dlp, ffmpeg)
///
/// Groups settings for the external binaries the default collaborators
/// shell out to. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Path to ffmpeg executable (auto-detected if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            ffmpeg_path: None,
            search_path: true,
        }
    }
}

/// Main configuration for the pipeline
///
/// All fields carry serde defaults, so a partial JSON document deserializes
/// into a usable configuration. The tools sub-config is flattened for a
/// nesting-free serialized form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Output directory for produced audio files (default: "./out")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum concurrent jobs; 0 means use the host's available
    /// parallelism (default: 0)
    #[serde(default)]
    pub max_concurrent_jobs: usize,

    /// Output file collision handling (default: overwrite)
    #[serde(default)]
    pub file_collision: FileCollisionAction,

    /// External tool paths
    #[serde(flatten)]
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_concurrent_jobs: 0,
            file_collision: FileCollisionAction::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "output_dir must not be empty".to_string(),
                key: Some("output_dir".to_string()),
            });
        }
        Ok(())
    }

    /// Effective worker pool size: the configured bound, or the host's
    /// available parallelism when unset
    pub fn effective_parallelism(&self) -> usize {
        if self.max_concurrent_jobs > 0 {
            self.max_concurrent_jobs
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./out")
}

fn default_true() -> bool {
    true
}
