//! Audio transcoding abstraction and ffmpeg implementation

use crate::config::ToolsConfig;
use crate::error::JobError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Target audio codec for a conversion
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AudioCodec {
    /// MPEG-1 Audio Layer III via libmp3lame, VBR quality 2
    #[default]
    Mp3,
}

impl AudioCodec {
    /// Encoder arguments passed to the transcoder for this codec
    pub fn encoder_args(&self) -> &'static [&'static str] {
        match self {
            AudioCodec::Mp3 => &["-codec:a", "libmp3lame", "-q:a", "2"],
        }
    }

    /// File extension for output in this codec
    pub fn extension(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
        }
    }
}

/// Abstraction over audio conversion
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Convert `input` into `output` using the given codec, returning the
    /// output path. The input file is left in place.
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        codec: AudioCodec,
    ) -> crate::Result<PathBuf>;

    /// Human-readable implementation name
    fn name(&self) -> &'static str;
}

/// Transcoder backed by the external `ffmpeg` binary
///
/// # Examples
///
/// ```no_run
/// use yt_audio_dl::transcoder::FfmpegTranscoder;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let transcoder = FfmpegTranscoder::new(PathBuf::from("/usr/bin/ffmpeg"));
///
/// // Or auto-discover from PATH
/// let transcoder = FfmpegTranscoder::from_path().expect("ffmpeg not found in PATH");
/// ```
#[derive(Debug)]
pub struct FfmpegTranscoder {
    binary_path: PathBuf,
}

impl FfmpegTranscoder {
    /// Create a new transcoder with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find ffmpeg in PATH
    pub fn from_path() -> Option<Self> {
        which::which("ffmpeg").ok().map(Self::new)
    }

    /// Build a transcoder from the tools configuration: an explicit path
    /// wins, otherwise PATH discovery when enabled
    pub fn from_config(tools: &ToolsConfig) -> crate::Result<Self> {
        if let Some(path) = &tools.ffmpeg_path {
            return Ok(Self::new(path.clone()));
        }
        if tools.search_path {
            return Self::from_path().ok_or_else(|| {
                crate::Error::ExternalTool("ffmpeg not found in PATH".to_string())
            });
        }
        Err(crate::Error::ExternalTool(
            "no ffmpeg path configured and PATH search is disabled".to_string(),
        ))
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        codec: AudioCodec,
    ) -> crate::Result<PathBuf> {
        tracing::debug!(input = %input.display(), output = %output.display(), "transcoding");

        let result = Command::new(&self.binary_path)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-vn")
            .args(codec.encoder_args())
            .arg(output)
            .output()
            .await
            .map_err(|e| {
                crate::Error::ExternalTool(format!("Failed to execute ffmpeg: {}", e))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(crate::Error::Job(JobError::Conversion {
                input: input.to_path_buf(),
                reason: stderr.trim().to_string(),
            }));
        }

        Ok(output.to_path_buf())
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mp3_codec_uses_lame_vbr_quality_two() {
        assert_eq!(
            AudioCodec::Mp3.encoder_args(),
            &["-codec:a", "libmp3lame", "-q:a", "2"]
        );
        assert_eq!(AudioCodec::Mp3.extension(), "mp3");
    }

    #[test]
    fn from_path_consistency_with_which_crate() {
        let which_result = which::which("ffmpeg");
        let from_path_result = FfmpegTranscoder::from_path();
        assert_eq!(which_result.is_ok(), from_path_result.is_some());
    }

    #[test]
    fn from_config_prefers_explicit_path() {
        let tools = ToolsConfig {
            ytdlp_path: None,
            ffmpeg_path: Some(PathBuf::from("/opt/tools/ffmpeg")),
            search_path: false,
        };
        let transcoder = FfmpegTranscoder::from_config(&tools).unwrap();
        assert_eq!(transcoder.binary_path, PathBuf::from("/opt/tools/ffmpeg"));
    }

    #[test]
    fn from_config_errors_when_search_disabled_and_no_path() {
        let tools = ToolsConfig {
            ytdlp_path: None,
            ffmpeg_path: None,
            search_path: false,
        };
        let err = FfmpegTranscoder::from_config(&tools).unwrap_err();
        assert!(matches!(err, crate::Error::ExternalTool(_)));
    }

    #[tokio::test]
    async fn convert_with_invalid_binary_path_is_an_external_tool_error() {
        let transcoder = FfmpegTranscoder::new(PathBuf::from("/nonexistent/path/to/ffmpeg"));
        let err = transcoder
            .convert(
                Path::new("/tmp/in.m4a"),
                Path::new("/tmp/out.mp3"),
                AudioCodec::Mp3,
            )
            .await
            .unwrap_err();
        match err {
            crate::Error::ExternalTool(msg) => {
                assert!(msg.contains("Failed to execute ffmpeg"));
            }
            other => panic!("expected ExternalTool error, got {other:?}"),
        }
    }
}
