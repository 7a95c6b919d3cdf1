//! Remote video source abstraction and yt-dlp implementation

use crate::config::ToolsConfig;
use crate::error::JobError;
use crate::input::WATCH_URL_PREFIX;
use crate::types::VideoId;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;

/// A resolved audio-only stream, ready to fetch.
///
/// The extension reflects the stream's native container (m4a, webm, ...)
/// and is not assumed to be MP3.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioStream {
    /// The video the stream belongs to
    pub source_id: VideoId,
    /// Source-side format selector for this stream
    pub format_id: String,
    /// Container extension the fetched file will carry
    pub extension: String,
    /// Audio bitrate in kbit/s, when the source reports one
    pub bitrate: Option<f64>,
}

/// Abstraction over the remote video-hosting source
///
/// Implementations must be `Send + Sync` so jobs can query them from a
/// bounded worker pool. All queries for one video id may be answered from
/// a single metadata probe.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Whether the source reports the video as playable
    async fn is_playable(&self, id: &VideoId) -> crate::Result<bool>;

    /// Reported duration, or `None` when the source cannot provide one
    async fn duration(&self, id: &VideoId) -> crate::Result<Option<Duration>>;

    /// The source's reported title for the video
    async fn title(&self, id: &VideoId) -> crate::Result<String>;

    /// Resolve the best audio-only stream for the video
    async fn best_audio_stream(&self, id: &VideoId) -> crate::Result<AudioStream>;

    /// Fetch the stream into `dest_dir` under `base_name`, returning the
    /// path of the fetched file (extension comes from the stream)
    async fn fetch(
        &self,
        stream: &AudioStream,
        dest_dir: &Path,
        base_name: &str,
    ) -> crate::Result<PathBuf>;

    /// Human-readable implementation name
    fn name(&self) -> &'static str;
}

/// Metadata document as reported by `yt-dlp -J`
#[derive(Clone, Debug, Deserialize)]
struct VideoInfo {
    title: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    formats: Vec<FormatInfo>,
}

#[derive(Clone, Debug, Deserialize)]
struct FormatInfo {
    format_id: String,
    ext: String,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    abr: Option<f64>,
}

fn has_codec(codec: &Option<String>) -> bool {
    matches!(codec.as_deref(), Some(c) if c != "none")
}

/// Best audio-only format: no video codec, highest reported bitrate.
fn best_audio_format(formats: &[FormatInfo]) -> Option<&FormatInfo> {
    formats
        .iter()
        .filter(|f| has_codec(&f.acodec) && !has_codec(&f.vcodec))
        .max_by(|a, b| {
            a.abr
                .unwrap_or(0.0)
                .partial_cmp(&b.abr.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Whether yt-dlp stderr reports the video itself as unplayable, as
/// opposed to a tool or network failure.
fn reports_unplayable(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("video unavailable")
        || lower.contains("private video")
        || lower.contains("this video is not available")
        || lower.contains("account associated with this video has been terminated")
}

/// Remote source backed by the external `yt-dlp` binary
///
/// Metadata is probed once per video id with `yt-dlp -J` and cached, so
/// the playability, duration, title and stream queries of one job share a
/// single subprocess invocation.
///
/// # Examples
///
/// ```no_run
/// use yt_audio_dl::source::YtDlpSource;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let source = YtDlpSource::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let source = YtDlpSource::from_path().expect("yt-dlp not found in PATH");
/// ```
#[derive(Debug)]
pub struct YtDlpSource {
    binary_path: PathBuf,
    probe_cache: Mutex<HashMap<VideoId, ProbeEntry>>,
}

#[derive(Clone, Debug)]
enum ProbeEntry {
    Available(VideoInfo),
    Unplayable,
}

impl YtDlpSource {
    /// Create a new source with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            probe_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Build a source from the tools configuration: an explicit path wins,
    /// otherwise PATH discovery when enabled
    pub fn from_config(tools: &ToolsConfig) -> crate::Result<Self> {
        if let Some(path) = &tools.ytdlp_path {
            return Ok(Self::new(path.clone()));
        }
        if tools.search_path {
            return Self::from_path().ok_or_else(|| {
                crate::Error::ExternalTool("yt-dlp not found in PATH".to_string())
            });
        }
        Err(crate::Error::ExternalTool(
            "no yt-dlp path configured and PATH search is disabled".to_string(),
        ))
    }

    fn watch_url(id: &VideoId) -> String {
        format!("{WATCH_URL_PREFIX}{id}")
    }

    /// Probe video metadata, answering repeat queries from the cache.
    async fn probe(&self, id: &VideoId) -> crate::Result<ProbeEntry> {
        {
            let cache = self.probe_cache.lock().await;
            if let Some(entry) = cache.get(id) {
                return Ok(entry.clone());
            }
        }

        tracing::debug!(video_id = %id, "probing video metadata");
        let output = Command::new(&self.binary_path)
            .arg("-J")
            .arg("--no-warnings")
            .arg(Self::watch_url(id))
            .output()
            .await
            .map_err(|e| {
                crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e))
            })?;

        let entry = if output.status.success() {
            let info: VideoInfo = serde_json::from_slice(&output.stdout).map_err(|e| {
                crate::Error::Job(JobError::Probe {
                    id: id.to_string(),
                    reason: format!("unparseable metadata document: {e}"),
                })
            })?;
            ProbeEntry::Available(info)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if reports_unplayable(&stderr) {
                ProbeEntry::Unplayable
            } else {
                return Err(crate::Error::Job(JobError::Probe {
                    id: id.to_string(),
                    reason: stderr.trim().to_string(),
                }));
            }
        };

        let mut cache = self.probe_cache.lock().await;
        cache.insert(id.clone(), entry.clone());
        Ok(entry)
    }

    /// Probe, treating an unplayable video as a probe error.
    async fn probe_available(&self, id: &VideoId) -> crate::Result<VideoInfo> {
        match self.probe(id).await? {
            ProbeEntry::Available(info) => Ok(info),
            ProbeEntry::Unplayable => Err(crate::Error::Job(JobError::Probe {
                id: id.to_string(),
                reason: "video is unplayable".to_string(),
            })),
        }
    }
}

#[async_trait]
impl RemoteSource for YtDlpSource {
    async fn is_playable(&self, id: &VideoId) -> crate::Result<bool> {
        Ok(matches!(self.probe(id).await?, ProbeEntry::Available(_)))
    }

    async fn duration(&self, id: &VideoId) -> crate::Result<Option<Duration>> {
        let info = self.probe_available(id).await?;
        Ok(info.duration.map(Duration::from_secs_f64))
    }

    async fn title(&self, id: &VideoId) -> crate::Result<String> {
        let info = self.probe_available(id).await?;
        Ok(info.title)
    }

    async fn best_audio_stream(&self, id: &VideoId) -> crate::Result<AudioStream> {
        let info = self.probe_available(id).await?;
        let format = best_audio_format(&info.formats).ok_or_else(|| {
            crate::Error::Job(JobError::Fetch {
                id: id.to_string(),
                reason: "no audio-only stream available".to_string(),
            })
        })?;
        Ok(AudioStream {
            source_id: id.clone(),
            format_id: format.format_id.clone(),
            extension: format.ext.clone(),
            bitrate: format.abr,
        })
    }

    async fn fetch(
        &self,
        stream: &AudioStream,
        dest_dir: &Path,
        base_name: &str,
    ) -> crate::Result<PathBuf> {
        let dest = dest_dir.join(format!("{base_name}.{}", stream.extension));
        tracing::debug!(video_id = %stream.source_id, dest = %dest.display(), "fetching audio stream");

        let output = Command::new(&self.binary_path)
            .arg("-f")
            .arg(&stream.format_id)
            .arg("-o")
            .arg(&dest)
            .arg("--no-warnings")
            .arg(Self::watch_url(&stream.source_id))
            .output()
            .await
            .map_err(|e| {
                crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(crate::Error::Job(JobError::Fetch {
                id: stream.source_id.to_string(),
                reason: stderr.trim().to_string(),
            }));
        }

        Ok(dest)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn format(id: &str, ext: &str, acodec: Option<&str>, vcodec: Option<&str>, abr: Option<f64>) -> FormatInfo {
        FormatInfo {
            format_id: id.to_string(),
            ext: ext.to_string(),
            acodec: acodec.map(str::to_string),
            vcodec: vcodec.map(str::to_string),
            abr,
        }
    }

    #[test]
    fn best_audio_format_prefers_highest_bitrate_audio_only() {
        let formats = vec![
            format("140", "m4a", Some("mp4a.40.2"), Some("none"), Some(129.5)),
            format("251", "webm", Some("opus"), Some("none"), Some(160.0)),
            format("22", "mp4", Some("mp4a.40.2"), Some("avc1"), Some(192.0)),
        ];
        let best = best_audio_format(&formats).unwrap();
        assert_eq!(best.format_id, "251");
    }

    #[test]
    fn best_audio_format_ignores_video_and_imageless_formats() {
        let formats = vec![
            format("sb0", "mhtml", None, None, None),
            format("137", "mp4", Some("none"), Some("avc1"), None),
        ];
        assert!(best_audio_format(&formats).is_none());
    }

    #[test]
    fn best_audio_format_tolerates_missing_bitrate() {
        let formats = vec![
            format("139", "m4a", Some("mp4a.40.5"), Some("none"), None),
            format("140", "m4a", Some("mp4a.40.2"), Some("none"), Some(129.5)),
        ];
        let best = best_audio_format(&formats).unwrap();
        assert_eq!(best.format_id, "140");
    }

    #[test]
    fn video_info_parses_a_minimal_probe_document() {
        let json = r#"{
            "title": "Some Song",
            "duration": 213.4,
            "formats": [
                {"format_id": "140", "ext": "m4a", "acodec": "mp4a.40.2", "vcodec": "none", "abr": 129.5}
            ]
        }"#;
        let info: VideoInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.title, "Some Song");
        assert_eq!(info.duration, Some(213.4));
        assert_eq!(info.formats.len(), 1);
    }

    #[test]
    fn video_info_parses_without_duration_or_formats() {
        let json = r#"{"title": "Live Stream"}"#;
        let info: VideoInfo = serde_json::from_str(json).unwrap();
        assert!(info.duration.is_none());
        assert!(info.formats.is_empty());
    }

    #[test]
    fn unplayable_markers_are_recognized() {
        assert!(reports_unplayable(
            "ERROR: [youtube] abc: Video unavailable"
        ));
        assert!(reports_unplayable("ERROR: [youtube] abc: Private video"));
        assert!(!reports_unplayable(
            "ERROR: unable to download webpage: timed out"
        ));
    }

    #[test]
    fn watch_url_uses_the_public_prefix() {
        assert_eq!(
            YtDlpSource::watch_url(&VideoId::new("abc123")),
            "https://www.youtube.com/watch?v=abc123"
        );
    }

    #[test]
    fn from_path_consistency_with_which_crate() {
        let which_result = which::which("yt-dlp");
        let from_path_result = YtDlpSource::from_path();
        assert_eq!(which_result.is_ok(), from_path_result.is_some());
    }

    #[test]
    fn from_config_prefers_explicit_path() {
        let tools = ToolsConfig {
            ytdlp_path: Some(PathBuf::from("/opt/tools/yt-dlp")),
            ffmpeg_path: None,
            search_path: false,
        };
        let source = YtDlpSource::from_config(&tools).unwrap();
        assert_eq!(source.binary_path, PathBuf::from("/opt/tools/yt-dlp"));
    }

    #[test]
    fn from_config_errors_when_search_disabled_and_no_path() {
        let tools = ToolsConfig {
            ytdlp_path: None,
            ffmpeg_path: None,
            search_path: false,
        };
        let err = YtDlpSource::from_config(&tools).unwrap_err();
        assert!(matches!(err, crate::Error::ExternalTool(_)));
    }

    #[tokio::test]
    async fn probe_with_invalid_binary_path_is_an_external_tool_error() {
        let source = YtDlpSource::new(PathBuf::from("/nonexistent/path/to/yt-dlp"));
        let err = source.is_playable(&VideoId::new("abc")).await.unwrap_err();
        match err {
            crate::Error::ExternalTool(msg) => {
                assert!(msg.contains("Failed to execute yt-dlp"));
            }
            other => panic!("expected ExternalTool error, got {other:?}"),
        }
    }
}
