//! # yt-audio-dl
//!
//! Backend library for building a tagged local audio library from curated
//! lists of YouTube videos.
//!
//! ## Design Philosophy
//!
//! yt-audio-dl is designed to be:
//! - **Batch-oriented** - One pass over a directory of track-list files
//! - **Failure-isolated** - A bad file or a dead video never sinks the batch
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! Input files come in two JSON dialects: playlist exports (one video id per
//! item) and grouped practice recordings (songs split into per-role tracks).
//! Each entry becomes an independent job that fetches the best audio-only
//! stream, transcodes it to MP3, and embeds title/album/track-number tags.
//!
//! ## Quick Start
//!
//! ```no_run
//! use yt_audio_dl::{Config, Dialect, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         output_dir: "./out".into(),
//!         ..Default::default()
//!     };
//!
//!     let pipeline = Pipeline::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = pipeline.run("./lists", Dialect::Playlist).await?;
//!     println!("{} succeeded, {} failed", report.succeeded(), report.failed());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Input file parsing (playlist and grouped-recording dialects)
pub mod input;
/// Per-track job execution (fetch, transcode, tag)
pub mod job;
/// Per-role track numbering
pub mod planner;
/// Batch orchestration across input files and a worker pool
pub mod pipeline;
/// Remote video source abstraction and yt-dlp implementation
pub mod source;
/// Tag embedding abstraction and lofty implementation
pub mod tagger;
/// Audio transcoding abstraction and ffmpeg implementation
pub mod transcoder;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, FileCollisionAction, ToolsConfig};
pub use error::{Error, JobError, Result};
pub use input::{Dialect, extract_video_id, parse_grouped_file, parse_playlist_file};
pub use pipeline::{ParseFailure, Pipeline, PipelineReport};
pub use planner::{RoleTrack, assign_track_numbers};
pub use source::{AudioStream, RemoteSource, YtDlpSource};
pub use tagger::{LoftyTagger, Tagger};
pub use transcoder::{AudioCodec, FfmpegTranscoder, Transcoder};
pub use types::{Event, JobOutcome, JobReport, SkipReason, TrackRequest, TrackTags, VideoId};
