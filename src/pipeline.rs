//! Batch orchestration across input files and a worker pool

use crate::config::Config;
use crate::input::{Dialect, parse_grouped_file, parse_playlist_file};
use crate::job::{JobContext, run_job};
use crate::planner::assign_track_numbers;
use crate::source::{RemoteSource, YtDlpSource};
use crate::tagger::{LoftyTagger, Tagger};
use crate::transcoder::{FfmpegTranscoder, Transcoder};
use crate::types::{Event, JobOutcome, JobReport, TrackRequest};
use futures::StreamExt;
use futures::stream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event channel capacity; slow subscribers past this lag miss events
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// An input file that could not be parsed.
///
/// Recorded in the report instead of failing the batch.
#[derive(Clone, Debug)]
pub struct ParseFailure {
    /// The input file that failed to parse
    pub file: PathBuf,
    /// Error message
    pub error: String,
}

/// Terminal report of one batch run
#[derive(Debug)]
pub struct PipelineReport {
    /// One report per dispatched job, in completion order
    pub reports: Vec<JobReport>,
    /// Input files that could not be parsed
    pub parse_failures: Vec<ParseFailure>,
}

impl PipelineReport {
    /// Number of jobs that produced a tagged audio file
    pub fn succeeded(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Succeeded(_)))
            .count()
    }

    /// Number of jobs skipped without producing a file
    pub fn skipped(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Skipped(_)))
            .count()
    }

    /// Number of jobs that failed
    pub fn failed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Failed(_)))
            .count()
    }
}

/// Batch orchestrator: parses a directory of track-list files and executes
/// every resulting track request over a bounded worker pool.
///
/// # Examples
///
/// ```no_run
/// use yt_audio_dl::{Config, Dialect, Pipeline};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = Pipeline::new(Config::default())?;
/// let report = pipeline.run("./lists", Dialect::Playlist).await?;
/// println!("{} succeeded", report.succeeded());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    config: Config,
    source: Arc<dyn RemoteSource>,
    transcoder: Arc<dyn Transcoder>,
    tagger: Arc<dyn Tagger>,
    event_tx: broadcast::Sender<Event>,
}

impl Pipeline {
    /// Create a pipeline with the default collaborators: `yt-dlp` source,
    /// `ffmpeg` transcoder, `lofty` tagger.
    ///
    /// Fails when the configuration is invalid or an external tool cannot
    /// be located.
    pub fn new(config: Config) -> crate::Result<Self> {
        let source = Arc::new(YtDlpSource::from_config(&config.tools)?);
        let transcoder = Arc::new(FfmpegTranscoder::from_config(&config.tools)?);
        Self::with_collaborators(config, source, transcoder, Arc::new(LoftyTagger::new()))
    }

    /// Create a pipeline with explicit collaborators.
    ///
    /// This is the seam embedders and tests use to substitute in-memory
    /// implementations for the external tools.
    pub fn with_collaborators(
        config: Config,
        source: Arc<dyn RemoteSource>,
        transcoder: Arc<dyn Transcoder>,
        tagger: Arc<dyn Tagger>,
    ) -> crate::Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config,
            source,
            transcoder,
            tagger,
            event_tx,
        })
    }

    /// Subscribe to lifecycle events.
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently. A subscriber that lags past the channel capacity
    /// misses the oldest events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Parse every file in `input_dir` under the given dialect and execute
    /// all resulting track requests.
    ///
    /// A file that fails to parse is recorded in the report and the batch
    /// proceeds; a job that fails is reported in its own [`JobReport`].
    /// Returns only after every dispatched job has reached a terminal
    /// outcome.
    pub async fn run(
        &self,
        input_dir: impl AsRef<Path>,
        dialect: Dialect,
    ) -> crate::Result<PipelineReport> {
        let input_dir = input_dir.as_ref();
        let (requests, parse_failures) = self.collect_requests(input_dir, dialect).await?;

        tracing::info!(
            input_dir = %input_dir.display(),
            tracks = requests.len(),
            parse_failures = parse_failures.len(),
            "batch planned"
        );

        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let ctx = JobContext {
            source: Arc::clone(&self.source),
            transcoder: Arc::clone(&self.transcoder),
            tagger: Arc::clone(&self.tagger),
            output_dir: self.config.output_dir.clone(),
            file_collision: self.config.file_collision,
            events: self.event_tx.clone(),
        };
        let concurrency = self.config.effective_parallelism();

        let reports: Vec<JobReport> = stream::iter(requests)
            .map(|request| {
                let ctx = ctx.clone();
                async move { run_job(&ctx, request).await }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let report = PipelineReport {
            reports,
            parse_failures,
        };
        tracing::info!(
            succeeded = report.succeeded(),
            skipped = report.skipped(),
            failed = report.failed(),
            "batch complete"
        );
        self.emit(Event::BatchComplete {
            succeeded: report.succeeded(),
            skipped: report.skipped(),
            failed: report.failed(),
        });

        Ok(report)
    }

    /// Enumerate and parse the input directory; a pure fold over files.
    ///
    /// Grouped-recording files are planned per file, so role groups never
    /// mix across recordings.
    async fn collect_requests(
        &self,
        input_dir: &Path,
        dialect: Dialect,
    ) -> crate::Result<(Vec<TrackRequest>, Vec<ParseFailure>)> {
        let mut requests = Vec::new();
        let mut parse_failures = Vec::new();

        let mut entries = tokio::fs::read_dir(input_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }

            let parsed = match dialect {
                Dialect::Playlist => parse_playlist_file(&path),
                Dialect::GroupedRecording => {
                    parse_grouped_file(&path).map(assign_track_numbers)
                }
            };

            match parsed {
                Ok(tracks) => {
                    tracing::debug!(file = %path.display(), tracks = tracks.len(), "input file parsed");
                    self.emit(Event::FileParsed {
                        file: path.clone(),
                        tracks: tracks.len(),
                    });
                    requests.extend(tracks);
                }
                Err(err) => {
                    tracing::warn!(file = %path.display(), error = %err, "input file could not be parsed");
                    self.emit(Event::ParseFailed {
                        file: path.clone(),
                        error: err.to_string(),
                    });
                    parse_failures.push(ParseFailure {
                        file: path,
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok((requests, parse_failures))
    }
}
