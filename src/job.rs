//! Per-track job execution (fetch, transcode, tag)
//!
//! A job is the unit of isolation: any failure here is folded into the
//! job's own [`JobReport`] and never escapes to the batch.

use crate::config::FileCollisionAction;
use crate::error::JobError;
use crate::source::RemoteSource;
use crate::tagger::Tagger;
use crate::transcoder::{AudioCodec, Transcoder};
use crate::types::{Event, JobOutcome, JobReport, SkipReason, TrackRequest, TrackTags};
use crate::utils::{get_unique_path, sanitize_title};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shared collaborators and settings one job executes against
#[derive(Clone)]
pub struct JobContext {
    /// The remote video source
    pub source: Arc<dyn RemoteSource>,
    /// The audio transcoder
    pub transcoder: Arc<dyn Transcoder>,
    /// The tag writer
    pub tagger: Arc<dyn Tagger>,
    /// Directory produced files land in (pre-created by the batch)
    pub output_dir: PathBuf,
    /// How to handle a name collision at the output path
    pub file_collision: FileCollisionAction,
    /// Event broadcast channel sender
    pub events: broadcast::Sender<Event>,
}

impl JobContext {
    /// Emit an event to all subscribers; dropped silently when nobody
    /// is listening
    pub fn emit(&self, event: Event) {
        self.events.send(event).ok();
    }
}

/// Fold a crate-level error into a job error, keeping an already
/// step-tagged error as-is.
fn as_job_error(err: crate::Error, fallback: impl FnOnce(String) -> JobError) -> JobError {
    match err {
        crate::Error::Job(job) => job,
        other => fallback(other.to_string()),
    }
}

/// Execute one track request to its terminal outcome.
///
/// Never returns an error: failures become [`JobOutcome::Failed`] inside
/// the report, so one dead video cannot sink the batch.
pub async fn run_job(ctx: &JobContext, request: TrackRequest) -> JobReport {
    let id = request.source_id.clone();
    ctx.emit(Event::JobStarted { id: id.clone() });
    tracing::info!(video_id = %id, "job started");

    let outcome = match execute(ctx, &request).await {
        Ok(outcome) => outcome,
        Err(err) => JobOutcome::Failed(err),
    };

    match &outcome {
        JobOutcome::Succeeded(path) => {
            tracing::info!(video_id = %id, path = %path.display(), "job completed");
            ctx.emit(Event::JobCompleted {
                id,
                path: path.clone(),
            });
        }
        JobOutcome::Skipped(reason) => {
            tracing::warn!(video_id = %id, reason = %reason, "job skipped");
            ctx.emit(Event::JobSkipped { id, reason: *reason });
        }
        JobOutcome::Failed(err) => {
            tracing::error!(video_id = %id, step = err.step(), error = %err, "job failed");
            ctx.emit(Event::JobFailed {
                id,
                step: err.step().to_string(),
                error: err.to_string(),
            });
        }
    }

    JobReport { request, outcome }
}

async fn execute(
    ctx: &JobContext,
    request: &TrackRequest,
) -> std::result::Result<JobOutcome, JobError> {
    let id = &request.source_id;
    let probe_error = |e: crate::Error| {
        as_job_error(e, |reason| JobError::Probe {
            id: id.to_string(),
            reason,
        })
    };
    let fetch_error = |e: crate::Error| {
        as_job_error(e, |reason| JobError::Fetch {
            id: id.to_string(),
            reason,
        })
    };

    if !ctx.source.is_playable(id).await.map_err(probe_error)? {
        return Ok(JobOutcome::Skipped(SkipReason::Unplayable));
    }

    if ctx.source.duration(id).await.map_err(probe_error)?.is_none() {
        return Ok(JobOutcome::Skipped(SkipReason::UnknownDuration));
    }

    let base_name = match &request.display_name {
        Some(name) => name.clone(),
        None => {
            let title = ctx.source.title(id).await.map_err(probe_error)?;
            let sanitized = sanitize_title(&title);
            if sanitized.is_empty() {
                id.to_string()
            } else {
                sanitized
            }
        }
    };

    let stream = ctx.source.best_audio_stream(id).await.map_err(fetch_error)?;
    ctx.emit(Event::Fetching {
        id: id.clone(),
        name: base_name.clone(),
    });
    let fetched = ctx
        .source
        .fetch(&stream, &ctx.output_dir, &base_name)
        .await
        .map_err(fetch_error)?;

    let result = produce(ctx, request, &base_name, &fetched).await;
    if result.is_err() {
        // Best-effort cleanup so a failed job leaves no partial artifacts
        let _ = tokio::fs::remove_file(&fetched).await;
    }
    result
}

/// Transcode the fetched file and tag the output.
async fn produce(
    ctx: &JobContext,
    request: &TrackRequest,
    base_name: &str,
    fetched: &Path,
) -> std::result::Result<JobOutcome, JobError> {
    let id = &request.source_id;
    let codec = AudioCodec::Mp3;

    let desired = ctx
        .output_dir
        .join(format!("{base_name}.{}", codec.extension()));
    let output = get_unique_path(&desired, ctx.file_collision)?;

    ctx.emit(Event::Converting {
        id: id.clone(),
        input: fetched.to_path_buf(),
    });
    ctx.transcoder
        .convert(fetched, &output, codec)
        .await
        .map_err(|e| {
            as_job_error(e, |reason| JobError::Conversion {
                input: fetched.to_path_buf(),
                reason,
            })
        })?;

    if let Err(e) = tokio::fs::remove_file(fetched).await {
        tracing::warn!(path = %fetched.display(), error = %e, "could not remove intermediate file");
    }

    let tags = match &request.tag_set {
        Some(tags) => tags.clone(),
        None => {
            let title = ctx.source.title(id).await.map_err(|e| {
                as_job_error(e, |reason| JobError::Probe {
                    id: id.to_string(),
                    reason,
                })
            })?;
            TrackTags::title_only(title)
        }
    };

    ctx.emit(Event::Tagging {
        id: id.clone(),
        path: output.clone(),
    });
    ctx.tagger.write_tags(&output, &tags).map_err(|e| {
        as_job_error(e, |reason| JobError::Tagging {
            path: output.clone(),
            reason,
        })
    })?;

    Ok(JobOutcome::Succeeded(output))
}
