//! Input file parsing
//!
//! Two JSON dialects are supported:
//!
//! - **Playlist** - a playlist-API export where each item carries a nested
//!   `contentDetails.videoId`. Projects to bare track requests.
//! - **Grouped recording** - a recording split into songs, each song split
//!   into per-role tracks carrying a watch URL. Projects to role-labelled
//!   requests with title/album tags; track numbers are assigned later by
//!   the planner.
//!
//! Parsing one file is independent of every other file: a malformed file
//! yields [`Error::MalformedInput`] and the rest of the batch proceeds.

use crate::error::{Error, Result};
use crate::planner::RoleTrack;
use crate::types::{TrackRequest, TrackTags, VideoId};
use serde::Deserialize;
use std::path::Path;

/// The literal watch-URL prefix carried by grouped-recording track entries
pub const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Which input dialect a file (or a whole input directory) is written in
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Playlist-API export: `{"items": [{"contentDetails": {"videoId": ...}}]}`
    Playlist,
    /// Grouped practice recording: `{"title": ..., "songs": [...]}`
    GroupedRecording,
}

#[derive(Debug, Deserialize)]
struct PlaylistDoc {
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    #[serde(rename = "contentDetails")]
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct GroupedDoc {
    title: String,
    songs: Vec<SongDoc>,
}

#[derive(Debug, Deserialize)]
struct SongDoc {
    no: u32,
    title: String,
    tracks: Vec<SongTrackDoc>,
}

#[derive(Debug, Deserialize)]
struct SongTrackDoc {
    /// Role label, e.g. a performer part
    #[serde(rename = "track")]
    role: String,
    url: String,
}

/// Extract the video id embedded in a watch URL.
///
/// The id is the trailing portion of `url` after `prefix`, verbatim. Total
/// function: never panics, errors on a missing prefix or an empty
/// remainder.
pub fn extract_video_id(url: &str, prefix: &str) -> std::result::Result<VideoId, String> {
    match url.strip_prefix(prefix) {
        Some("") => Err(format!("url `{url}` has no id after `{prefix}`")),
        Some(id) => Ok(VideoId::new(id)),
        None => Err(format!("url `{url}` does not start with `{prefix}`")),
    }
}

/// Parse one playlist-dialect file into bare track requests.
///
/// Pure projection: N items yield exactly N requests, in file order, with
/// no name override and no tags. Duplicate ids are preserved.
pub fn parse_playlist_file(path: &Path) -> Result<Vec<TrackRequest>> {
    let doc: PlaylistDoc = read_doc(path)?;

    let mut requests = Vec::with_capacity(doc.items.len());
    for item in doc.items {
        if item.content_details.video_id.is_empty() {
            return Err(malformed(path, "empty `videoId` in `contentDetails`"));
        }
        requests.push(TrackRequest::bare(item.content_details.video_id));
    }
    Ok(requests)
}

/// Parse one grouped-recording file into role-labelled track requests.
///
/// Produces one request per track, in file order (song order outer, track
/// order inner), each carrying title and album tags. Track numbers are left
/// unset here; [`crate::planner::assign_track_numbers`] fills them in.
pub fn parse_grouped_file(path: &Path) -> Result<Vec<RoleTrack>> {
    let doc: GroupedDoc = read_doc(path)?;

    let mut tracks = Vec::new();
    for song in &doc.songs {
        for entry in &song.tracks {
            let id = extract_video_id(&entry.url, WATCH_URL_PREFIX)
                .map_err(|reason| malformed(path, &reason))?;
            tracks.push(RoleTrack {
                role: entry.role.clone(),
                request: TrackRequest {
                    display_name: Some(id.as_str().to_string()),
                    tag_set: Some(TrackTags {
                        title: format!("{}. {}", song.no, song.title),
                        album: format!("{} ({})", doc.title, entry.role).into(),
                        track_number: None,
                    }),
                    source_id: id,
                },
            });
        }
    }
    Ok(tracks)
}

fn read_doc<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| malformed(path, &e.to_string()))
}

fn malformed(path: &Path, reason: &str) -> Error {
    Error::MalformedInput {
        file: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
