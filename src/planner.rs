//! Per-role track numbering
//!
//! Grouped-recording inputs split each song into one track per performing
//! role. Track numbers are assigned per role, not per file: the third
//! vocal track is "3/&lt;total vocals&gt;" regardless of how many drum or
//! guitar tracks surround it in the input.

use std::collections::HashMap;

use crate::types::TrackRequest;

/// A track request still carrying the role it was parsed under.
///
/// The role is consumed by [`assign_track_numbers`] and does not survive
/// into the executed request; it reaches the output only through the album
/// tag the parser already wrote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleTrack {
    /// Performing role this track belongs to (e.g. "vocal", "drums")
    pub role: String,
    /// The underlying track request
    pub request: TrackRequest,
}

/// Assign per-role track numbers and flatten to plain requests.
///
/// Tracks are grouped by role, preserving the order roles first appear and
/// the input order within each role. Each track in a group of size `g`
/// receives `track_number = "i/g"` with `i` counting from 1. Requests
/// without a tag set pass through unnumbered.
///
/// The result is the concatenation of the groups in first-seen role order,
/// so a role's tracks come out contiguous even when interleaved on input.
pub fn assign_track_numbers(tracks: Vec<RoleTrack>) -> Vec<TrackRequest> {
    let mut role_order: Vec<String> = Vec::new();
    let mut by_role: HashMap<String, Vec<TrackRequest>> = HashMap::new();

    for track in tracks {
        if !by_role.contains_key(&track.role) {
            role_order.push(track.role.clone());
        }
        by_role.entry(track.role).or_default().push(track.request);
    }

    let mut out = Vec::new();
    for role in role_order {
        let group = by_role.remove(&role).unwrap_or_default();
        let group_size = group.len();
        for (index, mut request) in group.into_iter().enumerate() {
            if let Some(tags) = request.tag_set.as_mut() {
                tags.track_number = Some(format!("{}/{}", index + 1, group_size));
            }
            out.push(request);
        }
    }
    out
}
