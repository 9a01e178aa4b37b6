//! Ordered tracklist mutation.
//!
//! A tracklist's order is stored only as `track_positions` rows and is always
//! `0..N-1` after a successful mutation: every extension recomputes the whole
//! sequence in memory and rewrites it.

use crate::error::LibraryError;
use crate::library_store::{Track, Tracklist, UnitOfWork};
use serde::Deserialize;
use tracing::debug;

/// A request to add a track to a tracklist.
///
/// Accepted JSON shapes: `7`, `[7, 2]`, `[7, null]`, `{"id": 7}` and
/// `{"id": 7, "position": 2}`. A missing or null position appends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TrackRef {
    Bare(i64),
    Pair(i64, Option<usize>),
    Object {
        id: i64,
        #[serde(default)]
        position: Option<usize>,
    },
}

impl TrackRef {
    pub fn id(&self) -> i64 {
        match self {
            TrackRef::Bare(id) | TrackRef::Pair(id, _) | TrackRef::Object { id, .. } => *id,
        }
    }

    pub fn position(&self) -> Option<usize> {
        match self {
            TrackRef::Bare(_) => None,
            TrackRef::Pair(_, position) | TrackRef::Object { position, .. } => *position,
        }
    }
}

/// Places `track_id` into `sequence`: appended when `position` is `None`,
/// otherwise inserted at `position` (clamped to the end) shifting later
/// entries up by one.
fn place(sequence: &mut Vec<i64>, track_id: i64, position: Option<usize>) {
    match position {
        Some(position) => sequence.insert(position.min(sequence.len()), track_id),
        None => sequence.push(track_id),
    }
}

/// Adds the referenced tracks to a tracklist, in request order.
///
/// References to unknown tracks are dropped. Fails with `TracklistNotFound`
/// when there is no tracklist and with `NoTracks` when nothing resolved, in
/// which case the tracklist is left untouched. Returns the resolved tracks in
/// the order they were applied.
pub fn extend_tracklist(
    uow: &mut UnitOfWork<'_>,
    refs: Option<&[TrackRef]>,
    tracklist: Option<&Tracklist>,
) -> Result<Vec<Track>, LibraryError> {
    let tracklist = tracklist.ok_or(LibraryError::TracklistNotFound)?;
    let refs = refs.unwrap_or_default();

    let ids: Vec<i64> = refs.iter().map(TrackRef::id).collect();
    let known = uow.tracks_by_ids(&ids)?;
    let resolved: Vec<(&Track, Option<usize>)> = refs
        .iter()
        .filter_map(|r| known.get(&r.id()).map(|track| (track, r.position())))
        .collect();
    if resolved.is_empty() {
        return Err(LibraryError::NoTracks);
    }
    if resolved.len() < refs.len() {
        debug!(
            "Dropped {} unknown track references for tracklist {}",
            refs.len() - resolved.len(),
            tracklist.id
        );
    }

    let mut sequence = uow.tracklist_track_ids(tracklist.id)?;
    for (track, position) in &resolved {
        place(&mut sequence, track.id, *position);
    }
    uow.write_positions(tracklist.id, &sequence)?;

    Ok(resolved.into_iter().map(|(track, _)| track.clone()).collect())
}

/// Creates a playlist named `name` and fills it with `refs`.
///
/// Unknown references are dropped; a playlist whose references all fail to
/// resolve is still created, empty.
pub fn new_playlist(
    uow: &mut UnitOfWork<'_>,
    name: Option<&str>,
    refs: Option<&[TrackRef]>,
) -> Result<(Tracklist, Vec<Track>), LibraryError> {
    let name = name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(LibraryError::Malformed)?;
    if uow.playlist_by_name(name)?.is_some() {
        return Err(LibraryError::AlreadyExists(name.to_string()));
    }

    let playlist = uow.create_playlist(name)?;
    let tracks = match refs {
        Some(refs) if !refs.is_empty() => {
            match extend_tracklist(uow, Some(refs), Some(&playlist)) {
                Ok(tracks) => tracks,
                Err(LibraryError::NoTracks) => vec![],
                Err(err) => return Err(err),
            }
        }
        _ => vec![],
    };
    Ok((playlist, tracks))
}
