//! Library models backed by the SQLite store.

use serde::Serialize;

// =============================================================================
// Core Entities
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
}

/// An atomic, lower-cased tag shared across artists.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Track {
    pub id: i64,
    pub artist_id: i64,
    pub name: String,
    /// Length in whole seconds
    pub length: u32,
    #[serde(skip)]
    pub location: String,
    /// Opaque identifier used by the `/stream/` endpoint
    pub stream_id: String,
}

/// Values needed to insert a track; `stream_id` is generated by the store.
#[derive(Clone, Debug)]
pub struct NewTrack {
    pub artist_id: i64,
    pub name: String,
    pub length: u32,
    pub location: String,
}

// =============================================================================
// Tracklists
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TracklistKind {
    Album { artist_id: i64 },
    Playlist,
}

impl TracklistKind {
    pub fn artist_id(&self) -> Option<i64> {
        match self {
            TracklistKind::Album { artist_id } => Some(*artist_id),
            TracklistKind::Playlist => None,
        }
    }
}

/// Ordered collection of tracks, either an album or a playlist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tracklist {
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub kind: TracklistKind,
}

impl Tracklist {
    pub fn is_album(&self) -> bool {
        matches!(self.kind, TracklistKind::Album { .. })
    }
}

/// Album view of a tracklist, keyed by (name, artist).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Album {
    pub id: i64,
    pub name: String,
    pub artist_id: i64,
}

impl From<Album> for Tracklist {
    fn from(album: Album) -> Self {
        Tracklist {
            id: album.id,
            name: album.name,
            kind: TracklistKind::Album {
                artist_id: album.artist_id,
            },
        }
    }
}

/// Derived tracklist attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TracklistStats {
    pub total_tracks: usize,
    /// Sum of member track lengths in seconds
    pub length: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TracklistEntry {
    pub position: usize,
    pub track: Track,
}

/// Formats a length in seconds as `mm:ss`, or `hh:mm:ss` past the hour.
pub fn format_length(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
