//! Test fixture creation for the library database
//!
//! The library is seeded through the same units of work the importer and
//! the API use, so the fixture never depends on the table layout.

use super::constants::*;
use anyhow::Result;
use owa_server::library_store::{Album, NewTrack, SqliteLibraryStore, Tracklist};
use owa_server::tags::apply_tags;
use owa_server::tracklist::{extend_tracklist, new_playlist, TrackRef};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Ids of the seeded rows, for tests to address them.
#[derive(Clone, Debug)]
#[allow(dead_code)]
pub struct SeededLibrary {
    pub obscura_id: i64,
    pub atheist_id: i64,
    pub album_id: i64,
    /// Album tracks in album order
    pub track_ids: Vec<i64>,
    pub stream_ids: Vec<String>,
    pub playlist_id: i64,
}

/// An MP3-looking file: an ID3v2 header followed by silence.
fn test_audio_bytes() -> Vec<u8> {
    let mut bytes = vec![0u8; TEST_AUDIO_SIZE_BYTES];
    bytes[..10].copy_from_slice(b"ID3\x03\x00\x00\x00\x00\x00\x00");
    for (i, byte) in bytes.iter_mut().enumerate().skip(10) {
        *byte = (i % 251) as u8;
    }
    bytes
}

/// Creates a temporary library with 2 artists, 1 album of 3 tracks and
/// 1 playlist. Returns (temp_dir, db_path, seeded ids).
pub fn create_test_library() -> Result<(TempDir, PathBuf, SeededLibrary)> {
    let dir = TempDir::new()?;

    let music_path = dir.path().join("music").join(ARTIST_1_NAME).join(ALBUM_1_TITLE);
    fs::create_dir_all(&music_path)?;

    let db_path = dir.path().join("library.db");
    let store = SqliteLibraryStore::new(&db_path)?;

    let audio = test_audio_bytes();
    let mut locations = Vec::new();
    for (i, (title, _)) in ALBUM_1_TRACKS.iter().enumerate() {
        let location = music_path.join(format!("{:02} {}.mp3", i + 1, title));
        fs::write(&location, &audio)?;
        locations.push(location.to_string_lossy().to_string());
    }

    let library = store.unit_of_work(|uow| {
        let obscura = uow.create_artist(ARTIST_1_NAME)?;
        let atheist = uow.create_artist(ARTIST_2_NAME)?;
        apply_tags(uow, Some(&ARTIST_1_TAG_PHRASES[..]), Some(&obscura))?;

        let album: Album = uow.find_or_create(&(ALBUM_1_TITLE.to_string(), obscura.id))?;
        let mut track_ids = Vec::new();
        let mut stream_ids = Vec::new();
        for ((title, length), location) in ALBUM_1_TRACKS.iter().zip(&locations) {
            let track = uow.insert_track(NewTrack {
                artist_id: obscura.id,
                name: title.to_string(),
                length: *length,
                location: location.clone(),
            })?;
            track_ids.push(track.id);
            stream_ids.push(track.stream_id);
        }
        let refs: Vec<TrackRef> = track_ids.iter().map(|id| TrackRef::Bare(*id)).collect();
        let album_id = album.id;
        let tracklist: Tracklist = album.into();
        extend_tracklist(uow, Some(refs.as_slice()), Some(&tracklist))?;

        let last = [TrackRef::Bare(track_ids[2])];
        let (playlist, _) = new_playlist(uow, Some(PLAYLIST_1_NAME), Some(&last[..]))?;

        Ok(SeededLibrary {
            obscura_id: obscura.id,
            atheist_id: atheist.id,
            album_id,
            track_ids,
            stream_ids,
            playlist_id: playlist.id,
        })
    })?;

    Ok((dir, db_path, library))
}
