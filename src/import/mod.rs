//! Directory importer.
//!
//! Walks a directory tree and stores every audio file it finds as a track of
//! an album. Each directory is one unit of work: either all of its new tracks
//! are stored or, after a storage failure, none are. Locations that are
//! already in the library are skipped, so an interrupted import can simply be
//! run again.

mod metadata;

pub use metadata::{AudioTags, LoftyExtractor, MetadataError, MetadataExtractor};

use crate::error::LibraryError;
use crate::library_store::{
    format_length, Album, Artist, NewTrack, SqliteLibraryStore, Tracklist, UnitOfWork,
};
use crate::tags::apply_tags;
use crate::tracklist::{extend_tracklist, TrackRef};
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

pub const AUDIO_EXTENSIONS: [&str; 5] = ["m4a", "flac", "mp3", "ogg", "oga"];

/// Track fields as they are stored, after cleaning up the raw tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackInfo {
    pub artist: String,
    pub album: String,
    pub name: String,
    pub length: u32,
    pub tags: Vec<String>,
}

/// Drops co-billed artists ("Obscura feat. Other Band" becomes "Obscura").
pub fn adapt_track(tags: AudioTags) -> TrackInfo {
    let full = tags.artist.trim();
    let artist = match full.find("feat") {
        Some(idx) if !full[..idx].trim().is_empty() => full[..idx].trim(),
        _ => full,
    };
    TrackInfo {
        artist: artist.to_string(),
        album: tags.album.trim().to_string(),
        name: tags.title.trim().to_string(),
        length: tags.length,
        tags: tags.genres,
    }
}

/// A directory whose tracks were rolled back.
#[derive(Clone, Debug)]
pub struct FailedGroup {
    pub directory: PathBuf,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track: Option<String>,
    pub error: String,
}

#[derive(Clone, Debug, Default)]
pub struct ImportReport {
    pub stored: usize,
    /// Files whose location was already imported
    pub skipped: usize,
    /// Unreadable files plus files of rolled back directories
    pub failed: usize,
    pub failed_groups: Vec<FailedGroup>,
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Audio files directly inside `dir`, sorted by file name.
fn audio_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_audio_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

struct StoredGroup {
    stored: usize,
    artist: String,
    album: String,
}

struct GroupImport<'a> {
    extractor: &'a dyn MetadataExtractor,
    /// Names of the file being stored, reported if the group fails
    current: Option<TrackInfo>,
    skipped: usize,
    unreadable: usize,
}

impl GroupImport<'_> {
    fn store_files(
        &mut self,
        uow: &mut UnitOfWork<'_>,
        files: &[PathBuf],
    ) -> Result<StoredGroup, LibraryError> {
        let mut group = StoredGroup {
            stored: 0,
            artist: String::new(),
            album: String::new(),
        };

        for path in files {
            let location = path.to_string_lossy().into_owned();
            if uow.track_by_location(&location)?.is_some() {
                info!("{} previously processed, skipping", location);
                self.skipped += 1;
                continue;
            }

            let info = match self.extractor.extract(path) {
                Ok(tags) => adapt_track(tags),
                Err(err) => {
                    error!("Error processing {}: {}", location, err);
                    self.unreadable += 1;
                    continue;
                }
            };
            self.current = Some(info.clone());

            let artist: Artist = uow.find_or_create(info.artist.as_str())?;
            let album: Album = uow.find_or_create(&(info.album.clone(), artist.id))?;
            let tags = match apply_tags(uow, Some(info.tags.as_slice()), Some(&artist)) {
                Ok(tags) => tags,
                Err(LibraryError::NoTags) => vec![],
                Err(err) => return Err(err),
            };

            let track = uow.insert_track(NewTrack {
                artist_id: artist.id,
                name: info.name.clone(),
                length: info.length,
                location,
            })?;
            let tracklist: Tracklist = album.clone().into();
            extend_tracklist(uow, Some(&[TrackRef::Bare(track.id)][..]), Some(&tracklist))?;

            info!(
                "* Processed: {} - {} - {}\n  Found Tags: {}",
                artist.name,
                album.name,
                track.name,
                tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", ")
            );
            group.stored += 1;
            group.artist = artist.name;
            group.album = album.name;
        }
        Ok(group)
    }
}

/// Imports every audio file below `base`, one directory at a time.
pub fn store_directory(
    store: &SqliteLibraryStore,
    base: &Path,
    extractor: &dyn MetadataExtractor,
) -> Result<ImportReport> {
    if !base.is_dir() {
        bail!("{} is not a directory", base.display());
    }

    info!("Beginning walk of {}", base.display());
    let total_start = Instant::now();
    let mut report = ImportReport::default();

    for entry in WalkDir::new(base).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable directory: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let files = audio_files(entry.path());
        if files.is_empty() {
            continue;
        }
        debug!("Importing {} files from {}", files.len(), entry.path().display());

        let start = Instant::now();
        let mut group = GroupImport {
            extractor,
            current: None,
            skipped: 0,
            unreadable: 0,
        };
        let result = store.unit_of_work(|uow| group.store_files(uow, &files));
        report.skipped += group.skipped;
        report.failed += group.unreadable;

        match result {
            Ok(stored) => {
                report.stored += stored.stored;
                if stored.stored > 0 {
                    info!(
                        "** Storing: {} - {}\n     Files: {}\n     Time:  {}\n** Current Progress:\n     Total Files: {}\n     Total Time:  {}",
                        stored.artist,
                        stored.album,
                        stored.stored,
                        format_length(start.elapsed().as_secs()),
                        report.stored,
                        format_length(total_start.elapsed().as_secs())
                    );
                }
            }
            Err(err) => {
                let current = group.current;
                error!(
                    "**Error encountered: {}\n  Artist: {}\n  Album:  {}\n  Track:  {}",
                    err,
                    current.as_ref().map(|c| c.artist.as_str()).unwrap_or("-"),
                    current.as_ref().map(|c| c.album.as_str()).unwrap_or("-"),
                    current.as_ref().map(|c| c.name.as_str()).unwrap_or("-"),
                );
                report.failed += files.len() - group.skipped - group.unreadable;
                report.failed_groups.push(FailedGroup {
                    directory: entry.path().to_path_buf(),
                    artist: current.as_ref().map(|c| c.artist.clone()),
                    album: current.as_ref().map(|c| c.album.clone()),
                    track: current.map(|c| c.name),
                    error: err.to_string(),
                });
            }
        }
    }

    info!(
        "Import finished in {}: {} stored, {} skipped, {} failed",
        format_length(total_start.elapsed().as_secs()),
        report.stored,
        report.skipped,
        report.failed
    );
    Ok(report)
}
