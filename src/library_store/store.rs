//! SQLite-backed library store.
//!
//! Every read or write goes through [`SqliteLibraryStore::unit_of_work`],
//! which wraps one transaction and one fresh [`UniqueCache`]. The transaction
//! commits when the closure returns `Ok` and rolls back otherwise.

use super::models::*;
use super::pagination::{Page, PageRequest};
use super::schema::LIBRARY_VERSIONED_SCHEMAS;
use super::unique_cache::{UniqueCache, UniqueEntity};
use crate::error::LibraryError;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, params_from_iter, types::Type, Connection, OptionalExtension, Transaction};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Clone)]
pub struct SqliteLibraryStore {
    conn: Arc<Mutex<Connection>>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = LIBRARY_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &LIBRARY_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!("Creating library db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    if db_version < BASE_DB_VERSION as i64 {
        bail!(
            "Database user_version {} was not created by this server",
            db_version
        );
    }
    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;

    if current_version < latest_version {
        let tx = conn.transaction()?;
        for schema in LIBRARY_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating library db from version {} to {}",
                    current_version, schema.version
                );
                migration_fn(&tx)?;
            }
            current_version = schema.version;
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
        tx.commit()?;
    }

    latest_schema
        .validate(conn)
        .context("Library database schema validation failed")
}

impl SqliteLibraryStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let mut conn = Connection::open_with_flags(
            db_path.as_ref(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open library database")?;

        migrate_if_needed(&mut conn)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let count = |table: &str| -> i64 {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
                .unwrap_or(0)
        };
        info!(
            "Opened library: {} artists, {} tags, {} tracks, {} tracklists",
            count("artists"),
            count("tags"),
            count("tracks"),
            count("tracklists")
        );

        Ok(SqliteLibraryStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LibraryError> {
        self.conn
            .lock()
            .map_err(|_| LibraryError::Internal("library connection lock poisoned".to_string()))
    }

    /// Runs `f` inside one transaction, committing on `Ok` and rolling back on `Err`.
    pub fn unit_of_work<T, F>(&self, f: F) -> Result<T, LibraryError>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> Result<T, LibraryError>,
    {
        let mut conn = self.lock()?;
        let mut uow = UnitOfWork {
            tx: conn.transaction()?,
            cache: UniqueCache::default(),
        };
        match f(&mut uow) {
            Ok(value) => {
                uow.tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                debug!("Rolling back unit of work: {:?}", err);
                uow.tx.rollback()?;
                Err(err)
            }
        }
    }
}

/// One transaction plus the find-or-create cache scoped to it.
pub struct UnitOfWork<'conn> {
    pub(crate) tx: Transaction<'conn>,
    pub(crate) cache: UniqueCache,
}

fn parse_artist_row(row: &rusqlite::Row) -> rusqlite::Result<Artist> {
    Ok(Artist {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn parse_tag_row(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

const TRACK_COLUMNS: &str = "t.id, t.artist_id, t.name, t.length, t.location, t.stream_id";

fn parse_track_row(row: &rusqlite::Row) -> rusqlite::Result<Track> {
    Ok(Track {
        id: row.get(0)?,
        artist_id: row.get(1)?,
        name: row.get(2)?,
        length: row.get(3)?,
        location: row.get(4)?,
        stream_id: row.get(5)?,
    })
}

const TRACKLIST_COLUMNS: &str = "l.id, l.kind, l.name, l.artist_id";

fn parse_tracklist_row(row: &rusqlite::Row) -> rusqlite::Result<Tracklist> {
    let kind: String = row.get(1)?;
    let artist_id: Option<i64> = row.get(3)?;
    let kind = match (kind.as_str(), artist_id) {
        ("album", Some(artist_id)) => TracklistKind::Album { artist_id },
        ("playlist", None) => TracklistKind::Playlist,
        _ => return Err(rusqlite::Error::InvalidColumnType(1, kind, Type::Text)),
    };
    Ok(Tracklist {
        id: row.get(0)?,
        name: row.get(2)?,
        kind,
    })
}

/// Upper bound on the values bound into one `IN (...)` list, well below
/// SQLite's host parameter limit.
const MAX_IN_LIST_VARIABLES: usize = 500;

fn in_list_placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Returns the tags matching any of `names`, one query per
/// `MAX_IN_LIST_VARIABLES` names.
pub(crate) fn select_tags_by_names<'a, I>(conn: &Connection, names: I) -> Result<Vec<Tag>, LibraryError>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names.into_iter().collect();
    let mut tags = Vec::with_capacity(names.len());
    for chunk in names.chunks(MAX_IN_LIST_VARIABLES) {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name FROM tags WHERE name IN ({})",
            in_list_placeholders(chunk.len())
        ))?;
        let rows = stmt.query_map(params_from_iter(chunk), parse_tag_row)?;
        for tag in rows {
            tags.push(tag?);
        }
    }
    Ok(tags)
}

/// Which tracklists a listing covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracklistFilter {
    Albums,
    Playlists,
}

impl TracklistFilter {
    fn where_clause(&self) -> &'static str {
        match self {
            TracklistFilter::Albums => "WHERE l.kind = 'album'",
            TracklistFilter::Playlists => "WHERE l.kind = 'playlist'",
        }
    }
}

impl<'conn> UnitOfWork<'conn> {
    pub fn conn(&self) -> &Connection {
        &self.tx
    }

    pub fn find_or_create<E: UniqueEntity>(&mut self, key: &E::Key) -> Result<E, LibraryError> {
        self.cache.find_or_create(&self.tx, key)
    }

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> Result<u64, LibraryError> {
        let total: i64 = self.tx.query_row(sql, params, |r| r.get(0))?;
        Ok(total as u64)
    }

    // =========================================================================
    // Artists
    // =========================================================================

    pub fn artist(&self, id: i64) -> Result<Option<Artist>, LibraryError> {
        Ok(self
            .tx
            .query_row(
                "SELECT id, name FROM artists WHERE id = ?1",
                params![id],
                parse_artist_row,
            )
            .optional()?)
    }

    pub fn artist_by_name(&self, name: &str) -> Result<Option<Artist>, LibraryError> {
        Ok(Artist::find(&self.tx, name)?)
    }

    pub fn list_artists(&self, request: PageRequest) -> Result<Page<Artist>, LibraryError> {
        let total = self.count("SELECT COUNT(*) FROM artists", [])?;
        let mut stmt = self
            .tx
            .prepare_cached("SELECT id, name FROM artists ORDER BY name, id LIMIT ?1 OFFSET ?2")?;
        let items = stmt
            .query_map(params![request.limit, request.offset()], parse_artist_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, request))
    }

    /// Inserts a new artist, failing if the name is taken.
    pub fn create_artist(&mut self, name: &str) -> Result<Artist, LibraryError> {
        if self.artist_by_name(name)?.is_some() {
            return Err(LibraryError::AlreadyExists(name.to_string()));
        }
        self.find_or_create::<Artist>(name)
    }

    pub fn artist_tags(&self, artist_id: i64) -> Result<Vec<Tag>, LibraryError> {
        let mut stmt = self.tx.prepare_cached(
            "SELECT t.id, t.name FROM tags t
             JOIN artist_tags at ON at.tag_id = t.id
             WHERE at.artist_id = ?1 ORDER BY t.name",
        )?;
        let tags = stmt
            .query_map(params![artist_id], parse_tag_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    pub fn add_artist_tags(&self, artist_id: i64, tags: &[Tag]) -> Result<(), LibraryError> {
        let mut stmt = self
            .tx
            .prepare_cached("INSERT INTO artist_tags (artist_id, tag_id) VALUES (?1, ?2)")?;
        for tag in tags {
            stmt.execute(params![artist_id, tag.id])?;
        }
        Ok(())
    }

    pub fn artist_albums(&self, artist_id: i64) -> Result<Vec<Tracklist>, LibraryError> {
        let mut stmt = self.tx.prepare_cached(&format!(
            "SELECT {} FROM tracklists l WHERE l.kind = 'album' AND l.artist_id = ?1 ORDER BY l.name",
            TRACKLIST_COLUMNS
        ))?;
        let albums = stmt
            .query_map(params![artist_id], parse_tracklist_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(albums)
    }

    // =========================================================================
    // Tags
    // =========================================================================

    pub fn tag_by_name(&self, name: &str) -> Result<Option<Tag>, LibraryError> {
        Ok(Tag::find(&self.tx, name)?)
    }

    pub fn list_tags(&self, request: PageRequest) -> Result<Page<Tag>, LibraryError> {
        let total = self.count("SELECT COUNT(*) FROM tags", [])?;
        let mut stmt = self
            .tx
            .prepare_cached("SELECT id, name FROM tags ORDER BY name LIMIT ?1 OFFSET ?2")?;
        let items = stmt
            .query_map(params![request.limit, request.offset()], parse_tag_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, request))
    }

    pub fn tag_artists(
        &self,
        tag_id: i64,
        request: PageRequest,
    ) -> Result<Page<Artist>, LibraryError> {
        let total = self.count(
            "SELECT COUNT(*) FROM artist_tags WHERE tag_id = ?1",
            params![tag_id],
        )?;
        let mut stmt = self.tx.prepare_cached(
            "SELECT a.id, a.name FROM artists a
             JOIN artist_tags at ON at.artist_id = a.id
             WHERE at.tag_id = ?1 ORDER BY a.name LIMIT ?2 OFFSET ?3",
        )?;
        let items = stmt
            .query_map(
                params![tag_id, request.limit, request.offset()],
                parse_artist_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, request))
    }

    // =========================================================================
    // Tracks
    // =========================================================================

    fn track_where(&self, clause: &str, value: impl rusqlite::ToSql) -> Result<Option<Track>, LibraryError> {
        Ok(self
            .tx
            .query_row(
                &format!("SELECT {} FROM tracks t WHERE {} = ?1", TRACK_COLUMNS, clause),
                params![value],
                parse_track_row,
            )
            .optional()?)
    }

    pub fn track(&self, id: i64) -> Result<Option<Track>, LibraryError> {
        self.track_where("t.id", id)
    }

    pub fn track_by_stream_id(&self, stream_id: &str) -> Result<Option<Track>, LibraryError> {
        self.track_where("t.stream_id", stream_id)
    }

    pub fn track_by_location(&self, location: &str) -> Result<Option<Track>, LibraryError> {
        self.track_where("t.location", location)
    }

    /// Looks up many tracks at once; ids that do not exist are absent from the map.
    pub fn tracks_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, Track>, LibraryError> {
        let mut tracks = HashMap::new();
        for chunk in ids.chunks(MAX_IN_LIST_VARIABLES) {
            let mut stmt = self.tx.prepare(&format!(
                "SELECT {} FROM tracks t WHERE t.id IN ({})",
                TRACK_COLUMNS,
                in_list_placeholders(chunk.len())
            ))?;
            for track in stmt.query_map(params_from_iter(chunk), parse_track_row)? {
                let track = track?;
                tracks.insert(track.id, track);
            }
        }
        Ok(tracks)
    }

    pub fn list_tracks(&self, request: PageRequest) -> Result<Page<Track>, LibraryError> {
        let total = self.count("SELECT COUNT(*) FROM tracks", [])?;
        let mut stmt = self.tx.prepare_cached(&format!(
            "SELECT {} FROM tracks t ORDER BY t.id LIMIT ?1 OFFSET ?2",
            TRACK_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![request.limit, request.offset()], parse_track_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, request))
    }

    pub fn insert_track(&self, new_track: NewTrack) -> Result<Track, LibraryError> {
        let stream_id = uuid::Uuid::new_v4().to_string();
        self.tx.execute(
            "INSERT INTO tracks (artist_id, name, length, location, stream_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new_track.artist_id,
                new_track.name,
                new_track.length,
                new_track.location,
                stream_id
            ],
        )?;
        Ok(Track {
            id: self.tx.last_insert_rowid(),
            artist_id: new_track.artist_id,
            name: new_track.name,
            length: new_track.length,
            location: new_track.location,
            stream_id,
        })
    }

    /// Tracklists containing the track, each listed once.
    pub fn track_tracklists(&self, track_id: i64) -> Result<Vec<Tracklist>, LibraryError> {
        let mut stmt = self.tx.prepare_cached(&format!(
            "SELECT DISTINCT {} FROM tracklists l
             JOIN track_positions p ON p.tracklist_id = l.id
             WHERE p.track_id = ?1 ORDER BY l.id",
            TRACKLIST_COLUMNS
        ))?;
        let tracklists = stmt
            .query_map(params![track_id], parse_tracklist_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracklists)
    }

    // =========================================================================
    // Tracklists
    // =========================================================================

    pub fn tracklist(&self, id: i64) -> Result<Option<Tracklist>, LibraryError> {
        Ok(self
            .tx
            .query_row(
                &format!("SELECT {} FROM tracklists l WHERE l.id = ?1", TRACKLIST_COLUMNS),
                params![id],
                parse_tracklist_row,
            )
            .optional()?)
    }

    pub fn playlist_by_name(&self, name: &str) -> Result<Option<Tracklist>, LibraryError> {
        Ok(self
            .tx
            .query_row(
                &format!(
                    "SELECT {} FROM tracklists l WHERE l.kind = 'playlist' AND l.name = ?1",
                    TRACKLIST_COLUMNS
                ),
                params![name],
                parse_tracklist_row,
            )
            .optional()?)
    }

    pub fn create_playlist(&self, name: &str) -> Result<Tracklist, LibraryError> {
        match self.tx.execute(
            "INSERT INTO tracklists (kind, name) VALUES ('playlist', ?1)",
            params![name],
        ) {
            Ok(_) => Ok(Tracklist {
                id: self.tx.last_insert_rowid(),
                name: name.to_string(),
                kind: TracklistKind::Playlist,
            }),
            Err(err) if crate::error::is_constraint_violation(&err) => {
                Err(LibraryError::AlreadyExists(name.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn list_tracklists(
        &self,
        filter: TracklistFilter,
        request: PageRequest,
    ) -> Result<Page<(Tracklist, TracklistStats)>, LibraryError> {
        let total = self.count(
            &format!("SELECT COUNT(*) FROM tracklists l {}", filter.where_clause()),
            [],
        )?;
        let mut stmt = self.tx.prepare_cached(&format!(
            "SELECT {}, COUNT(t.id), COALESCE(SUM(t.length), 0) FROM tracklists l
             LEFT JOIN track_positions p ON p.tracklist_id = l.id
             LEFT JOIN tracks t ON t.id = p.track_id
             {}
             GROUP BY l.id ORDER BY l.name, l.id LIMIT ?1 OFFSET ?2",
            TRACKLIST_COLUMNS,
            filter.where_clause()
        ))?;
        let items = stmt
            .query_map(params![request.limit, request.offset()], |row| {
                let tracklist = parse_tracklist_row(row)?;
                let stats = TracklistStats {
                    total_tracks: row.get::<_, i64>(4)? as usize,
                    length: row.get::<_, i64>(5)? as u64,
                };
                Ok((tracklist, stats))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, request))
    }

    /// Track ids of a tracklist in position order.
    pub fn tracklist_track_ids(&self, tracklist_id: i64) -> Result<Vec<i64>, LibraryError> {
        let mut stmt = self.tx.prepare_cached(
            "SELECT track_id FROM track_positions WHERE tracklist_id = ?1 ORDER BY position",
        )?;
        let ids = stmt
            .query_map(params![tracklist_id], |r| r.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    pub fn tracklist_entries(&self, tracklist_id: i64) -> Result<Vec<TracklistEntry>, LibraryError> {
        let mut stmt = self.tx.prepare_cached(&format!(
            "SELECT {}, p.position FROM track_positions p
             JOIN tracks t ON t.id = p.track_id
             WHERE p.tracklist_id = ?1 ORDER BY p.position",
            TRACK_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![tracklist_id], |row| {
                Ok(TracklistEntry {
                    track: parse_track_row(row)?,
                    position: row.get::<_, i64>(6)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Replaces the stored order of a tracklist with `track_ids`, numbering
    /// positions `0..track_ids.len()`.
    pub fn write_positions(&self, tracklist_id: i64, track_ids: &[i64]) -> Result<(), LibraryError> {
        self.tx.execute(
            "DELETE FROM track_positions WHERE tracklist_id = ?1",
            params![tracklist_id],
        )?;
        let mut stmt = self.tx.prepare_cached(
            "INSERT INTO track_positions (tracklist_id, track_id, position) VALUES (?1, ?2, ?3)",
        )?;
        for (position, track_id) in track_ids.iter().enumerate() {
            stmt.execute(params![tracklist_id, track_id, position as i64])?;
        }
        Ok(())
    }
}
