//! Find-or-create for entities with a natural unique key.
//!
//! A `UniqueCache` lives for exactly one unit of work. It memoizes resolved
//! entities per `(kind, key)` so repeated lookups inside that unit of work
//! neither re-query nor race to insert duplicates. Cross-unit duplicates are
//! prevented by the storage uniqueness constraints alone: an insert rejected
//! with a constraint violation falls back to re-reading the existing row.

use crate::error::{is_constraint_violation, LibraryError};
use std::any::Any;
use std::collections::HashMap;
use tracing::debug;

use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Album, Artist, Tag};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Artist,
    Tag,
    Album,
}

/// An entity that can be resolved by its natural key.
pub trait UniqueEntity: Clone + Send + 'static {
    const KIND: EntityKind;
    type Key: ?Sized;

    fn cache_key(key: &Self::Key) -> String;
    fn find(conn: &Connection, key: &Self::Key) -> rusqlite::Result<Option<Self>>;
    fn insert(conn: &Connection, key: &Self::Key) -> rusqlite::Result<Self>;
}

#[derive(Default)]
pub struct UniqueCache {
    entries: HashMap<(EntityKind, String), Box<dyn Any + Send>>,
}

impl UniqueCache {
    pub fn find_or_create<E: UniqueEntity>(
        &mut self,
        conn: &Connection,
        key: &E::Key,
    ) -> Result<E, LibraryError> {
        let cache_key = (E::KIND, E::cache_key(key));
        if let Some(entity) = self
            .entries
            .get(&cache_key)
            .and_then(|entry| entry.downcast_ref::<E>())
        {
            return Ok(entity.clone());
        }

        let entity = match E::find(conn, key)? {
            Some(existing) => existing,
            None => match E::insert(conn, key) {
                Ok(created) => created,
                Err(err) if is_constraint_violation(&err) => {
                    debug!(
                        "{:?} '{}' inserted concurrently, re-reading",
                        E::KIND,
                        cache_key.1
                    );
                    match E::find(conn, key)? {
                        Some(existing) => existing,
                        None => return Err(err.into()),
                    }
                }
                Err(err) => return Err(err.into()),
            },
        };

        self.entries.insert(cache_key, Box::new(entity.clone()));
        Ok(entity)
    }

    /// Records an entity resolved through some other query.
    pub fn remember<E: UniqueEntity>(&mut self, key: &E::Key, entity: &E) {
        self.entries
            .insert((E::KIND, E::cache_key(key)), Box::new(entity.clone()));
    }

    /// Drops every cached entity of `kind`, used after rolling back a savepoint
    /// that may have created some of them.
    pub fn evict_kind(&mut self, kind: EntityKind) {
        self.entries.retain(|(k, _), _| *k != kind);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl UniqueEntity for Artist {
    const KIND: EntityKind = EntityKind::Artist;
    type Key = str;

    fn cache_key(name: &str) -> String {
        name.to_string()
    }

    fn find(conn: &Connection, name: &str) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            "SELECT id, name FROM artists WHERE name = ?1",
            params![name],
            |row| {
                Ok(Artist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()
    }

    fn insert(conn: &Connection, name: &str) -> rusqlite::Result<Self> {
        conn.execute("INSERT INTO artists (name) VALUES (?1)", params![name])?;
        Ok(Artist {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }
}

impl UniqueEntity for Tag {
    const KIND: EntityKind = EntityKind::Tag;
    type Key = str;

    fn cache_key(name: &str) -> String {
        name.to_string()
    }

    fn find(conn: &Connection, name: &str) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            "SELECT id, name FROM tags WHERE name = ?1",
            params![name],
            |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()
    }

    fn insert(conn: &Connection, name: &str) -> rusqlite::Result<Self> {
        conn.execute("INSERT INTO tags (name) VALUES (?1)", params![name])?;
        Ok(Tag {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }
}

/// Albums are keyed by `(name, artist_id)`.
impl UniqueEntity for Album {
    const KIND: EntityKind = EntityKind::Album;
    type Key = (String, i64);

    fn cache_key((name, artist_id): &(String, i64)) -> String {
        format!("{}\u{1f}{}", artist_id, name)
    }

    fn find(conn: &Connection, (name, artist_id): &(String, i64)) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            "SELECT id, name, artist_id FROM tracklists
             WHERE kind = 'album' AND name = ?1 AND artist_id = ?2",
            params![name, artist_id],
            |row| {
                Ok(Album {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    artist_id: row.get(2)?,
                })
            },
        )
        .optional()
    }

    fn insert(conn: &Connection, (name, artist_id): &(String, i64)) -> rusqlite::Result<Self> {
        conn.execute(
            "INSERT INTO tracklists (kind, name, artist_id) VALUES ('album', ?1, ?2)",
            params![name, artist_id],
        )?;
        Ok(Album {
            id: conn.last_insert_rowid(),
            name: name.clone(),
            artist_id: *artist_id,
        })
    }
}
