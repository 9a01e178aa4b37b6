//! SQLite schema definitions for the music library database.
//!
//! Albums and playlists share the `tracklists` table and are told apart by
//! `kind`. Ordering lives only in `track_positions`.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, PartialUniqueIndex, SqlType, Table, VersionedSchema,
};

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const TAG_FK: ForeignKey = ForeignKey {
    foreign_table: "tags",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const TRACK_FK: ForeignKey = ForeignKey {
    foreign_table: "tracks",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const TRACKLIST_FK: ForeignKey = ForeignKey {
    foreign_table: "tracklists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["name"]],
    check_constraints: &[],
    partial_unique_indices: &[],
};

const TAGS_TABLE: Table = Table {
    name: "tags",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["name"]],
    check_constraints: &[],
    partial_unique_indices: &[],
};

const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTIST_FK)
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("length", &SqlType::Integer, non_null = true),
        sqlite_column!("location", &SqlType::Text, non_null = true),
        sqlite_column!("stream_id", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_tracks_artist", "artist_id")],
    unique_constraints: &[&["location"], &["stream_id"]],
    check_constraints: &["length >= 0"],
    partial_unique_indices: &[],
};

const TRACKLISTS_TABLE: Table = Table {
    name: "tracklists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("kind", &SqlType::Text, non_null = true), // 'album', 'playlist'
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("artist_id", &SqlType::Integer, foreign_key = Some(&ARTIST_FK)),
    ],
    indices: &[("idx_tracklists_artist", "artist_id")],
    unique_constraints: &[],
    check_constraints: &[
        "kind IN ('album', 'playlist')",
        "(kind = 'album') = (artist_id IS NOT NULL)",
    ],
    partial_unique_indices: &[
        PartialUniqueIndex {
            name: "idx_albums_name_artist",
            columns: &["name", "artist_id"],
            predicate: "kind = 'album'",
        },
        PartialUniqueIndex {
            name: "idx_playlists_name",
            columns: &["name"],
            predicate: "kind = 'playlist'",
        },
    ],
};

const ARTIST_TAGS_TABLE: Table = Table {
    name: "artist_tags",
    columns: &[
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTIST_FK)
        ),
        sqlite_column!(
            "tag_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TAG_FK)
        ),
    ],
    indices: &[("idx_artist_tags_tag", "tag_id")],
    unique_constraints: &[&["artist_id", "tag_id"]],
    check_constraints: &[],
    partial_unique_indices: &[],
};

const TRACK_POSITIONS_TABLE: Table = Table {
    name: "track_positions",
    columns: &[
        sqlite_column!(
            "tracklist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACKLIST_FK)
        ),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACK_FK)
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_track_positions_tracklist", "tracklist_id"),
        ("idx_track_positions_track", "track_id"),
    ],
    unique_constraints: &[&["position", "track_id", "tracklist_id"]],
    check_constraints: &["position > -1"],
    partial_unique_indices: &[],
};

pub const LIBRARY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        TAGS_TABLE,
        TRACKS_TABLE,
        TRACKLISTS_TABLE,
        ARTIST_TAGS_TABLE,
        TRACK_POSITIONS_TABLE,
    ],
    migration: None,
}];
