//! Tag normalization and application.
//!
//! Free-form tag phrases such as `"Death Metal"` or `"avant-garde_metal"` are
//! broken into atomic lower-case tags which are shared across artists.

use crate::error::LibraryError;
use crate::library_store::{
    select_tags_by_names, Artist, EntityKind, Tag, UniqueCache, UnitOfWork,
};
use rusqlite::Connection;
use std::collections::BTreeSet;
use tracing::{debug, warn};

fn is_tag_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\\' | '/' | '&' | ',' | '.' | '_' | '-')
}

/// Splits a composite tag phrase into its atomic, lower-cased tag names.
pub fn decompose(phrase: &str) -> BTreeSet<String> {
    phrase
        .split(is_tag_separator)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Decomposes every phrase and unions the results.
pub fn decompose_all<S: AsRef<str>>(phrases: &[S]) -> BTreeSet<String> {
    phrases
        .iter()
        .flat_map(|phrase| decompose(phrase.as_ref()))
        .collect()
}

/// Finds or creates a tag for every name.
///
/// Existing tags are fetched with a single query; only the missing names go
/// through find-or-create, so no name is ever inserted twice.
pub fn resolve_tags(
    conn: &Connection,
    cache: &mut UniqueCache,
    names: &BTreeSet<String>,
) -> Result<Vec<Tag>, LibraryError> {
    let mut found = select_tags_by_names(conn, names.iter().map(String::as_str))?;
    for tag in &found {
        cache.remember(tag.name.as_str(), tag);
    }

    for name in names {
        if !found.iter().any(|tag| &tag.name == name) {
            let created: Tag = cache.find_or_create(conn, name.as_str())?;
            found.push(created);
        }
    }

    found.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(found)
}

/// Resolves tags inside a savepoint. A storage failure rolls the savepoint
/// back, forgets any tags cached during the attempt and reports `NoTags`.
fn resolve_tags_isolated(
    uow: &mut UnitOfWork<'_>,
    names: &BTreeSet<String>,
) -> Result<Vec<Tag>, LibraryError> {
    let savepoint = uow.tx.savepoint()?;
    match resolve_tags(&savepoint, &mut uow.cache, names) {
        Ok(tags) => {
            savepoint.commit()?;
            Ok(tags)
        }
        Err(err) => {
            warn!("Tag resolution failed, rolling back: {}", err);
            drop(savepoint);
            uow.cache.evict_kind(EntityKind::Tag);
            Err(LibraryError::NoTags)
        }
    }
}

/// Applies composite tag phrases to an artist and returns only the tags
/// that were newly associated, sorted by name.
///
/// The artist is checked before the phrases. Phrases that are absent, empty
/// or decompose to nothing fail with `NoTags`.
pub fn apply_tags<S: AsRef<str>>(
    uow: &mut UnitOfWork<'_>,
    phrases: Option<&[S]>,
    artist: Option<&Artist>,
) -> Result<Vec<Tag>, LibraryError> {
    let artist = artist.ok_or(LibraryError::NoArtist)?;
    let names = phrases.map(decompose_all).unwrap_or_default();
    if names.is_empty() {
        return Err(LibraryError::NoTags);
    }

    let resolved = resolve_tags_isolated(uow, &names)?;
    let existing: BTreeSet<i64> = uow
        .artist_tags(artist.id)?
        .into_iter()
        .map(|tag| tag.id)
        .collect();
    let new_tags: Vec<Tag> = resolved
        .into_iter()
        .filter(|tag| !existing.contains(&tag.id))
        .collect();

    uow.add_artist_tags(artist.id, &new_tags)?;
    debug!(
        "Applied {} new tags to artist {} ({})",
        new_tags.len(),
        artist.name,
        artist.id
    );
    Ok(new_tags)
}
