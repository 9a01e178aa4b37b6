//! Artist, tag, track and album routes.
//!
//! - GET/POST /artist/
//! - GET/POST /artist/{id}/
//! - GET/POST /tag/
//! - GET /tag/{name}/
//! - GET /tag/{name}/artists
//! - GET/POST /track/
//! - GET /track/{id}/
//! - GET /album/
//! - GET /album/{id}/

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::state::ServerState;
use super::views::*;
use crate::error::LibraryError;
use crate::library_store::{
    Artist, NewTrack, PageRequest, TracklistFilter, UnitOfWork,
};
use crate::tags::{apply_tags, decompose, resolve_tags};

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct NewArtistBody {
    name: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ArtistTagsBody {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct NewTagBody {
    name: Option<String>,
}

/// An artist given either by id or by exact name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArtistRef {
    Id(i64),
    Name(String),
}

#[derive(Debug, Deserialize)]
struct NewTrackBody {
    name: String,
    artist: ArtistRef,
    length: u32,
    location: String,
}

// =============================================================================
// Artists
// =============================================================================

fn artist_detail(uow: &UnitOfWork<'_>, artist: Artist) -> Result<ArtistDetail, LibraryError> {
    Ok(ArtistDetail {
        tags: uow.artist_tags(artist.id)?,
        albums: uow.artist_albums(artist.id)?,
        id: artist.id,
        name: artist.name,
    })
}

async fn list_artists(
    State(state): State<ServerState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>, LibraryError> {
    let query = query_params(query)?;
    let request = query.to_request(&state.config);
    let page = state.store.unit_of_work(|uow| uow.list_artists(request))?;
    list_body("artists", "/artist/", page)
}

async fn post_artist(
    State(state): State<ServerState>,
    body: Result<Json<NewArtistBody>, JsonRejection>,
) -> Result<impl IntoResponse, LibraryError> {
    let body = json_body(body)?;
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(LibraryError::Malformed)?;

    let detail = state.store.unit_of_work(|uow| {
        let artist = uow.create_artist(name)?;
        if let Some(tags) = body.tags.as_deref().filter(|tags| !tags.is_empty()) {
            apply_tags(uow, Some(tags), Some(&artist))?;
        }
        artist_detail(uow, artist)
    })?;
    debug!("Created artist {} ({})", detail.name, detail.id);
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_artist(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ArtistDetail>, LibraryError> {
    let id = path_param(id)?;
    let detail = state.store.unit_of_work(|uow| {
        let artist = uow.artist(id)?.ok_or(LibraryError::NoArtist)?;
        artist_detail(uow, artist)
    })?;
    Ok(Json(detail))
}

/// Applies composite tag phrases to an artist, answering with the new tags.
async fn post_artist_tags(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<ArtistTagsBody>, JsonRejection>,
) -> Result<Json<Value>, LibraryError> {
    let id = path_param(id)?;
    let body = json_body(body)?;
    let tags = state.store.unit_of_work(|uow| {
        let artist = uow.artist(id)?;
        apply_tags(uow, body.tags.as_deref(), artist.as_ref())
    })?;
    Ok(Json(json!({ "tags": tags })))
}

// =============================================================================
// Tags
// =============================================================================

async fn list_tags(
    State(state): State<ServerState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>, LibraryError> {
    let query = query_params(query)?;
    let request = query.to_request(&state.config);
    let page = state.store.unit_of_work(|uow| uow.list_tags(request))?;
    list_body("tags", "/tag/", page)
}

/// Resolves a composite phrase into its atomic tags, creating missing ones.
async fn post_tag(
    State(state): State<ServerState>,
    body: Result<Json<NewTagBody>, JsonRejection>,
) -> Result<impl IntoResponse, LibraryError> {
    let body = json_body(body)?;
    let names = body.name.as_deref().map(decompose).unwrap_or_default();
    if names.is_empty() {
        return Err(LibraryError::NoTags);
    }
    let tags = state
        .store
        .unit_of_work(|uow| resolve_tags(&uow.tx, &mut uow.cache, &names))?;
    Ok((StatusCode::CREATED, Json(json!({ "tags": tags }))))
}

async fn get_tag(
    State(state): State<ServerState>,
    name: Result<Path<String>, PathRejection>,
) -> Result<Json<TagDetail>, LibraryError> {
    let name = path_param(name)?.to_lowercase();
    let request = PageRequest::new(1, state.config.default_page_limit, state.config.max_page_limit);
    let detail = state.store.unit_of_work(|uow| {
        let tag = uow.tag_by_name(&name)?.ok_or(LibraryError::NotFound("tag"))?;
        let artists = uow.tag_artists(tag.id, request)?;
        let segment = urlencoding::encode(&tag.name);
        Ok(TagDetail {
            links: TagLinks {
                self_link: format!("/tag/{}/", segment),
                artists: format!("/tag/{}/artists", segment),
            },
            id: tag.id,
            name: tag.name,
            total_artists: artists.total,
            artists: artists.items,
        })
    })?;
    Ok(Json(detail))
}

async fn list_tag_artists(
    State(state): State<ServerState>,
    name: Result<Path<String>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>, LibraryError> {
    let name = path_param(name)?.to_lowercase();
    let query = query_params(query)?;
    let request = query.to_request(&state.config);
    let page = state.store.unit_of_work(|uow| {
        let tag = uow.tag_by_name(&name)?.ok_or(LibraryError::NotFound("tag"))?;
        uow.tag_artists(tag.id, request)
    })?;
    let path = format!("/tag/{}/artists", urlencoding::encode(&name));
    list_body("artists", &path, page)
}

// =============================================================================
// Tracks
// =============================================================================

async fn list_tracks(
    State(state): State<ServerState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>, LibraryError> {
    let query = query_params(query)?;
    let request = query.to_request(&state.config);
    let page = state.store.unit_of_work(|uow| uow.list_tracks(request))?;
    list_body("tracks", "/track/", page.map(|track| TrackView::from(&track)))
}

async fn post_track(
    State(state): State<ServerState>,
    body: Result<Json<NewTrackBody>, JsonRejection>,
) -> Result<impl IntoResponse, LibraryError> {
    let body = json_body(body)?;
    let track = state.store.unit_of_work(|uow| {
        let artist = match &body.artist {
            ArtistRef::Id(id) => uow.artist(*id)?,
            ArtistRef::Name(name) => uow.artist_by_name(name)?,
        }
        .ok_or(LibraryError::NoArtist)?;
        uow.insert_track(NewTrack {
            artist_id: artist.id,
            name: body.name,
            length: body.length,
            location: body.location,
        })
    })?;
    Ok((StatusCode::CREATED, Json(TrackView::from(&track))))
}

async fn get_track(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<TrackDetail>, LibraryError> {
    let id = path_param(id)?;
    let detail = state.store.unit_of_work(|uow| {
        let track = uow.track(id)?.ok_or(LibraryError::NotFound("track"))?;
        Ok(TrackDetail {
            artist: uow.artist(track.artist_id)?,
            tracklists: uow.track_tracklists(track.id)?,
            track: TrackView::from(&track),
        })
    })?;
    Ok(Json(detail))
}

// =============================================================================
// Albums
// =============================================================================

async fn list_albums(
    State(state): State<ServerState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>, LibraryError> {
    let query = query_params(query)?;
    let request = query.to_request(&state.config);
    let page = state
        .store
        .unit_of_work(|uow| uow.list_tracklists(TracklistFilter::Albums, request))?;
    list_body("albums", "/album/", page.map(TracklistSummary::from))
}

async fn get_album(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<TracklistDetail>, LibraryError> {
    let id = path_param(id)?;
    let detail = state.store.unit_of_work(|uow| {
        let album = uow
            .tracklist(id)?
            .filter(|tracklist| tracklist.is_album())
            .ok_or(LibraryError::NotFound("album"))?;
        super::tracklist_routes::tracklist_detail(uow, album)
    })?;
    Ok(Json(detail))
}

pub fn library_routes() -> Router<ServerState> {
    Router::new()
        .route("/artist/", get(list_artists).post(post_artist))
        .route("/artist/{id}/", get(get_artist).post(post_artist_tags))
        .route("/tag/", get(list_tags).post(post_tag))
        .route("/tag/{name}/", get(get_tag))
        .route("/tag/{name}/artists", get(list_tag_artists))
        .route("/track/", get(list_tracks).post(post_track))
        .route("/track/{id}/", get(get_track))
        .route("/album/", get(list_albums))
        .route("/album/{id}/", get(get_album))
}
