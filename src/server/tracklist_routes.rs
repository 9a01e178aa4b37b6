//! Tracklist and playlist routes.
//!
//! Both `/tracklist/` and `/playlist/` list playlists; albums are listed
//! under `/album/`. `/tracklist/{id}/` resolves any kind of tracklist.
//! Creating through either collection always makes a playlist; album track
//! order is owned by the importer and cannot be changed over HTTP.

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
use crate::library_store::{Tracklist, TracklistFilter, UnitOfWork};
use crate::tracklist::{extend_tracklist, new_playlist, TrackRef};

#[derive(Debug, Deserialize)]
struct NewPlaylistBody {
    name: Option<String>,
    #[serde(default)]
    tracks: Option<Vec<TrackRef>>,
}

#[derive(Debug, Deserialize)]
struct ExtendBody {
    #[serde(default)]
    tracks: Option<Vec<TrackRef>>,
}

pub(super) fn tracklist_detail(
    uow: &UnitOfWork<'_>,
    tracklist: Tracklist,
) -> Result<TracklistDetail, LibraryError> {
    let artist = match tracklist.kind.artist_id() {
        Some(artist_id) => uow.artist(artist_id)?,
        None => None,
    };
    let entries = uow.tracklist_entries(tracklist.id)?;
    Ok(TracklistDetail::new(tracklist, artist, entries))
}

async fn list_playlists(
    State(state): State<ServerState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>, LibraryError> {
    let query = query_params(query)?;
    let request = query.to_request(&state.config);
    let page = state
        .store
        .unit_of_work(|uow| uow.list_tracklists(TracklistFilter::Playlists, request))?;
    list_body("playlists", "/playlist/", page.map(TracklistSummary::from))
}

async fn post_playlist(
    State(state): State<ServerState>,
    body: Result<Json<NewPlaylistBody>, JsonRejection>,
) -> Result<impl IntoResponse, LibraryError> {
    let body = json_body(body)?;
    let detail = state.store.unit_of_work(|uow| {
        let (playlist, tracks) = new_playlist(uow, body.name.as_deref(), body.tracks.as_deref())?;
        debug!(
            "Created playlist {} ({}) with {} tracks",
            playlist.name,
            playlist.id,
            tracks.len()
        );
        tracklist_detail(uow, playlist)
    })?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Loads tracklist `id`, restricted to playlists when `playlists_only`.
fn find_tracklist(
    uow: &UnitOfWork<'_>,
    id: i64,
    playlists_only: bool,
) -> Result<Option<Tracklist>, LibraryError> {
    Ok(uow
        .tracklist(id)?
        .filter(|tracklist| !playlists_only || !tracklist.is_album()))
}

fn get_detail(
    state: &ServerState,
    id: i64,
    playlists_only: bool,
) -> Result<Json<TracklistDetail>, LibraryError> {
    let detail = state.store.unit_of_work(|uow| {
        let tracklist =
            find_tracklist(uow, id, playlists_only)?.ok_or(LibraryError::TracklistNotFound)?;
        tracklist_detail(uow, tracklist)
    })?;
    Ok(Json(detail))
}

fn extend(
    state: &ServerState,
    id: i64,
    playlists_only: bool,
    body: ExtendBody,
) -> Result<Json<Value>, LibraryError> {
    let tracks = state.store.unit_of_work(|uow| {
        let tracklist = find_tracklist(uow, id, playlists_only)?;
        if tracklist.as_ref().is_some_and(Tracklist::is_album) {
            return Err(LibraryError::AlbumImmutable);
        }
        extend_tracklist(uow, body.tracks.as_deref(), tracklist.as_ref())
    })?;
    let tracks: Vec<TrackView> = tracks.iter().map(TrackView::from).collect();
    Ok(Json(json!({ "tracks": tracks })))
}

async fn get_tracklist(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<TracklistDetail>, LibraryError> {
    let id = path_param(id)?;
    get_detail(&state, id, false)
}

async fn get_playlist(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<TracklistDetail>, LibraryError> {
    let id = path_param(id)?;
    get_detail(&state, id, true)
}

async fn post_tracklist(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<ExtendBody>, JsonRejection>,
) -> Result<Json<Value>, LibraryError> {
    let id = path_param(id)?;
    extend(&state, id, false, json_body(body)?)
}

async fn post_playlist_tracks(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<ExtendBody>, JsonRejection>,
) -> Result<Json<Value>, LibraryError> {
    let id = path_param(id)?;
    extend(&state, id, true, json_body(body)?)
}

pub fn tracklist_routes() -> Router<ServerState> {
    Router::new()
        .route("/tracklist/", get(list_playlists).post(post_playlist))
        .route("/tracklist/{id}/", get(get_tracklist).post(post_tracklist))
        .route("/playlist/", get(list_playlists).post(post_playlist))
        .route("/playlist/{id}/", get(get_playlist).post(post_playlist_tracks))
}
