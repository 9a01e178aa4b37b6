//! JSON shapes returned by the API.

use crate::error::LibraryError;
use crate::library_store::{
    format_length, Artist, Page, PageRequest, Tag, Track, TracklistEntry, TracklistStats,
    Tracklist,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, error};

use super::ServerConfig;

impl LibraryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LibraryError::NoArtist
            | LibraryError::TracklistNotFound
            | LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
            LibraryError::NoTags | LibraryError::NoTracks | LibraryError::Malformed => {
                StatusCode::BAD_REQUEST
            }
            LibraryError::AlreadyExists(_)
            | LibraryError::ConstraintViolation(_)
            | LibraryError::AlbumImmutable => StatusCode::CONFLICT,
            LibraryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LibraryError {
    fn into_response(self) -> Response {
        if let LibraryError::Internal(details) = &self {
            error!("Internal error: {}", details);
        }
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Unwraps a JSON request body, reporting any rejection as `Malformed`.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, LibraryError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            Err(LibraryError::Malformed)
        }
    }
}

/// Unwraps query parameters, reporting a bad query string as `Malformed`.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, LibraryError> {
    match query {
        Ok(Query(value)) => Ok(value),
        Err(rejection) => {
            debug!("Rejected query string: {}", rejection.body_text());
            Err(LibraryError::Malformed)
        }
    }
}

/// Unwraps a path parameter, reporting an unparsable segment as `Malformed`.
pub fn path_param<T>(path: Result<Path<T>, PathRejection>) -> Result<T, LibraryError> {
    match path {
        Ok(Path(value)) => Ok(value),
        Err(rejection) => {
            debug!("Rejected path parameter: {}", rejection.body_text());
            Err(LibraryError::Malformed)
        }
    }
}

/// `?page=&limit=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn to_request(&self, config: &ServerConfig) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(config.default_page_limit),
            config.max_page_limit,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

impl Links {
    /// Links for one page of the collection at `path`.
    pub fn for_page<T>(path: &str, page: &Page<T>) -> Links {
        let at = |n: u32| format!("{}?page={}&limit={}", path, n, page.limit);
        Links {
            self_link: at(page.page),
            collection: path.to_string(),
            next: page.has_next().then(|| at(page.page + 1)),
            prev: page.has_previous().then(|| at(page.page - 1)),
        }
    }
}

/// Builds `{"<root_key>": [...], "total", "page", "limit", "total_pages", "links"}`.
pub fn list_body<T: Serialize>(
    root_key: &str,
    path: &str,
    page: Page<T>,
) -> Result<Json<Value>, LibraryError> {
    let links = Links::for_page(path, &page);
    let mut body = Map::new();
    body.insert(root_key.to_string(), to_value(&page.items)?);
    body.insert("total".to_string(), json!(page.total));
    body.insert("page".to_string(), json!(page.page));
    body.insert("limit".to_string(), json!(page.limit));
    body.insert("total_pages".to_string(), json!(page.total_pages));
    body.insert("links".to_string(), to_value(&links)?);
    Ok(Json(Value::Object(body)))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, LibraryError> {
    serde_json::to_value(value).map_err(|err| LibraryError::Internal(err.to_string()))
}

#[derive(Debug, Serialize)]
pub struct TrackView {
    pub id: i64,
    pub name: String,
    pub artist_id: i64,
    pub length: u32,
    pub length_display: String,
    pub stream: String,
}

impl From<&Track> for TrackView {
    fn from(track: &Track) -> Self {
        TrackView {
            id: track.id,
            name: track.name.clone(),
            artist_id: track.artist_id,
            length: track.length,
            length_display: format_length(track.length as u64),
            stream: format!("/stream/{}", track.stream_id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrackDetail {
    #[serde(flatten)]
    pub track: TrackView,
    pub artist: Option<Artist>,
    pub tracklists: Vec<Tracklist>,
}

#[derive(Debug, Serialize)]
pub struct TracklistSummary {
    #[serde(flatten)]
    pub tracklist: Tracklist,
    pub total_tracks: usize,
    pub length: u64,
    pub length_display: String,
}

impl From<(Tracklist, TracklistStats)> for TracklistSummary {
    fn from((tracklist, stats): (Tracklist, TracklistStats)) -> Self {
        TracklistSummary {
            tracklist,
            total_tracks: stats.total_tracks,
            length: stats.length,
            length_display: format_length(stats.length),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PositionedTrack {
    pub position: usize,
    #[serde(flatten)]
    pub track: TrackView,
}

#[derive(Debug, Serialize)]
pub struct TracklistDetail {
    #[serde(flatten)]
    pub summary: TracklistSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<Artist>,
    pub tracks: Vec<PositionedTrack>,
}

impl TracklistDetail {
    pub fn new(tracklist: Tracklist, artist: Option<Artist>, entries: Vec<TracklistEntry>) -> Self {
        let stats = TracklistStats {
            total_tracks: entries.len(),
            length: entries.iter().map(|e| e.track.length as u64).sum(),
        };
        TracklistDetail {
            summary: (tracklist, stats).into(),
            artist,
            tracks: entries
                .iter()
                .map(|entry| PositionedTrack {
                    position: entry.position,
                    track: (&entry.track).into(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArtistDetail {
    pub id: i64,
    pub name: String,
    pub tags: Vec<Tag>,
    pub albums: Vec<Tracklist>,
}

#[derive(Debug, Serialize)]
pub struct TagDetail {
    pub id: i64,
    pub name: String,
    pub artists: Vec<Artist>,
    pub total_artists: u64,
    pub links: TagLinks,
}

#[derive(Debug, Serialize)]
pub struct TagLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub artists: String,
}
