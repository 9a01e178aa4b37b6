//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all owa-server endpoints.
//!
//! When API routes or request formats change, update only this file.

#![allow(dead_code)]

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// GET `path` relative to the server root
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// POST a JSON body to `path`
    pub async fn post(&self, path: &str, body: Value) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .expect("POST request failed")
    }

    /// POST a raw, possibly invalid, JSON body to `path`
    pub async fn post_raw(&self, path: &str, body: &'static str) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("POST request failed")
    }

    // ========================================================================
    // Home
    // ========================================================================

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.get("/").await
    }

    // ========================================================================
    // Artists
    // ========================================================================

    /// GET /artist/?page=&limit=
    pub async fn list_artists(&self, page: u32, limit: u32) -> Response {
        self.get(&format!("/artist/?page={}&limit={}", page, limit))
            .await
    }

    /// POST /artist/
    pub async fn create_artist(&self, name: &str, tags: &[&str]) -> Response {
        self.post("/artist/", json!({ "name": name, "tags": tags }))
            .await
    }

    /// GET /artist/{id}/
    pub async fn get_artist(&self, id: i64) -> Response {
        self.get(&format!("/artist/{}/", id)).await
    }

    /// POST /artist/{id}/
    pub async fn tag_artist(&self, id: i64, tags: &[&str]) -> Response {
        self.post(&format!("/artist/{}/", id), json!({ "tags": tags }))
            .await
    }

    // ========================================================================
    // Tags
    // ========================================================================

    /// GET /tag/
    pub async fn list_tags(&self) -> Response {
        self.get("/tag/").await
    }

    /// POST /tag/
    pub async fn create_tags(&self, phrase: &str) -> Response {
        self.post("/tag/", json!({ "name": phrase })).await
    }

    /// GET /tag/{name}/
    pub async fn get_tag(&self, name: &str) -> Response {
        self.get(&format!("/tag/{}/", name)).await
    }

    /// GET /tag/{name}/artists
    pub async fn get_tag_artists(&self, name: &str) -> Response {
        self.get(&format!("/tag/{}/artists", name)).await
    }

    // ========================================================================
    // Tracks and albums
    // ========================================================================

    /// GET /track/
    pub async fn list_tracks(&self) -> Response {
        self.get("/track/").await
    }

    /// POST /track/
    pub async fn create_track(&self, body: Value) -> Response {
        self.post("/track/", body).await
    }

    /// GET /track/{id}/
    pub async fn get_track(&self, id: i64) -> Response {
        self.get(&format!("/track/{}/", id)).await
    }

    /// GET /album/
    pub async fn list_albums(&self) -> Response {
        self.get("/album/").await
    }

    /// GET /album/{id}/
    pub async fn get_album(&self, id: i64) -> Response {
        self.get(&format!("/album/{}/", id)).await
    }

    // ========================================================================
    // Tracklists and playlists
    // ========================================================================

    /// GET /tracklist/
    pub async fn list_tracklists(&self) -> Response {
        self.get("/tracklist/").await
    }

    /// GET /tracklist/{id}/
    pub async fn get_tracklist(&self, id: i64) -> Response {
        self.get(&format!("/tracklist/{}/", id)).await
    }

    /// POST /tracklist/{id}/
    pub async fn extend_tracklist(&self, id: i64, tracks: Value) -> Response {
        self.post(&format!("/tracklist/{}/", id), json!({ "tracks": tracks }))
            .await
    }

    /// GET /playlist/
    pub async fn list_playlists(&self) -> Response {
        self.get("/playlist/").await
    }

    /// POST /playlist/
    pub async fn create_playlist(&self, name: &str, tracks: Value) -> Response {
        self.post("/playlist/", json!({ "name": name, "tracks": tracks }))
            .await
    }

    /// GET /playlist/{id}/
    pub async fn get_playlist(&self, id: i64) -> Response {
        self.get(&format!("/playlist/{}/", id)).await
    }

    /// POST /playlist/{id}/
    pub async fn extend_playlist(&self, id: i64, tracks: Value) -> Response {
        self.post(&format!("/playlist/{}/", id), json!({ "tracks": tracks }))
            .await
    }

    // ========================================================================
    // Streaming
    // ========================================================================

    /// GET /stream/{stream_id}
    pub async fn stream_track(&self, stream_id: &str) -> Response {
        self.get(&format!("/stream/{}", stream_id)).await
    }

    /// GET /stream/{stream_id} with a Range header
    pub async fn stream_track_with_range(&self, stream_id: &str, range: &str) -> Response {
        self.client
            .get(format!("{}/stream/{}", self.base_url, stream_id))
            .header("Range", range)
            .send()
            .await
            .expect("Stream request failed")
    }
}
