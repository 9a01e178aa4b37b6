//! End-to-end tests for artist, tag, track and album endpoints

mod common;

use common::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn names(items: &Value) -> Vec<String> {
    items
        .as_array()
        .expect("expected an array")
        .iter()
        .map(|item| item["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_home_reports_uptime() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_home().await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert!(body["uptime"].is_string());
    assert!(body["hash"].is_string());
}

// =============================================================================
// Artists
// =============================================================================

#[tokio::test]
async fn test_list_artists_is_paginated_by_name() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.list_artists(1, 1).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(names(&body["artists"]), vec![ARTIST_2_NAME]);
    assert_eq!(body["total"], 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["links"]["self"], "/artist/?page=1&limit=1");
    assert_eq!(body["links"]["next"], "/artist/?page=2&limit=1");
    assert!(body["links"].get("prev").is_none());

    let body: Value = client.list_artists(2, 1).await.json().await.unwrap();
    assert_eq!(names(&body["artists"]), vec![ARTIST_1_NAME]);
    assert!(body["links"].get("next").is_none());
}

#[tokio::test]
async fn test_get_artist_includes_tags_and_albums() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_artist(server.library.obscura_id).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], ARTIST_1_NAME);
    assert_eq!(names(&body["tags"]), ARTIST_1_TAGS);
    assert_eq!(names(&body["albums"]), vec![ALBUM_1_TITLE]);
    assert_eq!(body["albums"][0]["kind"], "album");
}

#[tokio::test]
async fn test_get_unknown_artist_returns_404() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_artist(9999).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "no artist found");
}

#[tokio::test]
async fn test_create_artist_with_tags() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.create_artist("Cynic", &["Jazz Fusion", "metal"]).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Cynic");
    assert_eq!(names(&body["tags"]), vec!["fusion", "jazz", "metal"]);

    // "metal" is shared with the seeded artist
    let body: Value = client.get_tag("metal").await.json().await.unwrap();
    assert_eq!(body["total_artists"], 2);
}

#[tokio::test]
async fn test_create_duplicate_artist_conflicts() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.create_artist(ARTIST_1_NAME, &[]).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], format!("{} already exists", ARTIST_1_NAME));
}

#[tokio::test]
async fn test_create_artist_requires_name() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.post("/artist/", json!({ "name": "   " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.post_raw("/artist/", "not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "json not submitted or malformed");
}

#[tokio::test]
async fn test_tag_artist_returns_only_new_tags() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .tag_artist(server.library.obscura_id, &["Death Metal/Jazz"])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(names(&body["tags"]), vec!["jazz"]);

    let body: Value = client
        .get_artist(server.library.obscura_id)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["tags"].as_array().unwrap().len(), ARTIST_1_TAGS.len() + 1);
}

#[tokio::test]
async fn test_tag_artist_errors() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    // Unknown artist is reported before the tags are looked at
    let response = client.tag_artist(9999, &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "no artist found");

    let response = client.tag_artist(server.library.atheist_id, &[" / ,"]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "no tags found");
}

// =============================================================================
// Tags
// =============================================================================

#[tokio::test]
async fn test_list_tags() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body: Value = client.list_tags().await.json().await.unwrap();
    assert_eq!(names(&body["tags"]), ARTIST_1_TAGS);
    assert_eq!(body["total"], ARTIST_1_TAGS.len());
}

#[tokio::test]
async fn test_create_tags_from_phrase_reuses_existing() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.create_tags("Black-Metal").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(names(&body["tags"]), vec!["black", "metal"]);

    let body: Value = client.list_tags().await.json().await.unwrap();
    assert_eq!(body["total"], ARTIST_1_TAGS.len() + 1);

    let response = client.create_tags(" - ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_tag_with_artists() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    // Tag names are matched case-insensitively
    let response = client.get_tag("Technical").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "technical");
    assert_eq!(names(&body["artists"]), vec![ARTIST_1_NAME]);
    assert_eq!(body["links"]["artists"], "/tag/technical/artists");

    let body: Value = client
        .get_tag_artists("technical")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(names(&body["artists"]), vec![ARTIST_1_NAME]);

    let response = client.get_tag("polka").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "tag not found");
}

// =============================================================================
// Tracks and albums
// =============================================================================

#[tokio::test]
async fn test_list_tracks_exposes_stream_links() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body: Value = client.list_tracks().await.json().await.unwrap();
    let expected: Vec<&str> = ALBUM_1_TRACKS.iter().map(|(name, _)| *name).collect();
    assert_eq!(names(&body["tracks"]), expected);
    assert_eq!(
        body["tracks"][0]["stream"],
        format!("/stream/{}", server.library.stream_ids[0])
    );
    assert_eq!(body["tracks"][0]["length_display"], "05:18");
    assert!(body["tracks"][0].get("location").is_none());
}

#[tokio::test]
async fn test_get_track_lists_its_tracklists() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_track(server.library.track_ids[2]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], ALBUM_1_TRACKS[2].0);
    assert_eq!(body["artist"]["name"], ARTIST_1_NAME);
    assert_eq!(names(&body["tracklists"]), vec![ALBUM_1_TITLE, PLAYLIST_1_NAME]);

    let response = client.get_track(9999).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_track() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .create_track(json!({
            "name": "Unquestionable Presence",
            "artist": ARTIST_2_NAME,
            "length": 245,
            "location": "/music/atheist/unquestionable.flac"
        }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["artist_id"], server.library.atheist_id);
    assert_eq!(body["length_display"], "04:05");

    // Same location twice
    let response = client
        .create_track(json!({
            "name": "Again",
            "artist": server.library.atheist_id,
            "length": 1,
            "location": "/music/atheist/unquestionable.flac"
        }))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .create_track(json!({
            "name": "Nobody",
            "artist": "Unknown Artist",
            "length": 1,
            "location": "/music/nobody.mp3"
        }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "no artist found");
}

#[tokio::test]
async fn test_albums() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body: Value = client.list_albums().await.json().await.unwrap();
    assert_eq!(names(&body["albums"]), vec![ALBUM_1_TITLE]);
    assert_eq!(body["albums"][0]["total_tracks"], 3);

    let response = client.get_album(server.library.album_id).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["artist"]["name"], ARTIST_1_NAME);
    let total: u32 = ALBUM_1_TRACKS.iter().map(|(_, length)| length).sum();
    assert_eq!(body["length"], total);
    let positions: Vec<i64> = body["tracks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["position"].as_i64().unwrap())
        .collect();
    assert_eq!(positions, vec![0, 1, 2]);

    // A playlist is not an album
    let response = client.get_album(server.library.playlist_id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "album not found");
}
