use anyhow::{Context, Result};
use std::time::Duration;

use tracing::info;

use axum::{
    extract::State, middleware, response::IntoResponse, routing::get, Json, Router,
};
use serde::Serialize;

use super::{
    http_cache, library_routes::library_routes, log_requests, state::*,
    stream_track::stream_routes, tracklist_routes::tracklist_routes, ServerConfig,
};
use crate::library_store::SqliteLibraryStore;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

pub fn make_app(config: ServerConfig, store: SqliteLibraryStore) -> Result<Router> {
    let state = ServerState::new(config.clone(), store, env!("GIT_HASH").to_string());

    let stream_routes: Router = stream_routes()
        .layer(middleware::from_fn_with_state(
            config.content_cache_age_sec,
            http_cache,
        ))
        .with_state(state.clone());

    let api_routes: Router = Router::new()
        .route("/", get(home))
        .merge(library_routes())
        .merge(tracklist_routes())
        .with_state(state.clone());

    let app: Router = api_routes
        .merge(stream_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(config: ServerConfig, store: SqliteLibraryStore) -> Result<()> {
    let port = config.port;
    let app = make_app(config, store)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on 127.0.0.1:{}", port);

    Ok(axum::serve(listener, app).await?)
}
