use axum::extract::FromRef;

use crate::library_store::SqliteLibraryStore;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedLibraryStore = SqliteLibraryStore;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub store: GuardedLibraryStore,
    pub hash: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, store: SqliteLibraryStore, hash: String) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            store,
            hash,
        }
    }
}

impl FromRef<ServerState> for GuardedLibraryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.store.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
