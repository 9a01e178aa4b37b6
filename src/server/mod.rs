pub mod config;
mod http_layers;
mod library_routes;
pub mod server;
pub mod state;
mod stream_track;
mod tracklist_routes;
pub mod views;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
