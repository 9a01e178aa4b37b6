//! owa music library server
//!
//! This library exposes the internal modules for the binaries and tests.

pub mod config;
pub mod error;
pub mod import;
pub mod library_store;
pub mod server;
pub mod sqlite_persistence;
pub mod tags;
pub mod tracklist;

// Re-export commonly used types for convenience
pub use error::LibraryError;
pub use library_store::{SqliteLibraryStore, UnitOfWork};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
