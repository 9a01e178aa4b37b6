//! Library Import Tool
//!
//! Walks a music directory and stores every readable audio file, one unit of
//! work per directory, into the library database.

use anyhow::{bail, Result};
use clap::Parser;
use owa_server::config::{AppConfig, CliConfig, FileConfig};
use owa_server::import::{store_directory, LoftyExtractor};
use owa_server::SqliteLibraryStore;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "owa-import")]
#[command(about = "Import a music directory into the library database")]
struct Args {
    /// Root of the music directory; defaults to `library_path` from the config file
    #[arg(value_name = "LIBRARY_PATH")]
    library_path: Option<PathBuf>,

    /// Path to the SQLite library database file
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let file_config = args.config.as_deref().map(FileConfig::load).transpose()?;
    let cli = CliConfig {
        db_path: args.db_path.clone(),
        library_path: args.library_path.clone(),
        ..Default::default()
    };
    let config = AppConfig::resolve(&cli, file_config)?;

    // An explicit argument wins over the config file here.
    let Some(library_path) = args.library_path.or(config.library_path) else {
        bail!("LIBRARY_PATH must be given as an argument or via library_path in config file");
    };

    info!("Library Import Tool");
    info!("===================");
    info!("Library path: {}", library_path.display());
    info!("Database: {}", config.db_path.display());

    let store = SqliteLibraryStore::new(&config.db_path)?;
    let report = store_directory(&store, &library_path, &LoftyExtractor)?;

    info!("");
    info!("Import Summary");
    info!("==============");
    info!("Files stored: {}", report.stored);
    info!("Files skipped: {}", report.skipped);
    if report.failed > 0 {
        warn!("Files failed: {}", report.failed);
        for group in &report.failed_groups {
            warn!(
                "  {} (artist: {}, album: {}, track: {}): {}",
                group.directory.display(),
                group.artist.as_deref().unwrap_or("?"),
                group.album.as_deref().unwrap_or("?"),
                group.track.as_deref().unwrap_or("?"),
                group.error
            );
        }
    }

    Ok(())
}
