mod file_config;

pub use file_config::FileConfig;

use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub library_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
}

impl Default for CliConfig {
    fn default() -> Self {
        let server = ServerConfig::default();
        CliConfig {
            db_path: None,
            library_path: None,
            port: server.port,
            logging_level: server.requests_logging_level,
            content_cache_age_sec: server.content_cache_age_sec,
            default_page_limit: server.default_page_limit,
            max_page_limit: server.max_page_limit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// Default root for `owa-import`
    pub library_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        let parent = match db_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.is_dir() {
            bail!("Database directory does not exist: {:?}", parent);
        }

        let library_path = file
            .library_path
            .map(PathBuf::from)
            .or_else(|| cli.library_path.clone());

        let port = file.port.unwrap_or(cli.port);

        let logging_level = match file.logging_level {
            Some(s) => match parse_logging_level(&s) {
                Some(level) => level,
                None => bail!("Invalid logging_level in config file: {}", s),
            },
            None => cli.logging_level.clone(),
        };

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);
        let default_page_limit = file.default_page_limit.unwrap_or(cli.default_page_limit);
        let max_page_limit = file.max_page_limit.unwrap_or(cli.max_page_limit);

        if default_page_limit == 0 || max_page_limit == 0 {
            bail!("Page limits must be at least 1");
        }
        if default_page_limit > max_page_limit {
            bail!(
                "default_page_limit ({}) exceeds max_page_limit ({})",
                default_page_limit,
                max_page_limit
            );
        }

        Ok(Self {
            db_path,
            library_path,
            port,
            logging_level,
            content_cache_age_sec,
            default_page_limit,
            max_page_limit,
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            content_cache_age_sec: self.content_cache_age_sec,
            default_page_limit: self.default_page_limit,
            max_page_limit: self.max_page_limit,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
