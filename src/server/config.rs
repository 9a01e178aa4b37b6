use super::RequestsLoggingLevel;
use crate::library_store::DEFAULT_PAGE_LIMIT;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// `Cache-Control: max-age` applied to streamed audio
    pub content_cache_age_sec: usize,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            content_cache_age_sec: 3600,
            default_page_limit: DEFAULT_PAGE_LIMIT,
            max_page_limit: 100,
        }
    }
}
