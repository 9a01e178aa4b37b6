//! Shared constants for end-to-end tests
//!
//! When the seeded library changes, update only this file and `fixtures.rs`.

// ============================================================================
// Seeded Library Metadata
// ============================================================================

/// Artist with tags and an album
pub const ARTIST_1_NAME: &str = "Obscura";

/// Artist without tags or albums
pub const ARTIST_2_NAME: &str = "Atheist";

/// Composite tag phrases applied to artist 1
pub const ARTIST_1_TAG_PHRASES: [&str; 2] = ["Technical Death-Metal", "progressive"];

/// Atomic tags artist 1 ends up with, sorted
pub const ARTIST_1_TAGS: [&str; 4] = ["death", "metal", "progressive", "technical"];

/// Album by artist 1
pub const ALBUM_1_TITLE: &str = "Cosmogenesis";

/// Album track titles and lengths in seconds, in album order
pub const ALBUM_1_TRACKS: [(&str, u32); 3] = [
    ("Anticosmic Overload", 318),
    ("Orbital Elements", 268),
    ("Incarnated", 335),
];

/// Playlist holding the last album track
pub const PLAYLIST_1_NAME: &str = "Favourites";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

// ============================================================================
// Test File Sizes
// ============================================================================

/// Size of every seeded audio file (bytes)
pub const TEST_AUDIO_SIZE_BYTES: usize = 8400;
