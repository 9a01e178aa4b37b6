use thiserror::Error;

/// Failures surfaced by library operations.
///
/// The `Display` output of each variant is the message returned to API
/// callers in the `{"error": ...}` payload.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("no artist found")]
    NoArtist,

    #[error("no tags found")]
    NoTags,

    #[error("tracklist not found")]
    TracklistNotFound,

    #[error("tracks not found")]
    NoTracks,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("json not submitted or malformed")]
    Malformed,

    #[error("album can not be modified")]
    AlbumImmutable,

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("internal error")]
    Internal(String),
}

impl LibraryError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, LibraryError::ConstraintViolation(_))
    }
}

pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl From<rusqlite::Error> for LibraryError {
    fn from(err: rusqlite::Error) -> Self {
        if is_constraint_violation(&err) {
            LibraryError::ConstraintViolation(err.to_string())
        } else {
            LibraryError::Internal(err.to_string())
        }
    }
}
