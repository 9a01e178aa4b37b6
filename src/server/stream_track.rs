//! Audio streaming functionality

use super::state::{GuardedLibraryStore, ServerState};
use crate::error::LibraryError;
use axum::{
    body::Body,
    extract::{OptionalFromRequestParts, Path, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::path::Path as FsPath;

use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, BufReader, SeekFrom},
};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

const HEADER_BYTE_RANGE: &str = "Range";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start_inclusive: Option<u64>,
    end_inclusive: Option<u64>,
}

impl ByteRange {
    pub fn new(start_inclusive: Option<u64>, end_inclusive: Option<u64>) -> ByteRange {
        ByteRange {
            start_inclusive,
            end_inclusive,
        }
    }

    fn parse<S: AsRef<str>>(s: S) -> Option<ByteRange> {
        let v = s.as_ref().strip_prefix("bytes=")?;
        let (start, end) = v.split_once('-')?;
        if end.contains('-') {
            return None;
        }

        Some(ByteRange {
            start_inclusive: start.trim().parse::<u64>().ok(),
            end_inclusive: end.trim().parse::<u64>().ok(),
        })
    }

    /// The inclusive `(first, last)` byte positions this range selects from a
    /// file of `file_length` bytes, or `None` when it cannot be satisfied.
    /// `bytes=-n` selects the last `n` bytes.
    fn resolve(&self, file_length: u64) -> Option<(u64, u64)> {
        if file_length == 0 {
            return None;
        }
        let last_byte = file_length - 1;
        let (first, last) = match (self.start_inclusive, self.end_inclusive) {
            (None, None) => (0, last_byte),
            (Some(start), None) => (start, last_byte),
            (Some(start), Some(end)) => (start, end.min(last_byte)),
            (None, Some(suffix)) if suffix > 0 => (file_length.saturating_sub(suffix), last_byte),
            (None, Some(_)) => return None,
        };
        (first <= last).then_some((first, last))
    }

    fn is_partial(&self) -> bool {
        self.start_inclusive.is_some() || self.end_inclusive.is_some()
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for ByteRange {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts
            .headers
            .get(HEADER_BYTE_RANGE)
            .and_then(|x| x.to_str().ok())
            .and_then(ByteRange::parse))
    }
}

fn mime_from_extension(path: &FsPath) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "mp3" => Some("audio/mpeg"),
        "flac" => Some("audio/flac"),
        "ogg" | "oga" => Some("audio/ogg"),
        "m4a" => Some("audio/mp4"),
        _ => None,
    }
}

/// Sniffs the file header first, then falls back to the extension.
fn content_type(path: &FsPath) -> String {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => return kind.mime_type().to_string(),
        Ok(None) => {}
        Err(err) => debug!("Could not sniff {}: {}", path.display(), err),
    }
    mime_from_extension(path)
        .unwrap_or("application/octet-stream")
        .to_string()
}

pub async fn stream_track(
    byte_range: Option<ByteRange>,
    State(store): State<GuardedLibraryStore>,
    Path(stream_id): Path<String>,
) -> Response {
    let track = match store.unit_of_work(|uow| uow.track_by_stream_id(&stream_id)) {
        Ok(Some(track)) => track,
        Ok(None) => return LibraryError::NotFound("track").into_response(),
        Err(err) => return err.into_response(),
    };
    debug!("Streaming track {} from {}", track.name, track.location);

    let path = FsPath::new(&track.location);
    let mut file = match File::open(path).await {
        Ok(x) => x,
        Err(err) => {
            warn!("Audio file {} not readable: {}", track.location, err);
            return LibraryError::NotFound("audio file").into_response();
        }
    };

    let file_length = match file.metadata().await {
        Ok(x) => x.len(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let range = byte_range.unwrap_or(ByteRange::new(None, None));
    let (first, last) = match range.resolve(file_length) {
        Some(x) => x,
        None if file_length == 0 && !range.is_partial() => (0, 0),
        None => {
            return Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{}", file_length))
                .body(Body::empty())
                .unwrap_or_else(|_| StatusCode::RANGE_NOT_SATISFIABLE.into_response());
        }
    };
    let chunk_size = if file_length == 0 { 0 } else { last - first + 1 };

    if first > 0 && file.seek(SeekFrom::Start(first)).await.is_err() {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let status_code = if range.is_partial() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let file_reader = BufReader::with_capacity(4096 * 16, file.take(chunk_size));
    let stream = ReaderStream::with_capacity(file_reader, 4096 * 16);

    let mut response = Response::builder()
        .status(status_code)
        .header(header::CONTENT_TYPE, content_type(path))
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, chunk_size);
    if range.is_partial() {
        response = response.header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", first, last, file_length),
        );
    }
    response
        .body(Body::from_stream(stream))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

pub fn stream_routes() -> axum::Router<ServerState> {
    axum::Router::new().route("/stream/{stream_id}", axum::routing::get(stream_track))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn assert_byte_range(s: &str, a: Option<u64>, b: Option<u64>) {
        assert_eq!(ByteRange::parse(s), Some(ByteRange::new(a, b)));
    }

    fn assert_no_byte_range(s: &str) {
        assert_eq!(ByteRange::parse(s), None);
    }

    #[test]
    fn parses_byte_range() {
        assert_no_byte_range("asd");
        assert_no_byte_range("bytes=");
        assert_no_byte_range("bytes=1-2-3");
        assert_byte_range("bytes=-", None, None);
        assert_byte_range("bytes=11-", Some(11), None);
        assert_byte_range("bytes=-111", None, Some(111));
        assert_byte_range("bytes=11-111", Some(11), Some(111));
    }

    #[test]
    fn resolves_ranges_against_file_length() {
        let range = |a, b| ByteRange::new(a, b).resolve(100);
        assert_eq!(range(None, None), Some((0, 99)));
        assert_eq!(range(Some(10), None), Some((10, 99)));
        assert_eq!(range(Some(10), Some(19)), Some((10, 19)));
        assert_eq!(range(Some(90), Some(500)), Some((90, 99)));
        assert_eq!(range(None, Some(10)), Some((90, 99)));
        assert_eq!(range(None, Some(500)), Some((0, 99)));
        assert_eq!(range(Some(100), None), None);
        assert_eq!(range(Some(20), Some(10)), None);
        assert_eq!(range(None, Some(0)), None);
    }

    #[test]
    fn detects_content_type() {
        let dir = TempDir::new().unwrap();

        let sniffed = dir.path().join("track.bin");
        let mut file = std::fs::File::create(&sniffed).unwrap();
        file.write_all(b"fLaC\x00\x00\x00\x22 rest of the stream").unwrap();
        assert_eq!(content_type(&sniffed), "audio/x-flac");

        let by_extension = dir.path().join("track.OGA");
        std::fs::write(&by_extension, b"not really audio").unwrap();
        assert_eq!(content_type(&by_extension), "audio/ogg");

        let unknown = dir.path().join("track.xyz");
        std::fs::write(&unknown, b"not really audio").unwrap();
        assert_eq!(content_type(&unknown), "application/octet-stream");
    }
}
