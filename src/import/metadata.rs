//! Audio file tag extraction.

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::ItemKey;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("missing tag: {0}")]
    MissingTag(&'static str),
    #[error("failed to read audio tags: {0}")]
    Read(#[from] lofty::error::LoftyError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The tags an import needs from one audio file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AudioTags {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub genres: Vec<String>,
    /// Whole seconds
    pub length: u32,
}

pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<AudioTags, MetadataError>;
}

/// Reads ID3, Vorbis comments, MP4 and FLAC tags through `lofty`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoftyExtractor;

impl MetadataExtractor for LoftyExtractor {
    fn extract(&self, path: &Path) -> Result<AudioTags, MetadataError> {
        let mut file = File::open(path)?;
        let tagged_file = lofty::read_from(&mut file)?;
        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
            .ok_or(MetadataError::MissingTag("artist"))?;

        let required = |key: ItemKey, name: &'static str| {
            tag.get_string(&key)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or(MetadataError::MissingTag(name))
        };

        Ok(AudioTags {
            artist: required(ItemKey::TrackArtist, "artist")?,
            album: required(ItemKey::AlbumTitle, "album")?,
            title: required(ItemKey::TrackTitle, "title")?,
            genres: tag
                .get_strings(&ItemKey::Genre)
                .map(str::to_string)
                .collect(),
            length: tagged_file.properties().duration().as_secs() as u32,
        })
    }
}
