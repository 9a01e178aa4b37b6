mod models;
mod pagination;
mod schema;
mod store;
mod unique_cache;

pub use models::*;
pub use pagination::{Page, PageRequest, DEFAULT_PAGE_LIMIT};
pub use schema::LIBRARY_VERSIONED_SCHEMAS;
pub(crate) use store::select_tags_by_names;
pub use store::{SqliteLibraryStore, TracklistFilter, UnitOfWork};
pub use unique_cache::{EntityKind, UniqueCache, UniqueEntity};
