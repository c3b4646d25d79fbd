//! Demo collections backed by static sample data.
//!
//! Two record types are registered: [`Content`] for site pages and their
//! translations, [`Media`] for images and videos.

mod collections;
mod data;
mod repositories;

use std::sync::Arc;

use fieldmark_core::Result;
use fieldmark_search::{SchemaRegistry, SearchBackend, SearchService};

pub use collections::{Content, Media};
pub use data::DataRepository;
pub use repositories::{ContentRepository, MediaRepository, SearchItem};

/// Registry holding the demo record types.
pub fn registry() -> Result<SchemaRegistry> {
    Ok(SchemaRegistry::builder()
        .register::<Content>()?
        .register::<Media>()?
        .build())
}

/// Search service over the demo collections.
pub fn service(backend: Arc<dyn SearchBackend>) -> Result<SearchService<SearchItem>> {
    let data = DataRepository;
    Ok(SearchService::new(backend, Arc::new(registry()?))
        .with_repository(ContentRepository::new(data))
        .with_repository(MediaRepository::new(data)))
}
