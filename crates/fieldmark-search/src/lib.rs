//! Search orchestration for Fieldmark.
//!
//! This crate connects record types to a search engine:
//!
//! - [`document`]: the [`Document`] trait and the map codec
//! - [`registry`]: compiled schemas keyed by record type
//! - [`backend`]: the [`SearchBackend`] trait, with [`TypesenseBackend`] and
//!   [`MemoryBackend`] implementations
//! - [`service`]: the [`SearchService`] orchestrator
//! - [`repository`]: application-side [`Repository`] and [`Validator`]
//!   capabilities
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = Arc::new(SchemaRegistry::builder().register::<Article>()?.build());
//! let service = SearchService::new(Arc::new(MemoryBackend::new()), registry)
//!     .with_repository(ArticleRepository::default());
//!
//! service.index(&[&article]).await?;
//! let page = service.search(&SearchContext::of::<Article>().with_query("rust")).await?;
//! println!("{} of {}", page.items.len(), page.total_count);
//! ```

pub mod backend;
pub mod context;
pub mod document;
pub mod memory;
pub mod policy;
pub mod registry;
pub mod repository;
pub mod service;
pub mod typesense;

pub use backend::{MATCH_ALL, SearchBackend, SearchRequest};
pub use context::{PageSize, SearchContext, SearchResult};
pub use document::{
    AnyDocument, CollectionType, Document, ID_FIELD, from_map, from_map_with, resolve_fields,
    to_map,
};
pub use memory::{MemoryBackend, RecordedCall};
pub use policy::NotFoundPolicy;
pub use registry::{ALL_COLLECTIONS, RegisteredCollection, SchemaRegistry, SchemaRegistryBuilder};
pub use repository::{DocumentValidator, Repository, RepositoryData, Validator};
pub use service::{SearchService, SyncStats};
pub use typesense::{API_KEY_HEADER, TypesenseBackend};
