//! Fieldmark umbrella crate.
//!
//! This crate re-exports all Fieldmark components for convenience.

#![doc = include_str!("../README.md")]

pub use fieldmark_core as core;
pub use fieldmark_schema as schema;
pub use fieldmark_search as search;

/// Types needed by most applications.
pub mod prelude {
    pub use fieldmark_core::{BackendConfig, Config, Error, Result, Violation};
    pub use fieldmark_schema::{
        CompiledSchema, FieldAttribute, FieldDescriptor, FieldType, RecordDescriptor,
        SortDirection,
    };
    pub use fieldmark_search::{
        AnyDocument, CollectionType, Document, MemoryBackend, NotFoundPolicy, PageSize,
        Repository, RepositoryData, SchemaRegistry, SearchBackend, SearchContext, SearchResult,
        SearchService, TypesenseBackend, Validator,
    };
    pub use std::sync::Arc;
}
