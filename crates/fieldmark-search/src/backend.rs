//! Search backend trait and request types.
//!
//! This module defines the `SearchBackend` trait that every search engine
//! client must satisfy. The orchestrator talks to the engine only through
//! this trait.
//!
//! # Backends
//!
//! - `TypesenseBackend`: REST client for a Typesense-compatible service
//! - `MemoryBackend`: in-process store for tests and demos
//!
//! # Example
//!
//! ```rust,ignore
//! use fieldmark_search::{SearchBackend, SearchRequest, TypesenseBackend};
//!
//! let backend = TypesenseBackend::new(&config.backend)?;
//! let request = SearchRequest::new("harmony", compiled.query_by.clone())
//!     .with_sort_by(compiled.sort_by.clone());
//! let response = backend.search("content", &request).await?;
//! println!("{}", response["found"]);
//! ```

use async_trait::async_trait;
use fieldmark_core::Result;
use fieldmark_schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query that matches every document.
pub const MATCH_ALL: &str = "*";

/// Parameters of a search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text. `*` matches everything.
    pub q: String,

    /// 1-based page number.
    pub page: u32,

    /// Hits per page.
    pub per_page: u32,

    /// Comma-separated fields to search.
    pub query_by: String,

    /// Comma-separated sort expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
}

impl SearchRequest {
    /// Create a request for the first page of ten hits.
    ///
    /// A blank query is replaced by [`MATCH_ALL`].
    pub fn new(q: impl Into<String>, query_by: impl Into<String>) -> Self {
        let q = q.into();
        let q = if q.trim().is_empty() {
            MATCH_ALL.to_string()
        } else {
            q
        };
        Self {
            q,
            page: 1,
            per_page: 10,
            query_by: query_by.into(),
            sort_by: None,
        }
    }

    /// Set the page and page size.
    pub fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    /// Set the sort expression.
    pub fn with_sort_by(mut self, sort_by: Option<String>) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Request parameters as query-string pairs.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("q", self.q.clone()),
            ("query_by", self.query_by.clone()),
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sort_by", sort_by.clone()));
        }
        pairs
    }
}

/// Abstract search engine client.
///
/// Implementations map engine failures onto the shared error taxonomy:
/// a missing collection or document is `NotFound`, creating a collection
/// that exists is `AlreadyExists`, everything else is `Backend`.
///
/// # Async
///
/// Every operation is a request/response round trip. Timeouts and
/// cancellation belong to the implementation's transport.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Whether the collection exists.
    async fn collection_exists(&self, collection: &str) -> Result<bool>;

    /// Create a collection from a schema.
    async fn create_collection(&self, schema: &Schema) -> Result<()>;

    /// Run a query. Returns the raw response body.
    async fn search(&self, collection: &str, request: &SearchRequest) -> Result<Value>;

    /// Insert or replace documents in one batch.
    async fn import_documents(
        &self,
        collection: &str,
        documents: Vec<Map<String, Value>>,
    ) -> Result<()>;

    /// Delete the documents matching a `filter_by` expression. Returns the
    /// number deleted.
    async fn delete_by_filter(&self, collection: &str, filter_by: &str) -> Result<u64>;

    /// Delete one document by ID.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<()>;

    /// Remove every document but keep the collection.
    async fn truncate(&self, collection: &str) -> Result<()>;

    /// Drop the collection.
    async fn delete_collection(&self, collection: &str) -> Result<()>;

    /// Dump every document as JSON lines.
    async fn export(&self, collection: &str) -> Result<String>;

    /// Get the backend name for diagnostics.
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
