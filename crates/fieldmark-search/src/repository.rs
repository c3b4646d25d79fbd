//! Capabilities supplied by the application: data sources that know how to
//! present hits, and record validation.

use async_trait::async_trait;
use fieldmark_core::{Error, Result, Violation};
use serde_json::Value;

use crate::document::{AnyDocument, CollectionType};

/// Records a repository wants indexed or removed.
#[derive(Default)]
pub struct RepositoryData {
    /// Records to insert or replace.
    pub upserts: Vec<Box<dyn AnyDocument>>,
    /// Records to delete.
    pub deletions: Vec<Box<dyn AnyDocument>>,
}

impl RepositoryData {
    /// Keep only records of the given collection type.
    pub fn retain_collection(&mut self, collection: &CollectionType) {
        self.upserts.retain(|r| r.collection_type() == *collection);
        self.deletions.retain(|r| r.collection_type() == *collection);
    }

    /// Whether there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletions.is_empty()
    }
}

impl std::fmt::Debug for RepositoryData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryData")
            .field("upserts", &self.upserts.len())
            .field("deletions", &self.deletions.len())
            .finish()
    }
}

/// Application-side source and presenter of records.
///
/// One repository may serve several collection types; `supports` decides.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Presentation type produced from hits.
    type Item: Send;

    /// Whether this repository handles the collection type.
    fn supports(&self, collection: &CollectionType) -> bool;

    /// Current records to sync into the search backend.
    async fn data(&self) -> Result<RepositoryData>;

    /// Turn a decoded hit into a presentation item.
    ///
    /// `hit` is the raw hit including highlights and text-match metadata.
    /// Returning `None` drops the hit from the result.
    fn transform(&self, record: &dyn AnyDocument, hit: &Value) -> Option<Self::Item>;
}

/// Checks records before they are indexed or returned.
pub trait Validator: Send + Sync {
    /// Constraint violations of the record. Empty when valid.
    fn validate(&self, record: &dyn AnyDocument) -> Vec<Violation>;

    /// Fail with `ValidationFailed` when the record has violations.
    fn ensure_valid(&self, record: &dyn AnyDocument) -> Result<()> {
        let violations = self.validate(record);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::validation_failed(
                record.collection_type().type_name(),
                violations,
            ))
        }
    }
}

/// Validator deferring to each record's own [`Document::validate`](crate::Document::validate).
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentValidator;

impl Validator for DocumentValidator {
    fn validate(&self, record: &dyn AnyDocument) -> Vec<Violation> {
        record.violations()
    }
}
