//! Search orchestrator.
//!
//! [`SearchService`] ties the registry, a [`SearchBackend`], the
//! application's repositories and a validator together. Every operation
//! re-checks that the backing collection exists and creates it from the
//! compiled schema when it does not.
//!
//! # Create race
//!
//! "Ensure the collection exists" is a check followed by a create with no
//! lock in between. Two callers touching a new collection at the same time
//! may both try to create it; the loser receives `AlreadyExists` from the
//! backend, which is logged and treated as success.
//!
//! # Partial failure
//!
//! Indexing and deletion issue one backend call per collection. A failure
//! part way leaves earlier collections updated and is reported as a
//! failure of the whole call. Nothing is retried here.

use std::fmt;
use std::sync::Arc;

use fieldmark_core::{Error, Result, id_filter, requires_url_encoding};
use serde_json::{Map, Value};

use crate::backend::{SearchBackend, SearchRequest};
use crate::context::{SearchContext, SearchResult};
use crate::document::{AnyDocument, CollectionType};
use crate::policy::NotFoundPolicy;
use crate::registry::{RegisteredCollection, SchemaRegistry};
use crate::repository::{DocumentValidator, Repository, Validator};

/// Counts reported by [`SearchService::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Whether the collection was truncated first.
    pub truncated: bool,
    /// Records sent as upserts.
    pub indexed: usize,
    /// Records submitted for deletion.
    pub deleted: usize,
}

/// Records of one collection, in first-seen order.
struct Group<'a> {
    collection: CollectionType,
    records: Vec<&'a dyn AnyDocument>,
}

fn group_by_collection<'a>(records: &[&'a dyn AnyDocument]) -> Vec<Group<'a>> {
    let mut groups: Vec<Group<'a>> = Vec::new();
    for &record in records {
        let collection = record.collection_type();
        match groups.iter_mut().find(|g| g.collection == collection) {
            Some(group) => group.records.push(record),
            None => groups.push(Group {
                collection,
                records: vec![record],
            }),
        }
    }
    groups
}

/// Orchestrates searching, indexing and deletion for registered
/// collections.
///
/// `I` is the presentation type produced by the repositories.
pub struct SearchService<I> {
    backend: Arc<dyn SearchBackend>,
    registry: Arc<SchemaRegistry>,
    repositories: Vec<Arc<dyn Repository<Item = I>>>,
    validator: Arc<dyn Validator>,
}

impl<I: Send + 'static> SearchService<I> {
    /// Create a service with no repositories and the [`DocumentValidator`].
    pub fn new(backend: Arc<dyn SearchBackend>, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            backend,
            registry,
            repositories: Vec::new(),
            validator: Arc::new(DocumentValidator),
        }
    }

    /// Add a repository. Repositories are consulted in the order added.
    pub fn with_repository<R>(mut self, repository: R) -> Self
    where
        R: Repository<Item = I> + 'static,
    {
        self.repositories.push(Arc::new(repository));
        self
    }

    /// Replace the validator.
    pub fn with_validator<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Search backend in use.
    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    /// Schema registry in use.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    fn repositories_for(
        &self,
        collection: &CollectionType,
    ) -> Vec<&Arc<dyn Repository<Item = I>>> {
        self.repositories
            .iter()
            .filter(|r| r.supports(collection))
            .collect()
    }

    /// Create the collection from its compiled schema unless it exists.
    pub async fn ensure_collection(
        &self,
        collection: &CollectionType,
    ) -> Result<&RegisteredCollection> {
        let entry = self.registry.get(collection)?;
        if self.backend.collection_exists(entry.name()).await? {
            return Ok(entry);
        }

        match self.backend.create_collection(entry.schema()).await {
            Ok(()) => {
                log::debug!("Created collection \"{}\"", entry.name());
                Ok(entry)
            }
            Err(Error::AlreadyExists { collection }) => {
                log::warn!("Collection \"{collection}\" was created concurrently; continuing");
                Ok(entry)
            }
            Err(e) => Err(e),
        }
    }

    /// Search a collection and validate every hit.
    pub async fn search(&self, context: &SearchContext) -> Result<SearchResult<I>> {
        self.run_search(context, true).await
    }

    /// Search a collection without validating hits.
    pub async fn search_unvalidated(&self, context: &SearchContext) -> Result<SearchResult<I>> {
        self.run_search(context, false).await
    }

    async fn run_search(&self, context: &SearchContext, validate: bool) -> Result<SearchResult<I>> {
        let collection = context.collection();
        let entry = self.ensure_collection(&collection).await?;
        let compiled = entry.compiled();

        let request = SearchRequest::new(context.query(), compiled.query_by.clone())
            .with_sort_by(compiled.sort_by.clone())
            .with_page(context.page(), context.page_size().get());
        let response = self.backend.search(entry.name(), &request).await?;

        let hits = response
            .get("hits")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let total_count = response.get("found").and_then(Value::as_u64).unwrap_or(0);

        let repositories = self.repositories_for(&collection);
        let mut items = Vec::new();
        if repositories.is_empty() {
            log::debug!("No repository supports \"{}\"", entry.name());
        }

        for hit in hits {
            let document = hit
                .get("document")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_else(Map::new);
            let record = entry.decode(document)?;
            if validate {
                self.validator.ensure_valid(record.as_ref())?;
            }
            items.extend(
                repositories
                    .iter()
                    .filter_map(|r| r.transform(record.as_ref(), hit)),
            );
        }

        Ok(SearchResult { items, total_count })
    }

    /// Validate and upsert records, one import per collection.
    ///
    /// Every record is validated before anything is sent. Collections are
    /// processed in the order their first record appears.
    pub async fn index(&self, records: &[&dyn AnyDocument]) -> Result<()> {
        for &record in records {
            self.validator.ensure_valid(record)?;
        }

        let groups = group_by_collection(records);
        for group in &groups {
            self.registry.get(&group.collection)?;
        }

        for group in groups {
            let documents = group
                .records
                .iter()
                .map(|r| r.to_document())
                .collect::<Result<Vec<_>>>()?;
            let entry = self.ensure_collection(&group.collection).await?;
            log::debug!(
                "Indexing {} document(s) into \"{}\"",
                documents.len(),
                entry.name()
            );
            self.backend
                .import_documents(entry.name(), documents)
                .await?;
        }
        Ok(())
    }

    /// Remove every document of a collection, creating it if missing.
    pub async fn truncate(&self, collection: &CollectionType) -> Result<()> {
        let entry = self.ensure_collection(collection).await?;
        self.backend.truncate(entry.name()).await
    }

    /// Drop a collection. Does nothing when it does not exist.
    pub async fn delete(&self, collection: &CollectionType) -> Result<()> {
        let entry = self.registry.get(collection)?;
        if self.backend.collection_exists(entry.name()).await? {
            self.backend.delete_collection(entry.name()).await?;
        }
        Ok(())
    }

    /// Dump every document of a collection as JSON lines.
    pub async fn export(&self, collection: &CollectionType) -> Result<String> {
        let entry = self.registry.get(collection)?;
        self.backend.export(entry.name()).await
    }

    /// Delete records from their collections.
    ///
    /// A single record goes through [`SearchService::delete_document`].
    /// Several records are deleted with one `id:[...]` filter per
    /// collection; when a filter deletes nothing the not-found condition is
    /// resolved by `policy`.
    pub async fn delete_documents(
        &self,
        records: &[&dyn AnyDocument],
        policy: NotFoundPolicy,
    ) -> Result<()> {
        match records {
            [] => Ok(()),
            [record] => self.delete_document(*record, policy).await,
            _ => {
                for group in group_by_collection(records) {
                    let ids = group
                        .records
                        .iter()
                        .map(|r| r.record_id())
                        .collect::<Result<Vec<_>>>()?;
                    let entry = self.ensure_collection(&group.collection).await?;

                    let deleted = self
                        .backend
                        .delete_by_filter(entry.name(), &id_filter(&ids))
                        .await?;
                    if deleted == 0 {
                        policy.resolve(Error::not_found(format!(
                            "Could not find any document for given IDs: {}",
                            ids.join(", ")
                        )))?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Delete one record by its ID.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` when the ID would need URL encoding. A
    /// missing document is resolved by `policy`.
    pub async fn delete_document(
        &self,
        record: &dyn AnyDocument,
        policy: NotFoundPolicy,
    ) -> Result<()> {
        let id = record.record_id()?;
        if requires_url_encoding(&id) {
            return Err(Error::invalid_schema(format!(
                "The provided ID \"{id}\" must not require URL encoding."
            )));
        }

        let entry = self.ensure_collection(&record.collection_type()).await?;
        let outcome = self.backend.delete_document(entry.name(), &id).await;
        policy.apply(outcome).map(|_| ())
    }

    /// Bring a collection in line with the repositories' data.
    ///
    /// Optionally truncates first. For every repository supporting the
    /// collection, records of that collection are upserted and deletions
    /// are applied with [`NotFoundPolicy::Log`].
    pub async fn sync(&self, collection: &CollectionType, truncate: bool) -> Result<SyncStats> {
        let mut stats = SyncStats::default();
        if truncate {
            self.truncate(collection).await?;
            stats.truncated = true;
        }

        for repository in self.repositories_for(collection) {
            let mut data = repository.data().await?;
            data.retain_collection(collection);

            if !data.upserts.is_empty() {
                let upserts: Vec<&dyn AnyDocument> =
                    data.upserts.iter().map(|r| r.as_ref()).collect();
                self.index(&upserts).await?;
                stats.indexed += upserts.len();
            }

            if !data.deletions.is_empty() {
                let deletions: Vec<&dyn AnyDocument> =
                    data.deletions.iter().map(|r| r.as_ref()).collect();
                self.delete_documents(&deletions, NotFoundPolicy::Log).await?;
                stats.deleted += deletions.len();
            }
        }
        Ok(stats)
    }
}

impl<I> Clone for SearchService<I> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            registry: Arc::clone(&self.registry),
            repositories: self.repositories.clone(),
            validator: Arc::clone(&self.validator),
        }
    }
}

impl<I> fmt::Debug for SearchService<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchService")
            .field("backend", &self.backend.name())
            .field("collections", &self.registry.names())
            .field("repositories", &self.repositories.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
