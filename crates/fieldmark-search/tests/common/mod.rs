//! Common test utilities and harness for Fieldmark search integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fieldmark_core::{Result, Violation};
use fieldmark_schema::{FieldAttribute, FieldDescriptor, RecordDescriptor, SortDirection};
use fieldmark_search::{
    AnyDocument, CollectionType, Document, MemoryBackend, Repository, RepositoryData,
    SchemaRegistry, SearchService,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Article record: two queryable fields, sortable title, year as the
/// default sorting field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub year: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub archived: bool,
}

impl Article {
    pub fn new(id: &str, title: &str, summary: &str, year: i64) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            summary: summary.to_string(),
            year,
            tags: Vec::new(),
            archived: false,
        }
    }

    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }
}

impl Document for Article {
    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::builder("ArticleCollection")
            .field(FieldDescriptor::string("id"))
            .field(
                FieldDescriptor::string("title").attribute(
                    FieldAttribute::new()
                        .query()
                        .query_priority(2)
                        .sort(SortDirection::Asc),
                ),
            )
            .field(
                FieldDescriptor::string("summary")
                    .attribute(FieldAttribute::new().query().query_priority(1)),
            )
            .field(
                FieldDescriptor::int("year")
                    .attribute(FieldAttribute::new().default_sorting_field()),
            )
            .field(FieldDescriptor::array("tags", "list<string>").attribute(FieldAttribute::new()))
            .field(FieldDescriptor::bool("archived").default_value(Value::Bool(false)))
            .build()
    }

    fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        if self.id.trim().is_empty() {
            violations.push(Violation::new("id", "must not be blank"));
        }
        if self.title.trim().is_empty() {
            violations.push(Violation::new("title", "must not be blank"));
        }
        violations
    }
}

/// Photo record whose ID is derived from its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub album: String,
    pub caption: String,
}

impl Photo {
    pub fn new(album: &str, caption: &str) -> Self {
        Self {
            album: album.to_string(),
            caption: caption.to_string(),
        }
    }
}

impl Document for Photo {
    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::builder("Photo")
            .field(FieldDescriptor::string("album").attribute(FieldAttribute::new().sortable()))
            .field(FieldDescriptor::string("caption").attribute(FieldAttribute::new().query()))
            .build()
    }

    fn document_id(&self) -> Result<String> {
        Ok(format!("{}_{}", self.album, self.caption).replace(' ', "_"))
    }
}

/// Presentation item produced by [`StaticRepository`].
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub label: String,
}

/// Repository serving fixed records for every supported collection.
///
/// Archived articles are reported as deletions.
#[derive(Default)]
pub struct StaticRepository {
    articles: Vec<Article>,
    photos: Vec<Photo>,
    fetches: Arc<Mutex<usize>>,
}

impl StaticRepository {
    pub fn new(articles: Vec<Article>, photos: Vec<Photo>) -> Self {
        Self {
            articles,
            photos,
            fetches: Arc::default(),
        }
    }

    /// Shared counter of `data()` calls.
    pub fn fetch_counter(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.fetches)
    }
}

#[async_trait]
impl Repository for StaticRepository {
    type Item = Hit;

    fn supports(&self, collection: &CollectionType) -> bool {
        collection.is::<Article>() || collection.is::<Photo>()
    }

    async fn data(&self) -> Result<RepositoryData> {
        *self.fetches.lock().unwrap() += 1;

        let mut data = RepositoryData::default();
        for article in &self.articles {
            let boxed: Box<dyn AnyDocument> = Box::new(article.clone());
            if article.archived {
                data.deletions.push(boxed);
            } else {
                data.upserts.push(boxed);
            }
        }
        for photo in &self.photos {
            data.upserts.push(Box::new(photo.clone()));
        }
        Ok(data)
    }

    fn transform(&self, record: &dyn AnyDocument, _hit: &Value) -> Option<Hit> {
        if let Some(article) = record.downcast_ref::<Article>() {
            return Some(Hit {
                id: article.id.clone(),
                label: format!("{} ({})", article.title, article.year),
            });
        }
        let photo = record.downcast_ref::<Photo>()?;
        Some(Hit {
            id: record.record_id().ok()?,
            label: photo.caption.clone(),
        })
    }
}

/// Registry with [`Article`] and [`Photo`].
pub fn registry() -> Arc<SchemaRegistry> {
    Arc::new(
        SchemaRegistry::builder()
            .register::<Article>()
            .expect("Article should compile")
            .register::<Photo>()
            .expect("Photo should compile")
            .build(),
    )
}

/// Sample articles, one of them archived.
pub fn sample_articles() -> Vec<Article> {
    vec![
        Article::new("intro", "Intro to Rust", "Ownership and borrowing", 2015),
        Article::new("async", "Async Rust", "Futures and executors", 2019),
        Article::new("macros", "Macros", "Declarative and procedural rust macros", 2017),
        Article::new("legacy", "Legacy notes", "Old material", 2001).archived(),
    ]
}

/// Test harness for integration tests.
///
/// Wires a [`SearchService`] to an in-memory backend that stays accessible
/// for assertions.
pub struct TestHarness {
    /// Backend shared with the service
    pub backend: Arc<MemoryBackend>,
    /// Service under test
    pub service: SearchService<Hit>,
}

impl TestHarness {
    /// Creates a harness whose repository serves the sample data.
    pub fn new() -> Self {
        Self::with_repository(StaticRepository::new(
            sample_articles(),
            vec![Photo::new("summer", "Beach day"), Photo::new("winter", "Snow")],
        ))
    }

    /// Creates a harness with a custom repository.
    pub fn with_repository(repository: StaticRepository) -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let service = SearchService::new(backend.clone(), registry()).with_repository(repository);
        Self { backend, service }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
