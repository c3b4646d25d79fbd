//! Integration tests for searching and indexing through the orchestrator.

use fieldmark_core::{Error, Result};
use fieldmark_schema::{FieldAttribute, FieldDescriptor, RecordDescriptor};
use fieldmark_search::{
    AnyDocument, CollectionType, Document, NotFoundPolicy, PageSize, RecordedCall, SearchContext,
};
use serde::{Deserialize, Serialize};

use crate::common::{Article, Hit, Photo, TestHarness, sample_articles};

async fn index_samples(harness: &TestHarness) -> Result<()> {
    let articles: Vec<Article> = sample_articles()
        .into_iter()
        .filter(|a| !a.archived)
        .collect();
    let records: Vec<&dyn AnyDocument> = articles.iter().map(|a| a as &dyn AnyDocument).collect();
    harness.service.index(&records).await
}

#[tokio::test]
async fn test_search_returns_transformed_hits_in_order() {
    let harness = TestHarness::new();
    index_samples(&harness).await.unwrap();

    let context = SearchContext::of::<Article>().with_query("rust");
    let result = harness.service.search(&context).await.unwrap();

    assert_eq!(result.total_count, 3);
    let labels: Vec<&str> = result.items.iter().map(|h| h.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Async Rust (2019)", "Intro to Rust (2015)", "Macros (2017)"]
    );
}

#[tokio::test]
async fn test_search_paginates() {
    let harness = TestHarness::new();
    index_samples(&harness).await.unwrap();

    let context = SearchContext::of::<Article>()
        .with_page_size(PageSize::Two)
        .with_page(2)
        .unwrap();
    let result = harness.service.search(&context).await.unwrap();

    assert_eq!(result.total_count, 3);
    assert_eq!(
        result.items,
        vec![Hit {
            id: "macros".to_string(),
            label: "Macros (2017)".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_search_creates_missing_collection() {
    let harness = TestHarness::new();
    let result = harness
        .service
        .search(&SearchContext::of::<Photo>())
        .await
        .unwrap();
    assert!(result.items.is_empty());

    let expected = harness
        .service
        .registry()
        .get_type::<Photo>()
        .unwrap()
        .schema()
        .clone();
    assert_eq!(harness.backend.schema("photo"), Some(expected));
}

#[tokio::test]
async fn test_search_hydrates_derived_ids() {
    let harness = TestHarness::new();
    let photo = Photo::new("summer", "Beach day");
    harness.service.index(&[&photo]).await.unwrap();

    let result = harness
        .service
        .search(&SearchContext::of::<Photo>().with_query("beach"))
        .await
        .unwrap();
    assert_eq!(
        result.items,
        vec![Hit {
            id: "summer_Beach_day".to_string(),
            label: "Beach day".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_index_groups_by_collection_in_first_seen_order() {
    let harness = TestHarness::new();
    let beach = Photo::new("summer", "Beach day");
    let intro = Article::new("intro", "Intro to Rust", "Ownership", 2015);
    let snow = Photo::new("winter", "Snow");

    harness
        .service
        .index(&[&beach, &intro, &snow])
        .await
        .unwrap();

    let imports: Vec<RecordedCall> = harness
        .backend
        .calls()
        .into_iter()
        .filter(|c| matches!(c, RecordedCall::Import { .. }))
        .collect();
    assert_eq!(
        imports,
        vec![
            RecordedCall::Import {
                collection: "photo".to_string(),
                ids: vec!["summer_Beach_day".to_string(), "winter_Snow".to_string()],
            },
            RecordedCall::Import {
                collection: "article".to_string(),
                ids: vec!["intro".to_string()],
            },
        ]
    );
}

#[tokio::test]
async fn test_index_aborts_on_any_invalid_record() {
    let harness = TestHarness::new();
    let good = Article::new("good", "Good", "Fine", 2020);
    let blank = Article::new("blank", " ", "No title", 2020);

    let err = harness.service.index(&[&good, &blank]).await.unwrap_err();
    match err {
        Error::ValidationFailed { violations, .. } => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field, "title");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(harness.backend.calls().is_empty());
}

#[derive(Debug, Serialize, Deserialize)]
struct Unregistered {
    id: String,
}

impl Document for Unregistered {
    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::builder("Unregistered")
            .field(FieldDescriptor::string("id").attribute(FieldAttribute::new().query()))
            .build()
    }
}

#[tokio::test]
async fn test_unregistered_types_are_rejected_before_any_write() {
    let harness = TestHarness::new();
    let intro = Article::new("intro", "Intro", "x", 2015);
    let stray = Unregistered {
        id: "stray".to_string(),
    };

    let err = harness.service.index(&[&intro, &stray]).await.unwrap_err();
    assert!(matches!(err, Error::UnregisteredType { .. }));
    assert!(harness.backend.calls().is_empty());

    let err = harness
        .service
        .search(&SearchContext::of::<Unregistered>())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnregisteredType { .. }));
}

#[tokio::test]
async fn test_truncate_and_export() {
    let harness = TestHarness::new();
    let article = CollectionType::of::<Article>();
    index_samples(&harness).await.unwrap();

    let dump = harness.service.export(&article).await.unwrap();
    let lines: Vec<serde_json::Value> = dump
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["id"], "intro");
    assert_eq!(lines[0]["archived"], false);

    harness.service.truncate(&article).await.unwrap();
    assert_eq!(harness.service.export(&article).await.unwrap(), "");
}

#[tokio::test]
async fn test_export_of_missing_collection_is_not_found() {
    let harness = TestHarness::new();
    let err = harness
        .service
        .export(&CollectionType::of::<Photo>())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_documents_across_collections() {
    let harness = TestHarness::new();
    let intro = Article::new("intro", "Intro", "x", 2015);
    let async_rust = Article::new("async", "Async", "y", 2019);
    let beach = Photo::new("summer", "Beach day");
    harness
        .service
        .index(&[&intro, &async_rust, &beach])
        .await
        .unwrap();

    harness
        .service
        .delete_documents(&[&intro, &beach, &async_rust], NotFoundPolicy::Fail)
        .await
        .unwrap();

    assert!(harness.backend.documents("article").unwrap().is_empty());
    assert!(harness.backend.documents("photo").unwrap().is_empty());
    let filters: Vec<String> = harness
        .backend
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            RecordedCall::DeleteByFilter { filter_by, .. } => Some(filter_by),
            _ => None,
        })
        .collect();
    assert_eq!(
        filters,
        vec![
            "id:[`intro`,`async`]".to_string(),
            "id:[`summer_Beach_day`]".to_string()
        ]
    );
}
