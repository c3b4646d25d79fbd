//! Integration tests for repository-driven collection sync.

use fieldmark_search::{CollectionType, RecordedCall, SearchBackend, SyncStats};
use serde_json::json;

use crate::common::{Article, Photo, StaticRepository, TestHarness, sample_articles};

#[tokio::test]
async fn test_sync_indexes_upserts_and_logs_missing_deletions() {
    let harness = TestHarness::new();
    let stats = harness
        .service
        .sync(&CollectionType::of::<Article>(), false)
        .await
        .expect("sync should tolerate the missing archived article");

    assert_eq!(
        stats,
        SyncStats {
            truncated: false,
            indexed: 3,
            deleted: 1,
        }
    );
    let ids: Vec<String> = harness
        .backend
        .documents("article")
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["intro", "async", "macros"]);
}

#[tokio::test]
async fn test_sync_removes_archived_records() {
    let harness = TestHarness::new();
    let legacy = sample_articles().pop().unwrap();
    harness
        .service
        .index(&[&Article {
            archived: false,
            ..legacy
        }])
        .await
        .unwrap();

    harness
        .service
        .sync(&CollectionType::of::<Article>(), false)
        .await
        .unwrap();

    assert!(harness.backend.calls().contains(&RecordedCall::DeleteDocument {
        collection: "article".to_string(),
        id: "legacy".to_string(),
    }));
    assert_eq!(harness.backend.documents("article").unwrap().len(), 3);
}

#[tokio::test]
async fn test_sync_keeps_only_records_of_the_collection() {
    let harness = TestHarness::new();
    let stats = harness
        .service
        .sync(&CollectionType::of::<Photo>(), false)
        .await
        .unwrap();

    assert_eq!(stats.indexed, 2);
    assert_eq!(stats.deleted, 0);
    assert!(harness.backend.documents("article").is_none());
    assert_eq!(harness.backend.documents("photo").unwrap().len(), 2);
}

#[tokio::test]
async fn test_sync_truncates_first() {
    let harness = TestHarness::new();
    let photo = CollectionType::of::<Photo>();
    harness.service.ensure_collection(&photo).await.unwrap();
    let stray = json!({"id": "stray", "album": "old", "caption": "Gone"});
    harness
        .backend
        .import_documents("photo", vec![stray.as_object().unwrap().clone()])
        .await
        .unwrap();

    let stats = harness.service.sync(&photo, true).await.unwrap();

    assert!(stats.truncated);
    let captions: Vec<String> = harness
        .backend
        .documents("photo")
        .unwrap()
        .iter()
        .map(|d| d["caption"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(captions, vec!["Beach day", "Snow"]);
}

#[tokio::test]
async fn test_sync_all_resolved_collections() {
    let repository = StaticRepository::new(sample_articles(), vec![Photo::new("a", "b")]);
    let fetches = repository.fetch_counter();
    let harness = TestHarness::with_repository(repository);

    let collections = harness.service.registry().resolve_names(&["all"]).unwrap();
    let mut indexed = 0;
    for collection in &collections {
        indexed += harness.service.sync(collection, false).await.unwrap().indexed;
    }

    assert_eq!(indexed, 4);
    assert_eq!(*fetches.lock().unwrap(), 2);
    assert_eq!(harness.backend.collection_names(), vec!["article", "photo"]);
}

#[tokio::test]
async fn test_sync_with_empty_repository_makes_no_calls() {
    let harness = TestHarness::with_repository(StaticRepository::default());
    let stats = harness
        .service
        .sync(&CollectionType::of::<Article>(), false)
        .await
        .unwrap();
    assert_eq!(stats, SyncStats::default());
    assert!(harness.backend.calls().is_empty());
}
