//! Integration tests for the HTTP backend against a fake search service.
//!
//! The fake implements just enough of the REST surface to hold documents,
//! and records the parameters it receives.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use fieldmark_core::{BackendConfig, Error};
use fieldmark_search::{
    AnyDocument, CollectionType, NotFoundPolicy, SearchBackend, SearchContext, SearchService,
    TypesenseBackend,
};
use serde_json::{Map, Value, json};

use crate::common::{Article, Hit, StaticRepository, registry, sample_articles};

const API_KEY: &str = "test-key";

// ============================================================================
// Fake service
// ============================================================================

#[derive(Debug, Default)]
struct FakeCollection {
    schema: Value,
    documents: Vec<Map<String, Value>>,
}

#[derive(Debug, Default)]
struct FakeState {
    collections: HashMap<String, FakeCollection>,
    searches: Vec<HashMap<String, String>>,
    filters: Vec<String>,
    imports: Vec<HashMap<String, String>>,
}

type Shared = Arc<Mutex<FakeState>>;

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({"message": text}))).into_response()
}

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    let key = headers
        .get("x-typesense-api-key")
        .and_then(|v| v.to_str().ok());
    if key == Some(API_KEY) {
        Ok(())
    } else {
        Err(message(
            StatusCode::UNAUTHORIZED,
            "Forbidden - a valid `x-typesense-api-key` header must be sent.",
        ))
    }
}

fn not_found() -> Response {
    message(StatusCode::NOT_FOUND, "Not Found")
}

async fn get_collection(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let state = state.lock().unwrap();
    match state.collections.get(&name) {
        Some(c) => Json(json!({"name": name, "num_documents": c.documents.len()})).into_response(),
        None => not_found(),
    }
}

async fn create_collection(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(schema): Json<Value>,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let name = schema["name"].as_str().unwrap_or_default().to_string();
    let mut state = state.lock().unwrap();
    if state.collections.contains_key(&name) {
        return message(
            StatusCode::CONFLICT,
            &format!("A collection with name `{name}` already exists."),
        );
    }
    state.collections.insert(
        name,
        FakeCollection {
            schema: schema.clone(),
            documents: Vec::new(),
        },
    );
    (StatusCode::CREATED, Json(schema)).into_response()
}

async fn delete_collection(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    match state.lock().unwrap().collections.remove(&name) {
        Some(c) => Json(c.schema).into_response(),
        None => not_found(),
    }
}

async fn search(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let mut state = state.lock().unwrap();
    state.searches.push(params.clone());
    let Some(collection) = state.collections.get(&name) else {
        return not_found();
    };

    let q = params.get("q").map(|q| q.to_lowercase()).unwrap_or_default();
    let fields: Vec<&str> = params
        .get("query_by")
        .map(|f| f.split(',').collect())
        .unwrap_or_default();
    let hits: Vec<Value> = collection
        .documents
        .iter()
        .filter(|doc| {
            q == "*"
                || fields.iter().any(|f| {
                    doc.get(*f)
                        .and_then(Value::as_str)
                        .is_some_and(|v| v.to_lowercase().contains(&q))
                })
        })
        .map(|doc| json!({"document": doc, "text_match": 100}))
        .collect();

    Json(json!({"found": hits.len(), "hits": hits})).into_response()
}

async fn import(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let mut state = state.lock().unwrap();
    state.imports.push(params);
    let Some(collection) = state.collections.get_mut(&name) else {
        return not_found();
    };

    let mut results = Vec::new();
    for line in body.lines() {
        let document: Map<String, Value> = match serde_json::from_str(line) {
            Ok(document) => document,
            Err(_) => {
                results.push(json!({"success": false, "error": "Bad JSON."}).to_string());
                continue;
            }
        };
        let Some(id) = document.get("id").and_then(Value::as_str).map(str::to_string) else {
            results.push(
                json!({"success": false, "error": "Document is missing the `id` field."})
                    .to_string(),
            );
            continue;
        };
        match collection
            .documents
            .iter()
            .position(|d| d.get("id").and_then(Value::as_str) == Some(id.as_str()))
        {
            Some(i) => collection.documents[i] = document,
            None => collection.documents.push(document),
        }
        results.push(json!({"success": true}).to_string());
    }
    results.join("\n").into_response()
}

async fn delete_documents(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let mut state = state.lock().unwrap();
    if let Some(filter) = params.get("filter_by") {
        state.filters.push(filter.clone());
    }
    let Some(collection) = state.collections.get_mut(&name) else {
        return not_found();
    };

    let before = collection.documents.len();
    if params.get("truncate").map(String::as_str) == Some("true") {
        collection.documents.clear();
    } else if let Some(filter) = params.get("filter_by") {
        let ids: Vec<String> = filter
            .trim_start_matches("id:[")
            .trim_end_matches(']')
            .split(',')
            .map(|id| id.trim_matches('`').to_string())
            .collect();
        collection.documents.retain(|d| {
            !d.get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| ids.iter().any(|i| i == id))
        });
    }
    Json(json!({"num_deleted": before - collection.documents.len()})).into_response()
}

async fn delete_document(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((name, id)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let mut state = state.lock().unwrap();
    let Some(collection) = state.collections.get_mut(&name) else {
        return not_found();
    };
    match collection
        .documents
        .iter()
        .position(|d| d.get("id").and_then(Value::as_str) == Some(id.as_str()))
    {
        Some(i) => Json(collection.documents.remove(i)).into_response(),
        None => message(
            StatusCode::NOT_FOUND,
            &format!("Could not find a document with id: {id}"),
        ),
    }
}

async fn export(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let state = state.lock().unwrap();
    let Some(collection) = state.collections.get(&name) else {
        return not_found();
    };
    collection
        .documents
        .iter()
        .map(|d| serde_json::to_string(d).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
        .into_response()
}

async fn spawn_fake() -> (SocketAddr, Shared) {
    let state = Shared::default();
    let app = Router::new()
        .route("/collections", post(create_collection))
        .route(
            "/collections/{name}",
            get(get_collection).delete(delete_collection),
        )
        .route("/collections/{name}/documents", delete(delete_documents))
        .route("/collections/{name}/documents/search", get(search))
        .route("/collections/{name}/documents/import", post(import))
        .route("/collections/{name}/documents/export", get(export))
        .route("/collections/{name}/documents/{id}", delete(delete_document))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

fn backend(addr: SocketAddr, api_key: &str) -> TypesenseBackend {
    TypesenseBackend::new(&BackendConfig {
        api_key: api_key.to_string(),
        host: addr.ip().to_string(),
        port: addr.port(),
        ..BackendConfig::default()
    })
    .unwrap()
}

fn service(addr: SocketAddr) -> SearchService<Hit> {
    SearchService::new(Arc::new(backend(addr, API_KEY)), registry())
        .with_repository(StaticRepository::default())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_index_and_search_over_http() {
    let (addr, state) = spawn_fake().await;
    let service = service(addr);
    let articles: Vec<Article> = sample_articles().into_iter().take(3).collect();
    let records: Vec<&dyn AnyDocument> = articles.iter().map(|a| a as &dyn AnyDocument).collect();
    service.index(&records).await.unwrap();

    let result = service
        .search(&SearchContext::of::<Article>().with_query("Rust"))
        .await
        .unwrap();
    assert_eq!(result.total_count, 3);
    let ids: Vec<&str> = result.items.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["intro", "async", "macros"]);

    let state = state.lock().unwrap();
    let params = &state.searches[0];
    assert_eq!(params["q"], "Rust");
    assert_eq!(params["query_by"], "title,summary");
    assert_eq!(params["sort_by"], "_text_match:desc,title:asc,year:desc");
    assert_eq!(params["page"], "1");
    assert_eq!(params["per_page"], "10");
    assert_eq!(state.imports[0]["action"], "upsert");

    let schema = &state.collections["article"].schema;
    assert_eq!(schema["default_sorting_field"], "year");
    assert_eq!(
        schema["fields"][0],
        json!({"name": "title", "type": "string", "sort": true})
    );
}

#[tokio::test]
async fn test_wrong_api_key_is_backend_error() {
    let (addr, _state) = spawn_fake().await;
    let backend = backend(addr, "wrong");
    let err = backend.collection_exists("article").await.unwrap_err();
    match err {
        Error::Backend {
            status, message, ..
        } => {
            assert_eq!(status, Some(401));
            assert!(message.contains("x-typesense-api-key"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_create_conflict_is_already_exists() {
    let (addr, _state) = spawn_fake().await;
    let backend = backend(addr, API_KEY);
    let registry = registry();
    let schema = registry.get_type::<Article>().unwrap().schema();

    assert!(!backend.collection_exists("article").await.unwrap());
    backend.create_collection(schema).await.unwrap();
    assert!(backend.collection_exists("article").await.unwrap());

    let err = backend.create_collection(schema).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { ref collection } if collection == "article"));
}

#[tokio::test]
async fn test_batch_delete_sends_escaped_filter() {
    let (addr, state) = spawn_fake().await;
    let service = service(addr);
    let intro = Article::new("intro", "Intro", "x", 2015);
    let async_rust = Article::new("async", "Async", "y", 2019);
    service.index(&[&intro, &async_rust]).await.unwrap();

    service
        .delete_documents(&[&intro, &async_rust], NotFoundPolicy::Fail)
        .await
        .unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.filters, vec!["id:[`intro`,`async`]".to_string()]);
    assert!(state.collections["article"].documents.is_empty());
}

#[tokio::test]
async fn test_single_delete_missing_document() {
    let (addr, _state) = spawn_fake().await;
    let service = service(addr);
    let ghost = Article::new("ghost", "Ghost", "boo", 1999);

    let err = service
        .delete_document(&ghost, NotFoundPolicy::Fail)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("ghost"));

    service
        .delete_document(&ghost, NotFoundPolicy::Log)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_import_line_failures_are_reported() {
    let (addr, _state) = spawn_fake().await;
    let backend = backend(addr, API_KEY);
    let registry = registry();
    backend
        .create_collection(registry.get_type::<Article>().unwrap().schema())
        .await
        .unwrap();

    let good = json!({"id": "1", "title": "One"});
    let bad = json!({"title": "No id"});
    let err = backend
        .import_documents(
            "article",
            vec![
                good.as_object().unwrap().clone(),
                bad.as_object().unwrap().clone(),
            ],
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Backend error: 1 document(s) failed to import: Document is missing the `id` field."
    );
}

#[tokio::test]
async fn test_truncate_export_and_drop() {
    let (addr, state) = spawn_fake().await;
    let service = service(addr);
    let article = CollectionType::of::<Article>();
    let intro = Article::new("intro", "Intro", "x", 2015);
    service.index(&[&intro]).await.unwrap();

    let dump = service.export(&article).await.unwrap();
    let line: Value = serde_json::from_str(&dump).unwrap();
    assert_eq!(line["id"], "intro");
    assert_eq!(line["year"], 2015);

    service.truncate(&article).await.unwrap();
    assert_eq!(service.export(&article).await.unwrap(), "");

    service.delete(&article).await.unwrap();
    assert!(state.lock().unwrap().collections.is_empty());
    service.delete(&article).await.unwrap();
}

#[tokio::test]
async fn test_unreachable_service_is_retryable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = backend(addr, API_KEY)
        .collection_exists("article")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Backend { status: None, .. }));
    assert!(err.is_retryable());
}
