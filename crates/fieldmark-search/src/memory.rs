//! In-process search backend.
//!
//! Keeps collections in memory and answers queries by linear scan. Used by
//! tests and demos where a running search service is not available.
//!
//! # Limitations
//!
//! - O(n) search time
//! - Case-insensitive substring matching only, no typo tolerance
//! - `filter_by` supports `id:[...]` expressions only

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use fieldmark_core::{Error, Result};
use fieldmark_schema::Schema;
use serde_json::{Map, Value, json};

use crate::backend::{MATCH_ALL, SearchBackend, SearchRequest};
use crate::document::ID_FIELD;

/// A request received by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// `collection_exists`
    CollectionExists(String),
    /// `create_collection`
    CreateCollection(String),
    /// `search`
    Search {
        /// Collection name
        collection: String,
        /// Request parameters
        request: SearchRequest,
    },
    /// `import_documents`
    Import {
        /// Collection name
        collection: String,
        /// IDs of the imported documents, in order
        ids: Vec<String>,
    },
    /// `delete_by_filter`
    DeleteByFilter {
        /// Collection name
        collection: String,
        /// Filter expression
        filter_by: String,
    },
    /// `delete_document`
    DeleteDocument {
        /// Collection name
        collection: String,
        /// Document ID
        id: String,
    },
    /// `truncate`
    Truncate(String),
    /// `delete_collection`
    DeleteCollection(String),
    /// `export`
    Export(String),
}

#[derive(Debug)]
struct StoredCollection {
    schema: Schema,
    documents: Vec<(String, Map<String, Value>)>,
}

impl StoredCollection {
    fn position(&self, id: &str) -> Option<usize> {
        self.documents.iter().position(|(doc_id, _)| doc_id == id)
    }
}

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, StoredCollection>,
    calls: Vec<RecordedCall>,
}

impl State {
    fn collection(&self, name: &str) -> Result<&StoredCollection> {
        self.collections.get(name).ok_or_else(|| missing_collection(name))
    }

    fn collection_mut(&mut self, name: &str) -> Result<&mut StoredCollection> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| missing_collection(name))
    }
}

fn missing_collection(name: &str) -> Error {
    Error::not_found(format!("No collection with name `{name}` found."))
}

/// Search backend that stores collections in memory.
///
/// Documents keep their insertion order; an upsert of an existing ID
/// replaces the document in place. Every request is journaled and can be
/// inspected with [`MemoryBackend::calls`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requests received so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    /// Forget the recorded requests.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Schema a collection was created with.
    pub fn schema(&self, collection: &str) -> Option<Schema> {
        self.state()
            .collections
            .get(collection)
            .map(|c| c.schema.clone())
    }

    /// Stored documents of a collection, in insertion order.
    pub fn documents(&self, collection: &str) -> Option<Vec<Map<String, Value>>> {
        self.state()
            .collections
            .get(collection)
            .map(|c| c.documents.iter().map(|(_, doc)| doc.clone()).collect())
    }

    /// Names of the existing collections, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().collections.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        let mut state = self.state();
        state
            .calls
            .push(RecordedCall::CollectionExists(collection.to_string()));
        Ok(state.collections.contains_key(collection))
    }

    async fn create_collection(&self, schema: &Schema) -> Result<()> {
        let mut state = self.state();
        let name = schema.name().to_string();
        state.calls.push(RecordedCall::CreateCollection(name.clone()));
        if state.collections.contains_key(&name) {
            return Err(Error::AlreadyExists { collection: name });
        }
        state.collections.insert(
            name,
            StoredCollection {
                schema: schema.clone(),
                documents: Vec::new(),
            },
        );
        Ok(())
    }

    async fn search(&self, collection: &str, request: &SearchRequest) -> Result<Value> {
        let mut state = self.state();
        state.calls.push(RecordedCall::Search {
            collection: collection.to_string(),
            request: request.clone(),
        });
        let stored = state.collection(collection)?;

        let fields: Vec<&str> = request.query_by.split(',').map(str::trim).collect();
        let needle = request.q.trim().to_lowercase();
        let mut matches: Vec<&Map<String, Value>> = stored
            .documents
            .iter()
            .map(|(_, doc)| doc)
            .filter(|doc| needle == MATCH_ALL || matches_query(doc, &fields, &needle))
            .collect();

        if let Some(sort_by) = &request.sort_by {
            let keys = parse_sort_by(sort_by);
            matches.sort_by(|a, b| compare_documents(a, b, &keys));
        }

        let found = matches.len();
        let per_page = request.per_page as usize;
        let offset = (request.page.max(1) as usize - 1).saturating_mul(per_page);
        let hits: Vec<Value> = matches
            .into_iter()
            .skip(offset)
            .take(per_page)
            .map(|doc| json!({"document": doc, "highlights": []}))
            .collect();

        Ok(json!({
            "found": found,
            "out_of": stored.documents.len(),
            "page": request.page,
            "hits": hits,
            "request_params": {
                "collection_name": collection,
                "q": request.q,
                "per_page": request.per_page,
            },
        }))
    }

    async fn import_documents(
        &self,
        collection: &str,
        documents: Vec<Map<String, Value>>,
    ) -> Result<()> {
        let mut state = self.state();
        let mut ids = Vec::with_capacity(documents.len());
        for document in &documents {
            match document.get(ID_FIELD) {
                Some(Value::String(id)) => ids.push(id.clone()),
                _ => {
                    return Err(Error::backend_status(
                        400,
                        "Document is missing a string `id` field.",
                    ));
                }
            }
        }
        state.calls.push(RecordedCall::Import {
            collection: collection.to_string(),
            ids: ids.clone(),
        });

        let stored = state.collection_mut(collection)?;
        for (id, document) in ids.into_iter().zip(documents) {
            match stored.position(&id) {
                Some(i) => stored.documents[i].1 = document,
                None => stored.documents.push((id, document)),
            }
        }
        Ok(())
    }

    async fn delete_by_filter(&self, collection: &str, filter_by: &str) -> Result<u64> {
        let mut state = self.state();
        state.calls.push(RecordedCall::DeleteByFilter {
            collection: collection.to_string(),
            filter_by: filter_by.to_string(),
        });
        let ids = parse_id_filter(filter_by)?;
        let stored = state.collection_mut(collection)?;

        let before = stored.documents.len();
        stored.documents.retain(|(id, _)| !ids.contains(id));
        Ok((before - stored.documents.len()) as u64)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(RecordedCall::DeleteDocument {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        let stored = state.collection_mut(collection)?;
        match stored.position(id) {
            Some(i) => {
                stored.documents.remove(i);
                Ok(())
            }
            None => Err(Error::not_found(format!(
                "Could not find a document with id: {id}"
            ))),
        }
    }

    async fn truncate(&self, collection: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(RecordedCall::Truncate(collection.to_string()));
        state.collection_mut(collection)?.documents.clear();
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        let mut state = self.state();
        state
            .calls
            .push(RecordedCall::DeleteCollection(collection.to_string()));
        state
            .collections
            .remove(collection)
            .map(|_| ())
            .ok_or_else(|| missing_collection(collection))
    }

    async fn export(&self, collection: &str) -> Result<String> {
        let mut state = self.state();
        state.calls.push(RecordedCall::Export(collection.to_string()));
        let stored = state.collection(collection)?;
        let lines = stored
            .documents
            .iter()
            .map(|(_, doc)| serde_json::to_string(doc))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(lines.join("\n"))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn matches_query(document: &Map<String, Value>, fields: &[&str], needle: &str) -> bool {
    fields
        .iter()
        .filter_map(|field| document.get(*field))
        .any(|value| value_contains(value, needle))
}

fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        Value::Array(items) => items.iter().any(|item| value_contains(item, needle)),
        _ => false,
    }
}

/// Sort keys of a `sort_by` expression. Relevance entries are skipped
/// since every match scores the same here.
fn parse_sort_by(sort_by: &str) -> Vec<(String, bool)> {
    sort_by
        .split(',')
        .filter_map(|entry| {
            let (field, direction) = entry.trim().split_once(':')?;
            if field.starts_with('_') {
                return None;
            }
            Some((field.to_string(), direction.eq_ignore_ascii_case("desc")))
        })
        .collect()
}

fn compare_documents(a: &Map<String, Value>, b: &Map<String, Value>, keys: &[(String, bool)]) -> Ordering {
    for (field, descending) in keys {
        let ordering = compare_values(a.get(field), b.get(field));
        let ordering = if *descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// Parse an `id:[...]` filter. Values may be bare or wrapped in backticks,
/// with doubled backticks standing for one.
fn parse_id_filter(filter_by: &str) -> Result<Vec<String>> {
    let unsupported =
        || Error::backend_status(400, format!("Unsupported filter expression: {filter_by}"));
    let list = filter_by
        .trim()
        .strip_prefix("id:")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('['))
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(unsupported)?;

    let mut ids = Vec::new();
    let mut chars = list.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else { break };

        let mut id = String::new();
        if first == '`' {
            chars.next();
            loop {
                match chars.next() {
                    Some('`') if chars.peek() == Some(&'`') => {
                        chars.next();
                        id.push('`');
                    }
                    Some('`') => break,
                    Some(c) => id.push(c),
                    None => return Err(unsupported()),
                }
            }
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                id.push(c);
            }
            id = id.trim().to_string();
        }
        ids.push(id);

        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(_) => return Err(unsupported()),
        }
    }
    Ok(ids)
}

// ============================================================================
// Tests
// ============================================================================
