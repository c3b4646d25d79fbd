//! Typesense REST backend.
//!
//! Speaks the collection and document endpoints of the Typesense HTTP API.
//! Every request carries the `X-TYPESENSE-API-KEY` header and is bounded
//! by the configured timeout.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `collection_exists` | `GET /collections/{name}` |
//! | `create_collection` | `POST /collections` |
//! | `search` | `GET /collections/{name}/documents/search` |
//! | `import_documents` | `POST /collections/{name}/documents/import?action=upsert` |
//! | `delete_by_filter` | `DELETE /collections/{name}/documents?filter_by=...` |
//! | `delete_document` | `DELETE /collections/{name}/documents/{id}` |
//! | `truncate` | `DELETE /collections/{name}/documents?truncate=true` |
//! | `delete_collection` | `DELETE /collections/{name}` |
//! | `export` | `GET /collections/{name}/documents/export` |

use async_trait::async_trait;
use fieldmark_core::{BackendConfig, Error, Result};
use fieldmark_schema::Schema;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::backend::{SearchBackend, SearchRequest};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-typesense-api-key";

/// Search backend talking to a Typesense-compatible service over HTTP.
pub struct TypesenseBackend {
    client: Client,
    base_url: String,
}

impl TypesenseBackend {
    /// Build a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when the settings are incomplete or the
    /// API key is not a valid header value.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        config.validate()?;

        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| Error::config(format!("backend.api_key is not a valid header: {e}")))?;
        api_key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::backend_with_source("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collections_url(&self) -> String {
        format!("{}/collections", self.base_url)
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/collections/{collection}", self.base_url)
    }

    fn documents_url(&self, collection: &str) -> String {
        format!("{}/collections/{collection}/documents", self.base_url)
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| Error::backend_with_source(format!("{context}: request failed"), e))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> Result<T> {
        response.json().await.map_err(|e| {
            Error::backend_with_source(format!("{context}: response parse failed"), e)
        })
    }

    async fn read_text(response: Response, context: &str) -> Result<String> {
        response.text().await.map_err(|e| {
            Error::backend_with_source(format!("{context}: response read failed"), e)
        })
    }
}

/// Map a non-success response onto the error taxonomy.
async fn check_status(response: Response, collection: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string()
    });

    Err(match status {
        StatusCode::NOT_FOUND => Error::not_found(message),
        StatusCode::CONFLICT => Error::AlreadyExists {
            collection: collection.to_string(),
        },
        _ => Error::backend_status(status.as_u16(), message),
    })
}

fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.message)
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
}

#[derive(Debug, Deserialize)]
struct ImportLine {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    num_deleted: u64,
}

/// Check the JSON-lines body of an import response.
fn check_import_response(body: &str) -> Result<()> {
    let mut failed = 0usize;
    let mut first_error = None;
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let result: ImportLine = serde_json::from_str(line)?;
        if !result.success {
            failed += 1;
            if first_error.is_none() {
                first_error = result.error;
            }
        }
    }

    if failed == 0 {
        return Ok(());
    }
    Err(Error::backend(format!(
        "{failed} document(s) failed to import: {}",
        first_error.unwrap_or_else(|| "unknown error".to_string())
    )))
}

fn to_jsonl(documents: &[Map<String, Value>]) -> Result<String> {
    let lines = documents
        .iter()
        .map(serde_json::to_string)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

#[async_trait]
impl SearchBackend for TypesenseBackend {
    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        let response = self
            .send(
                self.client.get(self.collection_url(collection)),
                "collection lookup",
            )
            .await?;
        match check_status(response, collection).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_collection(&self, schema: &Schema) -> Result<()> {
        log::debug!("Creating collection \"{}\"", schema.name());
        let response = self
            .send(
                self.client.post(self.collections_url()).json(schema),
                "collection create",
            )
            .await?;
        check_status(response, schema.name()).await?;
        Ok(())
    }

    async fn search(&self, collection: &str, request: &SearchRequest) -> Result<Value> {
        log::debug!(
            "Searching \"{collection}\": q='{}', page={}, per_page={}",
            request.q,
            request.page,
            request.per_page
        );
        let url = format!("{}/search", self.documents_url(collection));
        let response = self
            .send(
                self.client.get(url).query(&request.to_query_pairs()),
                "search",
            )
            .await?;
        let response = check_status(response, collection).await?;
        Self::read_json(response, "search").await
    }

    async fn import_documents(
        &self,
        collection: &str,
        documents: Vec<Map<String, Value>>,
    ) -> Result<()> {
        log::debug!("Importing {} document(s) into \"{collection}\"", documents.len());
        let url = format!("{}/import", self.documents_url(collection));
        let body = to_jsonl(&documents)?;
        let response = self
            .send(
                self.client
                    .post(url)
                    .query(&[("action", "upsert")])
                    .header(CONTENT_TYPE, "text/plain")
                    .body(body),
                "import",
            )
            .await?;
        let response = check_status(response, collection).await?;
        check_import_response(&Self::read_text(response, "import").await?)
    }

    async fn delete_by_filter(&self, collection: &str, filter_by: &str) -> Result<u64> {
        log::debug!("Deleting from \"{collection}\" where {filter_by}");
        let response = self
            .send(
                self.client
                    .delete(self.documents_url(collection))
                    .query(&[("filter_by", filter_by)]),
                "delete by filter",
            )
            .await?;
        let response = check_status(response, collection).await?;
        let deleted: DeleteResponse = Self::read_json(response, "delete by filter").await?;
        Ok(deleted.num_deleted)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        log::debug!("Deleting document \"{id}\" from \"{collection}\"");
        let url = format!("{}/{id}", self.documents_url(collection));
        let response = self
            .send(self.client.delete(url), "delete document")
            .await?;
        check_status(response, collection).await?;
        Ok(())
    }

    async fn truncate(&self, collection: &str) -> Result<()> {
        log::debug!("Truncating \"{collection}\"");
        let response = self
            .send(
                self.client
                    .delete(self.documents_url(collection))
                    .query(&[("truncate", "true")]),
                "truncate",
            )
            .await?;
        check_status(response, collection).await?;
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        log::debug!("Dropping collection \"{collection}\"");
        let response = self
            .send(
                self.client.delete(self.collection_url(collection)),
                "collection delete",
            )
            .await?;
        check_status(response, collection).await?;
        Ok(())
    }

    async fn export(&self, collection: &str) -> Result<String> {
        let url = format!("{}/export", self.documents_url(collection));
        let response = self.send(self.client.get(url), "export").await?;
        let response = check_status(response, collection).await?;
        Self::read_text(response, "export").await
    }

    fn name(&self) -> &str {
        "typesense"
    }
}

impl std::fmt::Debug for TypesenseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypesenseBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
