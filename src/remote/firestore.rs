//! Firestore REST client.
//!
//! Talks to the Firestore v1 REST API (or a local emulator):
//! - listing: `GET .../documents/{collection}` with page tokens
//! - batch writes: `POST .../documents:commit` (atomic)
//! - counting: `POST .../documents:runAggregationQuery`

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::retry::RetryPolicy;
use super::value::{fields_from_firestore, fields_to_firestore};
use super::RemoteCollection;
use crate::config::{ConfigError, RemoteConfig};
use crate::record::LevelRecord;
use crate::sync::SyncError;

const PRODUCTION_HOST: &str = "https://firestore.googleapis.com";
const PAGE_SIZE: u32 = 300;
/// Largest commit Firestore documents as accepted.
const MAX_COMMIT_WRITES: usize = 500;

/// One page of `documents.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl Document {
    /// The document id is the last segment of its resource name.
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Firestore-backed remote collection client.
#[derive(Debug, Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    host: String,
    project_id: String,
    access_token: Option<String>,
    retry: RetryPolicy,
}

impl FirestoreClient {
    /// Creates a client with explicit parameters.
    ///
    /// `emulator_host` (e.g. `localhost:8080`) redirects all traffic to a
    /// local Firestore emulator over plain HTTP.
    pub fn new(
        project_id: String,
        access_token: Option<String>,
        emulator_host: Option<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::RemoteUnavailable(e.to_string()))?;

        let (host, access_token) = match emulator_host {
            // The emulator treats the "owner" token as an admin and bypasses rules.
            Some(emulator) => (
                format!("http://{}", emulator.trim_end_matches('/')),
                access_token.or_else(|| Some("owner".to_string())),
            ),
            None => (PRODUCTION_HOST.to_string(), access_token),
        };

        Ok(Self {
            http,
            host,
            project_id,
            access_token,
            retry,
        })
    }

    /// Creates a client from the remote section of the config.
    ///
    /// Returns an error if no project is configured.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, ConfigError> {
        let project_id = config
            .project_id
            .clone()
            .ok_or(ConfigError::Missing("remote.project_id"))?;

        Self::new(
            project_id,
            config.access_token.clone(),
            config.emulator_host.clone(),
            config.timeout(),
            config.retry_policy(),
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Resource path of the documents root, as used inside request bodies.
    fn documents_root(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    /// Absolute URL of the documents root.
    fn documents_url(&self) -> String {
        format!("{}/v1/{}", self.host, self.documents_root())
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/{}",
            self.documents_url(),
            urlencoding::encode(collection)
        )
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_root(), collection, id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends a read request; any failure means the store is unavailable.
    async fn read<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SyncError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(e.to_string()))?;

        let response = check_status(response)
            .await
            .map_err(SyncError::RemoteUnavailable)?;

        response
            .json()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(format!("invalid response: {}", e)))
    }

    /// All documents of a collection, following page tokens.
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, SyncError> {
        let url = self.collection_url(collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let page: ListDocumentsResponse = self.read(self.http.get(&url).query(&query)).await?;
            tracing::debug!(
                "Listed {} document(s) from '{}'",
                page.documents.len(),
                collection
            );
            documents.extend(page.documents);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    /// Applies `writes` in a single atomic commit.
    async fn commit(&self, writes: Vec<Value>) -> Result<(), SyncError> {
        if writes.len() > MAX_COMMIT_WRITES {
            tracing::warn!(
                "Committing {} writes in one batch; the store may reject batches over {}",
                writes.len(),
                MAX_COMMIT_WRITES
            );
        }

        let url = format!("{}:commit", self.documents_url());
        let request = self.http.post(&url).json(&json!({ "writes": writes }));

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| SyncError::RemoteWriteFailed(e.to_string()))?;

        check_status(response)
            .await
            .map_err(SyncError::RemoteWriteFailed)?;

        Ok(())
    }

    async fn count_once(&self, collection: &str) -> Result<usize, SyncError> {
        let url = format!("{}:runAggregationQuery", self.documents_url());
        let body = json!({
            "structuredAggregationQuery": {
                "structuredQuery": { "from": [{ "collectionId": collection }] },
                "aggregations": [{ "alias": "count", "count": {} }]
            }
        });

        let results: Vec<Value> = self.read(self.http.post(&url).json(&body)).await?;
        parse_count(&results).map_err(SyncError::RemoteUnavailable)
    }

    fn delete_writes(&self, documents: &[Document]) -> Vec<Value> {
        documents
            .iter()
            .map(|doc| json!({ "delete": doc.name }))
            .collect()
    }

    fn insert_writes(&self, collection: &str, records: &[LevelRecord]) -> Vec<Value> {
        records
            .iter()
            .map(|record| {
                json!({
                    "update": {
                        "name": self.document_name(collection, record.id()),
                        "fields": fields_to_firestore(&record.remote_body()),
                    }
                })
            })
            .collect()
    }
}

impl RemoteCollection for FirestoreClient {
    async fn fetch_all(&self, collection: &str) -> Result<Vec<LevelRecord>, SyncError> {
        let documents = self
            .retry
            .run("list documents", || self.list_documents(collection))
            .await?;

        documents
            .iter()
            .map(|doc| {
                fields_from_firestore(&doc.fields)
                    .map(|fields| LevelRecord::new(doc.id(), fields))
                    .map_err(|e| {
                        SyncError::RemoteUnavailable(format!("document {}: {}", doc.name, e))
                    })
            })
            .collect()
    }

    async fn delete_all(&self, collection: &str) -> Result<usize, SyncError> {
        let documents = self
            .retry
            .run("list documents", || self.list_documents(collection))
            .await?;

        if documents.is_empty() {
            tracing::debug!("Collection '{}' already empty", collection);
            return Ok(0);
        }

        self.commit(self.delete_writes(&documents)).await?;
        Ok(documents.len())
    }

    async fn insert_all(
        &self,
        collection: &str,
        records: &[LevelRecord],
    ) -> Result<(), SyncError> {
        if records.is_empty() {
            return Ok(());
        }
        self.commit(self.insert_writes(collection, records)).await
    }

    async fn count(&self, collection: &str) -> Result<usize, SyncError> {
        self.retry
            .run("count documents", || self.count_once(collection))
            .await
    }
}

/// Passes successful responses through; otherwise describes the failure.
async fn check_status(response: Response) -> Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(format!("server returned status {}: {}", status, body.trim()))
}

/// Extracts the `count` alias from a `runAggregationQuery` response stream.
fn parse_count(results: &[Value]) -> Result<usize, String> {
    let value = results
        .iter()
        .find_map(|r| r.pointer("/result/aggregateFields/count/integerValue"))
        .ok_or_else(|| "aggregation response has no count".to_string())?;

    match value {
        Value::String(s) => s.parse().map_err(|e| format!("invalid count '{}': {}", s, e)),
        Value::Number(n) => n
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| format!("invalid count {}", n)),
        other => Err(format!("invalid count {}", other)),
    }
}
