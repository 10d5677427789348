//! Milvus vector store over the v2 REST API
//!
//! Every call is a JSON `POST` under `/v2/vectordb/`. Milvus reports
//! failures in the body (`code != 0`) even on HTTP 200, so both are checked.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::VectorStoreConfig;
use crate::error::{Error, Result};
use crate::types::{DocumentHandle, EmbeddedChunk};

use super::vector_store::{StoredRecord, VectorStoreProvider};

/// Rows sent per insert request
const INSERT_BATCH: usize = 1000;

/// Milvus collection client
pub struct MilvusVectorStore {
    client: Client,
    endpoint: String,
    token: Option<String>,
    collection: String,
    dimensions: usize,
    max_content_chars: usize,
    nlist: u32,
    ready: AtomicBool,
}

#[derive(Deserialize)]
struct MilvusResponse<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct HasCollection {
    has: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertResult {
    #[serde(default)]
    insert_count: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionStats {
    row_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertRequest<'a> {
    collection_name: &'a str,
    data: Vec<MilvusRow<'a>>,
}

/// Entity layout of one row; absent page/sheet are stored as 0
#[derive(Serialize)]
struct MilvusRow<'a> {
    embedding: &'a [f32],
    content: &'a str,
    source: &'a str,
    page: i64,
    sheet: i64,
    content_type: &'a str,
    chunk_index: i64,
    document_id: String,
}

impl<'a> MilvusRow<'a> {
    fn new(record: &'a StoredRecord, handle: DocumentHandle) -> Self {
        Self {
            embedding: &record.embedding,
            content: &record.content,
            source: &record.source,
            page: record.page.unwrap_or(0),
            sheet: record.sheet.unwrap_or(0),
            content_type: &record.content_type,
            chunk_index: record.chunk_index,
            document_id: handle.to_string(),
        }
    }
}

impl MilvusVectorStore {
    pub fn new(config: &VectorStoreConfig) -> Result<Self> {
        config.validate()?;
        if config.endpoint.trim().is_empty() {
            return Err(Error::config("vector_store.endpoint is required for the milvus backend"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token().map(str::to_string),
            collection: config.collection.clone(),
            dimensions: config.dimensions,
            max_content_chars: config.max_content_chars,
            nlist: config.nlist,
            ready: AtomicBool::new(false),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn url(&self, operation: &str) -> String {
        format!("{}/v2/vectordb/{}", self.endpoint, operation)
    }

    async fn call<B, T>(&self, operation: &str, body: &B) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.url(operation)).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::storage(format!("Milvus {} request failed: {}", operation, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::storage(format!(
                "Milvus {} failed ({}): {}",
                operation, status, body
            )));
        }

        let parsed: MilvusResponse<T> = response.json().await.map_err(|e| {
            Error::storage(format!("Failed to parse Milvus {} response: {}", operation, e))
        })?;

        if parsed.code != 0 {
            return Err(Error::storage(format!(
                "Milvus {} failed (code {}): {}",
                operation, parsed.code, parsed.message
            )));
        }

        Ok(parsed.data)
    }

    async fn has_collection(&self) -> Result<bool> {
        let data: Option<HasCollection> = self
            .call("collections/has", &json!({ "collectionName": self.collection }))
            .await?;
        Ok(data.is_some_and(|d| d.has))
    }

    fn create_request(&self) -> Value {
        json!({
            "collectionName": self.collection,
            "schema": {
                "autoId": true,
                "enableDynamicField": false,
                "fields": [
                    {"fieldName": "id", "dataType": "Int64", "isPrimary": true},
                    {
                        "fieldName": "embedding",
                        "dataType": "FloatVector",
                        "elementTypeParams": {"dim": self.dimensions.to_string()}
                    },
                    {"fieldName": "content", "dataType": "VarChar", "elementTypeParams": {"max_length": 65535}},
                    {"fieldName": "source", "dataType": "VarChar", "elementTypeParams": {"max_length": 1000}},
                    {"fieldName": "page", "dataType": "Int64"},
                    {"fieldName": "sheet", "dataType": "Int64"},
                    {"fieldName": "content_type", "dataType": "VarChar", "elementTypeParams": {"max_length": 100}},
                    {"fieldName": "chunk_index", "dataType": "Int64"},
                    {"fieldName": "document_id", "dataType": "VarChar", "elementTypeParams": {"max_length": 36}}
                ]
            },
            "indexParams": [{
                "fieldName": "embedding",
                "indexName": "embedding",
                "metricType": "COSINE",
                "indexType": "IVF_FLAT",
                "params": {"nlist": self.nlist}
            }]
        })
    }
}

#[async_trait]
impl VectorStoreProvider for MilvusVectorStore {
    async fn ensure_collection(&self) -> Result<()> {
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }

        if self.has_collection().await? {
            tracing::debug!(collection = %self.collection, "Collection already exists");
        } else {
            self.call::<_, Value>("collections/create", &self.create_request())
                .await?;
            tracing::info!(
                collection = %self.collection,
                dimensions = self.dimensions,
                nlist = self.nlist,
                "Created Milvus collection with COSINE IVF_FLAT index"
            );
        }

        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn insert(&self, chunks: &[EmbeddedChunk]) -> Result<DocumentHandle> {
        if let Some((index, chunk)) = chunks
            .iter()
            .enumerate()
            .find(|(_, c)| c.embedding.len() != self.dimensions)
        {
            return Err(Error::storage(format!(
                "chunk {} has {} dimensions, collection '{}' expects {}",
                index,
                chunk.embedding.len(),
                self.collection,
                self.dimensions
            )));
        }

        self.ensure_collection().await?;

        let handle = DocumentHandle::new();
        let records: Vec<StoredRecord> = chunks
            .iter()
            .map(|c| StoredRecord::from_embedded(c, self.max_content_chars))
            .collect();

        // Not retried: ids are assigned server-side, so a replay would duplicate rows
        for batch in records.chunks(INSERT_BATCH) {
            let request = InsertRequest {
                collection_name: &self.collection,
                data: batch.iter().map(|r| MilvusRow::new(r, handle)).collect(),
            };
            let result: Option<InsertResult> = self.call("entities/insert", &request).await?;
            let inserted = result.map(|r| r.insert_count).unwrap_or_default();
            if inserted != batch.len() {
                tracing::warn!(
                    collection = %self.collection,
                    sent = batch.len(),
                    inserted,
                    "Milvus reported a different insert count"
                );
            }
        }

        tracing::debug!(
            collection = %self.collection,
            records = records.len(),
            handle = %handle,
            "Inserted batch"
        );

        Ok(handle)
    }

    async fn len(&self) -> Result<usize> {
        let stats: Option<CollectionStats> = self
            .call("collections/get_stats", &json!({ "collectionName": self.collection }))
            .await?;
        Ok(stats.map(|s| s.row_count).unwrap_or_default())
    }

    fn name(&self) -> &str {
        "milvus"
    }
}
