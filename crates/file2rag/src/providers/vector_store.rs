//! Vector store provider trait and the persisted record layout

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{keys, DocumentHandle, EmbeddedChunk};

/// Trait for persisting embedded chunks
///
/// Inserts are append-only; a store never updates or deletes records, so
/// concurrent inserts from independent runs commute.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Create the collection and its index if they do not exist yet.
    /// Calling it again is a no-op.
    async fn ensure_collection(&self) -> Result<()>;

    /// Persist one ordered batch and return its handle
    async fn insert(&self, chunks: &[EmbeddedChunk]) -> Result<DocumentHandle>;

    /// Get total number of records stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// One persisted record: `embedding`, capped `content`, and the provenance
/// fields a retriever filters on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub embedding: Vec<f32>,
    pub content: String,
    pub source: String,
    pub page: Option<i64>,
    /// 1-based sheet position for spreadsheet sources
    pub sheet: Option<i64>,
    pub content_type: String,
    pub chunk_index: i64,
}

impl StoredRecord {
    /// Build a record, truncating `content` to `max_content_chars` characters
    pub fn from_embedded(chunk: &EmbeddedChunk, max_content_chars: usize) -> Self {
        let metadata = chunk.metadata();

        Self {
            embedding: chunk.embedding.clone(),
            content: truncate_chars(chunk.text(), max_content_chars).to_string(),
            source: metadata.get_str(keys::SOURCE).unwrap_or_default().to_string(),
            page: metadata.get_i64(keys::PAGE),
            sheet: metadata.get_i64(keys::SHEET_INDEX),
            content_type: metadata
                .get_str(keys::CONTENT_TYPE)
                .unwrap_or("text")
                .to_string(),
            chunk_index: metadata.get_i64(keys::CHUNK_INDEX).unwrap_or(0),
        }
    }
}

/// Longest prefix of `text` with at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
