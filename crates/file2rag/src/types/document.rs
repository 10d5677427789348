//! Document, chunk and stored-handle types flowing through the pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::metadata::{keys, Metadata};

/// One normalized unit of source content (a file, a sheet, a page)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    /// Text content, possibly empty
    pub text: String,
    /// Provenance metadata (source, file type, sheet/page markers, error flags)
    pub metadata: Metadata,
}

impl RawDocument {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// Source identifier recorded by the loader
    pub fn source(&self) -> Option<&str> {
        self.metadata.get_str(keys::SOURCE)
    }

    /// True when the loader degraded a parse failure into this document
    pub fn is_error(&self) -> bool {
        self.metadata.get_bool(keys::ERROR).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A retrieval-sized slice of one raw document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text
    pub text: String,
    /// Parent metadata plus chunker enrichment
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// 1-based position within the parent document
    pub fn chunk_index(&self) -> Option<u64> {
        self.metadata.get_u64(keys::CHUNK_INDEX)
    }

    pub fn total_chunks(&self) -> Option<u64> {
        self.metadata.get_u64(keys::TOTAL_CHUNKS)
    }

    /// Length in the strategy's native unit (characters or rows)
    pub fn chunk_size(&self) -> Option<u64> {
        self.metadata.get_u64(keys::CHUNK_SIZE)
    }

    pub fn is_complete_document(&self) -> bool {
        self.metadata
            .get_bool(keys::IS_COMPLETE_DOCUMENT)
            .unwrap_or(false)
    }
}

/// A chunk paired with its embedding, ready for the vector store
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

impl EmbeddedChunk {
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { chunk, embedding }
    }

    pub fn text(&self) -> &str {
        &self.chunk.text
    }

    pub fn metadata(&self) -> &Metadata {
        &self.chunk.metadata
    }
}

/// Handle returned by the vector store for one ingested batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle(pub Uuid);

impl DocumentHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
