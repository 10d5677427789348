//! In-process vector store

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::VectorStoreConfig;
use crate::error::{Error, Result};
use crate::types::{DocumentHandle, EmbeddedChunk};

use super::vector_store::{StoredRecord, VectorStoreProvider};

/// Append-only store kept in memory, shared across threads
pub struct InMemoryVectorStore {
    config: VectorStoreConfig,
    state: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    created: bool,
    records: Vec<(DocumentHandle, StoredRecord)>,
}

impl InMemoryVectorStore {
    pub fn new(config: &VectorStoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            state: RwLock::new(StoreState::default()),
        })
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    /// Snapshot of every record, in insertion order
    pub fn records(&self) -> Vec<StoredRecord> {
        self.state
            .read()
            .records
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Records inserted under `handle`, in batch order
    pub fn records_for(&self, handle: DocumentHandle) -> Vec<StoredRecord> {
        self.state
            .read()
            .records
            .iter()
            .filter(|(h, _)| *h == handle)
            .map(|(_, record)| record.clone())
            .collect()
    }

    fn create_collection(&self) {
        let mut state = self.state.write();
        if !state.created {
            state.created = true;
            tracing::info!(
                collection = %self.config.collection,
                dimensions = self.config.dimensions,
                "Created collection"
            );
        }
    }
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn ensure_collection(&self) -> Result<()> {
        self.create_collection();
        Ok(())
    }

    async fn insert(&self, chunks: &[EmbeddedChunk]) -> Result<DocumentHandle> {
        // Reject the whole batch before writing anything
        if let Some((index, chunk)) = chunks
            .iter()
            .enumerate()
            .find(|(_, c)| c.embedding.len() != self.config.dimensions)
        {
            return Err(Error::storage(format!(
                "chunk {} has {} dimensions, collection '{}' expects {}",
                index,
                chunk.embedding.len(),
                self.config.collection,
                self.config.dimensions
            )));
        }

        self.create_collection();

        let handle = DocumentHandle::new();
        let records: Vec<(DocumentHandle, StoredRecord)> = chunks
            .iter()
            .map(|c| (handle, StoredRecord::from_embedded(c, self.config.max_content_chars)))
            .collect();

        self.state.write().records.extend(records);
        tracing::debug!(
            collection = %self.config.collection,
            records = chunks.len(),
            handle = %handle,
            "Inserted batch"
        );

        Ok(handle)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.state.read().records.len())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
