//! Provider abstractions for embeddings and vector storage
//!
//! The pipeline talks to both collaborators through traits so local
//! (Ollama, in-memory) and hosted (Gemini, Milvus) backends are interchangeable.

pub mod embedding;
pub mod gemini;
pub mod memory;
pub mod milvus;
pub mod ollama;
pub mod vector_store;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, EmbeddingConfig, VectorStoreBackend, VectorStoreConfig};
use crate::error::Result;

pub use embedding::{embed_best_effort, EmbeddingFailure, EmbeddingOutcome, EmbeddingProvider};
pub use gemini::GeminiEmbedder;
pub use memory::InMemoryVectorStore;
pub use milvus::MilvusVectorStore;
pub use ollama::OllamaEmbedder;
pub use vector_store::{StoredRecord, VectorStoreProvider};

/// Build the embedder selected by `config.backend`
pub fn embedder_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.backend {
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(config)?),
        EmbeddingBackend::Gemini => Arc::new(GeminiEmbedder::new(config)?),
    };
    tracing::info!(provider = embedder.name(), model = %config.model, "Embedding provider ready");
    Ok(embedder)
}

/// Build the vector store selected by `config.backend`
pub fn vector_store_from_config(config: &VectorStoreConfig) -> Result<Arc<dyn VectorStoreProvider>> {
    let store: Arc<dyn VectorStoreProvider> = match config.backend {
        VectorStoreBackend::Memory => Arc::new(InMemoryVectorStore::new(config)?),
        VectorStoreBackend::Milvus => Arc::new(MilvusVectorStore::new(config)?),
    };
    tracing::info!(provider = store.name(), collection = %config.collection, "Vector store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_embedder_from_config() {
        let ollama = embedder_from_config(&EmbeddingConfig::default()).unwrap();
        assert_eq!(ollama.name(), "ollama");
        assert_eq!(ollama.dimensions(), 768);

        let gemini = embedder_from_config(&EmbeddingConfig::gemini(Some("key".into()))).unwrap();
        assert_eq!(gemini.name(), "gemini");

        assert!(matches!(
            embedder_from_config(&EmbeddingConfig::gemini(None)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_vector_store_from_config() {
        let memory = vector_store_from_config(&VectorStoreConfig::default()).unwrap();
        assert_eq!(memory.name(), "in-memory");

        let milvus =
            vector_store_from_config(&VectorStoreConfig::milvus("http://localhost:19530", "docs"))
                .unwrap();
        assert_eq!(milvus.name(), "milvus");

        assert!(matches!(
            vector_store_from_config(&VectorStoreConfig::milvus("", "docs")),
            Err(Error::Config(_))
        ));
    }
}
