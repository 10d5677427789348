//! Configuration for the ingestion pipeline

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Default maximum local file size: 50 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Main ingestion configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Loader configuration
    #[serde(default)]
    pub loader: LoaderConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Embedding adapter configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Vector store adapter configuration
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    /// Orchestrator configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl IngestConfig {
    /// Parse a TOML document; missing sections fall back to defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| Error::config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Check every section, failing on the first invalid value
    pub fn validate(&self) -> Result<()> {
        self.embeddings.validate()?;
        self.validate_without_embeddings()
    }

    /// Check every section except `embeddings`, for callers that supply
    /// their own embedder
    pub fn validate_without_embeddings(&self) -> Result<()> {
        self.chunking.validate()?;
        self.vector_store.validate()?;
        if self.loader.max_file_size == 0 {
            return Err(Error::config("loader.max_file_size must be positive"));
        }
        if self.loader.request_timeout_secs == 0 {
            return Err(Error::config("loader.request_timeout_secs must be positive"));
        }
        Ok(())
    }
}

/// Loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Reject local files larger than this many bytes
    pub max_file_size: u64,
    /// User agent for URL sources
    pub user_agent: String,
    /// Timeout for fetching URL sources
    pub request_timeout_secs: u64,
    /// Turn parser failures into a single error-flagged document instead of failing the run
    pub degrade_parse_failures: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            user_agent: format!("file2rag/{} (Document Processing Tool)", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
            degrade_parse_failures: true,
        }
    }
}

/// Named chunking presets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkPreset {
    /// 500/100 characters, 10 rows
    Small,
    /// 1000/200 characters, 20 rows
    #[default]
    Medium,
    /// 2000/400 characters, 50 rows
    Large,
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Character budget per prose chunk
    pub chunk_size: usize,
    /// Characters shared by adjacent prose chunks
    pub chunk_overlap: usize,
    /// Rows per tabular chunk
    pub rows_per_chunk: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::preset(ChunkPreset::Medium)
    }
}

impl ChunkingConfig {
    pub fn preset(preset: ChunkPreset) -> Self {
        let (chunk_size, chunk_overlap, rows_per_chunk) = match preset {
            ChunkPreset::Small => (500, 100, 10),
            ChunkPreset::Medium => (1000, 200, 20),
            ChunkPreset::Large => (2000, 400, 50),
        };
        Self {
            chunk_size,
            chunk_overlap,
            rows_per_chunk,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidPolicy("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidPolicy(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.rows_per_chunk == 0 {
            return Err(Error::InvalidPolicy("rows_per_chunk must be positive".into()));
        }
        Ok(())
    }
}

/// Which embedding backend to talk to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Google Gemini embedContent API
    Gemini,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend provider
    pub backend: EmbeddingBackend,
    /// Service base URL
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Declared vector dimension
    pub dimensions: usize,
    /// API key (required by Gemini)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            api_key: None,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

impl EmbeddingConfig {
    /// Gemini `text-embedding-004` defaults; the API key still has to be supplied
    pub fn gemini(api_key: Option<String>) -> Self {
        Self {
            backend: EmbeddingBackend::Gemini,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "text-embedding-004".to_string(),
            dimensions: 768,
            api_key,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_endpoint()?;
        if self.backend == EmbeddingBackend::Gemini && self.api_key().is_none() {
            return Err(Error::config("embeddings.api_key is required for the gemini backend"));
        }
        Ok(())
    }

    /// Checks shared by every backend: base URL, model and dimension
    pub fn validate_endpoint(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("embeddings.base_url is required"));
        }
        if self.model.trim().is_empty() {
            return Err(Error::config("embeddings.model is required"));
        }
        if self.dimensions == 0 {
            return Err(Error::config("embeddings.dimensions must be positive"));
        }
        Ok(())
    }

    /// Non-blank API key, if one was supplied
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Which vector store to write to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreBackend {
    /// In-process store, lost on exit
    #[default]
    Memory,
    /// Milvus over its v2 REST API
    Milvus,
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    /// Backend provider
    pub backend: VectorStoreBackend,
    /// Milvus REST endpoint
    pub endpoint: String,
    /// Milvus token (`user:password` or an API key)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Collection / index name
    pub collection: String,
    /// Vector dimension the collection is created with
    pub dimensions: usize,
    /// Stored `content` field is truncated to this many characters
    pub max_content_chars: usize,
    /// IVF_FLAT cluster count used when the collection is created
    pub nlist: u32,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorStoreBackend::Memory,
            endpoint: "http://localhost:19530".to_string(),
            token: None,
            timeout_secs: 30,
            collection: "documents".to_string(),
            dimensions: 768,
            max_content_chars: 65_535,
            nlist: 128,
        }
    }
}

impl VectorStoreConfig {
    /// Milvus defaults for `collection` at `endpoint`
    pub fn milvus(endpoint: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            backend: VectorStoreBackend::Milvus,
            endpoint: endpoint.into(),
            collection: collection.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(Error::config("vector_store.collection is required"));
        }
        if self.dimensions == 0 {
            return Err(Error::config("vector_store.dimensions must be positive"));
        }
        if self.max_content_chars == 0 {
            return Err(Error::config("vector_store.max_content_chars must be positive"));
        }
        if self.backend == VectorStoreBackend::Milvus {
            if self.endpoint.trim().is_empty() {
                return Err(Error::config(
                    "vector_store.endpoint is required for the milvus backend",
                ));
            }
            if self.nlist == 0 {
                return Err(Error::config("vector_store.nlist must be positive"));
            }
            if self.timeout_secs == 0 {
                return Err(Error::config("vector_store.timeout_secs must be positive"));
            }
        }
        Ok(())
    }

    /// Non-blank token, if one was supplied
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Chunks of one document embedded concurrently (1 = sequential)
    pub parallel_embeddings: usize,
    /// Documents processed concurrently by `run_many` (None = CPU count, max 8)
    pub parallel_documents: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel_embeddings: 1,
            parallel_documents: None,
        }
    }
}

impl PipelineConfig {
    pub fn effective_parallel_documents(&self) -> usize {
        self.parallel_documents
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        IngestConfig::default().validate().unwrap();
        let chunking = ChunkingConfig::default();
        assert_eq!((chunking.chunk_size, chunking.chunk_overlap), (1000, 200));
        assert_eq!(chunking.rows_per_chunk, 20);
    }

    #[test]
    fn test_presets() {
        let small = ChunkingConfig::preset(ChunkPreset::Small);
        assert_eq!((small.chunk_size, small.chunk_overlap, small.rows_per_chunk), (500, 100, 10));
        let large = ChunkingConfig::preset(ChunkPreset::Large);
        assert_eq!((large.chunk_size, large.chunk_overlap, large.rows_per_chunk), (2000, 400, 50));
    }

    #[test]
    fn test_overlap_must_be_below_size() {
        let config = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            rows_per_chunk: 5,
        };
        assert!(matches!(config.validate(), Err(Error::InvalidPolicy(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = IngestConfig::from_toml_str(
            r#"
            [chunking]
            chunk_size = 400
            chunk_overlap = 50

            [vector_store]
            collection = "manuals"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.chunk_size, 400);
        assert_eq!(config.chunking.rows_per_chunk, 20);
        assert_eq!(config.vector_store.collection, "manuals");
        assert_eq!(config.embeddings.model, "nomic-embed-text");
        assert!(config.loader.degrade_parse_failures);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = IngestConfig::from_toml_str("[chunking]\nchunk_size = 10\nchunk_overlap = 20\n")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPolicy(_)));

        let err = IngestConfig::from_toml_str("chunking = 3").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_gemini_requires_api_key() {
        assert!(EmbeddingConfig::gemini(None).validate().is_err());
        assert!(EmbeddingConfig::gemini(Some("  ".into())).validate().is_err());
        EmbeddingConfig::gemini(Some("key".into())).validate().unwrap();
    }

    #[test]
    fn test_embeddings_skipped_when_caller_embeds() {
        let config = IngestConfig {
            embeddings: EmbeddingConfig::gemini(None),
            ..IngestConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        config.validate_without_embeddings().unwrap();
    }

    #[test]
    fn test_milvus_store_config() {
        let config = IngestConfig::from_toml_str(
            r#"
            [vector_store]
            backend = "milvus"
            endpoint = "http://milvus:19530"
            collection = "manuals"
            "#,
        )
        .unwrap();
        assert_eq!(config.vector_store.backend, VectorStoreBackend::Milvus);
        assert_eq!(config.vector_store.nlist, 128);
        assert_eq!(config.vector_store.token(), None);

        let blank = VectorStoreConfig::milvus(" ", "manuals");
        assert!(matches!(blank.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file2rag.toml");
        std::fs::write(&path, "[pipeline]\nparallel_embeddings = 4\n").unwrap();

        let config = IngestConfig::from_file(&path).unwrap();
        assert_eq!(config.pipeline.parallel_embeddings, 4);
    }
}
