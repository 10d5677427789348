//! Error types for the ingestion pipeline

use thiserror::Error;

use crate::processing::PipelineStage;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum Error {
    /// Local path does not exist and is not a remote URL
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// Extension or scheme outside the recognized set
    #[error("Unsupported source kind: {0}")]
    UnsupportedSourceKind(String),

    /// File exceeds the configured loader limit
    #[error("File too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    /// A format parser could not extract content
    #[error("Failed to parse '{source_name}': {message}")]
    Parse { source_name: String, message: String },

    /// Embedding generation error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector store error
    #[error("Vector store error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chunking policy parameters out of range
    #[error("Invalid chunking policy: {0}")]
    InvalidPolicy(String),

    /// Enrichment field collides with a parent metadata key
    #[error("Metadata key collision: {0}")]
    MetadataCollision(String),

    /// A pipeline stage failed
    #[error("Pipeline failed at stage {stage}: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: Box<Error>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a parse error
    pub fn parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True for content that could not be read, as opposed to transport,
    /// I/O or policy failures
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Csv(_))
    }

    /// Tag this error with the pipeline stage it surfaced from.
    /// Already-tagged errors keep their original stage.
    pub fn at_stage(self, stage: PipelineStage) -> Self {
        match self {
            Self::Stage { .. } => self,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Stage the error surfaced from, if it was raised by the orchestrator
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error, stripping any stage wrapper
    pub fn root(&self) -> &Error {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}
