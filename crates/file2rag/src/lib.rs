//! file2rag: document ingestion for retrieval-augmented generation
//!
//! Loads CSV, XLSX, DOCX, PDF, plain-text and web sources, normalizes their
//! text, splits it into chunks with a per-format strategy, embeds each chunk
//! and stores the vectors with their provenance metadata.
//!
//! ```no_run
//! use file2rag::{IngestConfig, IngestPipeline};
//!
//! # async fn ingest() -> file2rag::Result<()> {
//! file2rag::telemetry::init_tracing(file2rag::telemetry::DEFAULT_FILTER);
//!
//! let pipeline = IngestPipeline::builder(IngestConfig::default()).build()?;
//! if let Some(outcome) = pipeline.run("reports/q3.pdf").await? {
//!     println!("stored {} chunks as {}", outcome.report.chunks, outcome.handle);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod telemetry;
pub mod types;

pub use config::{
    ChunkPreset, ChunkingConfig, EmbeddingBackend, EmbeddingConfig, IngestConfig,
    VectorStoreBackend, VectorStoreConfig,
};
pub use error::{Error, Result};
pub use ingestion::{ChunkStrategy, Chunker, LoaderGateway, WhitespaceNormalizer};
pub use processing::{
    IngestOutcome, IngestPipeline, IngestReport, PipelineObserver, PipelineStage,
};
pub use providers::{EmbeddingProvider, InMemoryVectorStore, MilvusVectorStore, VectorStoreProvider};
pub use types::{Chunk, DocumentHandle, EmbeddedChunk, Metadata, RawDocument, SourceKind};
