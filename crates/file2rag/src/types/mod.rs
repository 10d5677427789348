//! Core types for documents, chunks, metadata and source kinds

pub mod document;
pub mod metadata;
pub mod source;

pub use document::{Chunk, DocumentHandle, EmbeddedChunk, RawDocument};
pub use metadata::{keys, Metadata};
pub use source::{SourceKind, StrategyKind};
