//! Loading, normalization and chunking of source documents

pub mod chunker;
mod loader;
pub mod normalizer;
pub mod parser;

pub use chunker::{ChunkStrategy, Chunker, RowBatchPolicy, TextWindowPolicy};
pub use loader::LoaderGateway;
pub use normalizer::WhitespaceNormalizer;
pub use parser::FormatParser;
