//! Chunking strategies: character windows for prose, row batches for tables

use serde_json::{json, Value};

use crate::config::{ChunkPreset, ChunkingConfig};
use crate::error::{Error, Result};
use crate::types::{keys, Chunk, RawDocument, StrategyKind};

/// Break points tried in order, coarsest first. When none fits, the window
/// is cut at an arbitrary character.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Separator between rendered rows of a tabular document
pub const ROW_SEPARATOR: &str = "\n\n";

/// Enrichment keys allowed to replace a value already present on the parent
const OVERRIDABLE: [&str; 1] = [keys::CHUNK_INDEX];

/// Character window with overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextWindowPolicy {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextWindowPolicy {
    /// Requires `0 <= chunk_overlap < chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidPolicy("chunk_size must be positive".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::InvalidPolicy(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn preset(preset: ChunkPreset) -> Self {
        let config = ChunkingConfig::preset(preset);
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Default for TextWindowPolicy {
    fn default() -> Self {
        Self::preset(ChunkPreset::Medium)
    }
}

/// Consecutive, non-overlapping row batches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBatchPolicy {
    rows_per_chunk: usize,
}

impl RowBatchPolicy {
    pub fn new(rows_per_chunk: usize) -> Result<Self> {
        if rows_per_chunk == 0 {
            return Err(Error::InvalidPolicy("rows_per_chunk must be positive".into()));
        }
        Ok(Self { rows_per_chunk })
    }

    pub fn preset(preset: ChunkPreset) -> Self {
        Self {
            rows_per_chunk: ChunkingConfig::preset(preset).rows_per_chunk,
        }
    }

    pub fn rows_per_chunk(&self) -> usize {
        self.rows_per_chunk
    }
}

impl Default for RowBatchPolicy {
    fn default() -> Self {
        Self::preset(ChunkPreset::Medium)
    }
}

/// Chunking strategy chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    TextWindow(TextWindowPolicy),
    RowBatch(RowBatchPolicy),
}

impl ChunkStrategy {
    /// Build the strategy of `kind` from the configured parameters
    pub fn from_config(kind: StrategyKind, config: &ChunkingConfig) -> Result<Self> {
        Ok(match kind {
            StrategyKind::TextWindow => Self::TextWindow(TextWindowPolicy::new(
                config.chunk_size,
                config.chunk_overlap,
            )?),
            StrategyKind::RowBatch => Self::RowBatch(RowBatchPolicy::new(config.rows_per_chunk)?),
        })
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::TextWindow(_) => StrategyKind::TextWindow,
            Self::RowBatch(_) => StrategyKind::RowBatch,
        }
    }

    /// Value stamped into `splitter_type`
    pub fn splitter_type(&self) -> &'static str {
        match self {
            Self::TextWindow(_) => "recursive_character",
            Self::RowBatch(_) => "table_rows",
        }
    }
}

/// Splits raw documents into chunks and stamps enrichment metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct Chunker;

impl Chunker {
    pub fn new() -> Self {
        Self
    }

    /// Chunk every document with `strategy`, in document order.
    ///
    /// Empty documents contribute nothing. Chunk numbering restarts at 1 for
    /// each document.
    pub fn chunk(&self, documents: &[RawDocument], strategy: &ChunkStrategy) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for document in documents {
            let produced = match strategy {
                ChunkStrategy::TextWindow(policy) => self.chunk_text(document, policy)?,
                ChunkStrategy::RowBatch(policy) => self.chunk_rows(document, policy)?,
            };
            tracing::debug!(
                source = document.source().unwrap_or("<unknown>"),
                splitter = strategy.splitter_type(),
                chunks = produced.len(),
                "Chunked document"
            );
            chunks.extend(produced);
        }
        Ok(chunks)
    }

    fn chunk_text(&self, document: &RawDocument, policy: &TextWindowPolicy) -> Result<Vec<Chunk>> {
        let pieces = split_text_window(&document.text, policy);
        let original_length = document.text.chars().count();
        let total = pieces.len();

        pieces
            .into_iter()
            .enumerate()
            .map(|(i, piece)| {
                let fields = enrichment(i, total, piece.chars().count(), original_length)
                    .into_iter()
                    .chain([
                        (keys::SPLITTER_TYPE, json!("recursive_character")),
                        (keys::CHUNK_OVERLAP, json!(policy.chunk_overlap)),
                        (keys::CHUNK_SIZE_CONFIG, json!(policy.chunk_size)),
                    ]);
                let metadata = document.metadata.extend(fields, &OVERRIDABLE)?;
                Ok(Chunk::new(piece, metadata))
            })
            .collect()
    }

    fn chunk_rows(&self, document: &RawDocument, policy: &RowBatchPolicy) -> Result<Vec<Chunk>> {
        let rows = split_rows(&document.text);
        let batches: Vec<&[&str]> = rows.chunks(policy.rows_per_chunk).collect();
        let total = batches.len();

        batches
            .into_iter()
            .enumerate()
            .map(|(i, batch)| {
                let fields = enrichment(i, total, batch.len(), rows.len())
                    .into_iter()
                    .chain([
                        (keys::SPLITTER_TYPE, json!("table_rows")),
                        (keys::ROWS_PER_CHUNK, json!(policy.rows_per_chunk)),
                    ]);
                let metadata = document.metadata.extend(fields, &OVERRIDABLE)?;
                Ok(Chunk::new(batch.join(ROW_SEPARATOR), metadata))
            })
            .collect()
    }
}

fn enrichment(
    index: usize,
    total: usize,
    size: usize,
    original_length: usize,
) -> [(&'static str, Value); 5] {
    [
        (keys::CHUNK_INDEX, json!(index + 1)),
        (keys::TOTAL_CHUNKS, json!(total)),
        (keys::CHUNK_SIZE, json!(size)),
        (keys::IS_COMPLETE_DOCUMENT, json!(total == 1)),
        (keys::ORIGINAL_LENGTH, json!(original_length)),
    ]
}

/// Split prose into windows of at most `chunk_size` characters.
///
/// Each window after the first starts exactly `chunk_overlap` characters
/// before the previous one ended, so dropping that prefix from every window
/// but the first and concatenating gives back `text`.
pub fn split_text_window<'a>(text: &'a str, policy: &TextWindowPolicy) -> Vec<&'a str> {
    // offsets[k] is the byte offset of char k; the last entry is text.len()
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = offsets.len() - 1;

    let mut pieces = Vec::new();
    if char_count == 0 {
        return pieces;
    }

    let mut start = 0usize;
    loop {
        if char_count - start <= policy.chunk_size {
            pieces.push(&text[offsets[start]..]);
            break;
        }

        // The window must end past the overlap so the next one advances
        let lowest = start + policy.chunk_overlap + 1;
        let highest = start + policy.chunk_size;
        let end = find_break(text, &offsets, start, lowest, highest);

        pieces.push(&text[offsets[start]..offsets[end]]);
        start = end - policy.chunk_overlap;
    }

    pieces
}

/// Largest char index in `lowest..=highest` that directly follows the
/// coarsest separator available, or `highest` when no separator fits.
fn find_break(text: &str, offsets: &[usize], start: usize, lowest: usize, highest: usize) -> usize {
    let window = &text[offsets[start]..offsets[highest]];

    for separator in SEPARATORS {
        if let Some(pos) = window.rfind(separator) {
            let boundary = offsets[start] + pos + separator.len();
            // Separators are ASCII, so the boundary is always a char boundary
            if let Ok(end) = offsets.binary_search(&boundary) {
                if end >= lowest {
                    return end;
                }
            }
        }
    }

    highest
}

/// Split tabular text into its non-empty rows
pub fn split_rows(text: &str) -> Vec<&str> {
    text.split(ROW_SEPARATOR)
        .filter(|row| !row.trim().is_empty())
        .collect()
}
