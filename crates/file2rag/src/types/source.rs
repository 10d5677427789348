//! Recognized source kinds and their chunking strategy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// Every source format the loader understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Comma-separated values
    Csv,
    /// Excel workbook (.xlsx)
    Xlsx,
    /// Word document (.docx)
    Docx,
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Web page fetched over http(s)
    Url,
}

/// How documents of a source kind are split into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Character window with overlap (prose)
    TextWindow,
    /// Consecutive row batches without overlap (tables)
    RowBatch,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        Self::Csv,
        Self::Xlsx,
        Self::Docx,
        Self::Pdf,
        Self::Txt,
        Self::Url,
    ];

    /// Classify a path or URL.
    ///
    /// An `http://` or `https://` prefix wins; otherwise the file extension
    /// decides. Both checks are case-insensitive.
    pub fn resolve(input: &str) -> Result<Self> {
        if is_remote(input) {
            return Ok(Self::Url);
        }

        let extension = Path::new(input)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        Self::from_extension(&extension)
            .ok_or_else(|| Error::UnsupportedSourceKind(format!(".{}", extension)))
    }

    /// Map a bare extension (no leading dot) to a kind
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Chunking strategy for this kind
    pub fn strategy(&self) -> StrategyKind {
        match self {
            Self::Csv | Self::Xlsx => StrategyKind::RowBatch,
            Self::Docx | Self::Pdf | Self::Txt | Self::Url => StrategyKind::TextWindow,
        }
    }

    /// Value stamped into `content_type` metadata
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Txt => "text",
            Self::Url => "url",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Url => "url",
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True for inputs carrying an http(s) scheme
pub fn is_remote(input: &str) -> bool {
    let lower = input.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
