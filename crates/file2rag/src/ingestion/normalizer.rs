//! Whitespace normalization for loaded documents

use regex::Regex;
use std::sync::OnceLock;

use crate::types::RawDocument;

fn horizontal_whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\S\n]+").expect("static regex"))
}

fn blank_line_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("static regex"))
}

/// Collapses redundant whitespace while keeping line and paragraph breaks.
///
/// Paragraph breaks (`\n\n`) are what the text-window splitter prefers to
/// cut at and what separates rows for the row-batch splitter, so they are
/// reduced to exactly one blank line instead of being flattened.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceNormalizer;

impl WhitespaceNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize one document; metadata is carried over untouched
    pub fn normalize(&self, document: RawDocument) -> RawDocument {
        RawDocument {
            text: normalize_text(&document.text),
            metadata: document.metadata,
        }
    }

    pub fn normalize_all(&self, documents: Vec<RawDocument>) -> Vec<RawDocument> {
        documents.into_iter().map(|d| self.normalize(d)).collect()
    }
}

/// Normalize a string. Idempotent.
pub fn normalize_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let visible: String = unified
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    let collapsed = horizontal_whitespace().replace_all(&visible, " ");
    let trimmed_lines = collapsed
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    blank_line_runs()
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}
