//! Loader gateway: resolves a source, dispatches to its parser and stamps
//! provenance metadata on every document

use sha2::{Digest, Sha256};
use std::path::Path;

use super::parser::{
    CsvParser, DocxParser, FormatParser, PdfParser, TextParser, UrlParser, XlsxParser,
};
use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::types::{keys, Metadata, RawDocument, SourceKind, StrategyKind};

/// Loads files and URLs into raw documents
pub struct LoaderGateway {
    config: LoaderConfig,
    csv: CsvParser,
    xlsx: XlsxParser,
    docx: DocxParser,
    pdf: PdfParser,
    text: TextParser,
    url: UrlParser,
}

impl LoaderGateway {
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            csv: CsvParser,
            xlsx: XlsxParser,
            docx: DocxParser,
            pdf: PdfParser,
            text: TextParser,
            url: UrlParser::new(config)?,
        })
    }

    /// Parser and chunking strategy for a source kind.
    ///
    /// The strategy comes from [`SourceKind::strategy`]; only the parser
    /// lookup lives here.
    pub fn route(&self, kind: SourceKind) -> (&dyn FormatParser, StrategyKind) {
        let parser: &dyn FormatParser = match kind {
            SourceKind::Csv => &self.csv,
            SourceKind::Xlsx => &self.xlsx,
            SourceKind::Docx => &self.docx,
            SourceKind::Pdf => &self.pdf,
            SourceKind::Txt => &self.text,
            SourceKind::Url => &self.url,
        };
        (parser, kind.strategy())
    }

    /// Resolve, check and parse `input`.
    ///
    /// Parse failures are turned into a single error-flagged document when
    /// `degrade_parse_failures` is set; every other error is returned as is.
    pub async fn load(&self, input: &str) -> Result<(SourceKind, Vec<RawDocument>)> {
        let kind = SourceKind::resolve(input)?;
        if !kind.is_remote() {
            self.check_local(input).await?;
        }

        let (parser, _) = self.route(kind);
        let documents = match parser.parse(input).await {
            Ok(documents) => documents,
            Err(e) if e.is_parse_failure() && self.config.degrade_parse_failures => {
                tracing::warn!(source = input, error = %e, "Parse failed, continuing with error document");
                vec![error_document(input, &e)]
            }
            Err(e) => return Err(e),
        };

        tracing::debug!(source = input, kind = %kind, documents = documents.len(), "Loaded source");
        Ok((kind, documents.into_iter().map(|d| stamp(d, input, kind)).collect()))
    }

    async fn check_local(&self, input: &str) -> Result<()> {
        let path = Path::new(input);
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::SourceNotFound(input.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            return Err(Error::SourceNotFound(input.to_string()));
        }
        if metadata.len() > self.config.max_file_size {
            return Err(Error::FileTooLarge {
                size: metadata.len(),
                limit: self.config.max_file_size,
            });
        }
        Ok(())
    }
}

fn error_document(input: &str, error: &Error) -> RawDocument {
    let message = match error {
        Error::Parse { message, .. } => message.clone(),
        other => other.to_string(),
    };
    RawDocument::new(
        format!("Failed to parse {}: {}", input, message),
        Metadata::new()
            .with(keys::ERROR, true)
            .with(keys::ERROR_MESSAGE, message),
    )
}

/// Add the provenance keys shared by every format
fn stamp(document: RawDocument, input: &str, kind: SourceKind) -> RawDocument {
    let hash = hex::encode(Sha256::digest(document.text.as_bytes()));
    let metadata = document
        .metadata
        .with(keys::SOURCE, input)
        .with(keys::FILE_TYPE, kind.as_str())
        .with(keys::CONTENT_TYPE, kind.content_type())
        .with(keys::CONTENT_HASH, hash);

    RawDocument::new(document.text, metadata)
}
