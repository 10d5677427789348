//! Format parsers turning one file or URL into raw documents

use async_trait::async_trait;
use calamine::Reader;
use docx_rs::{DocumentChild, ParagraphChild, RunChild, TableCellContent, TableChild, TableRowChild};
use scraper::{Html, Node, Selector};
use std::sync::OnceLock;
use std::time::Duration;

use super::chunker::ROW_SEPARATOR;
use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::types::{keys, Metadata, RawDocument, SourceKind};

/// Extracts raw documents from one source.
///
/// Parsers only attach format-specific metadata (page, sheet, title...);
/// provenance keys common to every format are stamped by the loader.
#[async_trait]
pub trait FormatParser: Send + Sync {
    /// Source kind handled by this parser
    fn kind(&self) -> SourceKind;

    /// Parse the file or URL at `location`
    async fn parse(&self, location: &str) -> Result<Vec<RawDocument>>;
}

/// Read a local file and run a synchronous parser on the blocking pool
async fn parse_local<F>(location: &str, parse: F) -> Result<Vec<RawDocument>>
where
    F: FnOnce(&str, &[u8]) -> Result<Vec<RawDocument>> + Send + 'static,
{
    let data = tokio::fs::read(location).await?;
    let owned = location.to_string();

    tokio::task::spawn_blocking(move || parse(&owned, &data))
        .await
        .map_err(|e| Error::parse(location, format!("parser task failed: {}", e)))?
}

/// CSV files: one document, one `header: value` block per record
#[derive(Debug, Default)]
pub struct CsvParser;

#[async_trait]
impl FormatParser for CsvParser {
    fn kind(&self) -> SourceKind {
        SourceKind::Csv
    }

    async fn parse(&self, location: &str) -> Result<Vec<RawDocument>> {
        parse_local(location, parse_csv).await
    }
}

/// Excel workbooks: one document per non-empty sheet
#[derive(Debug, Default)]
pub struct XlsxParser;

#[async_trait]
impl FormatParser for XlsxParser {
    fn kind(&self) -> SourceKind {
        SourceKind::Xlsx
    }

    async fn parse(&self, location: &str) -> Result<Vec<RawDocument>> {
        parse_local(location, parse_xlsx).await
    }
}

#[derive(Debug, Default)]
pub struct DocxParser;

#[async_trait]
impl FormatParser for DocxParser {
    fn kind(&self) -> SourceKind {
        SourceKind::Docx
    }

    async fn parse(&self, location: &str) -> Result<Vec<RawDocument>> {
        parse_local(location, parse_docx).await
    }
}

/// PDF files: one document per page with text
#[derive(Debug, Default)]
pub struct PdfParser;

#[async_trait]
impl FormatParser for PdfParser {
    fn kind(&self) -> SourceKind {
        SourceKind::Pdf
    }

    async fn parse(&self, location: &str) -> Result<Vec<RawDocument>> {
        parse_local(location, parse_pdf).await
    }
}

#[derive(Debug, Default)]
pub struct TextParser;

#[async_trait]
impl FormatParser for TextParser {
    fn kind(&self) -> SourceKind {
        SourceKind::Txt
    }

    async fn parse(&self, location: &str) -> Result<Vec<RawDocument>> {
        parse_local(location, parse_text).await
    }
}

/// Web pages fetched once over http(s)
pub struct UrlParser {
    client: reqwest::Client,
}

impl UrlParser {
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FormatParser for UrlParser {
    fn kind(&self) -> SourceKind {
        SourceKind::Url
    }

    async fn parse(&self, location: &str) -> Result<Vec<RawDocument>> {
        let response = self.client.get(location).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::parse(location, format!("HTTP status {}", status)));
        }

        let body = response.text().await?;
        Ok(vec![parse_html(&body)])
    }
}

/// Parse CSV bytes. Records with only blank cells are dropped; a file with
/// no records yields no documents.
pub fn parse_csv(_location: &str, data: &[u8]) -> Result<Vec<RawDocument>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
    let headers: Vec<String> = reader.headers()?.iter().map(flatten_cell).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let values: Vec<String> = record?.iter().map(str::to_string).collect();
        if values.iter().any(|v| !v.trim().is_empty()) {
            rows.push(values);
        }
    }

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let metadata = Metadata::new().with(keys::ROW_COUNT, rows.len());
    Ok(vec![RawDocument::new(render_rows(&headers, &rows), metadata)])
}

/// Parse an XLSX workbook. The first non-empty row of each sheet is its
/// header; sheets without data rows are skipped.
pub fn parse_xlsx(location: &str, data: &[u8]) -> Result<Vec<RawDocument>> {
    let cursor = std::io::Cursor::new(data);
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| Error::parse(location, e.to_string()))?;

    let mut documents = Vec::new();
    for (index, sheet_name) in workbook.sheet_names().into_iter().enumerate() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| Error::parse(location, format!("sheet '{}': {}", sheet_name, e)))?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<String>>())
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()));

        let Some(header) = rows.next() else {
            continue;
        };
        let headers: Vec<String> = header.iter().map(|h| flatten_cell(h)).collect();
        let body: Vec<Vec<String>> = rows.collect();
        if body.is_empty() {
            continue;
        }

        let metadata = Metadata::new()
            .with(keys::SHEET, sheet_name.as_str())
            .with(keys::SHEET_INDEX, index + 1)
            .with(keys::ROW_COUNT, body.len());
        documents.push(RawDocument::new(render_rows(&headers, &body), metadata));
    }

    Ok(documents)
}

fn cell_text(cell: &calamine::Data) -> String {
    match cell {
        calamine::Data::Empty => String::new(),
        calamine::Data::String(s) => s.clone(),
        calamine::Data::Float(f) => f.to_string(),
        calamine::Data::Int(i) => i.to_string(),
        calamine::Data::Bool(b) => b.to_string(),
        calamine::Data::DateTime(dt) => dt.to_string(),
        calamine::Data::DateTimeIso(s) | calamine::Data::DurationIso(s) => s.clone(),
        _ => String::new(),
    }
}

/// Parse a DOCX file: paragraphs become blocks, table rows become
/// `cell | cell` lines
pub fn parse_docx(location: &str, data: &[u8]) -> Result<Vec<RawDocument>> {
    let docx = docx_rs::read_docx(data).map_err(|e| Error::parse(location, e.to_string()))?;

    let mut blocks = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => {
                let text = paragraph_text(paragraph);
                if !text.trim().is_empty() {
                    blocks.push(text);
                }
            }
            DocumentChild::Table(table) => {
                let rows = table_rows(table);
                if !rows.is_empty() {
                    blocks.push(rows.join("\n"));
                }
            }
            _ => {}
        }
    }

    Ok(vec![RawDocument::new(blocks.join("\n\n"), Metadata::new())])
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for part in &run.children {
                match part {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    RunChild::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
    }
    text
}

#[allow(irrefutable_let_patterns, unreachable_patterns)]
fn table_rows(table: &docx_rs::Table) -> Vec<String> {
    let mut rows = Vec::new();
    for row in &table.rows {
        let TableChild::TableRow(row) = row else {
            continue;
        };

        let cells: Vec<String> = row
            .cells
            .iter()
            .filter_map(|cell| match cell {
                TableRowChild::TableCell(cell) => Some(
                    cell.children
                        .iter()
                        .filter_map(|content| match content {
                            TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                            _ => None,
                        })
                        .collect::<Vec<_>>()
                        .join(" "),
                ),
                _ => None,
            })
            .map(|cell| flatten_cell(&cell))
            .collect();

        if cells.iter().any(|c| !c.is_empty()) {
            rows.push(cells.join(" | "));
        }
    }
    rows
}

/// Parse a PDF page by page with lopdf, falling back to whole-document
/// extraction with pdf-extract when no page yields text.
pub fn parse_pdf(location: &str, data: &[u8]) -> Result<Vec<RawDocument>> {
    let document = lopdf::Document::load_mem(data)
        .map_err(|e| Error::parse(location, format!("failed to load PDF: {}", e)))?;

    let pages = document.get_pages();
    let total_pages = pages.len();

    let mut documents = Vec::new();
    for page_number in pages.keys().copied() {
        match document.extract_text(&[page_number]) {
            Ok(text) if !text.trim().is_empty() => {
                let metadata = Metadata::new()
                    .with(keys::PAGE, page_number)
                    .with(keys::TOTAL_PAGES, total_pages);
                documents.push(RawDocument::new(text, metadata));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(source = location, page = page_number, error = %e, "No text on PDF page");
            }
        }
    }

    if documents.is_empty() {
        tracing::warn!(source = location, "Per-page extraction found no text, trying pdf-extract");
        let text = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::parse(location, e.to_string()))?;
        if text.trim().is_empty() {
            return Err(Error::parse(
                location,
                "PDF has no extractable text (image-based or encrypted)",
            ));
        }
        documents.push(RawDocument::new(
            text,
            Metadata::new().with(keys::TOTAL_PAGES, total_pages),
        ));
    }

    Ok(documents)
}

/// Plain text, decoded as UTF-8 with lossy replacement
pub fn parse_text(_location: &str, data: &[u8]) -> Result<Vec<RawDocument>> {
    let text = String::from_utf8_lossy(data).into_owned();
    Ok(vec![RawDocument::new(text, Metadata::new())])
}

/// Elements whose text never reaches the document
const SKIPPED_ELEMENTS: [&str; 6] = ["script", "style", "noscript", "template", "head", "svg"];

/// Elements that start a new block of text
const BLOCK_ELEMENTS: [&str; 30] = [
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dt", "figcaption",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "main", "nav", "p",
    "pre", "section", "table", "td", "th", "tr", "caption", "summary",
];

fn selector(cell: &'static OnceLock<Selector>, css: &str) -> &'static Selector {
    cell.get_or_init(|| Selector::parse(css).expect("static selector"))
}

fn is_element_in(node: &Node, names: &[&str]) -> bool {
    node.as_element()
        .map_or(false, |e| names.contains(&e.name()))
}

/// Extract the readable text of an HTML page plus its title, description
/// and language.
pub fn parse_html(html: &str) -> RawDocument {
    static TITLE: OnceLock<Selector> = OnceLock::new();
    static DESCRIPTION: OnceLock<Selector> = OnceLock::new();
    static BODY: OnceLock<Selector> = OnceLock::new();

    let document = Html::parse_document(html);
    let mut metadata = Metadata::new();

    if let Some(title) = document
        .select(selector(&TITLE, "title"))
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
    {
        metadata = metadata.with(keys::TITLE, title);
    }
    if let Some(description) = document
        .select(selector(&DESCRIPTION, r#"meta[name="description"]"#))
        .next()
        .and_then(|e| e.value().attr("content"))
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        metadata = metadata.with(keys::DESCRIPTION, description);
    }
    if let Some(lang) = document.root_element().value().attr("lang") {
        metadata = metadata.with(keys::LANGUAGE, lang);
    }

    let root = document
        .select(selector(&BODY, "body"))
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_block = None;

    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        if node
            .ancestors()
            .any(|a| is_element_in(a.value(), &SKIPPED_ELEMENTS))
        {
            continue;
        }

        let block = node
            .ancestors()
            .find(|a| is_element_in(a.value(), &BLOCK_ELEMENTS))
            .map(|a| a.id());

        if block != current_block {
            push_block(&mut blocks, &current);
            current.clear();
            current_block = block;
        }
        current.push_str(text);
    }
    push_block(&mut blocks, &current);

    RawDocument::new(blocks.join("\n\n"), metadata)
}

fn push_block(blocks: &mut Vec<String>, text: &str) {
    let collapsed = flatten_cell(text);
    if !collapsed.is_empty() {
        blocks.push(collapsed);
    }
}

/// Collapse all whitespace, line breaks included, to single spaces
fn flatten_cell(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render tabular records as `header: value` lines, one block per record,
/// blocks separated by a blank line. Columns beyond the header row are
/// named `column_<n>`.
pub fn render_rows(headers: &[String], rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(i, value)| {
                    let header = headers
                        .get(i)
                        .filter(|h| !h.is_empty())
                        .cloned()
                        .unwrap_or_else(|| format!("column_{}", i + 1));
                    format!("{}: {}", header, flatten_cell(value))
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join(ROW_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_render_rows() {
        let headers = strings(&["name", "", "city"]);
        let rows = vec![strings(&["Ada", "36", "London"]), strings(&["Alan", "41", "Wilmslow", "x"])];

        assert_eq!(
            render_rows(&headers, &rows),
            "name: Ada\ncolumn_2: 36\ncity: London\n\n\
             name: Alan\ncolumn_2: 41\ncity: Wilmslow\ncolumn_4: x"
        );
    }

    #[test]
    fn test_parse_csv_rows() {
        let data = b"id,note\n1,\"multi\nline\n\ncell\"\n,\n2,plain\n";
        let docs = parse_csv("t.csv", data).unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].metadata.get_u64(keys::ROW_COUNT), Some(2));
        assert_eq!(docs[0].text, "id: 1\nnote: multi line cell\n\nid: 2\nnote: plain");
    }

    #[test]
    fn test_parse_csv_header_only_yields_nothing() {
        assert!(parse_csv("t.csv", b"id,name\n").unwrap().is_empty());
        assert!(parse_csv("t.csv", b"").unwrap().is_empty());
    }

    #[test]
    fn test_parse_csv_invalid_utf8_is_parse_failure() {
        let err = parse_csv("t.csv", b"a,b\n\xff\xfe,1\n").unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_parse_xlsx_rejects_garbage() {
        let err = parse_xlsx("book.xlsx", b"definitely not a zip").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_parse_xlsx_sheets() {
        use crate::ingestion::chunker::split_rows;
        use rust_xlsxwriter::Workbook;

        let mut workbook = Workbook::new();
        let cities = workbook.add_worksheet().set_name("Cities").unwrap();
        cities.write_string(0, 0, "  ").unwrap();
        cities.write_string(1, 0, "city").unwrap();
        cities.write_string(1, 1, "population").unwrap();
        cities.write_string(2, 0, "Oslo").unwrap();
        cities.write_number(2, 1, 700_000.0).unwrap();
        cities.write_string(3, 0, "Bergen").unwrap();
        cities.write_number(3, 1, 290_000.0).unwrap();

        let notes = workbook.add_worksheet().set_name("Notes").unwrap();
        notes.write_string(0, 0, "heading").unwrap();

        let totals = workbook.add_worksheet().set_name("Totals").unwrap();
        totals.write_string(0, 0, "region").unwrap();
        totals.write_string(0, 1, "sum").unwrap();
        totals.write_string(1, 0, "West").unwrap();
        totals.write_number(1, 1, 12.5).unwrap();

        workbook.add_worksheet().set_name("Blank").unwrap();
        let data = workbook.save_to_buffer().unwrap();

        let docs = parse_xlsx("book.xlsx", &data).unwrap();
        assert_eq!(docs.len(), 2);

        let first = &docs[0];
        assert_eq!(first.metadata.get_str(keys::SHEET), Some("Cities"));
        assert_eq!(first.metadata.get_u64(keys::SHEET_INDEX), Some(1));
        assert_eq!(first.metadata.get_u64(keys::ROW_COUNT), Some(2));
        assert_eq!(
            first.text,
            "city: Oslo\npopulation: 700000\n\ncity: Bergen\npopulation: 290000"
        );
        assert_eq!(split_rows(&first.text).len(), 2);

        let second = &docs[1];
        assert_eq!(second.metadata.get_str(keys::SHEET), Some("Totals"));
        assert_eq!(second.metadata.get_u64(keys::SHEET_INDEX), Some(3));
        assert_eq!(second.metadata.get_u64(keys::ROW_COUNT), Some(1));
        assert_eq!(second.text, "region: West\nsum: 12.5");
    }

    #[test]
    fn test_parse_pdf_pages() {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in ["First page text", "Second page text"] {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();

        let docs = parse_pdf("paper.pdf", &data).unwrap();
        assert_eq!(docs.len(), 2);
        for (doc, (page, text)) in docs
            .iter()
            .zip([(1, "First page text"), (2, "Second page text")])
        {
            assert_eq!(doc.metadata.get_i64(keys::PAGE), Some(page));
            assert_eq!(doc.metadata.get_u64(keys::TOTAL_PAGES), Some(2));
            assert!(doc.text.contains(text), "page {} text: {:?}", page, doc.text);
        }
    }

    #[test]
    fn test_parse_pdf_rejects_garbage() {
        let err = parse_pdf("paper.pdf", b"%PDF-garbage").unwrap_err();
        assert!(matches!(err, Error::Parse { ref source_name, .. } if source_name == "paper.pdf"));
    }

    #[test]
    fn test_parse_docx_paragraphs_and_tables() {
        use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};

        let cell = |text: &str| TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)));
        let mut buf = std::io::Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Quarterly report")))
            .add_paragraph(Paragraph::new())
            .add_table(Table::new(vec![
                TableRow::new(vec![cell("Region"), cell("Sales")]),
                TableRow::new(vec![cell("North"), cell("42")]),
            ]))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Summary follows.")))
            .build()
            .pack(&mut buf)
            .unwrap();

        let docs = parse_docx("memo.docx", buf.get_ref()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(
            docs[0].text,
            "Quarterly report\n\nRegion | Sales\nNorth | 42\n\nSummary follows."
        );
    }

    #[test]
    fn test_parse_docx_rejects_garbage() {
        assert!(matches!(
            parse_docx("memo.docx", b"nope"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_text_lossy() {
        let docs = parse_text("a.txt", b"caf\xc3\xa9 \xff end").unwrap();
        assert_eq!(docs[0].text, "caf\u{e9} \u{fffd} end");
    }

    #[test]
    fn test_parse_html() {
        let html = r#"<!DOCTYPE html>
            <html lang="en">
            <head>
              <title> Release notes </title>
              <meta name="description" content="What changed">
              <style>body { color: red; }</style>
            </head>
            <body>
              <h1>Version 2</h1>
              <p>Faster <b>chunking</b> and
                 better logs.</p>
              <script>console.log("skip me")</script>
              <ul><li>One</li><li>Two</li></ul>
            </body>
            </html>"#;

        let doc = parse_html(html);
        assert_eq!(doc.metadata.get_str(keys::TITLE), Some("Release notes"));
        assert_eq!(doc.metadata.get_str(keys::DESCRIPTION), Some("What changed"));
        assert_eq!(doc.metadata.get_str(keys::LANGUAGE), Some("en"));
        assert_eq!(doc.text, "Version 2\n\nFaster chunking and better logs.\n\nOne\n\nTwo");
    }

    #[tokio::test]
    async fn test_text_parser_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hello\nworld").unwrap();

        let docs = TextParser.parse(file.to_str().unwrap()).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "hello\nworld");
    }

    #[tokio::test]
    async fn test_url_parser_fetches_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html><head><title>Docs</title></head><body><p>Hi</p></body></html>"),
            )
            .mount(&server)
            .await;

        let parser = UrlParser::new(&LoaderConfig::default()).unwrap();
        let docs = parser.parse(&format!("{}/docs", server.uri())).await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "Hi");
        assert_eq!(docs[0].metadata.get_str(keys::TITLE), Some("Docs"));
    }

    #[tokio::test]
    async fn test_url_parser_error_status_is_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let parser = UrlParser::new(&LoaderConfig::default()).unwrap();
        let err = parser
            .parse(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();

        assert!(err.is_parse_failure());
        assert!(err.to_string().contains("404"));
    }
}
