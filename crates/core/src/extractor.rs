use crate::error::ParseError;
use lopdf::Document;
use regex::Regex;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

/// A table reconstructed from one page, tagged with its source page.
/// Rows are raw cell strings; interpretation happens downstream.
#[derive(Debug, Clone)]
pub struct ExtractedTable {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
}

/// Everything a document source yields: the newline-joined page text and
/// whatever tables were recognized along the way.
#[derive(Debug, Clone, Default)]
pub struct DocumentContent {
    pub raw_text: String,
    pub tables: Vec<ExtractedTable>,
}

pub trait PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, ParseError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, ParseError> {
        let document = Document::load(path).map_err(|error| ParseError::PdfParse(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            // A single unreadable page degrades the result, it does not
            // abort the document.
            let text = match document.extract_text(&[page_no]) {
                Ok(text) => text,
                Err(error) => {
                    debug!(page = page_no, %error, "skipping unreadable page");
                    continue;
                }
            };

            if !text.trim().is_empty() {
                pages.push(PageText {
                    number: page_no,
                    text,
                });
            }
        }

        if pages.is_empty() {
            return Err(ParseError::PdfParse(format!(
                "pdf had no readable page text: {}",
                path.display()
            )));
        }

        Ok(pages)
    }
}

pub fn extract_page_texts(path: &Path) -> Result<Vec<PageText>, ParseError> {
    LopdfExtractor::default().extract_pages(path)
}

/// Pull full text and candidate tables out of a document, page by page.
pub fn extract_document<E: PdfExtractor>(
    extractor: &E,
    path: &Path,
) -> Result<DocumentContent, ParseError> {
    let pages = extractor.extract_pages(path)?;
    content_from_pages(&pages)
}

pub fn content_from_pages(pages: &[PageText]) -> Result<DocumentContent, ParseError> {
    let splitter = Regex::new(r"\s{2,}|\t")?;

    let mut content = DocumentContent::default();
    for page in pages {
        content.raw_text.push_str(&page.text);
        content.raw_text.push('\n');

        content
            .tables
            .extend(detect_tables(&splitter, &page.text, page.number));
    }

    Ok(content)
}

/// Recognize column-aligned blocks in page text. Consecutive lines that
/// split into two or more cells form one table; anything shorter than
/// two rows is discarded as layout noise.
fn detect_tables(splitter: &Regex, page_text: &str, page: u32) -> Vec<ExtractedTable> {
    let mut tables = Vec::new();
    let mut block: Vec<Vec<String>> = Vec::new();

    for line in page_text.lines() {
        let cells: Vec<String> = splitter
            .split(line.trim())
            .map(|cell| cell.trim().to_string())
            .filter(|cell| !cell.is_empty())
            .collect();

        if cells.len() >= 2 {
            block.push(cells);
            continue;
        }

        if block.len() >= 2 {
            tables.push(ExtractedTable {
                page,
                rows: std::mem::take(&mut block),
            });
        } else {
            block.clear();
        }
    }

    if block.len() >= 2 {
        tables.push(ExtractedTable { page, rows: block });
    }

    tables
}
