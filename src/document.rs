//! Input model: the per-page Markdown produced by the OCR collaborator.
//!
//! An [`OcrDocument`] is an ordered list of immutable [`Page`]s. It can be
//! built directly, parsed from an OCR response JSON
//! (`{"pages":[{"index":0,"markdown":"..."}]}`, extra fields ignored), or
//! split out of a single Markdown file that uses `<!-- page N -->`
//! separator comments between pages.

use crate::error::FinTabError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// One physical page of OCR output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 0-indexed position in the source document.
    pub index: usize,
    /// Full-page Markdown: `#` headings, prose and pipe-table rows.
    pub markdown: String,
}

impl Page {
    pub fn new(index: usize, markdown: impl Into<String>) -> Self {
        Self {
            index,
            markdown: markdown.into(),
        }
    }
}

/// An ordered sequence of pages in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrDocument {
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OcrJson {
    Response(OcrDocument),
    Pages(Vec<Page>),
}

static RE_PAGE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^[ \t]*<!--\s*page\s+(\d+)\s*-->[ \t\r]*$").unwrap());

impl OcrDocument {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Parse an OCR response: either an object with a `pages` array or a
    /// bare array of pages.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let doc = match serde_json::from_str::<OcrJson>(json)? {
            OcrJson::Response(doc) => doc,
            OcrJson::Pages(pages) => OcrDocument { pages },
        };
        Ok(doc)
    }

    /// Split a Markdown file into pages on `<!-- page N -->` markers.
    ///
    /// Marker `N` is 1-indexed and starts page index `N - 1`. Text before
    /// the first marker is page 0. A file with no markers is one page.
    /// CRLF line endings are read as LF.
    pub fn from_markdown(markdown: &str) -> Self {
        let markdown = markdown.replace("\r\n", "\n");
        let markdown = markdown.as_str();
        let mut pages = Vec::new();
        let mut current_index = 0usize;
        let mut start = 0usize;

        for caps in RE_PAGE_MARKER.captures_iter(markdown) {
            let Some(m) = caps.get(0) else { continue };
            let body = &markdown[start..m.start()];
            if !(pages.is_empty() && body.trim().is_empty()) {
                pages.push(Page::new(current_index, body.trim_matches('\n')));
            }
            current_index = caps[1].parse::<usize>().unwrap_or(1).saturating_sub(1);
            start = m.end();
        }
        pages.push(Page::new(current_index, markdown[start..].trim_matches('\n')));

        debug!("Split Markdown input into {} pages", pages.len());
        OcrDocument { pages }
    }

    /// Load a document from disk: `.json` is parsed as an OCR response,
    /// anything else as Markdown.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FinTabError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FinTabError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => FinTabError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => FinTabError::InvalidInput {
                path: path.to_path_buf(),
                detail: e.to_string(),
            },
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let doc = if is_json {
            Self::from_json(&text).map_err(|e| FinTabError::InvalidInput {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
        } else {
            Self::from_markdown(&text)
        };

        info!("Loaded {} pages from {}", doc.pages.len(), path.display());
        Ok(doc)
    }

    /// Look up a page by its OCR index.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.iter().find(|p| p.index == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ocr_response_ignoring_extra_fields() {
        let json = r##"{
            "model": "ocr-latest",
            "pages": [
                {"index": 0, "markdown": "# Cover", "images": [], "dimensions": {"dpi": 200}},
                {"index": 1, "markdown": "| a | b |\n|---|---|"}
            ]
        }"##;
        let doc = OcrDocument::from_json(json).unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[1].index, 1);
        assert!(doc.pages[1].markdown.starts_with("| a |"));
    }

    #[test]
    fn parses_bare_page_array() {
        let doc = OcrDocument::from_json(r#"[{"index": 3, "markdown": "x"}]"#).unwrap();
        assert_eq!(doc.pages, vec![Page::new(3, "x")]);
    }

    #[test]
    fn missing_pages_is_empty_document() {
        let doc = OcrDocument::from_json("{}").unwrap();
        assert!(doc.pages.is_empty());
    }

    #[test]
    fn markdown_without_markers_is_one_page() {
        let doc = OcrDocument::from_markdown("# Title\n\n| a | b |\n|---|---|\n");
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].index, 0);
    }

    #[test]
    fn markdown_split_on_page_comments() {
        let md = "first page\n\n<!-- page 2 -->\n\nsecond page\n\n<!-- page 3 -->\n\nthird";
        let doc = OcrDocument::from_markdown(md);
        assert_eq!(doc.pages.len(), 3);
        assert_eq!(doc.pages[0], Page::new(0, "first page"));
        assert_eq!(doc.pages[1], Page::new(1, "second page"));
        assert_eq!(doc.pages[2], Page::new(2, "third"));
    }

    #[test]
    fn markdown_with_crlf_line_endings() {
        let doc = OcrDocument::from_markdown("first\r\n<!-- page 2 -->\r\nsecond\r\n");
        assert_eq!(doc.pages, vec![Page::new(0, "first"), Page::new(1, "second")]);
    }

    #[test]
    fn crlf_table_rows_stay_on_their_own_lines() {
        let doc = OcrDocument::from_markdown("| a | b |\r\n|---|---|\r\n| x | 1 |\r\n");
        assert_eq!(doc.pages[0].markdown, "| a | b |\n|---|---|\n| x | 1 |");
    }

    #[test]
    fn leading_marker_does_not_create_empty_page() {
        let doc = OcrDocument::from_markdown("<!-- page 1 -->\nonly\n");
        assert_eq!(doc.pages, vec![Page::new(0, "only")]);
    }

    #[test]
    fn page_lookup_by_index() {
        let doc = OcrDocument::new(vec![Page::new(4, "four"), Page::new(7, "seven")]);
        assert_eq!(doc.page(7).map(|p| p.markdown.as_str()), Some("seven"));
        assert!(doc.page(0).is_none());
    }
}
