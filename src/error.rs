//! Error types for the edgequake-fintab library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`FinTabError`]: **Fatal**: the run cannot proceed at all (input file
//!   missing, OCR JSON malformed, output not writable). Only the I/O edge
//!   ([`crate::extract::extract_file`], [`crate::document::OcrDocument::load`],
//!   [`crate::sink`]) returns it.
//!
//! * [`TableIssue`]: **Non-fatal**: one table was ambiguous or had cells
//!   that could not be read as numbers. Stored on
//!   [`crate::output::TableResult`] so one malformed table never aborts the
//!   rest of the document.
//!
//! The engine stages themselves never fail: structural ambiguity degrades to
//! a placeholder title or an empty record list, and a cell that is not a
//! number is simply not emitted.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-fintab library.
#[derive(Debug, Error)]
pub enum FinTabError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read but is not a usable OCR document.
    #[error("Invalid OCR input '{path}': {detail}")]
    InvalidInput { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Records could not be serialised in the requested format.
    #[error("Failed to serialise records: {0}")]
    Serialization(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for FinTabError {
    fn from(e: serde_json::Error) -> Self {
        FinTabError::Serialization(e.to_string())
    }
}

impl From<csv::Error> for FinTabError {
    fn from(e: csv::Error) -> Self {
        FinTabError::Serialization(e.to_string())
    }
}

/// A non-fatal problem with a single table.
///
/// Issues are informational: the table is still reported in the output,
/// possibly with zero records.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum TableIssue {
    /// No `---` header separator survived repair; the table yields no records.
    #[error("Page {page_index}: table '{title}' has no header separator, dropped")]
    MissingSeparator { page_index: usize, title: String },

    /// No acceptable caption precedes the table; the placeholder title was used.
    #[error("Page {page_index}: no caption found for table")]
    Untitled { page_index: usize },

    /// Some non-empty cells under a column header were not numbers.
    #[error("Page {page_index}: table '{title}' has {count} non-numeric cells")]
    UnparsedCells {
        page_index: usize,
        title: String,
        count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_separator_display() {
        let e = TableIssue::MissingSeparator {
            page_index: 4,
            title: "Balance Sheet".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Page 4"), "got: {msg}");
        assert!(msg.contains("Balance Sheet"), "got: {msg}");
    }

    #[test]
    fn unparsed_cells_display() {
        let e = TableIssue::UnparsedCells {
            page_index: 1,
            title: "Cash Flows".into(),
            count: 3,
        };
        assert!(e.to_string().contains("3 non-numeric"));
    }

    #[test]
    fn invalid_input_display() {
        let e = FinTabError::InvalidInput {
            path: PathBuf::from("ocr.json"),
            detail: "expected value at line 1".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("ocr.json"));
        assert!(msg.contains("line 1"));
    }

    #[test]
    fn json_error_converts_to_serialization() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: FinTabError = err.into();
        assert!(matches!(e, FinTabError::Serialization(_)));
    }
}
