//! Output types produced by the extraction pipeline.

use crate::error::TableIssue;
use serde::{Deserialize, Serialize};

/// One repaired table, ready for normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTable {
    pub page_index: usize,
    pub table_title: String,
    pub corrected_markdown: String,
}

/// One numeric observation from a table cell.
///
/// Field order is the column order written by [`crate::sink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub table_name: String,
    pub row_label: String,
    pub column_header: String,
    /// Always finite.
    pub value: f64,
    pub currency: String,
    /// 0-indexed OCR page index of the source table.
    pub page_number: usize,
}

/// Per-table summary of what the pipeline did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableResult {
    pub table: NormalizedTable,
    /// A caption was found (the title is not the placeholder).
    pub has_caption: bool,
    /// Split-currency cells were merged.
    pub repaired: bool,
    pub record_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<TableIssue>,
}

/// Aggregate statistics for an extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages selected and segmented.
    pub processed_pages: usize,
    pub tables_found: usize,
    pub tables_titled: usize,
    pub tables_repaired: usize,
    /// Tables with no header separator (zero records).
    pub tables_dropped: usize,
    pub records: usize,
    pub unparsed_cells: usize,
    pub duration_ms: u64,
}

/// Everything an extraction run produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Long-form records in page, table, row, column order.
    pub records: Vec<NormalizedRecord>,
    pub tables: Vec<TableResult>,
    /// Headings excluded as captions, sorted.
    pub blacklist: Vec<String>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// All non-fatal issues across tables, in table order.
    pub fn issues(&self) -> impl Iterator<Item = &TableIssue> {
        self.tables.iter().flat_map(|t| t.issues.iter())
    }
}
