//! Long-form normalisation: one record per numeric cell.
//!
//! A repaired table is split at its first `---` line. Everything above is
//! header (stacked header rows are joined per column), everything below is
//! data. The first cell of each data row is its label; every other cell that
//! sits under a header and reads as a financial number becomes one
//! [`NormalizedRecord`].

use crate::output::{NormalizedRecord, NormalizedTable};
use crate::pipeline::repair::is_separator;

/// How a single cell reads as a financial amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    /// A finite number, sign already applied.
    Number(f64),
    /// Blank, or an explicit "no value" dash.
    Null,
    /// Text that is not a number.
    Invalid,
}

/// Classify a cell: strips `$` and `,`, treats `—`/`-` as null and
/// `(123)` as negative.
pub fn parse_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }

    let cleaned = trimmed.replace(['$', ','], "");
    let cleaned = cleaned.trim();
    if cleaned == "—" || cleaned == "-" {
        return CellValue::Null;
    }

    let (body, negative) = match cleaned
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (inner.trim(), true),
        None => (cleaned, false),
    };

    match body.parse::<f64>() {
        Ok(v) if v.is_finite() => CellValue::Number(if negative { -v } else { v }),
        _ => CellValue::Invalid,
    }
}

/// Parse a financial-table cell into a number. `None` for blanks, dashes and
/// anything that is not a finite decimal.
///
/// ```rust
/// use edgequake_fintab::clean_numeric_value;
///
/// assert_eq!(clean_numeric_value("$1,234"), Some(1234.0));
/// assert_eq!(clean_numeric_value("(500)"), Some(-500.0));
/// assert_eq!(clean_numeric_value("—"), None);
/// assert_eq!(clean_numeric_value("N/A"), None);
/// ```
pub fn clean_numeric_value(raw: &str) -> Option<f64> {
    match parse_cell(raw) {
        CellValue::Number(v) => Some(v),
        CellValue::Null | CellValue::Invalid => None,
    }
}

/// Result of normalising one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeOutcome {
    pub records: Vec<NormalizedRecord>,
    /// No `---` line was found; the table could not be parsed.
    pub missing_separator: bool,
    /// Cells under a header that were neither numbers nor null markers.
    pub unparsed_cells: usize,
}

/// Split a pipe row into cells, dropping the outer pipes.
fn split_cells(line: &str) -> Vec<&str> {
    line.trim().trim_matches('|').split('|').collect()
}

/// Join stacked header rows into one name per column.
fn column_headers(header_rows: &[Vec<&str>]) -> Vec<String> {
    let width = header_rows.first().map_or(0, Vec::len);
    (0..width)
        .map(|i| {
            header_rows
                .iter()
                .filter_map(|row| row.get(i).map(|c| c.trim()))
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Normalise a table and report what was dropped along the way.
pub fn normalize_with_report(table: &NormalizedTable, currency: &str) -> NormalizeOutcome {
    let lines: Vec<&str> = table.corrected_markdown.trim().split('\n').collect();

    let Some(separator_index) = lines.iter().position(|l| is_separator(l)) else {
        return NormalizeOutcome {
            missing_separator: true,
            ..Default::default()
        };
    };

    let header_rows: Vec<Vec<&str>> = lines[..separator_index].iter().map(|l| split_cells(l)).collect();
    let data_rows: Vec<Vec<&str>> = lines[separator_index + 1..].iter().map(|l| split_cells(l)).collect();

    let mut outcome = NormalizeOutcome::default();
    if header_rows.is_empty() || data_rows.is_empty() {
        return outcome;
    }

    let headers = column_headers(&header_rows);

    for row in &data_rows {
        let row_label = row[0].trim();
        if row_label.is_empty() {
            continue;
        }
        for (i, cell) in row.iter().enumerate().skip(1) {
            let Some(header) = headers.get(i) else { break };
            match parse_cell(cell) {
                CellValue::Number(value) => outcome.records.push(NormalizedRecord {
                    table_name: table.table_title.clone(),
                    row_label: row_label.to_string(),
                    column_header: header.clone(),
                    value,
                    currency: currency.to_string(),
                    page_number: table.page_index,
                }),
                CellValue::Invalid => outcome.unparsed_cells += 1,
                CellValue::Null => {}
            }
        }
    }

    outcome
}

/// Convert one repaired table into long-form records.
pub fn normalize_table(table: &NormalizedTable, currency: &str) -> Vec<NormalizedRecord> {
    normalize_with_report(table, currency).records
}
