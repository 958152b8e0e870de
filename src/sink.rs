//! Record serialisation for the storage collaborator.
//!
//! Records are flat, so every format writes the same six columns in the same
//! order: `table_name, row_label, column_header, value, currency,
//! page_number`. Columnar storage (Parquet) is downstream of this crate; CSV
//! and JSON Lines load directly into it.

use crate::error::FinTabError;
use crate::output::NormalizedRecord;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// On-disk format for records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// A pretty-printed JSON array. (default)
    #[default]
    Json,
    /// One JSON object per line.
    JsonLines,
    /// RFC 4180 CSV with a header row.
    Csv,
}

impl OutputFormat {
    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::JsonLines => "jsonl",
            OutputFormat::Csv => "csv",
        }
    }

    /// The format whose extension `path` carries, if any (case-insensitive).
    pub fn for_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        [OutputFormat::Json, OutputFormat::JsonLines, OutputFormat::Csv]
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }
}

impl FromStr for OutputFormat {
    type Err = FinTabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" | "json-lines" => Ok(OutputFormat::JsonLines),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(FinTabError::InvalidConfig(format!(
                "Unknown output format '{other}' (expected json, jsonl or csv)"
            ))),
        }
    }
}

/// Write `records` to `writer` in `format`.
pub fn write_records<W: Write>(
    records: &[NormalizedRecord],
    format: OutputFormat,
    mut writer: W,
) -> Result<(), FinTabError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer
                .write_all(b"\n")
                .map_err(|e| FinTabError::Serialization(e.to_string()))?;
        }
        OutputFormat::JsonLines => {
            for record in records {
                serde_json::to_writer(&mut writer, record)?;
                writer
                    .write_all(b"\n")
                    .map_err(|e| FinTabError::Serialization(e.to_string()))?;
            }
        }
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            if records.is_empty() {
                csv_writer.write_record(CSV_HEADER)?;
            }
            for record in records {
                csv_writer.serialize(record)?;
            }
            csv_writer
                .flush()
                .map_err(|e| FinTabError::Serialization(e.to_string()))?;
        }
    }
    Ok(())
}

const CSV_HEADER: [&str; 6] = [
    "table_name",
    "row_label",
    "column_header",
    "value",
    "currency",
    "page_number",
];

/// Serialise `records` into an in-memory buffer.
pub fn records_to_bytes(
    records: &[NormalizedRecord],
    format: OutputFormat,
) -> Result<Vec<u8>, FinTabError> {
    let mut buf = Vec::new();
    write_records(records, format, &mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<NormalizedRecord> {
        vec![
            NormalizedRecord {
                table_name: "Income Statement".into(),
                row_label: "Revenue".into(),
                column_header: "Q1".into(),
                value: 1200.0,
                currency: "USD".into(),
                page_number: 2,
            },
            NormalizedRecord {
                table_name: "Income Statement".into(),
                row_label: "Cost, net".into(),
                column_header: "Q1".into(),
                value: -300.5,
                currency: "USD".into(),
                page_number: 2,
            },
        ]
    }

    #[test]
    fn csv_has_header_and_quotes_commas() {
        let out = String::from_utf8(records_to_bytes(&sample(), OutputFormat::Csv).unwrap()).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("table_name,row_label,column_header,value,currency,page_number")
        );
        assert_eq!(lines.next(), Some("Income Statement,Revenue,Q1,1200.0,USD,2"));
        assert_eq!(lines.next(), Some("Income Statement,\"Cost, net\",Q1,-300.5,USD,2"));
    }

    #[test]
    fn empty_csv_still_has_header() {
        let out = String::from_utf8(records_to_bytes(&[], OutputFormat::Csv).unwrap()).unwrap();
        assert_eq!(out.trim_end(), CSV_HEADER.join(","));
    }

    #[test]
    fn json_lines_one_object_per_line() {
        let out = String::from_utf8(records_to_bytes(&sample(), OutputFormat::JsonLines).unwrap()).unwrap();
        assert_eq!(out.lines().count(), 2);
        let first: NormalizedRecord = serde_json::from_str(out.lines().next().unwrap()).unwrap();
        assert_eq!(first, sample()[0]);
    }

    #[test]
    fn json_keeps_field_order() {
        let out = String::from_utf8(records_to_bytes(&sample(), OutputFormat::Json).unwrap()).unwrap();
        let table = out.find("\"table_name\"").unwrap();
        let page = out.find("\"page_number\"").unwrap();
        assert!(table < page);
        let parsed: Vec<NormalizedRecord> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn format_parsing() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("ndjson".parse::<OutputFormat>().unwrap(), OutputFormat::JsonLines);
        assert!("parquet".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::JsonLines.extension(), "jsonl");
    }

    #[test]
    fn format_from_output_path() {
        assert_eq!(OutputFormat::for_path(Path::new("silver/q1.CSV")), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::for_path(Path::new("out.jsonl")), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::for_path(Path::new("out.json")), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::for_path(Path::new("out.parquet")), None);
        assert_eq!(OutputFormat::for_path(Path::new("records")), None);
    }
}
