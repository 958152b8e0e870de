//! # edgequake-fintab
//!
//! Turn OCR-generated Markdown of financial-statement pages into flat,
//! typed, long-form records.
//!
//! ## Why this crate?
//!
//! OCR services render tables as Markdown pipe tables, but the output is
//! noisy: rows wrap mid-cell, every page repeats the same running header,
//! `$1,234` is sometimes split into a `$` cell and a `1,234` cell, and
//! negative amounts are written `(500)`. Loading that Markdown naively
//! attributes tables to the wrong caption, shifts columns and flips signs.
//! This crate is the deterministic step between the OCR service and
//! analytical storage.
//!
//! ## Pipeline Overview
//!
//! ```text
//! OCR pages
//!  │
//!  ├─ 0. Blacklist  headings repeated anywhere in the document
//!  ├─ 1. Segment    unwrap lines, find runs of ≥2 pipe rows
//!  ├─ 2. Title      nearest short, non-sentence, non-boilerplate line above
//!  ├─ 3. Repair     `| $ | 1,234 |` → `| $1,234 |`, fix the separator width
//!  ├─ 4. Normalise  one (row, column, value) record per numeric cell
//!  └─ 5. Output     records + per-table results + stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use edgequake_fintab::{extract, ExtractionConfig, OcrDocument, Page};
//!
//! let doc = OcrDocument::new(vec![Page::new(
//!     2,
//!     "## Income Statement\n\n| Item | Q1 | Q2 |\n|---|---|---|\n| Revenue | $1,200 | (300) |",
//! )]);
//! let output = extract(&doc, &ExtractionConfig::default());
//!
//! assert_eq!(output.records.len(), 2);
//! assert_eq!(output.records[0].table_name, "Income Statement");
//! assert_eq!(output.records[1].value, -300.0);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fintab` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod sink;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, PageSelection, RunConfig};
pub use document::{OcrDocument, Page};
pub use error::{FinTabError, TableIssue};
pub use extract::{extract, extract_file, extract_file_sync, extract_tables, inspect};
pub use output::{ExtractionOutput, ExtractionStats, NormalizedRecord, NormalizedTable, TableResult};
pub use pipeline::normalize::{clean_numeric_value, normalize_table};
pub use pipeline::repair::repair_table;
pub use pipeline::segment::{segment_page, RawTableBlock};
pub use pipeline::title::{resolve_titles, HeadingBlacklist, TitledTableBlock};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use sink::{write_records, OutputFormat};
