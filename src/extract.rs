//! Extraction entry points.
//!
//! [`extract`] runs the whole engine on an in-memory [`OcrDocument`]:
//!
//! 1. build the document-wide heading blacklist (must finish first)
//! 2. per selected page: segment → title → repair → normalise
//! 3. concatenate per-page results in page order
//!
//! Step 2 touches nothing but its own page and the read-only blacklist, so
//! pages run on the rayon pool when `config.parallel` is set. The engine
//! never fails; [`extract_file`] adds the fallible load/store edge.

use crate::config::{ExtractionConfig, RunConfig};
use crate::document::{OcrDocument, Page};
use crate::error::{FinTabError, TableIssue};
use crate::output::{ExtractionOutput, ExtractionStats, NormalizedRecord, NormalizedTable, TableResult};
use crate::pipeline::normalize::normalize_with_report;
use crate::pipeline::repair::{has_split_currency, repair_table};
use crate::pipeline::segment::segment_page;
use crate::pipeline::title::{resolve_title, titled, HeadingBlacklist, TitledTableBlock};
use crate::sink;
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Segment, title and repair every table in the selected pages, without
/// normalising them.
pub fn extract_tables(doc: &OcrDocument, config: &ExtractionConfig) -> Vec<NormalizedTable> {
    let blacklist = HeadingBlacklist::build(doc, config.min_heading_repeats);
    selected_pages(doc, config)
        .flat_map(|page| titled_blocks(page, &blacklist, config))
        .map(|t| repaired(&t).0)
        .collect()
}

/// Run the full pipeline on an in-memory document.
///
/// Zero pages, empty pages and pages without tables all produce an empty
/// record list rather than an error.
pub fn extract(doc: &OcrDocument, config: &ExtractionConfig) -> ExtractionOutput {
    let start = Instant::now();

    // ── Step 1: Blacklist ────────────────────────────────────────────────
    let blacklist = HeadingBlacklist::build(doc, config.min_heading_repeats);
    let blacklist_sorted = blacklist.sorted();
    if blacklist_sorted.is_empty() {
        info!("Repeated-heading blacklist: none");
    } else {
        info!("Repeated-heading blacklist: {:?}", blacklist_sorted);
    }

    let pages: Vec<&Page> = selected_pages(doc, config).collect();
    info!("Extracting tables from {}/{} pages", pages.len(), doc.pages.len());
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(pages.len());
    }

    // ── Step 2: Per-page processing ──────────────────────────────────────
    let per_page: Vec<Vec<(TableResult, Vec<NormalizedRecord>)>> = if config.parallel {
        pages
            .par_iter()
            .map(|page| process_page(page, &blacklist, config))
            .collect()
    } else {
        pages
            .iter()
            .map(|page| process_page(page, &blacklist, config))
            .collect()
    };

    // ── Step 3: Assemble ─────────────────────────────────────────────────
    let mut output = ExtractionOutput {
        blacklist: blacklist_sorted,
        ..Default::default()
    };
    for (table, records) in per_page.into_iter().flatten() {
        output.records.extend(records);
        output.tables.push(table);
    }

    output.stats = ExtractionStats {
        total_pages: doc.pages.len(),
        processed_pages: pages.len(),
        tables_found: output.tables.len(),
        tables_titled: output.tables.iter().filter(|t| t.has_caption).count(),
        tables_repaired: output.tables.iter().filter(|t| t.repaired).count(),
        tables_dropped: output
            .issues()
            .filter(|i| matches!(i, TableIssue::MissingSeparator { .. }))
            .count(),
        records: output.records.len(),
        unparsed_cells: output
            .issues()
            .map(|i| match i {
                TableIssue::UnparsedCells { count, .. } => *count,
                _ => 0,
            })
            .sum(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Extraction complete: {} tables, {} records, {}ms",
        output.stats.tables_found, output.stats.records, output.stats.duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(output.stats.tables_found, output.stats.records);
    }

    output
}

/// Load `run.input_path`, extract, and write records to `run.output_path`
/// when one is set.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_file(run: &RunConfig) -> Result<ExtractionOutput, FinTabError> {
    info!("Starting extraction: {}", run.input_path.display());
    let doc = OcrDocument::load(&run.input_path).await?;
    let output = extract(&doc, &run.extraction);

    if let Some(ref path) = run.output_path {
        let bytes = sink::records_to_bytes(&output.records, run.format)?;
        write_atomic(path, &bytes).await?;
        info!("Wrote {} records to {}", output.records.len(), path.display());
    }

    Ok(output)
}

/// Load a document and return its repaired tables without normalising them.
pub async fn inspect(
    input: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<Vec<NormalizedTable>, FinTabError> {
    let doc = OcrDocument::load(input).await?;
    Ok(extract_tables(&doc, config))
}

/// Synchronous wrapper around [`extract_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_file_sync(run: &RunConfig) -> Result<ExtractionOutput, FinTabError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| FinTabError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_file(run))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn selected_pages<'a>(
    doc: &'a OcrDocument,
    config: &'a ExtractionConfig,
) -> impl Iterator<Item = &'a Page> + 'a {
    doc.pages.iter().filter(|p| config.pages.includes(p.index))
}

fn titled_blocks(
    page: &Page,
    blacklist: &HeadingBlacklist,
    config: &ExtractionConfig,
) -> Vec<TitledTableBlock> {
    segment_page(page, config.min_table_lines)
        .into_iter()
        .map(|block| {
            let found = resolve_title(&block, page, blacklist, config);
            titled(block, found, config)
        })
        .collect()
}

/// Repair a titled block; the flag reports whether the artefact was present.
fn repaired(t: &TitledTableBlock) -> (NormalizedTable, bool) {
    let markdown = t.block.markdown();
    let was_split = has_split_currency(&markdown);
    let table = NormalizedTable {
        page_index: t.block.page_index,
        table_title: t.title.clone(),
        corrected_markdown: repair_table(&markdown),
    };
    (table, was_split)
}

fn process_page(
    page: &Page,
    blacklist: &HeadingBlacklist,
    config: &ExtractionConfig,
) -> Vec<(TableResult, Vec<NormalizedRecord>)> {
    let blocks = titled_blocks(page, blacklist, config);
    let mut results = Vec::with_capacity(blocks.len());

    for t in &blocks {
        let (table, was_split) = repaired(t);
        let outcome = normalize_with_report(&table, &config.currency);

        let mut issues = Vec::new();
        if !t.has_caption {
            issues.push(TableIssue::Untitled {
                page_index: page.index,
            });
        }
        if outcome.missing_separator {
            warn!(
                "Page {}: table '{}' has no header separator, dropped",
                page.index, table.table_title
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_table_dropped(page.index, &table.table_title);
            }
            issues.push(TableIssue::MissingSeparator {
                page_index: page.index,
                title: table.table_title.clone(),
            });
        }
        if outcome.unparsed_cells > 0 {
            issues.push(TableIssue::UnparsedCells {
                page_index: page.index,
                title: table.table_title.clone(),
                count: outcome.unparsed_cells,
            });
        }

        debug!(
            "Page {}: table '{}' ({} lines, repaired: {}) → {} records",
            page.index,
            table.table_title,
            t.block.lines.len(),
            was_split,
            outcome.records.len()
        );

        results.push((
            TableResult {
                table,
                has_caption: t.has_caption,
                repaired: was_split,
                record_count: outcome.records.len(),
                issues,
            },
            outcome.records,
        ));
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_page_complete(page.index, results.len());
    }
    results
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), FinTabError> {
    let write_err = |e: std::io::Error| FinTabError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        // Best effort; report the rename error.
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pages: &[&str]) -> OcrDocument {
        OcrDocument::new(
            pages
                .iter()
                .enumerate()
                .map(|(i, md)| Page::new(i, *md))
                .collect(),
        )
    }

    #[test]
    fn empty_document_is_empty_output() {
        let out = extract(&OcrDocument::default(), &ExtractionConfig::default());
        assert!(out.records.is_empty());
        assert!(out.tables.is_empty());
        assert_eq!(out.stats.total_pages, 0);
    }

    #[test]
    fn empty_markdown_page_is_empty_output() {
        let out = extract(&doc(&[""]), &ExtractionConfig::default());
        assert!(out.records.is_empty());
        assert_eq!(out.stats.processed_pages, 1);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let d = doc(&[
            "## Assets\n| Item | 2024 |\n|---|---|\n| Cash | 10 |",
            "## Liabilities\n| Item | 2024 |\n|---|---|\n| Debt | (4) |",
            "no tables here",
            "## Equity\n| Item | 2024 |\n|---|---|\n| Stock | $ | 7 |",
        ]);
        let par = extract(&d, &ExtractionConfig::default());
        let seq_cfg = ExtractionConfig::builder().parallel(false).build().unwrap();
        let seq = extract(&d, &seq_cfg);
        assert_eq!(par.records, seq.records);
        let pages: Vec<_> = par.records.iter().map(|r| r.page_number).collect();
        assert_eq!(pages, vec![0, 1, 3]);
    }

    #[test]
    fn largest_page_index_is_processed() {
        let d = OcrDocument::new(vec![Page::new(
            usize::MAX,
            "Cash\n| Item | Q1 |\n|---|---|\n| Cash | 5 |",
        )]);
        let out = extract(&d, &ExtractionConfig::default());
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].page_number, usize::MAX);
    }

    #[test]
    fn missing_separator_is_reported_not_raised() {
        let d = doc(&["Notes\n| Item | 2024 |\n| Cash | 10 |"]);
        let out = extract(&d, &ExtractionConfig::default());
        assert!(out.records.is_empty());
        assert_eq!(out.stats.tables_dropped, 1);
        assert!(matches!(
            out.tables[0].issues[0],
            TableIssue::MissingSeparator { page_index: 0, .. }
        ));
    }

    #[test]
    fn repaired_table_stats() {
        let d = doc(&["Equity\n| Item | 2024 |\n|---|---|\n| Stock | \\$ | 100 |"]);
        let out = extract(&d, &ExtractionConfig::default());
        assert_eq!(out.stats.tables_repaired, 1);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].value, 100.0);
    }

    #[test]
    fn page_selection_limits_tables_not_blacklist() {
        let d = doc(&[
            "# Running Header\n| a | 1 |\n|---|---|\n| x | 1 |",
            "# Running Header\n| b | 2 |\n|---|---|\n| y | 2 |",
        ]);
        let cfg = ExtractionConfig::builder()
            .pages(crate::config::PageSelection::Single(2))
            .build()
            .unwrap();
        let out = extract(&d, &cfg);
        assert_eq!(out.tables.len(), 1);
        assert_eq!(out.tables[0].table.page_index, 1);
        assert_eq!(out.tables[0].table.table_title, "(no title found)");
        assert_eq!(out.blacklist, vec!["Running Header".to_string()]);
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory cannot be replaced by a file.
        let target = dir.path().join("records.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let err = write_atomic(&target, b"[]").await.unwrap_err();
        assert!(matches!(err, FinTabError::OutputWriteFailed { .. }));
        assert!(!dir.path().join("records.json.tmp").exists());
        assert!(target.join("keep").exists());
    }

    #[tokio::test]
    async fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("records.csv");
        write_atomic(&target, b"old").await.unwrap();
        write_atomic(&target, b"new").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        assert!(!dir.path().join("nested").join("records.csv.tmp").exists());
    }

    #[test]
    fn extract_tables_returns_repaired_markdown() {
        let d = doc(&["Cash\n| Item | Q1 |\n|---|---|\n| Cash | $ | 5 |"]);
        let tables = extract_tables(&d, &ExtractionConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].table_title, "Cash");
        assert!(tables[0].corrected_markdown.ends_with("| Cash | $5 |"));
    }
}
