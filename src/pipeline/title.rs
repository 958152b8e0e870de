//! Caption resolution: give each table the nearest plausible heading above it.
//!
//! Financial statements repeat the same running header on every page
//! ("Consolidated Financial Statements", the company name, ...). Any heading
//! that occurs more than once in the document is blacklisted before titles
//! are resolved, so a table is never captioned with boilerplate.
//!
//! The scan walks upward from the table's first line and takes the first
//! line that is non-blank, not another table row, short enough to be a
//! caption, not sentence-like, and not blacklisted. Precision wins over
//! recall here: a placeholder title is safer than a wrong one.

use crate::config::ExtractionConfig;
use crate::document::{OcrDocument, Page};
use crate::pipeline::segment::RawTableBlock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Document-wide set of repeated headings. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadingBlacklist {
    headings: HashSet<String>,
}

impl HeadingBlacklist {
    /// Count every `#` heading across all pages and keep those seen at least
    /// `min_repeats` times.
    pub fn build(doc: &OcrDocument, min_repeats: usize) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for page in &doc.pages {
            for line in page.markdown.split('\n') {
                let stripped = line.trim();
                if stripped.starts_with('#') {
                    *counts.entry(strip_heading_marker(stripped)).or_default() += 1;
                }
            }
        }

        let headings = counts
            .into_iter()
            .filter(|(_, n)| *n >= min_repeats)
            .map(|(h, _)| h.to_string())
            .collect();
        Self { headings }
    }

    pub fn contains(&self, heading: &str) -> bool {
        self.headings.contains(heading)
    }

    pub fn len(&self) -> usize {
        self.headings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headings.is_empty()
    }

    /// Headings in sorted order, for logging and output.
    pub fn sorted(&self) -> Vec<String> {
        self.headings.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect()
    }
}

/// A raw block with its resolved caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitledTableBlock {
    pub block: RawTableBlock,
    pub title: String,
    /// False when `title` is the configured placeholder.
    pub has_caption: bool,
}

/// Strip leading `#` markers and spaces from a heading line.
pub fn strip_heading_marker(line: &str) -> &str {
    line.trim_start_matches(['#', ' ']).trim()
}

/// Find the caption for `block` by scanning `page` upward from the block's
/// first line. Returns `None` when no line qualifies.
pub fn resolve_title(
    block: &RawTableBlock,
    page: &Page,
    blacklist: &HeadingBlacklist,
    config: &ExtractionConfig,
) -> Option<String> {
    page.markdown
        .split('\n')
        .take(block.start_line)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .find_map(|line| caption_candidate(line, blacklist, config))
        .map(str::to_string)
}

fn caption_candidate<'a>(
    line: &'a str,
    blacklist: &HeadingBlacklist,
    config: &ExtractionConfig,
) -> Option<&'a str> {
    let text = line.trim();
    if text.is_empty() || text.starts_with('|') {
        return None;
    }
    if text.chars().count() > config.max_title_len {
        return None;
    }
    if text.ends_with(config.title_excluded_suffixes.as_slice()) {
        return None;
    }
    let clean = strip_heading_marker(text);
    if clean.is_empty() || blacklist.contains(clean) {
        return None;
    }
    Some(clean)
}

/// Attach a title to every block, using the placeholder when none is found.
///
/// Blocks whose page is missing from `doc` keep the placeholder.
pub fn resolve_titles(
    blocks: Vec<RawTableBlock>,
    doc: &OcrDocument,
    blacklist: &HeadingBlacklist,
    config: &ExtractionConfig,
) -> Vec<TitledTableBlock> {
    blocks
        .into_iter()
        .map(|block| {
            let found = doc
                .page(block.page_index)
                .and_then(|page| resolve_title(&block, page, blacklist, config));
            titled(block, found, config)
        })
        .collect()
}

pub(crate) fn titled(
    block: RawTableBlock,
    found: Option<String>,
    config: &ExtractionConfig,
) -> TitledTableBlock {
    match found {
        Some(title) => TitledTableBlock {
            block,
            title,
            has_caption: true,
        },
        None => TitledTableBlock {
            block,
            title: config.default_title.clone(),
            has_caption: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::segment::segment_page;

    fn doc(pages: &[&str]) -> OcrDocument {
        OcrDocument::new(
            pages
                .iter()
                .enumerate()
                .map(|(i, md)| Page::new(i, *md))
                .collect(),
        )
    }

    fn titles_for(d: &OcrDocument) -> Vec<String> {
        let config = ExtractionConfig::default();
        let blacklist = HeadingBlacklist::build(d, config.min_heading_repeats);
        let blocks = d.pages.iter().flat_map(|p| segment_page(p, 2)).collect();
        resolve_titles(blocks, d, &blacklist, &config)
            .into_iter()
            .map(|t| t.title)
            .collect()
    }

    #[test]
    fn nearest_heading_becomes_title() {
        let d = doc(&["# Report\n\n## Income Statement\n\n| a | b |\n|---|---|"]);
        assert_eq!(titles_for(&d), vec!["Income Statement"]);
    }

    #[test]
    fn plain_short_line_is_a_caption() {
        let d = doc(&["Statement of Cash Flows\n| a | b |\n|---|---|"]);
        assert_eq!(titles_for(&d), vec!["Statement of Cash Flows"]);
    }

    #[test]
    fn repeated_heading_is_blacklisted_on_every_page() {
        let d = doc(&[
            "# Consolidated Financial Statements\n| a | b |\n|---|---|",
            "# Balance Sheet\n# Consolidated Financial Statements\n| c | d |\n|---|---|",
        ]);
        let blacklist = HeadingBlacklist::build(&d, 2);
        assert!(blacklist.contains("Consolidated Financial Statements"));
        assert_eq!(titles_for(&d), vec!["(no title found)", "Balance Sheet"]);
    }

    #[test]
    fn sentence_like_and_long_lines_are_skipped() {
        let long = "x".repeat(101);
        let md = format!(
            "Operating Segments\nThe table below summarises results.\nAmounts in thousands:\n{long}\n| a | b |\n|---|---|"
        );
        let d = doc(&[md.as_str()]);
        assert_eq!(titles_for(&d), vec!["Operating Segments"]);
    }

    #[test]
    fn semicolon_terminated_line_is_skipped() {
        let d = doc(&["Cash Flows\nsee note 4; restated\nnet of tax;\n| a | b |\n|---|---|"]);
        assert_eq!(titles_for(&d), vec!["see note 4; restated"]);
        let d = doc(&["Cash Flows\nnet of tax;\n| a | b |\n|---|---|"]);
        assert_eq!(titles_for(&d), vec!["Cash Flows"]);
    }

    #[test]
    fn exactly_max_length_is_accepted() {
        let caption = "y".repeat(100);
        let md = format!("{caption}\n| a | b |\n|---|---|");
        let d = doc(&[md.as_str()]);
        assert_eq!(titles_for(&d), vec![caption]);
    }

    #[test]
    fn previous_table_rows_are_skipped() {
        let md = "Assets\n| a | b |\n|---|---|\n\n| c | d |\n|---|---|";
        let d = doc(&[md]);
        assert_eq!(titles_for(&d), vec!["Assets", "Assets"]);
    }

    #[test]
    fn no_preceding_text_gives_placeholder() {
        let d = doc(&["| a | b |\n|---|---|"]);
        let config = ExtractionConfig::default();
        let blacklist = HeadingBlacklist::build(&d, 2);
        let blocks = segment_page(&d.pages[0], 2);
        let titled = resolve_titles(blocks, &d, &blacklist, &config);
        assert_eq!(titled[0].title, "(no title found)");
        assert!(!titled[0].has_caption);
    }

    #[test]
    fn identical_tables_bind_to_their_own_captions() {
        let md = "First Quarter\n| a | b |\n|---|---|\n\nSecond Quarter\n| a | b |\n|---|---|";
        let d = doc(&[md]);
        assert_eq!(titles_for(&d), vec!["First Quarter", "Second Quarter"]);
    }

    #[test]
    fn bare_heading_marker_is_not_a_title() {
        let d = doc(&["Liabilities\n#\n| a | b |\n|---|---|"]);
        assert_eq!(titles_for(&d), vec!["Liabilities"]);
    }

    #[test]
    fn strip_heading_marker_handles_levels() {
        assert_eq!(strip_heading_marker("### Notes "), "Notes");
        assert_eq!(strip_heading_marker("# # Mixed"), "Mixed");
        assert_eq!(strip_heading_marker("Plain"), "Plain");
    }

    #[test]
    fn blacklist_sorted_output() {
        let d = doc(&["# B\n# A", "# B\n# A\n# C"]);
        let blacklist = HeadingBlacklist::build(&d, 2);
        assert_eq!(blacklist.sorted(), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(blacklist.len(), 2);
    }
}
