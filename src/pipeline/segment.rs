//! Table segmentation: find pipe-table blocks in one page of OCR Markdown.
//!
//! The OCR renderer wraps long rows mid-cell, so a row such as
//! `| Total operating expenses | 1,234 |` can arrive as two physical lines.
//! Lines are first unwrapped, then every maximal run of pipe-prefixed lines
//! at least `min_table_lines` long becomes a [`RawTableBlock`].

use crate::document::Page;
use serde::{Deserialize, Serialize};

/// A contiguous run of pipe-prefixed lines on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTableBlock {
    pub page_index: usize,
    /// Index of the block's first line in the page's raw `\n`-split lines.
    pub start_line: usize,
    /// Table rows after unwrapping, in page order.
    pub lines: Vec<String>,
}

impl RawTableBlock {
    /// The block as one Markdown string.
    pub fn markdown(&self) -> String {
        self.lines.join("\n")
    }
}

/// A physical-line-aware view of the page after unwrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogicalLine {
    /// Raw line index where this logical line starts.
    pub(crate) start: usize,
    pub(crate) text: String,
}

/// Join rows that the renderer split across physical lines.
///
/// A line is a continuation when the accumulated line starts with `|` but
/// does not yet end with `|`, and the raw line itself does not start a new
/// row.
pub(crate) fn unwrap_lines(markdown: &str) -> Vec<LogicalLine> {
    let mut out: Vec<LogicalLine> = Vec::new();

    for (i, raw) in markdown.split('\n').enumerate() {
        if let Some(prev) = out.last_mut() {
            let prev_trimmed = prev.text.trim();
            if prev_trimmed.starts_with('|')
                && !prev_trimmed.ends_with('|')
                && !raw.trim().starts_with('|')
            {
                prev.text.push(' ');
                prev.text.push_str(raw);
                continue;
            }
        }
        out.push(LogicalLine {
            start: i,
            text: raw.to_string(),
        });
    }

    out
}

/// Segment one page into raw table blocks, in page order.
pub fn segment_page(page: &Page, min_table_lines: usize) -> Vec<RawTableBlock> {
    let mut blocks = Vec::new();
    let mut current: Vec<LogicalLine> = Vec::new();

    let mut flush = |current: &mut Vec<LogicalLine>| {
        if current.len() >= min_table_lines {
            blocks.push(RawTableBlock {
                page_index: page.index,
                start_line: current[0].start,
                lines: current.drain(..).map(|l| l.text).collect(),
            });
        }
        current.clear();
    };

    for line in unwrap_lines(&page.markdown) {
        if line.text.trim().starts_with('|') {
            current.push(line);
        } else {
            flush(&mut current);
        }
    }
    flush(&mut current);

    blocks
}
