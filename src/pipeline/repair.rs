//! Repair of OCR rendering defects inside a single pipe table.
//!
//! The OCR renderer sometimes splits a currency amount such as `$1,234` into
//! two cells, `| $ | 1,234 |` (or `| \$ | 1,234 |` with an escaped dollar).
//! That shifts every following cell one column to the right. When a table
//! shows this artefact, the split pairs are merged back, the empty cells left
//! behind are collapsed, and the header separator is rewritten to match the
//! header's width.
//!
//! Tables without the artefact are returned untouched, and repairing an
//! already-repaired table is a no-op.

use once_cell::sync::Lazy;
use regex::Regex;

/// A lone currency cell immediately followed by a bare-number cell.
static RE_SPLIT_CURRENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*[\\$]+\s*\|\s*([\d,.]+)\s*\|").unwrap());

static RE_EMPTY_CELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|\s*\|").unwrap());

/// True when any line of the table holds a split-currency pair.
pub fn has_split_currency(markdown: &str) -> bool {
    markdown.split('\n').any(|line| RE_SPLIT_CURRENCY.is_match(line))
}

/// Repair one table's Markdown.
///
/// 1. Merge every `| $ | 123 |` pair into `| $123 |`, one pair at a time,
///    then collapse `| |` empty cells; repeat until the line is stable.
/// 2. Rewrite the first `---` line as `|---|...|` with one segment per
///    column of the first non-separator line.
pub fn repair_table(markdown: &str) -> String {
    if !has_split_currency(markdown) {
        return markdown.to_string();
    }

    let mut corrected: Vec<String> = markdown.trim().split('\n').map(repair_line).collect();

    if corrected.len() > 1 {
        if let Some(header) = corrected.iter().find(|l| !is_separator(l)) {
            let separator = separator_for(header);
            if let Some(existing) = corrected.iter_mut().find(|l| is_separator(l)) {
                *existing = separator;
            }
        }
    }

    corrected.join("\n")
}

fn repair_line(line: &str) -> String {
    let mut line = line.to_string();
    loop {
        while let Some(merged) = merge_first_pair(&line) {
            line = merged;
        }
        let collapsed = RE_EMPTY_CELL.replace_all(&line, "|").into_owned();
        // Collapsing can bring a currency cell next to a number again.
        if collapsed == line || !RE_SPLIT_CURRENCY.is_match(&collapsed) {
            return collapsed;
        }
        line = collapsed;
    }
}

fn merge_first_pair(line: &str) -> Option<String> {
    let caps = RE_SPLIT_CURRENCY.captures(line)?;
    let m = caps.get(0)?;
    Some(format!(
        "{}| ${} |{}",
        &line[..m.start()],
        &caps[1],
        &line[m.end()..]
    ))
}

/// Header/body boundary rows are recognised by a `---` run.
pub(crate) fn is_separator(line: &str) -> bool {
    line.contains("---")
}

fn separator_for(header: &str) -> String {
    let columns = header.matches('|').count().saturating_sub(1);
    let mut sep = String::with_capacity(1 + columns * 4);
    sep.push('|');
    for _ in 0..columns {
        sep.push_str("---|");
    }
    sep
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_table_passes_through() {
        let md = "| Item | Q1 |\n|---|---|\n| Revenue | $1,200 |\n";
        assert_eq!(repair_table(md), md);
    }

    #[test]
    fn escaped_dollar_is_merged() {
        let md = "| Item | Amount |\n|---|---|\n| Cash | \\$ | 100 |";
        let fixed = repair_table(md);
        assert_eq!(fixed.lines().nth(2), Some("| Cash | $100 |"));
    }

    #[test]
    fn several_pairs_on_one_line() {
        let md = "| Item | 2024 | 2023 |\n|---|---|---|\n| Cash | $ | 1,000 | $ | 900 |";
        let fixed = repair_table(md);
        assert_eq!(fixed.lines().nth(2), Some("| Cash | $1,000 | $900 |"));
    }

    #[test]
    fn empty_cells_are_collapsed() {
        let md = "| Item | 2024 |\n|---|---|\n| Cash | $ | 5 | |";
        let fixed = repair_table(md);
        assert_eq!(fixed.lines().nth(2), Some("| Cash | $5 |"));
    }

    #[test]
    fn separator_rewritten_to_header_width() {
        let md = "| Item | 2024 | 2023 |\n| --- | --- |\n| Cash | $ | 10 | 9 |";
        let fixed = repair_table(md);
        assert_eq!(fixed.lines().nth(1), Some("|---|---|---|"));
    }

    #[test]
    fn table_without_separator_stays_without_one() {
        let md = "| Item | 2024 |\n| Cash | $ | 10 |";
        let fixed = repair_table(md);
        assert!(!fixed.contains("---"));
        assert_eq!(fixed, "| Item | 2024 |\n| Cash | $10 |");
    }

    #[test]
    fn repair_is_idempotent() {
        let inputs = [
            "| Item | Amount |\n|---|---|\n| Cash | \\$ | 100 |",
            "| Item | 2024 | 2023 |\n| --- | --- |\n| Cash | $ | 10 | $ | 9 |",
            "| A | B |\n|---|---|\n| x | $ | | 100 |",
            "| A | B |\n|---|---|\n| x | 1 |",
        ];
        for md in inputs {
            let once = repair_table(md);
            assert_eq!(repair_table(&once), once, "not idempotent for {md:?}");
        }
    }

    #[test]
    fn currency_next_to_empty_cell_is_eventually_merged() {
        let md = "| A | B |\n|---|---|\n| x | $ | | 100 |";
        let fixed = repair_table(md);
        assert_eq!(fixed.lines().nth(2), Some("| x | $100 |"));
    }

    #[test]
    fn detection_is_per_line() {
        assert!(!has_split_currency("| a | $\n| 100 | b |"));
        assert!(has_split_currency("| a | $ | 100 |"));
    }
}
