//! Configuration types for table extraction.
//!
//! All engine behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The caption and segmentation
//! heuristics are tuned to one family of financial-statement PDFs; every
//! threshold they use lives here so the engine can be retuned without code
//! changes.
//!
//! File-level runs additionally take a [`RunConfig`] naming the input and
//! output paths explicitly at call time.

use crate::error::FinTabError;
use crate::progress::ProgressCallback;
use crate::sink::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Caption candidates longer than this many characters are treated as prose.
pub const DEFAULT_MAX_TITLE_LEN: usize = 100;

/// Line endings that mark a caption candidate as a sentence.
pub const TITLE_EXCLUDED_SUFFIXES: [char; 3] = ['.', ':', ';'];

/// A single pipe-prefixed line is stray text, not a table.
pub const DEFAULT_MIN_TABLE_LINES: usize = 2;

/// A heading seen this many times in one document is a running header/footer.
pub const DEFAULT_MIN_HEADING_REPEATS: usize = 2;

/// Title assigned when no acceptable caption precedes a table.
pub const DEFAULT_TITLE: &str = "(no title found)";

/// Currency stamped on every record.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Configuration for a table extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_fintab::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .max_title_len(80)
///     .currency("EUR")
///     .build()
///     .unwrap();
/// assert_eq!(config.currency, "EUR");
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Maximum caption length in characters. Default: 100.
    ///
    /// Captions are short heading-like lines; anything longer directly above
    /// a table is almost always a paragraph of notes.
    pub max_title_len: usize,

    /// Trailing characters that disqualify a caption candidate. Default: `. : ;`.
    pub title_excluded_suffixes: Vec<char>,

    /// Minimum number of consecutive pipe lines forming a table. Default: 2.
    pub min_table_lines: usize,

    /// Occurrences after which a heading is blacklisted. Default: 2.
    pub min_heading_repeats: usize,

    /// Placeholder title for uncaptioned tables. Default: `"(no title found)"`.
    pub default_title: String,

    /// Currency code written on every record. Default: `"USD"`.
    pub currency: String,

    /// Which pages to extract tables from. Default: all.
    ///
    /// The heading blacklist is always built from the whole document, so a
    /// running header is recognised even when only one page is selected.
    pub pages: PageSelection,

    /// Process pages on the rayon thread pool. Default: true.
    pub parallel: bool,

    /// Optional progress callback for per-page events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_title_len: DEFAULT_MAX_TITLE_LEN,
            title_excluded_suffixes: TITLE_EXCLUDED_SUFFIXES.to_vec(),
            min_table_lines: DEFAULT_MIN_TABLE_LINES,
            min_heading_repeats: DEFAULT_MIN_HEADING_REPEATS,
            default_title: DEFAULT_TITLE.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            pages: PageSelection::default(),
            parallel: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_title_len", &self.max_title_len)
            .field("title_excluded_suffixes", &self.title_excluded_suffixes)
            .field("min_table_lines", &self.min_table_lines)
            .field("min_heading_repeats", &self.min_heading_repeats)
            .field("default_title", &self.default_title)
            .field("currency", &self.currency)
            .field("pages", &self.pages)
            .field("parallel", &self.parallel)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn max_title_len(mut self, n: usize) -> Self {
        self.config.max_title_len = n;
        self
    }

    pub fn title_excluded_suffixes(mut self, suffixes: impl IntoIterator<Item = char>) -> Self {
        self.config.title_excluded_suffixes = suffixes.into_iter().collect();
        self
    }

    pub fn min_table_lines(mut self, n: usize) -> Self {
        self.config.min_table_lines = n;
        self
    }

    pub fn min_heading_repeats(mut self, n: usize) -> Self {
        self.config.min_heading_repeats = n;
        self
    }

    pub fn default_title(mut self, title: impl Into<String>) -> Self {
        self.config.default_title = title.into();
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.config.currency = code.into();
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn parallel(mut self, v: bool) -> Self {
        self.config.parallel = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, FinTabError> {
        let c = &self.config;
        if c.min_table_lines < 2 {
            return Err(FinTabError::InvalidConfig(format!(
                "min_table_lines must be ≥ 2, got {}",
                c.min_table_lines
            )));
        }
        if c.min_heading_repeats < 2 {
            return Err(FinTabError::InvalidConfig(format!(
                "min_heading_repeats must be ≥ 2, got {}",
                c.min_heading_repeats
            )));
        }
        if c.max_title_len == 0 {
            return Err(FinTabError::InvalidConfig(
                "max_title_len must be ≥ 1".into(),
            ));
        }
        if c.currency.trim().is_empty() {
            return Err(FinTabError::InvalidConfig("currency must not be empty".into()));
        }
        Ok(self.config)
    }
}

/// Call-time configuration for a file-to-file run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// OCR response JSON (`.json`) or a Markdown file.
    pub input_path: PathBuf,
    /// Where to write records. `None` leaves writing to the caller.
    pub output_path: Option<PathBuf>,
    /// Serialisation format for the records.
    pub format: OutputFormat,
    /// Engine options.
    pub extraction: ExtractionConfig,
}

impl RunConfig {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: None,
            format: OutputFormat::default(),
            extraction: ExtractionConfig::default(),
        }
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn extraction(mut self, config: ExtractionConfig) -> Self {
        self.extraction = config;
        self
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages to extract tables from.
///
/// Page numbers are 1-indexed; page number `n` is the page whose OCR
/// `index` is `n - 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page.
    Single(usize),
    /// A contiguous inclusive range.
    Range(usize, usize),
    /// Specific pages.
    Set(Vec<usize>),
}

impl PageSelection {
    /// Whether the page with 0-indexed `page_index` is selected.
    ///
    /// Compares against `n - 1` so any OCR index, including `usize::MAX`,
    /// is safe.
    pub fn includes(&self, page_index: usize) -> bool {
        let index_of = |n: usize| n.checked_sub(1);
        match self {
            PageSelection::All => true,
            PageSelection::Single(p) => index_of(*p) == Some(page_index),
            PageSelection::Range(start, end) => match (index_of(*start), index_of(*end)) {
                (Some(first), Some(last)) => (first..=last).contains(&page_index),
                (None, Some(last)) => page_index <= last,
                _ => false,
            },
            PageSelection::Set(pages) => pages.iter().any(|n| index_of(*n) == Some(page_index)),
        }
    }
}

impl FromStr for PageSelection {
    type Err = FinTabError;

    /// Parse `all`, `5`, `3-15` or `1,3,5,7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let page = |p: &str| -> Result<usize, FinTabError> {
            let n: usize = p
                .trim()
                .parse()
                .map_err(|_| FinTabError::InvalidConfig(format!("Invalid page number: '{}'", p.trim())))?;
            if n < 1 {
                return Err(FinTabError::InvalidConfig(format!(
                    "Pages are 1-indexed, minimum is 1 (got {n})"
                )));
            }
            Ok(n)
        };

        if s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            let (start, end) = (page(start)?, page(end)?);
            if start > end {
                return Err(FinTabError::InvalidConfig(format!(
                    "Invalid page range '{start}-{end}': start must be <= end"
                )));
            }
            return Ok(PageSelection::Range(start, end));
        }

        if s.contains(',') {
            let pages = s.split(',').map(page).collect::<Result<Vec<_>, _>>()?;
            return Ok(PageSelection::Set(pages));
        }

        Ok(PageSelection::Single(page(&s)?))
    }
}
