//! CLI binary for edgequake-fintab.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RunConfig` / `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_fintab::{
    extract_file, inspect, write_records, ExtractionConfig, ExtractionProgressCallback,
    OutputFormat, PageSelection, ProgressCallback, RunConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback. Pages may complete out of order when they
/// are processed in parallel.
struct CliProgressCallback {
    bar: ProgressBar,
    dropped: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Loading");
        bar.set_message("Reading OCR output…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            dropped: AtomicUsize::new(0),
        })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Extracting");
    }

    fn on_page_complete(&self, page_index: usize, tables_found: usize) {
        if tables_found > 0 {
            self.bar.println(format!(
                "  {} Page {:>3}  {}",
                green("✓"),
                page_index,
                dim(&format!("{tables_found} tables")),
            ));
        }
        self.bar.inc(1);
    }

    fn on_table_dropped(&self, page_index: usize, title: &str) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Page {:>3}  {}",
            red("✗"),
            page_index,
            red(&format!("'{title}' has no header separator")),
        ));
    }

    fn on_extraction_complete(&self, total_tables: usize, total_records: usize) {
        self.bar.finish_and_clear();
        let dropped = self.dropped.load(Ordering::SeqCst);
        eprintln!(
            "{} {} tables, {} records{}",
            if dropped == 0 { green("✔") } else { cyan("⚠") },
            bold(&total_tables.to_string()),
            bold(&total_records.to_string()),
            if dropped == 0 {
                String::new()
            } else {
                format!("  ({} dropped)", red(&dropped.to_string()))
            },
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR response JSON to JSON records on stdout
  fintab ocr_response.json

  # Write CSV for loading into columnar storage (format follows the extension)
  fintab ocr_response.json -o silver/q1_2025_tables.csv

  # Markdown with <!-- page N --> separators, pages 3 to 8 only
  fintab statements.md --pages 3-8 --format jsonl

  # Show the detected tables and their titles, no normalisation
  fintab --tables-only ocr_response.json

INPUT:
  *.json   OCR response: {"pages":[{"index":0,"markdown":"..."}, ...]}
  other    Markdown; "<!-- page N -->" lines start page N (1-indexed)

ENVIRONMENT VARIABLES:
  RUST_LOG                Override log filter (e.g. edgequake_fintab=debug)
"#;

/// Extract financial-statement tables from OCR Markdown as long-form records.
#[derive(Parser, Debug)]
#[command(
    name = "fintab",
    version,
    about = "Extract financial-statement tables from OCR Markdown as long-form records",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// OCR response JSON or Markdown file.
    input: PathBuf,

    /// Write records to this file instead of stdout.
    #[arg(short, long, env = "FINTAB_OUTPUT")]
    output: Option<PathBuf>,

    /// Record format [default: from the -o extension, else json].
    #[arg(long, env = "FINTAB_FORMAT", value_enum)]
    format: Option<FormatArg>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "FINTAB_PAGES", default_value = "all")]
    pages: String,

    /// Longest line (in characters) accepted as a table caption.
    #[arg(long, env = "FINTAB_MAX_TITLE_LEN", default_value_t = 100)]
    max_title_len: usize,

    /// Minimum consecutive pipe rows that form a table.
    #[arg(long, env = "FINTAB_MIN_TABLE_LINES", default_value_t = 2)]
    min_table_lines: usize,

    /// Currency code stamped on every record.
    #[arg(long, env = "FINTAB_CURRENCY", default_value = "USD")]
    currency: String,

    /// Process pages one at a time instead of in parallel.
    #[arg(long, env = "FINTAB_SEQUENTIAL")]
    sequential: bool,

    /// Print the detected tables (title + repaired Markdown) as JSON and exit.
    #[arg(long)]
    tables_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "FINTAB_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FINTAB_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FINTAB_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FormatArg {
    Json,
    Jsonl,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Jsonl => OutputFormat::JsonLines,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.tables_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let extraction = build_config(&cli, progress_cb)?;

    // ── Tables-only mode ─────────────────────────────────────────────────
    if cli.tables_only {
        let tables = inspect(&cli.input, &extraction)
            .await
            .context("Failed to inspect input")?;
        println!(
            "{}",
            serde_json::to_string_pretty(&tables).context("Failed to serialise tables")?
        );
        return Ok(());
    }

    // ── Run extraction ───────────────────────────────────────────────────
    let format = match (&cli.format, &cli.output) {
        (Some(f), _) => f.clone().into(),
        (None, Some(path)) => OutputFormat::for_path(path).unwrap_or_default(),
        (None, None) => OutputFormat::default(),
    };
    let mut run = RunConfig::new(&cli.input)
        .format(format)
        .extraction(extraction);
    if let Some(ref path) = cli.output {
        run = run.output_path(path);
    }

    let output = extract_file(&run).await.context("Extraction failed")?;

    if cli.output.is_none() {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write_records(&output.records, run.format, &mut handle)
            .context("Failed to write to stdout")?;
        handle.flush().ok();
    }

    if !cli.quiet {
        let s = &output.stats;
        if !show_progress {
            eprintln!(
                "Extracted {} records from {} tables ({} pages) in {}ms",
                s.records, s.tables_found, s.processed_pages, s.duration_ms
            );
            if s.tables_dropped > 0 {
                eprintln!("  {} tables dropped (no header separator)", s.tables_dropped);
            }
        } else {
            eprintln!(
                "   {} titled  /  {} repaired  /  {} non-numeric cells  /  {}ms",
                dim(&s.tables_titled.to_string()),
                dim(&s.tables_repaired.to_string()),
                dim(&s.unparsed_cells.to_string()),
                s.duration_ms,
            );
        }
        if let Some(ref path) = cli.output {
            eprintln!("{}  {}", green("→"), bold(&path.display().to_string()));
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let pages: PageSelection = cli.pages.parse().context("Invalid --pages")?;

    let mut builder = ExtractionConfig::builder()
        .pages(pages)
        .max_title_len(cli.max_title_len)
        .min_table_lines(cli.min_table_lines)
        .currency(cli.currency.clone())
        .parallel(!cli.sequential);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
