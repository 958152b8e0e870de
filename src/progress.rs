//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline processes each page.
//!
//! # Example
//!
//! ```rust
//! use edgequake_fintab::{ExtractionProgressCallback, ExtractionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     tables: Arc<AtomicUsize>,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_index: usize, tables_found: usize) {
//!         self.tables.fetch_add(tables_found, Ordering::SeqCst);
//!         eprintln!("page {page_index}: {tables_found} tables");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     tables: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extraction pipeline as it processes each page.
///
/// Implementations must be `Send + Sync`: with `parallel = true` pages are
/// processed on the rayon pool and `on_page_complete` / `on_table_dropped`
/// may be called concurrently from different threads, in any page order.
/// All methods have default no-op implementations.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once, after the heading blacklist is built and before any page
    /// is segmented.
    ///
    /// # Arguments
    /// * `total_pages`: number of selected pages that will be processed
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when every table on a page has been normalised.
    fn on_page_complete(&self, page_index: usize, tables_found: usize) {
        let _ = (page_index, tables_found);
    }

    /// Called when a table is dropped because it has no header separator.
    fn on_table_dropped(&self, page_index: usize, title: &str) {
        let _ = (page_index, title);
    }

    /// Called once after all pages have been processed.
    ///
    /// # Arguments
    /// * `total_tables` : tables found across the selected pages
    /// * `total_records`: long-form records produced
    fn on_extraction_complete(&self, total_tables: usize, total_records: usize) {
        let _ = (total_tables, total_records);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
