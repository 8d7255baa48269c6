//! Progress-callback trait for per-page scan events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the orchestrator walks a document's pages.
//!
//! # Example
//!
//! ```rust
//! use sitescan::{ExtractionConfig, ExtractionProgressCallback, PageOutcome};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     scanned: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, outcome: &PageOutcome) {
//!         self.scanned.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{total_pages}: {}", outcome.label());
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { scanned: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::PageOutcome;
use std::sync::Arc;

/// Called by the orchestrator as it processes each page.
///
/// All methods have default no-op implementations. Implementations must be
/// `Send + Sync`: a batch scans several documents at once and the same
/// callback sees events from all of them.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once per document before its first page is scanned.
    ///
    /// `total_pages` is `None` when the page source cannot tell in advance.
    fn on_document_start(&self, document: &str, total_pages: Option<usize>) {
        let _ = (document, total_pages);
    }

    /// Called before a page is sent to the recognition engine.
    ///
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the document (0 if unknown)
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after every scanned page, whatever the outcome.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, outcome: &PageOutcome) {
        let _ = (page_num, total_pages, outcome);
    }

    /// Called once after the scan stops.
    ///
    /// * `scanned_pages` — pages actually scanned (stops early on success)
    /// * `found`         — whether an address was extracted
    fn on_document_complete(&self, document: &str, scanned_pages: usize, found: bool) {
        let _ = (document, scanned_pages, found);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
