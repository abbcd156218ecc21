//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgress>`] via
//! [`crate::config::ExtractionConfigBuilder::progress`] to receive events
//! as the run processes each page. Callbacks are the least-invasive
//! integration point: callers can forward events to a terminal progress
//! bar, a log file, or a GUI without the library knowing anything about how
//! the host application communicates.
//!
//! Pages are processed strictly sequentially, so events for page N+1 never
//! arrive before page N has completed; the `Send + Sync` bound only exists
//! so a handle can be shared freely by the caller.

use std::sync::Arc;

/// Called by the extraction loop as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ExtractionProgress: Send + Sync {
    /// Called once before any page is read, with the number of pages that
    /// will actually be processed (after page selection).
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page's content is read.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page has been fully processed.
    ///
    /// `questions` and `images` are the counts produced by this page.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, questions: usize, images: usize) {
        let _ = (page_num, total_pages, questions, images);
    }

    /// Called when a page was skipped after a recoverable failure.
    fn on_page_warning(&self, page_num: usize, total_pages: usize, detail: String) {
        let _ = (page_num, total_pages, detail);
    }

    /// Called once after all selected pages have been attempted.
    fn on_run_complete(&self, total_pages: usize, processed: usize) {
        let _ = (total_pages, processed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl ExtractionProgress for NoopProgress {}

/// Convenience alias matching the type stored in
/// [`crate::config::ExtractionConfig`].
pub type ProgressHandle = Arc<dyn ExtractionProgress>;
