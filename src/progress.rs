//! Progress-callback trait for analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::DigestConfigBuilder::progress_callback`] to receive
//! events as documents load and the model runs.
//!
//! # Example
//!
//! ```rust
//! use edgequake_digest::{AnalysisProgressCallback, DigestConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl AnalysisProgressCallback for PageCounter {
//!     fn on_document_loaded(&self, _index: usize, name: &str, pages: usize) {
//!         self.pages.fetch_add(pages, Ordering::SeqCst);
//!         eprintln!("loaded {name} ({pages} pages)");
//!     }
//! }
//!
//! let counter = Arc::new(PageCounter { pages: AtomicUsize::new(0) });
//!
//! let config = DigestConfig::builder()
//!     .progress_callback(counter as Arc<dyn AnalysisProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the analysis pipeline at each stage.
///
/// Documents are extracted concurrently, so `on_document_loaded` and
/// `on_document_error` may arrive from different threads and out of input
/// order. All methods default to no-ops.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called once before any document is opened.
    fn on_analysis_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// A document was read and its text extracted.
    ///
    /// # Arguments
    /// * `index` — 0-based position in the input list
    /// * `name`  — display name (file name or URL tail)
    /// * `pages` — page count of the PDF
    fn on_document_loaded(&self, index: usize, name: &str, pages: usize) {
        let _ = (index, name, pages);
    }

    /// A document was skipped. The run continues with the others.
    fn on_document_error(&self, index: usize, name: &str, error: &str) {
        let _ = (index, name, error);
    }

    /// The prompt is about to be sent.
    fn on_llm_start(&self, prompt_chars: usize) {
        let _ = prompt_chars;
    }

    /// The model answered and post-processing finished.
    fn on_llm_complete(&self, output_chars: usize) {
        let _ = output_chars;
    }

    /// Called once at the end of a successful run.
    fn on_analysis_complete(&self, loaded: usize, failed: usize) {
        let _ = (loaded, failed);
    }
}

/// The default when no callback is configured.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Alias matching the type stored in [`crate::config::DigestConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        loaded: AtomicUsize,
        errors: Mutex<Vec<String>>,
        summary: Mutex<Option<(usize, usize)>>,
    }

    impl AnalysisProgressCallback for Recorder {
        fn on_document_loaded(&self, _index: usize, _name: &str, _pages: usize) {
            self.loaded.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_error(&self, _index: usize, name: &str, _error: &str) {
            self.errors.lock().unwrap().push(name.to_string());
        }

        fn on_analysis_complete(&self, loaded: usize, failed: usize) {
            *self.summary.lock().unwrap() = Some((loaded, failed));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_analysis_start(2);
        cb.on_document_loaded(0, "a.pdf", 3);
        cb.on_document_error(1, "b.pdf", "corrupt");
        cb.on_llm_start(1200);
        cb.on_llm_complete(800);
        cb.on_analysis_complete(1, 1);
    }

    #[test]
    fn recorder_receives_events() {
        let rec = Arc::new(Recorder::default());
        let cb: ProgressCallback = rec.clone();

        cb.on_document_loaded(0, "circular-1.pdf", 4);
        cb.on_document_error(1, "scan.pdf", "no text");
        cb.on_document_loaded(2, "circular-2.pdf", 2);
        cb.on_analysis_complete(2, 1);

        assert_eq!(rec.loaded.load(Ordering::SeqCst), 2);
        assert_eq!(*rec.errors.lock().unwrap(), vec!["scan.pdf".to_string()]);
        assert_eq!(*rec.summary.lock().unwrap(), Some((2, 1)));
    }
}
