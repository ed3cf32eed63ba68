//! Progress-callback trait for per-document publishing events.
//!
//! Inject an [`Arc<dyn PublishProgressCallback>`] via
//! [`crate::config::PublishConfigBuilder::progress_callback`] to receive events
//! as the publisher works through its documents. The CLI uses this to drive
//! its progress bar and to relay the upstream generator's output.
//!
//! # Example
//!
//! ```rust
//! use legal_docs::{PublishConfig, PublishProgressCallback, PublishedDocument};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl PublishProgressCallback for Printer {
//!     fn on_document_complete(&self, index: usize, total: usize, doc: &PublishedDocument) {
//!         eprintln!("{}/{}: {} pages", index, total, doc.pages);
//!     }
//! }
//!
//! let config = PublishConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::PublishedDocument;
use std::path::Path;
use std::sync::Arc;

/// Called by the publisher as it works through a run.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Documents are published sequentially, so events
/// arrive in order.
pub trait PublishProgressCallback: Send + Sync {
    /// Called once before the upstream step.
    ///
    /// # Arguments
    /// * `total_documents`: number of documents that will be published
    fn on_run_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called after the upstream generator succeeds, with its captured output.
    fn on_upstream_output(&self, stdout: &str, stderr: &str) {
        let _ = (stdout, stderr);
    }

    /// Called before a document's font is resolved.
    ///
    /// # Arguments
    /// * `index`: 1-indexed position in the run
    /// * `total`: total documents
    /// * `source`: Markdown source path
    fn on_document_start(&self, index: usize, total: usize, source: &Path) {
        let _ = (index, total, source);
    }

    /// Called when both renditions of a document have been written.
    fn on_document_complete(&self, index: usize, total: usize, document: &PublishedDocument) {
        let _ = (index, total, document);
    }

    /// Called when a document fails. The run stops after this event.
    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every document has been published.
    fn on_run_complete(&self, total_documents: usize, duration_ms: u64) {
        let _ = (total_documents, duration_ms);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl PublishProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PublishConfig`].
pub type ProgressCallback = Arc<dyn PublishProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: Mutex<Vec<String>>,
        sources: Mutex<Vec<PathBuf>>,
    }

    impl PublishProgressCallback for TrackingCallback {
        fn on_document_start(&self, _index: usize, _total: usize, source: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.sources.lock().unwrap().push(source.to_path_buf());
        }

        fn on_document_complete(&self, _index: usize, _total: usize, _document: &PublishedDocument) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_error(&self, _index: usize, _total: usize, error: &str) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    fn document(source: &str) -> PublishedDocument {
        PublishedDocument {
            source: PathBuf::from(source),
            pdf: PathBuf::from("out.pdf"),
            docx: PathBuf::from("out.docx"),
            blocks: 6,
            pages: 1,
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(6);
        cb.on_upstream_output("ok", "");
        cb.on_document_start(1, 6, Path::new("terms-of-service.md"));
        cb.on_document_complete(1, 6, &document("terms-of-service.md"));
        cb.on_document_error(2, 6, "Font path not found");
        cb.on_run_complete(6, 120);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_document_start(1, 2, Path::new("terms-of-service.md"));
        tracker.on_document_complete(1, 2, &document("terms-of-service.md"));
        tracker.on_document_start(2, 2, Path::new("terms-of-service-cn.md"));
        tracker.on_document_error(2, 2, "Font path not found: 'simhei.ttf'");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.lock().unwrap().len(), 1);
        assert_eq!(
            tracker.sources.lock().unwrap()[1],
            PathBuf::from("terms-of-service-cn.md")
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_run_start(3);
        cb.on_run_complete(3, 10);
    }
}
