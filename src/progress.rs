//! Progress-callback trait for conversion stage events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to be told
//! when each stage of the pipeline starts and finishes. The CLI uses it to
//! drive a spinner; a server could forward the events to a log or socket.
//!
//! # Example
//!
//! ```rust
//! use wiki2md::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{} …", stage.label());
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A step of the conversion pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Download the article HTML.
    FetchHtml,
    /// Walk the content region and extract references.
    RenderBody,
    /// Download the PDF rendition.
    FetchPdf,
    /// Recover tables from the PDF.
    ExtractTables,
    /// Join everything into the final document.
    Assemble,
}

impl Stage {
    /// Short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::FetchHtml => "Fetching article",
            Stage::RenderBody => "Converting body",
            Stage::FetchPdf => "Downloading PDF",
            Stage::ExtractTables => "Extracting PDF tables",
            Stage::Assemble => "Assembling Markdown",
        }
    }
}

/// Called by the conversion pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The trait is `Send + Sync` so a callback can be
/// shared with the blocking thread that runs PDF extraction.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before anything is fetched.
    ///
    /// # Arguments
    /// * `article_url`: the article being converted
    fn on_conversion_start(&self, article_url: &str) {
        let _ = article_url;
    }

    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes.
    ///
    /// # Arguments
    /// * `stage`: the finished stage
    /// * `items`: what the stage produced: bytes for fetches, blocks for
    ///   the body, tables for extraction, bytes of Markdown for assembly
    fn on_stage_complete(&self, stage: Stage, items: usize) {
        let _ = (stage, items);
    }

    /// Called when the PDF path is abandoned; the run continues HTML-only.
    fn on_pdf_skipped(&self, reason: &str) {
        let _ = reason;
    }

    /// Called once after the document has been assembled.
    ///
    /// # Arguments
    /// * `markdown_len`: byte length of the final document
    fn on_conversion_complete(&self, markdown_len: usize) {
        let _ = markdown_len;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct TrackingCallback {
        stages: Mutex<Vec<Stage>>,
        completed: AtomicUsize,
        skipped: Mutex<Option<String>>,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_stage_start(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_stage_complete(&self, _stage: Stage, _items: usize) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_pdf_skipped(&self, reason: &str) {
            *self.skipped.lock().unwrap() = Some(reason.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start("https://en.wikipedia.org/wiki/Rust");
        cb.on_stage_start(Stage::FetchHtml);
        cb.on_stage_complete(Stage::FetchHtml, 1024);
        cb.on_pdf_skipped("offline");
        cb.on_conversion_complete(2048);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            stages: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
            skipped: Mutex::new(None),
        };

        tracker.on_stage_start(Stage::FetchHtml);
        tracker.on_stage_complete(Stage::FetchHtml, 10);
        tracker.on_stage_start(Stage::RenderBody);
        tracker.on_stage_complete(Stage::RenderBody, 3);
        tracker.on_pdf_skipped("HTTP 404");

        assert_eq!(
            *tracker.stages.lock().unwrap(),
            vec![Stage::FetchHtml, Stage::RenderBody]
        );
        assert_eq!(tracker.completed.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skipped.lock().unwrap().as_deref(), Some("HTTP 404"));
    }

    #[test]
    fn stage_labels_are_distinct() {
        let labels = [
            Stage::FetchHtml,
            Stage::RenderBody,
            Stage::FetchPdf,
            Stage::ExtractTables,
            Stage::Assemble,
        ]
        .map(|s| s.label());
        let unique: std::collections::HashSet<_> = labels.iter().collect();
        assert_eq!(unique.len(), labels.len());
    }
}
