//! Error types for the wiki2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Wiki2MdError`]: **Fatal**: the conversion cannot proceed at all
//!   (malformed article URL, network exhausted after retries, page without a
//!   content region). Returned as `Err(Wiki2MdError)` from the top-level
//!   `convert*` functions. No output file is written.
//!
//! * [`TableExtractionError`]: **Non-fatal**: the PDF rendition or one of
//!   its pages could not be read. The conversion carries on as HTML-only and
//!   the failure is only logged and counted in
//!   [`crate::output::ConversionStats::pdf_failures`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the wiki2md library.
#[derive(Debug, Error)]
pub enum Wiki2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The article identifier is not a usable article URL.
    #[error("Invalid article URL '{url}': {reason}")]
    InvalidArticleUrl { url: String, reason: String },

    // ── Fetch errors ──────────────────────────────────────────────────────
    /// Every attempt failed with a transient error (connection, 429, 5xx).
    #[error("Failed to fetch '{url}' after {attempts} attempts: {reason}\nCheck your internet connection.")]
    FetchFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// Every attempt timed out.
    #[error("Fetching '{url}' timed out after {secs}s ({attempts} attempts)\nIncrease --timeout.")]
    FetchTimeout { url: String, secs: u64, attempts: u32 },

    /// The server answered with a status that retrying cannot fix.
    #[error("Fetching '{url}' failed with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The downloaded payload is not a PDF.
    #[error("Payload from '{url}' is not a PDF\nFirst bytes: {magic:?}")]
    NotAPdf { url: String, magic: [u8; 4] },

    // ── Document errors ───────────────────────────────────────────────────
    /// The fetched page has no main content container.
    #[error("Could not find main content on '{url}'")]
    ContentNotFound { url: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Wiki2MdError {
    /// True for the failures that belong to the network layer.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Wiki2MdError::FetchFailed { .. }
                | Wiki2MdError::FetchTimeout { .. }
                | Wiki2MdError::HttpStatus { .. }
        )
    }
}

/// A non-fatal error on the PDF table path.
///
/// Never propagated out of [`crate::convert::convert`]: the extractor records
/// it, the pipeline logs it and moves on to the next page.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum TableExtractionError {
    /// No pdfium library could be bound.
    #[error("pdfium library unavailable: {0}\nSet PDFIUM_LIB_PATH=/path/to/libpdfium or use --no-pdf.")]
    LibraryUnavailable(String),

    /// The PDF could not be opened at all.
    #[error("PDF could not be opened: {detail}")]
    OpenFailed { detail: String },

    /// A single page could not be read.
    #[error("Page {page}: table extraction failed: {detail}")]
    PageFailed { page: usize, detail: String },
}
