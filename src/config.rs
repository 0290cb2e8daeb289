//! Configuration types for article-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Every knob lives in one struct so a run
//! can be reproduced from its config alone.

use crate::error::Wiki2MdError;
use crate::pipeline::pdf::TableExtractor;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Headings that always end body extraction.
pub const DEFAULT_STOP_SECTIONS: [&str; 3] = ["references", "notes", "bibliography"];

/// Configuration for an article-to-Markdown conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use wiki2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .include_pdf_tables(false)
///     .stop_section("External links")
///     .max_retries(2)
///     .build()
///     .unwrap();
/// assert!(config.stop_sections().contains("external links"));
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Download the PDF rendition and append its tables. Default: true.
    ///
    /// Every failure on this path degrades to an HTML-only document.
    pub include_pdf_tables: bool,

    /// Extra headings (case-insensitive) at which body extraction stops,
    /// on top of [`DEFAULT_STOP_SECTIONS`].
    pub extra_stop_sections: Vec<String>,

    /// Directory the Markdown file is written to by
    /// [`crate::convert::convert_to_file`]. Default: the user's download
    /// directory.
    pub output_dir: PathBuf,

    /// How reference superscripts (`<sup class="reference">`) are rendered.
    pub reference_markers: ReferenceMarkers,

    /// Timeout for the article HTML request, in seconds. Default: 30.
    pub html_timeout_secs: u64,

    /// Timeout for the PDF rendition request, in seconds. Default: 45.
    ///
    /// PDFs are rendered on demand by the server and are much slower than
    /// the HTML page.
    pub pdf_timeout_secs: u64,

    /// Retries after the first attempt on a transient failure. Default: 4.
    ///
    /// Only HTTP 429/500/502/503/504 and transport errors are retried.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds. Default: 1000.
    ///
    /// Doubles after each attempt up to [`Self::max_backoff_ms`]:
    /// 1 s → 2 s → 4 s → 8 s.
    pub retry_backoff_ms: u64,

    /// Upper bound on a single retry delay in milliseconds. Default: 8000.
    pub max_backoff_ms: u64,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Pre-constructed PDF table extractor. Defaults to the pdfium backend.
    pub table_extractor: Option<Arc<dyn TableExtractor>>,

    /// Receives stage events as the conversion runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            include_pdf_tables: true,
            extra_stop_sections: Vec::new(),
            output_dir: default_output_dir(),
            reference_markers: ReferenceMarkers::default(),
            html_timeout_secs: 30,
            pdf_timeout_secs: 45,
            max_retries: 4,
            retry_backoff_ms: 1000,
            max_backoff_ms: 8000,
            user_agent: default_user_agent(),
            table_extractor: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("include_pdf_tables", &self.include_pdf_tables)
            .field("extra_stop_sections", &self.extra_stop_sections)
            .field("output_dir", &self.output_dir)
            .field("reference_markers", &self.reference_markers)
            .field("html_timeout_secs", &self.html_timeout_secs)
            .field("pdf_timeout_secs", &self.pdf_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("max_backoff_ms", &self.max_backoff_ms)
            .field("user_agent", &self.user_agent)
            .field(
                "table_extractor",
                &self.table_extractor.as_ref().map(|_| "<dyn TableExtractor>"),
            )
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The normalised stop-heading set: defaults plus caller extras,
    /// lowercased and trimmed.
    pub fn stop_sections(&self) -> HashSet<String> {
        DEFAULT_STOP_SECTIONS
            .iter()
            .map(|s| s.to_string())
            .chain(
                self.extra_stop_sections
                    .iter()
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty()),
            )
            .collect()
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn include_pdf_tables(mut self, v: bool) -> Self {
        self.config.include_pdf_tables = v;
        self
    }

    /// Add one extra stop heading.
    pub fn stop_section(mut self, heading: impl Into<String>) -> Self {
        self.config.extra_stop_sections.push(heading.into());
        self
    }

    /// Add several extra stop headings.
    pub fn stop_sections<I, S>(mut self, headings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .extra_stop_sections
            .extend(headings.into_iter().map(Into::into));
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn reference_markers(mut self, markers: ReferenceMarkers) -> Self {
        self.config.reference_markers = markers;
        self
    }

    pub fn html_timeout_secs(mut self, secs: u64) -> Self {
        self.config.html_timeout_secs = secs;
        self
    }

    pub fn pdf_timeout_secs(mut self, secs: u64) -> Self {
        self.config.pdf_timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn max_backoff_ms(mut self, ms: u64) -> Self {
        self.config.max_backoff_ms = ms;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn table_extractor(mut self, extractor: Arc<dyn TableExtractor>) -> Self {
        self.config.table_extractor = Some(extractor);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Wiki2MdError> {
        let c = &self.config;
        if c.html_timeout_secs == 0 || c.pdf_timeout_secs == 0 {
            return Err(Wiki2MdError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.max_backoff_ms < c.retry_backoff_ms {
            return Err(Wiki2MdError::InvalidConfig(format!(
                "max_backoff_ms ({}) must be ≥ retry_backoff_ms ({})",
                c.max_backoff_ms, c.retry_backoff_ms
            )));
        }
        if c.user_agent.trim().is_empty() {
            return Err(Wiki2MdError::InvalidConfig(
                "User-Agent must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Rendering of reference superscripts such as `<sup class="reference">[3]</sup>`.
///
/// Bracketed integers in plain text are escaped in both modes; this only
/// controls the citation superscripts themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferenceMarkers {
    /// Emit the marker as escaped text: `\[3]`. (default)
    #[default]
    Escaped,
    /// Emit nothing for reference superscripts.
    Dropped,
}

// ── Defaults ─────────────────────────────────────────────────────────────

/// `wiki2md/<version>`.
pub fn default_user_agent() -> String {
    format!("wiki2md/{}", env!("CARGO_PKG_VERSION"))
}

/// The user's download directory, `~/Downloads` when the platform has no
/// such notion, or the working directory as a last resort.
pub fn default_output_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}
