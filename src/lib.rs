//! # wiki2md
//!
//! Convert Wikipedia articles to Markdown, optionally enriched with the
//! tables recovered from the article's PDF rendition.
//!
//! ## Why this crate?
//!
//! Article HTML carries a lot that is not prose: edit links, navigation
//! boxes, reference superscripts, infoboxes and footnote sections. This
//! crate walks the main content region in document order, keeps headings,
//! paragraphs and lists, stops at the first footnote-style section and
//! renders references as an escaped numbered list. Tables are pulled from
//! the PDF rendition instead of the body, where they often come out more
//! regular.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Article URL
//!  │
//!  ├─ 1. Fetch    article HTML with retry/backoff
//!  ├─ 2. Render   body blocks + references (scraper)
//!  ├─ 3. PDF      download rendition, extract grids (pdfium, spawn_blocking)
//!  ├─ 4. Merge    grids → Markdown tables
//!  └─ 5. Output   assembled, normalised Markdown + stats
//! ```
//!
//! Steps 3 and 4 are optional and never fatal: any failure there yields an
//! HTML-only document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wiki2md::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .output_dir("articles")
//!         .build()?;
//!     let (path, output) =
//!         convert_to_file("https://en.wikipedia.org/wiki/The_Gambler_(2014_film)", &config)
//!             .await?;
//!     println!("Markdown file created at: {}", path.display());
//!     eprintln!("{} references, {} PDF tables",
//!         output.stats.references,
//!         output.stats.pdf_tables);
//!     Ok(())
//! }
//! ```
//!
//! ## Offline conversion
//!
//! [`convert_html`] runs the HTML side on a page you already have:
//!
//! ```rust
//! use wiki2md::{convert_html, ConversionConfig};
//!
//! let html = r#"<h1 id="firstHeading">Test</h1>
//!     <div id="mw-content-text"><p>Hello [1] world.</p></div>"#;
//! let out = convert_html(html, "https://en.wikipedia.org/wiki/Test", &ConversionConfig::default())
//!     .unwrap();
//! assert!(out.markdown.contains("Hello \\[1] world."));
//! ```
//!
//! ## PDF tables
//!
//! The default extractor binds the pdfium shared library at run time.
//! Point `PDFIUM_LIB_PATH` at it, place it in the working directory, or
//! install it system-wide. Without it the conversion still succeeds and the
//! `Extracted Tables` section is left out. A custom
//! [`TableExtractor`] can be supplied through
//! [`ConversionConfigBuilder::table_extractor`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ReferenceMarkers, DEFAULT_STOP_SECTIONS};
pub use convert::{
    assemble_document, convert, convert_html, convert_sync, convert_to_file, write_markdown,
};
pub use error::{TableExtractionError, Wiki2MdError};
pub use output::{Article, ConversionOutput, ConversionStats, Reference};
pub use pipeline::input::ArticleUrl;
pub use pipeline::pdf::{PdfTables, PdfiumTableExtractor, RawTable, TableExtractor};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
