//! Pipeline stages for article-to-Markdown conversion.
//!
//! Each submodule implements one transformation step and is testable on its
//! own. The HTML side is synchronous (a parsed `scraper::Html` never crosses
//! an `.await`); only the fetches and the PDF hand-off are async.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ fetch ──▶ walker ─┬─▶ node ──▶ table
//! (URL)     (HTTP)   (body)   │  (inline)  (grids)
//!                             └─▶ references
//!
//! input ──▶ fetch ──▶ pdf ──▶ merge            (optional, never fatal)
//! (PDF URL)          (pdfium) (grids → tables)
//!
//! body + references + tables ──▶ postprocess
//! ```
//!
//! 1. [`input`]: validate the article URL, derive titles and the PDF URL,
//!    download the PDF rendition to a temp file
//! 2. [`fetch`]: GET with retry/backoff; the only stage with network I/O
//! 3. [`walker`]: document-order pass over the content region, truncated at
//!    the first stop heading
//! 4. [`node`]: inline HTML → Markdown for one element subtree
//! 5. [`table`]: infobox and standard table rendering
//! 6. [`references`]: the numbered reference list
//! 7. [`pdf`]: raw table grids out of the PDF; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 8. [`merge`]: raw grids → Markdown tables
//! 9. [`postprocess`]: deterministic whole-document cleanup

pub mod fetch;
pub mod input;
pub mod merge;
pub mod node;
pub mod pdf;
pub mod postprocess;
pub mod references;
pub mod table;
pub mod walker;
