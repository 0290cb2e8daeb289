//! Output types: the rendered article, the final document and run statistics.

use serde::{Deserialize, Serialize};

/// One numbered entry of the article's reference list.
///
/// `number` is the 1-based extraction order, never the source list's own
/// numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub number: usize,
    pub text: String,
}

/// The HTML side of a conversion: everything derived from the article page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Article {
    /// Page title shown in the top-level heading.
    pub title: String,
    /// Article URL the document links back to.
    pub source_url: String,
    /// Stem for the output file name (unsanitised).
    pub file_title: String,
    /// Body blocks in document order, truncated at the first stop heading.
    pub body: Vec<String>,
    /// Numbered references.
    pub references: Vec<Reference>,
}

/// Complete result of a conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub title: String,
    pub source_url: String,
    /// The assembled Markdown document.
    pub markdown: String,
    pub references: Vec<Reference>,
    /// Markdown tables recovered from the PDF rendition, in page order.
    pub pdf_tables: Vec<String>,
    /// File name the document is written under (`<title>.md`).
    pub file_name: String,
    pub stats: ConversionStats,
}

/// Aggregate statistics for one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Body blocks emitted (headings, paragraphs, lists).
    pub body_blocks: usize,
    pub references: usize,
    pub pdf_tables: usize,
    /// PDF pages or documents that could not be read.
    pub pdf_failures: usize,
    pub html_bytes: usize,
    pub pdf_bytes: usize,
    pub html_duration_ms: u64,
    pub pdf_duration_ms: u64,
    pub total_duration_ms: u64,
}
