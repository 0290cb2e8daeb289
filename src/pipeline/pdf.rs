//! PDF table extraction: a PDF file → raw row grids.
//!
//! The pipeline only sees the [`TableExtractor`] trait, so the detection
//! strategy can be swapped (or faked in tests) through
//! [`crate::config::ConversionConfigBuilder::table_extractor`].
//!
//! ## Default backend
//!
//! [`PdfiumTableExtractor`] reads each page's text segments through pdfium,
//! groups them into lines by vertical position and splits each line into
//! cells wherever the horizontal gap between segments is wide. Runs of
//! consecutive multi-cell lines become one grid. This is a layout heuristic,
//! not a ruling-line detector: it recovers the column structure of typical
//! article tables and ignores running prose.
//!
//! pdfium is not async-safe; callers run extraction inside
//! `tokio::task::spawn_blocking`.

use crate::error::TableExtractionError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One row of a raw grid. `None` marks a row the extractor could not read.
pub type RawRow = Option<Vec<Option<String>>>;

/// A raw grid as produced by an extractor: rows of optional cells.
pub type RawTable = Vec<RawRow>;

/// Everything recovered from one PDF.
#[derive(Debug, Clone, Default)]
pub struct PdfTables {
    /// Raw grids in page order.
    pub tables: Vec<RawTable>,
    /// Pages that failed; extraction continued past each of them.
    pub failures: Vec<TableExtractionError>,
}

/// Source of raw table grids for a PDF file.
///
/// Implementations must be `Send + Sync`: the pipeline calls them from a
/// blocking worker thread. Per-page problems belong in
/// [`PdfTables::failures`]; an `Err` means nothing could be read at all.
pub trait TableExtractor: Send + Sync {
    fn extract_tables(&self, pdf_path: &Path) -> Result<PdfTables, TableExtractionError>;
}

// ── Layout heuristic ─────────────────────────────────────────────────────

/// A positioned run of text on a page, in PDF points (y grows upwards).
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub top: f32,
}

/// Tuning for [`spans_to_tables`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Spans whose tops differ by at most this much share a line.
    pub line_tolerance: f32,
    /// A horizontal gap at least this wide starts a new cell.
    pub column_gap: f32,
    /// Cells a line needs to count as a table row.
    pub min_columns: usize,
    /// Consecutive table rows needed to form a table.
    pub min_rows: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            line_tolerance: 3.0,
            column_gap: 12.0,
            min_columns: 2,
            min_rows: 2,
        }
    }
}

/// Group spans into lines, top of the page first, each line left to right.
pub fn group_lines(mut spans: Vec<TextSpan>, opts: &LayoutOptions) -> Vec<Vec<TextSpan>> {
    spans.sort_by(|a, b| b.top.total_cmp(&a.top).then(a.left.total_cmp(&b.left)));

    let mut lines: Vec<Vec<TextSpan>> = Vec::new();
    for span in spans {
        match lines.last_mut() {
            Some(line) if (line[0].top - span.top).abs() <= opts.line_tolerance => line.push(span),
            _ => lines.push(vec![span]),
        }
    }
    for line in &mut lines {
        line.sort_by(|a, b| a.left.total_cmp(&b.left));
    }
    lines
}

/// Split one line (sorted left to right) into cell texts.
pub fn split_cells(line: &[TextSpan], opts: &LayoutOptions) -> Vec<String> {
    let mut cells: Vec<String> = Vec::new();
    let mut prev_right: Option<f32> = None;

    for span in line {
        let text = span.text.trim();
        match (prev_right, cells.last_mut()) {
            (Some(right), Some(cell)) if span.left - right < opts.column_gap => {
                if span.left - right > 0.5 {
                    cell.push(' ');
                }
                cell.push_str(text);
            }
            _ => cells.push(text.to_string()),
        }
        prev_right = Some(prev_right.map_or(span.right, |r| r.max(span.right)));
    }
    cells
}

/// Turn a page's spans into raw grids.
pub fn spans_to_tables(spans: Vec<TextSpan>, opts: &LayoutOptions) -> Vec<RawTable> {
    let mut tables = Vec::new();
    let mut current: RawTable = Vec::new();

    for line in group_lines(spans, opts) {
        let cells = split_cells(&line, opts);
        if cells.len() >= opts.min_columns {
            current.push(Some(cells.into_iter().map(Some).collect()));
        } else {
            flush_table(&mut current, &mut tables, opts);
        }
    }
    flush_table(&mut current, &mut tables, opts);
    tables
}

fn flush_table(current: &mut RawTable, tables: &mut Vec<RawTable>, opts: &LayoutOptions) {
    if current.len() >= opts.min_rows {
        tables.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

// ── pdfium backend ───────────────────────────────────────────────────────

/// Table extractor backed by the pdfium library.
///
/// The library is bound on every call, trying in order: the configured
/// path, `PDFIUM_LIB_PATH`, the working directory, the system library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTableExtractor {
    library_path: Option<PathBuf>,
    layout: LayoutOptions,
}

impl PdfiumTableExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to the pdfium shared library at `path`.
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    fn bind(&self) -> Result<Pdfium, TableExtractionError> {
        let explicit = self
            .library_path
            .clone()
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => Pdfium::bind_to_library(&path),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| TableExtractionError::LibraryUnavailable(format!("{e:?}")))?;

        Ok(Pdfium::new(bindings))
    }
}

impl TableExtractor for PdfiumTableExtractor {
    fn extract_tables(&self, pdf_path: &Path) -> Result<PdfTables, TableExtractionError> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| TableExtractionError::OpenFailed {
                detail: format!("{e:?}"),
            })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut out = PdfTables::default();
        for (idx, page) in pages.iter().enumerate() {
            match page_spans(&page) {
                Ok(spans) => {
                    let tables = spans_to_tables(spans, &self.layout);
                    debug!("Page {}: {} candidate tables", idx + 1, tables.len());
                    out.tables.extend(tables);
                }
                Err(e) => {
                    let err = TableExtractionError::PageFailed {
                        page: idx + 1,
                        detail: format!("{e:?}"),
                    };
                    warn!("{}", err);
                    out.failures.push(err);
                }
            }
        }
        Ok(out)
    }
}

fn page_spans(page: &PdfPage<'_>) -> Result<Vec<TextSpan>, PdfiumError> {
    let text = page.text()?;
    let spans = text
        .segments()
        .iter()
        .filter_map(|segment| {
            let content = segment.text();
            if content.trim().is_empty() {
                return None;
            }
            let bounds = segment.bounds();
            Some(TextSpan {
                text: content,
                left: bounds.left().value,
                right: bounds.right().value,
                top: bounds.top().value,
            })
        })
        .collect();
    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, left: f32, right: f32, top: f32) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            left,
            right,
            top,
        }
    }

    #[test]
    fn groups_by_vertical_position() {
        let lines = group_lines(
            vec![
                span("b", 100.0, 120.0, 700.5),
                span("c", 10.0, 30.0, 680.0),
                span("a", 10.0, 30.0, 701.0),
            ],
            &LayoutOptions::default(),
        );
        let texts: Vec<Vec<&str>> = lines
            .iter()
            .map(|l| l.iter().map(|s| s.text.as_str()).collect())
            .collect();
        assert_eq!(texts, vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn close_spans_share_a_cell() {
        let line = vec![
            span("Directed", 10.0, 50.0, 700.0),
            span("by", 52.0, 60.0, 700.0),
            span("Rupert", 150.0, 180.0, 700.0),
        ];
        assert_eq!(
            split_cells(&line, &LayoutOptions::default()),
            vec!["Directed by", "Rupert"]
        );
    }

    #[test]
    fn consecutive_multi_cell_lines_form_a_table() {
        let spans = vec![
            span("Intro paragraph text", 10.0, 300.0, 760.0),
            span("Year", 10.0, 40.0, 740.0),
            span("Film", 100.0, 130.0, 740.0),
            span("2014", 10.0, 40.0, 725.0),
            span("The Gambler", 100.0, 170.0, 725.0),
            span("Closing prose", 10.0, 200.0, 700.0),
            span("lonely", 10.0, 40.0, 680.0),
            span("row", 100.0, 130.0, 680.0),
        ];
        let tables = spans_to_tables(spans, &LayoutOptions::default());
        assert_eq!(tables.len(), 1, "single-row runs are not tables");
        assert_eq!(
            tables[0],
            vec![
                Some(vec![Some("Year".to_string()), Some("Film".to_string())]),
                Some(vec![Some("2014".to_string()), Some("The Gambler".to_string())]),
            ]
        );
    }

    #[test]
    fn no_spans_no_tables() {
        assert!(spans_to_tables(Vec::new(), &LayoutOptions::default()).is_empty());
    }

    #[test]
    fn missing_library_is_reported_not_panicked() {
        let extractor =
            PdfiumTableExtractor::new().with_library_path("/definitely/not/libpdfium.so");
        let err = extractor
            .extract_tables(Path::new("/definitely/not/a.pdf"))
            .unwrap_err();
        assert!(matches!(err, TableExtractionError::LibraryUnavailable(_)));
    }
}
