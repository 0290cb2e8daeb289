//! Table classification and Markdown table rendering.
//!
//! An HTML table is either an **infobox** (key/value summary, rendered as a
//! two-column `Property | Value` table) or a **standard** table (header row
//! plus data rows). Both end up as a [`TableShape`], the rectangular grid
//! that also backs the PDF tables in [`crate::pipeline::merge`].

use crate::pipeline::node::{child_elements, NodeKind, NodeRenderer};
use scraper::ElementRef;

/// Separator cell for HTML tables (left-aligned columns).
pub const LEFT_ALIGN: &str = ":---";

/// Separator cell for PDF tables.
pub const PLAIN_ALIGN: &str = "---";

/// A header row plus data rows, padded on output to a common width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableShape {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableShape {
    /// Build a shape whose first row is the header.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let header = rows.remove(0);
        Self { header, rows }
    }

    /// Widest row, header included.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.column_count() == 0
    }

    /// Render as a pipe table. Every row, header included, is right-padded
    /// with empty cells to [`Self::column_count`]. Empty shapes render as
    /// an empty string.
    pub fn to_markdown(&self, separator: &str) -> String {
        let cols = self.column_count();
        if cols == 0 {
            return String::new();
        }

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(format_row(&self.header, cols));
        lines.push(format_row(&vec![separator.to_string(); cols], cols));
        lines.extend(self.rows.iter().map(|row| format_row(row, cols)));
        lines.join("\n")
    }
}

fn format_row(cells: &[String], cols: usize) -> String {
    let padded: Vec<&str> = cells
        .iter()
        .map(String::as_str)
        .chain(std::iter::repeat(""))
        .take(cols)
        .collect();
    format!("| {} |", padded.join(" | "))
}

/// Make rendered text safe for a single table cell: no line breaks, no
/// bare pipes.
pub fn cell_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', r"\|")
}

// ── Classification ───────────────────────────────────────────────────────

/// The two table layouts the renderer knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Key/value summary box.
    Infobox,
    /// Anything else.
    Standard,
}

/// An infobox is any table whose class attribute mentions "infobox"
/// (case-insensitive).
pub fn classify(table: ElementRef<'_>) -> TableKind {
    let is_infobox = table
        .value()
        .classes()
        .any(|c| c.to_ascii_lowercase().contains("infobox"));
    if is_infobox {
        TableKind::Infobox
    } else {
        TableKind::Standard
    }
}

/// Rows belonging to `table` itself: direct `tr` children plus those of its
/// direct `thead`/`tbody`/`tfoot` sections. Rows of nested tables are not
/// included.
pub fn table_rows<'a>(table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let mut rows = Vec::new();
    for child in child_elements(table) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child_elements(child).filter(|el| NodeKind::of(el.value()) == NodeKind::TableRow),
            ),
            _ => {}
        }
    }
    rows
}

fn row_cells<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    child_elements(row)
        .filter(|el| matches!(NodeKind::of(el.value()), NodeKind::TableCell { .. }))
        .collect()
}

fn is_header_cell(cell: &ElementRef<'_>) -> bool {
    NodeKind::of(cell.value()) == NodeKind::TableCell { header: true }
}

// ── Rendering ────────────────────────────────────────────────────────────

/// Render an HTML table element as a Markdown table, or an empty string if
/// it has nothing to show.
pub fn render_table(table: ElementRef<'_>, renderer: &NodeRenderer) -> String {
    match classify(table) {
        TableKind::Infobox => infobox_shape(table, renderer).to_markdown(LEFT_ALIGN),
        TableKind::Standard => standard_shape(table, renderer).to_markdown(LEFT_ALIGN),
    }
}

/// Property/value pairs from rows made of exactly a row-scoped `th` and a
/// `td`. Zero pairs gives an empty shape.
pub fn infobox_shape(table: ElementRef<'_>, renderer: &NodeRenderer) -> TableShape {
    let rows: Vec<Vec<String>> = table_rows(table)
        .into_iter()
        .filter_map(|row| match row_cells(row).as_slice() {
            [th, td]
                if is_header_cell(th)
                    && th.value().attr("scope") == Some("row")
                    && !is_header_cell(td) =>
            {
                Some(vec![
                    cell_text(&renderer.render(*th, true)),
                    cell_text(&renderer.render(*td, true)),
                ])
            }
            _ => None,
        })
        .collect();

    if rows.is_empty() {
        return TableShape::default();
    }
    TableShape {
        header: vec!["Property".to_string(), "Value".to_string()],
        rows,
    }
}

/// The first all-`th` row is the header; every other row is data. Without
/// a header row the first data row is promoted.
pub fn standard_shape(table: ElementRef<'_>, renderer: &NodeRenderer) -> TableShape {
    let mut header: Option<Vec<String>> = None;
    let mut data: Vec<Vec<String>> = Vec::new();

    for row in table_rows(table) {
        let cells = row_cells(row);
        if cells.is_empty() {
            continue;
        }
        let texts: Vec<String> = cells
            .iter()
            .map(|c| cell_text(&renderer.render(*c, true)))
            .collect();
        if header.is_none() && cells.iter().all(is_header_cell) {
            header = Some(texts);
        } else {
            data.push(texts);
        }
    }

    match header {
        Some(header) => TableShape { header, rows: data },
        None => TableShape::from_rows(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferenceMarkers;
    use scraper::{Html, Selector};

    fn render(html: &str) -> String {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse("table").unwrap();
        let table = doc.select(&sel).next().unwrap();
        render_table(table, &NodeRenderer::new(None, ReferenceMarkers::Escaped))
    }

    fn kind(html: &str) -> TableKind {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse("table").unwrap();
        classify(doc.select(&sel).next().unwrap())
    }

    #[test]
    fn classify_by_class_substring() {
        assert_eq!(kind(r#"<table class="infobox vcard"></table>"#), TableKind::Infobox);
        assert_eq!(kind(r#"<table class="Infobox_v2"></table>"#), TableKind::Infobox);
        assert_eq!(kind(r#"<table class="wikitable"></table>"#), TableKind::Standard);
        assert_eq!(kind("<table></table>"), TableKind::Standard);
    }

    #[test]
    fn infobox_renders_property_value_pairs() {
        let html = r#"<table class="infobox vcard"><tbody>
            <tr><th colspan="2">The Gambler</th></tr>
            <tr><th scope="row">Directed by</th><td>Rupert Wyatt</td></tr>
            <tr><th scope="row">Starring</th><td><ul><li>Mark Wahlberg</li><li>John Goodman</li></ul></td></tr>
            <tr><td>stray</td></tr>
        </tbody></table>"#;
        assert_eq!(
            render(html),
            "| Property | Value |\n\
             | :--- | :--- |\n\
             | Directed by | Rupert Wyatt |\n\
             | Starring | Mark Wahlberg, John Goodman |"
        );
    }

    #[test]
    fn infobox_without_pairs_is_empty() {
        let html = r#"<table class="infobox"><tr><th>Only a title</th></tr></table>"#;
        assert_eq!(render(html), "");
    }

    #[test]
    fn standard_table_with_header_row() {
        let html = r#"<table class="wikitable">
            <tr><th>Year</th><th>Title</th></tr>
            <tr><td>2014</td><td>The Gambler</td></tr>
            <tr><td>2015</td></tr>
        </table>"#;
        assert_eq!(
            render(html),
            "| Year | Title |\n\
             | :--- | :--- |\n\
             | 2014 | The Gambler |\n\
             | 2015 |  |"
        );
    }

    #[test]
    fn first_data_row_promoted_without_header() {
        let html = "<table><tr><td>a</td><td>b</td></tr><tr><td>1</td><td>2</td><td>3</td></tr></table>";
        assert_eq!(
            render(html),
            "| a | b |  |\n\
             | :--- | :--- | :--- |\n\
             | 1 | 2 | 3 |"
        );
    }

    #[test]
    fn every_row_has_column_count_cells() {
        let html = "<table><tr><th>h</th></tr><tr><td>1</td><td>2</td><td>3</td><td>4</td></tr><tr><td>x</td></tr></table>";
        let md = render(html);
        for line in md.lines() {
            // "| a | b |" has cols + 1 unescaped pipes
            assert_eq!(line.matches('|').count(), 5, "line: {line}");
        }
    }

    #[test]
    fn empty_standard_table_renders_nothing() {
        assert_eq!(render("<table><tr></tr></table>"), "");
    }

    #[test]
    fn nested_table_rows_are_not_collected() {
        let html = "<table><tr><td>outer<table><tr><td>inner</td></tr></table></td></tr></table>";
        let md = render(html);
        assert_eq!(md, "| outerinner |\n| :--- |");
    }

    #[test]
    fn cell_text_flattens_and_escapes() {
        assert_eq!(cell_text("  a\nb |  c "), r"a b \| c");
    }

    #[test]
    fn shape_from_rows_and_padding() {
        let shape = TableShape::from_rows(vec![
            vec!["h1".into()],
            vec!["a".into(), "b".into(), "c".into()],
        ]);
        assert_eq!(shape.column_count(), 3);
        assert_eq!(
            shape.to_markdown(PLAIN_ALIGN),
            "| h1 |  |  |\n| --- | --- | --- |\n| a | b | c |"
        );
        assert!(TableShape::from_rows(Vec::new()).is_empty());
    }
}
