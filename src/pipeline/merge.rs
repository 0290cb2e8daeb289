//! PDF table merge: raw row grids → Markdown tables.
//!
//! Grids come from a [`crate::pipeline::pdf::TableExtractor`]. Missing rows
//! are dropped, missing cells become empty strings, and the first surviving
//! row is the header. A grid with no surviving rows is left out of the
//! result entirely.

use crate::pipeline::pdf::RawTable;
use crate::pipeline::table::{cell_text, TableShape, PLAIN_ALIGN};
use tracing::debug;

/// Normalise one raw grid into a [`TableShape`].
pub fn normalise(raw: &RawTable) -> TableShape {
    let rows: Vec<Vec<String>> = raw
        .iter()
        .flatten()
        .map(|row| {
            row.iter()
                .map(|cell| cell.as_deref().map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();
    TableShape::from_rows(rows)
}

/// Render one raw grid; empty when no rows survive.
pub fn pdf_table_to_markdown(raw: &RawTable) -> String {
    normalise(raw).to_markdown(PLAIN_ALIGN)
}

/// Render every grid, keeping only the non-empty tables, in input order.
pub fn merge_tables(raw_tables: &[RawTable]) -> Vec<String> {
    let tables: Vec<String> = raw_tables
        .iter()
        .map(pdf_table_to_markdown)
        .filter(|md| !md.trim().is_empty())
        .collect();
    debug!(
        "Merged {} of {} raw PDF tables",
        tables.len(),
        raw_tables.len()
    );
    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn nulls_dropped_and_padded() {
        let raw: RawTable = vec![
            Some(vec![cell(" Name "), cell("Year")]),
            None,
            Some(vec![cell("Gambler"), None, cell("extra")]),
            Some(vec![cell("Solo")]),
        ];
        assert_eq!(
            pdf_table_to_markdown(&raw),
            "| Name | Year |  |\n\
             | --- | --- | --- |\n\
             | Gambler |  | extra |\n\
             | Solo |  |  |"
        );
    }

    #[test]
    fn header_only_table() {
        let raw: RawTable = vec![Some(vec![cell("a"), cell("b")])];
        assert_eq!(pdf_table_to_markdown(&raw), "| a | b |\n| --- | --- |");
    }

    #[test]
    fn grid_without_rows_is_excluded() {
        let empty: RawTable = vec![None, None];
        let blank_cells: RawTable = vec![Some(Vec::new())];
        let good: RawTable = vec![Some(vec![cell("x")])];
        let merged = merge_tables(&[empty, good, blank_cells]);
        assert_eq!(merged, vec!["| x |\n| --- |".to_string()]);
    }

    #[test]
    fn every_row_padded_to_max_width() {
        let raw: RawTable = vec![
            Some(vec![cell("1")]),
            Some(vec![cell("1"), cell("2"), cell("3"), cell("4")]),
            Some(vec![cell("1"), cell("2")]),
        ];
        let md = pdf_table_to_markdown(&raw);
        assert!(md.lines().all(|l| l.matches('|').count() == 5), "{md}");
    }
}
