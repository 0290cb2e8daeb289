//! Reference list extraction.
//!
//! Numbers are assigned by extraction order, 1..N. Whatever numbering the
//! source list shows (or embeds in its text) is ignored.

use crate::output::Reference;
use crate::pipeline::node::{child_elements, NodeKind, NodeRenderer};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

static SEL_REFERENCES: Lazy<Selector> = Lazy::new(|| Selector::parse("ol.references").unwrap());

/// Extract the first `ol.references` list of the document.
///
/// A page without such a list yields an empty vector.
pub fn extract_references(document: &Html, renderer: &NodeRenderer) -> Vec<Reference> {
    let Some(list) = document.select(&SEL_REFERENCES).next() else {
        debug!("No reference list found");
        return Vec::new();
    };

    let references: Vec<Reference> = child_elements(list)
        .filter(|el| NodeKind::of(el.value()) == NodeKind::ListItem)
        .enumerate()
        .map(|(i, li)| Reference {
            number: i + 1,
            text: renderer.render(li, false).trim().to_string(),
        })
        .collect();

    debug!("Extracted {} references", references.len());
    references
}
