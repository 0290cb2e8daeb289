//! Section walker: the document-order pass over the article body.
//!
//! Block elements (headings, paragraphs, lists, definition lists) are
//! rendered as they are met. The walk descends through every other element
//! except tables, which are skipped with their whole subtree. A block that
//! has been rendered is not descended into, so nested lists appear once.
//!
//! The first heading whose text is a stop section ends the walk for good.
//! Headings are matched on their plain text, so `<h2><i>Notes</i></h2>`
//! stops the walk just like `<h2>Notes</h2>`.

use crate::pipeline::node::{child_elements, has_class, NodeKind, NodeRenderer};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use std::ops::ControlFlow;
use tracing::debug;

static SEL_CONTENT: Lazy<Selector> = Lazy::new(|| Selector::parse("div#mw-content-text").unwrap());

static SEL_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1#firstHeading").unwrap());

/// The main content container of an article page.
pub fn content_region(document: &Html) -> Option<ElementRef<'_>> {
    document.select(&SEL_CONTENT).next()
}

/// The page heading text, if present and non-blank.
pub fn page_title(document: &Html) -> Option<String> {
    document
        .select(&SEL_TITLE)
        .next()
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Walk `content` in document order and return its Markdown blocks.
///
/// `stop_sections` must already be normalised (lowercase, trimmed).
pub fn build_body(
    content: ElementRef<'_>,
    renderer: &NodeRenderer,
    stop_sections: &HashSet<String>,
) -> Vec<String> {
    let mut walker = Walker {
        renderer,
        stop_sections,
        blocks: Vec::new(),
    };
    if let ControlFlow::Break(heading) = walker.walk(content) {
        debug!("Stopped at section '{}'", heading);
    }
    walker.blocks
}

struct Walker<'r> {
    renderer: &'r NodeRenderer,
    stop_sections: &'r HashSet<String>,
    blocks: Vec<String>,
}

impl Walker<'_> {
    fn walk(&mut self, element: ElementRef<'_>) -> ControlFlow<String> {
        for child in child_elements(element) {
            match NodeKind::of(child.value()) {
                NodeKind::Heading(level) => self.heading(child, level)?,
                NodeKind::Paragraph | NodeKind::List => self.block(child),
                NodeKind::DefinitionPart if child.value().name() == "dl" => self.block(child),
                NodeKind::Table => debug!("Skipping inline table"),
                NodeKind::NonContent => {}
                _ => self.walk(child)?,
            }
        }
        ControlFlow::Continue(())
    }

    fn heading(&mut self, heading: ElementRef<'_>, level: u8) -> ControlFlow<String> {
        let key = heading_key(heading);
        if self.stop_sections.contains(&key) {
            return ControlFlow::Break(key);
        }
        let text = self.renderer.render(heading, false);
        let text = text.trim();
        if !text.is_empty() {
            self.blocks
                .push(format!("{} {}", "#".repeat(level as usize), text));
        }
        ControlFlow::Continue(())
    }

    fn block(&mut self, element: ElementRef<'_>) {
        let text = match NodeKind::of(element.value()) {
            NodeKind::List => self.renderer.render_list(element, false),
            _ => self.renderer.render(element, false),
        };
        let text = text.trim();
        if !text.is_empty() {
            self.blocks.push(text.to_string());
        }
    }
}

/// Lowercased plain text of a heading, without its edit-section links.
fn heading_key(heading: ElementRef<'_>) -> String {
    fn collect(element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(e) if has_class(e, "mw-editsection") => {}
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        collect(el, out);
                    }
                }
                _ => {}
            }
        }
    }

    let mut text = String::new();
    collect(heading, &mut text);
    text.trim().to_lowercase()
}
