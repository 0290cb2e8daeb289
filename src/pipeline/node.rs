//! Node rendering: one HTML subtree → inline Markdown text.
//!
//! Elements are first classified into a closed [`NodeKind`] set and then
//! dispatched by a single `match`. Anything the renderer does not know falls
//! into [`NodeKind::Other`] and is rendered transparently, so unknown inline
//! tags never lose their text.
//!
//! The only context is the `inside_table` flag. It is passed explicitly on
//! every recursive call so a table nested inside a table cell composes
//! correctly.

use crate::config::ReferenceMarkers;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::node::Element;
use scraper::{ElementRef, Node};

/// The element kinds the renderer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `h1`–`h6`, with the level.
    Heading(u8),
    Paragraph,
    /// `ul` / `ol`.
    List,
    ListItem,
    /// `b` / `strong`.
    Bold,
    /// `i` / `em`.
    Italic,
    Anchor,
    Image,
    /// `sup`; reference markers are told apart by class.
    Superscript,
    /// `span`, `div`, `small`, `br`.
    Container,
    /// `dl`, `dt`, `dd`.
    DefinitionPart,
    Table,
    TableRow,
    /// `th` (`header = true`) or `td`.
    TableCell { header: bool },
    /// `script`, `style`, `noscript` and `[edit]` links: never rendered.
    NonContent,
    Other,
}

impl NodeKind {
    /// Classify an element by its tag name.
    pub fn of(element: &Element) -> Self {
        if has_class(element, "mw-editsection") {
            return NodeKind::NonContent;
        }
        match element.name() {
            "h1" => NodeKind::Heading(1),
            "h2" => NodeKind::Heading(2),
            "h3" => NodeKind::Heading(3),
            "h4" => NodeKind::Heading(4),
            "h5" => NodeKind::Heading(5),
            "h6" => NodeKind::Heading(6),
            "p" => NodeKind::Paragraph,
            "ul" | "ol" => NodeKind::List,
            "li" => NodeKind::ListItem,
            "b" | "strong" => NodeKind::Bold,
            "i" | "em" => NodeKind::Italic,
            "a" => NodeKind::Anchor,
            "img" => NodeKind::Image,
            "sup" => NodeKind::Superscript,
            "span" | "div" | "small" | "br" => NodeKind::Container,
            "dl" | "dt" | "dd" => NodeKind::DefinitionPart,
            "table" => NodeKind::Table,
            "tr" => NodeKind::TableRow,
            "th" => NodeKind::TableCell { header: true },
            "td" => NodeKind::TableCell { header: false },
            "script" | "style" | "noscript" => NodeKind::NonContent,
            _ => NodeKind::Other,
        }
    }
}

// Optional leading backslash so text that is already escaped stays as is.
static RE_BRACKETED_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\?\[(\d+)\]").unwrap());

static RE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\]").unwrap());

/// Escape every bracketed integer (`[3]` → `\[3]`) so Markdown renders it
/// as text instead of a link reference. Already-escaped markers are left
/// untouched.
pub fn escape_bracketed_integers(text: &str) -> String {
    RE_BRACKETED_INT.replace_all(text, r"\[$1]").into_owned()
}

/// True when the element carries `class` token `name`.
pub fn has_class(element: &Element, name: &str) -> bool {
    element.classes().any(|c| c == name)
}

/// Direct element children of `element`.
pub fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.children().filter_map(ElementRef::wrap)
}

/// Renders HTML subtrees to inline Markdown.
///
/// Holds only read-only settings, so rendering is a pure function of the
/// subtree and the `inside_table` flag.
#[derive(Debug, Clone)]
pub struct NodeRenderer {
    base_url: Option<Url>,
    markers: ReferenceMarkers,
}

impl NodeRenderer {
    /// `base_url` resolves relative image sources; pass `None` to keep them
    /// verbatim.
    pub fn new(base_url: Option<Url>, markers: ReferenceMarkers) -> Self {
        Self { base_url, markers }
    }

    /// Render the children of `element` and concatenate them.
    pub fn render(&self, element: ElementRef<'_>, inside_table: bool) -> String {
        let mut out = String::new();
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(&escape_bracketed_integers(text)),
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        self.render_element(el, inside_table, &mut out);
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn render_element(&self, el: ElementRef<'_>, inside_table: bool, out: &mut String) {
        match NodeKind::of(el.value()) {
            NodeKind::Bold => wrap_trimmed(out, &self.render(el, inside_table), "**"),
            NodeKind::Italic => wrap_trimmed(out, &self.render(el, inside_table), "*"),
            NodeKind::Anchor => out.push_str(&self.render(el, inside_table)),
            NodeKind::Image => {
                let alt = el.value().attr("alt").unwrap_or("");
                let src = self.resolve_src(el.value().attr("src").unwrap_or(""));
                out.push_str(&format!("![{alt}]({src})"));
            }
            NodeKind::List => out.push_str(&self.render_list(el, inside_table)),
            NodeKind::Superscript if has_class(el.value(), "reference") => {
                if self.markers == ReferenceMarkers::Escaped {
                    let text: String = el.text().collect();
                    if let Some(caps) = RE_MARKER.captures(&text) {
                        out.push_str(&format!("\\[{}]", &caps[1]));
                    }
                }
            }
            NodeKind::DefinitionPart => {
                let inner = self.render(el, inside_table);
                let inner = inner.trim();
                if !inner.is_empty() {
                    out.push_str(inner);
                    out.push('\n');
                }
            }
            NodeKind::Table if !inside_table => {}
            NodeKind::NonContent => {}
            _ => out.push_str(&self.render(el, inside_table)),
        }
    }

    /// Render the direct `li` children of a list.
    ///
    /// Inside a table cell the items are comma-joined onto one line; in
    /// running text each item becomes a `- item` line.
    pub fn render_list(&self, list: ElementRef<'_>, inside_table: bool) -> String {
        let items: Vec<String> = child_elements(list)
            .filter(|li| NodeKind::of(li.value()) == NodeKind::ListItem)
            .map(|li| self.render(li, inside_table).trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();

        if inside_table {
            items.join(", ")
        } else {
            items.iter().map(|item| format!("- {item}\n")).collect()
        }
    }

    fn resolve_src(&self, src: &str) -> String {
        match &self.base_url {
            Some(base) if !src.is_empty() => base
                .join(src)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| src.to_string()),
            _ => src.to_string(),
        }
    }
}

fn wrap_trimmed(out: &mut String, inner: &str, marker: &str) {
    let inner = inner.trim();
    if !inner.is_empty() {
        out.push_str(marker);
        out.push_str(inner);
        out.push_str(marker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn renderer() -> NodeRenderer {
        NodeRenderer::new(
            Some(Url::parse("https://en.wikipedia.org/wiki/Test").unwrap()),
            ReferenceMarkers::Escaped,
        )
    }

    /// Render the first element matching `css` in `html`.
    fn render_first(html: &str, css: &str, inside_table: bool) -> String {
        render_with(&renderer(), html, css, inside_table)
    }

    fn render_with(r: &NodeRenderer, html: &str, css: &str, inside_table: bool) -> String {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse(css).unwrap();
        let el = doc.select(&sel).next().expect("element present");
        r.render(el, inside_table)
    }

    #[test]
    fn escapes_bracketed_integers_in_text() {
        assert_eq!(
            render_first("<p>Hello [1] world [23].</p>", "p", false),
            r"Hello \[1] world \[23]."
        );
    }

    #[test]
    fn escaping_is_applied_once() {
        assert_eq!(escape_bracketed_integers(r"see \[3] and [3]"), r"see \[3] and \[3]");
        let once = escape_bracketed_integers("x [3] y");
        assert_eq!(escape_bracketed_integers(&once), once);
        assert_eq!(once.matches(r"\[3]").count(), 1);
    }

    #[test]
    fn non_numeric_brackets_untouched() {
        assert_eq!(escape_bracketed_integers("[a] [12b] []"), "[a] [12b] []");
    }

    #[test]
    fn bold_and_italic_are_trimmed_and_wrapped() {
        assert_eq!(
            render_first("<p><b> bold </b> and <em>it</em></p>", "p", false),
            "**bold** and *it*"
        );
    }

    #[test]
    fn empty_emphasis_emits_nothing() {
        assert_eq!(render_first("<p>a<b>  </b>b<i></i></p>", "p", false), "ab");
    }

    #[test]
    fn anchor_keeps_text_only() {
        assert_eq!(
            render_first(r#"<p><a href="/wiki/Rust">Rust</a> lang</p>"#, "p", false),
            "Rust lang"
        );
    }

    #[test]
    fn image_src_resolved_against_base() {
        assert_eq!(
            render_first(
                r#"<p><img alt="Logo" src="//upload.wikimedia.org/logo.png"></p>"#,
                "p",
                false
            ),
            "![Logo](https://upload.wikimedia.org/logo.png)"
        );
        assert_eq!(
            render_first(r#"<p><img src="/static/a.png"></p>"#, "p", false),
            "![](https://en.wikipedia.org/static/a.png)"
        );
    }

    #[test]
    fn image_without_base_keeps_src() {
        let r = NodeRenderer::new(None, ReferenceMarkers::Escaped);
        assert_eq!(
            render_with(&r, r#"<p><img alt="x" src="a.png"></p>"#, "p", false),
            "![x](a.png)"
        );
    }

    #[test]
    fn list_in_table_is_comma_joined() {
        let html = "<div><ul><li>A</li><li>B</li><li>C</li></ul></div>";
        assert_eq!(render_first(html, "div", true), "A, B, C");
    }

    #[test]
    fn list_outside_table_is_bulleted() {
        let html = "<div><ol><li> A </li><li>B</li><li></li><li>C</li></ol></div>";
        assert_eq!(render_first(html, "div", false), "- A\n- B\n- C\n");
    }

    #[test]
    fn reference_superscript_is_escaped_marker() {
        let html = r##"<p>Fact<sup class="reference" id="cite_ref-1"><a href="#cite_note-1">[7]</a></sup>.</p>"##;
        assert_eq!(render_first(html, "p", false), r"Fact\[7].");
    }

    #[test]
    fn reference_superscript_dropped_when_configured() {
        let r = NodeRenderer::new(None, ReferenceMarkers::Dropped);
        let html = r#"<p>Fact<sup class="reference">[7]</sup> [2].</p>"#;
        assert_eq!(render_with(&r, html, "p", false), r"Fact \[2].");
    }

    #[test]
    fn reference_superscript_without_number_emits_nothing() {
        let html = r#"<p>Fact<sup class="reference">[a]</sup>.</p>"#;
        assert_eq!(render_first(html, "p", false), "Fact.");
    }

    #[test]
    fn plain_superscript_recurses() {
        assert_eq!(render_first("<p>x<sup>2</sup></p>", "p", false), "x2");
    }

    #[test]
    fn definition_parts_end_with_newline() {
        let html = "<div><dl><dt> Term </dt><dd>Meaning</dd></dl></div>";
        assert_eq!(render_first(html, "div", false), "Term\nMeaning\n");
    }

    #[test]
    fn nested_table_suppressed_in_prose_but_flattened_in_cells() {
        let html = "<div>before<table><tr><td>cell</td></tr></table>after</div>";
        assert_eq!(render_first(html, "div", false), "beforeafter");
        assert_eq!(render_first(html, "div", true), "beforecellafter");
    }

    #[test]
    fn scripts_and_styles_are_not_rendered() {
        let html = "<p>a<style>.x{color:red}</style>b<script>var x = [1];</script></p>";
        assert_eq!(render_first(html, "p", false), "ab");
    }

    #[test]
    fn edit_section_links_are_not_rendered() {
        let html = r#"<h2><span class="mw-headline">History</span><span class="mw-editsection">[<a>edit</a>]</span></h2>"#;
        assert_eq!(render_first(html, "h2", false), "History");
    }

    #[test]
    fn unknown_tags_recurse_transparently() {
        assert_eq!(
            render_first("<p><abbr>NASA</abbr> <code>x</code></p>", "p", false),
            "NASA x"
        );
    }

    #[test]
    fn rendering_is_pure() {
        let html = "<p>One [1] <b>two</b></p>";
        assert_eq!(
            render_first(html, "p", false),
            render_first(html, "p", false)
        );
    }

    #[test]
    fn classify_headings_and_cells() {
        let doc = Html::parse_fragment("<h3>x</h3><table><tr><th>h</th><td>d</td></tr></table>");
        let kinds: Vec<NodeKind> = ["h3", "th", "td", "tr"]
            .iter()
            .map(|css| {
                let sel = Selector::parse(css).unwrap();
                NodeKind::of(doc.select(&sel).next().unwrap().value())
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Heading(3),
                NodeKind::TableCell { header: true },
                NodeKind::TableCell { header: false },
                NodeKind::TableRow,
            ]
        );
    }
}
