//! Conversion entry points.
//!
//! The run is sequential: fetch the article, render its body and references,
//! optionally recover tables from the PDF rendition, then assemble and
//! normalise the document. Only the HTML path can fail the run; anything
//! going wrong on the PDF path is logged and the document is produced
//! without an `Extracted Tables` section.

use crate::config::ConversionConfig;
use crate::error::Wiki2MdError;
use crate::output::{Article, ConversionOutput, ConversionStats};
use crate::pipeline::fetch::{self, FetchPolicy, ACCEPT_HTML};
use crate::pipeline::input::{self, ArticleUrl};
use crate::pipeline::node::NodeRenderer;
use crate::pipeline::pdf::{PdfiumTableExtractor, TableExtractor};
use crate::pipeline::{merge, postprocess, references, walker};
use crate::progress::Stage;
use scraper::Html;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a Wikipedia article to Markdown.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `article_url`: http(s) URL of the article
/// * `config`: conversion configuration
///
/// # Errors
/// Returns `Err(Wiki2MdError)` only for fatal errors:
/// - the URL is not http(s)
/// - the article page could not be fetched after all retries
/// - the page has no main content region
///
/// PDF-path failures never surface here; see
/// [`ConversionStats::pdf_failures`].
pub async fn convert(
    article_url: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Wiki2MdError> {
    let total_start = Instant::now();
    let article_url = ArticleUrl::parse(article_url.as_ref())?;
    info!("Starting conversion: {}", article_url.as_str());

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(article_url.as_str());
    }

    // ── Step 1: Fetch article HTML ───────────────────────────────────────
    let html_start = Instant::now();
    let client = fetch::build_client(config)?;
    stage_start(config, Stage::FetchHtml);
    let html_bytes = fetch::fetch_bytes(
        &client,
        article_url.as_str(),
        ACCEPT_HTML,
        &FetchPolicy::html(config),
    )
    .await?;
    stage_complete(config, Stage::FetchHtml, html_bytes.len());
    let html = String::from_utf8_lossy(&html_bytes);

    // ── Step 2: Render body and references ───────────────────────────────
    stage_start(config, Stage::RenderBody);
    let article = render_article(&html, &article_url, config)?;
    stage_complete(config, Stage::RenderBody, article.body.len());
    let html_duration_ms = html_start.elapsed().as_millis() as u64;

    // ── Step 3: PDF tables (optional, never fatal) ───────────────────────
    let pdf_start = Instant::now();
    let pdf = if config.include_pdf_tables {
        collect_pdf_tables(&client, &article_url, config).await
    } else {
        debug!("PDF tables disabled");
        PdfCollection::default()
    };
    let pdf_duration_ms = pdf_start.elapsed().as_millis() as u64;

    // ── Step 4: Assemble ─────────────────────────────────────────────────
    stage_start(config, Stage::Assemble);
    let markdown = assemble_document(&article, &pdf.tables);
    stage_complete(config, Stage::Assemble, markdown.len());

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(markdown.len());
    }

    let stats = ConversionStats {
        body_blocks: article.body.len(),
        references: article.references.len(),
        pdf_tables: pdf.tables.len(),
        pdf_failures: pdf.failures,
        html_bytes: html_bytes.len(),
        pdf_bytes: pdf.bytes,
        html_duration_ms,
        pdf_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} blocks, {} references, {} PDF tables in {}ms",
        stats.body_blocks, stats.references, stats.pdf_tables, stats.total_duration_ms
    );

    Ok(into_output(article, markdown, pdf.tables, stats))
}

/// Convert already-fetched article HTML without touching the network.
///
/// The PDF path is never taken, whatever `config.include_pdf_tables` says.
/// `article_url` is still required: it is the link target of the title
/// heading, the base for relative image sources and the fallback title.
pub fn convert_html(
    html: &str,
    article_url: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Wiki2MdError> {
    let start = Instant::now();
    let article_url = ArticleUrl::parse(article_url)?;
    let article = render_article(html, &article_url, config)?;
    let markdown = assemble_document(&article, &[]);

    let stats = ConversionStats {
        body_blocks: article.body.len(),
        references: article.references.len(),
        html_bytes: html.len(),
        total_duration_ms: start.elapsed().as_millis() as u64,
        ..Default::default()
    };
    Ok(into_output(article, markdown, Vec::new(), stats))
}

/// Convert an article and write the document into `config.output_dir`.
///
/// Returns the written path alongside the output. Nothing is written when
/// the conversion fails.
pub async fn convert_to_file(
    article_url: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<(PathBuf, ConversionOutput), Wiki2MdError> {
    let output = convert(article_url, config).await?;
    let path = config.output_dir.join(&output.file_name);
    write_markdown(&output.markdown, &path).await?;
    info!("Markdown file created at: {}", path.display());
    Ok((path, output))
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    article_url: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Wiki2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Wiki2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(article_url, config))
}

/// Parse article HTML into title, body blocks and references.
///
/// # Errors
/// [`Wiki2MdError::ContentNotFound`] when the page has no
/// `div#mw-content-text`.
pub fn render_article(
    html: &str,
    article_url: &ArticleUrl,
    config: &ConversionConfig,
) -> Result<Article, Wiki2MdError> {
    let document = Html::parse_document(html);

    let content =
        walker::content_region(&document).ok_or_else(|| Wiki2MdError::ContentNotFound {
            url: article_url.as_str().to_string(),
        })?;

    let renderer = NodeRenderer::new(Some(article_url.url().clone()), config.reference_markers);
    let body = walker::build_body(content, &renderer, &config.stop_sections());
    let references = references::extract_references(&document, &renderer);

    let display_title = article_url.display_title();
    let page_title = walker::page_title(&document);
    let title = page_title
        .clone()
        .or_else(|| display_title.clone())
        .unwrap_or_else(|| article_url.as_str().to_string());
    let file_title = display_title.or(page_title).unwrap_or_default();

    debug!(
        "Rendered '{}': {} blocks, {} references",
        title,
        body.len(),
        references.len()
    );

    Ok(Article {
        title,
        source_url: article_url.as_str().to_string(),
        file_title,
        body,
        references,
    })
}

/// Join an article and its PDF tables into the final document.
///
/// Every block is followed by a blank line; the `References` and
/// `Extracted Tables` sections are left out when they would be empty.
pub fn assemble_document(article: &Article, pdf_tables: &[String]) -> String {
    let mut blocks: Vec<String> = Vec::with_capacity(article.body.len() + 8);
    blocks.push(format!("# [{}]({})", article.title, article.source_url));
    blocks.extend(article.body.iter().cloned());

    if !article.references.is_empty() {
        blocks.push("## References".to_string());
        blocks.extend(
            article
                .references
                .iter()
                .map(|r| format!("\\[{}] {}", r.number, r.text)),
        );
    }

    if !pdf_tables.is_empty() {
        blocks.push("## Extracted Tables".to_string());
        for (i, table) in pdf_tables.iter().enumerate() {
            blocks.push(format!("### Table {}", i + 1));
            blocks.push(table.clone());
        }
    }

    let mut doc = String::new();
    for block in &blocks {
        doc.push_str(block);
        doc.push_str("\n\n");
    }
    postprocess::clean_markdown(&doc)
}

/// Write `markdown` to `path` atomically, creating the parent directory.
pub async fn write_markdown(markdown: &str, path: &Path) -> Result<(), Wiki2MdError> {
    let write_err = |e| Wiki2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, markdown)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// What the PDF path produced.
#[derive(Debug, Default)]
struct PdfCollection {
    tables: Vec<String>,
    failures: usize,
    bytes: usize,
}

/// Download the PDF rendition and recover its tables.
///
/// Never fails: each problem is logged, reported through
/// `on_pdf_skipped`, and the collection so far is returned.
async fn collect_pdf_tables(
    client: &reqwest::Client,
    article_url: &ArticleUrl,
    config: &ConversionConfig,
) -> PdfCollection {
    let mut out = PdfCollection::default();

    if article_url.slug().is_none() {
        pdf_skipped(config, "URL has no /wiki/<title> path");
        return out;
    }

    stage_start(config, Stage::FetchPdf);
    let pdf = match input::download_pdf(client, article_url, config).await {
        Ok(pdf) => pdf,
        Err(e) => {
            out.failures += 1;
            pdf_skipped(config, &e.to_string());
            return out;
        }
    };
    out.bytes = pdf.len();
    stage_complete(config, Stage::FetchPdf, pdf.len());

    stage_start(config, Stage::ExtractTables);
    let extractor: Arc<dyn TableExtractor> = config
        .table_extractor
        .clone()
        .unwrap_or_else(|| Arc::new(PdfiumTableExtractor::new()));
    let path = pdf.path().to_path_buf();

    // pdfium is not async-safe, so extraction runs on a blocking thread.
    // `pdf` stays alive until the join so the temp file outlives the task.
    let joined = tokio::task::spawn_blocking(move || extractor.extract_tables(&path)).await;
    drop(pdf);

    let extracted = match joined {
        Ok(Ok(extracted)) => extracted,
        Ok(Err(e)) => {
            out.failures += 1;
            pdf_skipped(config, &e.to_string());
            return out;
        }
        Err(e) => {
            out.failures += 1;
            pdf_skipped(config, &format!("extraction task failed: {e}"));
            return out;
        }
    };

    out.failures += extracted.failures.len();
    out.tables = merge::merge_tables(&extracted.tables);
    stage_complete(config, Stage::ExtractTables, out.tables.len());
    out
}

fn into_output(
    article: Article,
    markdown: String,
    pdf_tables: Vec<String>,
    stats: ConversionStats,
) -> ConversionOutput {
    let file_name = format!("{}.md", input::sanitize_filename(&article.file_title));
    ConversionOutput {
        title: article.title,
        source_url: article.source_url,
        markdown,
        references: article.references,
        pdf_tables,
        file_name,
        stats,
    }
}

fn stage_start(config: &ConversionConfig, stage: Stage) {
    debug!("{}", stage.label());
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

fn stage_complete(config: &ConversionConfig, stage: Stage, items: usize) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, items);
    }
}

fn pdf_skipped(config: &ConversionConfig, reason: &str) {
    warn!("Skipping PDF tables: {}", reason);
    if let Some(ref cb) = config.progress_callback {
        cb.on_pdf_skipped(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Reference;

    const URL: &str = "https://en.wikipedia.org/wiki/The_Gambler_(2014_film)";

    fn page(body: &str) -> String {
        format!(
            r#"<html><body><h1 id="firstHeading">The Gambler (2014 film)</h1>
            <div id="mw-content-text">{body}</div></body></html>"#
        )
    }

    fn config() -> ConversionConfig {
        ConversionConfig::builder()
            .include_pdf_tables(false)
            .build()
            .unwrap()
    }

    #[test]
    fn missing_content_region_is_fatal() {
        let url = ArticleUrl::parse(URL).unwrap();
        let err = render_article("<html><body><p>x</p></body></html>", &url, &config())
            .unwrap_err();
        assert!(matches!(err, Wiki2MdError::ContentNotFound { .. }));
    }

    #[test]
    fn titles_prefer_heading_and_slug() {
        let url = ArticleUrl::parse("https://en.wikipedia.org/wiki/AC%2FDC").unwrap();
        let html = r#"<h1 id="firstHeading"> AC/DC </h1><div id="mw-content-text"></div>"#;
        let article = render_article(html, &url, &config()).unwrap();
        assert_eq!(article.title, "AC/DC");
        assert_eq!(article.file_title, "AC/DC");

        let no_heading = render_article(r#"<div id="mw-content-text"></div>"#, &url, &config())
            .unwrap();
        assert_eq!(no_heading.title, "AC/DC");
    }

    #[test]
    fn assembly_skips_empty_sections() {
        let article = Article {
            title: "T".into(),
            source_url: "https://x.org/wiki/T".into(),
            body: vec!["Para.".into()],
            ..Default::default()
        };
        assert_eq!(
            assemble_document(&article, &[]),
            "# [T](https://x.org/wiki/T)\n\nPara.\n"
        );
    }

    #[test]
    fn assembly_numbers_tables() {
        let article = Article {
            title: "T".into(),
            source_url: "u".into(),
            references: vec![Reference {
                number: 1,
                text: "Src.".into(),
            }],
            ..Default::default()
        };
        let md = assemble_document(&article, &["| a |\n| --- |".into(), "| b |\n| --- |".into()]);
        assert_eq!(
            md,
            "# [T](u)\n\n## References\n\n\\[1] Src.\n\n## Extracted Tables\n\n\
             ### Table 1\n\n| a |\n| --- |\n\n### Table 2\n\n| b |\n| --- |\n"
        );
    }

    #[test]
    fn convert_html_names_file_from_slug() {
        let out = convert_html(&page("<p>Body.</p>"), URL, &config()).unwrap();
        assert_eq!(out.file_name, "The Gambler (2014 film).md");
        assert_eq!(out.stats.body_blocks, 1);
        assert!(out.pdf_tables.is_empty());
    }

    #[test]
    fn convert_html_rejects_bad_url() {
        let err = convert_html(&page(""), "not a url", &config()).unwrap_err();
        assert!(matches!(err, Wiki2MdError::InvalidArticleUrl { .. }));
    }

    #[tokio::test]
    async fn write_markdown_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("A-B.md");
        write_markdown("# x\n", &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# x\n");
        assert!(!path.with_extension("md.tmp").exists());
    }
}
