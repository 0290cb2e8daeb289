//! CLI binary for wiki2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wiki2md::{
    convert, write_markdown, ConversionConfig, ConversionOutput, ConversionProgressCallback,
    PdfiumTableExtractor, ProgressCallback, ReferenceMarkers, Stage,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner naming the running stage, plus one
/// log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    /// Stop the spinner and erase it, e.g. before an error is printed.
    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        self.clear();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, article_url: &str) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {article_url}"))
        ));
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix(stage.label());
        self.bar.set_message("");
    }

    fn on_stage_complete(&self, stage: Stage, items: usize) {
        let detail = match stage {
            Stage::FetchHtml | Stage::FetchPdf => format!("{items} bytes"),
            Stage::RenderBody => format!("{items} blocks"),
            Stage::ExtractTables => format!("{items} tables"),
            Stage::Assemble => format!("{items} chars"),
        };
        self.bar.println(format!(
            "  {} {:<22} {}",
            green("✓"),
            stage.label(),
            dim(&detail)
        ));
    }

    fn on_pdf_skipped(&self, reason: &str) {
        // First line only; the rest is a hint meant for the error report.
        let first = reason.lines().next().unwrap_or("");
        let msg = if first.chars().count() > 80 {
            format!("{}\u{2026}", first.chars().take(79).collect::<String>())
        } else {
            first.to_string()
        };
        self.bar.println(format!(
            "  {} PDF tables skipped  {}",
            yellow("⚠"),
            dim(&msg)
        ));
    }

    fn on_conversion_complete(&self, _markdown_len: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert into the download directory
  wiki2md https://en.wikipedia.org/wiki/The_Gambler_(2014_film)

  # Choose the output directory
  wiki2md https://en.wikipedia.org/wiki/Rust_(programming_language) -o notes/

  # HTML only, print to stdout
  wiki2md --no-pdf --stdout https://en.wikipedia.org/wiki/Ferris_wheel

  # Stop at more sections
  wiki2md https://en.wikipedia.org/wiki/Crab --stop "See also" "External links"

  # JSON output with stats
  wiki2md --json https://en.wikipedia.org/wiki/Crab > crab.json

ENVIRONMENT VARIABLES:
  WIKI2MD_OUTPUT_DIR      Output directory (default: your download directory)
  WIKI2MD_NO_PDF          Skip the PDF rendition
  WIKI2MD_TIMEOUT         Article request timeout in seconds
  WIKI2MD_PDF_TIMEOUT     PDF request timeout in seconds
  WIKI2MD_MAX_RETRIES     Retries on HTTP 429/5xx and network errors
  PDFIUM_LIB_PATH         Path to libpdfium used for PDF table extraction
  RUST_LOG                Override the log filter (e.g. wiki2md=debug)

PDF TABLES:
  Tables are read from the article's PDF rendition through pdfium. When the
  library cannot be found the Markdown is still written, without the
  "Extracted Tables" section.
"#;

/// Convert Wikipedia articles to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "wiki2md",
    version,
    about = "Convert Wikipedia articles to Markdown",
    long_about = "Convert a Wikipedia article to Markdown: headings, paragraphs, lists and a \
numbered reference list from the HTML page, plus tables recovered from the article's PDF \
rendition.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Article URL, e.g. https://en.wikipedia.org/wiki/Rust.
    url: String,

    /// Directory the Markdown file is written to.
    #[arg(short, long, env = "WIKI2MD_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Skip the PDF rendition and its tables.
    #[arg(long, env = "WIKI2MD_NO_PDF")]
    no_pdf: bool,

    /// Extra section headings that end the body. Takes several values;
    /// give the URL first or repeat the flag.
    #[arg(long = "stop", value_name = "HEADING", num_args = 1..)]
    stop: Vec<String>,

    /// Leave reference superscripts out of the body text.
    #[arg(long)]
    drop_reference_markers: bool,

    /// Article request timeout in seconds.
    #[arg(long, env = "WIKI2MD_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// PDF request timeout in seconds.
    #[arg(long, env = "WIKI2MD_PDF_TIMEOUT", default_value_t = 45)]
    pdf_timeout: u64,

    /// Retries on HTTP 429/5xx and network errors.
    #[arg(long, env = "WIKI2MD_MAX_RETRIES", default_value_t = 4)]
    max_retries: u32,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print structured JSON (ConversionOutput) instead of writing a file.
    #[arg(long)]
    json: bool,

    /// Print the Markdown to stdout instead of writing a file.
    #[arg(long, conflicts_with = "json")]
    stdout: bool,

    /// Disable progress output.
    #[arg(long, env = "WIKI2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "WIKI2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "WIKI2MD_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs when it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.stdout;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let spinner = show_progress.then(CliProgressCallback::new);
    let progress_cb: Option<ProgressCallback> = spinner
        .clone()
        .map(|s| s as Arc<dyn ConversionProgressCallback>);
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert(&cli.url, &config).await;
    if result.is_err() {
        if let Some(ref s) = spinner {
            s.clear();
        }
    }
    let output = result.context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if cli.stdout {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.markdown.as_bytes())
            .context("Failed to write to stdout")?;
        return Ok(());
    }

    let path = config.output_dir.join(&output.file_name);
    write_markdown(&output.markdown, &path)
        .await
        .context("Failed to write Markdown file")?;

    if !cli.quiet {
        print_summary(&output);
    }
    println!("Markdown file created at: {}", path.display());

    Ok(())
}

fn print_summary(output: &ConversionOutput) {
    let stats = &output.stats;
    eprintln!(
        "{}  {}  {} blocks  {} references  {} PDF tables  {}ms",
        if stats.pdf_failures == 0 {
            green("✔")
        } else {
            yellow("⚠")
        },
        bold(&output.title),
        stats.body_blocks,
        stats.references,
        stats.pdf_tables,
        stats.total_duration_ms,
    );
    if stats.pdf_failures > 0 {
        eprintln!(
            "   {}",
            dim(&format!("{} PDF failures, see logs (-v)", stats.pdf_failures))
        );
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .include_pdf_tables(!cli.no_pdf)
        .stop_sections(cli.stop.iter().cloned())
        .html_timeout_secs(cli.timeout)
        .pdf_timeout_secs(cli.pdf_timeout)
        .max_retries(cli.max_retries);

    if cli.drop_reference_markers {
        builder = builder.reference_markers(ReferenceMarkers::Dropped);
    }
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.table_extractor(Arc::new(
            PdfiumTableExtractor::new().with_library_path(lib.clone()),
        ));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from([
            "wiki2md",
            "https://en.wikipedia.org/wiki/Crab",
            "--no-pdf",
            "--stop",
            "See also",
            "--drop-reference-markers",
            "-o",
            "out",
            "--max-retries",
            "1",
        ]);
        let config = build_config(&cli, None).unwrap();
        assert!(!config.include_pdf_tables);
        assert!(config.stop_sections().contains("see also"));
        assert_eq!(config.reference_markers, ReferenceMarkers::Dropped);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn stop_takes_several_headings() {
        let cli = Cli::parse_from([
            "wiki2md",
            "https://en.wikipedia.org/wiki/Crab",
            "--stop",
            "External links",
            "Further reading",
            "--stop",
            "See also",
        ]);
        assert_eq!(cli.url, "https://en.wikipedia.org/wiki/Crab");
        assert_eq!(cli.stop, ["External links", "Further reading", "See also"]);
        let stops = build_config(&cli, None).unwrap().stop_sections();
        for s in ["external links", "further reading", "see also"] {
            assert!(stops.contains(s), "missing {s}");
        }
    }

    #[test]
    fn spinner_clears_on_failure() {
        let spinner = CliProgressCallback::new();
        spinner.on_stage_start(Stage::FetchHtml);
        spinner.clear();
        assert!(spinner.bar.is_finished());
        spinner.clear();
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cli = Cli::parse_from(["wiki2md", "https://x.org/wiki/A", "--timeout", "0"]);
        assert!(build_config(&cli, None).is_err());
    }
}
