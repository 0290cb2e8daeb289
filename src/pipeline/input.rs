//! Input resolution: the article URL and the PDF rendition derived from it.
//!
//! ## Why download the PDF to a temp file?
//!
//! pdfium opens documents by path. Writing the payload into a `TempDir`
//! gives it one, and the directory is removed when [`DownloadedPdf`] is
//! dropped, even on panic. The `%PDF` magic bytes are checked first so an
//! HTML error page never reaches pdfium.

use crate::config::ConversionConfig;
use crate::error::Wiki2MdError;
use crate::pipeline::fetch::{self, FetchPolicy, ACCEPT_PDF};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// A validated http(s) article URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleUrl {
    raw: String,
    url: Url,
}

impl ArticleUrl {
    /// Parse and validate an article identifier.
    pub fn parse(input: &str) -> Result<Self, Wiki2MdError> {
        let raw = input.trim();
        let url = Url::parse(raw).map_err(|e| Wiki2MdError::InvalidArticleUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(Wiki2MdError::InvalidArticleUrl {
                url: raw.to_string(),
                reason: "not an HTTP/HTTPS URL".into(),
            });
        }
        Ok(Self {
            raw: raw.to_string(),
            url,
        })
    }

    /// The URL exactly as given (trimmed).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The still-encoded page name after `/wiki/`, if any.
    pub fn slug(&self) -> Option<&str> {
        self.url
            .path()
            .strip_prefix("/wiki/")
            .filter(|s| !s.is_empty())
    }

    /// The page name decoded for display: `The_Gambler_(2014_film)` →
    /// `The Gambler (2014 film)`.
    pub fn display_title(&self) -> Option<String> {
        self.slug().map(|s| decode(s).replace('_', " "))
    }

    /// The REST endpoint serving the PDF rendition of this article, on the
    /// article's own origin.
    pub fn pdf_url(&self) -> Result<String, Wiki2MdError> {
        let slug = self.slug().ok_or_else(|| Wiki2MdError::InvalidArticleUrl {
            url: self.raw.clone(),
            reason: "no /wiki/<title> path, cannot derive the PDF URL".into(),
        })?;
        Ok(format!(
            "{}/api/rest_v1/page/pdf/{}",
            self.url.origin().ascii_serialization(),
            urlencoding::encode(&decode(slug))
        ))
    }
}

fn decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

static RE_UNSAFE_FILENAME: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());

/// Replace path-unsafe characters with `-`; an empty result becomes
/// `wikipedia`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = RE_UNSAFE_FILENAME.replace_all(name, "-");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "wikipedia".to_string()
    } else {
        cleaned.to_string()
    }
}

/// A downloaded PDF rendition. The file lives as long as this value.
pub struct DownloadedPdf {
    path: PathBuf,
    bytes: usize,
    _temp_dir: TempDir,
}

impl DownloadedPdf {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Payload size.
    pub fn len(&self) -> usize {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }
}

/// Download the article's PDF rendition into a temporary directory.
pub async fn download_pdf(
    client: &reqwest::Client,
    article: &ArticleUrl,
    config: &ConversionConfig,
) -> Result<DownloadedPdf, Wiki2MdError> {
    let pdf_url = article.pdf_url()?;
    info!("Downloading PDF from: {}", pdf_url);

    let bytes = fetch::fetch_bytes(client, &pdf_url, ACCEPT_PDF, &FetchPolicy::pdf(config)).await?;

    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(Wiki2MdError::NotAPdf {
            url: pdf_url,
            magic,
        });
    }

    let temp_dir = TempDir::new().map_err(|e| Wiki2MdError::Internal(e.to_string()))?;
    let path = temp_dir.path().join("article.pdf");
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| Wiki2MdError::Internal(format!("Failed to write temp file: {}", e)))?;

    debug!("PDF downloaded to: {}", path.display());

    Ok(DownloadedPdf {
        path,
        bytes: bytes.len(),
        _temp_dir: temp_dir,
    })
}
