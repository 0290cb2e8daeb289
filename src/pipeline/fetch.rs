//! HTTP fetch with bounded retry and exponential backoff.
//!
//! ## Retry Strategy
//!
//! Wikipedia answers bursts with HTTP 429 and renders PDFs on demand, which
//! occasionally yields 5xx. Both are transient, as are connection errors and
//! timeouts. Those are retried up to `max_retries` times with a delay of
//! `min(retry_backoff_ms * 2^k, max_backoff_ms)` before retry `k`; with the
//! defaults that is 1 s → 2 s → 4 s → 8 s. Any other error status fails at
//! once, since asking again cannot turn a 404 into a page.

use crate::config::ConversionConfig;
use crate::error::Wiki2MdError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL};
use reqwest::StatusCode;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// `Accept` header for article pages.
pub const ACCEPT_HTML: &str = "text/html,application/pdf;q=0.9,*/*;q=0.8";

/// `Accept` header for the PDF rendition.
pub const ACCEPT_PDF: &str = "application/pdf";

/// Status codes worth asking again for.
pub const RETRY_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

/// Timeout and backoff settings for one kind of request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl FetchPolicy {
    /// Policy for the article HTML.
    pub fn html(config: &ConversionConfig) -> Self {
        Self::with_timeout(config, config.html_timeout_secs)
    }

    /// Policy for the PDF rendition.
    pub fn pdf(config: &ConversionConfig) -> Self {
        Self::with_timeout(config, config.pdf_timeout_secs)
    }

    fn with_timeout(config: &ConversionConfig, timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            max_retries: config.max_retries,
            backoff_ms: config.retry_backoff_ms,
            max_backoff_ms: config.max_backoff_ms,
        }
    }

    /// Delay before retry `k` (0-based).
    pub fn backoff(&self, k: u32) -> Duration {
        let ms = self
            .backoff_ms
            .saturating_mul(2u64.saturating_pow(k))
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    RETRY_STATUS.contains(&status.as_u16())
}

/// Build the shared HTTP client with the polite default headers.
pub fn build_client(config: &ConversionConfig) -> Result<reqwest::Client, Wiki2MdError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .build()
        .map_err(|e| Wiki2MdError::Internal(format!("Failed to build HTTP client: {e}")))
}

/// Why the last attempt failed.
enum Attempt {
    Timeout,
    Transient(String),
}

/// GET `url` and return the body, retrying transient failures.
pub async fn fetch_bytes(
    client: &reqwest::Client,
    url: &str,
    accept: &str,
    policy: &FetchPolicy,
) -> Result<Vec<u8>, Wiki2MdError> {
    let mut last = Attempt::Transient("no attempt made".to_string());

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.backoff(attempt - 1);
            warn!(
                "GET {}: retry {}/{} after {}ms",
                url,
                attempt,
                policy.max_retries,
                delay.as_millis()
            );
            sleep(delay).await;
        }

        let sent = client
            .get(url)
            .header(ACCEPT, accept)
            .timeout(Duration::from_secs(policy.timeout_secs))
            .send()
            .await;

        let response = match sent {
            Ok(r) => r,
            Err(e) => {
                warn!("GET {}: attempt {} failed: {}", url, attempt + 1, e);
                last = classify(e);
                continue;
            }
        };

        let status = response.status();
        if is_retryable_status(status) {
            warn!("GET {}: attempt {} got HTTP {}", url, attempt + 1, status);
            last = Attempt::Transient(format!("HTTP {status}"));
            continue;
        }
        if !status.is_success() {
            return Err(Wiki2MdError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        match response.bytes().await {
            Ok(body) => {
                debug!("GET {}: {} bytes", url, body.len());
                return Ok(body.to_vec());
            }
            Err(e) => {
                warn!("GET {}: reading body failed: {}", url, e);
                last = classify(e);
            }
        }
    }

    let attempts = policy.max_retries + 1;
    Err(match last {
        Attempt::Timeout => Wiki2MdError::FetchTimeout {
            url: url.to_string(),
            secs: policy.timeout_secs,
            attempts,
        },
        Attempt::Transient(reason) => Wiki2MdError::FetchFailed {
            url: url.to_string(),
            attempts,
            reason,
        },
    })
}

fn classify(e: reqwest::Error) -> Attempt {
    if e.is_timeout() {
        Attempt::Timeout
    } else {
        Attempt::Transient(e.to_string())
    }
}
