//! HTTP page fetcher
//!
//! This module handles fetching a single result page, including:
//! - Building the HTTP client with browser-like headers
//! - Per-attempt timeouts and retries for transient failures
//! - Error classification into [`FetchErrorKind`]
//! - Extraction of the SEO fields on success

use crate::config::FetchConfig;
use crate::fetch::extract::{extract_page, PageContent};
use crate::retry::{Backoff, RetryPolicy};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use url::Url;

/// Why a page could not be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchErrorKind {
    /// The server answered with a non-success status
    Http,
    /// No response within the per-attempt timeout
    Timeout,
    /// Connection, TLS, redirect or body read failure
    Transport,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Http => "http",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of fetching one URL
///
/// A failed page carries an error and no content fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedPage {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub primary_heading: Option<String>,
    pub sub_headings: Vec<String>,
    pub word_count: usize,
    pub structural_units: usize,

    /// HTTP status of the last response, 0 when none was received
    pub http_status: u16,
    pub elapsed_seconds: f64,
    pub success: bool,
    pub error: Option<String>,
    pub error_kind: Option<FetchErrorKind>,
}

impl FetchedPage {
    /// Builds a successful page from extracted content
    pub fn from_content(
        url: impl Into<String>,
        http_status: u16,
        content: PageContent,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            url: url.into(),
            title: content.title,
            description: content.description,
            primary_heading: content.primary_heading,
            sub_headings: content.sub_headings,
            word_count: content.word_count,
            structural_units: content.structural_units,
            http_status,
            elapsed_seconds,
            success: true,
            error: None,
            error_kind: None,
        }
    }

    /// Builds a failed page; content fields stay empty
    pub fn failed(
        url: impl Into<String>,
        http_status: u16,
        kind: FetchErrorKind,
        error: impl Into<String>,
        elapsed_seconds: f64,
    ) -> Self {
        let mut error = error.into();
        if error.is_empty() {
            error = format!("{} error", kind);
        }

        Self {
            url: url.into(),
            title: None,
            description: None,
            primary_heading: None,
            sub_headings: Vec::new(),
            word_count: 0,
            structural_units: 0,
            http_status,
            elapsed_seconds,
            success: false,
            error: Some(error),
            error_kind: Some(kind),
        }
    }
}

/// Fetches a single page
///
/// Implementations never fail: every problem is reported inside the returned
/// [`FetchedPage`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchedPage;
}

/// Builds the HTTP client used for page fetches
///
/// # Arguments
///
/// * `config` - The fetch configuration (user agent and per-attempt timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9,zh-TW;q=0.8"),
    );

    let timeout = Duration::from_secs(config.timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Failure of a single attempt, before it becomes page data
#[derive(Debug)]
enum AttemptError {
    Status(u16),
    Timeout(String),
    Transport(String),
}

impl AttemptError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(format!("Request timeout: {}", err))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Timeout(msg) | Self::Transport(msg) => write!(f, "{}", msg),
        }
    }
}

/// [`PageFetcher`] backed by `reqwest`
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx | Extract fields |
/// | 4xx / 5xx | No retry, `HTTP <status>` |
/// | Timeout | Retry with exponential backoff |
/// | Connection / body read error | Retry with exponential backoff |
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(
            build_http_client(config)?,
            RetryPolicy::new(
                config.max_attempts,
                Duration::from_millis(config.retry_delay_ms),
            ),
        ))
    }

    pub fn with_client(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    async fn attempt(&self, url: &str) -> Result<(u16, String), AttemptError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(AttemptError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(AttemptError::from_reqwest)?;
        Ok((status.as_u16(), body))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchedPage {
        let start = Instant::now();

        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => {
                return FetchedPage::failed(
                    url,
                    0,
                    FetchErrorKind::Transport,
                    format!("Not an absolute http(s) URL: {}", url),
                    0.0,
                );
            }
        }

        let outcome = self
            .retry
            .run(
                "fetch",
                |_| self.attempt(url),
                |err| match err {
                    AttemptError::Status(_) => None,
                    AttemptError::Timeout(_) | AttemptError::Transport(_) => {
                        Some(Backoff::Exponential)
                    }
                },
            )
            .await;

        let elapsed = start.elapsed().as_secs_f64();

        match outcome {
            Ok((status, body)) => {
                let content = extract_page(&body);
                tracing::debug!(
                    url,
                    status,
                    words = content.word_count,
                    elapsed_secs = elapsed,
                    "Fetched page"
                );
                FetchedPage::from_content(url, status, content, elapsed)
            }
            Err(err) => {
                tracing::debug!(url, error = %err, "Fetch failed");
                let (status, kind) = match &err {
                    AttemptError::Status(code) => (*code, FetchErrorKind::Http),
                    AttemptError::Timeout(_) => (0, FetchErrorKind::Timeout),
                    AttemptError::Transport(_) => (0, FetchErrorKind::Transport),
                };
                FetchedPage::failed(url, status, kind, err.to_string(), elapsed)
            }
        }
    }
}
