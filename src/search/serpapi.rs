use crate::config::SearchConfig;
use crate::retry::{Backoff, RetryPolicy};
use crate::search::{SearchClient, SearchResultItem, SearchResults};
use crate::SearchError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Upper bound the provider accepts for `num`
const MAX_RESULTS_PER_QUERY: u32 = 100;

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    organic_results: Vec<RawOrganicResult>,
    #[serde(default)]
    related_searches: Vec<RawRelatedSearch>,
    #[serde(default)]
    search_information: Option<RawSearchInformation>,
}

#[derive(Debug, Deserialize)]
struct RawOrganicResult {
    position: Option<u32>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct RawRelatedSearch {
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSearchInformation {
    total_results: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawErrorBody {
    error: Option<String>,
}

/// Maps a provider error message to a [`SearchError`]
///
/// # Classification
///
/// | Message contains | Error |
/// |------------------|-------|
/// | `Invalid API key` | `Auth` |
/// | `rate limit` (any case) | `RateLimited` |
/// | anything else | `Failed` |
pub fn classify_message(message: &str) -> SearchError {
    if message.contains("Invalid API key") {
        SearchError::Auth(message.to_string())
    } else if message.to_lowercase().contains("rate limit") {
        SearchError::RateLimited(message.to_string())
    } else {
        SearchError::Failed(message.to_string())
    }
}

/// Parses a successful provider response body
///
/// An `error` field in the body is classified like an HTTP failure.
pub fn parse_response(body: &str) -> Result<SearchResults, SearchError> {
    let raw: RawResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::Failed(format!("Malformed search response: {}", e)))?;

    if let Some(message) = raw.error {
        return Err(classify_message(&message));
    }

    let items: Vec<SearchResultItem> = raw
        .organic_results
        .into_iter()
        .enumerate()
        .map(|(index, result)| SearchResultItem {
            rank: result
                .position
                .filter(|p| *p > 0)
                .unwrap_or(index as u32 + 1),
            title: result.title,
            url: result.link,
            snippet: result.snippet,
        })
        .collect();

    let total_estimate = raw
        .search_information
        .and_then(|info| info.total_results)
        .and_then(|value| parse_total(&value))
        .unwrap_or(items.len() as u64);

    let related_searches = raw
        .related_searches
        .into_iter()
        .filter_map(|related| related.query)
        .collect();

    Ok(SearchResults {
        items,
        total_estimate,
        related_searches,
    })
}

/// Accepts `1234`, `"1,234"` and `"約 1,234"`
fn parse_total(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .ok(),
        _ => None,
    }
}

/// Country code sent as `gl`
fn country_code(location: &str) -> &'static str {
    match location {
        "Taiwan" => "tw",
        _ => "us",
    }
}

/// [`SearchClient`] for SerpAPI-compatible endpoints
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 401 / 403, "Invalid API key" | Immediate → `Auth` |
/// | HTTP 429, "rate limit" | Immediate → `RateLimited` |
/// | Timeout, connection error, 5xx, malformed body | Retry with exponential backoff |
pub struct SerpApiClient {
    client: Client,
    config: SearchConfig,
    retry: RetryPolicy,
}

impl SerpApiClient {
    pub fn new(config: SearchConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let retry = RetryPolicy::new(
            config.max_attempts,
            Duration::from_millis(config.retry_delay_ms),
        );

        Ok(Self {
            client,
            config,
            retry,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn attempt(&self, topic: &str, count: u32) -> Result<SearchResults, SearchError> {
        let num = count.min(MAX_RESULTS_PER_QUERY).to_string();
        let params = [
            ("q", topic),
            ("engine", self.config.engine.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("num", num.as_str()),
            ("hl", self.config.language.as_str()),
            ("gl", country_code(&self.config.location)),
            ("location", self.config.location.as_str()),
        ];

        let response = self
            .client
            .get(self.endpoint("search.json"))
            .query(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        parse_response(&body)
    }
}

fn transport_error(err: reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Failed(format!("Search request timed out: {}", err))
    } else {
        SearchError::Failed(format!("Search request failed: {}", err))
    }
}

fn status_error(status: StatusCode, body: &str) -> SearchError {
    let message = serde_json::from_str::<RawErrorBody>(body)
        .ok()
        .and_then(|raw| raw.error)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SearchError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => SearchError::RateLimited(message),
        _ => match classify_message(&message) {
            SearchError::Failed(message) => {
                SearchError::Failed(format!("HTTP {}: {}", status.as_u16(), message))
            }
            other => other,
        },
    }
}

#[async_trait]
impl SearchClient for SerpApiClient {
    async fn search(&self, topic: &str, count: u32) -> Result<SearchResults, SearchError> {
        tracing::debug!(topic, count, "Searching");

        let results = self
            .retry
            .run(
                "search",
                |_| self.attempt(topic, count),
                |err| match err {
                    SearchError::Failed(_) => Some(Backoff::Exponential),
                    SearchError::Auth(_) | SearchError::RateLimited(_) => None,
                },
            )
            .await?;

        tracing::info!(
            topic,
            results = results.items.len(),
            total_estimate = results.total_estimate,
            "Search completed"
        );
        Ok(results)
    }

    async fn probe(&self) -> Result<(), SearchError> {
        let response = self
            .client
            .get(self.endpoint("account.json"))
            .query(&[("api_key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}
