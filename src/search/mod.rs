//! Search result retrieval
//!
//! [`SearchClient`] is the seam the pipeline searches through;
//! [`SerpApiClient`] talks to a SerpAPI-compatible endpoint.

mod serpapi;

pub use serpapi::{classify_message, parse_response, SerpApiClient};

use crate::SearchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One organic search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultItem {
    /// 1-based position on the result page
    pub rank: u32,
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Normalized response of one search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub items: Vec<SearchResultItem>,
    /// Provider estimate of the total number of matches
    pub total_estimate: u64,
    pub related_searches: Vec<String>,
}

/// Retrieves ranked results for a topic
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Runs one search, retrying transient failures internally
    ///
    /// An empty result set is not an error.
    async fn search(&self, topic: &str, count: u32) -> Result<SearchResults, SearchError>;

    /// Checks the provider is reachable and the credentials are accepted
    ///
    /// Must not spend search quota.
    async fn probe(&self) -> Result<(), SearchError> {
        Ok(())
    }
}
