//! Page fetching
//!
//! [`HttpFetcher`] fetches one URL and extracts its SEO fields;
//! [`FetchCoordinator`] runs many fetches under a concurrency ceiling and
//! aggregates them into a [`FetchSummary`].

mod coordinator;
mod extract;
mod fetcher;

pub use coordinator::{
    FetchCoordinator, FetchFailure, FetchHealth, FetchOverview, FetchSummary, DEGRADED_RATIO,
};
pub use extract::{collapse_whitespace, count_words, extract_page, PageContent};
pub use fetcher::{build_http_client, FetchErrorKind, FetchedPage, HttpFetcher, PageFetcher};
