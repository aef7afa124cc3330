//! Concurrent fetch coordination
//!
//! This module drives page fetches over a list of URLs:
//! - A semaphore admission gate bounds how many fetches are in flight
//! - All per-URL futures are polled together on the calling task
//! - Outcomes are aggregated into a [`FetchSummary`] in submission order

use crate::fetch::fetcher::{FetchErrorKind, FetchedPage, PageFetcher};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Success ratio below which a fetch run is reported as degraded
pub const DEGRADED_RATIO: f64 = 0.8;

/// One failed URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub url: String,
    pub error: String,
    pub kind: FetchErrorKind,
}

/// Overall state of a fetch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchHealth {
    Healthy,
    /// Fewer than 80% of the URLs succeeded
    Degraded,
    /// None of at least one URL succeeded
    Failed,
}

/// Aggregated outcome of fetching a URL list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchSummary {
    pub total: usize,
    pub successful: usize,
    /// Mean over successful pages, truncated; 0 when none succeeded
    pub avg_word_count: usize,
    pub avg_structural_units: usize,
    pub pages: Vec<FetchedPage>,
    pub errors: Vec<FetchFailure>,
}

/// Counts and averages of a fetch run, without page content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOverview {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub avg_word_count: usize,
    pub avg_structural_units: usize,
    pub health: FetchHealth,
}

impl FetchSummary {
    /// Aggregates pages, kept in the order given
    pub fn from_pages(pages: Vec<FetchedPage>) -> Self {
        let total = pages.len();

        let errors: Vec<FetchFailure> = pages
            .iter()
            .filter(|page| !page.success)
            .map(|page| FetchFailure {
                url: page.url.clone(),
                error: page
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
                kind: page.error_kind.unwrap_or(FetchErrorKind::Transport),
            })
            .collect();

        let successful = total - errors.len();
        let (words, units) = pages
            .iter()
            .filter(|page| page.success)
            .fold((0usize, 0usize), |(words, units), page| {
                (words + page.word_count, units + page.structural_units)
            });

        let (avg_word_count, avg_structural_units) = if successful > 0 {
            (words / successful, units / successful)
        } else {
            (0, 0)
        };

        Self {
            total,
            successful,
            avg_word_count,
            avg_structural_units,
            pages,
            errors,
        }
    }

    pub fn successful_pages(&self) -> impl Iterator<Item = &FetchedPage> {
        self.pages.iter().filter(|page| page.success)
    }

    pub fn success_ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.successful as f64 / self.total as f64
        }
    }

    pub fn health(&self) -> FetchHealth {
        if self.total > 0 && self.successful == 0 {
            FetchHealth::Failed
        } else if self.success_ratio() < DEGRADED_RATIO {
            FetchHealth::Degraded
        } else {
            FetchHealth::Healthy
        }
    }

    pub fn overview(&self) -> FetchOverview {
        FetchOverview {
            total: self.total,
            successful: self.successful,
            failed: self.errors.len(),
            avg_word_count: self.avg_word_count,
            avg_structural_units: self.avg_structural_units,
            health: self.health(),
        }
    }
}

/// Fetches URL lists with a fixed concurrency ceiling
#[derive(Clone)]
pub struct FetchCoordinator {
    fetcher: Arc<dyn PageFetcher>,
    max_concurrent: usize,
}

impl FetchCoordinator {
    /// Creates a coordinator; a ceiling of 0 is treated as 1
    pub fn new(fetcher: Arc<dyn PageFetcher>, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Fetches every URL and aggregates the outcomes
    pub async fn fetch_all(&self, urls: &[String]) -> FetchSummary {
        self.fetch_all_with_progress(urls, &|_: usize, _: usize| {})
            .await
    }

    /// Fetches every URL, calling `on_complete(completed, total)` after each
    ///
    /// Never fails: per-URL problems are recorded in the summary. A run where
    /// no URL succeeds is logged at error level, one below 80% at warn.
    ///
    /// # Arguments
    ///
    /// * `urls` - Absolute http(s) URLs, fetched independently
    /// * `on_complete` - Progress callback, invoked in completion order
    pub async fn fetch_all_with_progress(
        &self,
        urls: &[String],
        on_complete: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> FetchSummary {
        let total = urls.len();
        if total == 0 {
            tracing::info!("No URLs to fetch");
            return FetchSummary::from_pages(Vec::new());
        }

        tracing::info!(
            urls = total,
            max_concurrent = self.max_concurrent,
            "Fetching pages"
        );

        let gate = Semaphore::new(self.max_concurrent);
        let completed = AtomicUsize::new(0);

        let tasks = urls.iter().map(|url| {
            let gate = &gate;
            let completed = &completed;
            async move {
                // the gate is never closed
                let _permit = gate.acquire().await.ok();
                let page = self.fetcher.fetch(url).await;
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                on_complete(done, total);
                page
            }
        });

        let summary = FetchSummary::from_pages(join_all(tasks).await);

        match summary.health() {
            FetchHealth::Failed => tracing::error!(
                total = summary.total,
                "All page fetches failed"
            ),
            FetchHealth::Degraded => tracing::warn!(
                successful = summary.successful,
                total = summary.total,
                ratio = summary.success_ratio(),
                "Page fetch success ratio below threshold"
            ),
            FetchHealth::Healthy => tracing::info!(
                successful = summary.successful,
                total = summary.total,
                "Pages fetched"
            ),
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::extract::PageContent;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fetcher that tracks how many calls overlap
    struct InstrumentedFetcher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
        failing: Vec<String>,
    }

    impl InstrumentedFetcher {
        fn new(delay: Duration) -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                delay,
                failing: Vec::new(),
            }
        }

        fn failing(mut self, urls: &[&str]) -> Self {
            self.failing = urls.iter().map(|s| s.to_string()).collect();
            self
        }
    }

    #[async_trait]
    impl PageFetcher for InstrumentedFetcher {
        async fn fetch(&self, url: &str) -> FetchedPage {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.iter().any(|f| f == url) {
                FetchedPage::failed(url, 500, FetchErrorKind::Http, "HTTP 500", 0.0)
            } else {
                let content = PageContent {
                    word_count: 100,
                    structural_units: 4,
                    ..PageContent::default()
                };
                FetchedPage::from_content(url, 200, content, 0.0)
            }
        }
    }

    fn urls(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("https://site{}.test/page", i))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_never_exceeds_ceiling() {
        let fetcher = Arc::new(InstrumentedFetcher::new(Duration::from_millis(100)));
        let coordinator = FetchCoordinator::new(fetcher.clone(), 3);

        let summary = coordinator.fetch_all(&urls(10)).await;

        assert_eq!(summary.total, 10);
        assert_eq!(summary.successful, 10);
        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wall_clock_scales_with_batches() {
        let fetcher = Arc::new(InstrumentedFetcher::new(Duration::from_secs(1)));
        let coordinator = FetchCoordinator::new(fetcher, 5);
        let start = tokio::time::Instant::now();

        coordinator.fetch_all(&urls(20)).await;

        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_partial_failure_accounting() {
        let fetcher = Arc::new(
            InstrumentedFetcher::new(Duration::ZERO)
                .failing(&["https://site1.test/page", "https://site3.test/page"]),
        );
        let coordinator = FetchCoordinator::new(fetcher, 10);

        let summary = coordinator.fetch_all(&urls(5)).await;

        assert_eq!(summary.total, 5);
        assert_eq!(summary.successful, 3);
        assert_eq!(summary.successful + summary.errors.len(), summary.total);
        assert_eq!(summary.pages.len(), summary.total);
        assert_eq!(summary.errors[0].url, "https://site1.test/page");
        assert_eq!(summary.errors[1].url, "https://site3.test/page");
        assert_eq!(summary.avg_word_count, 100);
        assert_eq!(summary.avg_structural_units, 4);
        assert_eq!(summary.health(), FetchHealth::Degraded);

        // Pages are reported in submission order
        let order: Vec<&str> = summary.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(order, urls(5));
    }

    #[tokio::test]
    async fn test_all_failed() {
        let fetcher = Arc::new(
            InstrumentedFetcher::new(Duration::ZERO).failing(&["https://site0.test/page"]),
        );
        let coordinator = FetchCoordinator::new(fetcher, 2);

        let summary = coordinator.fetch_all(&urls(1)).await;

        assert_eq!(summary.successful, 0);
        assert_eq!(summary.avg_word_count, 0);
        assert_eq!(summary.health(), FetchHealth::Failed);
        assert_eq!(summary.overview().failed, 1);
    }

    #[tokio::test]
    async fn test_zero_urls() {
        let fetcher = Arc::new(InstrumentedFetcher::new(Duration::ZERO));
        let coordinator = FetchCoordinator::new(fetcher.clone(), 10);

        let summary = coordinator.fetch_all(&[]).await;

        assert_eq!(summary.total, 0);
        assert_eq!(summary.successful, 0);
        assert!(summary.errors.is_empty());
        assert_eq!(summary.health(), FetchHealth::Healthy);
        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_progress_callback_counts_up() {
        let fetcher = Arc::new(InstrumentedFetcher::new(Duration::ZERO));
        let coordinator = FetchCoordinator::new(fetcher, 2);
        let seen = Mutex::new(Vec::new());

        coordinator
            .fetch_all_with_progress(&urls(4), &|done: usize, total: usize| {
                seen.lock().unwrap().push((done, total));
            })
            .await;

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[test]
    fn test_zero_ceiling_becomes_one() {
        let fetcher = Arc::new(InstrumentedFetcher::new(Duration::ZERO));
        assert_eq!(FetchCoordinator::new(fetcher, 0).max_concurrent(), 1);
    }

    #[test]
    fn test_health_threshold() {
        let ok = FetchedPage::from_content("https://a.test", 200, PageContent::default(), 0.0);
        let bad = FetchedPage::failed("https://b.test", 0, FetchErrorKind::Timeout, "t", 0.0);

        let mut pages = vec![ok.clone(); 4];
        pages.push(bad.clone());
        // exactly 80% is healthy
        assert_eq!(FetchSummary::from_pages(pages).health(), FetchHealth::Healthy);

        let pages = vec![ok.clone(), ok, bad.clone(), bad];
        assert_eq!(FetchSummary::from_pages(pages).health(), FetchHealth::Degraded);
    }
}
