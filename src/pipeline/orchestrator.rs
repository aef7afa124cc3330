//! End-to-end analysis run: cache, search, fetch, analyze

use crate::analysis::AnalysisClient;
use crate::config::{Config, PipelineConfig};
use crate::fetch::{FetchCoordinator, HttpFetcher};
use crate::model::{AnalysisReport, AnalysisRequest};
use crate::pipeline::progress::{fetch_percent, MonotonicProgress, NoProgress, ProgressReporter};
use crate::pipeline::timing::{Stage, StageTimer, Thresholds};
use crate::search::{SearchClient, SearchResults, SerpApiClient};
use crate::storage::{cache_key, open_cache, ReportCache};
use crate::{AnalyzerError, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Result URLs that can be fetched: absolute http(s) only, in rank order
pub fn fetchable_urls(search: &SearchResults) -> Vec<String> {
    search
        .items
        .iter()
        .filter(|item| {
            Url::parse(&item.url)
                .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
                .unwrap_or(false)
        })
        .map(|item| item.url.clone())
        .collect()
}

/// Runs search, fetch and analysis in sequence for one request
///
/// # State Machine
///
/// ```text
/// [cache] -> search -> fetch -> analyze -> done
///                |                 |
///                +----> failed <---+
/// ```
///
/// The fetch stage never fails; per-page problems are carried in the summary.
/// Any other stage error aborts the run and is returned unchanged. The whole
/// run is bounded by `pipeline.budget-secs`.
#[derive(Clone)]
pub struct Pipeline {
    search: Arc<dyn SearchClient>,
    fetch: FetchCoordinator,
    analysis: AnalysisClient,
    cache: Option<Arc<dyn ReportCache>>,
    config: PipelineConfig,
    result_count: u32,
}

impl Pipeline {
    pub fn new(
        search: Arc<dyn SearchClient>,
        fetch: FetchCoordinator,
        analysis: AnalysisClient,
        config: PipelineConfig,
        result_count: u32,
    ) -> Self {
        Self {
            search,
            fetch,
            analysis,
            cache: None,
            config,
            result_count,
        }
    }

    /// Enables report caching through `cache`
    pub fn with_cache(mut self, cache: Arc<dyn ReportCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Builds the pipeline over the HTTP providers and the configured cache
    pub fn from_config(config: &Config) -> Result<Self> {
        let search = SerpApiClient::new(config.search.clone())?;
        let fetcher = HttpFetcher::new(&config.fetch)?;
        let analysis = AnalysisClient::from_config(&config.analysis)?;

        let pipeline = Self::new(
            Arc::new(search),
            FetchCoordinator::new(Arc::new(fetcher), config.fetch.max_concurrent as usize),
            analysis,
            config.pipeline.clone(),
            config.search.result_count,
        );

        Ok(match open_cache(&config.cache)? {
            Some(cache) => pipeline.with_cache(cache),
            None => pipeline,
        })
    }

    pub fn search_client(&self) -> &dyn SearchClient {
        self.search.as_ref()
    }

    pub fn analysis_client(&self) -> &AnalysisClient {
        &self.analysis
    }

    pub fn fetch_coordinator(&self) -> &FetchCoordinator {
        &self.fetch
    }

    pub fn cache(&self) -> Option<&dyn ReportCache> {
        self.cache.as_deref()
    }

    pub fn budget(&self) -> Duration {
        Duration::from_secs(self.config.budget_secs)
    }

    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        self.run_with_progress(request, &NoProgress).await
    }

    /// Runs the pipeline, reporting progress as stages start and finish
    ///
    /// # Returns
    ///
    /// * `Ok(AnalysisReport)` - Fresh report, or a cached one with `cached = true`
    /// * `Err(AnalyzerError)` - The first stage error, or `BudgetExceeded`
    pub async fn run_with_progress(
        &self,
        request: &AnalysisRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<AnalysisReport> {
        let key = cache_key(request.topic());
        if let Some(mut report) = self.cached_report(&key) {
            tracing::info!(topic = request.topic(), "Serving cached report");
            report.cached = true;
            return Ok(report);
        }

        let started = Instant::now();
        let progress = MonotonicProgress::new(progress);

        let report = match tokio::time::timeout(self.budget(), self.run_stages(request, &progress))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                let err = AnalyzerError::BudgetExceeded {
                    budget_secs: self.config.budget_secs,
                };
                tracing::error!(
                    topic = request.topic(),
                    code = err.code(),
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "Pipeline run exceeded its budget"
                );
                return Err(err);
            }
        };

        self.store_report(&key, &report);
        Ok(report)
    }

    async fn run_stages(
        &self,
        request: &AnalysisRequest,
        progress: &MonotonicProgress<'_>,
    ) -> Result<AnalysisReport> {
        let topic = request.topic();
        let audience = request.audience();
        let mut timer = StageTimer::start();

        tracing::info!(topic, audience, "Pipeline run started");

        // Stage 1: search
        progress.report(Stage::Search.phase(), "Searching", 10);
        let search = timer
            .time(Stage::Search, self.search.search(topic, self.result_count))
            .await
            .map_err(|e| stage_failed(Stage::Search, &timer, e.into()))?;
        progress.report(
            Stage::Search.phase(),
            &format!("Found {} search results", search.items.len()),
            30,
        );

        // Stage 2: fetch
        let urls = fetchable_urls(&search);
        progress.report(
            Stage::Fetch.phase(),
            &format!("Fetching {} pages", urls.len()),
            35,
        );
        let on_fetch = |done: usize, total: usize| {
            progress.report(
                Stage::Fetch.phase(),
                &format!("Fetched {}/{} pages", done, total),
                fetch_percent(done, total),
            );
        };
        let fetch = timer
            .time(
                Stage::Fetch,
                self.fetch.fetch_all_with_progress(&urls, &on_fetch),
            )
            .await;
        progress.report(
            Stage::Fetch.phase(),
            &format!("Fetched {}/{} pages", fetch.successful, fetch.total),
            60,
        );

        // Stage 3: analyze
        progress.report(Stage::Analyze.phase(), "Generating analysis", 65);
        let outcome = timer
            .time(
                Stage::Analyze,
                self.analysis
                    .analyze(topic, audience, &search, &fetch, request.options()),
            )
            .await
            .map_err(|e| stage_failed(Stage::Analyze, &timer, e.into()))?;
        progress.report(Stage::Analyze.phase(), "Analysis complete", 95);

        let timings = timer.finish();
        Thresholds::from(&self.config).check(&timings);

        tracing::info!(
            topic,
            usage_units = outcome.usage_units,
            total_secs = timings.total_seconds,
            "Pipeline run completed"
        );

        Ok(AnalysisReport {
            topic: topic.to_string(),
            audience: audience.to_string(),
            report_text: outcome.report_text,
            usage_units: outcome.usage_units,
            total_elapsed_seconds: timings.total_seconds,
            timings,
            fetch: fetch.overview(),
            generated_at: Utc::now(),
            cached: false,
        })
    }

    fn cached_report(&self, key: &str) -> Option<AnalysisReport> {
        let cache = self.cache.as_ref()?;
        match cache.get(key) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "Report cache lookup failed");
                None
            }
        }
    }

    fn store_report(&self, key: &str, report: &AnalysisReport) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(key, report) {
                tracing::warn!(error = %e, "Report cache write failed");
            }
        }
    }
}

fn stage_failed(stage: Stage, timer: &StageTimer, err: AnalyzerError) -> AnalyzerError {
    tracing::error!(
        stage = %stage,
        code = err.code(),
        elapsed_secs = timer.elapsed_secs(),
        error = %err,
        "Pipeline stage failed"
    );
    err
}
