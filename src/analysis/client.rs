use crate::analysis::normalize::normalize_report;
use crate::analysis::prompt::{
    build_prompt, estimate_units, FetchDigest, REQUIRED_SECTIONS, TRUNCATED_HEADINGS,
    TRUNCATED_PAGES,
};
use crate::analysis::provider::{ChatCompletionsProvider, GenerationProvider, GenerationRequest};
use crate::config::AnalysisConfig;
use crate::fetch::FetchSummary;
use crate::model::AnalysisOptions;
use crate::retry::{Backoff, RetryPolicy};
use crate::search::SearchResults;
use crate::AnalysisError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Successful analysis
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub report_text: String,
    pub usage_units: u64,
    pub elapsed_seconds: f64,
}

/// Runs the analysis stage against a [`GenerationProvider`]
///
/// # Size Budget
///
/// The prompt is estimated in work units before sending. Over the ceiling, it
/// is rebuilt with at most 3 pages and 5 sub-headings per page; still over,
/// the call fails with [`AnalysisError::SizeLimit`] and nothing is sent.
///
/// # Retry Logic
///
/// | Error | Action |
/// |-------|--------|
/// | `RateLimited` | Exponential backoff |
/// | `Timeout` | Fixed backoff |
/// | anything else | No retry |
#[derive(Clone)]
pub struct AnalysisClient {
    provider: Arc<dyn GenerationProvider>,
    retry: RetryPolicy,
    max_tokens: u32,
    temperature: f32,
    input_ceiling: usize,
}

impl AnalysisClient {
    pub fn new(provider: Arc<dyn GenerationProvider>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            retry: RetryPolicy::new(
                config.max_attempts,
                Duration::from_millis(config.retry_delay_ms),
            ),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            input_ceiling: config.input_ceiling,
        }
    }

    /// Builds a client over [`ChatCompletionsProvider`]
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, reqwest::Error> {
        let provider = ChatCompletionsProvider::new(config)?;
        Ok(Self::new(Arc::new(provider), config))
    }

    pub async fn probe(&self) -> Result<(), AnalysisError> {
        self.provider.probe().await
    }

    /// Builds the prompt, applying truncation when it exceeds the ceiling
    ///
    /// # Returns
    ///
    /// * `Ok((prompt, estimate))` - A prompt within the ceiling
    /// * `Err(AnalysisError::SizeLimit)` - Too large even after truncation
    pub fn prepare_prompt(
        &self,
        topic: &str,
        audience: &str,
        search: &SearchResults,
        fetch: &FetchSummary,
        options: AnalysisOptions,
    ) -> Result<(String, usize), AnalysisError> {
        let digest = FetchDigest::from_summary(fetch);
        let prompt = build_prompt(topic, audience, search, &digest, options);
        let estimate = estimate_units(&prompt);
        if estimate <= self.input_ceiling {
            return Ok((prompt, estimate));
        }

        tracing::info!(
            estimate,
            ceiling = self.input_ceiling,
            "Prompt over size ceiling, truncating page data"
        );

        let digest = digest.truncated(TRUNCATED_PAGES, TRUNCATED_HEADINGS);
        let prompt = build_prompt(topic, audience, search, &digest, options);
        let estimate = estimate_units(&prompt);
        if estimate <= self.input_ceiling {
            return Ok((prompt, estimate));
        }

        Err(AnalysisError::SizeLimit {
            estimated: estimate,
            ceiling: self.input_ceiling,
        })
    }

    /// Generates the report for one pipeline run
    pub async fn analyze(
        &self,
        topic: &str,
        audience: &str,
        search: &SearchResults,
        fetch: &FetchSummary,
        options: AnalysisOptions,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let start = Instant::now();
        let (prompt, estimate) = self.prepare_prompt(topic, audience, search, fetch, options)?;

        let request = GenerationRequest {
            prompt,
            max_tokens: self
                .max_tokens
                .saturating_sub(u32::try_from(estimate).unwrap_or(u32::MAX))
                .max(1),
            temperature: self.temperature,
        };

        tracing::debug!(
            estimate,
            response_budget = request.max_tokens,
            "Sending analysis request"
        );

        let generation = self
            .retry
            .run(
                "analysis",
                |_| self.provider.generate(&request),
                |err| match err {
                    AnalysisError::RateLimited(_) => Some(Backoff::Exponential),
                    AnalysisError::Timeout(_) => Some(Backoff::Fixed),
                    _ => None,
                },
            )
            .await?;

        if generation.content.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }

        let report_text = normalize_report(&generation.content);
        for section in REQUIRED_SECTIONS {
            if !report_text.contains(section) {
                tracing::warn!(section, "Report is missing an expected section");
            }
        }

        let elapsed_seconds = start.elapsed().as_secs_f64();
        tracing::info!(
            usage_units = generation.usage_units,
            chars = report_text.chars().count(),
            elapsed_secs = elapsed_seconds,
            "Analysis completed"
        );

        Ok(AnalysisOutcome {
            report_text,
            usage_units: generation.usage_units,
            elapsed_seconds,
        })
    }
}
