//! SEO Analyzer: topic research reports from live search results
//!
//! This crate turns a topic and a target audience into an analytical report by
//! running three provider calls in sequence: a search query, a bounded
//! concurrent fetch of the result pages, and a text-generation analysis. Runs
//! can be driven synchronously or tracked as background jobs.

pub mod analysis;
pub mod config;
pub mod fetch;
pub mod jobs;
pub mod model;
pub mod pipeline;
pub mod retry;
pub mod search;
pub mod server;
pub mod storage;

use thiserror::Error;

/// Main error type for SEO Analyzer operations
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Search provider error: {0}")]
    Search(#[from] SearchError),

    #[error("Analysis provider error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Pipeline exceeded its {budget_secs}s budget")]
    BudgetExceeded { budget_secs: u64 },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalyzerError {
    /// Builds a validation error for a request field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "INVALID_INPUT",
            Self::Search(SearchError::Auth(_)) => "SERP_AUTH_ERROR",
            Self::Search(SearchError::RateLimited(_)) => "SERP_RATE_LIMITED",
            Self::Search(SearchError::Failed(_)) => "SERP_API_ERROR",
            Self::Analysis(AnalysisError::SizeLimit { .. }) => "AI_SIZE_LIMIT",
            Self::Analysis(AnalysisError::Timeout(_)) => "AI_TIMEOUT",
            Self::Analysis(_) => "AI_API_ERROR",
            Self::BudgetExceeded { .. } => "PIPELINE_TIMEOUT",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Storage(_) | Self::Http(_) | Self::Io(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status equivalent of this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Search(_) | Self::Analysis(_) => 503,
            Self::BudgetExceeded { .. } => 504,
            Self::Config(_) | Self::Storage(_) | Self::Http(_) | Self::Io(_) | Self::Internal(_) => {
                500
            }
        }
    }

    /// Short name of the error class, reported alongside the code
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::Search(_) => "SearchProviderError",
            Self::Analysis(AnalysisError::SizeLimit { .. }) => "AnalysisSizeLimitError",
            Self::Analysis(AnalysisError::Timeout(_)) => "AnalysisTimeoutError",
            Self::Analysis(_) => "AnalysisProviderError",
            Self::BudgetExceeded { .. } => "BudgetExceededError",
            Self::Config(_) => "ConfigError",
            Self::Storage(_) => "StorageError",
            Self::Http(_) => "HttpClientError",
            Self::Io(_) => "IoError",
            Self::Internal(_) => "InternalError",
        }
    }
}

/// Search provider failures
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("API key rejected: {0}")]
    Auth(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("search failed: {0}")]
    Failed(String),
}

/// Generation provider failures
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("prompt needs {estimated} work units after truncation, ceiling is {ceiling}")]
    SizeLimit { estimated: usize, ceiling: usize },

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("provider returned no content")]
    EmptyResponse,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for SEO Analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use jobs::{JobRecord, JobStatus, JobTracker};
pub use model::{AnalysisOptions, AnalysisReport, AnalysisRequest, ErrorInfo};
pub use pipeline::Pipeline;
