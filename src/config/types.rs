use serde::Deserialize;

/// Main configuration structure for SEO Analyzer
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; "*" allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Search provider configuration (SerpAPI-compatible)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SearchConfig {
    /// API key; falls back to the SERPAPI_API_KEY environment variable when empty
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    #[serde(default = "default_engine")]
    pub engine: String,

    #[serde(default = "default_location")]
    pub location: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Number of results requested per search
    #[serde(default = "default_result_count")]
    pub result_count: u32,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff (milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_search_base_url(),
            engine: default_engine(),
            location: default_location(),
            language: default_language(),
            result_count: default_result_count(),
            timeout_secs: default_search_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Page fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Per-attempt timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of fetches in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: u32,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff (milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            max_concurrent: default_max_concurrent(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

/// Generation provider configuration (OpenAI or Azure OpenAI chat completions)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalysisConfig {
    /// API key; falls back to the ANALYSIS_API_KEY environment variable when empty
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the provider, e.g. "https://api.openai.com/v1"
    pub endpoint: String,

    /// Model name, or deployment name for Azure
    #[serde(default = "default_model")]
    pub model: String,

    /// When set, requests use the Azure deployment URL form
    #[serde(default)]
    pub api_version: Option<String>,

    /// Total token budget shared by prompt and response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum estimated prompt size in work units
    #[serde(default = "default_input_ceiling")]
    pub input_ceiling: usize,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_analysis_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for backoff (milliseconds)
    #[serde(default = "default_analysis_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Pipeline budget and soft performance thresholds (seconds)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Hard wall-clock budget for one run
    #[serde(default = "default_budget")]
    pub budget_secs: u64,

    #[serde(default = "default_search_threshold")]
    pub search_threshold_secs: f64,

    #[serde(default = "default_fetch_threshold")]
    pub fetch_threshold_secs: f64,

    #[serde(default = "default_analyze_threshold")]
    pub analyze_threshold_secs: f64,

    #[serde(default = "default_total_threshold")]
    pub total_threshold_secs: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            budget_secs: default_budget(),
            search_threshold_secs: default_search_threshold(),
            fetch_threshold_secs: default_fetch_threshold(),
            analyze_threshold_secs: default_analyze_threshold(),
            total_threshold_secs: default_total_threshold(),
        }
    }
}

/// Job tracking configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobsConfig {
    /// How long job records are kept after creation
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            retention_hours: default_retention_hours(),
        }
    }
}

/// Report cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Path to the SQLite database file
    #[serde(default = "default_cache_path")]
    pub database_path: String,

    /// Seconds a cached report stays valid
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            database_path: default_cache_path(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_search_base_url() -> String {
    "https://serpapi.com".to_string()
}

fn default_engine() -> String {
    "google".to_string()
}

fn default_location() -> String {
    "United States".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_result_count() -> u32 {
    10
}

fn default_search_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_max_concurrent() -> u32 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; SEOAnalyzer/1.0)".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    8000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_input_ceiling() -> usize {
    6000
}

fn default_analysis_timeout() -> u64 {
    60
}

fn default_analysis_retry_delay_ms() -> u64 {
    2000
}

fn default_budget() -> u64 {
    60
}

fn default_search_threshold() -> f64 {
    15.0
}

fn default_fetch_threshold() -> f64 {
    25.0
}

fn default_analyze_threshold() -> f64 {
    35.0
}

fn default_total_threshold() -> f64 {
    55.0
}

fn default_retention_hours() -> u64 {
    24
}

fn default_cache_path() -> String {
    "./seo-analyzer-cache.db".to_string()
}

fn default_cache_ttl() -> u64 {
    3600
}
