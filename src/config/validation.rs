use crate::config::types::{
    AnalysisConfig, CacheConfig, Config, FetchConfig, PipelineConfig, SearchConfig, ServerConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_search_config(&config.search)?;
    validate_fetch_config(&config.fetch)?;
    validate_analysis_config(&config.analysis)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_cache_config(&config.cache)?;

    if config.jobs.retention_hours < 1 {
        return Err(ConfigError::Validation(
            "retention_hours must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.host.is_empty() {
        return Err(ConfigError::Validation("host cannot be empty".to_string()));
    }

    for origin in &config.cors_origins {
        if origin != "*" {
            Url::parse(origin).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid CORS origin '{}': {}", origin, e))
            })?;
        }
    }

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.api_key.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search api_key is not set".to_string(),
        ));
    }

    validate_http_url("search base_url", &config.base_url)?;

    if config.result_count < 1 || config.result_count > 100 {
        return Err(ConfigError::Validation(format!(
            "result_count must be between 1 and 100, got {}",
            config.result_count
        )));
    }

    validate_attempts("search", config.max_attempts)?;
    validate_timeout("search", config.timeout_secs)?;

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    validate_attempts("fetch", config.max_attempts)?;
    validate_timeout("fetch", config.timeout_secs)?;

    Ok(())
}

fn validate_analysis_config(config: &AnalysisConfig) -> Result<(), ConfigError> {
    if config.api_key.trim().is_empty() {
        return Err(ConfigError::Validation(
            "analysis api_key is not set".to_string(),
        ));
    }

    validate_http_url("analysis endpoint", &config.endpoint)?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "temperature must be between 0.0 and 2.0, got {}",
            config.temperature
        )));
    }

    if config.input_ceiling < 100 {
        return Err(ConfigError::Validation(format!(
            "input_ceiling must be >= 100, got {}",
            config.input_ceiling
        )));
    }

    if config.max_tokens as usize <= config.input_ceiling {
        return Err(ConfigError::Validation(format!(
            "max_tokens ({}) must exceed input_ceiling ({}) to leave room for the response",
            config.max_tokens, config.input_ceiling
        )));
    }

    validate_attempts("analysis", config.max_attempts)?;
    validate_timeout("analysis", config.timeout_secs)?;

    Ok(())
}

fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.budget_secs < 1 {
        return Err(ConfigError::Validation(
            "budget_secs must be >= 1".to_string(),
        ));
    }

    let thresholds = [
        ("search_threshold_secs", config.search_threshold_secs),
        ("fetch_threshold_secs", config.fetch_threshold_secs),
        ("analyze_threshold_secs", config.analyze_threshold_secs),
        ("total_threshold_secs", config.total_threshold_secs),
    ];
    for (name, value) in thresholds {
        if !(value > 0.0) {
            return Err(ConfigError::Validation(format!(
                "{} must be positive, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.enabled && config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "cache database_path cannot be empty when the cache is enabled".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

fn validate_attempts(section: &str, attempts: u32) -> Result<(), ConfigError> {
    if attempts < 1 || attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "{} max_attempts must be between 1 and 10, got {}",
            section, attempts
        )));
    }
    Ok(())
}

fn validate_timeout(section: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "{} timeout_secs must be >= 1",
            section
        )));
    }
    Ok(())
}
