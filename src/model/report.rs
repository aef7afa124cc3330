use crate::fetch::FetchOverview;
use crate::pipeline::StageTimings;
use crate::AnalyzerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Assembled result of one successful pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub topic: String,
    pub audience: String,

    /// Normalized report text returned by the generation provider
    pub report_text: String,

    /// Provider-reported usage (tokens), 0 when not reported
    pub usage_units: u64,

    pub total_elapsed_seconds: f64,
    pub timings: StageTimings,
    pub fetch: FetchOverview,
    pub generated_at: DateTime<Utc>,

    /// True when served from the report cache instead of a fresh run
    #[serde(default)]
    pub cached: bool,
}

/// Serializable description of a failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    pub error_type: String,
    pub elapsed_seconds: f64,
    pub timestamp: DateTime<Utc>,
}

impl ErrorInfo {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        error_type: impl Into<String>,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            error_type: error_type.into(),
            elapsed_seconds,
            timestamp: Utc::now(),
        }
    }

    /// Renders an error with the time spent before it surfaced
    pub fn from_error(err: &AnalyzerError, elapsed_seconds: f64) -> Self {
        Self::new(err.code(), err.to_string(), err.error_type(), elapsed_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SearchError;

    #[test]
    fn test_error_info_from_error() {
        let err = AnalyzerError::from(SearchError::Auth("Invalid API key".into()));
        let info = ErrorInfo::from_error(&err, 1.25);

        assert_eq!(info.code, "SERP_AUTH_ERROR");
        assert_eq!(info.error_type, "SearchProviderError");
        assert!(info.message.contains("Invalid API key"));
        assert_eq!(info.elapsed_seconds, 1.25);
    }

    #[test]
    fn test_error_info_timestamp_is_rfc3339() {
        let info = ErrorInfo::new("JOB_NOT_FOUND", "no such job", "NotFound", 0.0);
        let json = serde_json::to_value(&info).unwrap();

        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }
}
