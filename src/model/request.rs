use crate::AnalyzerError;
use serde::{Deserialize, Serialize};

/// Longest accepted topic, in characters after trimming
pub const MAX_TOPIC_CHARS: usize = 50;

/// Longest accepted audience description, in characters after trimming
pub const MAX_AUDIENCE_CHARS: usize = 200;

/// Optional report sections requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub generate_draft: bool,
    pub include_faq: bool,
    pub include_table: bool,
}

/// Request body as received, before any validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnalysisRequest {
    #[serde(default, alias = "keyword")]
    pub topic: Option<String>,

    #[serde(default)]
    pub audience: Option<String>,

    #[serde(default)]
    pub options: Option<AnalysisOptions>,
}

impl RawAnalysisRequest {
    /// Validates the raw body and produces an immutable request
    ///
    /// Both text fields are trimmed; lengths are counted in characters, so a
    /// 50-character CJK topic is accepted.
    ///
    /// # Returns
    ///
    /// * `Ok(AnalysisRequest)` - All fields within bounds
    /// * `Err(AnalyzerError::Validation)` - The first field that failed
    pub fn validate(self) -> Result<AnalysisRequest, AnalyzerError> {
        let topic = required_text("topic", self.topic, MAX_TOPIC_CHARS)?;
        let audience = required_text("audience", self.audience, MAX_AUDIENCE_CHARS)?;

        Ok(AnalysisRequest {
            topic,
            audience,
            options: self.options.unwrap_or_default(),
        })
    }
}

fn required_text(
    field: &str,
    value: Option<String>,
    max_chars: usize,
) -> Result<String, AnalyzerError> {
    let value = value.ok_or_else(|| AnalyzerError::validation(field, "is required"))?;
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(AnalyzerError::validation(field, "must not be blank"));
    }

    let chars = trimmed.chars().count();
    if chars > max_chars {
        return Err(AnalyzerError::validation(
            field,
            format!("must be at most {} characters, got {}", max_chars, chars),
        ));
    }

    Ok(trimmed.to_string())
}

/// A validated analysis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    topic: String,
    audience: String,
    options: AnalysisOptions,
}

impl AnalysisRequest {
    /// Validates the given values; shorthand for building a [`RawAnalysisRequest`]
    pub fn new(
        topic: impl Into<String>,
        audience: impl Into<String>,
        options: AnalysisOptions,
    ) -> Result<Self, AnalyzerError> {
        RawAnalysisRequest {
            topic: Some(topic.into()),
            audience: Some(audience.into()),
            options: Some(options),
        }
        .validate()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn options(&self) -> AnalysisOptions {
        self.options
    }
}
