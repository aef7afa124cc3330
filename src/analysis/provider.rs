//! Text-generation providers
//!
//! [`ChatCompletionsProvider`] speaks the OpenAI chat completions protocol, in
//! either the plain OpenAI form or the Azure deployment form.

use crate::config::AnalysisConfig;
use crate::AnalysisError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Response token budget
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Raw provider output, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub content: String,
    pub usage_units: u64,
}

/// Generates text from a prompt
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Sends one request; retries are the caller's business
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, AnalysisError>;

    /// Checks the provider is reachable without generating anything
    async fn probe(&self) -> Result<(), AnalysisError> {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    total_tokens: u64,
}

/// OpenAI-compatible chat completions client
///
/// With `api-version` configured, requests go to
/// `{endpoint}/openai/deployments/{model}/chat/completions?api-version=V` with an
/// `api-key` header; otherwise to `{endpoint}/chat/completions` with bearer auth.
///
/// # Error Classification
///
/// | Condition | Error |
/// |-----------|-------|
/// | HTTP 429 | `RateLimited` |
/// | HTTP 408 / 504, client timeout | `Timeout` |
/// | Other non-success, connection failure, bad body | `Provider` |
pub struct ChatCompletionsProvider {
    http: Client,
    endpoint: String,
    model: String,
    api_key: String,
    api_version: Option<String>,
}

impl ChatCompletionsProvider {
    pub fn new(config: &AnalysisConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
        })
    }

    fn is_azure(&self) -> bool {
        self.api_version.is_some()
    }

    fn completions_url(&self) -> String {
        match &self.api_version {
            Some(version) => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.endpoint, self.model, version
            ),
            None => format!("{}/chat/completions", self.endpoint),
        }
    }

    fn models_url(&self) -> String {
        match &self.api_version {
            Some(version) => format!("{}/openai/models?api-version={}", self.endpoint, version),
            None => format!("{}/models", self.endpoint),
        }
    }

    fn headers(&self) -> Result<HeaderMap, AnalysisError> {
        let invalid_key = |_| AnalysisError::Provider("API key is not a valid header value".into());

        let mut headers = HeaderMap::new();
        if self.is_azure() {
            headers.insert(
                "api-key",
                HeaderValue::from_str(&self.api_key).map_err(invalid_key)?,
            );
        } else {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(invalid_key)?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

fn transport_error(err: reqwest::Error) -> AnalysisError {
    if err.is_timeout() {
        AnalysisError::Timeout(err.to_string())
    } else {
        AnalysisError::Provider(err.to_string())
    }
}

fn status_error(status: StatusCode, body: &str) -> AnalysisError {
    let message = format!("HTTP {}: {}", status.as_u16(), body.trim());
    match status {
        StatusCode::TOO_MANY_REQUESTS => AnalysisError::RateLimited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            AnalysisError::Timeout(message)
        }
        _ => AnalysisError::Provider(message),
    }
}

#[async_trait]
impl GenerationProvider for ChatCompletionsProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, AnalysisError> {
        let body = ChatRequest {
            model: (!self.is_azure()).then_some(self.model.as_str()),
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        tracing::debug!(
            model = %self.model,
            max_tokens = request.max_tokens,
            "Chat completion request"
        );

        let response = self
            .http
            .post(self.completions_url())
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AnalysisError::Timeout(e.to_string())
            } else {
                AnalysisError::Provider(format!("Malformed completion response: {}", e))
            }
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        let usage_units = parsed.usage.map(|u| u.total_tokens).unwrap_or(0);

        Ok(Generation {
            content,
            usage_units,
        })
    }

    async fn probe(&self) -> Result<(), AnalysisError> {
        let response = self
            .http
            .get(self.models_url())
            .headers(self.headers()?)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(status_error(status, &text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: &str, api_version: Option<&str>) -> AnalysisConfig {
        AnalysisConfig {
            api_key: "secret".to_string(),
            endpoint: endpoint.to_string(),
            model: "gpt-4o".to_string(),
            api_version: api_version.map(str::to_string),
            max_tokens: 8000,
            temperature: 0.7,
            input_ceiling: 6000,
            timeout_secs: 5,
            max_attempts: 3,
            retry_delay_ms: 1,
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "Analyze".to_string(),
            max_tokens: 100,
            temperature: 0.5,
        }
    }

    #[tokio::test]
    async fn test_openai_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o", "max_tokens": 100})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "# Report"}}],
                "usage": {"total_tokens": 321}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = ChatCompletionsProvider::new(&config(&server.uri(), None)).unwrap();
        let generation = provider.generate(&request()).await.unwrap();

        assert_eq!(generation.content, "# Report");
        assert_eq!(generation.usage_units, 321);
    }

    #[tokio::test]
    async fn test_azure_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o/chat/completions"))
            .and(query_param("api-version", "2024-12-01-preview"))
            .and(header("api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            ChatCompletionsProvider::new(&config(&server.uri(), Some("2024-12-01-preview")))
                .unwrap();
        let generation = provider.generate(&request()).await.unwrap();

        assert_eq!(generation.content, "ok");
        assert_eq!(generation.usage_units, 0);
    }

    #[tokio::test]
    async fn test_status_classification() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider = ChatCompletionsProvider::new(&config(&server.uri(), None)).unwrap();
        let err = provider.generate(&request()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::RateLimited(_)));
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::GATEWAY_TIMEOUT, ""),
            AnalysisError::Timeout(_)
        ));
        assert!(matches!(
            status_error(StatusCode::REQUEST_TIMEOUT, ""),
            AnalysisError::Timeout(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, "context length"),
            AnalysisError::Provider(_)
        ));
    }

    #[tokio::test]
    async fn test_probe_lists_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let provider = ChatCompletionsProvider::new(&config(&server.uri(), None)).unwrap();
        assert!(provider.probe().await.is_ok());
    }
}
