//! End-to-end pipeline runs against mocked providers

use crate::common::{mount_completion, mount_page, mount_search, request, test_config, REPORT};
use seo_analyzer::config::parse_config;
use seo_analyzer::fetch::{FetchCoordinator, FetchErrorKind, FetchHealth, HttpFetcher};
use seo_analyzer::pipeline::{Pipeline, Stage};
use seo_analyzer::{AnalyzerError, SearchError};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_partial_fetch_failure_still_produces_report() {
    let server = MockServer::start().await;
    mount_search(&server, 10).await;
    for i in 1..=8 {
        mount_page(&server, i, 200).await;
    }
    mount_page(&server, 9, 404).await;
    mount_page(&server, 10, 404).await;
    mount_completion(&server).await;

    let pipeline = Pipeline::from_config(&test_config(&server)).unwrap();
    let report = pipeline.run(&request("SEO tools")).await.unwrap();

    assert_eq!(report.topic, "SEO tools");
    assert_eq!(report.fetch.total, 10);
    assert_eq!(report.fetch.successful, 8);
    assert_eq!(report.fetch.failed, 2);
    assert_eq!(report.fetch.health, FetchHealth::Healthy);
    assert_eq!(report.usage_units, 2000);
    assert!(report.report_text.starts_with("# SEO Analysis Report"));
    // normalized: blank line between heading and table, and between rows
    assert!(report.report_text.contains("### Titles\n\n| Rank | Title |\n\n| 1 | Guide |"));
    assert_ne!(report.report_text, REPORT);
    for stage in [Stage::Search, Stage::Fetch, Stage::Analyze] {
        assert!(report.timings.get(stage).is_some());
    }
}

#[tokio::test]
async fn test_http_failures_are_tagged_per_url() {
    let server = MockServer::start().await;
    for i in 1..=8 {
        mount_page(&server, i, 200).await;
    }
    mount_page(&server, 9, 404).await;
    mount_page(&server, 10, 404).await;

    let config = test_config(&server);
    let fetcher = HttpFetcher::new(&config.fetch).unwrap();
    let coordinator = FetchCoordinator::new(Arc::new(fetcher), 4);
    let urls: Vec<String> = (1..=10)
        .map(|i| format!("{}/page/{}", server.uri(), i))
        .collect();

    let summary = coordinator.fetch_all(&urls).await;

    assert_eq!(summary.successful, 8);
    assert_eq!(summary.errors.len(), 2);
    assert_eq!(summary.successful + summary.errors.len(), summary.total);
    for failure in &summary.errors {
        assert_eq!(failure.kind, FetchErrorKind::Http);
        assert_eq!(failure.error, "HTTP 404");
    }
    assert!(summary.errors[0].url.ends_with("/page/9"));

    let first = &summary.pages[0];
    assert_eq!(first.title.as_deref(), Some("Page 1"));
    assert_eq!(first.description.as_deref(), Some("About Page 1"));
    assert_eq!(first.sub_headings, vec!["Why it matters", "How to start"]);
    assert_eq!(first.structural_units, 2);
}

#[tokio::test]
async fn test_search_rate_limit_aborts_before_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": "Your account has run out of searches or hit the rate limit."
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/page/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = Pipeline::from_config(&test_config(&server)).unwrap();
    let err = pipeline.run(&request("SEO tools")).await.unwrap_err();

    assert!(matches!(
        err,
        AnalyzerError::Search(SearchError::RateLimited(_))
    ));
    assert_eq!(err.code(), "SERP_RATE_LIMITED");
    assert_eq!(err.error_type(), "SearchProviderError");
    assert_eq!(err.status_code(), 503);
}

#[tokio::test]
async fn test_all_fetches_failing_degrades_to_search_only_analysis() {
    let server = MockServer::start().await;
    mount_search(&server, 10).await;
    for i in 1..=10 {
        mount_page(&server, i, 500).await;
    }
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("No competitor pages could be retrieved"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(crate::common::completion_body(REPORT)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = Pipeline::from_config(&test_config(&server)).unwrap();
    let report = pipeline.run(&request("SEO tools")).await.unwrap();

    assert_eq!(report.fetch.successful, 0);
    assert_eq!(report.fetch.failed, 10);
    assert_eq!(report.fetch.health, FetchHealth::Failed);
    assert!(report.report_text.contains("## 1. Overview"));
}

#[tokio::test]
async fn test_generation_rate_limit_is_retried() {
    let server = MockServer::start().await;
    mount_search(&server, 1).await;
    mount_page(&server, 1, 200).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_completion(&server).await;

    let pipeline = Pipeline::from_config(&test_config(&server)).unwrap();
    let report = pipeline.run(&request("SEO tools")).await.unwrap();

    assert_eq!(report.usage_units, 2000);
}

#[tokio::test]
async fn test_generation_error_is_not_retried() {
    let server = MockServer::start().await;
    mount_search(&server, 1).await;
    mount_page(&server, 1, 200).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = Pipeline::from_config(&test_config(&server)).unwrap();
    let err = pipeline.run(&request("SEO tools")).await.unwrap_err();

    assert_eq!(err.code(), "AI_API_ERROR");
}

#[tokio::test]
async fn test_cached_report_skips_providers() {
    let server = MockServer::start().await;
    mount_search(&server, 2).await;
    mount_page(&server, 1, 200).await;
    mount_page(&server, 2, 200).await;
    mount_completion(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&server);
    config.cache.enabled = true;
    config.cache.database_path = dir.path().join("cache.db").to_string_lossy().into_owned();

    let pipeline = Pipeline::from_config(&config).unwrap();
    let first = pipeline.run(&request("SEO tools")).await.unwrap();
    let second = pipeline.run(&request("seo TOOLS")).await.unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(second.report_text, first.report_text);
    // wiremock verifies search and completion were each called once
}

#[test]
fn test_config_requires_provider_keys() {
    let err = parse_config("[analysis]\nendpoint = \"https://api.openai.com/v1\"\n", |_| None)
        .unwrap_err();
    assert!(err.to_string().contains("api_key"));

    let config = parse_config(
        "[analysis]\nendpoint = \"https://api.openai.com/v1\"\n",
        |name| Some(format!("{}-value", name)),
    )
    .unwrap();
    assert_eq!(config.search.api_key, "SERPAPI_API_KEY-value");
    assert_eq!(config.analysis.api_key, "ANALYSIS_API_KEY-value");
}
