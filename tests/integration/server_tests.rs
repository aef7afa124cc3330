//! HTTP API routes against mocked providers

use crate::common::{mount_completion, mount_page, mount_search, test_config};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use seo_analyzer::jobs::JobTracker;
use seo_analyzer::pipeline::Pipeline;
use seo_analyzer::server::{router, AppState};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(server: &MockServer) -> Router {
    let config = test_config(server);
    let pipeline = Pipeline::from_config(&config).unwrap();
    let state = Arc::new(AppState::new(pipeline, JobTracker::from_config(&config.jobs)));
    router(state, &config.server)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn analyze_request(uri: &str, topic: &str) -> Request<Body> {
    let body = serde_json::json!({
        "topic": topic,
        "audience": "small business owners",
        "options": {"include_faq": true},
    });
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_analyze_returns_success_envelope() {
    let server = MockServer::start().await;
    mount_search(&server, 2).await;
    mount_page(&server, 1, 200).await;
    mount_page(&server, 2, 200).await;
    mount_completion(&server).await;
    let app = app(&server);

    let (status, body) = send(&app, analyze_request("/api/analyze", "SEO tools")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["topic"], "SEO tools");
    assert_eq!(body["data"]["fetch"]["successful"], 2);
    assert_eq!(body["data"]["cached"], false);
    assert!(body["data"]["timings"]["stages"]["search"].is_number());
    assert!(body["data"]["report_text"]
        .as_str()
        .unwrap()
        .starts_with("# SEO Analysis Report"));
}

#[tokio::test]
async fn test_analyze_maps_search_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&server);

    let (status, body) = send(&app, analyze_request("/api/analyze", "SEO tools")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "SERP_AUTH_ERROR");
    assert!(body["error"]["elapsed_seconds"].is_number());
    assert!(body["error"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_keyword_alias_is_accepted() {
    let server = MockServer::start().await;
    mount_search(&server, 1).await;
    mount_page(&server, 1, 200).await;
    mount_completion(&server).await;
    let app = app(&server);

    let request = Request::post("/api/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"keyword": "SEO tools", "audience": "agencies"}"#))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["topic"], "SEO tools");
}

#[tokio::test]
async fn test_async_submit_then_poll() {
    let server = MockServer::start().await;
    mount_search(&server, 2).await;
    mount_page(&server, 1, 200).await;
    mount_page(&server, 2, 404).await;
    mount_completion(&server).await;
    let app = app(&server);

    let (status, accepted) = send(&app, analyze_request("/api/analyze-async", "SEO tools")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(accepted["status"], "accepted");
    let job_id = accepted["job_id"].as_str().unwrap().to_string();
    let status_url = accepted["status_url"].as_str().unwrap().to_string();
    assert_eq!(status_url, format!("/api/status/{}", job_id));

    let mut last = serde_json::Value::Null;
    for _ in 0..200 {
        let (status, body) = send(&app, Request::get(&status_url).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "completed" || body["status"] == "failed" {
            last = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    assert_eq!(last["status"], "completed");
    assert_eq!(last["job_id"], job_id.as_str());
    assert_eq!(last["progress"]["percent"], 100);
    assert_eq!(last["result"]["fetch"]["successful"], 1);
    assert_eq!(last["result"]["fetch"]["failed"], 1);
}

#[tokio::test]
async fn test_health_reports_each_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"plan": "dev"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&server)
        .await;
    let app = app(&server);

    let (status, body) = send(&app, Request::get("/api/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["search"]["status"], "up");
    assert_eq!(body["services"]["analysis"]["status"], "up");
    assert_eq!(body["services"]["cache"]["status"], "disabled");
    assert_eq!(body["services"]["fetch"]["max_concurrent"], 4);
}

#[tokio::test]
async fn test_health_degraded_is_still_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account.json"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&server)
        .await;
    let app = app(&server);

    let (status, body) = send(&app, Request::get("/api/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["search"]["status"], "down");
}
