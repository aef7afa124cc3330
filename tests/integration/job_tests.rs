//! Job tracker lifecycle, driven directly and through background runs

use crate::common::{mount_completion, mount_page, mount_search, request, test_config};
use seo_analyzer::config::JobsConfig;
use seo_analyzer::fetch::{FetchHealth, FetchOverview};
use seo_analyzer::jobs::{JobRecord, JobStatus, JobTracker};
use seo_analyzer::pipeline::{Pipeline, StageTimings};
use seo_analyzer::AnalysisReport;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn wait_for_terminal(tracker: &JobTracker, id: &str) -> JobRecord {
    for _ in 0..200 {
        let record = tracker.get(id).expect("job exists");
        if record.status.is_terminal() {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("job {} did not finish", id);
}

fn finished_report() -> AnalysisReport {
    AnalysisReport {
        topic: "SEO tools".to_string(),
        audience: "marketing teams".to_string(),
        report_text: "# SEO Analysis Report".to_string(),
        usage_units: 2000,
        total_elapsed_seconds: 12.0,
        timings: StageTimings::default(),
        fetch: FetchOverview {
            total: 10,
            successful: 8,
            failed: 2,
            avg_word_count: 700,
            avg_structural_units: 9,
            health: FetchHealth::Healthy,
        },
        generated_at: chrono::Utc::now(),
        cached: false,
    }
}

#[test]
fn test_progress_then_completion() {
    let tracker = JobTracker::from_config(&JobsConfig::default());
    let id = tracker.create();

    assert!(tracker.update(&id, 1, "Searching", 10));
    assert!(tracker.update(&id, 2, "Fetching pages", 35));
    assert!(tracker.update(&id, 3, "Generating analysis", 65));

    let polled = tracker.get(&id).unwrap();
    assert_eq!(polled.status, JobStatus::Running);
    assert_eq!(polled.percent, 65);
    assert_eq!(polled.phase, 3);

    let view = polled.view();
    assert_eq!(view.status, JobStatus::Running);
    assert_eq!(view.progress.percent, 65);
    assert!(view.result.is_none());

    tracker.complete(&id, finished_report()).unwrap();

    let done = tracker.get(&id).unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.percent, 100);
    assert_eq!(done.result.as_ref().unwrap().fetch.successful, 8);
    assert!(!tracker.update(&id, 3, "late", 99));
}

#[tokio::test]
async fn test_submitted_job_completes() {
    let server = MockServer::start().await;
    mount_search(&server, 3).await;
    for i in 1..=3 {
        mount_page(&server, i, 200).await;
    }
    mount_completion(&server).await;

    let config = test_config(&server);
    let pipeline = Arc::new(Pipeline::from_config(&config).unwrap());
    let tracker = Arc::new(JobTracker::from_config(&config.jobs));

    let id = tracker.submit(pipeline, request("SEO tools"));
    let record = wait_for_terminal(&tracker, &id).await;

    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.percent, 100);
    assert_eq!(record.phase, 3);
    let report = record.result.expect("completed job carries a report");
    assert_eq!(report.fetch.successful, 3);
    assert!(record.error.is_none());

    // polling a finished job is stable
    assert_eq!(tracker.get(&id), tracker.get(&id));
}

#[tokio::test]
async fn test_submitted_job_records_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "Invalid API key."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let pipeline = Arc::new(Pipeline::from_config(&config).unwrap());
    let tracker = Arc::new(JobTracker::from_config(&config.jobs));

    let id = tracker.submit(pipeline, request("SEO tools"));
    let record = wait_for_terminal(&tracker, &id).await;

    assert_eq!(record.status, JobStatus::Failed);
    let error = record.error.expect("failed job carries an error");
    assert_eq!(error.code, "SERP_AUTH_ERROR");
    assert_eq!(error.error_type, "SearchProviderError");
    assert!(record.result.is_none());
    // the failure arrived after the search-start update
    assert_eq!(record.percent, 10);
}
