use seo_analyzer::config::{parse_config, Config};
use seo_analyzer::model::{AnalysisOptions, AnalysisRequest};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REPORT: &str = "# SEO Analysis Report\n## 1. Overview\nSolid demand.\n## 2. Search Results Analysis\n### Titles\n| Rank | Title |\n| 1 | Guide |";

/// Builds a validated configuration pointing every provider at `server`
pub fn test_config(server: &MockServer) -> Config {
    let toml = format!(
        r#"
[search]
api-key = "search-key"
base-url = "{uri}"
retry-delay-ms = 1

[fetch]
max-concurrent = 4
retry-delay-ms = 1

[analysis]
api-key = "analysis-key"
endpoint = "{uri}"
retry-delay-ms = 1

[pipeline]
budget-secs = 30
"#,
        uri = server.uri()
    );
    parse_config(&toml, |_| None).expect("test config is valid")
}

pub fn request(topic: &str) -> AnalysisRequest {
    AnalysisRequest::new(topic, "marketing teams", AnalysisOptions::default())
        .expect("valid request")
}

pub fn page_html(title: &str) -> String {
    format!(
        "<html><head><title>{title}</title><meta name=\"description\" content=\"About {title}\"></head>\
         <body><h1>{title}</h1><h2>Why it matters</h2><h2>How to start</h2>\
         <p>First paragraph with six words here.</p><p>Second paragraph four words.</p></body></html>"
    )
}

/// Mounts a search response listing `/page/1..=count` on the same server
pub async fn mount_search(server: &MockServer, count: usize) {
    let results: Vec<serde_json::Value> = (1..=count)
        .map(|i| {
            serde_json::json!({
                "position": i,
                "title": format!("Result {}", i),
                "link": format!("{}/page/{}", server.uri(), i),
                "snippet": format!("Snippet {}", i),
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "search_information": {"total_results": "1,234,000"},
            "organic_results": results,
            "related_searches": [{"query": "best seo tools"}, {"query": "free seo tools"}],
        })))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_page(server: &MockServer, index: usize, status: u16) {
    let response = if status == 200 {
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html")
            .set_body_string(page_html(&format!("Page {}", index)))
    } else {
        ResponseTemplate::new(status)
    };

    Mock::given(method("GET"))
        .and(path(format!("/page/{}", index)))
        .respond_with(response)
        .mount(server)
        .await;
}

pub fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 1500, "completion_tokens": 500, "total_tokens": 2000},
    })
}

pub async fn mount_completion(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(REPORT)))
        .expect(1)
        .mount(server)
        .await;
}
