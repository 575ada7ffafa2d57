use std::fs;
use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kimi_agent::config::{Config, StorageBackendKind};

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Config pointing the model and DuckDuckGo search at `server`, storing
/// transcripts under `memory_dir`
#[allow(dead_code)]
pub fn mock_config(server: &MockServer, memory_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.model.api_key = "sk-test".to_string();
    config.model.base_url = format!("{}/v1", server.uri());
    config.model.timeout_seconds = 5;
    config.storage.backend = StorageBackendKind::File;
    config.storage.dir = memory_dir.path().to_path_buf();
    config.search.api_base = Some(format!("{}/html/", server.uri()));
    config.search.timeout_seconds = 5;
    config
}

/// OpenAI-style completion body carrying `text`
#[allow(dead_code)]
pub fn completion_body(text: &str) -> Value {
    json!({
        "id": "cmpl-test",
        "object": "chat.completion",
        "model": "moonshot-v1-8k",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
    })
}

/// Answer every completion request with `text`
#[allow(dead_code)]
pub async fn mount_completion(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(text)))
        .mount(server)
        .await;
}

/// DuckDuckGo HTML results page with one result per `(title, url, snippet)`
#[allow(dead_code)]
pub fn duckduckgo_page(results: &[(&str, &str, &str)]) -> String {
    let mut html = String::from("<html><body><div id=\"links\">");
    for (title, url, snippet) in results {
        html.push_str(&format!(
            "<div class=\"result results_links web-result\">\
             <h2 class=\"result__title\"><a class=\"result__a\" href=\"{}\">{}</a></h2>\
             <a class=\"result__snippet\">{}</a></div>",
            url, title, snippet
        ));
    }
    html.push_str("</div></body></html>");
    html
}

/// Serve `page` from the DuckDuckGo endpoint
#[allow(dead_code)]
pub async fn mount_search_page(server: &MockServer, page: String) {
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(page, "text/html"))
        .mount(server)
        .await;
}

/// Bodies of every completion request the server received, in order
#[allow(dead_code)]
pub async fn completion_requests(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/v1/chat/completions")
        .map(|r| serde_json::from_slice(&r.body).expect("completion body is JSON"))
        .collect()
}
