//! Web search collaborators
//!
//! Two backends are provided:
//! - DuckDuckGo's HTML endpoint (no key required), parsed with `scraper`
//! - SerpAPI's Google search JSON API, used when a SerpAPI key is configured
//!
//! Both return a typed [`SearchError`] on failure; deciding how to degrade is
//! left to the caller.

use crate::config::SearchConfig;
use crate::error::{KimiError, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DUCKDUCKGO_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const SERPAPI_ENDPOINT: &str = "https://serpapi.com/search.json";

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title
    pub title: String,
    /// Target URL (may be empty)
    pub url: String,
    /// Short excerpt shown under the title
    pub snippet: String,
}

impl SearchResult {
    /// Create a search result
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }

    /// Placeholder row standing in for a failed search
    ///
    /// It has no URL, so it never shows up as a source.
    pub fn error(reason: impl Into<String>) -> Self {
        Self::new("Search error", "", reason)
    }
}

/// Why a search produced no usable results
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The request could not be sent or the body not read
    #[error("search request failed: {0}")]
    Request(String),

    /// The search service answered with a non-success status
    #[error("search service returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated by the service)
        body: String,
    },

    /// The service reported an error in its payload
    #[error("search service error: {0}")]
    Api(String),

    /// The response could not be understood
    #[error("could not parse search response: {0}")]
    Parse(String),

    /// The search did not finish within its deadline
    #[error("search timed out after {0:?}")]
    Timeout(Duration),
}

/// Search collaborator
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a query and return results in ranking order (possibly empty)
    async fn search(&self, query: &str) -> std::result::Result<Vec<SearchResult>, SearchError>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

fn build_client(timeout_seconds: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("kimi-agent/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| KimiError::Search(format!("Failed to create HTTP client: {}", e)).into())
}

/// DuckDuckGo HTML search
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
    max_results: usize,
}

impl DuckDuckGoSearch {
    /// Create a DuckDuckGo backend from configuration
    pub fn new(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_seconds)?,
            endpoint: config
                .api_base
                .clone()
                .unwrap_or_else(|| DUCKDUCKGO_ENDPOINT.to_string()),
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> std::result::Result<Vec<SearchResult>, SearchError> {
        tracing::debug!("DuckDuckGo search: {}", query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_duckduckgo_html(&body, self.max_results)
    }

    fn name(&self) -> &'static str {
        "duckduckgo"
    }
}

fn selector(css: &str) -> std::result::Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("{:?}", e)))
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve DuckDuckGo's `/l/?uddg=` redirect links to their target
fn resolve_result_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    match Url::parse(&absolute) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, target)| target.into_owned())
            .unwrap_or(absolute),
        Err(_) => absolute,
    }
}

/// Extract results from a DuckDuckGo HTML results page
pub fn parse_duckduckgo_html(
    html: &str,
    max_results: usize,
) -> std::result::Result<Vec<SearchResult>, SearchError> {
    let document = Html::parse_document(html);
    let result_sel = selector("div.result")?;
    let title_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut results = Vec::new();
    for node in document.select(&result_sel) {
        if results.len() >= max_results {
            break;
        }
        if node.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        let Some(link) = node.select(&title_sel).next() else {
            continue;
        };

        let url = link
            .value()
            .attr("href")
            .map(resolve_result_link)
            .unwrap_or_default();
        let snippet = node
            .select(&snippet_sel)
            .next()
            .map(collapsed_text)
            .unwrap_or_default();

        results.push(SearchResult::new(collapsed_text(link), url, snippet));
    }

    Ok(results)
}

/// SerpAPI (Google) search
pub struct SerpApiSearch {
    client: Client,
    endpoint: String,
    api_key: String,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<SerpApiResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerpApiResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl SerpApiSearch {
    /// Create a SerpAPI backend
    pub fn new(config: &SearchConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_seconds)?,
            endpoint: config
                .api_base
                .clone()
                .unwrap_or_else(|| SERPAPI_ENDPOINT.to_string()),
            api_key: api_key.into(),
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl SearchProvider for SerpApiSearch {
    async fn search(&self, query: &str) -> std::result::Result<Vec<SearchResult>, SearchError> {
        tracing::debug!("SerpAPI search: {}", query);

        let num = self.max_results.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: SerpApiResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;
        if let Some(error) = body.error {
            return Err(SearchError::Api(error));
        }

        Ok(body
            .organic_results
            .into_iter()
            .take(self.max_results)
            .map(|r| SearchResult::new(r.title, r.link, r.snippet))
            .collect())
    }

    fn name(&self) -> &'static str {
        "serpapi"
    }
}

/// Pick the search backend described by configuration
///
/// SerpAPI is used when a key is configured, DuckDuckGo otherwise.
pub fn create_search_provider(config: &SearchConfig) -> Result<Arc<dyn SearchProvider>> {
    match config.serpapi_key.as_deref() {
        Some(key) if !key.trim().is_empty() => Ok(Arc::new(SerpApiSearch::new(config, key)?)),
        _ => Ok(Arc::new(DuckDuckGoSearch::new(config)?)),
    }
}
