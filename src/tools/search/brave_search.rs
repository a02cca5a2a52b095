use std::time::Duration;

use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde::Deserialize;
use urlencoding::encode;

use super::{is_valid_url, SearchHit, WebSearch};
use crate::config::SearchConfig;
use crate::types::{AppError, AppResult};

/// Web search over a Brave-Search-compatible JSON API.
pub struct BraveSearch {
    client: Client,
    endpoint: String,
    api_key: String,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

impl BraveSearch {
    pub fn new(config: &SearchConfig) -> AppResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Config("SEARCH_API_KEY is not set".into()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            max_results: config.max_results,
        })
    }

    fn search_url(&self, query: &str) -> String {
        format!("{}?q={}&count={}", self.endpoint, encode(query), self.max_results)
    }
}

#[async_trait]
impl WebSearch for BraveSearch {
    async fn search(&self, query: &str) -> AppResult<Vec<SearchHit>> {
        let url = self.search_url(query);
        info!("web search: {}", query);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("search request failed with status {}: {}", status, body);
            return Err(AppError::Search(format!("search API returned {}", status)));
        }

        let body: BraveResponse = response.json().await?;
        Ok(parse_hits(body, self.max_results))
    }
}

fn parse_hits(body: BraveResponse, max_results: usize) -> Vec<SearchHit> {
    body.web
        .map(|web| web.results)
        .unwrap_or_default()
        .into_iter()
        .filter(|r| is_valid_url(&r.url))
        .take(max_results)
        .map(|r| SearchHit {
            title: r.title,
            url: r.url,
            snippet: r.description,
        })
        .collect()
}
