pub mod brave_search;

use std::sync::Mutex;

use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tiktoken_rs::{cl100k_base, CoreBPE};
use url::Url;

use crate::types::{AppError, AppResult};

pub use brave_search::BraveSearch;

lazy_static! {
    static ref TOKENIZER: Option<Mutex<CoreBPE>> = cl100k_base().ok().map(Mutex::new);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> AppResult<Vec<SearchHit>>;
}

/// Stand-in used when no search provider is configured; every query fails
/// and the calling agent is told so.
pub struct DisabledSearch;

#[async_trait]
impl WebSearch for DisabledSearch {
    async fn search(&self, _query: &str) -> AppResult<Vec<SearchHit>> {
        Err(AppError::Search(
            "web search is not configured (set SEARCH_API_KEY)".into(),
        ))
    }
}

/// Check if a URL is valid
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed_url) => {
            matches!(parsed_url.scheme(), "http" | "https") && parsed_url.host().is_some()
        }
        Err(_) => false,
    }
}

/// Renders hits as the markdown block handed back to the model, cut to
/// `max_tokens` cl100k tokens (0 = no limit).
pub fn render_results(query: &str, hits: &[SearchHit], max_tokens: usize) -> String {
    if hits.is_empty() {
        return format!("No results found for {}", query);
    }

    let mut combined = format!("Search Results for {}\n\n", query);
    for (i, hit) in hits.iter().enumerate() {
        combined.push_str(&format!("{}. [{}]({})\n{}\n\n", i + 1, hit.title, hit.url, hit.snippet));
    }

    truncate_tokens(&combined, max_tokens)
}

fn truncate_tokens(content: &str, max_tokens: usize) -> String {
    if max_tokens == 0 {
        return content.to_string();
    }

    match TOKENIZER.as_ref().and_then(|m| m.lock().ok()) {
        Some(encoder) => {
            let tokens = encoder.encode_ordinary(content);
            if tokens.len() <= max_tokens {
                return content.to_string();
            }
            encoder
                .decode(tokens[..max_tokens].to_vec())
                .unwrap_or_else(|_| content.chars().take(max_tokens * 4).collect())
        }
        // Fallback to character-based limiting
        None => content.chars().take(max_tokens * 4).collect(),
    }
}
