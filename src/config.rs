use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{AppError, AppResult};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub temperature: Option<f32>,
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            temperature: None,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub endpoint: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_results: usize,
    /// Token budget for the rendered results handed back to the model, 0 = unlimited.
    pub max_tokens: usize,
    pub timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_URL.to_string(),
            api_key: None,
            max_results: 5,
            max_tokens: 1500,
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub max_turns: usize,
    pub max_input_chars: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_turns: 10,
            max_input_chars: 2000,
        }
    }
}

/// Fixed assumptions the orchestrator plans around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelDefaults {
    pub origin_country: String,
    pub currency: String,
}

impl Default for TravelDefaults {
    fn default() -> Self {
        Self {
            origin_country: "Singapore".to_string(),
            currency: "SGD".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub run: RunConfig,
    pub travel: TravelDefaults,
    pub bind: SocketAddr,
    pub agents_file: Option<PathBuf>,
    pub session_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            run: RunConfig::default(),
            travel: TravelDefaults::default(),
            bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
            agents_file: None,
            session_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = AppConfig::default();

        if let Some(base_url) = get("OPENAI_BASE_URL") {
            config.llm.base_url = base_url;
        }
        if let Some(api_key) = get("OPENAI_API_KEY") {
            config.llm.api_key = api_key;
        }
        if let Some(temperature) = get("TRIP_PLANNER_TEMPERATURE") {
            config.llm.temperature = Some(parse("TRIP_PLANNER_TEMPERATURE", &temperature)?);
        }
        if let Some(retries) = get("TRIP_PLANNER_LLM_RETRIES") {
            config.llm.max_retries = parse("TRIP_PLANNER_LLM_RETRIES", &retries)?;
        }

        if let Some(endpoint) = get("SEARCH_API_URL") {
            config.search.endpoint = endpoint;
        }
        config.search.api_key = get("SEARCH_API_KEY");
        if let Some(max_results) = get("SEARCH_MAX_RESULTS") {
            config.search.max_results = parse("SEARCH_MAX_RESULTS", &max_results)?;
        }
        if let Some(max_tokens) = get("SEARCH_MAX_TOKENS") {
            config.search.max_tokens = parse("SEARCH_MAX_TOKENS", &max_tokens)?;
        }

        if let Some(max_turns) = get("TRIP_PLANNER_MAX_TURNS") {
            config.run.max_turns = parse("TRIP_PLANNER_MAX_TURNS", &max_turns)?;
        }
        if let Some(max_chars) = get("TRIP_PLANNER_MAX_INPUT_CHARS") {
            config.run.max_input_chars = parse("TRIP_PLANNER_MAX_INPUT_CHARS", &max_chars)?;
        }
        if config.run.max_turns == 0 {
            return Err(AppError::Config("TRIP_PLANNER_MAX_TURNS must be at least 1".into()));
        }

        if let Some(country) = get("TRIP_PLANNER_ORIGIN_COUNTRY") {
            config.travel.origin_country = country;
        }
        if let Some(currency) = get("TRIP_PLANNER_CURRENCY") {
            config.travel.currency = currency;
        }

        if let Some(bind) = get("TRIP_PLANNER_BIND") {
            config.bind = parse("TRIP_PLANNER_BIND", &bind)?;
        }
        config.agents_file = get("TRIP_PLANNER_AGENTS").map(PathBuf::from);
        config.session_dir = get("TRIP_PLANNER_SESSION_DIR").map(PathBuf::from);

        Ok(config)
    }

    /// The model endpoint is only needed once an agent actually runs.
    pub fn require_api_key(&self) -> AppResult<()> {
        if self.llm.api_key.is_empty() {
            return Err(AppError::Config(
                "OPENAI_API_KEY environment variable is required".into(),
            ));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> AppResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| AppError::Config(format!("invalid value for {}: {} ({})", key, raw, e)))
}
