use std::sync::Arc;

use log::{info, warn};

use crate::agents::AgentRoster;
use crate::config::AppConfig;
use crate::llm::{ChatCompletionClient, LlmClient};
use crate::manager::{
    ConversationDriver, FileSessionStore, MemorySessionStore, SessionManager, SessionStore,
};
use crate::orchestrator::{InputLengthGuardrail, Runner};
use crate::tools::{BraveSearch, DisabledSearch, WebSearch};
use crate::types::AppResult;

/// Everything a surface (server or terminal) needs, wired from one config.
pub struct App {
    pub config: AppConfig,
    pub driver: ConversationDriver,
    pub sessions: Arc<SessionManager>,
}

impl App {
    pub async fn build(config: AppConfig) -> AppResult<Self> {
        config.require_api_key()?;
        let client: Arc<dyn ChatCompletionClient> = Arc::new(LlmClient::new(config.llm.clone())?);
        Self::with_client(config, client).await
    }

    pub async fn with_client(config: AppConfig, client: Arc<dyn ChatCompletionClient>) -> AppResult<Self> {
        let search: Arc<dyn WebSearch> = match config.search.api_key {
            Some(_) => Arc::new(BraveSearch::new(&config.search)?),
            None => {
                warn!("SEARCH_API_KEY not set, web_search will report itself unavailable");
                Arc::new(DisabledSearch)
            }
        };

        let runner = Runner::new(client, search, config.run.clone())
            .with_guardrail(Arc::new(InputLengthGuardrail::new(config.run.max_input_chars)))
            .with_search_token_limit(config.search.max_tokens);

        let agent = AgentRoster::load(config.agents_file.as_deref(), &config.travel)?.build()?;
        info!(
            "entry agent {} ({}) with {} tools",
            agent.name(),
            agent.model(),
            agent.tools().len()
        );
        let driver = ConversationDriver::new(Arc::new(runner), agent);

        let store: Arc<dyn SessionStore> = match &config.session_dir {
            Some(dir) => {
                info!("persisting sessions under {}", dir.display());
                Arc::new(FileSessionStore::open(dir).await?)
            }
            None => Arc::new(MemorySessionStore::new()),
        };
        let sessions = SessionManager::new(driver.clone(), store);

        Ok(Self {
            config,
            driver,
            sessions,
        })
    }
}
