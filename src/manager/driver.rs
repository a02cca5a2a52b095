use std::sync::Arc;

use crate::agents::Agent;
use crate::orchestrator::Runner;
use crate::types::{AppResult, ConversationMessage};

/// Runs the entry agent for one round and hands back its final text.
#[derive(Clone)]
pub struct ConversationDriver {
    runner: Arc<Runner>,
    agent: Arc<Agent>,
}

impl ConversationDriver {
    pub fn new(runner: Arc<Runner>, agent: Arc<Agent>) -> Self {
        Self { runner, agent }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub async fn run(&self, history: &[ConversationMessage]) -> AppResult<String> {
        let result = self.runner.run(&self.agent, history).await?;
        Ok(result.final_output)
    }

    pub async fn run_topic(&self, topic: &str) -> AppResult<String> {
        self.run(&[ConversationMessage::user(topic)]).await
    }
}
