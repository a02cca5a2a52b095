//! Scripted stand-ins for the model endpoint and the search provider.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{http::StatusCode, routing::any, Json, Router};
use serde_json::Value;

use crate::llm::{ChatCompletionClient, CreateResult};
use crate::tools::{SearchHit, ToolSchema, WebSearch};
use crate::types::{AppError, AppResult, FunctionCall, LlmMessage};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub system: String,
    pub messages: Vec<LlmMessage>,
    pub tools: Vec<String>,
}

/// Replies are queued per agent, keyed by the agent's instructions (the system message).
#[derive(Default)]
pub struct ScriptedClient {
    scripts: Mutex<HashMap<String, VecDeque<AppResult<CreateResult>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every reply waits this long, as a slow model would.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn reply(self, instructions: &str, result: CreateResult) -> Self {
        self.push(instructions, Ok(result));
        self
    }

    pub fn fail(self, instructions: &str, err: AppError) -> Self {
        self.push(instructions, Err(err));
        self
    }

    fn push(&self, instructions: &str, result: AppResult<CreateResult>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(instructions.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, instructions: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.system == instructions).collect()
    }
}

pub fn call(id: &str, name: &str, arguments: &str) -> FunctionCall {
    FunctionCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

#[async_trait]
impl ChatCompletionClient for ScriptedClient {
    async fn create(
        &self,
        model: &str,
        messages: &[LlmMessage],
        tools: &[ToolSchema],
    ) -> AppResult<CreateResult> {
        let system = match messages.first() {
            Some(LlmMessage::System { content }) => content.clone(),
            _ => String::new(),
        };
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            system: system.clone(),
            messages: messages.to_vec(),
            tools: tools.iter().map(|t| t.name.clone()).collect(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.scripts
            .lock()
            .unwrap()
            .get_mut(&system)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(AppError::Llm(format!("no scripted reply for {:?}", system))))
    }
}

#[derive(Default)]
pub struct StubSearch {
    hits: Vec<SearchHit>,
    failing: bool,
    queries: Mutex<Vec<String>>,
}

impl StubSearch {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for StubSearch {
    async fn search(&self, query: &str) -> AppResult<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.failing {
            return Err(AppError::Search("search API returned 503".into()));
        }
        Ok(self.hits.clone())
    }
}

/// Serves `responses` in order on `path` (the last one repeats) from a local
/// listener. Returns the base url and a counter of requests received.
pub async fn spawn_scripted_server(path: &str, responses: Vec<(StatusCode, Value)>) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let responses = Arc::new(responses);
    let counter = hits.clone();
    let router = Router::new().route(
        path,
        any(move || {
            let counter = counter.clone();
            let responses = responses.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[n.min(responses.len() - 1)].clone();
                (status, Json(body))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}", addr), hits)
}
