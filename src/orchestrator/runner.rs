use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

use super::guardrail::InputGuardrail;
use crate::agents::{Agent, AgentTool};
use crate::config::RunConfig;
use crate::llm::{ChatCompletionClient, Content};
use crate::tools::{render_results, WebSearch};
use crate::types::{AppError, AppResult, ConversationMessage, FunctionCall, LlmMessage, RequestUsage};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    pub agent: String,
    pub tool: String,
    pub arguments: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub final_output: String,
    /// Model turns taken by the top-level agent.
    pub turns: usize,
    /// Every tool call made during the run, nested specialist runs included.
    pub tool_calls: Vec<ToolInvocation>,
    pub usage: RequestUsage,
}

struct ToolOutcome {
    call_id: String,
    output: String,
    invocations: Vec<ToolInvocation>,
    usage: RequestUsage,
}

/// Drives agents to a final answer: model turn, concurrent tool execution,
/// repeat until the model answers in text or the turn limit is reached.
pub struct Runner {
    client: Arc<dyn ChatCompletionClient>,
    search: Arc<dyn WebSearch>,
    guardrails: Vec<Arc<dyn InputGuardrail>>,
    config: RunConfig,
    search_max_tokens: usize,
}

impl Runner {
    pub fn new(client: Arc<dyn ChatCompletionClient>, search: Arc<dyn WebSearch>, config: RunConfig) -> Self {
        Self {
            client,
            search,
            guardrails: Vec::new(),
            config,
            search_max_tokens: 0,
        }
    }

    pub fn with_guardrail(mut self, guardrail: Arc<dyn InputGuardrail>) -> Self {
        self.guardrails.push(guardrail);
        self
    }

    pub fn with_search_token_limit(mut self, max_tokens: usize) -> Self {
        self.search_max_tokens = max_tokens;
        self
    }

    pub async fn run(&self, agent: &Agent, input: &[ConversationMessage]) -> AppResult<RunResult> {
        for guardrail in &self.guardrails {
            let output = guardrail.check(input).await?;
            if output.tripwire_triggered {
                warn!("guardrail {} tripped for {}", guardrail.name(), agent.name());
                return Err(AppError::GuardrailTripwire {
                    guardrail: guardrail.name().to_string(),
                    reason: output.reason.unwrap_or_default(),
                });
            }
        }

        let messages = input.iter().map(LlmMessage::from).collect();
        let result = self.run_agent(agent, messages).await?;
        info!(
            "{} finished in {} turns with {} tool calls ({} prompt / {} completion tokens)",
            agent.name(),
            result.turns,
            result.tool_calls.len(),
            result.usage.prompt_tokens,
            result.usage.completion_tokens
        );
        Ok(result)
    }

    fn run_agent<'a>(&'a self, agent: &'a Agent, input: Vec<LlmMessage>) -> BoxFuture<'a, AppResult<RunResult>> {
        async move {
            let schemas = agent.tool_schemas();
            let mut messages = Vec::with_capacity(input.len() + 1);
            messages.push(LlmMessage::system(agent.instructions()));
            messages.extend(input);

            let mut tool_calls = Vec::new();
            let mut usage = RequestUsage::default();

            for turn in 1..=self.config.max_turns {
                let result = self.client.create(agent.model(), &messages, &schemas).await?;
                usage.add(result.usage);

                match result.content {
                    Content::Text(text) => {
                        return Ok(RunResult {
                            final_output: text,
                            turns: turn,
                            tool_calls,
                            usage,
                        });
                    }
                    Content::ToolCalls(calls) => {
                        info!(
                            "{} turn {}: {}",
                            agent.name(),
                            turn,
                            calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
                        );
                        messages.push(LlmMessage::assistant_tool_calls(calls.clone()));

                        let outcomes = join_all(calls.iter().map(|call| self.invoke_tool(agent, call))).await;
                        for outcome in outcomes {
                            messages.push(LlmMessage::tool_result(outcome.call_id, outcome.output));
                            tool_calls.extend(outcome.invocations);
                            usage.add(outcome.usage);
                        }
                    }
                }
            }

            Err(AppError::MaxTurnsExceeded(self.config.max_turns))
        }
        .boxed()
    }

    async fn invoke_tool(&self, agent: &Agent, call: &FunctionCall) -> ToolOutcome {
        let mut invocations = Vec::new();
        let mut usage = RequestUsage::default();

        let result = match agent.find_tool(&call.name) {
            None => Err(AppError::ToolArguments {
                tool: call.name.clone(),
                reason: format!("tool not found on {}", agent.name()),
            }),
            Some(AgentTool::WebSearch) => match string_argument(call, "query") {
                Ok(query) => self
                    .search
                    .search(&query)
                    .await
                    .map(|hits| render_results(&query, &hits, self.search_max_tokens)),
                Err(e) => Err(e),
            },
            Some(AgentTool::Specialist { agent: specialist, .. }) => match string_argument(call, "input") {
                Ok(question) => self
                    .run_agent(specialist, vec![LlmMessage::user(question)])
                    .await
                    .map(|nested| {
                        invocations.extend(nested.tool_calls);
                        usage.add(nested.usage);
                        nested.final_output
                    }),
                Err(e) => Err(e),
            },
        };

        let is_error = result.is_err();
        let output = result.unwrap_or_else(|e| {
            warn!("{} tool {} failed: {}", agent.name(), call.name, e);
            format!("An error occurred while running the tool. Please try again. Error: {}", e)
        });

        invocations.insert(
            0,
            ToolInvocation {
                agent: agent.name().to_string(),
                tool: call.name.clone(),
                arguments: call.arguments.clone(),
                is_error,
            },
        );

        ToolOutcome {
            call_id: call.id.clone(),
            output,
            invocations,
            usage,
        }
    }
}

fn string_argument(call: &FunctionCall, key: &str) -> AppResult<String> {
    let bad = |reason: String| AppError::ToolArguments {
        tool: call.name.clone(),
        reason,
    };
    let value: Value = serde_json::from_str(&call.arguments).map_err(|e| bad(e.to_string()))?;
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| bad(format!("missing string field {}", key)))
}
