use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionTool, ChatCompletionToolArgs, ChatCompletionToolType,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse, FinishReason, FunctionCall as OpenAiFunctionCall,
        FunctionObjectArgs,
    },
    Client,
};
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::tools::ToolSchema;
use crate::types::{AppError, AppResult, FunctionCall, LlmMessage, RequestUsage};

const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(10);

#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    async fn create(
        &self,
        model: &str,
        messages: &[LlmMessage],
        tools: &[ToolSchema],
    ) -> AppResult<CreateResult>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FinishReasons {
    #[serde(rename = "stop")]
    Stop,
    #[serde(rename = "length")]
    Length,
    #[serde(rename = "tool_calls")]
    ToolCalls,
    #[serde(rename = "content_filter")]
    ContentFilter,
    #[serde(rename = "unknown")]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Content {
    Text(String),
    ToolCalls(Vec<FunctionCall>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateResult {
    pub finish_reason: FinishReasons,
    pub content: Content,
    pub usage: RequestUsage,
}

impl CreateResult {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            finish_reason: FinishReasons::Stop,
            content: Content::Text(content.into()),
            usage: RequestUsage::default(),
        }
    }

    pub fn tool_calls(calls: Vec<FunctionCall>) -> Self {
        Self {
            finish_reason: FinishReasons::ToolCalls,
            content: Content::ToolCalls(calls),
            usage: RequestUsage::default(),
        }
    }
}

impl std::fmt::Debug for dyn ChatCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionClient").finish()
    }
}

/// Chat-completions client for any OpenAI-protocol endpoint (OpenAI, OpenRouter, local proxies).
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> AppResult<Self> {
        if config.api_key.is_empty() {
            return Err(AppError::Config("LLM api key is empty".into()));
        }

        let openai_config = OpenAIConfig::new()
            .with_api_base(config.base_url.clone())
            .with_api_key(config.api_key.clone());

        Ok(Self {
            client: Client::with_config(openai_config),
            config,
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn build_request(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
    ) -> AppResult<CreateChatCompletionRequest> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(model).messages(messages);
        if !tools.is_empty() {
            builder.tools(tools);
        }
        if let Some(temperature) = self.config.temperature {
            builder.temperature(temperature);
        }
        Ok(builder.build()?)
    }
}

#[async_trait]
impl ChatCompletionClient for LlmClient {
    async fn create(
        &self,
        model: &str,
        messages: &[LlmMessage],
        tools: &[ToolSchema],
    ) -> AppResult<CreateResult> {
        if messages.is_empty() {
            return Err(AppError::Llm("Messages cannot be empty".into()));
        }

        let request = self.build_request(
            model,
            build_request_messages(messages)?,
            build_request_tools(tools)?,
        )?;
        let attempts = self.config.max_retries.max(1);

        let mut attempt = 0;
        loop {
            match self.client.chat().create(request.clone()).await {
                Ok(response) => {
                    let result = parse_response(response)?;
                    debug!("{} answered with {:?}", model, result.finish_reason);
                    return Ok(result);
                }
                Err(e) if attempt + 1 < attempts && is_transient(&e) => {
                    warn!("completion attempt {}/{} for {} failed: {}", attempt + 1, attempts, model, e);
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!("completion for {} failed after {} attempt(s): {}", model, attempt + 1, e);
                    return Err(e.into());
                }
            }
        }
    }
}

/// Doubles from `RETRY_BASE_DELAY`, never above `RETRY_MAX_DELAY`.
fn backoff_delay(attempt: u32) -> Duration {
    2u32.checked_pow(attempt)
        .and_then(|factor| RETRY_BASE_DELAY.checked_mul(factor))
        .map_or(RETRY_MAX_DELAY, |delay| delay.min(RETRY_MAX_DELAY))
}

/// Network failures, 5xx and rate limits may clear up; bad keys and bad requests will not.
fn is_transient(err: &OpenAIError) -> bool {
    match err {
        OpenAIError::Reqwest(_) => true,
        // gateways answer 502/503 with html
        OpenAIError::JSONDeserialize(_) => true,
        OpenAIError::ApiError(api) => api
            .r#type
            .as_deref()
            .map(|t| t.contains("server_error") || t.contains("rate_limit") || t.contains("overloaded"))
            .unwrap_or(false),
        _ => false,
    }
}

fn parse_response(response: CreateChatCompletionResponse) -> AppResult<CreateResult> {
    let usage = response
        .usage
        .map(|u| RequestUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Llm("Invalid response: empty choices array".into()))?;

    let finish_reason = match choice.finish_reason {
        Some(FinishReason::Stop) => FinishReasons::Stop,
        Some(FinishReason::Length) => FinishReasons::Length,
        Some(FinishReason::ToolCalls) | Some(FinishReason::FunctionCall) => FinishReasons::ToolCalls,
        Some(FinishReason::ContentFilter) => FinishReasons::ContentFilter,
        None => FinishReasons::Unknown,
    };

    let calls: Vec<FunctionCall> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| FunctionCall {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect();
    if !calls.is_empty() {
        return Ok(CreateResult {
            finish_reason,
            content: Content::ToolCalls(calls),
            usage,
        });
    }

    if finish_reason == FinishReasons::ContentFilter {
        return Err(AppError::Llm("response was cut by the provider's content filter".into()));
    }
    let text = choice
        .message
        .content
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| {
            AppError::Llm(format!("model returned no content (finish reason {:?})", finish_reason))
        })?;

    Ok(CreateResult {
        finish_reason,
        content: Content::Text(text),
        usage,
    })
}

fn build_request_messages(messages: &[LlmMessage]) -> AppResult<Vec<ChatCompletionRequestMessage>> {
    messages
        .iter()
        .map(|msg| {
            let built = match msg {
                LlmMessage::System { content } => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(content.as_str())
                        .build()?,
                ),
                LlmMessage::User { content } => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(content.as_str())
                        .build()?,
                ),
                LlmMessage::Assistant { content, tool_calls } => {
                    let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                    if let Some(text) = content {
                        args.content(text.as_str());
                    }
                    if !tool_calls.is_empty() {
                        args.tool_calls(
                            tool_calls
                                .iter()
                                .map(|call| ChatCompletionMessageToolCall {
                                    id: call.id.clone(),
                                    r#type: ChatCompletionToolType::Function,
                                    function: OpenAiFunctionCall {
                                        name: call.name.clone(),
                                        arguments: call.arguments.clone(),
                                    },
                                })
                                .collect::<Vec<_>>(),
                        );
                    }
                    ChatCompletionRequestMessage::Assistant(args.build()?)
                }
                LlmMessage::Tool { call_id, content } => ChatCompletionRequestMessage::Tool(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(call_id.as_str())
                        .content(content.as_str())
                        .build()?,
                ),
            };
            Ok(built)
        })
        .collect()
}

fn build_request_tools(tools: &[ToolSchema]) -> AppResult<Vec<ChatCompletionTool>> {
    tools
        .iter()
        .map(|tool| {
            let function = FunctionObjectArgs::default()
                .name(tool.name.as_str())
                .description(tool.description.as_str())
                .parameters(tool.parameters_json())
                .build()?;
            Ok(ChatCompletionToolArgs::default()
                .r#type(ChatCompletionToolType::Function)
                .function(function)
                .build()?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::testing::spawn_scripted_server;
    use crate::tools::web_search_schema;

    fn completion(content: Value, finish_reason: &str) -> (StatusCode, Value) {
        (
            StatusCode::OK,
            json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "created": 1_700_000_000,
                "model": "gpt-4.1",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": content},
                    "finish_reason": finish_reason
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
            }),
        )
    }

    fn api_error(status: StatusCode, kind: &str, message: &str) -> (StatusCode, Value) {
        (status, json!({"error": {"message": message, "type": kind, "param": null, "code": null}}))
    }

    fn client_for(base_url: String, max_retries: u32) -> LlmClient {
        LlmClient::new(LlmConfig {
            base_url,
            api_key: "test-key".into(),
            temperature: None,
            max_retries,
        })
        .unwrap()
    }

    async fn ask(client: &LlmClient) -> AppResult<CreateResult> {
        client
            .create("gpt-4.1", &[LlmMessage::user("Plan a 1-day trip to Tokyo under $300")], &[])
            .await
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let (url, hits) = spawn_scripted_server(
            "/chat/completions",
            vec![
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "server_error", "upstream failed"),
                completion(json!("Day 1: Tsukiji"), "stop"),
            ],
        )
        .await;

        let result = ask(&client_for(url, 3)).await.unwrap();
        assert_eq!(result.content, Content::Text("Day 1: Tsukiji".into()));
        assert_eq!(result.usage.prompt_tokens, 12);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let (url, hits) = spawn_scripted_server(
            "/chat/completions",
            vec![api_error(StatusCode::SERVICE_UNAVAILABLE, "server_error", "overloaded")],
        )
        .await;

        let err = ask(&client_for(url, 2)).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn auth_errors_are_not_retried() {
        let (url, hits) = spawn_scripted_server(
            "/chat/completions",
            vec![api_error(StatusCode::UNAUTHORIZED, "invalid_request_error", "Invalid API key")],
        )
        .await;

        let err = ask(&client_for(url, 5)).await.unwrap_err();
        assert!(err.to_string().contains("Invalid API key"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn filtered_or_empty_replies_are_errors() {
        let (url, _) = spawn_scripted_server(
            "/chat/completions",
            vec![completion(Value::Null, "content_filter"), completion(json!("  "), "stop")],
        )
        .await;
        let client = client_for(url, 1);

        let filtered = ask(&client).await.unwrap_err();
        assert!(filtered.to_string().contains("content filter"));
        let empty = ask(&client).await.unwrap_err();
        assert!(empty.to_string().contains("no content"));
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        assert_eq!(backoff_delay(0), Duration::from_millis(100));
        assert_eq!(backoff_delay(3), Duration::from_millis(800));
        assert_eq!(backoff_delay(20), RETRY_MAX_DELAY);
        assert_eq!(backoff_delay(64), RETRY_MAX_DELAY);
    }

    #[test]
    fn rejects_missing_api_key() {
        let err = LlmClient::new(LlmConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn maps_every_message_kind() {
        let messages = vec![
            LlmMessage::system("be helpful"),
            LlmMessage::user("Plan a 2-day trip to Seoul under $800"),
            LlmMessage::assistant_tool_calls(vec![FunctionCall {
                id: "call_1".into(),
                name: "ask_budget_specialist".into(),
                arguments: r#"{"input":"costs in Seoul"}"#.into(),
            }]),
            LlmMessage::tool_result("call_1", "about 80 SGD a day"),
            LlmMessage::assistant_text("Day 1 ..."),
        ];

        let built = build_request_messages(&messages).unwrap();
        assert_eq!(built.len(), 5);
        assert!(matches!(built[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(built[1], ChatCompletionRequestMessage::User(_)));
        match &built[2] {
            ChatCompletionRequestMessage::Assistant(a) => {
                let calls = a.tool_calls.as_ref().unwrap();
                assert_eq!(calls[0].function.name, "ask_budget_specialist");
            }
            other => panic!("unexpected message {:?}", other),
        }
        match &built[3] {
            ChatCompletionRequestMessage::Tool(t) => assert_eq!(t.tool_call_id, "call_1"),
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn maps_tool_schemas_to_functions() {
        let tools = build_request_tools(&[web_search_schema()]).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function.name, "web_search");
        assert_eq!(tools[0].function.parameters.as_ref().unwrap()["required"][0], "query");
    }
}
