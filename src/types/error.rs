use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
	#[error("Configuration error: {0}")]
	Config(String),

	#[error("LLM request failed: {0}")]
	Llm(String),

	#[error("Web search failed: {0}")]
	Search(String),

	#[error("Invalid arguments for tool {tool}: {reason}")]
	ToolArguments { tool: String, reason: String },

	#[error("Max turns ({0}) exceeded")]
	MaxTurnsExceeded(usize),

	#[error("Input guardrail {guardrail} triggered: {reason}")]
	GuardrailTripwire { guardrail: String, reason: String },

	#[error("Session not found: {0}")]
	SessionNotFound(String),

	#[error("Session storage error: {0}")]
	Storage(String),

	#[error("Template error: {0}")]
	Template(#[from] minijinja::Error),

	#[error("Internal error: {0}")]
	Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<async_openai::error::OpenAIError> for AppError {
	fn from(err: async_openai::error::OpenAIError) -> Self {
		AppError::Llm(err.to_string())
	}
}

impl From<reqwest::Error> for AppError {
	fn from(err: reqwest::Error) -> Self {
		AppError::Search(err.to_string())
	}
}

impl From<serde_yaml::Error> for AppError {
	fn from(err: serde_yaml::Error) -> Self {
		AppError::Config(err.to_string())
	}
}
