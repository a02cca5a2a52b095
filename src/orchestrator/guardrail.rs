use async_trait::async_trait;

use crate::types::{AppResult, ConversationMessage, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailOutput {
    pub tripwire_triggered: bool,
    pub reason: Option<String>,
}

impl GuardrailOutput {
    pub fn pass() -> Self {
        Self {
            tripwire_triggered: false,
            reason: None,
        }
    }

    pub fn trip(reason: impl Into<String>) -> Self {
        Self {
            tripwire_triggered: true,
            reason: Some(reason.into()),
        }
    }
}

/// Screens the input of a top-level run before any model call is made.
#[async_trait]
pub trait InputGuardrail: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, input: &[ConversationMessage]) -> AppResult<GuardrailOutput>;
}

/// Trips when the latest user message is blank or longer than `max_chars`.
pub struct InputLengthGuardrail {
    max_chars: usize,
}

impl InputLengthGuardrail {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

#[async_trait]
impl InputGuardrail for InputLengthGuardrail {
    fn name(&self) -> &str {
        "input_length"
    }

    async fn check(&self, input: &[ConversationMessage]) -> AppResult<GuardrailOutput> {
        let latest = input.iter().rev().find(|m| m.role == Role::User);
        let output = match latest {
            None => GuardrailOutput::trip("no user message"),
            Some(msg) if msg.content.trim().is_empty() => GuardrailOutput::trip("input is empty"),
            Some(msg) if msg.content.chars().count() > self.max_chars => GuardrailOutput::trip(format!(
                "input is longer than {} characters",
                self.max_chars
            )),
            Some(_) => GuardrailOutput::pass(),
        };
        Ok(output)
    }
}
