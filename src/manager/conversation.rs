use serde::{Deserialize, Serialize};

use crate::types::ConversationMessage;

/// Two message logs per session: the round being shown and everything before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub active: Vec<ConversationMessage>,
    pub archived: Vec<ConversationMessage>,
    /// Message of the last failed round, cleared by the next successful one.
    #[serde(default)]
    pub last_error: Option<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a round. A finished round (user + assistant) still sitting in
    /// `active` moves to `archived` first, so the model only sees `request`.
    pub fn begin_round(&mut self, request: impl Into<String>) {
        if self.active.len() >= 2 {
            self.archived.append(&mut self.active);
        }
        self.active.push(ConversationMessage::user(request));
    }

    pub fn complete_round(&mut self, reply: impl Into<String>) {
        self.active.push(ConversationMessage::assistant(reply));
        self.last_error = None;
    }

    /// Drops the pending user message of a round that failed.
    pub fn abort_round(&mut self, error: impl Into<String>) {
        self.active.pop();
        self.last_error = Some(error.into());
    }

    /// "New chat": forget the current round, keep the archive.
    pub fn new_chat(&mut self) {
        self.active.clear();
        self.last_error = None;
    }

    /// Clears both logs.
    pub fn reset(&mut self) {
        self.active.clear();
        self.archived.clear();
        self.last_error = None;
    }

    /// Context handed to the model for the current round.
    pub fn context(&self) -> &[ConversationMessage] {
        &self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.archived.is_empty()
    }
}
