use serde::{Deserialize, Serialize};

/// What an agent may call while it reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Capability {
    WebSearch,
    /// Another agent exposed as a callable tool. `agent` is that agent's name.
    Specialist {
        tool_name: String,
        #[serde(default)]
        tool_description: Option<String>,
        agent: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub handoff_description: Option<String>,
    pub instructions: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, model: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            handoff_description: None,
            instructions: instructions.into(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_handoff_description(mut self, description: impl Into<String>) -> Self {
        self.handoff_description = Some(description.into());
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn has_web_search(&self) -> bool {
        self.capabilities.contains(&Capability::WebSearch)
    }
}
