use std::sync::Arc;

use crate::tools::{web_search_schema, ToolSchema, WEB_SEARCH_TOOL_NAME};
use crate::types::AgentSpec;

/// A capability resolved into something the runner can execute.
#[derive(Debug)]
pub enum AgentTool {
    WebSearch,
    Specialist { schema: ToolSchema, agent: Arc<Agent> },
}

impl AgentTool {
    pub fn name(&self) -> &str {
        match self {
            AgentTool::WebSearch => WEB_SEARCH_TOOL_NAME,
            AgentTool::Specialist { schema, .. } => &schema.name,
        }
    }

    pub fn schema(&self) -> ToolSchema {
        match self {
            AgentTool::WebSearch => web_search_schema(),
            AgentTool::Specialist { schema, .. } => schema.clone(),
        }
    }
}

/// An immutable agent: its declaration plus its resolved tools.
#[derive(Debug)]
pub struct Agent {
    spec: AgentSpec,
    tools: Vec<AgentTool>,
}

impl Agent {
    pub fn new(spec: AgentSpec, tools: Vec<AgentTool>) -> Self {
        Self { spec, tools }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn model(&self) -> &str {
        &self.spec.model
    }

    pub fn instructions(&self) -> &str {
        &self.spec.instructions
    }

    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    pub fn tools(&self) -> &[AgentTool] {
        &self.tools
    }

    pub fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(AgentTool::schema).collect()
    }

    pub fn find_tool(&self, name: &str) -> Option<&AgentTool> {
        self.tools.iter().find(|t| t.name() == name)
    }
}
