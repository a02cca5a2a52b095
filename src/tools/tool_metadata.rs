use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::{AppError, AppResult};

pub const WEB_SEARCH_TOOL_NAME: &str = "web_search";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: ParametersSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: Value,
    pub required: Vec<String>,
}

impl ToolSchema {
    /// Schema for an agent exposed as a tool: one free-text `input` argument.
    pub fn agent_tool(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ParametersSchema {
                schema_type: "object".to_string(),
                properties: json!({
                    "input": { "type": "string", "description": "The question or task for the specialist." }
                }),
                required: vec!["input".to_string()],
            },
        }
    }

    pub fn parameters_json(&self) -> Value {
        json!({
            "type": self.parameters.schema_type,
            "properties": self.parameters.properties,
            "required": self.parameters.required,
            "additionalProperties": false,
        })
    }
}

/// Tool definition format (OpenAI function calling).
#[derive(Deserialize)]
struct ToolDef {
    #[serde(rename = "function")]
    function: FunctionDef,
}

#[derive(Deserialize)]
struct FunctionDef {
    name: String,
    description: String,
    parameters: ParametersDef,
}

#[derive(Deserialize)]
struct ParametersDef {
    #[serde(rename = "type")]
    schema_type: String,
    properties: Value,
    required: Vec<String>,
}

pub fn load_tool(tooldef_json: &str) -> AppResult<ToolSchema> {
    let tooldef: ToolDef = serde_json::from_str(tooldef_json)
        .map_err(|e| AppError::Internal(format!("bad tool definition: {}", e)))?;

    Ok(ToolSchema {
        name: tooldef.function.name,
        description: tooldef.function.description,
        parameters: ParametersSchema {
            schema_type: tooldef.function.parameters.schema_type,
            properties: tooldef.function.parameters.properties,
            required: tooldef.function.parameters.required,
        },
    })
}

const TOOL_WEB_SEARCH_JSON: &str = r#"{
    "function": {
        "name": "web_search",
        "description": "Searches the web with the given query and returns the top results with their titles, links and snippets. Keep the query simple and don't use compound queries.",
        "parameters": {
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "The web search query to use." }
            },
            "required": ["query"]
        }
    }
}"#;

pub fn web_search_schema() -> ToolSchema {
    load_tool(TOOL_WEB_SEARCH_JSON).expect("built-in web_search definition is valid JSON")
}
