use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentTool};
use super::catalog;
use crate::config::TravelDefaults;
use crate::tools::ToolSchema;
use crate::types::{AgentSpec, AppError, AppResult, Capability};

/// The declared agent graph: every persona plus the one that receives user requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRoster {
    pub entry: String,
    pub agents: Vec<AgentSpec>,
}

impl AgentRoster {
    pub fn builtin(travel: &TravelDefaults) -> Self {
        Self {
            entry: catalog::TRAVEL_AGENT.to_string(),
            agents: vec![
                catalog::budget_agent(),
                catalog::planner_agent(),
                catalog::guide_agent(),
                catalog::travel_agent(travel),
            ],
        }
    }

    pub fn from_yaml_str(yaml: &str) -> AppResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        info!("loading agent roster from {}", path.display());
        Self::from_yaml_str(&raw)
    }

    /// Either the YAML roster at `path` or the built-in personas.
    pub fn load(path: Option<&Path>, travel: &TravelDefaults) -> AppResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin(travel)),
        }
    }

    /// Resolves specialist references and returns the entry agent.
    pub fn build(&self) -> AppResult<Arc<Agent>> {
        let mut specs: HashMap<&str, &AgentSpec> = HashMap::new();
        for spec in &self.agents {
            if specs.insert(spec.name.as_str(), spec).is_some() {
                return Err(AppError::Config(format!("agent {} is declared twice", spec.name)));
            }
        }

        let mut built: HashMap<String, Arc<Agent>> = HashMap::new();
        let mut visiting = HashSet::new();
        resolve(&self.entry, &specs, &mut built, &mut visiting)
    }
}

fn resolve(
    name: &str,
    specs: &HashMap<&str, &AgentSpec>,
    built: &mut HashMap<String, Arc<Agent>>,
    visiting: &mut HashSet<String>,
) -> AppResult<Arc<Agent>> {
    if let Some(agent) = built.get(name) {
        return Ok(Arc::clone(agent));
    }
    let spec = *specs
        .get(name)
        .ok_or_else(|| AppError::Config(format!("unknown agent {}", name)))?;
    if !visiting.insert(name.to_string()) {
        return Err(AppError::Config(format!("agent {} refers to itself through its tools", name)));
    }

    let mut tools = Vec::with_capacity(spec.capabilities.len());
    let mut tool_names = HashSet::new();
    for capability in &spec.capabilities {
        let tool = match capability {
            Capability::WebSearch => AgentTool::WebSearch,
            Capability::Specialist { tool_name, tool_description, agent } => {
                let specialist = resolve(agent, specs, built, visiting)?;
                let description = tool_description
                    .clone()
                    .or_else(|| specialist.spec().handoff_description.clone())
                    .unwrap_or_else(|| format!("Ask {}", specialist.name()));
                AgentTool::Specialist {
                    schema: ToolSchema::agent_tool(tool_name.clone(), description),
                    agent: specialist,
                }
            }
        };
        if !tool_names.insert(tool.name().to_string()) {
            return Err(AppError::Config(format!(
                "agent {} has two tools named {}",
                spec.name,
                tool.name()
            )));
        }
        tools.push(tool);
    }

    visiting.remove(name);
    let agent = Arc::new(Agent::new(spec.clone(), tools));
    built.insert(name.to_string(), Arc::clone(&agent));
    Ok(agent)
}
