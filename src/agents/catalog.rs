//! Built-in agent personas.

use crate::config::TravelDefaults;
use crate::types::{AgentSpec, Capability};

pub const SPECIALIST_MODEL: &str = "gpt-4.1-mini";
pub const ORCHESTRATOR_MODEL: &str = "gpt-4.1";

pub const BUDGET_AGENT: &str = "Budget Agent";
pub const PLANNER_AGENT: &str = "Planner Agent";
pub const GUIDE_AGENT: &str = "Local Guide Agent";
pub const TRAVEL_AGENT: &str = "Travel Agent";

pub fn budget_agent() -> AgentSpec {
    AgentSpec::new(
        BUDGET_AGENT,
        SPECIALIST_MODEL,
        "You are a budget planner, you will search the internet and provide the average event cost as well as daily cost for mentioned activities or dining in the given country, minimize the expense while ensuring the total cost of all activities is within the defined budget at all times, include flight cost and transport cost in the total budget planning.",
    )
    .with_handoff_description("Specialist agent for Budget Planning")
    .with_capability(Capability::WebSearch)
}

pub fn planner_agent() -> AgentSpec {
    AgentSpec::new(
        PLANNER_AGENT,
        SPECIALIST_MODEL,
        "You are a trip planner, you will search the internet and provide the approximate duration spend for mentioned activities or dining in the given country, ensure that the total time spend is within the depicted number of days, ensure to allocate sufficient time for rest or unexpected changes.",
    )
    .with_handoff_description("Specialist agent for activity scheduling")
    .with_capability(Capability::WebSearch)
}

pub fn guide_agent() -> AgentSpec {
    AgentSpec::new(
        GUIDE_AGENT,
        SPECIALIST_MODEL,
        "You are a Guide Specialist, you will search the internet for the best rated tourist attraction activities or dining recommendations in the mentioned country.",
    )
    .with_handoff_description(
        "Specialist agent for identifying and providing the ratings for the most highly rated attractions or dining recommendations",
    )
    .with_capability(Capability::WebSearch)
}

pub fn travel_agent(travel: &TravelDefaults) -> AgentSpec {
    let instructions = format!(
        r#"You are a helpful orchestrator agent. Your role is to analyze the user's question and determine which specialist agent (budget, planner, or guide) is best equipped to provide an answer.
You must use the appropriate tool to ask the relevant specialist agent. If the question does not fit into these categories,
provide a general helpful response. You should always aim to use one of the specialist tools if applicable.
include the ratings for each activity in the itinerary.
include the total daily expenses for each day in the itinerary.
include each activity expenses in the itinerary.
include the total time spend for each day in the itinerary.
include the each activity time spend in the itinerary.
assume the country of origin is {country}.
calculate all cost in {currency}."#,
        country = travel.origin_country,
        currency = travel.currency,
    );

    AgentSpec::new(TRAVEL_AGENT, ORCHESTRATOR_MODEL, instructions)
        .with_capability(specialist("ask_budget_specialist", BUDGET_AGENT))
        .with_capability(specialist("ask_planner_specialist", PLANNER_AGENT))
        .with_capability(specialist("ask_activity_specialist", GUIDE_AGENT))
}

fn specialist(tool_name: &str, agent: &str) -> Capability {
    Capability::Specialist {
        tool_name: tool_name.to_string(),
        tool_description: None,
        agent: agent.to_string(),
    }
}
