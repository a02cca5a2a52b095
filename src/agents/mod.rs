pub mod agent;
pub mod catalog;
pub mod roster;

pub use agent::{Agent, AgentTool};
pub use roster::AgentRoster;
