pub mod agents;
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod llm;
pub mod manager;
pub mod orchestrator;
pub mod tools;
pub mod types;

#[cfg(test)]
mod testing;

pub use app::App;
pub use config::AppConfig;
pub use types::{AppError, AppResult};
