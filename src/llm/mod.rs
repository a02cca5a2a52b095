pub mod client;

pub use client::{ChatCompletionClient, Content, CreateResult, FinishReasons, LlmClient};
