pub mod guardrail;
pub mod runner;

pub use guardrail::{GuardrailOutput, InputGuardrail, InputLengthGuardrail};
pub use runner::{RunResult, Runner, ToolInvocation};
