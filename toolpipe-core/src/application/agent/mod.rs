//! # Agent Module
//!
//! Drives a model through a tool-calling conversation with exactly one bound
//! tool, either blocking or streamed.
//!
//! ## Key Types
//!
//! - [`AgentRunner`] - runs a prompt against a [`ToolDefinition`](crate::definition::ToolDefinition)
//! - [`AgentSettings`] - provider, model and limits of a run
//! - [`AgentOutcome`] / [`AgentOutput`] - result of a blocking run
//! - [`ExecutionEvent`] - progress of a streamed run
//! - [`PendingRun`] / [`ActiveRun`] / [`FinishedRun`] - per-run lifecycle
//!
//! ## Agent Loop
//!
//! 1. Send `[system?, user]` and the tool spec to the model
//! 2. Execute every tool call the model requests, answering with tool messages
//! 3. Ask again until the model stops calling tools or `max_steps` is reached
//! 4. Estimate tokens and cost for the run

mod errors;
mod events;
mod models;
mod runner;
mod state;


pub use errors::AgentError;
pub use events::ExecutionEvent;
pub use models::{AgentOutcome, AgentOutput, AgentSettings};
pub use runner::AgentRunner;
pub use state::{ActiveRun, ExecutionState, FinishedRun, PendingRun, RunMode};
