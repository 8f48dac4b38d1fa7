//! # toolpipe-core
//!
//! Runs one registered tool package on behalf of an LLM agent.
//!
//! A request names a package export and carries a natural-language prompt.
//! The pipeline turns the tool's declared parameters into a JSON Schema,
//! hands the model exactly that one tool, validates every call the model
//! makes against the schema, executes it through a [`PackageExecutor`] and
//! streams text, token estimates and completion events back to the caller.
//!
//! ## Layout
//!
//! - [`config`] - TOML configuration (`config/toolpipe.toml`)
//! - [`domain`] - chat messages, tool/package records, execution results
//! - [`application`] - schema adapter, tool definitions, estimator, catalog, agent runner
//! - [`infrastructure`] - package executors, model provider clients, REST/SSE server
//!
//! [`PackageExecutor`]: infrastructure::executor::PackageExecutor

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, catalog, definition, estimator, schema};
pub use config::AppConfig;
pub use domain::{tool, types};
pub use infrastructure::{executor, model, server};
