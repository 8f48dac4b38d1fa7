use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::Path;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::mpsc;
use toolpipe_core::agent::{AgentRunner, AgentSettings, ExecutionEvent};
use toolpipe_core::catalog::{Catalog, paginate};
use toolpipe_core::config::AppConfig;
use toolpipe_core::definition::{ExecutionOptions, ToolDefinition, create_tool_definition, tool_key};
use toolpipe_core::executor::{self, PackageExecutor};
use toolpipe_core::model::DynamicModelProvider;
use toolpipe_core::server::routes::execute::parse_target;
use toolpipe_core::server::{self, ServerState};
use toolpipe_log::ExecutionLog;
use toolpipe_tools::ToolRegistry;
use tracing::{debug, info, warn};

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Everything a command needs, built from the configuration.
struct Runtime {
    config: AppConfig,
    catalog: Catalog,
    executor: Arc<dyn PackageExecutor>,
    options: ExecutionOptions,
}

impl Runtime {
    fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let config = AppConfig::load(path)?;
        let registry = ToolRegistry::builtin();
        let catalog = Catalog::load(&registry, config.catalog.as_deref())?;
        let executor = executor::from_config(&config.executor, registry)?;
        let options = ExecutionOptions::from(&config.executor);
        info!(
            packages = catalog.len(),
            tools = catalog.tool_count(),
            executor = ?config.executor.kind,
            "Runtime initialised"
        );
        Ok(Self {
            config,
            catalog,
            executor,
            options,
        })
    }

    fn runner(&self) -> AgentRunner<DynamicModelProvider> {
        let provider = DynamicModelProvider::from_configs(&self.config.providers);
        AgentRunner::new(Arc::new(provider), AgentSettings::from_config(&self.config))
    }

    fn definition(&self, target: &str) -> Result<ToolDefinition, CliError> {
        let (package_name, export_name) =
            parse_target(target).ok_or_else(|| CliError::InvalidTarget(target.to_string()))?;
        let (package, tool) = self
            .catalog
            .find(&package_name, export_name.as_deref())
            .ok_or_else(|| CliError::UnknownTool(target.to_string()))?;
        Ok(create_tool_definition(
            package,
            tool,
            Arc::clone(&self.executor),
            self.options.clone(),
        )?)
    }
}

pub async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let runtime = Runtime::load(cli.config.as_deref())?;
    match cli.command {
        Command::Serve { bind } => serve(runtime, bind).await,
        Command::Run {
            target,
            prompt,
            prompt_file,
            stream,
            show_log,
        } => {
            let prompt = load_prompt(&prompt, prompt_file.as_deref())?;
            if stream {
                run_streaming(&runtime, &target, &prompt, show_log).await
            } else {
                run_blocking(&runtime, &target, &prompt, show_log).await
            }
        }
        Command::Tools { page, limit } => list_tools(&runtime, page, limit),
        Command::Exec { target, params } => exec(&runtime, &target, &params).await,
    }
}

async fn serve(runtime: Runtime, bind: Option<std::net::SocketAddr>) -> Result<(), CliError> {
    let addr = bind.unwrap_or(runtime.config.server.bind);
    let runner = runtime.runner();
    let state = ServerState::new(
        runner,
        runtime.catalog,
        runtime.executor,
        runtime.options,
        runtime.config.rate_limit,
    );
    info!(%addr, "Starting REST server");
    server::serve(state, addr, &runtime.config.server.cors_origins).await?;
    Ok(())
}

async fn run_blocking(
    runtime: &Runtime,
    target: &str,
    prompt: &str,
    show_log: bool,
) -> Result<(), CliError> {
    let definition = runtime.definition(target)?;
    let outcome = runtime.runner().run(prompt, &definition).await?;
    let mut output = json!({
        "tool": definition.name(),
        "output": outcome.output,
        "text": outcome.text,
        "tokens": outcome.tokens,
        "agentSteps": outcome.agent_steps,
        "executionTimeMs": outcome.execution_time_ms,
    });
    if show_log {
        output["log"] = outcome.log.to_json();
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_streaming(
    runtime: &Runtime,
    target: &str,
    prompt: &str,
    show_log: bool,
) -> Result<(), CliError> {
    let definition = runtime.definition(target)?;
    let runner = runtime.runner();
    let (tx, mut rx) = mpsc::channel(64);

    let printer = tokio::spawn(async move {
        let mut stdout = io::stdout();
        while let Some(event) = rx.recv().await {
            match event {
                ExecutionEvent::Chunk { text } => {
                    let _ = write!(stdout, "{text}");
                    let _ = stdout.flush();
                }
                ExecutionEvent::Tokens(tokens) => debug!(
                    total = tokens.total_tokens,
                    cost = tokens.estimated_cost,
                    "Token estimate"
                ),
                ExecutionEvent::Complete { .. } => {
                    let _ = writeln!(stdout);
                }
                ExecutionEvent::Error { message } => {
                    warn!(error = message.as_str(), "Execution failed")
                }
            }
        }
    });

    let result = runner.run_streaming(prompt, &definition, tx).await;
    if let Err(err) = printer.await {
        warn!(%err, "Output task stopped unexpectedly");
    }
    let finished = result?;
    if show_log {
        print_log(finished.log());
    }
    Ok(())
}

fn list_tools(runtime: &Runtime, page: usize, limit: usize) -> Result<(), CliError> {
    let rows: Vec<Value> = runtime
        .catalog
        .tools()
        .into_iter()
        .map(|(package, tool)| {
            json!({
                "name": tool_key(&package.name, &tool.export_name),
                "package": package.name,
                "export": tool.export_name,
                "description": tool.description,
            })
        })
        .collect();
    let page = paginate(&rows, Some(page), Some(limit));
    let output = json!({
        "tools": page.items,
        "page": page.page,
        "totalPages": page.total_pages(),
        "total": page.total,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn exec(runtime: &Runtime, target: &str, params: &str) -> Result<(), CliError> {
    let params: Value = serde_json::from_str(params).map_err(CliError::InvalidParams)?;
    let definition = runtime.definition(target)?;
    info!(tool = definition.name(), "Executing tool without a model");
    let output = definition.execute(params).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_log(log: &ExecutionLog) {
    for entry in log.entries() {
        eprintln!("{entry}");
    }
}

fn load_prompt(words: &[String], file: Option<&Path>) -> Result<String, CliError> {
    if let Some(path) = file {
        info!(path = %path.display(), "Loading prompt from file");
        return non_empty(fs::read_to_string(path)?);
    }
    if !words.is_empty() {
        return non_empty(words.join(" "));
    }
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        info!("Reading prompt from standard input");
        let mut buffer = String::new();
        stdin.lock().read_to_string(&mut buffer)?;
        return non_empty(buffer);
    }
    Err(CliError::MissingPrompt)
}

fn non_empty(prompt: String) -> Result<String, CliError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(CliError::MissingPrompt);
    }
    Ok(trimmed.to_string())
}
