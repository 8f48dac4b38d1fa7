use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "toolpipe",
    version,
    about = "Let an LLM agent call one registered tool package"
)]
pub struct Cli {
    /// Configuration file (default: config/toolpipe.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Only log warnings and errors
    #[arg(long, short, global = true)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the REST/SSE server
    Serve {
        /// Override `[server].bind`
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Run a prompt against one tool through the configured model
    Run {
        /// `package[/export]`, e.g. `@toolpipe/text-chunk`
        target: String,
        /// Prompt text; read from --prompt-file or stdin when omitted
        prompt: Vec<String>,
        #[arg(long)]
        prompt_file: Option<PathBuf>,
        /// Print text as it is generated instead of a JSON summary
        #[arg(long)]
        stream: bool,
        /// Append the execution log to the output
        #[arg(long)]
        show_log: bool,
    },
    /// List the tools in the catalog
    Tools {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Execute a tool directly with JSON parameters, without a model
    Exec {
        /// `package[/export]`
        target: String,
        /// JSON object with the tool parameters
        #[arg(long, default_value = "{}")]
        params: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_global_config() {
        let cli = Cli::try_parse_from([
            "toolpipe",
            "run",
            "@toolpipe/text-chunk",
            "split",
            "this",
            "--config",
            "custom.toml",
            "--stream",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        let Command::Run {
            target,
            prompt,
            stream,
            ..
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(target, "@toolpipe/text-chunk");
        assert_eq!(prompt, ["split", "this"]);
        assert!(stream);
    }

    #[test]
    fn exec_defaults_to_empty_params() {
        let cli = Cli::try_parse_from(["toolpipe", "exec", "@toolpipe/lead-score"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Exec {
                target: "@toolpipe/lead-score".into(),
                params: "{}".into(),
            }
        );
    }

    #[test]
    fn serve_requires_valid_bind() {
        assert!(Cli::try_parse_from(["toolpipe", "serve", "--bind", "nope"]).is_err());
    }
}
