use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::llm::gateways::DeepSeekGateway;
use crate::llm::CompletionGateway;

pub mod ask;
pub mod chat;
pub mod config;
pub mod context;
pub mod fs;
pub mod generate;
pub mod php;
pub mod prompt;
pub mod render;
pub mod run;

#[derive(Subcommand)]
enum Command {
    /// Ask DeepSeek a question
    Ask {
        /// Your question
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,

        /// Include file contents as context
        #[arg(short, long, num_args = 1..)]
        file: Vec<PathBuf>,

        /// Model to use instead of the configured one
        #[arg(long)]
        model: Option<String>,

        /// Print the answer as it arrives
        #[arg(long, default_value = "false")]
        stream: bool,
    },
    /// Interactive chat with DeepSeek
    Chat {},
    /// Generate code with AI
    Generate {
        /// What to generate
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,

        /// Programming language
        #[arg(short, long, default_value = "typescript")]
        language: String,
    },
    /// PHP/WordPress commands
    Php {
        /// Action: plugin, theme, analyze
        action: String,

        /// Additional arguments
        args: Vec<String>,
    },
    /// Configure FORGE settings (default: list)
    Config {
        #[command(subcommand)]
        action: Option<config::ConfigAction>,
    },
    /// File commands
    Fs {
        #[command(subcommand)]
        action: fs::FsAction,
    },
    /// Run a shell command and have DeepSeek explain failures
    Run {
        /// Command line, passed to the shell
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,

        /// Working directory
        #[arg(short = 'C', long)]
        cwd: Option<PathBuf>,

        /// Timeout in seconds
        #[arg(short, long, default_value_t = 60)]
        timeout: u64,

        /// Skip the analysis of failed or noisy commands
        #[arg(long)]
        no_analyze: bool,

        /// Extra environment variables (KEY=VALUE)
        #[arg(short, long)]
        env: Vec<String>,
    },
}

#[derive(Parser)]
#[command(name = "forge", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

pub async fn run() -> Result<()> {
    init_tracing();
    let args = Cli::parse();

    match args.command {
        Command::Ask {
            prompt,
            file,
            model,
            stream,
        } => {
            ask::run(&prompt.join(" "), &file, model, stream).await?;
        }
        Command::Chat {} => {
            chat::run().await?;
        }
        Command::Generate {
            description,
            language,
        } => {
            generate::run(&description.join(" "), &language).await?;
        }
        Command::Php { action, args } => {
            php::run(&action, &args).await?;
        }
        Command::Config { action } => {
            config::run(action)?;
        }
        Command::Fs { action } => {
            fs::run(action).await?;
        }
        Command::Run {
            command,
            cwd,
            timeout,
            no_analyze,
            env,
        } => {
            run::run(&command.join(" "), cwd, Duration::from_secs(timeout), !no_analyze, &env)
                .await?;
        }
    }

    Ok(())
}

/// Logs go to stderr and default to `warn` so they stay out of the chat output.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Build the gateway every command shares. Fails before any request when the
/// API key is missing.
pub(crate) fn gateway(model: Option<String>) -> Result<Arc<dyn CompletionGateway>> {
    let mut config = GatewayConfig::from_env().map_err(|e| {
        anyhow::anyhow!(
            "{e}\nSet it with: export {}='your-key' or forge config set deepseek.api_key YOUR_KEY",
            crate::config::API_KEY_VAR
        )
    })?;
    if let Some(model) = model {
        config = config.with_model(model);
    }
    Ok(Arc::new(DeepSeekGateway::new(config)?))
}
