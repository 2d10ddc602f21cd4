//! SES message CLI
//!
//! Compose an outbound SES message from flags, files or URLs, then print or
//! check it before handing it to a sender.

mod commands;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sarasa_ses::FetchConfig;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

/// Compose and validate outbound SES messages.
#[derive(Parser, Debug)]
#[command(name = "ses-message", version, about)]
struct Cli {
    /// TOML file with HTTP fetch settings for `--text-url`/`--html-url`.
    #[arg(long, env = "SES_MESSAGE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a message and print it.
    Show(commands::compose::ComposeArgs),
    /// Compose a message and report whether it is complete enough to send.
    Check(commands::compose::ComposeArgs),
}

fn load_fetch_config(path: Option<&Path>) -> anyhow::Result<FetchConfig> {
    let Some(path) = path else {
        return Ok(FetchConfig::default());
    };
    let raw = std::fs::read_to_string(path)?;
    let config: FetchConfig = toml::from_str(&raw)?;
    debug!(path = %path.display(), ?config, "loaded fetch config");
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let fetch_config = load_fetch_config(cli.config.as_deref())?;

    match cli.command {
        Command::Show(args) => commands::show::run(&args, &fetch_config, &cli.format),
        Command::Check(args) => commands::check::run(&args, &fetch_config, &cli.format),
    }
}
