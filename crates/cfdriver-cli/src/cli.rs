use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cfdriver")]
#[command(about = "Desired-state driver for Cloud Foundry")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./cfdriver.toml when present)
    #[arg(short, long, global = true, env = "CFDRIVER_CONFIG")]
    pub config: Option<String>,

    /// Cloud Controller URL (overrides config)
    #[arg(long, global = true, env = "CF_API")]
    pub api_url: Option<String>,

    /// Bearer token (overrides config)
    #[arg(long, global = true, env = "CF_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single request read from a JSON file ("-" for stdin)
    Apply(ApplyArgs),
    /// Answer newline-delimited JSON requests from stdin until EOF
    Serve,
    /// Show the negotiated API version and metadata support
    Info,
}

#[derive(clap::Args)]
pub struct ApplyArgs {
    /// Request file
    #[arg(short, long)]
    pub file: PathBuf,
}
