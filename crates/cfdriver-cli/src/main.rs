mod cli;
mod commands;
mod config;
mod observability;
mod output;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use cfdriver_client::Session;
use cfdriver_engine::Provider;
use clap::Parser;
use tracing::{debug, info, warn};

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    observability::init_logging("info");

    let mut cfg = config::loader::load_config(cli.config.as_deref()).map_err(|e| anyhow!(e))?;
    cfg.apply_overrides(cli.api_url.as_deref(), cli.token.as_deref());
    cfg.validate().map_err(|e| anyhow!(e))?;
    if !observability::set_log_level(&cfg.logging.level) {
        debug!(level = %cfg.logging.level, "configured log level not applied");
    }

    let session = Session::connect(&cfg.session_config())
        .await
        .with_context(|| format!("Failed to connect to {}", cfg.api.url))?;
    info!(api = %cfg.api.url, version = session.api_version(), "connected");
    let session = Arc::new(session);

    // Ctrl-C stops outstanding reads; writes already sent complete.
    let signal_session = session.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling session");
            signal_session.cancel();
        }
    });

    let provider = Provider::new(Some(session));
    match &cli.command {
        Commands::Apply(args) => commands::apply(&provider, &args.file).await?,
        Commands::Serve => commands::serve(&provider).await?,
        Commands::Info => commands::info(&provider)?,
    }
    Ok(())
}
