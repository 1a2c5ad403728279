use std::path::Path;

use anyhow::{Context, Result};
use cfdriver_core::MetadataKind;
use cfdriver_engine::{Attributes, Outcome, Provider, Request, Response};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::output::{print_gate, to_line};

fn rejected(message: String) -> Response {
    Response {
        id: String::new(),
        attributes: Attributes::new(),
        outcome: Outcome::Error {
            message,
            category: "validation".into(),
        },
    }
}

pub async fn apply(provider: &Provider, file: &Path) -> Result<()> {
    let raw = if file == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read request from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?
    };
    let request: Request = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid request in {}", file.display()))?;

    let response = provider.handle(request).await;
    let mut stdout = tokio::io::stdout();
    stdout.write_all(to_line(&response)?.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

/// Answers one response line per request line until stdin closes.
pub async fn serve(provider: &Provider) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut handled = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => provider.handle(request).await,
            Err(e) => {
                debug!(error = %e, "rejecting malformed request");
                rejected(format!("invalid request: {e}"))
            }
        };
        stdout.write_all(to_line(&response)?.as_bytes()).await?;
        stdout.flush().await?;
        handled += 1;
    }

    info!(handled, "stdin closed, stopping");
    Ok(())
}

pub fn info(provider: &Provider) -> Result<()> {
    let session = provider
        .session()
        .context("No session configured")?;
    let version = session.api_version();
    println!(
        "{}: {}",
        "API version".cyan(),
        if version.is_empty() { "(unknown)" } else { version }
    );
    println!("{}:", "Metadata".cyan());
    for kind in MetadataKind::ALL {
        print_gate(kind.as_str(), session.metadata_available(kind));
    }
    println!(
        "{}: {}",
        "Resources".cyan(),
        provider.resource_kinds().count()
    );
    println!(
        "{}: {}",
        "Data sources".cyan(),
        provider.data_source_kinds().count()
    );
    Ok(())
}
