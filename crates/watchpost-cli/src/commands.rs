//! Implementations of the console subcommands.

use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use watchpost_link::{DeviceLink, LinkState};
use watchpost_types::{CommandCatalog, LinkConfig};

/// `watchpost palette` -- print the command palette.
pub fn run_palette() -> anyhow::Result<()> {
    let catalog = CommandCatalog::standard();
    for descriptor in catalog.list() {
        println!("{:<8} {}", descriptor.mnemonic, descriptor.command);
        for (index, slot) in descriptor.usage.iter().enumerate() {
            println!("         arg{}: {}", index + 1, slot);
        }
    }
    Ok(())
}

/// `watchpost send` -- validate and transmit one command line, then keep
/// the link open for `wait` so device replies can be printed.
pub async fn run_send(config: &LinkConfig, line: &str, wait: Duration) -> anyhow::Result<()> {
    let catalog = CommandCatalog::standard();
    let parsed = catalog.parse_line(line)?;

    let link = DeviceLink::connect(config)
        .await
        .with_context(|| format!("could not reach device endpoint {}", config.endpoint_url()))?;
    link.start(|payload| println!("{payload}"));

    link.send(parsed.to_string()).await?;
    tracing::info!(command = %parsed, "command transmitted");

    // Reply window: returns early if the device closes the link first.
    let _ = link.wait_for_state(LinkState::Closed, wait).await;

    link.stop().await?;
    Ok(())
}

/// `watchpost console` -- interactive loop over stdin.
pub async fn run_console(config: &LinkConfig) -> anyhow::Result<()> {
    let catalog = CommandCatalog::standard();

    let link = DeviceLink::connect(config)
        .await
        .with_context(|| format!("could not reach device endpoint {}", config.endpoint_url()))?;
    link.start(|payload| println!("<- {payload}"));

    println!(
        "connected to {} (type `quit` to exit, `palette` for commands)",
        config.endpoint_url()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" || trimmed == "exit" {
            break;
        }
        if trimmed == "palette" {
            run_palette()?;
            continue;
        }

        if link.state() == LinkState::Closed {
            eprintln!("device link closed; restart the console to reconnect");
            break;
        }

        match catalog.parse_line(trimmed) {
            Ok(parsed) => {
                if let Err(e) = link.send(parsed.to_string()).await {
                    eprintln!("send failed: {e}");
                    break;
                }
            }
            Err(e) => eprintln!("invalid command: {e}"),
        }
    }

    link.stop().await?;
    let _ = link
        .wait_for_state(LinkState::Closed, Duration::from_secs(2))
        .await;
    Ok(())
}
