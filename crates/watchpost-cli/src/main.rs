mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use watchpost_types::{LinkConfig, PartialLinkConfig};

/// Watchpost -- operator console for the device-control panel.
#[derive(Parser, Debug)]
#[command(name = "watchpost", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the command palette (mnemonic, command, usage slots)
    Palette,

    /// Validate one command line and transmit it to the device endpoint
    Send {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Seconds to keep the link open for device replies
        #[arg(long, default_value_t = 2)]
        wait: u64,

        /// The command line, e.g. `lidar LDA0 open`
        #[arg(trailing_var_arg = true, required = true)]
        line: Vec<String>,
    },

    /// Interactive console: read command lines from stdin, print replies
    Console {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

/// Connection settings shared by the transmitting subcommands.
///
/// Resolution order: config file, then `WATCHPOST_*` environment variables,
/// then these flags. Host and port have no built-in defaults.
#[derive(Args, Debug, Default)]
struct ConnectionArgs {
    /// Path to a TOML config file (`host`, `port`, `connect_timeout_secs`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device endpoint host (overrides file and environment)
    #[arg(long)]
    host: Option<String>,

    /// Device endpoint port (overrides file and environment)
    #[arg(long)]
    port: Option<u16>,

    /// WebSocket handshake timeout in seconds
    #[arg(long)]
    connect_timeout_secs: Option<u64>,
}

impl ConnectionArgs {
    fn resolve(&self) -> anyhow::Result<LinkConfig> {
        let mut layered = PartialLinkConfig::default();
        if let Some(path) = &self.config {
            layered = layered.merge(PartialLinkConfig::from_file(path)?);
        }
        layered = layered.merge(PartialLinkConfig::from_env()?);
        layered = layered.merge(PartialLinkConfig {
            host: self.host.clone(),
            port: self.port,
            connect_timeout_secs: self.connect_timeout_secs,
        });
        Ok(layered.build()?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Palette => commands::run_palette(),
        Commands::Send {
            connection,
            wait,
            line,
        } => {
            let config = connection.resolve()?;
            commands::run_send(&config, &line.join(" "), Duration::from_secs(wait)).await
        }
        Commands::Console { connection } => {
            let config = connection.resolve()?;
            commands::run_console(&config).await
        }
    }
}
