use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use colored::*;
use koso::error::RetryPolicy;
use koso::keys::KeyChord;
use koso::sync::{encode_sync_request, remote::connect_peer, SyncClient};
use koso::{logging, server, KosoConfig};
use yrs::Doc;

#[derive(Parser)]
#[command(name = "koso")]
#[command(about = "Koso collaborative task graph: sync relay, sync client and shortcut tools", version)]
struct Cli {
    /// Path to koso.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the sync relay server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Connect an empty document to a sync server and follow it
    Connect {
        /// WebSocket URL, e.g. ws://localhost:3000/ws
        url: Option<String>,
    },

    /// List the configured shortcuts
    Shortcuts,

    /// Print the sync request frame for a hex-encoded state vector
    SyncRequest {
        state_vector: String,
    },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = KosoConfig::load_or_default(cli.config.as_deref())?;
    logging::init_tracing(&config.log.filter);

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.sync.port);
            println!(
                "{}",
                format!("🌐 Starting sync server on port {}...", port)
                    .cyan()
                    .bold()
            );
            server::start(port).await?;
        }

        Commands::Connect { url } => {
            let url = url.unwrap_or_else(|| config.sync.server_url.clone());
            println!("{}", format!("🔄 Connecting to {}...", url).cyan().bold());

            let (client, outbound) = SyncClient::new(Doc::new())?;
            let client = Arc::new(client);
            let handle =
                connect_peer(&url, client.clone(), outbound, &RetryPolicy::aggressive()).await?;

            tokio::select! {
                _ = handle => println!("{}", "Connection closed".yellow()),
                _ = tokio::signal::ctrl_c() => {},
            }
            let state = client.sync_state();
            println!(
                "{} server synced: {}",
                "✓".green(),
                state.server_synced.to_string().bright_white()
            );
        }

        Commands::Shortcuts => {
            println!("{}", "Shortcuts".cyan().bold());
            println!("{}", "═".repeat(48).bright_black());
            for (name, chord) in config.shortcuts()? {
                print_shortcut(name, &chord)?;
            }
        }

        Commands::SyncRequest { state_vector } => {
            let summary = hex::decode(state_vector.trim())
                .context("state vector must be hex encoded")?;
            let frame = match encode_sync_request(summary.as_slice()) {
                Ok(frame) => frame,
                Err(never) => match never {},
            };
            println!("{}", hex::encode(frame));
        }
    }

    Ok(())
}

fn print_shortcut(name: &str, chord: &KeyChord) -> Result<()> {
    println!(
        "{:<24} {:<10} {}",
        name.bright_white(),
        chord.render()?.bright_yellow(),
        chord.to_string().bright_black()
    );
    Ok(())
}
