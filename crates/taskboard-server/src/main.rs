//! Taskboard server
//!
//! Command-line entry point: HTTP API plus realtime WebSocket gateway.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use taskboard_core::Config;
use tracing_subscriber::EnvFilter;

mod api;
mod server;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Taskboard - single-board task board with live updates")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (defaults to ~/.config/taskboard/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Log level for taskboard crates (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and realtime gateway (default)
    Serve {
        /// HTTP listen address
        #[arg(long)]
        http_addr: Option<SocketAddr>,
        /// WebSocket listen address
        #[arg(long)]
        ws_addr: Option<SocketAddr>,
    },
    /// Print the board as JSON
    Board,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    if let Some(database) = cli.database {
        config.database_path = Some(database);
    }

    match cli.command.unwrap_or(Commands::Serve {
        http_addr: None,
        ws_addr: None,
    }) {
        Commands::Serve { http_addr, ws_addr } => {
            if let Some(addr) = http_addr {
                config.http_addr = addr;
            }
            if let Some(addr) = ws_addr {
                config.ws_addr = addr;
            }
            server::run(config).await
        }
        Commands::Board => {
            let service = server::open_service(&config)?;
            let board = service.fetch_board().await?;
            println!("{}", serde_json::to_string_pretty(&board)?);
            Ok(())
        }
        Commands::Config => {
            let content =
                toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
            print!("{}", content);
            Ok(())
        }
    }
}

fn init_logging(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "taskboard_core={},taskboard_server={}",
            log_level, log_level
        ))
    });

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
