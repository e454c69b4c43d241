//! Dustlink daemon - cloud endpoint for bitmask-protocol robot vacuums.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;

use dustlink::config::{init_logging, Config};
use dustlink::error::Result;
use dustlink::server::PacketServer;
use dustlink::VERSION;

#[derive(Parser)]
#[command(name = "dustlinkd", version = VERSION, about = "Robot vacuum cloud endpoint")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. info, dustlink=debug)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server (default)
    Serve,
    /// Print an example configuration and exit
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Config)) {
        println!("{}", Config::example());
        return Ok(());
    }

    let config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    };
    init_logging(&dustlink::config::LoggingConfig {
        level: cli.log_level.unwrap_or_else(|| config.logging.level.clone()),
    });

    info!(version = VERSION, "starting dustlinkd");
    let server = PacketServer::bind(&config).await?;
    let handle = server.handle();

    tokio::spawn(async move {
        let _ = signal::ctrl_c().await;
        info!("interrupt received");
        handle.shutdown();
    });

    server.run().await?;
    info!("stopped");
    Ok(())
}
