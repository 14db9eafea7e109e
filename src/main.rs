//! Main entry point for the SkinGuide MCP server
//!
//! This file sets up logging, parses command line arguments, and starts the MCP server.
//! The server listens for JSON-RPC requests over stdin/stdout following the MCP protocol,
//! so every log line goes to stderr.

use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use skinguide_mcp::catalog::live::DEFAULT_API_URL;
use skinguide_mcp::{ServerConfig, SkinGuideServer};

/// Command line arguments for the SkinGuide MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the live product API
    #[arg(long, env = "LIVE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Timeout for live API requests, in seconds
    #[arg(long, default_value_t = 15)]
    http_timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("skinguide_mcp={}", log_level))
        .with_writer(std::io::stderr) // stdout carries the protocol
        .init();

    info!("Starting SkinGuide MCP server");

    let config = ServerConfig {
        api_url: args.api_url,
        http_timeout: Duration::from_secs(args.http_timeout_secs),
    };

    let server = SkinGuideServer::new(config)?;

    // Serve until stdin closes; a transport failure ends the process non-zero
    if let Err(e) = server.run().await {
        error!("Fatal: {}", e);
        return Err(e.into());
    }

    info!("SkinGuide MCP server shutdown complete");
    Ok(())
}
