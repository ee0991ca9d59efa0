//! MCP server for the compliance platform API.
//!
//! Run with `COMPLIANCE_API_KEY=... COMPLIANCE_API_SECRET=... compliance-mcp`.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use compliance_mcp::{ApiClient, Config, McpServer};

/// Read-only MCP server for a compliance platform.
///
/// Exposes the platform's list endpoints as MCP tools for AI agents.
/// Communicates via JSON-RPC 2.0 over stdin/stdout.
///
/// Credentials come from COMPLIANCE_API_KEY and COMPLIANCE_API_SECRET;
/// COMPLIANCE_API_URL overrides the API base URL. A `.env` file in the
/// working directory is read first if present.
#[derive(Parser)]
#[command(name = "compliance-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging to stderr.
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Variables from .env never override ones already set.
    let env_file = dotenv::dotenv().ok();

    // Set up logging. stdout carries the protocol, so logs go to stderr.
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if args.verbose {
        if let Ok(directive) = "compliance_mcp=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = env_file {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(base_url = config.base_url(), "starting compliance-mcp");

    let server = McpServer::new(ApiClient::new(config));

    if let Err(e) = server.run().await {
        eprintln!("Error: Server error: {}", e);
        std::process::exit(1);
    }
}
