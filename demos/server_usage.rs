//! Example running the dbx explorer server
//!
//! This example shows how to:
//! - Load configuration from config.toml (or a file given with `--config`)
//! - Initialize structured logging and tracing
//! - Serve the read-only explorer API over HTTP
//!
//! ## Setup
//!
//! ```bash
//! cp config.toml.example config.toml
//! export DATABASE_URL="sqlite://data/site.db"
//! export DBX_ADMIN_TOKEN="change-me"
//! ```
//!
//! ## Running
//!
//! ```bash
//! cargo run --example server_usage
//! cargo run --example server_usage -- --config config.test.toml --port 18080
//! ```
//!
//! Then test with curl:
//! ```bash
//! # Health check
//! curl http://localhost:8080/health
//!
//! # List tables
//! curl -H "Authorization: Bearer $DBX_ADMIN_TOKEN" http://localhost:8080/api/v1/tables
//!
//! # Run a read-only query
//! curl -X POST http://localhost:8080/api/v1/query \
//!   -H "Authorization: Bearer $DBX_ADMIN_TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"sql":"SELECT * FROM faq LIMIT 10"}'
//! ```

use anyhow::Result;
use clap::Parser;
use dbx_core::DbxConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "server_usage", about = "Serve the dbx database explorer API")]
struct Args {
    /// Configuration file; searched upward from the current directory when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = DbxConfig::load_from(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    dbx_telemetry::init_telemetry(&config.observability)?;

    tracing::info!(
        address = %config.bind_address(),
        "Starting dbx explorer"
    );

    dbx_server::serve(&config).await
}
