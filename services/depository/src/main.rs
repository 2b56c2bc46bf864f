//! Share depository service binary

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use depository::{Depository, DepositoryConfig, api};
use tracing::info;

/// Share Depository Service CLI
#[derive(Parser)]
#[clap(name = "depository")]
#[clap(about = "Multi-tenant share depository with a transactional position ledger")]
struct Cli {
    /// Host to bind the HTTP server
    #[clap(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind the HTTP server
    #[clap(long, short = 'p', default_value = "8080")]
    port: u16,

    /// Database connection string
    #[clap(long, default_value = "postgresql://localhost/depository")]
    database_url: String,

    /// Maximum database connections in the pool
    #[clap(long, default_value = "10")]
    max_connections: u32,

    /// Run with the embedded in-memory backend instead of Postgres
    #[clap(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("depository=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = DepositoryConfig {
        database_url: cli.database_url,
        host: cli.host,
        port: cli.port,
        max_connections: cli.max_connections,
    };

    let depository = if cli.memory {
        info!("Starting with embedded in-memory backend");
        Depository::in_memory()
    } else {
        Depository::connect(&config).await?
    };

    let app = api::router(Arc::new(depository));
    let addr = config.server_address();

    info!("Starting depository service on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
