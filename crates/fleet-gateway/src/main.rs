//! Fleet gateway binary.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fleet_gateway::config::Config;
use fleet_gateway::server::Gateway;

#[derive(Debug, Parser)]
#[command(name = "fleet-gateway", version, about = "OAuth session and command gateway for the Tesla Fleet API")]
struct Cli {
    /// Listen port (overrides the PORT environment variable).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading configuration; ignore a missing file.
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fleet_gateway=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    // Fail fast: no traffic is served without provider credentials.
    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    tracing::info!(port = config.port, "starting fleet gateway");

    Gateway::new(&config)?.run().await
}
