//! Tetris server runner (default binary).
//!
//! Serves player games on `/ws` and spectating on `/snoop` until Ctrl-C.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use net_tetris::adapter::{run_server, shutdown_signal, ServerConfig};
use net_tetris::engine::SessionRegistry;

/// Command-line overrides; anything left unset comes from the environment
#[derive(Debug, Parser)]
#[command(name = "net-tetris", version, about = "Server-side Tetris over WebSocket")]
struct Args {
    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Gravity period in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    gravity_ms: Option<u64>,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::from_env();
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(gravity_ms) = self.gravity_ms {
            config.gravity_ms = gravity_ms;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "net_tetris=info,net_tetris_adapter=info,net_tetris_engine=info".into()
            }),
        )
        .init();

    let config = Args::parse().into_config();
    info!(
        "Gravity every {}ms, binding {}:{}",
        config.gravity_ms, config.host, config.port
    );

    let registry = Arc::new(SessionRegistry::new());
    run_server(config, registry, None, shutdown_signal()).await
}
