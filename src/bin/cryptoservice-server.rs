use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use cryptoservice::config::load_config;
use cryptoservice::server;
use tracing_subscriber::EnvFilter;

/// Reference cryptoservice server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address to listen on, overrides `[server] bind`
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() {
    // Initialize logging to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config.server,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    let addr = args.bind.unwrap_or(config.bind);

    server::run_server(addr).await.unwrap_or_else(|err| {
        tracing::error!("Server error: {}", err);
        std::process::exit(1);
    });
}
