//! ldgate server entry point.

#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ldgate_core::AppConfig;
use ldgate_server::Server;

/// LDAP-backed OpenID Connect provider.
#[derive(Debug, Parser)]
#[command(name = "ldgate", version, about)]
struct Args {
    /// Path of the YAML configuration file. Defaults apply without one.
    #[arg(short, long, env = "LDGATE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => AppConfig::load_file(path)
            .with_context(|| format!("load config from {}", path.display()))?,
        None => AppConfig::default(),
    };

    Server::new(config)?.run().await
}
