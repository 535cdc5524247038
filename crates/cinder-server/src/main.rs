use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

mod config;
mod connection;
mod dispatcher;
mod server;

use crate::config::Args;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinder=info".into()),
        )
        .init();

    let args = Args::parse();
    let store = cinder_core::Store::new(args.store_config());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    if let Err(e) = server::run(args.addr, store, args.send_queue, shutdown_rx).await {
        error!("server error: {e}");
        std::process::exit(1);
    }

    info!("server stopped");
}
