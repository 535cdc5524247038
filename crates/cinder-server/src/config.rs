//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use cinder_core::StoreConfig;
use clap::Parser;

/// Redis-compatible in-memory key/value server.
#[derive(Debug, Parser)]
#[command(name = "cinder-server", version, about)]
pub struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:5001")]
    pub addr: SocketAddr,

    /// Expiry sweep period in milliseconds.
    #[arg(long, default_value_t = 250)]
    pub sweep_interval_ms: u64,

    /// Maximum expirable keys inspected per sweep pass.
    #[arg(long, default_value_t = 25)]
    pub sweep_batch: usize,

    /// Per-connection reply queue capacity, in messages.
    #[arg(long, default_value_t = 1024)]
    pub send_queue: usize,
}

impl Args {
    /// Builds the store tuning from the CLI flags.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            sweep_interval: Duration::from_millis(self.sweep_interval_ms),
            sweep_batch: self.sweep_batch,
        }
    }
}
