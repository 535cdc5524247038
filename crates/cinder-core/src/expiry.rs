//! The background expiry sweep.
//!
//! Wakes on a fixed period and runs one bounded sweep batch against the
//! expirable index, holding the exclusive lock only for that batch.
//! The task waits on the store's close signal rather than polling a
//! flag, so shutdown is prompt.

use std::sync::Arc;

use tracing::debug;

use crate::store::{Shared, StoreConfig};

/// Drives periodic sweeps until the store is closed.
pub(crate) async fn run(shared: Arc<Shared>, config: StoreConfig) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(config.sweep_interval) => {}
            _ = shared.shutdown.notified() => {
                debug!("sweeper exiting");
                return;
            }
        }

        let removed = shared.keyspace_mut().sweep(config.sweep_batch);
        if removed > 0 {
            debug!(removed, "sweep evicted expired keys");
        }
    }
}
