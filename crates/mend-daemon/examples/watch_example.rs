//! Example of embedding the jsonmend watch loop.
//!
//! This example demonstrates how to:
//! 1. Configure the watch loop and repair engine
//! 2. Start watching a file
//! 3. Handle graceful shutdown
//!
//! Run with:
//! ```bash
//! cargo run --package mend-daemon --example watch_example -- settings.json
//! ```

use mend_core::{RepairConfig, WatchConfig};
use mend_daemon::Watcher;
use std::time::Duration;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "settings.json".to_string());

    // Shorter windows than the CLI defaults, handy when experimenting by hand
    let watch = WatchConfig {
        debounce_window: Duration::from_secs(2),
        settle_delay: Duration::from_millis(250),
    };

    let mut watcher = Watcher::new(&path, watch, RepairConfig::default())?;
    let shutdown = watcher.shutdown_handle();

    let watch_handle = tokio::spawn(async move { watcher.run().await });

    info!("Watching {}. Press Ctrl+C to stop.", path);

    signal::ctrl_c().await?;
    info!("Received shutdown signal, stopping watcher...");
    shutdown.shutdown().await;

    watch_handle.await??;

    info!("Watcher stopped gracefully");
    Ok(())
}
