//! Single-file watch loop for jsonmend.
//!
//! This crate subscribes to change notifications for one JSON file and runs
//! the repair engine whenever the file is changed by someone else.
//!
//! # Features
//!
//! - **Repair on startup**: A file that is already malformed gets fixed without waiting for an edit
//! - **Self-write suppression**: Notifications inside the debounce window of our own write are dropped
//! - **Settle delay**: External writers get a moment to finish before the file is read
//! - **Serial processing**: Events go through one channel and one consumer, so repairs never overlap
//! - **Graceful shutdown**: A [`ShutdownHandle`] stops the loop without interrupting a repair
//!
//! # Example
//!
//! ```no_run
//! use mend_core::{RepairConfig, WatchConfig};
//! use mend_daemon::Watcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut watcher = Watcher::new("settings.json", WatchConfig::default(), RepairConfig::default())?;
//! let shutdown = watcher.shutdown_handle();
//!
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     shutdown.shutdown().await;
//! });
//!
//! watcher.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod stats;

pub use stats::{StatsSnapshot, WatchStats};

use colored::Colorize;
use mend_core::{Cooldown, Error, FileStore, RepairConfig, RepairEngine, Result, WatchConfig};
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Stops a running [`Watcher`].
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: mpsc::Sender<()>,
}

impl ShutdownHandle {
    /// Ask the loop to stop after the event it is currently handling.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(()).await;
    }
}

/// Watches one file and keeps it valid JSON.
pub struct Watcher {
    target: PathBuf,
    config: WatchConfig,
    cooldown: Cooldown,
    engine: RepairEngine<FileStore>,
    stats: Arc<WatchStats>,
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: Option<mpsc::Receiver<()>>,
}

impl Watcher {
    /// Create a watcher for `path`.
    ///
    /// The path is resolved to absolute form; a missing target is a setup
    /// error ([`Error::TargetMissing`]). Any other resolution failure is
    /// reported as [`Error::Io`].
    pub fn new(
        path: impl AsRef<Path>,
        config: WatchConfig,
        repair_config: RepairConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let target = std::fs::canonicalize(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::TargetMissing(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        if !target.is_file() {
            return Err(Error::TargetMissing(target));
        }

        let cooldown = Cooldown::new();
        let engine = RepairEngine::new(FileStore::new(&target), cooldown.clone(), repair_config);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        Ok(Self {
            target,
            config,
            cooldown,
            engine,
            stats: Arc::new(WatchStats::new()),
            shutdown_tx,
            shutdown_rx: Some(shutdown_rx),
        })
    }

    /// Absolute path of the watched file.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Shared cooldown timestamp.
    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    /// Shared activity counters.
    pub fn stats(&self) -> Arc<WatchStats> {
        self.stats.clone()
    }

    /// Handle that stops [`Watcher::run`].
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Watch the file until shutdown.
    ///
    /// It performs the following steps:
    /// 1. Subscribe to notifications for exactly the target file
    /// 2. Run one repair pass, as if the file had just changed
    /// 3. Handle notifications one at a time until shutdown
    ///
    /// Returns an error if the subscription cannot be established or a
    /// repair chain exhausts its budget.
    pub async fn run(&mut self) -> Result<()> {
        let mut shutdown_rx = self
            .shutdown_rx
            .take()
            .ok_or_else(|| Error::Watcher("Watcher is already running".to_string()))?;

        self.stats.mark_started();
        info!("Watching {}", self.target.display());

        // Create channels for file system events
        let (fs_tx, fs_rx) = std::sync::mpsc::channel();
        let (event_tx, mut event_rx) = mpsc::channel(100);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                if let Err(e) = fs_tx.send(res) {
                    error!("Failed to send file event: {}", e);
                }
            },
            Config::default(),
        )
        .map_err(|e| Error::Watcher(e.to_string()))?;

        watcher
            .watch(&self.target, RecursiveMode::NonRecursive)
            .map_err(|e| Error::Watcher(e.to_string()))?;

        // Forward events from the notify thread to the async channel
        tokio::task::spawn_blocking(move || {
            while let Ok(res) = fs_rx.recv() {
                match res {
                    Ok(event) => {
                        if event_tx.blocking_send(event).is_err() {
                            break; // Channel closed
                        }
                    }
                    Err(e) => {
                        error!("File watcher error: {}", e);
                    }
                }
            }
        });

        // Launch counts as a change
        self.repair_pass().await?;

        loop {
            tokio::select! {
                Some(event) = event_rx.recv() => {
                    self.handle_event(event).await?;
                }
                _ = shutdown_rx.recv() => {
                    info!("Received shutdown signal");
                    break;
                }
                else => break,
            }
        }

        // Dropping the watcher closes the notify side and ends the bridge
        drop(watcher);

        let s = self.stats.snapshot();
        info!(
            "Watcher stopped after {:?}: {} changes handled, {} debounced, {} ignored, {} repairs",
            self.stats.uptime(),
            s.accepted,
            s.debounced,
            s.ignored,
            s.repairs
        );

        Ok(())
    }

    /// Decide whether a notification is a genuine external change, and repair if so.
    async fn handle_event(&self, event: Event) -> Result<()> {
        debug!("Handling file event: {:?}", event);

        if !is_content_modified(&event.kind) || !self.concerns_target(&event) {
            self.stats.record_ignored();
            return Ok(());
        }

        if self.cooldown.is_cooling(self.config.debounce_window).await {
            debug!("Change inside debounce window, skipping");
            self.stats.record_debounced();
            return Ok(());
        }

        self.stats.record_accepted();
        info!("{} {}", "File changed:".cyan(), self.target.display());

        tokio::time::sleep(self.config.settle_delay).await;
        self.repair_pass().await
    }

    async fn repair_pass(&self) -> Result<()> {
        self.engine.repair(None).await?;
        self.stats.record_repair();
        Ok(())
    }

    fn concerns_target(&self, event: &Event) -> bool {
        event.paths.is_empty()
            || event.paths.iter().any(|p| {
                p == &self.target || p.file_name() == self.target.file_name()
            })
    }
}

/// Only content writes count as a change; metadata, rename, create and
/// remove events do not.
fn is_content_modified(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
    )
}
