//! Counters for watch loop activity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Watch loop statistics, shared between the loop and whoever reports on it.
#[derive(Debug)]
pub struct WatchStats {
    /// Notifications that led to a repair pass
    accepted: AtomicU64,
    /// Notifications dropped inside the debounce window
    debounced: AtomicU64,
    /// Notifications of a kind we do not act on
    ignored: AtomicU64,
    /// Repair chains that ended with a write
    repairs: AtomicU64,
    /// When the loop started; unset until it does
    started: OnceLock<Instant>,
}

/// Point-in-time copy of [`WatchStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub accepted: u64,
    pub debounced: u64,
    pub ignored: u64,
    pub repairs: u64,
}

impl WatchStats {
    pub fn new() -> Self {
        Self {
            accepted: AtomicU64::new(0),
            debounced: AtomicU64::new(0),
            ignored: AtomicU64::new(0),
            repairs: AtomicU64::new(0),
            started: OnceLock::new(),
        }
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_debounced(&self) {
        self.debounced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_repair(&self) {
        self.repairs.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the start of the loop. Later calls keep the first instant.
    pub fn mark_started(&self) {
        let _ = self.started.set(Instant::now());
    }

    /// Time since the loop started, zero if it never did.
    pub fn uptime(&self) -> Duration {
        self.started
            .get()
            .map(Instant::elapsed)
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            debounced: self.debounced.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            repairs: self.repairs.load(Ordering::Relaxed),
        }
    }
}

impl Default for WatchStats {
    fn default() -> Self {
        Self::new()
    }
}
