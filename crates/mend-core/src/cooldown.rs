//! Shared "last self-triggered write" timestamp.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Time of the most recent write performed by the repair engine.
///
/// Cloning yields another handle to the same timestamp. Starts out as
/// "never" and is only ever moved forward.
#[derive(Debug, Clone, Default)]
pub struct Cooldown {
    last_write: Arc<Mutex<Option<Instant>>>,
}

impl Cooldown {
    /// Create a handle that has never recorded a write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current time as the last self-triggered write.
    pub async fn mark(&self) {
        *self.last_write.lock().await = Some(Instant::now());
    }

    /// When the last write was recorded, if ever.
    pub async fn last_write(&self) -> Option<Instant> {
        *self.last_write.lock().await
    }

    /// Time elapsed since the last recorded write. `None` if nothing was recorded.
    pub async fn elapsed(&self) -> Option<Duration> {
        self.last_write().await.map(|at| at.elapsed())
    }

    /// Whether a notification arriving now falls inside `window`.
    pub async fn is_cooling(&self, window: Duration) -> bool {
        match self.elapsed().await {
            Some(elapsed) => elapsed < window,
            None => false,
        }
    }
}
