//! SOS alert banner.
//!
//! Triggering raises a flag that clears itself after a fixed delay. There
//! is no early cancel and nothing is sent anywhere.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

/// Transient emergency flag.
#[derive(Debug)]
pub struct SosSignal {
    reset_after: Duration,
    tx: Arc<watch::Sender<bool>>,
    generation: Arc<AtomicU64>,
}

impl SosSignal {
    /// Create an inactive signal.
    #[must_use]
    pub fn new(reset_after: Duration) -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            reset_after,
            tx: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Whether the banner is showing.
    #[must_use]
    pub fn is_active(&self) -> bool {
        *self.tx.borrow()
    }

    /// Subscribe to flag changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Raise the flag and schedule its reset.
    ///
    /// Triggering again while active pushes the reset out: only the reset
    /// belonging to the latest trigger clears the flag. Must be called from
    /// within a tokio runtime.
    pub fn trigger(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_replace(true);
        warn!(after = ?self.reset_after, "emergency signal raised");

        let tx = Arc::clone(&self.tx);
        let shared_generation = Arc::clone(&self.generation);
        let reset_after = self.reset_after;
        tokio::spawn(async move {
            tokio::time::sleep(reset_after).await;
            tx.send_if_modified(|active| {
                if shared_generation.load(Ordering::SeqCst) != generation || !*active {
                    return false;
                }
                *active = false;
                true
            });
            debug!(generation, "emergency signal reset");
        });
    }
}
