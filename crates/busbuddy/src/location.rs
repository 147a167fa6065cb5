//! Simulated live location.
//!
//! While live, a single ticker task moves the bus by a fixed delta on both
//! axes every interval and publishes the new position on a `watch` channel.
//! When stopped the channel holds `None`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::error::{Error, Result};

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Location {
    /// Create a location.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// The position after `ticks` steps of `delta` on both axes.
    #[must_use]
    pub fn advanced(self, delta: f64, ticks: u64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let offset = delta * ticks as f64;
        Self {
            latitude: self.latitude + offset,
            longitude: self.longitude + offset,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Settings for the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    /// Where every run starts.
    pub reference: Location,
    /// Degrees added per tick.
    pub delta: f64,
    /// Time between ticks.
    pub interval: Duration,
}

impl From<&crate::config::Config> for SimulatorConfig {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            reference: config.reference_point(),
            delta: config.tracking.delta,
            interval: config.tick_interval(),
        }
    }
}

/// Drives the simulated bus position.
///
/// Holds at most one ticker. Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct LocationSimulator {
    config: SimulatorConfig,
    tx: Arc<watch::Sender<Option<Location>>>,
    generation: Arc<AtomicU64>,
    ticker: Option<JoinHandle<()>>,
}

impl LocationSimulator {
    /// Create a stopped simulator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if the tick interval is zero.
    pub fn new(config: SimulatorConfig) -> Result<Self> {
        if config.interval.is_zero() {
            return Err(Error::ConfigValidation {
                message: "tick interval must be greater than 0".to_string(),
            });
        }
        let (tx, _rx) = watch::channel(None);
        Ok(Self {
            config,
            tx: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            ticker: None,
        })
    }

    /// Subscribe to published positions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Location>> {
        self.tx.subscribe()
    }

    /// The most recently published position, if live.
    #[must_use]
    pub fn current(&self) -> Option<Location> {
        *self.tx.borrow()
    }

    /// Whether a ticker is running.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.ticker.is_some()
    }

    /// Start ticking from the reference point.
    ///
    /// A ticker that is already running is cancelled first, so there is
    /// never more than one, and its last position is cleared.
    pub fn start(&mut self) {
        if self.ticker.is_some() {
            debug!("restarting location simulator");
            self.cancel_ticker();
            self.tx.send_replace(None);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let shared_generation = Arc::clone(&self.generation);
        let tx = Arc::clone(&self.tx);
        let SimulatorConfig {
            reference,
            delta,
            interval,
        } = self.config;

        info!(%reference, ?interval, "live tracking started");
        self.ticker = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut ticks: u64 = 0;
            loop {
                ticker.tick().await;
                ticks += 1;
                let position = reference.advanced(delta, ticks);
                let published = tx.send_if_modified(|slot| {
                    if shared_generation.load(Ordering::SeqCst) != generation {
                        return false;
                    }
                    *slot = Some(position);
                    true
                });
                if !published {
                    break;
                }
                trace!(%position, ticks, "location tick");
            }
        }));
    }

    /// Stop ticking and clear the published position.
    ///
    /// Stopping a stopped simulator does nothing.
    pub fn stop(&mut self) {
        if self.ticker.is_none() {
            return;
        }
        self.cancel_ticker();
        self.tx.send_replace(None);
        info!("live tracking stopped");
    }

    fn cancel_ticker(&mut self) {
        // Invalidate first so a tick racing with abort cannot publish
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for LocationSimulator {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: f64 = 0.0001;

    fn config() -> SimulatorConfig {
        SimulatorConfig {
            reference: Location::new(37.5665, 126.9780),
            delta: DELTA,
            interval: Duration::from_secs(2),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_location_advanced() {
        let start = Location::new(1.0, 2.0);
        let moved = start.advanced(0.5, 3);
        assert!(close(moved.latitude, 2.5));
        assert!(close(moved.longitude, 3.5));
    }

    #[test]
    fn test_location_display() {
        assert_eq!(Location::new(37.5665, 126.978).to_string(), "37.5665, 126.9780");
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_simulator_is_stopped() {
        let sim = LocationSimulator::new(config()).unwrap();
        assert!(!sim.is_live());
        assert!(sim.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_increase_by_delta() {
        let mut sim = LocationSimulator::new(config()).unwrap();
        let mut rx = sim.subscribe();
        sim.start();
        assert!(sim.is_live());

        let mut previous = config().reference;
        for _ in 0..5 {
            rx.changed().await.unwrap();
            let current = rx.borrow_and_update().unwrap();
            assert!(current.latitude > previous.latitude);
            assert!(current.longitude > previous.longitude);
            assert!(close(current.latitude - previous.latitude, DELTA));
            assert!(close(current.longitude - previous.longitude, DELTA));
            previous = current;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_interval() {
        let mut sim = LocationSimulator::new(config()).unwrap();
        sim.start();

        time::sleep(Duration::from_millis(1_999)).await;
        assert!(sim.current().is_none());

        time::sleep(Duration::from_millis(10)).await;
        assert!(sim.current().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_clears_and_silences() {
        let mut sim = LocationSimulator::new(config()).unwrap();
        let mut rx = sim.subscribe();
        sim.start();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        sim.stop();
        assert!(!sim.is_live());
        assert!(sim.current().is_none());
        rx.borrow_and_update();

        time::sleep(Duration::from_secs(20)).await;
        assert!(!rx.has_changed().unwrap());
        assert!(sim.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_keeps_single_ticker() {
        let mut sim = LocationSimulator::new(config()).unwrap();
        let mut rx = sim.subscribe();
        sim.start();
        time::sleep(Duration::from_secs(3)).await;
        sim.start();
        rx.borrow_and_update();

        // Only the new ticker runs, restarting from the reference point
        let mut seen = Vec::new();
        for _ in 0..3 {
            rx.changed().await.unwrap();
            seen.push(rx.borrow_and_update().unwrap());
        }
        let reference = config().reference;
        for (i, position) in seen.iter().enumerate() {
            let expected = reference.advanced(DELTA, i as u64 + 1);
            assert!(close(position.latitude, expected.latitude), "tick {i}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_clears_previous_position() {
        let mut sim = LocationSimulator::new(config()).unwrap();
        sim.start();
        time::sleep(Duration::from_millis(6_100)).await;
        let before = sim.current().unwrap();
        assert!(before.latitude > config().reference.latitude);

        sim.start();
        assert!(sim.current().is_none());

        time::sleep(Duration::from_millis(1_000)).await;
        assert!(sim.current().is_none());

        time::sleep(Duration::from_millis(1_100)).await;
        let first = sim.current().unwrap();
        assert!(close(first.latitude, config().reference.advanced(DELTA, 1).latitude));
        assert_ne!(first, before);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let err = LocationSimulator::new(SimulatorConfig {
            interval: Duration::ZERO,
            ..config()
        })
        .unwrap_err();
        assert!(err.to_string().contains("tick interval"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_stopped_is_noop() {
        let mut sim = LocationSimulator::new(config()).unwrap();
        sim.stop();
        assert!(!sim.is_live());
        assert!(sim.current().is_none());
    }
}
