//! Map provider binding.
//!
//! The map itself is an external collaborator. This module only knows how
//! to wait for it, configure it, and forward location updates to it.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::location::Location;

/// Initial map settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    /// Initial center.
    pub center: Location,
    /// Initial zoom level.
    pub zoom: u8,
    /// Hide point-of-interest labels.
    pub hide_poi_labels: bool,
    /// Turn off the provider's default controls.
    pub disable_default_ui: bool,
    /// Asset used for the bus marker.
    pub marker_icon: String,
    /// Marker edge length in pixels.
    pub marker_size: u32,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for MapOptions {
    fn from(config: &Config) -> Self {
        Self {
            center: Location::new(config.map.center_latitude, config.map.center_longitude),
            zoom: config.map.zoom,
            hide_poi_labels: true,
            disable_default_ui: true,
            marker_icon: config.map.marker_icon.clone(),
            marker_size: config.map.marker_size,
        }
    }
}

/// What the app needs from a map.
#[async_trait::async_trait]
pub trait MapProvider: Send {
    /// Whether the provider has finished loading.
    async fn is_ready(&self) -> bool;

    /// Create the map with the given options.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the options.
    fn initialize(&mut self, options: &MapOptions) -> Result<()>;

    /// Place the bus marker, creating it on first use.
    fn create_or_move_marker(&mut self, position: Location);

    /// Center the view on `position`.
    fn pan_to(&mut self, position: Location);
}

/// Poll `provider` until it is ready.
///
/// `max_attempts` of 0 polls forever.
///
/// # Errors
///
/// Returns [`Error::MapUnavailable`] once `max_attempts` polls have failed.
pub async fn wait_until_ready<P: MapProvider + ?Sized>(
    provider: &P,
    poll_interval: Duration,
    max_attempts: u32,
) -> Result<()> {
    let mut ticker = tokio::time::interval(poll_interval);
    let mut attempts = 0;
    loop {
        ticker.tick().await;
        if provider.is_ready().await {
            debug!(attempts, "map provider ready");
            return Ok(());
        }
        attempts += 1;
        if max_attempts != 0 && attempts >= max_attempts {
            return Err(Error::MapUnavailable { attempts });
        }
    }
}

/// Forwards simulator output to a map provider.
#[derive(Debug)]
pub struct MapBinding<P> {
    provider: P,
    updates: usize,
}

impl<P: MapProvider> MapBinding<P> {
    /// Wait for `provider`, then initialize it.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider never becomes ready or rejects the
    /// options.
    pub async fn connect(mut provider: P, options: &MapOptions, config: &Config) -> Result<Self> {
        wait_until_ready(
            &provider,
            config.readiness_poll_interval(),
            config.map.readiness_max_attempts,
        )
        .await?;
        provider.initialize(options)?;
        info!(center = %options.center, zoom = options.zoom, "map initialized");
        Ok(Self {
            provider,
            updates: 0,
        })
    }

    /// Move the marker to `position` and re-center on it.
    pub fn apply(&mut self, position: Location) {
        self.provider.create_or_move_marker(position);
        self.provider.pan_to(position);
        self.updates += 1;
    }

    /// Apply every published position until the channel closes.
    ///
    /// A cleared position leaves the marker where it was.
    pub async fn follow(&mut self, mut rx: watch::Receiver<Option<Location>>) {
        while rx.changed().await.is_ok() {
            let position = *rx.borrow_and_update();
            if let Some(position) = position {
                self.apply(position);
            }
        }
        debug!(updates = self.updates, "location feed closed");
    }

    /// Number of positions applied so far.
    #[must_use]
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// The wrapped provider.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

/// A map that reports through `tracing`.
///
/// Used by the terminal front end, which has no real map to draw on.
#[derive(Debug, Default)]
pub struct TracingMap {
    marker: Option<Location>,
}

impl TracingMap {
    /// Create a map with no marker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the marker currently is.
    #[must_use]
    pub fn marker(&self) -> Option<Location> {
        self.marker
    }
}

#[async_trait::async_trait]
impl MapProvider for TracingMap {
    async fn is_ready(&self) -> bool {
        true
    }

    fn initialize(&mut self, options: &MapOptions) -> Result<()> {
        debug!(?options, "map options applied");
        Ok(())
    }

    fn create_or_move_marker(&mut self, position: Location) {
        if self.marker.replace(position).is_none() {
            info!(%position, "bus marker created");
        } else {
            debug!(%position, "bus marker moved");
        }
    }

    fn pan_to(&mut self, position: Location) {
        debug!(%position, "map centered");
    }
}
