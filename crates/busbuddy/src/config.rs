//! Configuration management for busbuddy.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::location::Location;
use crate::theme::ThemeVariant;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "busbuddy";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "busbuddy.db";

/// Storage key the registry snapshot lives under.
pub const DEFAULT_REGISTRY_KEY: &str = "busbuddy_v4_schools";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `BUSBUDDY_`, sections separated
///    by `__`, e.g. `BUSBUDDY_TRACKING__TICK_INTERVAL_MS=500`)
/// 2. TOML config file at `~/.config/busbuddy/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Location simulator configuration.
    pub tracking: TrackingConfig,
    /// SOS banner configuration.
    pub sos: SosConfig,
    /// Map provider configuration.
    pub map: MapConfig,
    /// Chat configuration.
    pub chat: ChatConfig,
    /// Visual theme.
    pub theme: ThemeConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/busbuddy/busbuddy.db`
    pub database_path: Option<PathBuf>,
    /// Key the schools registry snapshot is stored under.
    pub registry_key: String,
}

/// Location simulator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Interval between simulated position updates in milliseconds.
    pub tick_interval_ms: u64,
    /// Degrees added to both latitude and longitude on every tick.
    pub delta: f64,
    /// Latitude the simulator starts from.
    pub reference_latitude: f64,
    /// Longitude the simulator starts from.
    pub reference_longitude: f64,
}

/// SOS banner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SosConfig {
    /// How long the banner stays up after a trigger, in milliseconds.
    pub reset_after_ms: u64,
}

/// Map provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Latitude of the initial map center.
    pub center_latitude: f64,
    /// Longitude of the initial map center.
    pub center_longitude: f64,
    /// Initial zoom level (0-22).
    pub zoom: u8,
    /// Interval between provider readiness checks in milliseconds.
    pub readiness_poll_ms: u64,
    /// Give up after this many readiness checks. 0 waits forever.
    pub readiness_max_attempts: u32,
    /// Asset used for the bus marker.
    pub marker_icon: String,
    /// Marker edge length in pixels.
    pub marker_size: u32,
}

/// Chat configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Sender name used for every non-driver message.
    pub parent_display_name: String,
}

/// Theme configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Which of the built-in variants to render with.
    pub variant: ThemeVariant,
    /// Overrides the variant's accent colour (`#RRGGBB`).
    pub accent: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Resolved at runtime
            registry_key: DEFAULT_REGISTRY_KEY.to_string(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2_000,
            delta: 0.0001,
            reference_latitude: 37.5665,
            reference_longitude: 126.9780,
        }
    }
}

impl Default for SosConfig {
    fn default() -> Self {
        Self {
            reset_after_ms: 5_000,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_latitude: 37.5665,
            center_longitude: 126.9780,
            zoom: 15,
            readiness_poll_ms: 1_000,
            readiness_max_attempts: 0,
            marker_icon: "assets/bus-marker.svg".to_string(),
            marker_size: 60,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            parent_display_name: "Parent (Emily)".to_string(),
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("BUSBUDDY_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.registry_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "registry_key must not be empty".to_string(),
            });
        }

        if self.tracking.tick_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "tick_interval_ms must be greater than 0".to_string(),
            });
        }

        if !(self.tracking.delta.is_finite() && self.tracking.delta > 0.0) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "delta must be a positive number, got {}",
                    self.tracking.delta
                ),
            });
        }

        if self.sos.reset_after_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "reset_after_ms must be greater than 0".to_string(),
            });
        }

        if self.map.readiness_poll_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "readiness_poll_ms must be greater than 0".to_string(),
            });
        }

        if self.map.zoom > 22 {
            return Err(Error::ConfigValidation {
                message: format!("zoom must be between 0 and 22, got {}", self.map.zoom),
            });
        }

        if self.chat.parent_display_name.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "parent_display_name must not be empty".to_string(),
            });
        }

        if let Some(accent) = &self.theme.accent {
            if !crate::theme::is_hex_color(accent) {
                return Err(Error::ConfigValidation {
                    message: format!("invalid accent colour: {accent}"),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the simulator tick interval as a Duration.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tracking.tick_interval_ms)
    }

    /// Get the simulator's starting point.
    #[must_use]
    pub fn reference_point(&self) -> Location {
        Location::new(
            self.tracking.reference_latitude,
            self.tracking.reference_longitude,
        )
    }

    /// Get the SOS reset delay as a Duration.
    #[must_use]
    pub fn sos_reset_after(&self) -> Duration {
        Duration::from_millis(self.sos.reset_after_ms)
    }

    /// Get the map readiness poll interval as a Duration.
    #[must_use]
    pub fn readiness_poll_interval(&self) -> Duration {
        Duration::from_millis(self.map.readiness_poll_ms)
    }
}
