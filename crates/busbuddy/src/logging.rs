//! Logging setup.
//!
//! Every module logs through `tracing`: navigation transitions at debug,
//! tracking start/stop and registry saves at info, snapshot fallbacks and
//! SOS at warn, simulator ticks at trace. The binary installs one
//! subscriber writing to stderr, leaving stdout to the rendered screens.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much the binary reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Tracking, persistence and SOS events.
    #[default]
    Normal,
    /// Adds every screen transition and shell command.
    Verbose,
    /// Adds every simulator tick and map update.
    Trace,
}

impl Verbosity {
    /// Map `-q` and the `-v` count onto a verbosity. `-q` wins.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// The most detailed level emitted.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    #[must_use]
    pub fn directive(self) -> String {
        format!("busbuddy={}", self.level())
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` replaces the verbosity-derived filter when set. Calling this
/// twice keeps the first subscriber.
///
/// ```no_run
/// use busbuddy::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(1, false));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}

/// Warnings and errors through the test writer.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
