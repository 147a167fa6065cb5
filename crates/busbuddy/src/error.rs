//! Error types for busbuddy.
//!
//! The only user-facing failure is an unknown access code; everything else
//! here belongs to the ambient layers (storage, configuration, map binding).

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for busbuddy operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Navigation Errors ===
    /// The normalized access code has no entry in the schools registry.
    #[error("invalid access code: {code}")]
    InvalidAccessCode {
        /// The code after trimming and upper-casing.
        code: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Map Errors ===
    /// The map provider never reported ready.
    #[error("map provider not ready after {attempts} attempts")]
    MapUnavailable {
        /// Number of readiness polls performed.
        attempts: u32,
    },

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for busbuddy operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an invalid access code error.
    #[must_use]
    pub fn invalid_access_code(code: impl Into<String>) -> Self {
        Self::InvalidAccessCode { code: code.into() }
    }

    /// Check if this error is an unknown access code.
    #[must_use]
    pub fn is_invalid_access_code(&self) -> bool {
        matches!(self, Self::InvalidAccessCode { .. })
    }
}
