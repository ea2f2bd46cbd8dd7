//! Feedwatch dispatcher — startup error types.

use feedwatch_core::transport::DeliveryError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop the dispatcher before or while it runs.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// An outbound transport could not be constructed.
    #[error("transport setup error: {0}")]
    Transport(#[from] DeliveryError),

    /// Signal handling or other I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
