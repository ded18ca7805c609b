//! Error types for the hydration reminder core
//!
//! All errors use thiserror for structured error handling.
//! Services return these to their callers; `AppState` is the single place
//! where they are logged and replaced by safe defaults.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage read error: {0}")]
    StorageRead(String),

    #[error("Storage write error: {0}")]
    StorageWrite(String),

    #[error("Notification permission denied: {0}")]
    PermissionDenied(String),

    #[error("Scheduling error: {0}")]
    Scheduling(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Generic(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
