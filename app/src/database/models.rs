//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde so the UI layer can consume them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A reminder registered with the local notification facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ScheduledNotification {
    pub id: String,
    pub trigger_time: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}
