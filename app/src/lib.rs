//! Hydration reminder library
//!
//! Daily water ledger, goal tracking, settings persistence and the
//! reminder scheduler. The UI layer drives everything through `AppState`.

pub mod app;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;

pub use app::AppState;
pub use error::{AppError, Result};
