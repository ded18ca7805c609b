//! Ledger service
//!
//! Date-keyed record of glasses drunk per day plus the daily goal.
//! Storage is the source of truth: every operation reloads the ledger,
//! and increments hold a lock across the whole load-modify-save cycle.

use crate::clock::Clock;
use crate::config::{
    DAILY_GOAL_KEY, DEFAULT_DAILY_GOAL, DEFAULT_DAY_FORMAT, MIN_DAILY_GOAL, WATER_HISTORY_KEY,
};
use crate::error::{AppError, Result};
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// One calendar day of the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: String,
    pub count: u32,
}

/// Today's count against the goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub count: u32,
    pub goal: u32,
}

impl Progress {
    pub fn goal_reached(&self) -> bool {
        self.count >= self.goal
    }
}

#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    day_format: String,
    write_lock: Arc<Mutex<()>>,
    last_known_count: Arc<AtomicU32>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_day_format(store, clock, DEFAULT_DAY_FORMAT)
    }

    /// Use a different calendar-day format for ledger keys
    pub fn with_day_format(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        day_format: &str,
    ) -> Self {
        Self {
            store,
            clock,
            day_format: day_format.to_string(),
            write_lock: Arc::new(Mutex::new(())),
            last_known_count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Ledger key for the current calendar day
    pub fn today_key(&self) -> String {
        self.clock.now().format(&self.day_format).to_string()
    }

    /// Count from the most recent successful read or increment
    pub fn last_known_count(&self) -> u32 {
        self.last_known_count.load(Ordering::SeqCst)
    }

    /// Glasses drunk today, 0 when today has no entry yet
    pub async fn today_count(&self) -> Result<u32> {
        let today = self.today_key();
        let ledger = self.load().await?;

        let count = ledger
            .iter()
            .find(|entry| entry.date == today)
            .map_or(0, |entry| entry.count);

        self.last_known_count.store(count, Ordering::SeqCst);
        Ok(count)
    }

    /// Record one glass for today and return the new count
    pub async fn increment_today(&self) -> Result<u32> {
        let _guard = self.write_lock.lock().await;

        let today = self.today_key();
        let mut ledger = self.load().await?;

        let count = match ledger.iter_mut().find(|entry| entry.date == today) {
            Some(entry) => {
                entry.count = entry.count.checked_add(1).ok_or_else(|| {
                    AppError::StorageWrite(format!("glass count for {} is at its maximum", today))
                })?;
                entry.count
            }
            None => {
                ledger.push(DailyEntry {
                    date: today.clone(),
                    count: 1,
                });
                1
            }
        };

        self.save(&ledger).await?;
        self.last_known_count.store(count, Ordering::SeqCst);

        tracing::info!("Recorded glass {} for {}", count, today);
        Ok(count)
    }

    /// Every recorded day in insertion order
    pub async fn history(&self) -> Result<Vec<DailyEntry>> {
        self.load().await
    }

    /// Daily goal, defaulting to 8 glasses
    pub async fn goal(&self) -> Result<u32> {
        let Some(raw) = self.store.get(DAILY_GOAL_KEY).await? else {
            return Ok(DEFAULT_DAILY_GOAL);
        };

        match raw.trim().parse::<i64>() {
            Ok(goal) => Ok(clamp_goal(goal)),
            Err(e) => {
                tracing::warn!("Ignoring unparsable goal {:?}: {}", raw, e);
                Ok(DEFAULT_DAILY_GOAL)
            }
        }
    }

    /// Store a new goal; values below 1 are raised to 1
    pub async fn set_goal(&self, goal: i64) -> Result<u32> {
        let clamped = clamp_goal(goal);
        if i64::from(clamped) != goal {
            tracing::warn!("Goal {} out of range, storing {}", goal, clamped);
        }

        self.store
            .set(DAILY_GOAL_KEY, &clamped.to_string())
            .await?;

        tracing::info!("Daily goal set to {}", clamped);
        Ok(clamped)
    }

    pub async fn progress(&self) -> Result<Progress> {
        Ok(Progress {
            count: self.today_count().await?,
            goal: self.goal().await?,
        })
    }

    async fn load(&self) -> Result<Vec<DailyEntry>> {
        match self.store.get(WATER_HISTORY_KEY).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| AppError::StorageRead(format!("Corrupt water history: {}", e))),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, ledger: &[DailyEntry]) -> Result<()> {
        let raw = serde_json::to_string(ledger)?;
        self.store.set(WATER_HISTORY_KEY, &raw).await
    }
}

fn clamp_goal(goal: i64) -> u32 {
    u32::try_from(goal.max(i64::from(MIN_DAILY_GOAL))).unwrap_or(u32::MAX)
}
