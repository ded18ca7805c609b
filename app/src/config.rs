//! Application configuration constants
//!
//! Central location for storage keys, defaults, and validation boundaries
//! used throughout the application.

// ===== Storage Keys =====

/// Ledger of daily glass counts (JSON array of `{date, count}`)
pub const WATER_HISTORY_KEY: &str = "waterHistory";

/// User display name (plain string)
pub const USERNAME_KEY: &str = "beberagua:userName";

/// Daily goal in glasses (stringified integer)
pub const DAILY_GOAL_KEY: &str = "beberagua:metaCopos";

/// Notification and appearance settings (JSON object)
pub const NOTIFICATION_SETTINGS_KEY: &str = "beberagua:notificationSettings";

// ===== Ledger =====

/// Glasses per day when no goal has been saved
pub const DEFAULT_DAILY_GOAL: u32 = 8;

/// Smallest goal that can be stored
pub const MIN_DAILY_GOAL: u32 = 1;

/// Calendar-day format used as the ledger key (pt-BR, e.g. "10/05/2024")
pub const DEFAULT_DAY_FORMAT: &str = "%d/%m/%Y";

// ===== Reminder Interval Limits =====

/// Minimum reminder interval in hours (36 seconds)
pub const MIN_INTERVAL_HOURS: f64 = 0.01;

/// Maximum reminder interval in hours
pub const MAX_INTERVAL_HOURS: f64 = 4.0;

/// Granularity of the interval slider
pub const INTERVAL_STEP_HOURS: f64 = 0.01;

/// Interval used when none is stored or the stored value is unusable
pub const DEFAULT_INTERVAL_HOURS: f64 = 1.0;

// ===== Reminder Schedule =====

/// How far ahead reminders are registered on each configure
pub const REMINDER_HORIZON_HOURS: i64 = 24;

/// Cap on pending reminders per configure.
/// Mobile platforms refuse more than 64 pending local notifications.
pub const MAX_PENDING_REMINDERS: usize = 64;

/// How often the local dispatcher looks for due reminders
pub const DISPATCH_TICK_SECS: u64 = 15;

/// Title shown on every reminder notification
pub const REMINDER_TITLE: &str = "Hydration Reminder";

/// Reminder bodies, rotated across a schedule
pub const REMINDER_MESSAGES: &[&str] = &[
    "Drinking water sharpens your focus and keeps your mind clear!",
    "Staying hydrated helps digestion and keeps your body in balance!",
    "Water keeps your skin healthy and glowing every day!",
    "Regular sips of water give you energy for whatever comes next!",
    "Water regulates your body temperature in any weather!",
];

// ===== Storage Engine =====

/// SQLite database file name inside the data directory
pub const DATABASE_FILE_NAME: &str = "hydration.db";

/// Environment variable overriding the data directory of the host binary
pub const DATA_DIR_ENV: &str = "HYDRATION_DATA_DIR";

/// Data directory used when `HYDRATION_DATA_DIR` is unset
pub const DEFAULT_DATA_DIR: &str = "hydration-data";
