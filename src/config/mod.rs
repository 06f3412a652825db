/// Database connection and table creation
pub mod database;

/// Persisted user preferences (budget alerts kill switch)
pub mod preferences;

/// Service settings loaded from config.toml
pub mod settings;

pub use settings::{AlertSettings, ScheduleSettings, Settings};
