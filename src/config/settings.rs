//! Service settings loaded from a TOML file.
//!
//! Every field has a default, so an absent file or a partial file is fine. A file
//! that exists but does not parse is a configuration error.

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming an alternative settings file.
pub const CONFIG_PATH_ENV: &str = "BUDGET_ALERTS_CONFIG";

/// Settings file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Longest accepted check interval, one leap year.
pub const MAX_INTERVAL_HOURS: u64 = 366 * 24;

/// Longest accepted first retry delay, one day.
pub const MAX_INITIAL_BACKOFF_SECS: u64 = 24 * 3600;

/// The whole settings file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Database URL, overridden by `DATABASE_URL` in the environment
    pub database_url: String,
    /// Alert evaluation settings
    pub alerts: AlertSettings,
    /// Periodic check cadence
    pub schedule: ScheduleSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            alerts: AlertSettings::default(),
            schedule: ScheduleSettings::default(),
        }
    }
}

/// Settings consumed by a single check pass.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AlertSettings {
    /// Global kill switch. In a file this is the default for the stored preference;
    /// when passed to a check pass it is the value read for that pass.
    pub enabled: bool,
    /// Suppress a notification when the same severity was already sent for a budget
    pub dedupe: bool,
    /// Label used when a budget's category no longer exists
    pub placeholder_category: String,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dedupe: false,
            placeholder_category: "Unknown category".to_string(),
        }
    }
}

/// Cadence and retry policy of the periodic check.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Hours between periodic checks
    pub interval_hours: u64,
    /// Minutes a due check may wait for its run condition before the period is skipped
    pub flex_minutes: u64,
    /// Attempts per period for a check that fails transiently
    pub max_attempts: u32,
    /// Delay before the first retry, doubled on each further retry
    pub initial_backoff_secs: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval_hours: 6,
            flex_minutes: 60,
            max_attempts: 3,
            initial_backoff_secs: 30,
        }
    }
}

impl ScheduleSettings {
    /// Time between periodic checks
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(3600))
    }

    /// Flex window
    #[must_use]
    pub const fn flex(&self) -> Duration {
        Duration::from_secs(self.flex_minutes.saturating_mul(60))
    }

    /// First retry delay
    #[must_use]
    pub const fn initial_backoff(&self) -> Duration {
        Duration::from_secs(self.initial_backoff_secs)
    }
}

fn validate_schedule(schedule: &ScheduleSettings) -> Result<()> {
    if !(1..=MAX_INTERVAL_HOURS).contains(&schedule.interval_hours) {
        return Err(Error::Config {
            message: format!(
                "schedule.interval_hours must be between 1 and {MAX_INTERVAL_HOURS}, got {}",
                schedule.interval_hours
            ),
        });
    }
    // Flex may not outlast the period it belongs to
    if schedule.flex_minutes > schedule.interval_hours * 60 {
        return Err(Error::Config {
            message: format!(
                "schedule.flex_minutes must not exceed the interval ({} minutes), got {}",
                schedule.interval_hours * 60,
                schedule.flex_minutes
            ),
        });
    }
    if schedule.max_attempts == 0 {
        return Err(Error::Config {
            message: "schedule.max_attempts must be at least 1".to_string(),
        });
    }
    if schedule.initial_backoff_secs > MAX_INITIAL_BACKOFF_SECS {
        return Err(Error::Config {
            message: format!(
                "schedule.initial_backoff_secs must be at most {MAX_INITIAL_BACKOFF_SECS}, got {}",
                schedule.initial_backoff_secs
            ),
        });
    }
    Ok(())
}

/// Parses settings from TOML text.
///
/// # Arguments
/// * `contents` - TOML text; missing tables and keys take their defaults
///
/// # Returns
/// The parsed settings, or `Error::Config` when the text does not parse or a
/// schedule value is out of range.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings: {e}"),
    })?;

    validate_schedule(&settings.schedule)?;
    Ok(settings)
}

/// Loads settings from `path`, returning defaults when the file does not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No settings file at {:?}, using defaults", path);
        return Ok(Settings::default());
    }

    debug!("Loading settings from {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path.display()),
    })?;
    parse_settings(&contents)
}

/// Loads settings from the path in [`CONFIG_PATH_ENV`] or [`DEFAULT_CONFIG_PATH`],
/// then applies the `DATABASE_URL` override.
pub fn load_app_settings() -> Result<Settings> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut settings = load_settings(&path)?;
    settings.database_url = crate::config::database::get_database_url(&settings.database_url);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            database_url = "sqlite::memory:"

            [alerts]
            enabled = false
            dedupe = true
            placeholder_category = "Sin categoría"

            [schedule]
            interval_hours = 12
            flex_minutes = 30
            max_attempts = 5
            initial_backoff_secs = 10
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert!(!settings.alerts.enabled);
        assert!(settings.alerts.dedupe);
        assert_eq!(settings.alerts.placeholder_category, "Sin categoría");
        assert_eq!(settings.schedule.interval(), Duration::from_secs(12 * 3600));
        assert_eq!(settings.schedule.flex(), Duration::from_secs(30 * 60));
        assert_eq!(settings.schedule.max_attempts, 5);
        assert_eq!(settings.schedule.initial_backoff(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings = parse_settings("[alerts]\ndedupe = true\n").unwrap();
        assert!(settings.alerts.enabled);
        assert!(settings.alerts.dedupe);
        assert_eq!(settings.schedule, ScheduleSettings::default());
        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_default_schedule_matches_periodic_cadence() {
        let schedule = ScheduleSettings::default();
        assert_eq!(schedule.interval(), Duration::from_secs(6 * 3600));
        assert_eq!(schedule.flex(), Duration::from_secs(3600));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(matches!(
            parse_settings("[schedule]\ninterval_hours = 0\n"),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            parse_settings("[schedule]\nmax_attempts = 0\n"),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            parse_settings("alerts = 3"),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_out_of_range_schedule_rejected() {
        for toml_str in [
            "[schedule]\ninterval_hours = 9223372036854775807\n",
            "[schedule]\ninterval_hours = 8785\n",
            "[schedule]\nflex_minutes = 18446744073709551615\n",
            "[schedule]\ninterval_hours = 1\nflex_minutes = 61\n",
            "[schedule]\ninitial_backoff_secs = 86401\n",
        ] {
            assert!(
                matches!(parse_settings(toml_str), Err(Error::Config { .. })),
                "accepted {toml_str:?}"
            );
        }

        let longest =
            parse_settings("[schedule]\ninterval_hours = 8784\nflex_minutes = 527040\n").unwrap();
        assert_eq!(longest.schedule.interval(), Duration::from_secs(8784 * 3600));
        assert_eq!(longest.schedule.flex(), Duration::from_secs(527_040 * 60));
    }

    #[test]
    fn test_durations_saturate_instead_of_overflowing() {
        let schedule = ScheduleSettings {
            interval_hours: u64::MAX,
            flex_minutes: u64::MAX,
            ..ScheduleSettings::default()
        };
        assert_eq!(schedule.interval(), Duration::from_secs(u64::MAX));
        assert_eq!(schedule.flex(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let settings = load_settings("definitely/not/here/config.toml").unwrap();
        assert_eq!(settings, Settings::default());
    }
}
