//! User preferences persisted in the key/value state table.
//!
//! The "budget alerts enabled" flag is the global kill switch for alert passes.
//! It is read once per pass and handed to the pass explicitly.

use crate::{
    core::state::{get_state_value, set_state_value},
    errors::{Error, Result},
};
use sea_orm::ConnectionTrait;

const BUDGET_ALERTS_ENABLED_KEY: &str = "budget_alerts_enabled";

/// Returns the stored "budget alerts enabled" flag, or `default` if it was never set.
///
/// # Errors
/// Returns `Error::Config` if the stored value is not `"true"` or `"false"`.
pub async fn budget_alerts_enabled<C>(db: &C, default: bool) -> Result<bool>
where
    C: ConnectionTrait,
{
    match get_state_value(db, BUDGET_ALERTS_ENABLED_KEY).await? {
        Some(value) => value.parse::<bool>().map_err(|e| Error::Config {
            message: format!("Invalid {BUDGET_ALERTS_ENABLED_KEY} value {value:?}: {e}"),
        }),
        None => Ok(default),
    }
}

/// Persists the "budget alerts enabled" flag.
pub async fn set_budget_alerts_enabled<C>(db: &C, enabled: bool) -> Result<()>
where
    C: ConnectionTrait,
{
    set_state_value(db, BUDGET_ALERTS_ENABLED_KEY, &enabled.to_string()).await
}
