//! Key/value state stored in the `system_state` table.
//!
//! Small pieces of persisted state (preferences, alert bookkeeping) live here
//! rather than in dedicated tables.

use crate::{
    entities::{SystemState, system_state},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};

const BUDGET_ALERT_PREFIX: &str = "budget_alert:";

/// Key under which the last alert severity sent for a budget is stored.
#[must_use]
pub fn budget_alert_key(budget_id: i64) -> String {
    format!("{BUDGET_ALERT_PREFIX}{budget_id}")
}

/// Reads the value stored under `key`, if any.
pub async fn get_state_value<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?;
    Ok(state.map(|s| s.value))
}

/// Stores `value` under `key`, replacing any previous value.
pub async fn set_state_value<C>(db: &C, key: &str, value: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(value.to_string());
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_state = system_state::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(db).await?;
    }

    Ok(())
}

/// Removes `key`. Returns whether a value was stored.
pub async fn delete_state_value<C>(db: &C, key: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = SystemState::delete_many()
        .filter(system_state::Column::Key.eq(key))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Forgets the alert severity recorded for a budget.
pub async fn clear_budget_alert<C>(db: &C, budget_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    delete_state_value(db, &budget_alert_key(budget_id)).await
}

/// Forgets the alert severities recorded for every budget in `budget_ids`.
///
/// # Returns
/// The number of rows removed.
pub async fn clear_budget_alerts<C>(db: &C, budget_ids: &[i64]) -> Result<u64>
where
    C: ConnectionTrait,
{
    if budget_ids.is_empty() {
        return Ok(0);
    }

    let keys: Vec<String> = budget_ids.iter().map(|&id| budget_alert_key(id)).collect();
    let result = SystemState::delete_many()
        .filter(system_state::Column::Key.is_in(keys))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
