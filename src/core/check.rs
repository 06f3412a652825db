//! Budget check pass - evaluates active budgets and sends alerts.
//!
//! A pass runs periodically from the scheduler and on demand after a transaction
//! or budget change. Each pass:
//!
//! 1. Returns immediately if alerts are disabled
//! 2. Loads active budgets with their spend
//! 3. Computes progress, substituting a placeholder for missing categories
//! 4. Evaluates each budget and dispatches its alert
//!
//! A failed dispatch does not stop the remaining budgets, but the pass as a whole
//! then fails with a transient error so the caller retries it.
//!
//! With de-duplication on, the last severity sent for each budget is stored in the
//! key/value table and an identical decision is skipped. Without it every pass
//! re-sends every alert whose condition still holds.

use crate::{
    config::AlertSettings,
    core::{
        alerts::{AlertDecision, AlertSeverity, evaluate},
        budget::{clear_expired_budget_alerts, list_active_budgets_with_spend},
        category::placeholder_category,
        progress::{BudgetProgress, compute_progress},
        state::{budget_alert_key, clear_budget_alert, get_state_value, set_state_value},
    },
    entities::{TransactionType, transaction},
    errors::{Error, Result},
    notify::{Notifier, dispatch},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::{debug, error, info, instrument};

/// An alert that was handed to the notifier successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct SentAlert {
    /// Budget the alert is about
    pub budget_id: i64,
    /// Category label used in the notification
    pub category: String,
    /// The decision that was sent
    pub decision: AlertDecision,
}

/// Summary of one check pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckOutcome {
    /// False when the pass was skipped because alerts are disabled
    pub ran: bool,
    /// Number of budgets evaluated
    pub evaluated: usize,
    /// Alerts delivered
    pub sent: Vec<SentAlert>,
    /// Alerts skipped because the same severity was already sent
    pub suppressed: usize,
}

/// Runs a pass over every active budget.
///
/// # Arguments
/// * `db` - Database connection
/// * `notifier` - Receives one call per alert that fires
/// * `settings` - Kill switch, de-duplication and placeholder label for this pass
/// * `now` - Instant the pass evaluates budgets at
///
/// # Returns
/// What the pass evaluated and sent, or `NotificationsFailed` when any dispatch
/// failed after every budget was tried
pub async fn run_budget_check<N>(
    db: &DatabaseConnection,
    notifier: &N,
    settings: &AlertSettings,
    now: DateTime<Utc>,
) -> Result<CheckOutcome>
where
    N: Notifier + ?Sized,
{
    run_check(db, notifier, settings, None, now).await
}

/// Runs a pass over the active budgets of one category, e.g. after a transaction
/// in that category was recorded.
pub async fn run_category_check<N>(
    db: &DatabaseConnection,
    notifier: &N,
    settings: &AlertSettings,
    category_id: i64,
    now: DateTime<Utc>,
) -> Result<CheckOutcome>
where
    N: Notifier + ?Sized,
{
    run_check(db, notifier, settings, Some(category_id), now).await
}

/// Re-checks the budgets a just-recorded transaction counts toward.
///
/// Income and uncategorised transactions never count toward a budget, so no pass
/// runs for them.
pub async fn check_after_transaction<N>(
    db: &DatabaseConnection,
    notifier: &N,
    settings: &AlertSettings,
    recorded: &transaction::Model,
    now: DateTime<Utc>,
) -> Result<CheckOutcome>
where
    N: Notifier + ?Sized,
{
    match (recorded.transaction_type, recorded.category_id) {
        (TransactionType::Expense, Some(category_id)) => {
            run_category_check(db, notifier, settings, category_id, now).await
        }
        _ => Ok(CheckOutcome::default()),
    }
}

#[instrument(skip(db, notifier, settings))]
async fn run_check<N>(
    db: &DatabaseConnection,
    notifier: &N,
    settings: &AlertSettings,
    category_id: Option<i64>,
    now: DateTime<Utc>,
) -> Result<CheckOutcome>
where
    N: Notifier + ?Sized,
{
    if !settings.enabled {
        debug!("Budget alerts disabled, skipping check");
        return Ok(CheckOutcome::default());
    }

    let budgets = list_active_budgets_with_spend(db, now, category_id).await?;

    let mut outcome = CheckOutcome {
        ran: true,
        evaluated: budgets.len(),
        ..Default::default()
    };
    let mut attempted = 0;
    let mut failed = 0;

    for entry in budgets {
        let category = entry.category.unwrap_or_else(|| {
            placeholder_category(entry.budget.category_id, &settings.placeholder_category)
        });
        let progress = compute_progress(entry.budget, category, entry.spent, now);
        let budget_id = progress.budget.id;

        let Some(decision) = evaluate(&progress) else {
            if settings.dedupe {
                clear_budget_alert(db, budget_id).await?;
            }
            continue;
        };

        if settings.dedupe && already_sent(db, budget_id, decision.severity()).await? {
            debug!(
                "Suppressing repeat {} alert for budget {}",
                decision.severity(),
                budget_id
            );
            outcome.suppressed += 1;
            continue;
        }

        attempted += 1;
        if let Err(e) = send(notifier, &progress, decision) {
            error!("Failed to send alert for budget {}: {}", budget_id, e);
            failed += 1;
            continue;
        }

        if settings.dedupe {
            set_state_value(db, &budget_alert_key(budget_id), decision.severity().as_str())
                .await?;
        }
        outcome.sent.push(SentAlert {
            budget_id,
            category: progress.category.name,
            decision,
        });
    }

    if settings.dedupe {
        clear_expired_budget_alerts(db, now).await?;
    }

    info!(
        "Budget check evaluated {} budgets, sent {} alerts, suppressed {}, failed {}",
        outcome.evaluated,
        outcome.sent.len(),
        outcome.suppressed,
        failed
    );

    if failed > 0 {
        return Err(Error::NotificationsFailed { failed, attempted });
    }
    Ok(outcome)
}

async fn already_sent(
    db: &DatabaseConnection,
    budget_id: i64,
    severity: AlertSeverity,
) -> Result<bool> {
    let stored = get_state_value(db, &budget_alert_key(budget_id)).await?;
    Ok(stored.as_deref().and_then(AlertSeverity::parse) == Some(severity))
}

fn send<N>(notifier: &N, progress: &BudgetProgress, decision: AlertDecision) -> Result<()>
where
    N: Notifier + ?Sized,
{
    debug!(
        "Sending {} alert for budget {} ({})",
        decision.severity(),
        progress.budget.id,
        progress.category.name
    );
    dispatch(notifier, progress, decision)
}
