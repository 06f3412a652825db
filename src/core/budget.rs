//! Budget business logic - Creating and maintaining per-category budgets.
//!
//! A budget's window is derived from its start date and period. At most one active
//! budget per category may cover any instant; every operation that could break this
//! (create, changing the period or start, re-activating) runs the overlap check.

use crate::{
    core::{
        category::get_category_by_id,
        state::{clear_budget_alert, clear_budget_alerts},
        transaction::{sum_expenses_in_window, validate_amount},
    },
    entities::{Budget, BudgetPeriod, budget, category},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use tracing::{debug, instrument};

/// An active budget together with what has been spent against it.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetWithSpend {
    /// The budget
    pub budget: budget::Model,
    /// Its category, `None` when the category has been deleted
    pub category: Option<category::Model>,
    /// Sum of expenses in the category within the budget window
    pub spent: f64,
}

/// Changes applied by [`update_budget`]. `None` leaves a field unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BudgetUpdate {
    /// New spending limit
    pub amount: Option<f64>,
    /// New period; the end date is recomputed from the start date
    pub period: Option<BudgetPeriod>,
    /// New start date; the end date is recomputed
    pub start_date: Option<DateTime<Utc>>,
}

/// Finds an active budget for `category_id` whose window overlaps `[start, end]`,
/// ignoring the budget with id `exclude_id`.
pub async fn find_overlapping_budget<C>(
    db: &C,
    category_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<i64>,
) -> Result<Option<budget::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Budget::find()
        .filter(budget::Column::CategoryId.eq(category_id))
        .filter(budget::Column::IsActive.eq(true))
        .filter(budget::Column::StartDate.lte(end))
        .filter(budget::Column::EndDate.gte(start));

    if let Some(id) = exclude_id {
        query = query.filter(budget::Column::Id.ne(id));
    }

    query.one(db).await.map_err(Into::into)
}

async fn ensure_no_overlap<C>(
    db: &C,
    category_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<i64>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let overlapping = find_overlapping_budget(db, category_id, start, end, exclude_id).await?;
    if let Some(existing) = overlapping {
        debug!(
            "Rejecting budget window {} - {} for category {}: overlaps budget {}",
            start, end, category_id, existing.id
        );
        return Err(Error::BudgetOverlap {
            category_id,
            existing_id: existing.id,
        });
    }
    Ok(())
}

/// Creates an active budget for a category starting at `start_date`.
///
/// The end date is `start_date + period`. Fails with `BudgetOverlap` if another
/// active budget for the same category covers any part of that window.
#[instrument(skip(db))]
pub async fn create_budget(
    db: &DatabaseConnection,
    category_id: i64,
    amount: f64,
    period: BudgetPeriod,
    start_date: DateTime<Utc>,
) -> Result<budget::Model> {
    validate_amount(amount)?;

    // Overlap check and insert share one transaction
    let txn = db.begin().await?;

    if get_category_by_id(&txn, category_id).await?.is_none() {
        return Err(Error::CategoryNotFound { id: category_id });
    }

    let end_date = start_date + period.duration();
    ensure_no_overlap(&txn, category_id, start_date, end_date, None).await?;

    let now = Utc::now();
    let budget = budget::ActiveModel {
        category_id: Set(category_id),
        amount: Set(amount),
        period: Set(period),
        start_date: Set(start_date),
        end_date: Set(end_date),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = budget.insert(&txn).await?;
    txn.commit().await?;
    Ok(result)
}

/// Finds a budget by id.
pub async fn get_budget_by_id(
    db: &DatabaseConnection,
    budget_id: i64,
) -> Result<Option<budget::Model>> {
    Budget::find_by_id(budget_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// All budgets for a category, active or not, most recent window first.
pub async fn get_budgets_for_category(
    db: &DatabaseConnection,
    category_id: i64,
) -> Result<Vec<budget::Model>> {
    Budget::find()
        .filter(budget::Column::CategoryId.eq(category_id))
        .order_by_desc(budget::Column::StartDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies `changes` to a budget, recomputing the end date when the window moves.
pub async fn update_budget(
    db: &DatabaseConnection,
    budget_id: i64,
    changes: BudgetUpdate,
) -> Result<budget::Model> {
    if let Some(amount) = changes.amount {
        validate_amount(amount)?;
    }

    let txn = db.begin().await?;

    let existing = Budget::find_by_id(budget_id)
        .one(&txn)
        .await?
        .ok_or(Error::BudgetNotFound { id: budget_id })?;

    let period = changes.period.unwrap_or(existing.period);
    let start_date = changes.start_date.unwrap_or(existing.start_date);
    let end_date = start_date + period.duration();
    let window_changed = start_date != existing.start_date || end_date != existing.end_date;

    if existing.is_active && window_changed {
        ensure_no_overlap(&txn, existing.category_id, start_date, end_date, Some(budget_id))
            .await?;
    }

    let amount = changes.amount.unwrap_or(existing.amount);
    let mut active_model: budget::ActiveModel = existing.into();
    active_model.amount = Set(amount);
    active_model.period = Set(period);
    active_model.start_date = Set(start_date);
    active_model.end_date = Set(end_date);
    active_model.updated_at = Set(Utc::now());

    let result = active_model.update(&txn).await?;
    txn.commit().await?;
    Ok(result)
}

/// Activates or deactivates a budget. Re-activation runs the overlap check.
///
/// Any alert severity recorded for the budget is forgotten when its state flips,
/// so a re-activated budget alerts afresh.
pub async fn set_budget_active(
    db: &DatabaseConnection,
    budget_id: i64,
    is_active: bool,
) -> Result<budget::Model> {
    let txn = db.begin().await?;

    let existing = Budget::find_by_id(budget_id)
        .one(&txn)
        .await?
        .ok_or(Error::BudgetNotFound { id: budget_id })?;

    if is_active && !existing.is_active {
        ensure_no_overlap(
            &txn,
            existing.category_id,
            existing.start_date,
            existing.end_date,
            Some(budget_id),
        )
        .await?;
    }

    if is_active != existing.is_active {
        clear_budget_alert(&txn, budget_id).await?;
    }

    let mut active_model: budget::ActiveModel = existing.into();
    active_model.is_active = Set(is_active);
    active_model.updated_at = Set(Utc::now());

    let result = active_model.update(&txn).await?;
    txn.commit().await?;
    Ok(result)
}

/// Deletes a budget together with its recorded alert severity.
pub async fn delete_budget(db: &DatabaseConnection, budget_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let result = Budget::delete_by_id(budget_id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(Error::BudgetNotFound { id: budget_id });
    }
    clear_budget_alert(&txn, budget_id).await?;

    txn.commit().await?;
    Ok(())
}

/// Forgets the alert severities recorded for budgets whose window ended before `now`.
///
/// Expired budgets are never evaluated again, so nothing else would clear them.
///
/// # Returns
/// The number of state rows removed.
pub async fn clear_expired_budget_alerts(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<u64> {
    let expired: Vec<i64> = Budget::find()
        .select_only()
        .column(budget::Column::Id)
        .filter(budget::Column::EndDate.lt(now))
        .into_tuple()
        .all(db)
        .await?;

    let removed = clear_budget_alerts(db, &expired).await?;
    if removed > 0 {
        debug!("Cleared {} alert records of expired budgets", removed);
    }
    Ok(removed)
}

/// Active budgets whose window contains `as_of`, each with its category and spend.
///
/// When `category_id` is given only that category's budgets are returned. A
/// missing category is reported as `None` rather than an error.
///
/// # Arguments
/// * `db` - Database connection
/// * `as_of` - Instant the budget windows must contain
/// * `category_id` - Restrict the result to one category
///
/// # Returns
/// The matching budgets ordered by id, each with its category and spend
#[instrument(skip(db))]
pub async fn list_active_budgets_with_spend(
    db: &DatabaseConnection,
    as_of: DateTime<Utc>,
    category_id: Option<i64>,
) -> Result<Vec<BudgetWithSpend>> {
    let mut query = Budget::find()
        .filter(budget::Column::IsActive.eq(true))
        .filter(budget::Column::StartDate.lte(as_of))
        .filter(budget::Column::EndDate.gte(as_of));

    if let Some(id) = category_id {
        query = query.filter(budget::Column::CategoryId.eq(id));
    }

    let budgets = query.order_by_asc(budget::Column::Id).all(db).await?;

    let mut results = Vec::with_capacity(budgets.len());
    for budget in budgets {
        let category = get_category_by_id(db, budget.category_id).await?;
        let spent =
            sum_expenses_in_window(db, budget.category_id, budget.start_date, budget.end_date)
                .await?;
        results.push(BudgetWithSpend {
            budget,
            category,
            spent,
        });
    }

    debug!("Loaded {} active budgets", results.len());
    Ok(results)
}
