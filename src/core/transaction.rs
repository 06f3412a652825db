//! Transaction business logic - Recording income and expenses and aggregating them.
//!
//! Amounts are stored positive; `transaction_type` carries the direction. Budget
//! spend is never stored: it is summed from expense transactions on demand for
//! whatever window is being evaluated.

use crate::{
    entities::{Transaction, TransactionType, transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Input for creating or replacing a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionInput {
    /// Positive amount
    pub amount: f64,
    /// Income or expense
    pub transaction_type: TransactionType,
    /// Category to file under, `None` for uncategorised
    pub category_id: Option<i64>,
    /// Free-form description
    pub description: String,
    /// When it happened
    pub date: DateTime<Utc>,
    /// Optional payment method reference
    pub payment_method_id: Option<i64>,
}

/// Income and expense totals over a date range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeriodSummary {
    /// Sum of income transactions
    pub total_income: f64,
    /// Sum of expense transactions
    pub total_expense: f64,
    /// Number of transactions in the range
    pub transaction_count: usize,
}

impl PeriodSummary {
    /// Income minus expenses
    #[must_use]
    pub fn net(&self) -> f64 {
        self.total_income - self.total_expense
    }
}

/// Amounts must be finite and strictly positive.
pub(crate) fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Records a new transaction.
///
/// The amount must be positive and finite.
pub async fn create_transaction(
    db: &DatabaseConnection,
    input: TransactionInput,
) -> Result<transaction::Model> {
    validate_amount(input.amount)?;

    let transaction_model = transaction::ActiveModel {
        amount: Set(input.amount),
        transaction_type: Set(input.transaction_type),
        category_id: Set(input.category_id),
        description: Set(input.description),
        date: Set(input.date),
        payment_method_id: Set(input.payment_method_id),
        ..Default::default()
    };

    transaction_model.insert(db).await.map_err(Into::into)
}

/// Finds a transaction by id.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Replaces every field of an existing transaction.
///
/// Returns the updated row. The previous row is not returned; callers that need
/// to re-check the old category's budget should read it first.
pub async fn update_transaction(
    db: &DatabaseConnection,
    transaction_id: i64,
    input: TransactionInput,
) -> Result<transaction::Model> {
    validate_amount(input.amount)?;

    let existing = get_transaction_by_id(db, transaction_id)
        .await?
        .ok_or(Error::TransactionNotFound { id: transaction_id })?;

    let mut active_model: transaction::ActiveModel = existing.into();
    active_model.amount = Set(input.amount);
    active_model.transaction_type = Set(input.transaction_type);
    active_model.category_id = Set(input.category_id);
    active_model.description = Set(input.description);
    active_model.date = Set(input.date);
    active_model.payment_method_id = Set(input.payment_method_id);
    active_model.update(db).await.map_err(Into::into)
}

/// Deletes a transaction.
pub async fn delete_transaction(db: &DatabaseConnection, transaction_id: i64) -> Result<()> {
    let result = Transaction::delete_by_id(transaction_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::TransactionNotFound { id: transaction_id });
    }
    Ok(())
}

/// All transactions filed under `category_id`, newest first.
pub async fn get_transactions_for_category(
    db: &DatabaseConnection,
    category_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::CategoryId.eq(category_id))
        .order_by_desc(transaction::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sum of expense transactions for `category_id` dated within `[start, end]`.
///
/// # Arguments
/// * `db` - Database connection or open transaction
/// * `category_id` - Category whose expenses are summed
/// * `start` - First instant of the window, inclusive
/// * `end` - Last instant of the window, inclusive
///
/// # Returns
/// Total expense amount, 0.0 when there are none
pub async fn sum_expenses_in_window<C>(
    db: &C,
    category_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<f64>
where
    C: ConnectionTrait,
{
    let expenses = Transaction::find()
        .filter(transaction::Column::CategoryId.eq(category_id))
        .filter(transaction::Column::TransactionType.eq(TransactionType::Expense))
        .filter(transaction::Column::Date.gte(start))
        .filter(transaction::Column::Date.lte(end))
        .all(db)
        .await?;

    Ok(expenses.iter().map(|t| t.amount).sum())
}

/// Income/expense totals for all transactions dated within `[start, end]`.
pub async fn summarize_period(
    db: &DatabaseConnection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<PeriodSummary> {
    let transactions = Transaction::find()
        .filter(transaction::Column::Date.gte(start))
        .filter(transaction::Column::Date.lte(end))
        .all(db)
        .await?;

    Ok(transactions
        .iter()
        .fold(PeriodSummary::default(), |mut summary, t| {
            match t.transaction_type {
                TransactionType::Income => summary.total_income += t.amount,
                TransactionType::Expense => summary.total_expense += t.amount,
            }
            summary.transaction_count += 1;
            summary
        }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use chrono::TimeDelta;

    #[tokio::test]
    async fn test_create_transaction_validation() -> Result<()> {
        let db = setup_test_db().await?;

        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let mut input = expense_input(None, 10.0, test_now());
            input.amount = amount;
            let result = create_transaction(&db, input).await;
            assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_get_transaction() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Food").await?;

        let created = create_test_expense(&db, category.id, 12.5, test_now()).await?;
        assert_eq!(created.amount, 12.5);
        assert_eq!(created.transaction_type, TransactionType::Expense);
        assert_eq!(created.category_id, Some(category.id));

        let found = get_transaction_by_id(&db, created.id).await?.unwrap();
        assert_eq!(found, created);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_transaction() -> Result<()> {
        let db = setup_test_db().await?;
        let food = create_test_category(&db, "Food").await?;
        let travel = create_test_category(&db, "Travel").await?;
        let created = create_test_expense(&db, food.id, 20.0, test_now()).await?;

        let mut input = expense_input(Some(travel.id), 35.0, test_now());
        input.description = "Train".to_string();
        let updated = update_transaction(&db, created.id, input).await?;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.amount, 35.0);
        assert_eq!(updated.category_id, Some(travel.id));
        assert_eq!(updated.description, "Train");

        let missing = update_transaction(&db, 999, expense_input(None, 1.0, test_now())).await;
        assert!(matches!(missing, Err(Error::TransactionNotFound { id: 999 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_transaction() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_expense(&db, 1, 20.0, test_now()).await?;

        delete_transaction(&db, created.id).await?;
        assert!(get_transaction_by_id(&db, created.id).await?.is_none());

        let again = delete_transaction(&db, created.id).await;
        assert!(matches!(again, Err(Error::TransactionNotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_sum_expenses_in_window() -> Result<()> {
        let db = setup_test_db().await?;
        let food = create_test_category(&db, "Food").await?;
        let other = create_test_category(&db, "Other").await?;
        let start = test_start();
        let end = start + TimeDelta::days(30);

        // Counted: both window edges and the middle
        create_test_expense(&db, food.id, 10.0, start).await?;
        create_test_expense(&db, food.id, 20.0, start + TimeDelta::days(3)).await?;
        create_test_expense(&db, food.id, 5.0, end).await?;
        // Not counted: outside window, other category, income, uncategorised
        create_test_expense(&db, food.id, 100.0, start - TimeDelta::seconds(1)).await?;
        create_test_expense(&db, food.id, 100.0, end + TimeDelta::seconds(1)).await?;
        create_test_expense(&db, other.id, 100.0, start + TimeDelta::days(1)).await?;
        create_test_income(&db, Some(food.id), 100.0, start + TimeDelta::days(1)).await?;
        create_transaction(&db, expense_input(None, 100.0, start + TimeDelta::days(1))).await?;

        let spent = sum_expenses_in_window(&db, food.id, start, end).await?;
        assert_eq!(spent, 35.0);

        let nothing = sum_expenses_in_window(&db, 999, start, end).await?;
        assert_eq!(nothing, 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_transactions_for_category_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let food = create_test_category(&db, "Food").await?;
        let older = create_test_expense(&db, food.id, 1.0, test_start()).await?;
        let newer = create_test_expense(&db, food.id, 2.0, test_now()).await?;

        let transactions = get_transactions_for_category(&db, food.id).await?;
        assert_eq!(transactions, vec![newer, older]);

        Ok(())
    }

    #[tokio::test]
    async fn test_summarize_period() -> Result<()> {
        let db = setup_test_db().await?;
        let start = test_start();
        let end = start + TimeDelta::days(30);

        create_test_income(&db, None, 1000.0, start + TimeDelta::days(1)).await?;
        create_test_expense(&db, 1, 250.0, start + TimeDelta::days(2)).await?;
        create_test_expense(&db, 2, 100.0, start + TimeDelta::days(3)).await?;
        create_test_expense(&db, 2, 999.0, end + TimeDelta::days(1)).await?;

        let summary = summarize_period(&db, start, end).await?;
        assert_eq!(summary.total_income, 1000.0);
        assert_eq!(summary.total_expense, 350.0);
        assert_eq!(summary.net(), 650.0);
        assert_eq!(summary.transaction_count, 3);

        Ok(())
    }
}
