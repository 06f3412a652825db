//! Shared test utilities.
//!
//! Helpers for setting up an in-memory database, creating fixtures with sensible
//! defaults, and a notifier double that records what it was asked to send.

use crate::{
    core::{
        budget, category,
        transaction::{self, TransactionInput},
    },
    entities::{self, BudgetPeriod, TransactionType},
    errors::{Error, Result},
    notify::Notifier,
};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Start of the default test budget window: 2024-01-01 00:00 UTC.
pub fn test_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// "Now" for tests: ten and a half days into the default window.
pub fn test_now() -> DateTime<Utc> {
    test_start() + TimeDelta::days(10) + TimeDelta::hours(12)
}

/// Creates a category with the given name and placeholder icon/color.
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::category::Model> {
    category::create_category(db, name, "tag", "#607D8B").await
}

/// Creates an active monthly budget starting at [`test_start`].
pub async fn create_test_budget(
    db: &DatabaseConnection,
    category_id: i64,
    amount: f64,
) -> Result<entities::budget::Model> {
    budget::create_budget(db, category_id, amount, BudgetPeriod::Monthly, test_start()).await
}

/// Expense input with a default description.
pub fn expense_input(
    category_id: Option<i64>,
    amount: f64,
    date: DateTime<Utc>,
) -> TransactionInput {
    TransactionInput {
        amount,
        transaction_type: TransactionType::Expense,
        category_id,
        description: "Test expense".to_string(),
        date,
        payment_method_id: None,
    }
}

/// Records an expense in `category_id`.
pub async fn create_test_expense(
    db: &DatabaseConnection,
    category_id: i64,
    amount: f64,
    date: DateTime<Utc>,
) -> Result<entities::transaction::Model> {
    transaction::create_transaction(db, expense_input(Some(category_id), amount, date)).await
}

/// Records an income transaction.
pub async fn create_test_income(
    db: &DatabaseConnection,
    category_id: Option<i64>,
    amount: f64,
    date: DateTime<Utc>,
) -> Result<entities::transaction::Model> {
    let input = TransactionInput {
        transaction_type: TransactionType::Income,
        description: "Test income".to_string(),
        ..expense_input(category_id, amount, date)
    };
    transaction::create_transaction(db, input).await
}

/// Unsaved monthly budget model for pure calculation tests.
pub fn budget_model(amount: f64) -> entities::budget::Model {
    entities::budget::Model {
        id: 1,
        category_id: 1,
        amount,
        period: BudgetPeriod::Monthly,
        start_date: test_start(),
        end_date: test_start() + BudgetPeriod::Monthly.duration(),
        is_active: true,
        created_at: test_start(),
        updated_at: test_start(),
    }
}

/// Unsaved category model for pure calculation tests.
pub fn category_model(name: &str) -> entities::category::Model {
    entities::category::Model {
        id: 1,
        name: name.to_string(),
        icon: "tag".to_string(),
        color: "#607D8B".to_string(),
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub enum SentNotification {
    /// `notify_warning` call
    Warning {
        category: String,
        spent: f64,
        limit: f64,
        percent: f64,
    },
    /// `notify_critical` call
    Critical {
        category: String,
        spent: f64,
        limit: f64,
        percent: f64,
    },
    /// `notify_exceeded` call
    Exceeded {
        category: String,
        spent: f64,
        limit: f64,
        overspent: f64,
    },
}

impl SentNotification {
    /// Category label the notification was sent for
    pub fn category(&self) -> &str {
        match self {
            Self::Warning { category, .. }
            | Self::Critical { category, .. }
            | Self::Exceeded { category, .. } => category,
        }
    }
}

/// Notifier double that records every successful call and can be told to fail
/// for one category.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
    failing_category: Mutex<Option<String>>,
}

impl RecordingNotifier {
    /// A notifier that fails every call for `category`.
    pub fn failing_for(category: &str) -> Self {
        Self {
            failing_category: Mutex::new(Some(category.to_string())),
            ..Self::default()
        }
    }

    /// Makes every later call succeed.
    pub fn stop_failing(&self) {
        if let Ok(mut failing) = self.failing_category.lock() {
            *failing = None;
        }
    }

    /// Everything recorded so far, in call order.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn record(&self, notification: SentNotification) -> Result<()> {
        let failing = self
            .failing_category
            .lock()
            .map(|f| f.as_deref() == Some(notification.category()))
            .unwrap_or(false);
        if failing {
            return Err(Error::Notification {
                message: format!("delivery to {} failed", notification.category()),
            });
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification);
        }
        Ok(())
    }
}

impl Notifier for RecordingNotifier {
    fn notify_warning(&self, category: &str, spent: f64, limit: f64, percent: f64) -> Result<()> {
        self.record(SentNotification::Warning {
            category: category.to_string(),
            spent,
            limit,
            percent,
        })
    }

    fn notify_critical(
        &self,
        category: &str,
        spent: f64,
        limit: f64,
        percent: f64,
    ) -> Result<()> {
        self.record(SentNotification::Critical {
            category: category.to_string(),
            spent,
            limit,
            percent,
        })
    }

    fn notify_exceeded(
        &self,
        category: &str,
        spent: f64,
        limit: f64,
        overspent: f64,
    ) -> Result<()> {
        self.record(SentNotification::Exceeded {
            category: category.to_string(),
            spent,
            limit,
            overspent,
        })
    }
}
