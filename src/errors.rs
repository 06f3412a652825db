//! Unified error types for the budget alerting service.

use thiserror::Error;

/// Every failure the crate can surface to a caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings file or stored configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A monetary amount was zero, negative, or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Input failed a validation rule other than the amount checks
    #[error("Validation error: {message}")]
    Validation {
        /// The rule that was violated
        message: String,
    },

    /// No category with this id
    #[error("Category not found: {id}")]
    CategoryNotFound {
        /// Requested id
        id: i64,
    },

    /// No budget with this id
    #[error("Budget not found: {id}")]
    BudgetNotFound {
        /// Requested id
        id: i64,
    },

    /// No transaction with this id
    #[error("Transaction not found: {id}")]
    TransactionNotFound {
        /// Requested id
        id: i64,
    },

    /// An active budget for the same category already covers part of the window
    #[error("Budget window overlaps active budget {existing_id} for category {category_id}")]
    BudgetOverlap {
        /// Category both budgets belong to
        category_id: i64,
        /// The budget already covering the window
        existing_id: i64,
    },

    /// A single notification could not be delivered
    #[error("Notification error: {message}")]
    Notification {
        /// Reason reported by the notifier
        message: String,
    },

    /// Some notifications of a check pass could not be delivered
    #[error("Failed to deliver {failed} of {attempted} budget notifications")]
    NotificationsFailed {
        /// Number of failed dispatches
        failed: usize,
        /// Number of attempted dispatches
        attempted: usize,
    },
}

impl Error {
    /// Whether retrying the same operation later may succeed.
    ///
    /// Storage and notification failures are treated as transient; everything
    /// else is a problem with the input or configuration.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Io(_)
                | Self::Notification { .. }
                | Self::NotificationsFailed { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::Database(sea_orm::DbErr::Custom("locked".to_string())).is_transient());
        assert!(
            Error::NotificationsFailed {
                failed: 1,
                attempted: 2
            }
            .is_transient()
        );
        assert!(!Error::InvalidAmount { amount: -1.0 }.is_transient());
        assert!(
            !Error::BudgetOverlap {
                category_id: 1,
                existing_id: 2
            }
            .is_transient()
        );
    }

    #[test]
    fn test_error_messages() {
        let err = Error::BudgetOverlap {
            category_id: 3,
            existing_id: 7,
        };
        assert_eq!(
            err.to_string(),
            "Budget window overlaps active budget 7 for category 3"
        );
    }
}
