//! Budget progress calculation and status classification.
//!
//! Everything here is a pure function of its inputs. Progress is a read-time
//! projection over a budget and the spend summed for its window; it is never stored.
//!
//! The status classifier drives chart coloring. It deliberately uses its own
//! thresholds, separate from the alert thresholds in [`crate::core::alerts`].

use crate::entities::{budget, category};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Ordered thresholds of the four-tier status classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusThresholds {
    /// At or above this fraction the budget is `Warning`
    pub warning: f64,
    /// At or above this fraction the budget is `Exceeded`
    pub exceeded: f64,
    /// Strictly above this fraction the budget is `OverBudget`
    pub over_budget: f64,
}

/// Status thresholds used for charts: 80% / 100% / 120%.
pub const STATUS_THRESHOLDS: StatusThresholds = StatusThresholds {
    warning: 0.80,
    exceeded: 1.00,
    over_budget: 1.20,
};

/// Classification of how much of a budget has been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum BudgetStatus {
    /// Below 80%
    OnTrack,
    /// 80% up to (not including) 100%
    Warning,
    /// 100% up to and including 120%
    Exceeded,
    /// Above 120%
    OverBudget,
}

/// Maps a fraction of the budget used to a status.
///
/// Total over every `f64`: negative values are `OnTrack`, and `NaN` fails every
/// comparison so it is `OnTrack` as well.
#[must_use]
pub fn classify(percentage: f64) -> BudgetStatus {
    classify_with(percentage, &STATUS_THRESHOLDS)
}

/// [`classify`] against explicit thresholds; first match from the top wins.
#[must_use]
pub fn classify_with(percentage: f64, thresholds: &StatusThresholds) -> BudgetStatus {
    if percentage > thresholds.over_budget {
        BudgetStatus::OverBudget
    } else if percentage >= thresholds.exceeded {
        BudgetStatus::Exceeded
    } else if percentage >= thresholds.warning {
        BudgetStatus::Warning
    } else {
        BudgetStatus::OnTrack
    }
}

/// Point-in-time progress of one budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetProgress {
    /// The budget being measured
    pub budget: budget::Model,
    /// Its category, or a placeholder when the category no longer exists
    pub category: category::Model,
    /// Expenses in the category within the budget window
    pub spent: f64,
    /// `max(0, amount - spent)`
    pub remaining: f64,
    /// `spent / amount` as a fraction, not clamped; 0 when the amount is not positive
    pub percentage: f64,
    /// `spent > amount`
    pub is_over_budget: bool,
    /// Whole days until the window ends, never negative
    pub days_remaining: i64,
}

impl BudgetProgress {
    /// Status under the four-tier chart classifier.
    #[must_use]
    pub fn status(&self) -> BudgetStatus {
        classify(self.percentage)
    }

    /// Percentage clamped to `[0, 1]` for progress bars.
    #[must_use]
    pub fn display_fraction(&self) -> f64 {
        if self.percentage.is_nan() {
            return 0.0;
        }
        self.percentage.clamp(0.0, 1.0)
    }

    /// The budget limit
    #[must_use]
    pub const fn limit(&self) -> f64 {
        self.budget.amount
    }
}

/// Derives progress for `budget` given what was `spent` in its window as of `now`.
///
/// A budget amount of zero or less yields a percentage of 0 instead of dividing.
/// Days remaining truncate toward zero and never go below 0, so a budget that has
/// already ended reports 0.
///
/// # Arguments
/// * `budget` - The budget being measured
/// * `category` - Its category, or a placeholder when the category is gone
/// * `spent` - Sum of expenses in the category within the budget window
/// * `now` - Instant the progress is measured at
///
/// # Returns
/// A `BudgetProgress` snapshot; `percentage` is a fraction and is not clamped
#[must_use]
pub fn compute_progress(
    budget: budget::Model,
    category: category::Model,
    spent: f64,
    now: DateTime<Utc>,
) -> BudgetProgress {
    let amount = budget.amount;
    let percentage = if amount > 0.0 { spent / amount } else { 0.0 };
    let remaining = (amount - spent).max(0.0);
    let days_remaining = (budget.end_date - now).num_days().max(0);

    BudgetProgress {
        is_over_budget: spent > amount,
        budget,
        category,
        spent,
        remaining,
        percentage,
        days_remaining,
    }
}

/// Renders a text progress bar like `[████████░░] 80%`.
///
/// The bar is clamped to full; the label shows the unclamped percentage.
///
/// # Arguments
/// * `progress` - Progress to render
/// * `bar_length` - Length of the bar in characters
///
/// # Returns
/// Formatted progress bar string
#[must_use]
pub fn format_progress_bar(progress: &BudgetProgress, bar_length: usize) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = (progress.display_fraction() * bar_length as f64).round() as usize;
    let filled = filled.min(bar_length);

    format!(
        "[{}{}] {:.0}%",
        "█".repeat(filled),
        "░".repeat(bar_length - filled),
        progress.percentage * 100.0
    )
}
