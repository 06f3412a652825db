//! Budget alert evaluation.
//!
//! Decides which notification, if any, a budget's progress calls for. Evaluation
//! is stateless: the same progress always yields the same decision, so a caller
//! that re-evaluates without de-duplication will re-send the same alert.
//!
//! The alert tiers (80% / 95% / over 100%) are a separate policy from the chart
//! status tiers in [`crate::core::progress`] (80% / 100% / over 120%). A budget
//! at 97% is a `Warning` status but a `Critical` alert.

use crate::core::progress::BudgetProgress;
use serde::Serialize;
use std::fmt;

/// Thresholds of the alert evaluator, as fractions of the budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    /// At or above this fraction a `Warning` is raised
    pub warning: f64,
    /// At or above this fraction a `Critical` alert is raised
    pub critical: f64,
    /// Strictly above this fraction the budget is `Exceeded`
    pub exceeded: f64,
}

/// Alert thresholds for notifications: 80% / 95% / over 100%.
pub const ALERT_THRESHOLDS: AlertThresholds = AlertThresholds {
    warning: 0.80,
    critical: 0.95,
    exceeded: 1.00,
};

/// Severity of an alert, ordered by how much of the budget has been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AlertSeverity {
    /// Approaching the limit
    Warning,
    /// Very close to or at the limit
    Critical,
    /// Over the limit
    Exceeded,
}

impl AlertSeverity {
    /// Stable lowercase name, used when persisting alert state
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Exceeded => "exceeded",
        }
    }

    /// Inverse of [`AlertSeverity::as_str`]
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            "exceeded" => Some(Self::Exceeded),
            _ => None,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to notify about a budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AlertDecision {
    /// Spent more than the limit; carries `spent - amount`
    Exceeded {
        /// Amount spent beyond the limit
        overspent: f64,
    },
    /// Between 95% and 100% inclusive; carries the percentage (0-100 scale)
    Critical {
        /// Percentage of the budget used
        percent: f64,
    },
    /// Between 80% and 95%; carries the percentage (0-100 scale)
    Warning {
        /// Percentage of the budget used
        percent: f64,
    },
}

impl AlertDecision {
    /// Severity of this decision
    #[must_use]
    pub const fn severity(&self) -> AlertSeverity {
        match self {
            Self::Exceeded { .. } => AlertSeverity::Exceeded,
            Self::Critical { .. } => AlertSeverity::Critical,
            Self::Warning { .. } => AlertSeverity::Warning,
        }
    }
}

/// Decides the alert for `progress` under [`ALERT_THRESHOLDS`].
#[must_use]
pub fn evaluate(progress: &BudgetProgress) -> Option<AlertDecision> {
    evaluate_with(progress, &ALERT_THRESHOLDS)
}

/// [`evaluate`] against explicit thresholds.
#[must_use]
pub fn evaluate_with(
    progress: &BudgetProgress,
    thresholds: &AlertThresholds,
) -> Option<AlertDecision> {
    let percentage = progress.percentage;

    if percentage > thresholds.exceeded {
        Some(AlertDecision::Exceeded {
            overspent: progress.spent - progress.budget.amount,
        })
    } else if percentage >= thresholds.critical {
        Some(AlertDecision::Critical {
            percent: percentage * 100.0,
        })
    } else if percentage >= thresholds.warning {
        Some(AlertDecision::Warning {
            percent: percentage * 100.0,
        })
    } else {
        None
    }
}
