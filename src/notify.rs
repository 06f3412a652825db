//! Notification collaborator.
//!
//! The alert pass hands each decision to a [`Notifier`]. Delivery itself (push,
//! email, OS notification) lives outside this crate; the only implementation here
//! writes notifications to the log.

use crate::{
    core::{alerts::AlertDecision, progress::BudgetProgress},
    errors::Result,
};
use tracing::warn;

/// Receives budget alerts. Calls are fire-and-forget from the pass's point of view;
/// an `Err` marks the dispatch as failed so the pass can be retried.
pub trait Notifier: Send + Sync {
    /// Budget is between the warning and critical thresholds.
    fn notify_warning(&self, category: &str, spent: f64, limit: f64, percent: f64) -> Result<()>;

    /// Budget is between the critical threshold and its limit.
    fn notify_critical(
        &self,
        category: &str,
        spent: f64,
        limit: f64,
        percent: f64,
    ) -> Result<()>;

    /// Budget limit has been passed by `overspent`.
    fn notify_exceeded(
        &self,
        category: &str,
        spent: f64,
        limit: f64,
        overspent: f64,
    ) -> Result<()>;
}

/// Routes `decision` to the matching [`Notifier`] method.
pub fn dispatch<N>(notifier: &N, progress: &BudgetProgress, decision: AlertDecision) -> Result<()>
where
    N: Notifier + ?Sized,
{
    let category = progress.category.name.as_str();
    let spent = progress.spent;
    let limit = progress.limit();

    match decision {
        AlertDecision::Warning { percent } => {
            notifier.notify_warning(category, spent, limit, percent)
        }
        AlertDecision::Critical { percent } => {
            notifier.notify_critical(category, spent, limit, percent)
        }
        AlertDecision::Exceeded { overspent } => {
            notifier.notify_exceeded(category, spent, limit, overspent)
        }
    }
}

/// Writes every notification as a `tracing` event at `WARN` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_warning(&self, category: &str, spent: f64, limit: f64, percent: f64) -> Result<()> {
        warn!(
            category,
            spent,
            limit,
            "Budget warning: {category} is at {percent:.0}% ({spent:.2} of {limit:.2})"
        );
        Ok(())
    }

    fn notify_critical(
        &self,
        category: &str,
        spent: f64,
        limit: f64,
        percent: f64,
    ) -> Result<()> {
        warn!(
            category,
            spent,
            limit,
            "Budget critical: {category} is at {percent:.0}% ({spent:.2} of {limit:.2})"
        );
        Ok(())
    }

    fn notify_exceeded(
        &self,
        category: &str,
        spent: f64,
        limit: f64,
        overspent: f64,
    ) -> Result<()> {
        warn!(
            category,
            spent,
            limit,
            "Budget exceeded: {category} is {overspent:.2} over its {limit:.2} limit"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::progress::compute_progress;
    use crate::test_utils::{
        RecordingNotifier, SentNotification, budget_model, category_model, test_now,
    };

    #[test]
    fn test_dispatch_routes_by_decision() {
        let notifier = RecordingNotifier::default();
        let progress =
            compute_progress(budget_model(100.0), category_model("Food"), 125.0, test_now());

        dispatch(&notifier, &progress, AlertDecision::Exceeded { overspent: 25.0 }).unwrap();
        dispatch(&notifier, &progress, AlertDecision::Critical { percent: 97.0 }).unwrap();
        dispatch(&notifier, &progress, AlertDecision::Warning { percent: 85.0 }).unwrap();

        assert_eq!(
            notifier.sent(),
            vec![
                SentNotification::Exceeded {
                    category: "Food".to_string(),
                    spent: 125.0,
                    limit: 100.0,
                    overspent: 25.0,
                },
                SentNotification::Critical {
                    category: "Food".to_string(),
                    spent: 125.0,
                    limit: 100.0,
                    percent: 97.0,
                },
                SentNotification::Warning {
                    category: "Food".to_string(),
                    spent: 125.0,
                    limit: 100.0,
                    percent: 85.0,
                },
            ]
        );
    }

    #[test]
    fn test_log_notifier_never_fails() {
        let notifier = LogNotifier;
        assert!(notifier.notify_warning("Food", 85.0, 100.0, 85.0).is_ok());
        assert!(notifier.notify_critical("Food", 97.0, 100.0, 97.0).is_ok());
        assert!(notifier.notify_exceeded("Food", 125.0, 100.0, 25.0).is_ok());
    }
}
