//! Periodic scheduling of budget checks.
//!
//! [`PeriodicScheduler`] runs a [`ScheduledJob`] on a fixed interval inside a tokio
//! task. Each due run waits up to the flex window for its [`RunCondition`] (for
//! example "battery not low"); if the condition is still unmet the period is
//! skipped. A run that fails transiently is retried with exponential backoff up to
//! the configured number of attempts; after that the next period starts over.

use crate::{
    config::{AlertSettings, ScheduleSettings, preferences::budget_alerts_enabled},
    core::check::run_budget_check,
    errors::Result,
    notify::Notifier,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval, sleep},
};
use tracing::{debug, error, info, warn};

/// Work run by the scheduler.
pub trait ScheduledJob: Send + Sync + 'static {
    /// Runs the job once.
    fn run(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Device or environment constraint checked before each run.
pub trait RunCondition: Send + Sync + 'static {
    /// Whether the job may run now.
    fn is_met(&self) -> bool;
}

/// A [`RunCondition`] that is always met.
#[derive(Debug, Default, Clone, Copy)]
pub struct Always;

impl RunCondition for Always {
    fn is_met(&self) -> bool {
        true
    }
}

/// Something that can be switched between running periodic work and idling.
pub trait Scheduler {
    /// Starts periodic runs. Calling it while already enabled does nothing.
    fn enable(&mut self);
    /// Stops periodic runs. A run in progress is cancelled.
    fn disable(&mut self);
    /// Whether periodic runs are active.
    fn is_enabled(&self) -> bool;
}

/// Timing and retry policy of a [`PeriodicScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePolicy {
    /// Time between due runs
    pub interval: Duration,
    /// How long a due run may wait for its run condition
    pub flex: Duration,
    /// Attempts per period for transient failures, at least 1
    pub max_attempts: u32,
    /// Delay before the first retry, doubled for each further retry
    pub initial_backoff: Duration,
}

impl From<ScheduleSettings> for SchedulePolicy {
    fn from(settings: ScheduleSettings) -> Self {
        Self {
            interval: settings.interval(),
            flex: settings.flex(),
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: settings.initial_backoff(),
        }
    }
}

/// Runs `job` until it succeeds, fails with a non-transient error, or has been
/// attempted `policy.max_attempts` times.
pub async fn run_with_retry<J>(job: &J, policy: &SchedulePolicy) -> Result<()>
where
    J: ScheduledJob + ?Sized,
{
    let mut backoff = policy.initial_backoff;
    let mut attempt = 1;

    loop {
        match job.run().await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                warn!(
                    "Scheduled job failed (attempt {}/{}), retrying in {:?}: {}",
                    attempt, policy.max_attempts, backoff, e
                );
                sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => {
                error!("Scheduled job failed after {} attempt(s): {}", attempt, e);
                return Err(e);
            }
        }
    }
}

async fn wait_for_condition<R>(condition: &R, flex: Duration) -> bool
where
    R: RunCondition + ?Sized,
{
    if condition.is_met() {
        return true;
    }

    let poll = (flex / 4).max(Duration::from_secs(1));
    let deadline = Instant::now() + flex;
    while Instant::now() < deadline {
        sleep(poll).await;
        if condition.is_met() {
            return true;
        }
    }
    false
}

async fn run_periodically<J, R>(job: Arc<J>, condition: Arc<R>, policy: SchedulePolicy)
where
    J: ScheduledJob,
    R: RunCondition,
{
    let mut ticker = interval(policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if !wait_for_condition(condition.as_ref(), policy.flex).await {
            info!("Run condition not met within {:?}, skipping this period", policy.flex);
            continue;
        }

        // Failures are logged by run_with_retry; the next period retries wholesale
        if run_with_retry(job.as_ref(), &policy).await.is_ok() {
            debug!("Scheduled job completed");
        }
    }
}

/// Tokio-backed [`Scheduler`] running one job on a fixed cadence.
pub struct PeriodicScheduler<J, R = Always> {
    job: Arc<J>,
    condition: Arc<R>,
    policy: SchedulePolicy,
    handle: Option<JoinHandle<()>>,
}

impl<J: ScheduledJob> PeriodicScheduler<J, Always> {
    /// Creates a disabled scheduler whose runs are never held back by a condition.
    #[must_use]
    pub fn new(job: Arc<J>, policy: SchedulePolicy) -> Self {
        Self::with_condition(job, Arc::new(Always), policy)
    }
}

impl<J: ScheduledJob, R: RunCondition> PeriodicScheduler<J, R> {
    /// Creates a disabled scheduler gated by `condition`.
    #[must_use]
    pub const fn with_condition(job: Arc<J>, condition: Arc<R>, policy: SchedulePolicy) -> Self {
        Self {
            job,
            condition,
            policy,
            handle: None,
        }
    }

    /// The timing policy in use
    #[must_use]
    pub const fn policy(&self) -> &SchedulePolicy {
        &self.policy
    }
}

impl<J: ScheduledJob, R: RunCondition> Scheduler for PeriodicScheduler<J, R> {
    fn enable(&mut self) {
        if self.is_enabled() {
            return;
        }
        info!(
            "Enabling periodic job every {:?} (flex {:?})",
            self.policy.interval, self.policy.flex
        );
        self.handle = Some(tokio::spawn(run_periodically(
            Arc::clone(&self.job),
            Arc::clone(&self.condition),
            self.policy,
        )));
    }

    fn disable(&mut self) {
        if let Some(handle) = self.handle.take() {
            info!("Disabling periodic job");
            handle.abort();
        }
    }

    fn is_enabled(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<J, R> Drop for PeriodicScheduler<J, R> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// The periodic budget check: reads the alerts preference, then runs a full pass.
pub struct BudgetCheckJob<N> {
    db: DatabaseConnection,
    notifier: Arc<N>,
    settings: AlertSettings,
}

impl<N: Notifier> BudgetCheckJob<N> {
    /// `settings.enabled` is the default used until the preference has been stored.
    #[must_use]
    pub const fn new(db: DatabaseConnection, notifier: Arc<N>, settings: AlertSettings) -> Self {
        Self {
            db,
            notifier,
            settings,
        }
    }
}

impl<N: Notifier + 'static> ScheduledJob for BudgetCheckJob<N> {
    async fn run(&self) -> Result<()> {
        let enabled = budget_alerts_enabled(&self.db, self.settings.enabled).await?;
        let settings = AlertSettings {
            enabled,
            ..self.settings.clone()
        };
        run_budget_check(&self.db, self.notifier.as_ref(), &settings, Utc::now()).await?;
        Ok(())
    }
}
