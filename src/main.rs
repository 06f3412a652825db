use budget_alerts::{
    config::{database, settings},
    errors::{Error, Result},
    notify::LogNotifier,
    scheduler::{BudgetCheckJob, PeriodicScheduler, SchedulePolicy, Scheduler, run_with_retry},
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// What the binary was asked to do
enum Mode {
    /// Run one check pass and exit
    Check,
    /// Run periodic checks until interrupted
    Run,
}

fn parse_mode() -> Result<Mode> {
    match std::env::args().nth(1).as_deref() {
        None | Some("run") => Ok(Mode::Run),
        Some("check") => Ok(Mode::Check),
        Some(other) => Err(Error::Config {
            message: format!("Unknown command {other:?}, expected \"check\" or \"run\""),
        }),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    let mode = parse_mode()?;

    // 3. Load settings, then connect and create tables
    let settings = settings::load_app_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;
    let db = database::create_connection(&settings.database_url)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    let policy = SchedulePolicy::from(settings.schedule);

    match mode {
        Mode::Check => {
            // A one-off check gets the same retry policy as a scheduled one
            let job = BudgetCheckJob::new(db, Arc::new(LogNotifier), settings.alerts.clone());
            run_with_retry(&job, &policy).await
        }
        Mode::Run => {
            // The first check runs immediately after enabling
            let job = Arc::new(BudgetCheckJob::new(
                db,
                Arc::new(LogNotifier),
                settings.alerts.clone(),
            ));
            let mut scheduler = PeriodicScheduler::new(job, policy);
            scheduler.enable();

            tokio::signal::ctrl_c().await?;
            info!("Shutting down");
            scheduler.disable();
            Ok(())
        }
    }
}
