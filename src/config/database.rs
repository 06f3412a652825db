//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables are
//! generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs.

use crate::entities::{Budget, Category, SystemState, Transaction};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityName, EntityTrait, Schema};
use tracing::{debug, instrument};

/// Default database location when neither the environment nor the settings file name one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/budget_alerts.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back to `fallback`.
#[must_use]
pub fn get_database_url(fallback: &str) -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| fallback.to_string())
}

/// Connects to `database_url` and makes sure every table exists.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    create_tables(&db).await?;
    Ok(db)
}

/// Creates all tables that do not exist yet.
///
/// Safe to call on every start-up.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table(db, Category).await?;
    create_table(db, Transaction).await?;
    create_table(db, Budget).await?;
    create_table(db, SystemState).await?;
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    debug!("Ensured table {}", entity.table_name());
    Ok(())
}
