//! System state entity - Key/value rows for small pieces of persisted state.
//! Holds user preferences such as `budget_alerts_enabled` and the last alert
//! severity dispatched per budget when alert de-duplication is on.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key/value state row
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_state")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// State key (e.g., `"budget_alerts_enabled"`, `"budget_alert:12"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Value stored as string
    pub value: String,
    /// When this row was last written
    pub updated_at: DateTimeUtc,
}

/// `SystemState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
