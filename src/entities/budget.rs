//! Budget entity - A spending limit for one category over a fixed window.
//!
//! The window is `[start_date, end_date]` with `end_date = start_date + period`.
//! Only one active budget per category may cover any instant.

use chrono::TimeDelta;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Length of a budget window
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    /// Seven days
    #[sea_orm(string_value = "weekly")]
    Weekly,
    /// Thirty days
    #[sea_orm(string_value = "monthly")]
    Monthly,
    /// 365 days
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

impl BudgetPeriod {
    /// Number of whole days in the window
    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Weekly => 7,
            Self::Monthly => 30,
            Self::Yearly => 365,
        }
    }

    /// Fixed duration of the window
    #[must_use]
    pub fn duration(self) -> TimeDelta {
        TimeDelta::days(self.days())
    }
}

/// Budget database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier for the budget
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Category whose expenses count against this budget
    pub category_id: i64,
    /// Spending limit for the window
    pub amount: f64,
    /// Window length
    pub period: BudgetPeriod,
    /// First instant of the window
    pub start_date: DateTimeUtc,
    /// Last instant of the window (`start_date + period`)
    pub end_date: DateTimeUtc,
    /// Inactive budgets are kept but never evaluated
    pub is_active: bool,
    /// When the budget was created
    pub created_at: DateTimeUtc,
    /// When the budget was last modified
    pub updated_at: DateTimeUtc,
}

/// No declared relations; references are plain ids
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
