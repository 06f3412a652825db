//! Category entity - User-defined spending/income categories.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Groceries")
    pub name: String,
    /// Icon identifier chosen by the user
    pub icon: String,
    /// Display color, usually a hex string like `"#4CAF50"`
    pub color: String,
}

/// Categories are referenced by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
