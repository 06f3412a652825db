//! Transaction entity - Income and expense records.
//!
//! Each transaction has a positive `amount`, a `transaction_type` deciding its sign,
//! an optional `category_id`, and the `date` it happened. Transactions are not linked
//! to budgets; they accrue to whichever budget window covers their date.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of money flow for a transaction
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received
    #[sea_orm(string_value = "income")]
    Income,
    /// Money spent; the only type counted against budgets
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Transaction amount, always positive
    pub amount: f64,
    /// Income or expense
    pub transaction_type: TransactionType,
    /// Category this transaction is filed under, `None` when uncategorised
    pub category_id: Option<i64>,
    /// Free-form description
    pub description: String,
    /// When the transaction happened
    pub date: DateTimeUtc,
    /// Optional reference to the payment method used
    pub payment_method_id: Option<i64>,
}

/// No declared relations; references are plain ids
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
