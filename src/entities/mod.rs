//! Entity module - SeaORM definitions for every persisted table.
//!
//! Budgets and transactions reference categories by plain id. No foreign keys are
//! declared, so removing a category never cascades; readers deal with dangling ids.

pub mod budget;
pub mod category;
pub mod system_state;
pub mod transaction;

pub use budget::{BudgetPeriod, Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
    TransactionType,
};
