//! Core business logic, independent of how the service is triggered.

/// Alert evaluation with its own threshold policy
pub mod alerts;
/// Budget persistence and the overlap rule
pub mod budget;
/// Category persistence
pub mod category;
/// Check pass: evaluate budgets and send alerts
pub mod check;
/// Pure progress calculation and status classification
pub mod progress;
/// Key/value state over the `system_state` table
pub mod state;
/// Transaction persistence and spend aggregation
pub mod transaction;
