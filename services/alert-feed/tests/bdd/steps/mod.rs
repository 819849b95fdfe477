//! BDD step definitions for the alert feed service

pub mod lifecycle_steps;
pub mod reconciliation_steps;
