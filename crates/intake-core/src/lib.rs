//! intake-core
//!
//! Pure domain types, process-list editing and store key conventions.
//! No AWS SDK dependency; this is the shared vocabulary of the intake system.

pub mod error;
pub mod models;
pub mod store_keys;
