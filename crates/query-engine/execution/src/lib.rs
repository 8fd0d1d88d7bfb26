//! Query execution against a PostgreSQL database.
//!
//! Every statement runs inside a read-only transaction with a transaction-scoped statement
//! timeout.

pub mod error;
pub mod metrics;
pub mod query;
