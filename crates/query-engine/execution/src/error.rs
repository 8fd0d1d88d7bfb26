//! Errors for query execution.

use thiserror::Error;

/// Execution errors. Database failures are opaque to callers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    DB(#[from] sqlx::Error),
}
