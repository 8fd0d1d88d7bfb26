//! Health check for the planner.

use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HealthCheckError {
    #[error("unable to reach the database: {0}")]
    DB(#[from] sqlx::Error),
    #[error("unexpected health check result: {0}")]
    UnexpectedResult(i32),
}

/// Check that the planner is able to reach the database and run a statement there.
pub async fn health_check(pool: &PgPool) -> Result<(), HealthCheckError> {
    let result: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    if result == 1 {
        Ok(())
    } else {
        Err(HealthCheckError::UnexpectedResult(result))
    }
}
