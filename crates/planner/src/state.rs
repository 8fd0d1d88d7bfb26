//! Transient state used by the planner.
//!
//! This is initialized on startup.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;
use tracing::{info_span, Instrument};

use query_engine_execution::metrics;
use storefront_planner_configuration::PoolSettings;

/// State for the planner.
#[derive(Debug, Clone)]
pub struct State {
    pub pool: PgPool,
    pub metrics: metrics::Metrics,
}

/// Create a connection pool and wrap it inside a planner State.
pub async fn create_state(
    connection_uri: &str,
    pool_settings: &PoolSettings,
    metrics_registry: &mut prometheus::Registry,
) -> Result<State, InitializationError> {
    let pool_options = pool_options(pool_settings);

    let pool = pool_options
        .clone()
        .connect(connection_uri)
        .instrument(info_span!("Create connection pool"))
        .await
        .map_err(InitializationError::UnableToCreatePool)?;

    let metrics = async { setup_metrics(metrics_registry, &pool_options) }
        .instrument(info_span!("Setup metrics"))
        .await?;

    Ok(State { pool, metrics })
}

/// Like `create_state`, but connections are only opened when a statement needs one.
///
/// Must be called from within a tokio runtime.
pub fn create_lazy_state(
    connection_uri: &str,
    pool_settings: &PoolSettings,
    metrics_registry: &mut prometheus::Registry,
) -> Result<State, InitializationError> {
    let pool_options = pool_options(pool_settings);
    let pool = pool_options
        .clone()
        .connect_lazy(connection_uri)
        .map_err(InitializationError::UnableToCreatePool)?;
    let metrics = setup_metrics(metrics_registry, &pool_options)?;
    Ok(State { pool, metrics })
}

fn pool_options(pool_settings: &PoolSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(pool_settings.max_connections)
        .acquire_timeout(Duration::from_secs(pool_settings.pool_timeout))
        .idle_timeout(pool_settings.idle_timeout.map(Duration::from_secs))
        .max_lifetime(pool_settings.connection_lifetime.map(Duration::from_secs))
}

fn setup_metrics(
    metrics_registry: &mut prometheus::Registry,
    pool_options: &PgPoolOptions,
) -> Result<metrics::Metrics, InitializationError> {
    let metrics = metrics::Metrics::initialize(metrics_registry)
        .map_err(InitializationError::MetricsError)?;
    metrics.set_pool_options_metrics(pool_options);
    Ok(metrics)
}

/// State initialization error.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("unable to initialize connection pool: {0}")]
    UnableToCreatePool(sqlx::Error),
    #[error("error initializing metrics: {0}")]
    MetricsError(metrics::Error),
}
