//! Metrics setup and update for the planner.

use std::time::Duration;

use prometheus::core::{AtomicF64, AtomicI64, AtomicU64, GenericCounter, GenericGauge};
use prometheus::{Gauge, IntCounter, IntGauge, Opts, Registry};
use sqlx::postgres::{PgPoolOptions, Postgres};

/// The collection of all metrics exposed through the `/metrics` endpoint.
#[derive(Debug, Clone)]
pub struct Metrics {
    pub query_total: GenericCounter<AtomicU64>,
    pub explain_total: GenericCounter<AtomicU64>,
    pub rejected_plan_total: GenericCounter<AtomicU64>,
    pub execution_failure_total: GenericCounter<AtomicU64>,
    pub pool_size: GenericGauge<AtomicI64>,
    pub pool_idle_count: GenericGauge<AtomicI64>,
    pub pool_active_count: GenericGauge<AtomicI64>,
    pub pool_max_connections: GenericGauge<AtomicI64>,
    pub pool_min_connections: GenericGauge<AtomicI64>,
    pub pool_acquire_timeout: GenericGauge<AtomicF64>,
    pub pool_max_lifetime: GenericGauge<AtomicF64>,
    pub pool_idle_timeout: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Set up counters and gauges used to produce Prometheus metrics
    pub fn initialize(metrics_registry: &mut Registry) -> Result<Self, Error> {
        let query_total = add_int_counter_metric(
            metrics_registry,
            "storefront_planner_query_total",
            "Total successful queries.",
        )?;

        let explain_total = add_int_counter_metric(
            metrics_registry,
            "storefront_planner_explain_total",
            "Total successful explains.",
        )?;

        let rejected_plan_total = add_int_counter_metric(
            metrics_registry,
            "storefront_planner_rejected_plan_total",
            "Total plans rejected before reaching the database.",
        )?;

        let execution_failure_total = add_int_counter_metric(
            metrics_registry,
            "storefront_planner_execution_failure_total",
            "Total statements that failed in the database.",
        )?;

        let pool_size = add_int_gauge_metric(
            metrics_registry,
            "storefront_planner_pool_size",
            "The number of connections currently active. This includes idle connections.",
        )?;

        let pool_idle_count = add_int_gauge_metric(
            metrics_registry,
            "storefront_planner_pool_idle",
            "The number of connections active and idle (not in use).",
        )?;

        let pool_active_count = add_int_gauge_metric(
            metrics_registry,
            "storefront_planner_pool_active",
            "The number of connections current active. This does not include idle connections.",
        )?;

        let pool_max_connections = add_int_gauge_metric(
            metrics_registry,
            "storefront_planner_pool_max_connections",
            "The maximum number of connections that this pool should maintain.",
        )?;

        let pool_min_connections = add_int_gauge_metric(
            metrics_registry,
            "storefront_planner_pool_min_connections",
            "The minimum number of connections that this pool should maintain.",
        )?;

        let pool_acquire_timeout = add_gauge_metric(
            metrics_registry,
            "storefront_planner_pool_acquire_timeout",
            "Get the maximum amount of time to spend waiting for a connection, in seconds.",
        )?;

        let pool_idle_timeout = add_gauge_metric(
            metrics_registry,
            "storefront_planner_pool_idle_timeout",
            "Get the maximum idle duration for individual connections, in seconds.",
        )?;

        let pool_max_lifetime = add_gauge_metric(
            metrics_registry,
            "storefront_planner_pool_max_lifetime",
            "Get the maximum lifetime of individual connections, in seconds.",
        )?;

        Ok(Self {
            query_total,
            explain_total,
            rejected_plan_total,
            execution_failure_total,
            pool_size,
            pool_idle_count,
            pool_active_count,
            pool_max_connections,
            pool_min_connections,
            pool_acquire_timeout,
            pool_max_lifetime,
            pool_idle_timeout,
        })
    }

    /// Record the static settings of the pool.
    pub fn set_pool_options_metrics(&self, pool_options: &PgPoolOptions) {
        set_pool_options(self, pool_options);
    }

    /// Update all pool gauges from the live pool.
    pub fn update_pool_metrics(&self, pool: &sqlx::PgPool) {
        let pool_size: i64 = pool.size().into();
        self.pool_size.set(pool_size);

        let pool_idle: i64 = i64::try_from(pool.num_idle()).unwrap_or(i64::MAX);
        self.pool_idle_count.set(pool_idle);

        let pool_active: i64 = pool_size - pool_idle;
        self.pool_active_count.set(pool_active);

        set_pool_options(self, pool.options());
    }
}

fn set_pool_options(metrics: &Metrics, pool_options: &sqlx::pool::PoolOptions<Postgres>) {
    let max_connections: i64 = pool_options.get_max_connections().into();
    metrics.pool_max_connections.set(max_connections);

    let min_connections: i64 = pool_options.get_min_connections().into();
    metrics.pool_min_connections.set(min_connections);

    let acquire_timeout: f64 = pool_options.get_acquire_timeout().as_secs_f64();
    metrics.pool_acquire_timeout.set(acquire_timeout);

    // if nothing is set, return 0
    let idle_timeout: f64 = pool_options
        .get_idle_timeout()
        .unwrap_or(Duration::ZERO)
        .as_secs_f64();
    metrics.pool_idle_timeout.set(idle_timeout);

    // if nothing is set, return 0
    let max_lifetime: f64 = pool_options
        .get_max_lifetime()
        .unwrap_or(Duration::ZERO)
        .as_secs_f64();
    metrics.pool_max_lifetime.set(max_lifetime);
}

/// Create a new int counter metric and register it with the provided Prometheus Registry
fn add_int_counter_metric(
    metrics_registry: &mut Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericCounter<AtomicU64>, Error> {
    let int_counter = IntCounter::with_opts(Opts::new(metric_name, metric_description))?;
    register_collector(metrics_registry, int_counter)
}

/// Create a new int gauge metric and register it with the provided Prometheus Registry
fn add_int_gauge_metric(
    metrics_registry: &mut Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericGauge<AtomicI64>, Error> {
    let int_gauge = IntGauge::with_opts(Opts::new(metric_name, metric_description))?;
    register_collector(metrics_registry, int_gauge)
}

/// Create a new gauge metric and register it with the provided Prometheus Registry
fn add_gauge_metric(
    metrics_registry: &mut Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericGauge<AtomicF64>, Error> {
    let gauge = Gauge::with_opts(Opts::new(metric_name, metric_description))?;
    register_collector(metrics_registry, gauge)
}

/// Register a new collector with the registry, and return it for later use.
fn register_collector<Collector: prometheus::core::Collector + std::clone::Clone + 'static>(
    metrics_registry: &mut Registry,
    collector: Collector,
) -> Result<Collector, Error> {
    metrics_registry.register(Box::new(collector.clone()))?;
    Ok(collector)
}

/// A wrapper around the Prometheus error type.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Error(#[from] prometheus::Error);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_metric() {
        let mut registry = Registry::new();
        let metrics = Metrics::initialize(&mut registry).unwrap();
        metrics.query_total.inc();

        let families = registry.gather();
        assert_eq!(families.len(), 12);
        assert!(families
            .iter()
            .any(|family| family.get_name() == "storefront_planner_query_total"));
    }

    #[test]
    fn registering_twice_fails() {
        let mut registry = Registry::new();
        Metrics::initialize(&mut registry).unwrap();
        assert!(Metrics::initialize(&mut registry).is_err());
    }
}
