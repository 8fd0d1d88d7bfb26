//! This defines the `Planner`: the configuration, the contract catalog and the database state
//! shared by every request, and the operations served from them.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info_span, Instrument};

use query_engine_translation::translation::helpers::Catalog;
use query_engine_translation::translation::plan::PlannerResponse;
use storefront_planner_configuration as configuration;
use storefront_planner_configuration::environment::Environment;

use super::explain;
use super::health;
use super::query;
use super::schema;
use super::state;

/// The planner. Cheap to clone; clones share the catalog and the connection pool.
#[derive(Debug, Clone)]
pub struct Planner {
    configuration: Arc<configuration::Configuration>,
    catalog: Arc<Catalog>,
    state: Arc<state::State>,
}

impl Planner {
    pub fn new(configuration: configuration::Configuration, state: state::State) -> Planner {
        let catalog = Catalog::new(configuration.contract.clone());
        Planner {
            configuration: Arc::new(configuration),
            catalog: Arc::new(catalog),
            state: Arc::new(state),
        }
    }

    pub fn configuration(&self) -> &configuration::Configuration {
        &self.configuration
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &state::State {
        &self.state
    }

    /// Update any metrics from the state
    ///
    /// Note: some metrics can be updated directly, and do not
    /// need to be updated here. This function polls the pool
    /// for the number of active and idle connections.
    pub fn fetch_metrics(&self) {
        self.state.metrics.update_pool_metrics(&self.state.pool);
    }

    /// The schema text for the upstream planner.
    pub fn describe(&self) -> String {
        schema::get_schema(&self.configuration)
    }

    /// Validate and translate a plan without running it.
    pub fn compile(
        &self,
        plan: Value,
    ) -> Result<query::CompiledPlan, query_engine_translation::translation::error::Error> {
        query::compile_json(&self.catalog, plan)
    }

    /// Answer the raw text the upstream planner produced.
    pub async fn answer(&self, planner_output: &str) -> Result<query::Answer, query::QueryError> {
        let response = PlannerResponse::from_text(planner_output)
            .map_err(|err| query::QueryError::InvalidRequest(err.to_string()))?;
        self.query(response).await
    }

    /// Answer a planner response.
    pub async fn query(
        &self,
        response: PlannerResponse,
    ) -> Result<query::Answer, query::QueryError> {
        query::query(&self.configuration, &self.catalog, &self.state, response)
            .await
            .map_err(|err| {
                tracing::error!(
                    meta.signal_type = "log",
                    event.name = "Query error",
                    name = "Query error",
                    body = %err,
                    error = true,
                );
                err
            })
    }

    /// Explain a plan by creating an execution plan.
    pub async fn explain(
        &self,
        plan: Value,
    ) -> Result<explain::ExplainResponse, explain::ExplainError> {
        explain::explain(&self.configuration, &self.catalog, &self.state, plan)
            .await
            .map_err(|err| {
                tracing::error!(
                    meta.signal_type = "log",
                    event.name = "Explain error",
                    name = "Explain error",
                    body = %err,
                    error = true,
                );
                err
            })
    }

    /// Check that the database can be reached.
    pub async fn health_check(&self) -> Result<(), health::HealthCheckError> {
        health::health_check(&self.state.pool)
            .instrument(info_span!("Health check"))
            .await
    }
}

/// Builds a `Planner` from a configuration directory, reading secrets from `Env`.
pub struct PlannerSetup<Env: Environment> {
    environment: Env,
}

impl<Env: Environment> PlannerSetup<Env> {
    pub fn new(environment: Env) -> Self {
        Self { environment }
    }

    /// Read the configuration directory, resolve its secrets and check its contract.
    pub async fn parse_configuration(
        &self,
        configuration_dir: impl AsRef<Path>,
    ) -> Result<configuration::Configuration, SetupError> {
        // Validation errors are part of the normal business of reading a configuration, so they
        // are returned rather than logged.
        let parsed_configuration = configuration::parse_configuration(configuration_dir)
            .instrument(info_span!("parse configuration"))
            .await?;

        let runtime_configuration =
            configuration::make_runtime_configuration(parsed_configuration, &self.environment)?;

        Ok(runtime_configuration)
    }

    /// Initialize the planner's in-memory state: the connection pool and its metrics.
    pub async fn try_init_state(
        &self,
        configuration: &configuration::Configuration,
        metrics: &mut prometheus::Registry,
    ) -> Result<state::State, SetupError> {
        state::create_state(
            &configuration.connection_uri,
            &configuration.pool_settings,
            metrics,
        )
        .instrument(info_span!("Initialise state"))
        .await
        .map_err(|err| {
            tracing::error!(
                meta.signal_type = "log",
                event.name = "Initialization error",
                name = "Initialization error",
                body = %err,
                error = true,
            );
            err.into()
        })
    }

    /// Parse the configuration and initialize the state.
    pub async fn build(
        &self,
        configuration_dir: impl AsRef<Path>,
        metrics: &mut prometheus::Registry,
    ) -> Result<Planner, SetupError> {
        let configuration = self.parse_configuration(configuration_dir).await?;
        let state = self.try_init_state(&configuration, metrics).await?;
        Ok(Planner::new(configuration, state))
    }
}

/// Errors building a `Planner`.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{0}")]
    ParseConfiguration(#[from] configuration::error::ParseConfigurationError),
    #[error("{0}")]
    MakeRuntimeConfiguration(#[from] configuration::error::MakeRuntimeConfigurationError),
    #[error("{0}")]
    Initialization(#[from] state::InitializationError),
}
