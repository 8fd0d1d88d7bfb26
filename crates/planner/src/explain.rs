//! Explain a plan: the statement it compiles to and the database's execution plan for it.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info_span, Instrument};

use query_engine_translation::translation::helpers::Catalog;
use storefront_planner_configuration::Configuration;

use super::query;
use super::state;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplainResponse {
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("failed to explain query: {0}")]
    Execution(#[from] query_engine_execution::error::Error),
}

/// Explain a query by creating an execution plan.
pub async fn explain(
    configuration: &Configuration,
    catalog: &Catalog,
    state: &state::State,
    plan: Value,
) -> Result<ExplainResponse, ExplainError> {
    // Compile the plan.
    let compiled = async {
        query::compile_json(catalog, plan).map_err(|err| {
            tracing::error!("{}", err);
            state.metrics.rejected_plan_total.inc();
            ExplainError::InvalidRequest(err.to_string())
        })
    }
    .instrument(info_span!("Plan query"))
    .await?;

    // Execute an explain query.
    let (query, plan) = query_engine_execution::query::explain(
        &state.pool,
        &state.metrics,
        &compiled.execution_plan,
        configuration.query_timeout,
    )
    .instrument(info_span!("Explain query"))
    .await?;

    // assuming explain succeeded, increment counter
    state.metrics.explain_total.inc();

    let details =
        BTreeMap::from_iter([("SQL Query".into(), query), ("Execution Plan".into(), plan)]);

    Ok(ExplainResponse { details })
}
