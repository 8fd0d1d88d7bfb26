//! Answer a planner response: chat messages pass through, plans are validated, translated and
//! run against the database.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info_span, Instrument};

use query_engine_execution::query::QueryResult;
use query_engine_sql::sql;
use query_engine_translation::translation;
use query_engine_translation::translation::helpers::Catalog;
use query_engine_translation::translation::plan::{PlannerResponse, RawPlan};
use query_engine_translation::translation::validation::ValidatedPlan;
use storefront_planner_configuration::Configuration;

use super::state;

/// What the caller gets back for one planner response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Answer {
    /// The planner answered without a database query.
    Chat { message: String },
    /// The plan could not be matched to the contract; the caller should rephrase.
    Clarification { message: String },
    /// The plan ran against the database.
    Data {
        plan: ValidatedPlan,
        sql: sql::string::SQL,
        #[serde(flatten)]
        result: QueryResult,
    },
}

/// Query errors that are failures rather than clarifications.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("failed to execute query: {0}")]
    Execution(#[from] query_engine_execution::error::Error),
}

/// A compiled plan: the plan as validated and the statement it translates to.
#[derive(Debug, Clone)]
pub struct CompiledPlan {
    pub plan: ValidatedPlan,
    pub execution_plan: sql::execution_plan::ExecutionPlan,
}

/// Validate and translate a raw plan. Does not touch the database.
pub fn compile(
    catalog: &Catalog,
    raw_plan: &RawPlan,
) -> Result<CompiledPlan, translation::error::Error> {
    let plan = translation::validation::validate(catalog, raw_plan)?;
    let execution_plan = translation::query::translate(catalog, &plan)?;
    Ok(CompiledPlan {
        plan,
        execution_plan,
    })
}

/// Compile a plan given as JSON.
pub fn compile_json(
    catalog: &Catalog,
    plan: Value,
) -> Result<CompiledPlan, translation::error::Error> {
    let raw_plan = RawPlan::try_from(plan)?;
    compile(catalog, &raw_plan)
}

/// Answer a planner response.
pub async fn query(
    configuration: &Configuration,
    catalog: &Catalog,
    state: &state::State,
    response: PlannerResponse,
) -> Result<Answer, QueryError> {
    let raw_plan = match response {
        PlannerResponse::Message(message) => return Ok(Answer::Chat { message }),
        PlannerResponse::Unclear => {
            return Ok(Answer::Clarification {
                message: clarification_message(&catalog.allowed_resources()),
            })
        }
        PlannerResponse::Query(raw_plan) => raw_plan,
    };

    // Compile the plan.
    let compiled = async {
        compile(catalog, &raw_plan).map_err(|err| {
            tracing::warn!("{}", err);
            state.metrics.rejected_plan_total.inc();
            err
        })
    }
    .instrument(info_span!("Plan query"))
    .await;

    let compiled = match compiled {
        Ok(compiled) => compiled,
        Err(err) if err.needs_clarification() => {
            return Ok(Answer::Clarification {
                message: clarification_message(&catalog.allowed_resources()),
            })
        }
        Err(err) => return Err(QueryError::InvalidRequest(err.to_string())),
    };

    // Execute the query.
    let result = query_engine_execution::query::execute(
        &state.pool,
        &state.metrics,
        &compiled.execution_plan,
        configuration.query_timeout,
    )
    .instrument(info_span!("Execute query"))
    .await?;

    // assuming query succeeded, increment counter
    state.metrics.query_total.inc();

    Ok(Answer::Data {
        plan: compiled.plan,
        sql: compiled.execution_plan.query_sql(),
        result,
    })
}

/// Ask the caller to rephrase, offering the resources that can be queried.
pub fn clarification_message(allowed: &[String]) -> String {
    match allowed {
        [] => "The question is unclear.".to_string(),
        [only] => format!("The question is unclear. Would you like to look at {only}?"),
        [init @ .., last] => format!(
            "The question is unclear. Would you like to look at {} or {last}?",
            init.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    #[test]
    fn clarification_lists_every_resource() {
        assert_eq!(
            clarification_message(&names(&["Product", "Category", "Coupon", "FeedbackStat"])),
            "The question is unclear. Would you like to look at Product, Category, Coupon or FeedbackStat?"
        );
    }

    #[test]
    fn clarification_with_few_resources() {
        assert_eq!(clarification_message(&[]), "The question is unclear.");
        assert_eq!(
            clarification_message(&names(&["Coupon"])),
            "The question is unclear. Would you like to look at Coupon?"
        );
        assert_eq!(
            clarification_message(&names(&["Product", "Coupon"])),
            "The question is unclear. Would you like to look at Product or Coupon?"
        );
    }
}
