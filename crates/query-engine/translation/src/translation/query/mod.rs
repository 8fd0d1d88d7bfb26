//! Translate a validated plan to an execution plan (SQL) to be run against the database.

pub mod fields;
pub mod filtering;
pub mod relationships;
pub mod sorting;
pub mod values;

use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::helpers::{AliasMap, Catalog, Env};
use crate::translation::validation::ValidatedPlan;

/// Translate a validated plan to an execution plan. The same plan always yields the same
/// statement and parameters.
pub fn translate(
    catalog: &Catalog,
    plan: &ValidatedPlan,
) -> Result<sql::execution_plan::ExecutionPlan, Error> {
    let base = catalog.lookup_resource(plan.resource())?;

    let mut env = Env {
        catalog,
        plan,
        base,
        aliases: AliasMap::new(plan.resource()),
    };

    let from = sql::ast::From {
        table: sql::ast::TableName(base.view.clone()),
        alias: env.aliases.base_alias(),
    };

    let joins = relationships::translate_joins(&mut env)?;

    let mut select = sql::helpers::simple_select(fields::translate_fields(&env), from);
    select.joins = joins;
    select.where_ = sql::ast::Where(filtering::translate_filters(&env));
    select.order_by = sorting::translate_order_by(&env);
    select.limit = sql::ast::Limit {
        limit: Some(plan.limit()),
    };

    let exec_plan = sql::execution_plan::simple_exec_plan(plan.resource().to_string(), select);

    // log and return
    let query = exec_plan.query_sql();
    tracing::info!(
        resource = plan.resource(),
        generated_sql = query.sql(),
        params = ?query.params(),
        "translated plan"
    );
    Ok(exec_plan)
}
