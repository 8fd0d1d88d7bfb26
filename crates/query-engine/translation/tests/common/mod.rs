use std::fs;
use std::path::PathBuf;

use query_engine_sql::sql;
use query_engine_translation::translation::helpers::Catalog;
use query_engine_translation::translation::plan::RawPlan;
use query_engine_translation::translation::{query, validation};

/// The storefront catalog every test plans against.
pub fn catalog() -> Catalog {
    Catalog::new(storefront_planner_configuration::storefront::contract())
}

/// Validate and compile a plan given as JSON.
pub fn compile(catalog: &Catalog, plan: serde_json::Value) -> anyhow::Result<sql::string::SQL> {
    let raw = RawPlan::try_from(plan)?;
    let validated = validation::validate(catalog, &raw)?;
    let exec_plan = query::translate(catalog, &validated)?;
    Ok(exec_plan.query_sql())
}

/// Compile the plan of a goldenfile directory, rendering the statement and its parameters.
pub fn test_translation(testname: &str) -> anyhow::Result<String> {
    let _ = env_logger::builder().is_test(true).try_init();

    let directory = PathBuf::from("tests/goldenfiles").join(testname);
    let plan = serde_json::from_str(&fs::read_to_string(directory.join("plan.json"))?)?;

    let query = compile(&catalog(), plan)?;
    Ok(format!(
        "{}\n\n{}",
        query.sql(),
        serde_json::to_string(query.params())?
    ))
}
