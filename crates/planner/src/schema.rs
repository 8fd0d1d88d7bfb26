//! The schema description handed to the upstream planner.

use query_engine_metadata::metadata;
use storefront_planner_configuration::Configuration;

/// Describe every resource the configuration allows, with the instructions for writing a plan.
pub fn get_schema(configuration: &Configuration) -> String {
    let description = metadata::describe(&configuration.contract);
    tracing::debug!(
        resources = configuration.contract.resources.0.len(),
        "described contract"
    );
    description
}
