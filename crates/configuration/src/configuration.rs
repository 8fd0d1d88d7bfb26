//! Runtime configuration for the planner.

use std::time::Duration;

use query_engine_metadata::metadata;

use crate::values::PoolSettings;

/// The 'Configuration' type collects all the information necessary to serve queries at runtime.
///
/// Values of this type are produced from a 'ParsedConfiguration' using
/// 'make_runtime_configuration': secrets are resolved and the contract has been checked.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub contract: metadata::Contract,
    pub pool_settings: PoolSettings,
    pub connection_uri: String,
    /// Server-side statement timeout applied to every query.
    pub query_timeout: Duration,
}
