//! Convert a parsed configuration into the runtime configuration.

use std::time::Duration;

use crate::configuration::Configuration;
use crate::environment::Environment;
use crate::error::MakeRuntimeConfigurationError;
use crate::values::{ConnectionUri, Secret};
use crate::version1::{ParsedConfiguration, MAX_QUERY_TIMEOUT_MS};

/// Resolve secrets from the environment and check the contract.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
    environment: impl Environment,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    let connection_uri = match parsed_config.connection_uri {
        ConnectionUri(Secret::Plain(uri)) => Ok(uri),
        ConnectionUri(Secret::FromEnvironment { variable }) => {
            tracing::debug!(variable = %variable, "reading connection uri from the environment");
            environment.read(&variable).map_err(|error| {
                MakeRuntimeConfigurationError::MissingEnvironmentVariable {
                    attribute: "connectionUri".into(),
                    error,
                }
            })
        }
    }?;

    parsed_config.contract.check()?;
    let query_timeout = bounded_query_timeout(parsed_config.query_timeout_ms)?;

    Ok(Configuration {
        contract: parsed_config.contract,
        pool_settings: parsed_config.pool_settings,
        connection_uri,
        query_timeout,
    })
}

/// Postgres reads a `statement_timeout` of 0 as no timeout and refuses anything above
/// `i32::MAX` milliseconds.
fn bounded_query_timeout(
    milliseconds: u64,
) -> Result<Duration, MakeRuntimeConfigurationError> {
    if (1..=MAX_QUERY_TIMEOUT_MS).contains(&milliseconds) {
        Ok(Duration::from_millis(milliseconds))
    } else {
        Err(MakeRuntimeConfigurationError::InvalidQueryTimeout {
            value: milliseconds,
            max: MAX_QUERY_TIMEOUT_MS,
        })
    }
}
