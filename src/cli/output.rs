//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::GatehouseError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &GatehouseError) -> String {
    match e {
        GatehouseError::ConfigError(msg) => format!("configuration: {}", msg),
        other => other.to_string(),
    }
}
