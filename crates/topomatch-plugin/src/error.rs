//! Plugin error types.

use thiserror::Error;
use topomatch_core::MachineId;
use topomatch_engine::{ConfigError, EngineError};

/// Result type alias for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors surfaced to the host scheduler.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("invalid plugin configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to decode plugin configuration: {0}")]
    Decode(String),

    #[error("no topology snapshot available for machine {0:?}")]
    TopologyUnavailable(MachineId),

    #[error("topology provider failed: {0}")]
    Provider(#[from] anyhow::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
