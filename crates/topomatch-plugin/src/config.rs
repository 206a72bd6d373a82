//! Plugin configuration decoding.
//!
//! The host scheduler hands the plugin its arguments as an opaque
//! document; both TOML and JSON forms are accepted. Decoding failures
//! and semantic validation failures abort construction.

use serde::{Deserialize, Serialize};
use topomatch_engine::EngineConfig;

use crate::error::{PluginError, PluginResult};

/// Arguments for the topology-match plugin.
///
/// ```toml
/// [scoring]
/// strategy = "most_allocated"
///
/// [[scoring.resources]]
/// name = "cpu"
/// weight = 3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyMatchConfig {
    #[serde(default)]
    pub scoring: EngineConfig,
}

impl TopologyMatchConfig {
    pub fn from_toml(input: &str) -> PluginResult<Self> {
        toml::from_str(input).map_err(|e| PluginError::Decode(e.to_string()))
    }

    pub fn from_json(input: &str) -> PluginResult<Self> {
        serde_json::from_str(input).map_err(|e| PluginError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topomatch_engine::ScoringStrategy;

    #[test]
    fn decodes_toml_arguments() {
        let config = TopologyMatchConfig::from_toml(
            r#"
            [scoring]
            strategy = "least_numa_nodes"

            [[scoring.resources]]
            name = "cpu"
            weight = 3

            [[scoring.resources]]
            name = "memory"
            weight = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.scoring.strategy, ScoringStrategy::LeastNumaNodes);
        assert_eq!(config.scoring.resources.len(), 2);
    }

    #[test]
    fn decodes_json_arguments() {
        let config = TopologyMatchConfig::from_json(
            r#"{"scoring": {"strategy": "most_allocated"}}"#,
        )
        .unwrap();
        assert_eq!(config.scoring.strategy, ScoringStrategy::MostAllocated);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = TopologyMatchConfig::from_toml("").unwrap();
        assert_eq!(config.scoring.strategy, ScoringStrategy::LeastAllocated);
        assert!(config.scoring.resources.is_empty());
    }

    #[test]
    fn unknown_strategy_fails_to_decode() {
        let result = TopologyMatchConfig::from_toml(
            r#"
            [scoring]
            strategy = "balanced_allocation"
            "#,
        );
        assert!(matches!(result, Err(PluginError::Decode(_))));
    }
}
