//! Engine configuration.
//!
//! Decoded by the facade from the host scheduler's plugin arguments and
//! validated before the engine is built. Validation failures abort
//! construction; a partially-configured engine is never returned.

use serde::{Deserialize, Serialize};
use topomatch_core::{ResourceName, ResourceWeights};

use crate::error::ConfigError;

/// The scoring strategy, fixed for the engine's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// Fewest NUMA zones consumed, policy-dispatched by scope.
    LeastNumaNodes,
    /// Weighted per-resource bin-packing fit.
    MostAllocated,
    /// Weighted per-resource spreading fit.
    #[default]
    LeastAllocated,
}

impl ScoringStrategy {
    /// Resolve a strategy from its string name. Also the deserialization
    /// path, so unknown names fail decoding as an unsupported strategy.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "least_numa_nodes" => Ok(ScoringStrategy::LeastNumaNodes),
            "most_allocated" => Ok(ScoringStrategy::MostAllocated),
            "least_allocated" => Ok(ScoringStrategy::LeastAllocated),
            other => Err(ConfigError::UnsupportedStrategy(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for ScoringStrategy {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        ScoringStrategy::from_name(&name).map_err(serde::de::Error::custom)
    }
}

/// One resource's weight in the scoring configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceWeightSpec {
    pub name: ResourceName,
    pub weight: i64,
}

/// Scoring configuration for the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub strategy: ScoringStrategy,
    /// Weights consulted by the weighted strategies. When none are given,
    /// cpu and memory default to weight 1.
    #[serde(default)]
    pub resources: Vec<ResourceWeightSpec>,
}

impl EngineConfig {
    /// Validate and collect the weight map.
    pub fn weights(&self) -> Result<ResourceWeights, ConfigError> {
        let mut weights = ResourceWeights::new();
        for spec in &self.resources {
            if spec.weight < 0 {
                return Err(ConfigError::InvalidWeight {
                    resource: spec.name.clone(),
                    weight: spec.weight,
                });
            }
            weights.insert(spec.name.clone(), spec.weight);
        }
        if weights.is_empty() {
            weights.insert("cpu", 1);
            weights.insert("memory", 1);
        }
        Ok(weights)
    }
}
