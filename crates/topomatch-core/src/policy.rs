//! NUMA alignment policies.
//!
//! A machine declares one of six policies, the cross product of
//! {single-numa-node, best-effort, restricted} × {pod, container}.
//! The flat enum is the dispatch key for the engine's filter and score
//! tables; [`AlignmentPolicy::ALL`] lets construction verify that every
//! variant has a handler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How strictly resources must align to NUMA zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentMode {
    /// The whole request must fit inside one zone.
    SingleNumaNode,
    /// Alignment is preferred but never grounds for rejection.
    BestEffort,
    /// The request must be satisfiable from the zone set.
    Restricted,
}

/// Whether alignment is evaluated for the pod as a whole or per container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    Pod,
    Container,
}

/// The six policy/scope combinations a machine can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentPolicy {
    SingleNumaNodePod,
    SingleNumaNodeContainer,
    BestEffortPod,
    BestEffortContainer,
    RestrictedPod,
    RestrictedContainer,
}

impl AlignmentPolicy {
    /// Every policy variant, for totality checks over dispatch tables.
    pub const ALL: [AlignmentPolicy; 6] = [
        AlignmentPolicy::SingleNumaNodePod,
        AlignmentPolicy::SingleNumaNodeContainer,
        AlignmentPolicy::BestEffortPod,
        AlignmentPolicy::BestEffortContainer,
        AlignmentPolicy::RestrictedPod,
        AlignmentPolicy::RestrictedContainer,
    ];

    pub fn mode(self) -> AlignmentMode {
        match self {
            AlignmentPolicy::SingleNumaNodePod | AlignmentPolicy::SingleNumaNodeContainer => {
                AlignmentMode::SingleNumaNode
            }
            AlignmentPolicy::BestEffortPod | AlignmentPolicy::BestEffortContainer => {
                AlignmentMode::BestEffort
            }
            AlignmentPolicy::RestrictedPod | AlignmentPolicy::RestrictedContainer => {
                AlignmentMode::Restricted
            }
        }
    }

    pub fn scope(self) -> Scope {
        match self {
            AlignmentPolicy::SingleNumaNodePod
            | AlignmentPolicy::BestEffortPod
            | AlignmentPolicy::RestrictedPod => Scope::Pod,
            AlignmentPolicy::SingleNumaNodeContainer
            | AlignmentPolicy::BestEffortContainer
            | AlignmentPolicy::RestrictedContainer => Scope::Container,
        }
    }
}

impl fmt::Display for AlignmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlignmentPolicy::SingleNumaNodePod => "single-numa-node-pod",
            AlignmentPolicy::SingleNumaNodeContainer => "single-numa-node-container",
            AlignmentPolicy::BestEffortPod => "best-effort-pod",
            AlignmentPolicy::BestEffortContainer => "best-effort-container",
            AlignmentPolicy::RestrictedPod => "restricted-pod",
            AlignmentPolicy::RestrictedContainer => "restricted-container",
        };
        f.write_str(s)
    }
}
