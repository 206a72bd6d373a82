//! Domain types for topology-aware placement.
//!
//! A machine exposes an ordered list of NUMA [`Zone`]s, each owning a
//! pool of available resources. A [`Workload`] carries per-container
//! resource requests. Snapshots and workloads are serializable so the
//! host scheduler can hand them across process boundaries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::policy::AlignmentPolicy;
use crate::quantity::Quantity;

/// Resource kind namestring ("cpu", "memory", vendor device kinds).
pub type ResourceName = String;

/// Unique identifier for a machine in the cluster.
pub type MachineId = String;

/// NUMA zone id; equals the zone's position in its [`ZoneList`] by convention.
pub type ZoneId = usize;

/// Kind → quantity mapping. BTreeMap keeps iteration deterministic.
pub type ResourceList = BTreeMap<ResourceName, Quantity>;

/// One NUMA zone's available resource pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub resources: ResourceList,
}

/// Ordered zones on one machine.
///
/// Exclusively owned by a single filter/score evaluation: the subtraction
/// engine mutates it destructively, so concurrent evaluations must each
/// work on their own copy.
pub type ZoneList = Vec<Zone>;

/// A single container's resource requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub requests: ResourceList,
}

/// A workload (pod) being placed: named containers with requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub name: String,
    pub containers: Vec<Container>,
}

impl Workload {
    /// Summed requests across all containers — the pod-scope request.
    pub fn total_requests(&self) -> ResourceList {
        let mut total = ResourceList::new();
        for container in &self.containers {
            for (kind, quantity) in &container.requests {
                let entry = total.entry(kind.clone()).or_insert_with(Quantity::zero);
                *entry = *entry + *quantity;
            }
        }
        total
    }
}

/// Machine-level metadata used to short-circuit before zone accounting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineContext {
    /// Node-level allocatable totals (across all zones).
    pub allocatable: ResourceList,
    /// Machine is administratively excluded from placement.
    pub unschedulable: bool,
}

/// A machine's topology as seen at the start of one evaluation:
/// declared policy plus per-zone inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub machine: MachineId,
    pub policy: AlignmentPolicy,
    pub zones: ZoneList,
}

/// Resource kind → integer weight for the weighted scoring strategy.
///
/// Kinds absent from the map are zero-weighted: ignored by scoring but
/// still accounted for by filtering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceWeights(BTreeMap<ResourceName, i64>);

impl ResourceWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: impl Into<ResourceName>, weight: i64) {
        self.0.insert(kind.into(), weight);
    }

    pub fn weight_of(&self, kind: &str) -> i64 {
        self.0.get(kind).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceName, i64)> {
        self.0.iter().map(|(k, w)| (k, *w))
    }
}
