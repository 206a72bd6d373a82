//! Filter decision functions, one per alignment policy.
//!
//! A filter inspects a workload against a machine's zone inventory and
//! produces an admit/reject decision. Rejection is an expected outcome
//! carrying a structured reason; it is never an `Err`.

use std::collections::HashMap;

use topomatch_core::{
    AlignmentPolicy, MachineContext, ResourceList, ResourceName, Workload, ZoneId, ZoneList,
};

use crate::subtract::subtract_from_zones;

/// Outcome of a filter evaluation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum FilterDecision {
    Admit,
    Reject(RejectReason),
}

impl FilterDecision {
    pub fn is_admit(&self) -> bool {
        matches!(self, FilterDecision::Admit)
    }
}

/// Why a machine was rejected for a workload.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// The machine is administratively excluded from placement.
    MachineUnschedulable,
    /// A requested resource kind cannot be satisfied from the machine's
    /// zones (or node-level allocatable).
    InsufficientCapacity { resource: ResourceName },
    /// Capacity exists in aggregate but not within the zone-count bound
    /// the policy imposes.
    CannotAlignToZones { policy: AlignmentPolicy },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MachineUnschedulable => write!(f, "machine is unschedulable"),
            RejectReason::InsufficientCapacity { resource } => {
                write!(f, "insufficient capacity for resource {resource:?}")
            }
            RejectReason::CannotAlignToZones { policy } => {
                write!(f, "cannot align request to NUMA zones under policy {policy}")
            }
        }
    }
}

/// A filter decision function.
pub type FilterFn = fn(&Workload, &mut ZoneList, &MachineContext) -> FilterDecision;

/// Policy → filter function dispatch table.
pub type FilterHandlers = HashMap<AlignmentPolicy, FilterFn>;

/// Build the filter table. Total over [`AlignmentPolicy::ALL`].
pub fn filter_handlers() -> FilterHandlers {
    use AlignmentPolicy::*;
    HashMap::from([
        (SingleNumaNodePod, single_numa_pod as FilterFn),
        (SingleNumaNodeContainer, single_numa_container as FilterFn),
        (BestEffortPod, admit_all as FilterFn),
        (BestEffortContainer, admit_all as FilterFn),
        (RestrictedPod, restricted_pod as FilterFn),
        (RestrictedContainer, restricted_container as FilterFn),
    ])
}

/// Node-level short-circuit applied before any policy dispatch:
/// unschedulable machines and requests exceeding machine allocatable
/// reject regardless of zone layout.
pub fn machine_short_circuit(workload: &Workload, ctx: &MachineContext) -> Option<RejectReason> {
    if ctx.unschedulable {
        return Some(RejectReason::MachineUnschedulable);
    }
    for (kind, requested) in workload.total_requests() {
        if let Some(allocatable) = ctx.allocatable.get(&kind) {
            if requested > *allocatable {
                return Some(RejectReason::InsufficientCapacity { resource: kind });
            }
        }
    }
    None
}

/// First zone whose inventory covers every non-zero requested kind.
fn zone_fitting(requests: &ResourceList, zones: &ZoneList) -> Option<ZoneId> {
    zones
        .iter()
        .position(|zone| {
            requests.iter().all(|(kind, requested)| {
                requested.is_zero()
                    || zone
                        .resources
                        .get(kind)
                        .is_some_and(|available| available >= requested)
            })
        })
        .map(|position| zones[position].id)
}

/// A requested kind that no zone carries at all. Such a request can never
/// be accounted to topology-aware zones, so it is a capacity rejection
/// rather than an alignment one.
fn kind_missing_everywhere(requests: &ResourceList, zones: &ZoneList) -> Option<ResourceName> {
    requests
        .iter()
        .find(|&(kind, requested)| {
            !requested.is_zero() && zones.iter().all(|zone| !zone.resources.contains_key(kind))
        })
        .map(|(kind, _)| kind.clone())
}

fn single_numa_reject(requests: &ResourceList, zones: &ZoneList, policy: AlignmentPolicy) -> FilterDecision {
    match kind_missing_everywhere(requests, zones) {
        Some(resource) => FilterDecision::Reject(RejectReason::InsufficientCapacity { resource }),
        None => FilterDecision::Reject(RejectReason::CannotAlignToZones { policy }),
    }
}

fn single_numa_pod(workload: &Workload, zones: &mut ZoneList, _ctx: &MachineContext) -> FilterDecision {
    let requests = workload.total_requests();
    match zone_fitting(&requests, zones) {
        Some(_) => FilterDecision::Admit,
        None => single_numa_reject(&requests, zones, AlignmentPolicy::SingleNumaNodePod),
    }
}

fn single_numa_container(
    workload: &Workload,
    zones: &mut ZoneList,
    _ctx: &MachineContext,
) -> FilterDecision {
    // Containers are admitted in order; each admitted container drains its
    // chosen zone before the next container is evaluated.
    for container in &workload.containers {
        match zone_fitting(&container.requests, zones) {
            Some(zone_id) => {
                let mut remaining = container.requests.clone();
                subtract_from_zones(&mut remaining, zones, &[zone_id]);
            }
            None => {
                return single_numa_reject(
                    &container.requests,
                    zones,
                    AlignmentPolicy::SingleNumaNodeContainer,
                );
            }
        }
    }
    FilterDecision::Admit
}

/// Subtract `requests` across all zones in ascending id order and report
/// the first kind left unsatisfied, if any.
fn satisfy_across_zones(requests: &ResourceList, zones: &mut ZoneList) -> Option<ResourceName> {
    let order: Vec<ZoneId> = zones.iter().map(|zone| zone.id).collect();
    let mut remaining = requests.clone();
    subtract_from_zones(&mut remaining, zones, &order);
    remaining
        .into_iter()
        .find(|(_, quantity)| !quantity.is_zero())
        .map(|(kind, _)| kind)
}

fn restricted_pod(workload: &Workload, zones: &mut ZoneList, _ctx: &MachineContext) -> FilterDecision {
    match satisfy_across_zones(&workload.total_requests(), zones) {
        Some(resource) => FilterDecision::Reject(RejectReason::InsufficientCapacity { resource }),
        None => FilterDecision::Admit,
    }
}

fn restricted_container(
    workload: &Workload,
    zones: &mut ZoneList,
    _ctx: &MachineContext,
) -> FilterDecision {
    for container in &workload.containers {
        if let Some(resource) = satisfy_across_zones(&container.requests, zones) {
            return FilterDecision::Reject(RejectReason::InsufficientCapacity { resource });
        }
    }
    FilterDecision::Admit
}

fn admit_all(_workload: &Workload, _zones: &mut ZoneList, _ctx: &MachineContext) -> FilterDecision {
    FilterDecision::Admit
}
