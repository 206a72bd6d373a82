//! The `TopologyMatch` plugin facade.
//!
//! Wires the placement engine into the host scheduler's
//! filter/score/reserve/event contract. Construction validates the
//! configuration and the topology data source up front; a
//! partially-initialized plugin is never returned.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};
use topomatch_core::{MachineContext, MachineId, Quantity, ResourceList, Workload};
use topomatch_engine::{FilterDecision, TopologyMatchEngine};

use crate::config::TopologyMatchConfig;
use crate::error::{PluginError, PluginResult};
use crate::provider::TopologyProvider;

/// Name under which the plugin registers with the host scheduler.
pub const PLUGIN_NAME: &str = "topology-match";

/// Cluster object kinds whose changes can affect placement decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResource {
    Workload,
    Machine,
    Topology,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    Add,
    Update,
    Delete,
}

/// An event interest declared to the host scheduler: changes matching it
/// may make a previously-rejected workload placeable again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEvent {
    pub resource: EventResource,
    pub actions: Vec<EventAction>,
}

/// A booked (not yet bound) resource claim on one machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub workload: String,
    pub requests: ResourceList,
}

/// Scheduler plugin deciding topology-aware admissibility and alignment.
pub struct TopologyMatch {
    engine: TopologyMatchEngine,
    provider: Arc<dyn TopologyProvider>,
    reservations: Mutex<HashMap<MachineId, Vec<Reservation>>>,
}

impl TopologyMatch {
    /// Build the plugin from decoded arguments and a topology source.
    pub fn new(
        config: TopologyMatchConfig,
        provider: Arc<dyn TopologyProvider>,
    ) -> PluginResult<Self> {
        provider.ready()?;
        let engine = TopologyMatchEngine::new(&config.scoring)?;
        info!(
            plugin = PLUGIN_NAME,
            strategy = ?engine.strategy(),
            "constructed topology match plugin"
        );
        Ok(Self {
            engine,
            provider,
            reservations: Mutex::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    /// Admit or reject `machine` for `workload` under the machine's
    /// declared policy. Each call evaluates a fresh snapshot clone.
    pub fn filter(
        &self,
        workload: &Workload,
        machine: &str,
        ctx: &MachineContext,
    ) -> PluginResult<FilterDecision> {
        let mut snapshot = self
            .provider
            .snapshot(machine)?
            .ok_or_else(|| PluginError::TopologyUnavailable(machine.to_string()))?;
        let decision = self
            .engine
            .filter(workload, snapshot.policy, &mut snapshot.zones, ctx)?;
        if let FilterDecision::Reject(reason) = &decision {
            debug!(workload = %workload.name, machine, %reason, "machine filtered out");
        }
        Ok(decision)
    }

    /// Alignment score for an admitted machine, `0..=MAX_NODE_SCORE`.
    pub fn score(&self, workload: &Workload, machine: &str) -> PluginResult<i64> {
        let mut snapshot = self
            .provider
            .snapshot(machine)?
            .ok_or_else(|| PluginError::TopologyUnavailable(machine.to_string()))?;
        Ok(self
            .engine
            .score(workload, snapshot.policy, &mut snapshot.zones)?)
    }

    /// Book the workload's total requests against `machine`. Bookkeeping
    /// only — the ledger never feeds back into filter/score arithmetic.
    pub fn reserve(&self, workload: &Workload, machine: &str) {
        let reservation = Reservation {
            workload: workload.name.clone(),
            requests: workload.total_requests(),
        };
        debug!(workload = %workload.name, machine, "reserved resources");
        self.reservations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(machine.to_string())
            .or_default()
            .push(reservation);
    }

    /// Release a prior reservation, if one exists.
    pub fn unreserve(&self, workload_name: &str, machine: &str) {
        let mut reservations = self
            .reservations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(booked) = reservations.get_mut(machine) {
            let before = booked.len();
            booked.retain(|r| r.workload != workload_name);
            if booked.len() == before {
                warn!(workload = workload_name, machine, "no reservation to release");
            }
            if booked.is_empty() {
                reservations.remove(machine);
            }
        }
    }

    /// Total booked quantities per resource kind on `machine`.
    pub fn reserved(&self, machine: &str) -> ResourceList {
        let reservations = self
            .reservations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut total = ResourceList::new();
        for reservation in reservations.get(machine).into_iter().flatten() {
            for (kind, quantity) in &reservation.requests {
                let entry = total.entry(kind.clone()).or_insert_with(Quantity::zero);
                *entry = *entry + *quantity;
            }
        }
        total
    }

    /// Event interests: changes that may free capacity or alter topology.
    pub fn events_to_register() -> Vec<ClusterEvent> {
        vec![
            ClusterEvent {
                resource: EventResource::Workload,
                actions: vec![EventAction::Delete],
            },
            ClusterEvent {
                resource: EventResource::Machine,
                actions: vec![EventAction::Add, EventAction::Update],
            },
            ClusterEvent {
                resource: EventResource::Topology,
                actions: vec![EventAction::Add, EventAction::Update],
            },
        ]
    }

    /// React to a cluster event for `machine` by dropping its cached
    /// snapshot so the next evaluation sees fresh topology.
    pub fn handle_event(&self, resource: EventResource, action: EventAction, machine: &str) {
        let registered = Self::events_to_register()
            .iter()
            .any(|e| e.resource == resource && e.actions.contains(&action));
        if registered {
            debug!(?resource, ?action, machine, "invalidating cached topology");
            self.provider.invalidate(machine);
        }
    }
}
