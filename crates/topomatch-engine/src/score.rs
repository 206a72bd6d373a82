//! Scoring strategies.
//!
//! Two families, selected once at engine construction:
//!
//! - **Least-zones**: how few NUMA zones the request can be packed into,
//!   found by exhaustive subset search in increasing size and normalized
//!   so fewer zones score higher.
//! - **Weighted-resource**: a per-resource fit function (most-allocated
//!   or least-allocated) combined as a weighted mean per zone; the
//!   machine scores its best zone (pod scope) or its worst container's
//!   best zone (container scope).
//!
//! Scores are bounded to `0..=MAX_NODE_SCORE`. Internal failures
//! (malformed zone data) are errors, never low scores.

use std::collections::HashMap;

use topomatch_core::{
    AlignmentPolicy, Quantity, ResourceList, ResourceWeights, Scope, Workload, Zone, ZoneId,
    ZoneList,
};

use crate::error::{EngineError, EngineResult};
use crate::subtract::{fully_satisfied, subtract_from_zones};

/// Upper bound of the score range handed back to the host scheduler.
pub const MAX_NODE_SCORE: i64 = 100;

/// A score function bound to one policy.
pub type ScoreFn = Box<dyn Fn(&Workload, &mut ZoneList) -> EngineResult<i64> + Send + Sync>;

/// Policy → score function dispatch table.
pub type ScoreHandlers = HashMap<AlignmentPolicy, ScoreFn>;

/// Per-resource fit quality in `0..=MAX_NODE_SCORE`.
pub type ResourceFit = fn(requested: Quantity, available: Quantity) -> i64;

/// Prefer zones the request fills up (bin-packing).
pub fn most_allocated_fit(requested: Quantity, available: Quantity) -> i64 {
    if available.is_zero() || requested > available {
        return 0;
    }
    ((requested.millis() * MAX_NODE_SCORE as i128) / available.millis()) as i64
}

/// Prefer zones the request leaves mostly unused (spreading).
pub fn least_allocated_fit(requested: Quantity, available: Quantity) -> i64 {
    if available.is_zero() || requested > available {
        return 0;
    }
    let free = available.millis() - requested.millis();
    ((free * MAX_NODE_SCORE as i128) / available.millis()) as i64
}

/// The least-zones sub-table: pod-scope policies use the pod scorer,
/// container-scope policies the container scorer. Total over all six.
pub fn least_numa_handlers() -> ScoreHandlers {
    let mut handlers = ScoreHandlers::new();
    for policy in AlignmentPolicy::ALL {
        let handler: ScoreFn = match policy.scope() {
            Scope::Pod => Box::new(least_numa_pod_score),
            Scope::Container => Box::new(least_numa_container_score),
        };
        handlers.insert(policy, handler);
    }
    handlers
}

/// The weighted-resource table: one scorer parameterized by the fit
/// function and the resource weight map, bound to all six policies.
pub fn weighted_handlers(fit: ResourceFit, weights: ResourceWeights) -> ScoreHandlers {
    let mut handlers = ScoreHandlers::new();
    for policy in AlignmentPolicy::ALL {
        let weights = weights.clone();
        let handler: ScoreFn = match policy.scope() {
            Scope::Pod => Box::new(move |workload, zones| {
                weighted_pod_score(workload, zones, &weights, fit)
            }),
            Scope::Container => Box::new(move |workload, zones| {
                weighted_container_score(workload, zones, &weights, fit)
            }),
        };
        handlers.insert(policy, handler);
    }
    handlers
}

// ── least-zones ────────────────────────────────────────────────────

fn least_numa_pod_score(workload: &Workload, zones: &mut ZoneList) -> EngineResult<i64> {
    if zones.is_empty() {
        return Err(EngineError::EmptyZoneList);
    }
    let requests = workload.total_requests();
    match min_zone_subset(&requests, zones) {
        Some(subset) => Ok(normalize_least_zones(subset.len(), zones.len())),
        None => Ok(0),
    }
}

fn least_numa_container_score(workload: &Workload, zones: &mut ZoneList) -> EngineResult<i64> {
    if zones.is_empty() {
        return Err(EngineError::EmptyZoneList);
    }
    let zone_count = zones.len();
    let mut scored_containers = 0usize;
    let mut total_needed = 0usize;

    for container in &workload.containers {
        if fully_satisfied(&container.requests) {
            continue;
        }
        let Some(subset) = min_zone_subset(&container.requests, zones) else {
            return Ok(0);
        };
        total_needed += subset.len();
        scored_containers += 1;
        // Drain the chosen zones so later containers see reduced capacity.
        let mut remaining = container.requests.clone();
        subtract_from_zones(&mut remaining, zones, &subset);
    }

    if scored_containers == 0 {
        return Ok(MAX_NODE_SCORE);
    }
    let worst = scored_containers * zone_count;
    let best = scored_containers;
    if worst == best {
        return Ok(MAX_NODE_SCORE);
    }
    Ok((MAX_NODE_SCORE * (worst - total_needed) as i64) / (worst - best) as i64)
}

fn normalize_least_zones(needed: usize, zone_count: usize) -> i64 {
    if needed == 0 || zone_count == 1 {
        return MAX_NODE_SCORE;
    }
    (MAX_NODE_SCORE * (zone_count - needed) as i64) / (zone_count - 1) as i64
}

/// Smallest zone subset whose combined inventory satisfies `requests`,
/// searched in increasing subset size. `None` when even the full zone
/// set cannot satisfy the request.
fn min_zone_subset(requests: &ResourceList, zones: &ZoneList) -> Option<Vec<ZoneId>> {
    if fully_satisfied(requests) {
        return Some(Vec::new());
    }
    let ids: Vec<ZoneId> = zones.iter().map(|zone| zone.id).collect();
    for size in 1..=ids.len() {
        let mut acc = Vec::with_capacity(size);
        if let Some(subset) = search_subsets(requests, zones, &ids, size, 0, &mut acc) {
            return Some(subset);
        }
    }
    None
}

fn search_subsets(
    requests: &ResourceList,
    zones: &ZoneList,
    ids: &[ZoneId],
    size: usize,
    start: usize,
    acc: &mut Vec<ZoneId>,
) -> Option<Vec<ZoneId>> {
    if acc.len() == size {
        return satisfiable_with(requests, zones, acc).then(|| acc.clone());
    }
    for i in start..ids.len() {
        acc.push(ids[i]);
        if let Some(found) = search_subsets(requests, zones, ids, size, i + 1, acc) {
            return Some(found);
        }
        acc.pop();
    }
    None
}

/// Trial subtraction against clones; the real ledger is untouched.
fn satisfiable_with(requests: &ResourceList, zones: &ZoneList, subset: &[ZoneId]) -> bool {
    let mut remaining = requests.clone();
    let mut trial = zones.clone();
    subtract_from_zones(&mut remaining, &mut trial, subset);
    fully_satisfied(&remaining)
}

// ── weighted-resource ──────────────────────────────────────────────

/// Weighted mean of per-kind fit scores for one zone, or `None` when no
/// requested kind carries weight (the zone contributes nothing).
fn weighted_zone_score(
    requests: &ResourceList,
    zone: &Zone,
    weights: &ResourceWeights,
    fit: ResourceFit,
) -> Option<i64> {
    let mut weighted_sum = 0i64;
    let mut weight_total = 0i64;
    for (kind, requested) in requests {
        if requested.is_zero() {
            continue;
        }
        let weight = weights.weight_of(kind);
        if weight == 0 {
            continue;
        }
        let available = zone.resources.get(kind).copied().unwrap_or_default();
        weighted_sum += weight * fit(*requested, available);
        weight_total += weight;
    }
    (weight_total > 0).then(|| weighted_sum / weight_total)
}

fn weighted_pod_score(
    workload: &Workload,
    zones: &mut ZoneList,
    weights: &ResourceWeights,
    fit: ResourceFit,
) -> EngineResult<i64> {
    if zones.is_empty() {
        return Err(EngineError::EmptyZoneList);
    }
    let requests = workload.total_requests();
    Ok(zones
        .iter()
        .filter_map(|zone| weighted_zone_score(&requests, zone, weights, fit))
        .max()
        .unwrap_or(0))
}

fn weighted_container_score(
    workload: &Workload,
    zones: &mut ZoneList,
    weights: &ResourceWeights,
    fit: ResourceFit,
) -> EngineResult<i64> {
    if zones.is_empty() {
        return Err(EngineError::EmptyZoneList);
    }
    // The machine is only as good as its worst-fitting container.
    let mut worst: Option<i64> = None;
    for container in &workload.containers {
        let best_zone = zones
            .iter()
            .filter_map(|zone| weighted_zone_score(&container.requests, zone, weights, fit))
            .max();
        if let Some(score) = best_zone {
            worst = Some(worst.map_or(score, |w| w.min(score)));
        }
    }
    Ok(worst.unwrap_or(0))
}
