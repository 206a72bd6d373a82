//! The zone subtraction engine.
//!
//! Simulates consuming a resource request from a machine's NUMA zones in
//! a caller-chosen order, mutating both the remaining request and the
//! zone ledger in place. The caller owns the `ZoneList` for the duration
//! of the evaluation and inspects the residual state afterwards.

use topomatch_core::{Quantity, ResourceList, ZoneId, ZoneList};

/// Subtract `request` from `zones`, walking zones in `order`.
///
/// For each requested resource kind: zones are scanned in order until the
/// remaining quantity reaches zero; zones without an entry for the kind
/// are skipped; a zone never goes negative — when the request exceeds the
/// zone's availability the zone is drained to zero and the remainder
/// carries to the next zone in `order`.
///
/// A kind absent from every scanned zone is never reduced; callers that
/// must account for the kind treat the untouched remainder as
/// unsatisfiable, not as success.
pub fn subtract_from_zones(request: &mut ResourceList, zones: &mut ZoneList, order: &[ZoneId]) {
    for (kind, remaining) in request.iter_mut() {
        for &zone_id in order {
            if remaining.is_zero() {
                break;
            }
            let Some(zone) = zones.get_mut(zone_id) else {
                continue;
            };
            let Some(available) = zone.resources.get_mut(kind) else {
                continue;
            };
            match (*remaining).cmp(available) {
                std::cmp::Ordering::Equal => {
                    *remaining = Quantity::zero();
                    *available = Quantity::zero();
                }
                std::cmp::Ordering::Greater => {
                    *remaining = remaining.saturating_sub(*available);
                    *available = Quantity::zero();
                }
                std::cmp::Ordering::Less => {
                    *available = available.saturating_sub(*remaining);
                    *remaining = Quantity::zero();
                }
            }
        }
    }
}

/// True when every remaining quantity in `request` is zero.
pub fn fully_satisfied(request: &ResourceList) -> bool {
    request.values().all(|q| q.is_zero())
}
