//! Topology snapshot providers.
//!
//! The engine never fetches topology itself; a [`TopologyProvider`] is
//! the seam to whatever cache or informer the deployment uses. The
//! in-memory [`CachedTopology`] covers tests and single-process hosts.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use topomatch_core::{MachineId, TopologySnapshot};

/// Source of per-machine topology snapshots.
pub trait TopologyProvider: Send + Sync {
    /// The latest snapshot for `machine`, or `None` when the machine has
    /// no topology object. Errors are transient provider failures, not
    /// "machine unknown".
    fn snapshot(&self, machine: &str) -> anyhow::Result<Option<TopologySnapshot>>;

    /// Drop any cached state for `machine`; the next `snapshot` call
    /// observes fresh data.
    fn invalidate(&self, machine: &str);

    /// Whether the provider can serve snapshots at all. Checked once at
    /// plugin construction so an unreachable data source fails fast.
    fn ready(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// In-memory snapshot cache keyed by machine.
#[derive(Debug, Default)]
pub struct CachedTopology {
    snapshots: RwLock<HashMap<MachineId, TopologySnapshot>>,
}

impl CachedTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the snapshot for its machine.
    pub fn insert(&self, snapshot: TopologySnapshot) {
        self.snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(snapshot.machine.clone(), snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TopologyProvider for CachedTopology {
    fn snapshot(&self, machine: &str) -> anyhow::Result<Option<TopologySnapshot>> {
        Ok(self
            .snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(machine)
            .cloned())
    }

    fn invalidate(&self, machine: &str) {
        self.snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(machine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topomatch_core::AlignmentPolicy;

    fn snapshot(machine: &str) -> TopologySnapshot {
        TopologySnapshot {
            machine: machine.to_string(),
            policy: AlignmentPolicy::BestEffortPod,
            zones: vec![],
        }
    }

    #[test]
    fn insert_then_snapshot_round_trips() {
        let cache = CachedTopology::new();
        cache.insert(snapshot("node-1"));

        let got = cache.snapshot("node-1").unwrap();
        assert_eq!(got.map(|s| s.machine), Some("node-1".to_string()));
        assert!(cache.snapshot("node-2").unwrap().is_none());
    }

    #[test]
    fn invalidate_removes_the_machine() {
        let cache = CachedTopology::new();
        cache.insert(snapshot("node-1"));
        cache.invalidate("node-1");
        assert!(cache.snapshot("node-1").unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn snapshots_are_cloned_out_not_shared() {
        let cache = CachedTopology::new();
        cache.insert(snapshot("node-1"));

        let mut first = cache.snapshot("node-1").unwrap().unwrap();
        first.machine.push_str("-mutated");

        let second = cache.snapshot("node-1").unwrap().unwrap();
        assert_eq!(second.machine, "node-1");
    }
}
