//! The policy-dispatched placement engine.
//!
//! Built once from an [`EngineConfig`]; both dispatch tables are
//! constructed and verified total over the six policies before any
//! request is served. Evaluation entry points take a mutable zone list
//! the caller owns exclusively for that call.

use tracing::debug;
use topomatch_core::{AlignmentPolicy, MachineContext, Workload, ZoneList};

use crate::config::{EngineConfig, ScoringStrategy};
use crate::error::{ConfigError, EngineError, EngineResult};
use crate::filter::{self, FilterDecision, FilterHandlers};
use crate::score::{self, ScoreHandlers};

/// Decides admissibility and alignment quality for one machine at a time.
pub struct TopologyMatchEngine {
    filter_handlers: FilterHandlers,
    score_handlers: ScoreHandlers,
    strategy: ScoringStrategy,
}

impl TopologyMatchEngine {
    /// Build the engine, resolving the scoring strategy and verifying
    /// that every policy has a filter and a score entry.
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        let weights = config.weights()?;
        let score_handlers = match config.strategy {
            ScoringStrategy::LeastNumaNodes => score::least_numa_handlers(),
            ScoringStrategy::MostAllocated => {
                score::weighted_handlers(score::most_allocated_fit, weights)
            }
            ScoringStrategy::LeastAllocated => {
                score::weighted_handlers(score::least_allocated_fit, weights)
            }
        };

        let engine = Self {
            filter_handlers: filter::filter_handlers(),
            score_handlers,
            strategy: config.strategy,
        };
        engine.verify_dispatch_totality()?;
        Ok(engine)
    }

    fn verify_dispatch_totality(&self) -> Result<(), ConfigError> {
        for policy in AlignmentPolicy::ALL {
            if !self.filter_handlers.contains_key(&policy)
                || !self.score_handlers.contains_key(&policy)
            {
                return Err(ConfigError::MissingPolicyHandler(policy));
            }
        }
        Ok(())
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    // Handlers index the zone list by id, so a snapshot whose ids are
    // permuted or duplicated relative to position must fail here rather
    // than drain the wrong zone.
    fn validate_zones(zones: &ZoneList) -> EngineResult<()> {
        if zones.is_empty() {
            return Err(EngineError::EmptyZoneList);
        }
        for (position, zone) in zones.iter().enumerate() {
            if zone.id != position {
                return Err(EngineError::ZoneIdMismatch(zone.id, position));
            }
        }
        Ok(())
    }

    /// Admit or reject `workload` on a machine declaring `policy`.
    ///
    /// `zones` is consumed destructively; callers evaluating several
    /// policies or machines pass a fresh copy each time.
    pub fn filter(
        &self,
        workload: &Workload,
        policy: AlignmentPolicy,
        zones: &mut ZoneList,
        ctx: &MachineContext,
    ) -> EngineResult<FilterDecision> {
        if let Some(reason) = filter::machine_short_circuit(workload, ctx) {
            debug!(workload = %workload.name, %reason, "rejected before zone accounting");
            return Ok(FilterDecision::Reject(reason));
        }
        Self::validate_zones(zones)?;
        let handler = self
            .filter_handlers
            .get(&policy)
            .ok_or(EngineError::UnhandledPolicy(policy))?;

        let decision = handler(workload, zones, ctx);
        match &decision {
            FilterDecision::Admit => {
                debug!(workload = %workload.name, %policy, "admitted");
            }
            FilterDecision::Reject(reason) => {
                debug!(workload = %workload.name, %policy, %reason, "rejected");
            }
        }
        Ok(decision)
    }

    /// Alignment quality of `workload` on a machine declaring `policy`,
    /// in `0..=MAX_NODE_SCORE`. Same ownership contract as [`Self::filter`].
    pub fn score(
        &self,
        workload: &Workload,
        policy: AlignmentPolicy,
        zones: &mut ZoneList,
    ) -> EngineResult<i64> {
        Self::validate_zones(zones)?;
        let handler = self
            .score_handlers
            .get(&policy)
            .ok_or(EngineError::UnhandledPolicy(policy))?;

        let value = handler(workload, zones)?;
        debug!(workload = %workload.name, %policy, score = value, "scored machine");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceWeightSpec;
    use crate::filter::RejectReason;
    use crate::score::MAX_NODE_SCORE;
    use topomatch_core::{Container, ResourceList, Zone};

    fn resources(entries: &[(&str, &str)]) -> ResourceList {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.parse().unwrap()))
            .collect()
    }

    fn make_zones(specs: &[&[(&str, &str)]]) -> ZoneList {
        specs
            .iter()
            .enumerate()
            .map(|(id, entries)| Zone {
                id,
                resources: resources(entries),
            })
            .collect()
    }

    fn pod(requests: ResourceList) -> Workload {
        Workload {
            name: "pod".to_string(),
            containers: vec![Container {
                name: "main".to_string(),
                requests,
            }],
        }
    }

    fn engine(strategy: ScoringStrategy) -> TopologyMatchEngine {
        TopologyMatchEngine::new(&EngineConfig {
            strategy,
            resources: vec![],
        })
        .unwrap()
    }

    #[test]
    fn constructs_for_every_strategy() {
        for strategy in [
            ScoringStrategy::LeastNumaNodes,
            ScoringStrategy::MostAllocated,
            ScoringStrategy::LeastAllocated,
        ] {
            let engine = engine(strategy);
            assert_eq!(engine.strategy(), strategy);
        }
    }

    #[test]
    fn construction_rejects_invalid_weights() {
        let result = TopologyMatchEngine::new(&EngineConfig {
            strategy: ScoringStrategy::MostAllocated,
            resources: vec![ResourceWeightSpec {
                name: "cpu".to_string(),
                weight: -5,
            }],
        });
        assert!(matches!(result, Err(ConfigError::InvalidWeight { .. })));
    }

    #[test]
    fn every_policy_dispatches_filter_and_score() {
        let engine = engine(ScoringStrategy::LeastNumaNodes);
        let workload = pod(resources(&[("cpu", "1")]));
        let ctx = MachineContext::default();

        for policy in AlignmentPolicy::ALL {
            let mut zones = make_zones(&[&[("cpu", "4")], &[("cpu", "4")]]);
            engine
                .filter(&workload, policy, &mut zones, &ctx)
                .unwrap_or_else(|e| panic!("filter dispatch failed for {policy}: {e}"));

            let mut zones = make_zones(&[&[("cpu", "4")], &[("cpu", "4")]]);
            let score = engine
                .score(&workload, policy, &mut zones)
                .unwrap_or_else(|e| panic!("score dispatch failed for {policy}: {e}"));
            assert!((0..=MAX_NODE_SCORE).contains(&score), "policy {policy}");
        }
    }

    #[test]
    fn worked_example_filters_through_the_engine() {
        let engine = engine(ScoringStrategy::LeastNumaNodes);
        let workload = pod(resources(&[("cpu", "6"), ("memory", "4Gi")]));
        let ctx = MachineContext::default();
        let build = || {
            make_zones(&[
                &[("cpu", "4"), ("memory", "8Gi")],
                &[("cpu", "4"), ("memory", "8Gi")],
            ])
        };

        let mut zones = build();
        let single = engine
            .filter(&workload, AlignmentPolicy::SingleNumaNodePod, &mut zones, &ctx)
            .unwrap();
        assert!(!single.is_admit());

        let mut zones = build();
        let restricted = engine
            .filter(&workload, AlignmentPolicy::RestrictedPod, &mut zones, &ctx)
            .unwrap();
        assert!(restricted.is_admit());
        assert_eq!(zones[0].resources, resources(&[("cpu", "0"), ("memory", "4Gi")]));
        assert_eq!(zones[1].resources, resources(&[("cpu", "2"), ("memory", "8Gi")]));
    }

    #[test]
    fn unschedulable_machine_short_circuits_every_policy() {
        let engine = engine(ScoringStrategy::LeastAllocated);
        let workload = pod(resources(&[("cpu", "1")]));
        let ctx = MachineContext {
            allocatable: ResourceList::new(),
            unschedulable: true,
        };

        for policy in AlignmentPolicy::ALL {
            let mut zones = make_zones(&[&[("cpu", "4")]]);
            let decision = engine.filter(&workload, policy, &mut zones, &ctx).unwrap();
            assert_eq!(
                decision,
                FilterDecision::Reject(RejectReason::MachineUnschedulable),
                "policy {policy}"
            );
        }
    }

    #[test]
    fn empty_zone_list_is_an_error_not_a_reject() {
        let engine = engine(ScoringStrategy::LeastAllocated);
        let workload = pod(resources(&[("cpu", "1")]));
        let ctx = MachineContext::default();
        let mut zones = ZoneList::new();

        assert_eq!(
            engine.filter(&workload, AlignmentPolicy::BestEffortPod, &mut zones, &ctx),
            Err(EngineError::EmptyZoneList)
        );
        assert_eq!(
            engine.score(&workload, AlignmentPolicy::BestEffortPod, &mut zones),
            Err(EngineError::EmptyZoneList)
        );
    }

    #[test]
    fn out_of_range_zone_id_is_an_error() {
        let engine = engine(ScoringStrategy::LeastAllocated);
        let workload = pod(resources(&[("cpu", "1")]));
        let mut zones = vec![Zone {
            id: 7,
            resources: resources(&[("cpu", "4")]),
        }];

        assert_eq!(
            engine.score(&workload, AlignmentPolicy::BestEffortPod, &mut zones),
            Err(EngineError::ZoneIdMismatch(7, 0))
        );
    }

    #[test]
    fn permuted_zone_ids_are_an_error_not_a_wrong_decision() {
        // Ids swapped relative to position: a positional drain would hit
        // the small zone while the fit was found in the large one, letting
        // two 4-cpu containers through a machine with one 4-cpu zone.
        let engine = engine(ScoringStrategy::LeastAllocated);
        let workload = Workload {
            name: "pair".to_string(),
            containers: vec![
                Container {
                    name: "a".to_string(),
                    requests: resources(&[("cpu", "4")]),
                },
                Container {
                    name: "b".to_string(),
                    requests: resources(&[("cpu", "4")]),
                },
            ],
        };
        let build = || {
            vec![
                Zone {
                    id: 1,
                    resources: resources(&[("cpu", "4")]),
                },
                Zone {
                    id: 0,
                    resources: resources(&[("cpu", "1")]),
                },
            ]
        };
        let ctx = MachineContext::default();

        let mut zones = build();
        assert_eq!(
            engine.filter(&workload, AlignmentPolicy::SingleNumaNodeContainer, &mut zones, &ctx),
            Err(EngineError::ZoneIdMismatch(1, 0))
        );
        // Nothing was drained.
        assert_eq!(zones, build());

        let mut zones = build();
        assert_eq!(
            engine.score(&workload, AlignmentPolicy::SingleNumaNodeContainer, &mut zones),
            Err(EngineError::ZoneIdMismatch(1, 0))
        );
    }

    #[test]
    fn duplicate_zone_ids_are_an_error() {
        let engine = engine(ScoringStrategy::LeastAllocated);
        let workload = pod(resources(&[("cpu", "1")]));
        let mut zones = vec![
            Zone {
                id: 0,
                resources: resources(&[("cpu", "4")]),
            },
            Zone {
                id: 0,
                resources: resources(&[("cpu", "4")]),
            },
        ];

        assert_eq!(
            engine.score(&workload, AlignmentPolicy::BestEffortPod, &mut zones),
            Err(EngineError::ZoneIdMismatch(0, 1))
        );
    }

    #[test]
    fn least_allocated_strategy_prefers_emptier_machines() {
        let engine = engine(ScoringStrategy::LeastAllocated);
        let workload = pod(resources(&[("cpu", "2")]));

        let mut roomy = make_zones(&[&[("cpu", "16"), ("memory", "8Gi")]]);
        let mut snug = make_zones(&[&[("cpu", "2"), ("memory", "8Gi")]]);

        let roomy_score = engine
            .score(&workload, AlignmentPolicy::BestEffortPod, &mut roomy)
            .unwrap();
        let snug_score = engine
            .score(&workload, AlignmentPolicy::BestEffortPod, &mut snug)
            .unwrap();
        assert!(roomy_score > snug_score);
    }

    #[test]
    fn most_allocated_strategy_prefers_fuller_machines() {
        let engine = engine(ScoringStrategy::MostAllocated);
        let workload = pod(resources(&[("cpu", "2")]));

        let mut roomy = make_zones(&[&[("cpu", "16"), ("memory", "8Gi")]]);
        let mut snug = make_zones(&[&[("cpu", "2"), ("memory", "8Gi")]]);

        let roomy_score = engine
            .score(&workload, AlignmentPolicy::BestEffortPod, &mut roomy)
            .unwrap();
        let snug_score = engine
            .score(&workload, AlignmentPolicy::BestEffortPod, &mut snug)
            .unwrap();
        assert!(snug_score > roomy_score);
    }
}
