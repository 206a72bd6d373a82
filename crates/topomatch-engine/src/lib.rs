//! topomatch-engine — the NUMA placement decision engine.
//!
//! Pure, synchronous logic that decides whether a machine's per-zone
//! capacity can satisfy a workload under its declared alignment policy,
//! and how well-aligned that placement is:
//!
//! - **`subtract`** — the zone resource ledger and subtraction algorithm
//! - **`filter`** — admit/reject decision functions, one per policy
//! - **`score`** — least-zones and weighted-resource scoring strategies
//! - **`engine`** — policy dispatch tables built once at construction
//!
//! The engine holds no shared mutable state; every evaluation consumes
//! its own copy of the machine's [`topomatch_core::ZoneList`].

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod score;
pub mod subtract;

pub use config::{EngineConfig, ResourceWeightSpec, ScoringStrategy};
pub use engine::TopologyMatchEngine;
pub use error::{ConfigError, EngineError, EngineResult};
pub use filter::{FilterDecision, RejectReason};
pub use score::MAX_NODE_SCORE;
pub use subtract::subtract_from_zones;
