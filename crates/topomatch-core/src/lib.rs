//! topomatch-core — domain types for NUMA topology-aware placement.
//!
//! Provides the data model shared by the placement engine and the
//! scheduler-facing plugin:
//!
//! - [`Quantity`] — exact fixed-point resource amounts ("4", "500m", "8Gi")
//! - [`Zone`] / [`ZoneList`] — per-machine NUMA zone inventories
//! - [`Workload`] / [`Container`] — resource requests at pod and container granularity
//! - [`AlignmentPolicy`] — the six topology-manager policy/scope combinations
//!
//! All types are serializable so snapshots and configuration can cross
//! process boundaries as JSON or TOML.

pub mod policy;
pub mod quantity;
pub mod types;

pub use policy::{AlignmentMode, AlignmentPolicy, Scope};
pub use quantity::{Quantity, QuantityParseError};
pub use types::*;
