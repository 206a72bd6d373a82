//! topomatch-plugin — scheduler-facing facade over the placement engine.
//!
//! Exposes the four capabilities a host scheduler integrates against:
//!
//! - **filter** a candidate machine for a workload
//! - **score** an admitted candidate machine
//! - **reserve** resources on the chosen machine (bookkeeping only)
//! - **event subscription** for topology/machine/workload changes
//!
//! Topology snapshots come from a [`TopologyProvider`]; the facade hands
//! the engine a fresh clone per evaluation so concurrent evaluations of
//! different machines never share a mutable zone list.

pub mod config;
pub mod error;
pub mod plugin;
pub mod provider;

pub use config::TopologyMatchConfig;
pub use error::{PluginError, PluginResult};
pub use plugin::{ClusterEvent, EventAction, EventResource, Reservation, TopologyMatch, PLUGIN_NAME};
pub use provider::{CachedTopology, TopologyProvider};
