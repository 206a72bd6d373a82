//! Engine error types.
//!
//! Admissibility rejections are *not* errors — they are the `Reject`
//! variant of [`crate::FilterDecision`]. The enums here cover the two
//! remaining classes from the taxonomy: configuration errors that abort
//! engine construction, and internal evaluation errors that mean "this
//! evaluation is broken", never "this machine doesn't fit".

use thiserror::Error;
use topomatch_core::{AlignmentPolicy, ZoneId};

/// Result type alias for per-evaluation engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Fatal configuration problems, surfaced at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unsupported scoring strategy: {0:?}")]
    UnsupportedStrategy(String),

    #[error("invalid weight {weight} for resource {resource:?}")]
    InvalidWeight { resource: String, weight: i64 },

    #[error("no handler registered for policy {0}")]
    MissingPolicyHandler(AlignmentPolicy),
}

/// Internal evaluation failures, distinct from admissibility rejection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("no dispatch entry for policy {0}")]
    UnhandledPolicy(AlignmentPolicy),

    #[error("machine reported an empty NUMA zone list")]
    EmptyZoneList,

    #[error("zone id {0} does not match its position {1} in the zone list")]
    ZoneIdMismatch(ZoneId, usize),
}
