#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use thiserror::Error;

/// Failures surfaced by the load engines to the triggering call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("failed to allocate {size_mib} MiB: {reason}")]
    AllocationFailure { size_mib: u64, reason: String },

    #[error("failed to spawn {what}: {source}")]
    SpawnFailure {
        what: String,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}
