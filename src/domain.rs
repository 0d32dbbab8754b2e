#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::LoadError;
use crate::validation::{validate_lanes, validate_non_negative, validate_percentage};

pub const BYTES_PER_MIB: usize = 1024 * 1024;

/// Validated CPU load parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    percentage: u32,
    lanes: usize,
    duration_seconds: u64,
}

impl LoadRequest {
    pub fn new(percentage: i64, lanes: i64, duration_seconds: i64) -> Result<Self, LoadError> {
        let percentage = validate_percentage(percentage)?;
        let lanes = validate_lanes(lanes)?;
        let duration_seconds = validate_non_negative("duration_seconds", duration_seconds)?;
        Ok(Self {
            percentage,
            lanes,
            duration_seconds,
        })
    }

    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }
}

/// Validated memory allocation parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocationRequest {
    size_mib: u64,
}

impl AllocationRequest {
    pub fn new(size_mib: i64) -> Result<Self, LoadError> {
        Ok(Self {
            size_mib: validate_non_negative("memory", size_mib)?,
        })
    }

    pub fn size_mib(&self) -> u64 {
        self.size_mib
    }

    /// Byte count of the block, or `None` when it does not fit in `usize`.
    pub fn size_bytes(&self) -> Option<usize> {
        usize::try_from(self.size_mib)
            .ok()?
            .checked_mul(BYTES_PER_MIB)
    }
}

// Query string shapes accepted by the HTTP adapter.

#[derive(Clone, Debug, Deserialize)]
pub struct CpuLoadQuery {
    pub percentage: i64,
    #[serde(alias = "lanes")]
    pub cores: i64,
    #[serde(rename = "sleepTime", alias = "durationSeconds")]
    pub sleep_time: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MemoryQuery {
    #[serde(alias = "sizeMebibytes")]
    pub memory: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoadReceipt {
    pub status: String,
    pub percentage: u32,
    pub lanes: usize,
    pub duration_seconds: u64,
    pub started_at: String,
    pub ends_at: Option<String>,
}

impl LoadReceipt {
    pub fn accepted(req: &LoadRequest, started: chrono::DateTime<chrono::Utc>) -> Self {
        let ends_at = chrono::Duration::from_std(req.duration())
            .ok()
            .and_then(|d| started.checked_add_signed(d))
            .map(|t| t.to_rfc3339());
        Self {
            status: "ok".to_string(),
            percentage: req.percentage(),
            lanes: req.lanes(),
            duration_seconds: req.duration_seconds(),
            started_at: started.to_rfc3339(),
            ends_at,
        }
    }
}

/// Holds zero-filled blocks for the lifetime of the process. Nothing is ever
/// handed back out or released.
#[derive(Clone, Default)]
pub struct MemoryReservoir {
    blocks: Arc<Mutex<Vec<Box<[u8]>>>>,
}

impl MemoryReservoir {
    /// Parks a block and returns the total bytes now retained.
    pub fn retain(&self, block: Box<[u8]>) -> usize {
        let mut blocks = self.blocks.lock();
        blocks.push(block);
        blocks.iter().map(|b| b.len()).sum()
    }

    pub fn retained_bytes(&self) -> usize {
        self.blocks.lock().iter().map(|b| b.len()).sum()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.lock().len()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub reservoir: MemoryReservoir,
    pub metrics: crate::metrics::Metrics,
}
