#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use tracing::{info, warn};

use crate::domain::AllocationRequest;
use crate::error::LoadError;
use crate::metrics::Metrics;

/// Acquires exactly `req.size_bytes()` bytes and writes zero to each of them.
pub fn zero_filled_block(req: &AllocationRequest) -> Result<Box<[u8]>, LoadError> {
    let size_mib = req.size_mib();
    let bytes = req.size_bytes().ok_or_else(|| LoadError::AllocationFailure {
        size_mib,
        reason: "size exceeds the address space".to_string(),
    })?;
    let mut block = Vec::<u8>::new();
    block
        .try_reserve_exact(bytes)
        .map_err(|e| LoadError::AllocationFailure {
            size_mib,
            reason: e.to_string(),
        })?;
    // resize writes every element, so each page is touched
    block.resize(bytes, 0u8);
    Ok(block.into_boxed_slice())
}

#[derive(Clone)]
pub struct MemoryAllocationEngine {
    metrics: Metrics,
}

impl MemoryAllocationEngine {
    pub fn new(metrics: Metrics) -> Self {
        Self { metrics }
    }

    /// Blocks until the whole region is zero-filled.
    pub fn allocate(&self, req: &AllocationRequest) -> Result<Box<[u8]>, LoadError> {
        match zero_filled_block(req) {
            Ok(block) => {
                self.metrics.memory_allocations_total.inc();
                info!(size_mib = req.size_mib(), bytes = block.len(), "memory allocated");
                Ok(block)
            }
            Err(e) => {
                self.metrics.memory_allocation_failures_total.inc();
                warn!(size_mib = req.size_mib(), error = %e, "memory allocation failed");
                Err(e)
            }
        }
    }
}
