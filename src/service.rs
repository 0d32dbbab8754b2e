#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use anyhow::Result as AnyResult;
use serde::Serialize;

use crate::domain::{
    AllocationRequest, AppState, CpuLoadQuery, LoadReceipt, LoadRequest, MemoryQuery,
    MemoryReservoir,
};
use crate::error::LoadError;
use crate::lib_cpu::CpuLoadEngine;
use crate::lib_mem::MemoryAllocationEngine;
use crate::metrics::Metrics;

/// Glue between the HTTP handlers and the two engines.
#[derive(Clone)]
pub struct LoadRunner {
    reservoir: MemoryReservoir,
    metrics: Metrics,
    cpu: CpuLoadEngine,
    memory: MemoryAllocationEngine,
}

impl LoadRunner {
    pub fn new(reservoir: MemoryReservoir, metrics: Metrics) -> Self {
        Self {
            cpu: CpuLoadEngine::new(metrics.clone()),
            memory: MemoryAllocationEngine::new(metrics.clone()),
            reservoir,
            metrics,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.reservoir.clone(), state.metrics.clone())
    }

    /// Validates and starts a CPU load. Returns as soon as the lanes are
    /// running; they stop on their own at the deadline.
    pub fn start_cpu(&self, query: &CpuLoadQuery) -> Result<LoadReceipt, LoadError> {
        let req = LoadRequest::new(query.percentage, query.cores, query.sleep_time)?;
        let started = chrono::Utc::now();
        self.cpu.start_load(&req)?.detach();
        Ok(LoadReceipt::accepted(&req, started))
    }

    /// Validates, allocates and parks a zero-filled block. Returns its size in
    /// bytes.
    pub async fn allocate_memory(&self, query: &MemoryQuery) -> Result<usize, LoadError> {
        let req = AllocationRequest::new(query.memory)?;
        let engine = self.memory.clone();
        let block = tokio::task::spawn_blocking(move || engine.allocate(&req))
            .await
            .map_err(|e| LoadError::AllocationFailure {
                size_mib: req.size_mib(),
                reason: format!("allocation worker failed: {e}"),
            })??;
        let bytes = block.len();
        self.reservoir.retain(block);
        self.metrics
            .memory_retained_bytes
            .add(i64::try_from(bytes).unwrap_or(i64::MAX));
        Ok(bytes)
    }

    pub fn encode_metrics(&self) -> AnyResult<Vec<u8>> {
        self.metrics.encode_text()
    }

    pub fn health(&self) -> HealthReport {
        let metrics_ok = self.metrics.encode_text().is_ok();
        HealthReport {
            status: if metrics_ok { "ok" } else { "degraded" }.to_string(),
            lanes_active: self.metrics.cpu_lanes_active.get(),
            retained_bytes: self.reservoir.retained_bytes(),
            retained_blocks: self.reservoir.block_count(),
            metrics_ok,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub lanes_active: i64,
    pub retained_bytes: usize,
    pub retained_blocks: usize,
    pub metrics_ok: bool,
}
