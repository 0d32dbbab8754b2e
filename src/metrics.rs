#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use anyhow::{Context, Result as AnyResult};
use prometheus::{Counter, Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,
    pub cpu_loads_total: IntCounter,
    pub cpu_lanes_active: IntGauge,
    pub cpu_duty_percent: IntGauge,
    pub cpu_busy_seconds_total: Counter,
    pub memory_allocations_total: IntCounter,
    pub memory_allocation_failures_total: IntCounter,
    pub memory_retained_bytes: IntGauge,
}

impl Metrics {
    pub fn new() -> AnyResult<Self> {
        let registry = Registry::new();
        let cpu_loads_total = IntCounter::with_opts(Opts::new(
            "synthload_cpu_loads_total",
            "cpu loads started",
        ))
        .context("create cpu_loads_total")?;
        let cpu_lanes_active = IntGauge::with_opts(Opts::new(
            "synthload_cpu_lanes_active",
            "lanes currently running a duty cycle",
        ))
        .context("create cpu_lanes_active")?;
        let cpu_duty_percent = IntGauge::with_opts(Opts::new(
            "synthload_cpu_duty_percent",
            "duty percent of the most recent load",
        ))
        .context("create cpu_duty_percent")?;
        let cpu_busy_seconds_total = Counter::with_opts(Opts::new(
            "synthload_cpu_busy_seconds_total",
            "seconds spent busy-spinning by finished lanes",
        ))
        .context("create cpu_busy_seconds_total")?;
        registry
            .register(Box::new(cpu_loads_total.clone()))
            .context("register cpu_loads_total")?;
        registry
            .register(Box::new(cpu_lanes_active.clone()))
            .context("register cpu_lanes_active")?;
        registry
            .register(Box::new(cpu_duty_percent.clone()))
            .context("register cpu_duty_percent")?;
        registry
            .register(Box::new(cpu_busy_seconds_total.clone()))
            .context("register cpu_busy_seconds_total")?;
        let memory_allocations_total = IntCounter::with_opts(Opts::new(
            "synthload_memory_allocations_total",
            "zero-filled blocks allocated",
        ))
        .context("create memory_allocations_total")?;
        let memory_allocation_failures_total = IntCounter::with_opts(Opts::new(
            "synthload_memory_allocation_failures_total",
            "allocations that could not be satisfied",
        ))
        .context("create memory_allocation_failures_total")?;
        let memory_retained_bytes = IntGauge::with_opts(Opts::new(
            "synthload_memory_retained_bytes",
            "bytes held by allocated blocks",
        ))
        .context("create memory_retained_bytes")?;
        registry
            .register(Box::new(memory_allocations_total.clone()))
            .context("register memory_allocations_total")?;
        registry
            .register(Box::new(memory_allocation_failures_total.clone()))
            .context("register memory_allocation_failures_total")?;
        registry
            .register(Box::new(memory_retained_bytes.clone()))
            .context("register memory_retained_bytes")?;
        Ok(Self {
            registry,
            cpu_loads_total,
            cpu_lanes_active,
            cpu_duty_percent,
            cpu_busy_seconds_total,
            memory_allocations_total,
            memory_allocation_failures_total,
            memory_retained_bytes,
        })
    }

    pub fn encode_text(&self) -> AnyResult<Vec<u8>> {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf).context("encode metrics")?;
        Ok(buf)
    }
}
