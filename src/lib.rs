#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

pub mod cancel;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod lib_cpu;
pub mod lib_mem;
pub mod metrics;
pub mod service;
pub mod validation;

pub use cancel::CancellationSignal;
pub use config::Config;
pub use domain::{AllocationRequest, AppState, LoadRequest, MemoryReservoir};
pub use error::LoadError;
pub use http::{app_state, serve};
pub use http::{health, scrape_metrics, trigger_cpu, trigger_memory};
pub use lib_cpu::{CpuLoadEngine, DutyCycle, LaneReport, LoadHandle};
pub use lib_mem::MemoryAllocationEngine;
pub use metrics::Metrics;
pub use service::LoadRunner;
