#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::cancel::CancellationSignal;
use crate::domain::LoadRequest;
use crate::error::LoadError;
use crate::metrics::Metrics;

/// Length of one duty cycle. The requested percentage is the busy budget in
/// milliseconds within this period.
pub const PERIOD: Duration = Duration::from_millis(100);

/// Longest uninterrupted sleep inside the idle phase.
pub const POLL_SLICE: Duration = Duration::from_millis(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DutyCycle {
    busy: Duration,
    idle: Duration,
}

impl DutyCycle {
    /// Budgets of 100 or more leave no idle time; the lane just spins.
    pub fn from_percent(percent: u32) -> Self {
        let busy = Duration::from_millis(u64::from(percent));
        Self {
            busy,
            idle: PERIOD.saturating_sub(busy),
        }
    }

    pub fn busy(&self) -> Duration {
        self.busy
    }

    pub fn idle(&self) -> Duration {
        self.idle
    }
}

/// What a lane did before it observed cancellation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LaneReport {
    pub busy: Duration,
    pub idle: Duration,
    pub periods: u64,
    pub spins: u64,
}

/// Runs the duty-cycle loop on the current thread until `signal` is set.
pub fn run_lane(cycle: DutyCycle, signal: &CancellationSignal) -> LaneReport {
    let mut report = LaneReport::default();
    loop {
        let period = Instant::now();
        if !cycle.busy.is_zero() {
            while period.elapsed() <= cycle.busy {
                if signal.is_cancelled() {
                    report.busy += period.elapsed();
                    return report;
                }
                report.spins += 1;
                std::hint::spin_loop();
            }
            report.busy += period.elapsed();
        }
        if signal.is_cancelled() {
            return report;
        }
        report.idle += idle_for(cycle.idle, signal);
        if signal.is_cancelled() {
            return report;
        }
        report.periods += 1;
    }
}

fn idle_for(total: Duration, signal: &CancellationSignal) -> Duration {
    let mut slept = Duration::ZERO;
    while slept < total {
        if signal.is_cancelled() {
            break;
        }
        let step = POLL_SLICE.min(total - slept);
        thread::sleep(step);
        slept += step;
    }
    slept
}

/// Lanes and cancellation of one started load. Dropping it (or calling
/// [`LoadHandle::detach`]) leaves the lanes running until the deadline.
#[derive(Debug)]
pub struct LoadHandle {
    signal: CancellationSignal,
    lanes: Vec<JoinHandle<LaneReport>>,
    deadline: Instant,
}

impl LoadHandle {
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn signal(&self) -> &CancellationSignal {
        &self.signal
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn detach(self) {
        drop(self.lanes);
    }

    /// Blocks until every lane has stopped.
    pub fn join(self) -> Vec<LaneReport> {
        self.lanes
            .into_iter()
            .filter_map(|lane| lane.join().ok())
            .collect()
    }
}

#[derive(Clone)]
pub struct CpuLoadEngine {
    metrics: Metrics,
}

impl CpuLoadEngine {
    pub fn new(metrics: Metrics) -> Self {
        Self { metrics }
    }

    /// Starts `req.lanes()` duty-cycle lanes and returns without waiting for
    /// them. The shared signal fires `req.duration()` after this call began.
    ///
    /// The timer is armed before any lane starts, so lanes spawned ahead of a
    /// [`LoadError::SpawnFailure`] still stop at the deadline.
    pub fn start_load(&self, req: &LoadRequest) -> Result<LoadHandle, LoadError> {
        let accepted = Instant::now();
        let deadline = accepted
            .checked_add(req.duration())
            .ok_or_else(|| {
                LoadError::invalid("duration_seconds", "deadline overflows the clock")
            })?;
        let signal = CancellationSignal::new();
        arm_timer(signal.clone(), deadline)?;

        let cycle = DutyCycle::from_percent(req.percentage());
        let mut lanes = Vec::with_capacity(req.lanes());
        for index in 0..req.lanes() {
            lanes.push(self.spawn_lane(index, cycle, signal.clone())?);
        }
        self.metrics.cpu_loads_total.inc();
        self.metrics
            .cpu_duty_percent
            .set(i64::from(req.percentage()));
        info!(
            percentage = req.percentage(),
            lanes = req.lanes(),
            duration = req.duration_seconds(),
            "cpu load started"
        );
        Ok(LoadHandle {
            signal,
            lanes,
            deadline,
        })
    }

    fn spawn_lane(
        &self,
        index: usize,
        cycle: DutyCycle,
        signal: CancellationSignal,
    ) -> Result<JoinHandle<LaneReport>, LoadError> {
        let mtr = self.metrics.clone();
        self.metrics.cpu_lanes_active.inc();
        thread::Builder::new()
            .name(format!("cpu-lane-{index}"))
            .spawn(move || {
                debug!(lane = index, "lane started");
                let report = run_lane(cycle, &signal);
                mtr.cpu_lanes_active.dec();
                mtr.cpu_busy_seconds_total.inc_by(report.busy.as_secs_f64());
                debug!(
                    lane = index,
                    periods = report.periods,
                    busy = ?report.busy,
                    "lane stopped"
                );
                report
            })
            .map_err(|source| {
                self.metrics.cpu_lanes_active.dec();
                LoadError::SpawnFailure {
                    what: format!("cpu lane {index}"),
                    source,
                }
            })
    }
}

fn arm_timer(signal: CancellationSignal, deadline: Instant) -> Result<(), LoadError> {
    thread::Builder::new()
        .name("cpu-load-timer".to_string())
        .spawn(move || {
            thread::sleep(deadline.saturating_duration_since(Instant::now()));
            if signal.cancel() {
                debug!("cpu load deadline reached");
            }
        })
        .map(drop)
        .map_err(|source| LoadError::SpawnFailure {
            what: "cpu load timer".to_string(),
            source,
        })
}
