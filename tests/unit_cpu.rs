#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use std::thread;
use std::time::{Duration, Instant};

use synthload::lib_cpu::{run_lane, CpuLoadEngine, DutyCycle, PERIOD};
use synthload::{CancellationSignal, LoadRequest, Metrics};

fn engine() -> (CpuLoadEngine, Metrics) {
    let m = Metrics::new().expect("metrics");
    (CpuLoadEngine::new(m.clone()), m)
}

fn cancel_after(signal: &CancellationSignal, after: Duration) -> thread::JoinHandle<()> {
    let signal = signal.clone();
    thread::spawn(move || {
        thread::sleep(after);
        signal.cancel();
    })
}

#[test]
fn duty_cycle_splits_period() {
    for pct in [0u32, 1, 25, 50, 99, 100] {
        let c = DutyCycle::from_percent(pct);
        assert_eq!(c.busy(), Duration::from_millis(u64::from(pct)));
        assert_eq!(c.busy() + c.idle(), PERIOD);
    }
}

#[test]
fn idle_clamped_at_and_above_full_period() {
    assert_eq!(DutyCycle::from_percent(100).idle(), Duration::ZERO);
    assert_eq!(DutyCycle::from_percent(250).idle(), Duration::ZERO);
}

#[test]
fn lane_spends_budget_busy_then_idle() {
    let signal = CancellationSignal::new();
    let canceller = cancel_after(&signal, Duration::from_millis(450));
    let report = run_lane(DutyCycle::from_percent(50), &signal);
    canceller.join().expect("canceller");

    assert!(report.periods >= 2, "periods: {}", report.periods);
    let periods = u32::try_from(report.periods).expect("periods fit");
    assert!(report.busy >= Duration::from_millis(50) * periods);
    assert!(report.busy <= Duration::from_millis(80) * (periods + 1));
    assert!(report.idle >= Duration::from_millis(50) * periods);
    assert!(report.spins > 0);
}

#[test]
fn zero_percent_lane_never_spins() {
    let signal = CancellationSignal::new();
    let canceller = cancel_after(&signal, Duration::from_millis(250));
    let report = run_lane(DutyCycle::from_percent(0), &signal);
    canceller.join().expect("canceller");

    assert_eq!(report.spins, 0);
    assert_eq!(report.busy, Duration::ZERO);
    assert!(report.idle > Duration::ZERO);
}

#[test]
fn full_percent_lane_never_sleeps() {
    let signal = CancellationSignal::new();
    let canceller = cancel_after(&signal, Duration::from_millis(250));
    let report = run_lane(DutyCycle::from_percent(100), &signal);
    canceller.join().expect("canceller");

    assert_eq!(report.idle, Duration::ZERO);
    assert!(report.spins > 0);
}

#[test]
fn lane_returns_at_once_when_already_cancelled() {
    let signal = CancellationSignal::new();
    signal.cancel();
    let report = run_lane(DutyCycle::from_percent(80), &signal);
    assert_eq!(report.periods, 0);
    assert_eq!(report.spins, 0);
}

#[test]
fn cancel_is_idempotent() {
    let signal = CancellationSignal::new();
    let other = signal.clone();
    assert!(!other.is_cancelled());
    assert!(signal.cancel());
    assert!(!other.cancel());
    assert!(signal.is_cancelled());
    assert!(other.is_cancelled());
}

#[test]
fn start_load_returns_without_waiting() {
    let (engine, m) = engine();
    let req = LoadRequest::new(50, 2, 1).expect("request");
    let started = Instant::now();
    let handle = engine.start_load(&req).expect("started");
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(handle.lane_count(), 2);
    assert!(handle.deadline() >= started + Duration::from_secs(1));
    assert!(!handle.signal().is_cancelled());
    assert_eq!(m.cpu_loads_total.get(), 1);
    assert_eq!(m.cpu_duty_percent.get(), 50);

    let reports = handle.join();
    assert_eq!(reports.len(), 2);
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(reports.iter().all(|r| r.busy > Duration::ZERO));
    assert_eq!(m.cpu_lanes_active.get(), 0);
}

#[test]
fn zero_duration_stops_idle_lane_quickly() {
    let (engine, _m) = engine();
    let req = LoadRequest::new(0, 1, 0).expect("request");
    let started = Instant::now();
    let handle = engine.start_load(&req).expect("started");
    let reports = handle.join();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].spins, 0);
}

#[test]
fn zero_lanes_spawns_nothing() {
    let (engine, m) = engine();
    let req = LoadRequest::new(70, 0, 0).expect("request");
    let handle = engine.start_load(&req).expect("started");
    assert_eq!(handle.lane_count(), 0);
    assert!(handle.join().is_empty());
    assert_eq!(m.cpu_lanes_active.get(), 0);
}

#[test]
fn every_lane_observes_the_shared_signal() {
    let (engine, m) = engine();
    let req = LoadRequest::new(30, 4, 3600).expect("request");
    let handle = engine.start_load(&req).expect("started");
    assert_eq!(handle.lane_count(), 4);
    assert_eq!(m.cpu_lanes_active.get(), 4);

    assert!(handle.signal().cancel());
    assert!(!handle.signal().cancel());
    let stop = Instant::now();
    let reports = handle.join();
    assert_eq!(reports.len(), 4);
    assert!(stop.elapsed() < Duration::from_millis(500));
    assert_eq!(m.cpu_lanes_active.get(), 0);
}
