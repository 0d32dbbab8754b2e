#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use synthload::domain::MemoryQuery;
use synthload::{LoadRunner, MemoryReservoir, Metrics};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn retained_gauge_tracks_concurrent_allocations() {
    let reservoir = MemoryReservoir::default();
    let m = Metrics::new().expect("metrics");
    let runner = LoadRunner::new(reservoir.clone(), m.clone());

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let runner = runner.clone();
        tasks.push(tokio::spawn(async move {
            runner
                .allocate_memory(&MemoryQuery { memory: 1 })
                .await
                .expect("allocated")
        }));
    }
    for task in tasks {
        assert_eq!(task.await.expect("join"), 1024 * 1024);
    }

    assert_eq!(reservoir.block_count(), 8);
    assert_eq!(reservoir.retained_bytes(), 8 * 1024 * 1024);
    assert_eq!(m.memory_retained_bytes.get(), 8 * 1024 * 1024);
    assert_eq!(m.memory_allocations_total.get(), 8);
}
