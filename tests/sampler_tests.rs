// Sampling lifecycle tests (paused tokio clock)

mod common;

use std::sync::Arc;

use common::{FakeHeap, MB};
use memscope::config::{ConfigPatch, ProfilerConfig};
use memscope::profiler::Profiler;
use tokio::time::{Duration, sleep};

fn profiler(heap: Arc<FakeHeap>) -> Profiler {
    Profiler::new(ProfilerConfig::default(), heap, None).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_double_start_keeps_one_timer() {
    let heap = Arc::new(FakeHeap::new());
    let p = profiler(heap.clone());
    assert!(p.start_with_interval(25).unwrap());
    assert!(!p.start_with_interval(25).unwrap());
    assert!(p.is_running());

    sleep(Duration::from_millis(110)).await;
    // ticks at 0, 25, 50, 75, 100; a second timer would double this
    let reads = heap.reads();
    assert!((4..=6).contains(&reads), "reads = {}", reads);
    assert_eq!(p.timeline().measurements.len(), reads);
}

#[tokio::test(start_paused = true)]
async fn test_no_ticks_after_stop() {
    let heap = Arc::new(FakeHeap::new());
    let p = profiler(heap.clone());
    p.start_with_interval(10).unwrap();
    sleep(Duration::from_millis(35)).await;

    assert!(p.stop());
    assert!(!p.stop());
    assert!(!p.is_running());
    let count = p.timeline().measurements.len();
    assert!(count > 0);

    heap.set_used(50 * MB);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(p.timeline().measurements.len(), count);
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_stop() {
    let heap = Arc::new(FakeHeap::new());
    let p = profiler(heap.clone());
    p.start_with_interval(10).unwrap();
    sleep(Duration::from_millis(15)).await;
    p.stop();
    let before = heap.reads();

    assert!(p.start().unwrap());
    // configured interval (the last one used) applies on a plain start
    assert_eq!(p.config().sample_interval_ms, 10);
    sleep(Duration::from_millis(55)).await;
    assert!(heap.reads() > before);
    p.stop();
}

#[tokio::test(start_paused = true)]
async fn test_interval_change_restarts_running_sampler() {
    let heap = Arc::new(FakeHeap::new());
    let p = profiler(heap.clone());
    p.start_with_interval(60_000).unwrap();
    sleep(Duration::from_millis(5)).await;
    let initial = heap.reads();
    assert_eq!(initial, 1);

    p.update_config(&ConfigPatch {
        sample_interval_ms: Some(10),
        ..Default::default()
    })
    .unwrap();
    sleep(Duration::from_millis(105)).await;
    assert!(heap.reads() >= initial + 9, "reads = {}", heap.reads());
    assert!(p.is_running());
    p.stop();
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_receive_ticks() {
    let heap = Arc::new(FakeHeap::new());
    heap.set_used(7 * MB);
    let p = profiler(heap);
    let mut rx = p.subscribe();
    p.start_with_interval(20).unwrap();
    let m = rx.recv().await.unwrap();
    assert_eq!(m.heap_used, 7 * MB);
    p.stop();
}

#[tokio::test(start_paused = true)]
async fn test_dropping_profiler_ends_sampler() {
    let heap = Arc::new(FakeHeap::new());
    let p = profiler(heap.clone());
    p.start_with_interval(10).unwrap();
    sleep(Duration::from_millis(25)).await;
    drop(p);
    sleep(Duration::from_millis(15)).await;
    let after_drop = heap.reads();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(heap.reads(), after_drop);
}

#[test]
fn test_interval_change_from_thread_outside_runtime() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()
        .unwrap();
    let heap = Arc::new(FakeHeap::new());
    let p = profiler(heap.clone());
    {
        let _entered = rt.enter();
        p.start_with_interval(60_000).unwrap();
    }
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while heap.reads() == 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(heap.reads(), 1);

    // no runtime context on this thread; the sampler's own runtime is used
    let updated = p
        .update_config(&ConfigPatch {
            sample_interval_ms: Some(10),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(updated.sample_interval_ms, 10);
    std::thread::sleep(Duration::from_millis(300));
    assert!(heap.reads() >= 5, "reads = {}", heap.reads());
    assert!(p.stop());
}
