//! Admission and ordering integration tests.
//!
//! Tests that verify the scheduler respects the concurrency cap, admits
//! independent jobs, and only starts dependents once their prerequisites
//! closed successfully.

use jobpool::testing::{ConcurrencyProbe, TestJob};
use jobpool::{EventBus, FnJob, JobError, JobState, Scheduler};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::common::{RecordingHandler, wait_for_state};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_running_never_exceeds_cap() {
    let probe = ConcurrencyProbe::new();
    let (handle, task) = Scheduler::new(3).unwrap().with_verbose(false).start();

    for i in 0..12 {
        let job = TestJob::succeeding(format!("job{}", i))
            .with_delay(Duration::from_millis(30))
            .with_probe(&probe);
        handle.add(job, &[]).await.unwrap();
    }

    assert!(handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();

    assert_eq!(probe.peak(), 3);
    assert_eq!(probe.started().len(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_five_jobs_cap_two() {
    let probe = ConcurrencyProbe::new();
    let (handle, task) = Scheduler::new(2).unwrap().with_verbose(false).start();
    let start = Instant::now();

    let mut handles = Vec::new();
    for i in 0..5 {
        let job = TestJob::succeeding(format!("job{}", i))
            .with_delay(Duration::from_millis(150))
            .with_probe(&probe);
        handles.push(handle.add(job, &[]).await.unwrap());
    }
    handle.notify().await.unwrap();

    assert!(handle.shutdown().await.unwrap());
    let elapsed = start.elapsed();
    task.await.unwrap().unwrap();

    // Three waves of at most two jobs each.
    assert!(elapsed >= Duration::from_millis(450), "took {:?}", elapsed);
    assert_eq!(probe.peak(), 2);
}

#[tokio::test]
async fn test_admission_follows_insertion_order() {
    let recorder = RecordingHandler::new();
    let bus = EventBus::new();
    bus.register(recorder.clone()).await;
    let (handle, task) = Scheduler::new(1)
        .unwrap()
        .with_event_bus(bus)
        .with_verbose(false)
        .start();

    for name in ["first", "second", "third"] {
        handle.add(TestJob::succeeding(name), &[]).await.unwrap();
    }

    assert!(handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();

    assert_eq!(recorder.started().await, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_diamond_runs_join_last() {
    let probe = ConcurrencyProbe::new();
    let (handle, task) = Scheduler::new(4).unwrap().start();

    let root = handle
        .add(TestJob::succeeding("root").with_probe(&probe), &[])
        .await
        .unwrap();
    let left = root
        .chain(
            TestJob::succeeding("left")
                .with_delay(Duration::from_millis(40))
                .with_probe(&probe),
        )
        .await
        .unwrap();
    let right = root
        .chain(
            TestJob::succeeding("right")
                .with_delay(Duration::from_millis(40))
                .with_probe(&probe),
        )
        .await
        .unwrap();
    handle
        .add(TestJob::succeeding("join").with_probe(&probe), &[left, right])
        .await
        .unwrap();

    assert!(handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();

    let started = probe.started();
    assert_eq!(started.first().map(String::as_str), Some("root"));
    assert_eq!(started.last().map(String::as_str), Some("join"));
    assert_eq!(probe.peak(), 2);
}

#[tokio::test]
async fn test_dependency_added_after_registration() {
    let (handle, task) = Scheduler::new(2).unwrap().start();
    let probe = ConcurrencyProbe::new();

    // The gate holds `later` back until the new edge is registered.
    let gate = handle
        .add(
            TestJob::succeeding("gate").with_delay(Duration::from_millis(50)),
            &[],
        )
        .await
        .unwrap();
    let later = handle
        .add(
            TestJob::succeeding("later").with_probe(&probe),
            std::slice::from_ref(&gate),
        )
        .await
        .unwrap();
    let earlier = handle
        .add(
            TestJob::succeeding("earlier")
                .with_delay(Duration::from_millis(300))
                .with_probe(&probe),
            &[],
        )
        .await
        .unwrap();
    later.add_dependency(&earlier).await.unwrap();

    assert!(handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();

    assert_eq!(probe.started(), vec!["earlier", "later"]);
    assert_eq!(probe.peak(), 1);
}

#[tokio::test]
async fn test_closure_jobs_run_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let (handle, task) = Scheduler::new(2).unwrap().start();

    for i in 0..4 {
        let runs = Arc::clone(&runs);
        let job = FnJob::new(format!("closure{}", i), move || {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok::<(), JobError>(())
            }
        });
        handle.add(job, &[]).await.unwrap();
    }

    assert!(handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_cycle_stays_idle() {
    let (handle, _task) = Scheduler::new(2).unwrap().start();

    let gate = handle
        .add(
            TestJob::succeeding("gate").with_delay(Duration::from_millis(200)),
            &[],
        )
        .await
        .unwrap();
    let a = handle
        .add(TestJob::succeeding("a"), std::slice::from_ref(&gate))
        .await
        .unwrap();
    let b = a.chain(TestJob::succeeding("b")).await.unwrap();
    a.add_dependency(&b).await.unwrap();
    let free = handle.add(TestJob::succeeding("free"), &[]).await.unwrap();

    // Unrelated jobs still run while the cycle deadlocks.
    let done = wait_for_state(&free, JobState::Closed, Duration::from_secs(2)).await;
    assert_eq!(done.successful, Some(true));
    let opened = wait_for_state(&gate, JobState::Closed, Duration::from_secs(2)).await;
    assert_eq!(opened.successful, Some(true));
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(a.status().await.unwrap().state, JobState::Idle);
    assert_eq!(b.status().await.unwrap().state, JobState::Idle);
}
