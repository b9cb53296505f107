//! Failure propagation integration tests.
//!
//! Tests that verify a failed job closes every transitive dependent without
//! executing it, while unrelated branches keep running.

use jobpool::testing::TestJob;
use jobpool::{EventBus, JobState, Scheduler};

use crate::common::RecordingHandler;

#[tokio::test]
async fn test_failed_root_skips_chain() {
    let recorder = RecordingHandler::new();
    let bus = EventBus::new();
    bus.register(recorder.clone()).await;
    let (handle, task) = Scheduler::new(2).unwrap().with_event_bus(bus).start();

    let a = TestJob::failing("a");
    let b = TestJob::succeeding("b");
    let c = TestJob::succeeding("c");
    let (a_calls, b_calls, c_calls) = (a.call_counter(), b.call_counter(), c.call_counter());

    let a = handle.add(a, &[]).await.unwrap();
    let b = a.chain(b).await.unwrap();
    b.chain(c).await.unwrap();

    assert!(!handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();

    assert_eq!(a_calls.count(), 1);
    assert_eq!(b_calls.count(), 0);
    assert_eq!(c_calls.count(), 0);
    assert_eq!(recorder.started().await, vec!["a"]);
    assert_eq!(recorder.skipped().await, vec!["b", "c"]);
}

#[tokio::test]
async fn test_failure_does_not_block_independent_branch() {
    let (handle, task) = Scheduler::new(2).unwrap().start();

    let bad = handle.add(TestJob::failing("bad"), &[]).await.unwrap();
    bad.chain(TestJob::succeeding("after_bad")).await.unwrap();

    let good = TestJob::succeeding("good");
    let good_next = TestJob::succeeding("after_good");
    let next_calls = good_next.call_counter();
    let good = handle.add(good, &[]).await.unwrap();
    good.chain(good_next).await.unwrap();

    assert!(!handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();

    assert_eq!(next_calls.count(), 1);
}

#[tokio::test]
async fn test_one_failed_dependency_is_enough() {
    let recorder = RecordingHandler::new();
    let bus = EventBus::new();
    bus.register(recorder.clone()).await;
    let (handle, task) = Scheduler::new(4).unwrap().with_event_bus(bus).start();

    let ok = handle.add(TestJob::succeeding("ok"), &[]).await.unwrap();
    let bad = handle.add(TestJob::failing("bad"), &[]).await.unwrap();
    let join = TestJob::succeeding("join");
    let join_calls = join.call_counter();
    handle.add(join, &[ok, bad]).await.unwrap();

    assert!(!handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();

    assert_eq!(join_calls.count(), 0);
    assert_eq!(recorder.skipped().await, vec!["join"]);
}

#[tokio::test]
async fn test_panic_propagates_like_failure() {
    let (handle, task) = Scheduler::new(1).unwrap().start();

    let boom = handle.add(TestJob::panicking("boom"), &[]).await.unwrap();
    let next = TestJob::succeeding("next");
    let next_calls = next.call_counter();
    boom.chain(next).await.unwrap();

    assert!(!handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();

    assert_eq!(next_calls.count(), 0);
}

#[tokio::test]
async fn test_skipped_job_snapshot() {
    let (handle, _task) = Scheduler::new(1).unwrap().start();

    let bad = handle.add(TestJob::failing("bad"), &[]).await.unwrap();
    let skipped = bad.chain(TestJob::succeeding("skipped")).await.unwrap();

    let snapshot = crate::common::wait_for_state(
        &skipped,
        JobState::Closed,
        std::time::Duration::from_secs(2),
    )
    .await;

    assert_eq!(snapshot.successful, Some(false));
    assert!(snapshot.failed());
    assert_eq!(snapshot.dependencies, vec![bad.id()]);
}
