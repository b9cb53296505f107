//! Shutdown integration tests.
//!
//! Tests that verify shutdown waits for every job to close, aggregates the
//! outcomes, and stops the control loop afterwards.

use jobpool::testing::TestJob;
use jobpool::{JobState, Scheduler, SchedulerError};
use std::time::{Duration, Instant};

use crate::common::wait_for_state;

#[tokio::test]
async fn test_shutdown_waits_for_running_job() {
    let (handle, task) = Scheduler::new(1).unwrap().start();
    let slow = TestJob::succeeding("slow").with_delay(Duration::from_millis(200));
    let calls = slow.call_counter();
    let slow = handle.add(slow, &[]).await.unwrap();

    wait_for_state(&slow, JobState::Running, Duration::from_secs(2)).await;
    let start = Instant::now();

    assert!(handle.shutdown().await.unwrap());
    assert!(start.elapsed() >= Duration::from_millis(100));
    task.await.unwrap().unwrap();
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn test_shutdown_on_empty_scheduler() {
    let (handle, task) = Scheduler::new(4).unwrap().start();

    assert!(handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_reports_any_failure() {
    let (handle, task) = Scheduler::new(4).unwrap().start();
    for name in ["a", "b", "c"] {
        handle.add(TestJob::succeeding(name), &[]).await.unwrap();
    }
    handle.add(TestJob::failing("d"), &[]).await.unwrap();

    assert!(!handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_every_job_closed_at_shutdown() {
    let (handle, task) = Scheduler::new(2).unwrap().start();
    let root = handle.add(TestJob::succeeding("root"), &[]).await.unwrap();
    let mid = root.chain(TestJob::failing("mid")).await.unwrap();
    let leaf = mid.chain(TestJob::succeeding("leaf")).await.unwrap();
    let side = handle
        .add(
            TestJob::succeeding("side").with_delay(Duration::from_millis(400)),
            &[],
        )
        .await
        .unwrap();

    let observer = handle.clone();
    let waiter = tokio::spawn(async move { observer.shutdown().await });

    // Jobs can still be queried while shutdown is pending.
    let leaf_snapshot = wait_for_state(&leaf, JobState::Closed, Duration::from_secs(2)).await;
    assert!(leaf_snapshot.failed());
    assert_eq!(side.status().await.unwrap().state, JobState::Running);

    assert!(!waiter.await.unwrap().unwrap());
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_concurrent_shutdown_callers_agree() {
    let (handle, task) = Scheduler::new(1).unwrap().start();
    handle
        .add(
            TestJob::succeeding("slow").with_delay(Duration::from_millis(50)),
            &[],
        )
        .await
        .unwrap();

    let (first, second) = tokio::join!(handle.shutdown(), handle.shutdown());

    assert!(first.unwrap());
    assert!(second.unwrap());
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_jobs_can_be_added_while_shutdown_pending() {
    let (handle, task) = Scheduler::new(1).unwrap().start();
    let first = handle
        .add(
            TestJob::succeeding("first").with_delay(Duration::from_millis(100)),
            &[],
        )
        .await
        .unwrap();

    let observer = handle.clone();
    let waiter = tokio::spawn(async move { observer.shutdown().await });
    wait_for_state(&first, JobState::Running, Duration::from_secs(2)).await;

    let late = TestJob::succeeding("late");
    let late_calls = late.call_counter();
    first.chain(late).await.unwrap();

    assert!(waiter.await.unwrap().unwrap());
    task.await.unwrap().unwrap();
    assert_eq!(late_calls.count(), 1);
}

#[tokio::test]
async fn test_outcomes_readable_after_shutdown() {
    let (handle, task) = Scheduler::new(2).unwrap().start();
    let ok = handle.add(TestJob::succeeding("ok"), &[]).await.unwrap();
    let bad = handle.add(TestJob::failing("bad"), &[]).await.unwrap();
    let skipped = bad.chain(TestJob::succeeding("skipped")).await.unwrap();

    assert!(!handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();

    let ok = ok.status().await.unwrap();
    assert_eq!(ok.state, JobState::Closed);
    assert!(ok.succeeded());
    let bad = bad.status().await.unwrap();
    assert_eq!(bad.state, JobState::Closed);
    assert!(bad.failed());
    let skipped = skipped.status().await.unwrap();
    assert_eq!(skipped.state, JobState::Closed);
    assert!(skipped.failed());

    let jobs = handle.jobs().await.unwrap();
    let names: Vec<_> = jobs.iter().map(|job| job.name.as_str()).collect();
    assert_eq!(names, vec!["ok", "bad", "skipped"]);
    assert!(jobs.iter().all(|job| job.state == JobState::Closed));
    assert_eq!(handle.running_count().await.unwrap(), 0);

    // Asking again gives the same answer.
    assert!(!handle.shutdown().await.unwrap());

    assert!(matches!(
        handle.notify().await,
        Err(SchedulerError::ChannelError(_))
    ));
    assert!(matches!(
        handle.add(TestJob::succeeding("late"), &[]).await,
        Err(SchedulerError::ChannelError(_))
    ));
}
