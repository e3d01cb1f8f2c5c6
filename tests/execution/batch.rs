//! Integration tests for the batch sequencer.
//!
//! Tests cover:
//! - Stop-on-error versus keep-going in sequential batches
//! - Concurrency and ordering of parallel batches
//! - Progress and summary notices

#![cfg(test)]
#![cfg(unix)]

use std::time::{Duration, Instant};

use novaflow::batch::{BatchItem, BatchRequest, Sequencer};
use novaflow::exec::{ExecOptions, FailureKind};

use super::support::{recording_runner, sh_runner};

/// Items `[exit 0, exit 1, exit 0]`.
fn ok_fail_ok() -> Vec<BatchItem> {
    vec![
        BatchItem::new("exit 0", "first"),
        BatchItem::new("exit 1", "second"),
        BatchItem::new("exit 0", "third"),
    ]
}

#[tokio::test]
/// What: A sequential batch stops after the first failure by default.
async fn batch_sequential_stops_on_error() {
    let res = Sequencer::new(sh_runner())
        .run_batch(&BatchRequest::sequential(ok_fail_ok()).options(ExecOptions::capture()))
        .await
        .expect("batch");
    assert_eq!(res.attempted(), 2);
    assert_eq!(res.requested(), 3);
    assert_eq!(res.success_count(), 1);
    assert!(res.stopped_early());
    assert!(!res.all_succeeded());
    assert_eq!(res.results()[1].failure(), Some(FailureKind::NonZeroExit));
}

#[tokio::test]
/// What: With stop-on-error disabled every item runs.
async fn batch_sequential_keep_going() {
    let res = Sequencer::new(sh_runner())
        .run_batch(
            &BatchRequest::sequential(ok_fail_ok())
                .stop_on_error(false)
                .options(ExecOptions::capture()),
        )
        .await
        .expect("batch");
    assert_eq!(res.attempted(), 3);
    assert_eq!(res.success_count(), 2);
    assert!(!res.stopped_early());
    assert_eq!(res.summary(), format!("Summary: 2/3 commands succeeded on {}", res.results()[0].platform()));
}

#[tokio::test]
/// What: Sequential items run strictly one after another.
async fn batch_sequential_is_ordered() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("order.log");
    let items = (1..=3)
        .map(|i| BatchItem::new(format!("sleep 0.0{i}; echo {i} >> {}", log.display()), format!("step {i}")))
        .collect();
    let res = Sequencer::new(sh_runner())
        .run_batch(&BatchRequest::sequential(items).options(ExecOptions::capture()))
        .await
        .expect("batch");
    assert!(res.all_succeeded());
    assert_eq!(std::fs::read_to_string(&log).expect("log"), "1\n2\n3\n");
}

#[tokio::test]
/// What: Parallel items overlap in time and keep input order in the result.
async fn batch_parallel_runs_concurrently() {
    let items = vec![
        BatchItem::new("sleep 0.5; echo a", "a"),
        BatchItem::new("sleep 0.5; echo b", "b"),
        BatchItem::new("sleep 0.5; echo c", "c"),
    ];
    let started = Instant::now();
    let res = Sequencer::new(sh_runner())
        .run_batch(&BatchRequest::parallel(items))
        .await
        .expect("batch");
    assert!(started.elapsed() < Duration::from_millis(1400));
    let outs: Vec<_> = res.results().iter().map(|r| r.stdout()).collect();
    assert_eq!(outs, vec![Some("a"), Some("b"), Some("c")]);
    assert!(res.all_succeeded());
}

#[tokio::test]
/// What: A parallel batch runs every item even when one fails.
async fn batch_parallel_ignores_stop_on_error() {
    let res = Sequencer::new(sh_runner())
        .run_batch(&BatchRequest::parallel(ok_fail_ok()).stop_on_error(true))
        .await
        .expect("batch");
    assert_eq!(res.attempted(), 3);
    assert_eq!(res.success_count(), 2);
}

#[tokio::test]
/// What: The concurrency cap serializes a parallel batch when set to 1.
async fn batch_parallel_concurrency_cap() {
    let items = vec![
        BatchItem::new("sleep 0.3", "a"),
        BatchItem::new("sleep 0.3", "b"),
    ];
    let started = Instant::now();
    let res = Sequencer::new(sh_runner())
        .run_batch(&BatchRequest::parallel(items).max_concurrency(1))
        .await
        .expect("batch");
    assert!(res.all_succeeded());
    assert!(started.elapsed() >= Duration::from_millis(550));
}

#[tokio::test]
/// What: Progress, stop and summary notices are emitted in order.
async fn batch_notices() {
    let (runner, recorder) = recording_runner();
    let items = vec![BatchItem::new("exit 0", "Fetch"), BatchItem::new("exit 2", "Build")];
    Sequencer::new(runner)
        .run_batch(&BatchRequest::sequential(items).options(ExecOptions::capture()))
        .await
        .expect("batch");
    let notices = recorder.notices();
    assert!(notices[0].starts_with("Detected platform: "));
    assert_eq!(notices[1], "[1/2] Fetch");
    assert_eq!(notices[2], "[2/2] Build");
    assert_eq!(notices[3], "Stopping sequence due to an error");
    assert!(notices[4].starts_with("Summary: 1/2 commands succeeded on "));
}

#[tokio::test]
/// What: Items without description get numbered labels.
async fn batch_default_descriptions() {
    let (runner, recorder) = recording_runner();
    let items = vec![BatchItem {
        command: "exit 0".into(),
        description: None,
    }];
    Sequencer::new(runner)
        .run_batch(&BatchRequest::sequential(items).options(ExecOptions::capture()))
        .await
        .expect("batch");
    assert!(recorder.notices().contains(&"[1/1] Command 1".to_string()));
}
