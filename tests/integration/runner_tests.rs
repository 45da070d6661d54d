//! Runner and progress channel tests.
//!
//! A consumer task drains the progress channel while the runner executes,
//! the way the CLI front end does.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use debian_preflight::engine::repository::{InMemorySessionRepository, SessionRepository};
use debian_preflight::{
    build_orchestrator, PreflightConfig, PreflightError, ProgressStatus, ProgressUpdate,
    RequirementName, Runner, ValidationOutcome, ValidationStatus,
};

use crate::mocks::{MockHost, GB};

fn runner_for(host: &MockHost, capacity: usize) -> Arc<Runner> {
    let config = PreflightConfig::default();
    Arc::new(Runner::new(build_orchestrator(&config, &host.ports()), capacity))
}

async fn drain(runner: &Arc<Runner>) -> Vec<ProgressUpdate> {
    let mut progress = runner.progress().expect("receiver available");
    let consumer = tokio::spawn(async move {
        let mut updates = Vec::new();
        while let Some(update) = progress.recv().await {
            updates.push(update);
        }
        updates
    });

    runner.run(&CancellationToken::new()).await.unwrap();
    consumer.await.unwrap()
}

#[tokio::test]
async fn test_progress_stream_covers_every_validator_and_closes() {
    let runner = runner_for(&MockHost::healthy().without_gpu(), 8);
    let updates = drain(&runner).await;

    assert!(updates.len() >= 5);
    assert_eq!(updates.len(), 10);

    let resolved: Vec<&ProgressUpdate> = updates.iter().filter(|u| u.is_resolved()).collect();
    assert_eq!(resolved.len(), 5);
    for update in &resolved {
        assert!(update.result.is_some());
    }
    for update in updates.iter().filter(|u| !u.is_resolved()) {
        assert_eq!(update.status, ProgressStatus::Running);
        assert!(update.result.is_none());
    }

    let gpu = resolved
        .iter()
        .find(|u| u.requirement == RequirementName::GpuSupport)
        .unwrap();
    assert_eq!(gpu.status, ProgressStatus::Resolved(ValidationStatus::Warning));
    assert!(gpu.message.contains("No GPU detected"));

    assert!(runner.session().is_completed());
    assert_eq!(runner.session().overall_result(), ValidationOutcome::Warnings);
}

#[tokio::test]
async fn test_running_precedes_resolved_for_each_check() {
    let runner = runner_for(&MockHost::healthy(), 8);
    let updates = drain(&runner).await;

    for pair in updates.chunks(2) {
        assert_eq!(pair[0].status, ProgressStatus::Running);
        assert!(pair[1].is_resolved());
        assert_eq!(pair[0].requirement, pair[1].requirement);
        assert_eq!(pair[0].validator, pair[1].validator);
    }
}

#[tokio::test]
async fn test_capacity_one_with_slow_consumer_loses_nothing() {
    let runner = runner_for(&MockHost::healthy(), 1);
    let mut progress = runner.progress().unwrap();

    let consumer = tokio::spawn(async move {
        let mut count = 0;
        while let Some(_update) = progress.recv().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
            count += 1;
        }
        count
    });

    runner.run(&CancellationToken::new()).await.unwrap();
    assert_eq!(consumer.await.unwrap(), 10);
}

#[tokio::test]
async fn test_consumer_reads_session_while_running() {
    let runner = runner_for(&MockHost::healthy().with_delay(Duration::from_millis(5)), 8);
    let mut progress = runner.progress().unwrap();
    let session = runner.session();

    let consumer = tokio::spawn(async move {
        let mut seen_counts = Vec::new();
        while let Some(update) = progress.recv().await {
            if update.is_resolved() {
                seen_counts.push(session.len());
                let _ = session.overall_result();
                let _ = session.can_proceed();
            }
        }
        seen_counts
    });

    runner.run(&CancellationToken::new()).await.unwrap();
    let seen_counts = consumer.await.unwrap();

    assert_eq!(seen_counts.len(), 5);
    assert!(seen_counts.windows(2).all(|w| w[0] <= w[1]));
    assert!(seen_counts.iter().all(|&n| (1..=5).contains(&n)));
}

#[tokio::test]
async fn test_progress_taken_once() {
    let runner = runner_for(&MockHost::healthy(), 8);
    assert!(runner.progress().is_some());
    assert!(runner.progress().is_none());
}

#[tokio::test]
async fn test_second_run_is_rejected() {
    let runner = runner_for(&MockHost::healthy(), 8);
    drop(runner.progress());

    runner.run(&CancellationToken::new()).await.unwrap();
    let err = runner.run(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, PreflightError::AlreadyRun));
    assert_eq!(runner.session().len(), 5);
    assert!(runner.session().is_completed());
}

#[tokio::test]
async fn test_dropped_receiver_does_not_stall_run() {
    let runner = runner_for(&MockHost::healthy(), 1);
    drop(runner.progress());

    tokio::time::timeout(Duration::from_secs(5), runner.run(&CancellationToken::new()))
        .await
        .expect("run finished")
        .unwrap();

    assert_eq!(runner.session().len(), 5);
}

#[tokio::test]
async fn test_deadline_cancels_slow_detectors() {
    let runner = runner_for(&MockHost::healthy().with_delay(Duration::from_secs(30)), 8);
    drop(runner.progress());

    let ctx = CancellationToken::new();
    let deadline = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        deadline.cancel();
    });

    let start = Instant::now();
    runner.run(&ctx).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    let session = runner.session();
    assert_eq!(session.len(), 5);
    assert_eq!(session.overall_result(), ValidationOutcome::Blocked);
    assert!(session
        .results()
        .iter()
        .all(|r| r.guidance().reason().contains("cancelled")));
}

#[tokio::test]
async fn test_completed_session_saved_to_repository() {
    let config = PreflightConfig::default();
    let repository = Arc::new(InMemorySessionRepository::new());
    let host = MockHost::healthy().with_available_bytes(2 * GB);
    let runner = Runner::new(build_orchestrator(&config, &host.ports()), 8)
        .with_repository(repository.clone());
    drop(runner.progress());

    runner.run(&CancellationToken::new()).await.unwrap();

    let id = runner.session().id();
    let saved = repository.find(id).unwrap().expect("session saved");
    assert_eq!(saved.overall_result, ValidationOutcome::Blocked);
    assert!(!saved.can_proceed);
    assert!(saved.completed_at.is_some());
    assert_eq!(saved.results.len(), 5);
    assert_eq!(saved.blocking_results().len(), 1);
    assert_eq!(repository.list().unwrap().len(), 1);
}
