// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supervisor tests against the scripted `sh` worker.

#![cfg(unix)]

use std::time::Duration;

use memlink_bridge::{BridgeOp, BridgeSupervisor, LaunchSpec};
use memlink_core::MemlinkError;
use memlink_test_utils::{FakeWorker, WorkerBehavior};
use tempfile::TempDir;

fn supervisor(behavior: WorkerBehavior, timeout: Duration) -> (BridgeSupervisor, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let worker = FakeWorker::write(dir.path(), behavior);
    let launch = LaunchSpec::new(worker.command(), worker.path());
    (BridgeSupervisor::new(launch, timeout, 50), dir)
}

#[tokio::test]
async fn first_call_starts_worker_and_publishes_session() {
    let (bridge, _dir) = supervisor(WorkerBehavior::Respond, Duration::from_secs(10));
    assert!(bridge.session_id().is_none());
    assert!(!bridge.is_running().await);

    let response = bridge.call(BridgeOp::Health, None).await.unwrap();
    assert!(response.ok);
    assert_eq!(response.op.as_deref(), Some("health"));
    assert!(response.field("bridge_instance_id").is_some());
    assert!(bridge.session_id().is_some());
    assert!(bridge.is_running().await);

    bridge.shutdown().await;
    assert!(bridge.session_id().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_first_calls_share_one_worker() {
    let (bridge, _dir) = supervisor(WorkerBehavior::Respond, Duration::from_secs(10));
    let bridge = std::sync::Arc::new(bridge);

    let calls: Vec<_> = (0..4)
        .map(|i| {
            let bridge = std::sync::Arc::clone(&bridge);
            let op = if i % 2 == 0 { BridgeOp::Health } else { BridgeOp::ListCategories };
            tokio::spawn(async move { bridge.call(op, None).await })
        })
        .collect();

    let mut instances = Vec::new();
    for call in calls {
        let response = call.await.unwrap().unwrap();
        instances.push(response.field("bridge_instance_id").cloned().unwrap());
    }
    instances.dedup();
    assert_eq!(instances.len(), 1, "expected one worker, got {instances:?}");
    bridge.shutdown().await;
}

#[tokio::test]
async fn noise_and_foreign_ids_do_not_disturb_calls() {
    let (bridge, _dir) = supervisor(WorkerBehavior::NoisyRespond, Duration::from_secs(10));
    let response = bridge.call(BridgeOp::ListCategories, None).await.unwrap();
    assert_eq!(response.result().unwrap()["op"], "list_categories");
    bridge.shutdown().await;
}

#[tokio::test]
async fn worker_reported_error_surfaces() {
    let (bridge, _dir) = supervisor(
        WorkerBehavior::ReportError("ValueError: no llm profile".into()),
        Duration::from_secs(10),
    );
    let err = bridge.call(BridgeOp::Memorize, None).await.unwrap_err();
    match err {
        MemlinkError::WorkerReported { op, message } => {
            assert_eq!(op, "memorize");
            assert!(message.contains("no llm profile"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(bridge.is_running().await);
    bridge.shutdown().await;
}

#[tokio::test]
async fn silent_worker_times_out() {
    let (bridge, _dir) = supervisor(WorkerBehavior::Silent, Duration::from_millis(300));
    let err = bridge.call(BridgeOp::Health, None).await.unwrap_err();
    assert!(matches!(err, MemlinkError::ProtocolTimeout { .. }), "{err:?}");
    assert!(bridge.is_running().await);
    bridge.shutdown().await;
}

#[tokio::test]
async fn crash_rejects_call_and_next_call_respawns() {
    let (bridge, dir) = supervisor(WorkerBehavior::CrashOnRequest(3), Duration::from_secs(10));
    let err = bridge.call(BridgeOp::Health, None).await.unwrap_err();
    assert!(matches!(err, MemlinkError::WorkerCrashed(_)), "{err:?}");
    let crashed_session = bridge.session_id().unwrap();

    let mut tail = Vec::new();
    for _ in 0..50 {
        tail = bridge.stderr_tail();
        if tail.iter().any(|l| l.contains("crashing")) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(tail.iter().any(|l| l.contains("crashing")), "{tail:?}");

    let worker = FakeWorker::write(dir.path(), WorkerBehavior::Respond);
    bridge.set_launch_spec(LaunchSpec::new(worker.command(), worker.path()).with_env("MEMLINK_TEST", "1"));
    bridge.call(BridgeOp::Health, None).await.unwrap();
    assert_ne!(bridge.session_id().unwrap(), crashed_session);
    bridge.shutdown().await;
}

#[tokio::test]
async fn changed_launch_spec_replaces_live_worker() {
    let (bridge, dir) = supervisor(WorkerBehavior::Respond, Duration::from_secs(10));
    let mut sessions = bridge.subscribe();

    bridge.call(BridgeOp::Health, None).await.unwrap();
    let first = bridge.session_id().unwrap();
    bridge.call(BridgeOp::Health, None).await.unwrap();
    assert_eq!(bridge.session_id().unwrap(), first);

    let spec = bridge.launch_spec().with_working_dir(dir.path());
    bridge.set_launch_spec(spec);
    bridge.call(BridgeOp::Health, None).await.unwrap();
    let second = bridge.session_id().unwrap();
    assert_ne!(second, first);

    assert!(sessions.has_changed().unwrap());
    assert_eq!(sessions.borrow_and_update().clone(), Some(second));
    bridge.shutdown().await;
}

#[tokio::test]
async fn missing_script_is_process_unavailable() {
    let bridge = BridgeSupervisor::new(
        LaunchSpec::new("sh", "/nonexistent/memu_st_bridge.py"),
        Duration::from_secs(1),
        10,
    );
    let err = bridge.call(BridgeOp::Health, None).await.unwrap_err();
    assert!(matches!(err, MemlinkError::ProcessUnavailable { .. }), "{err:?}");
    assert!(bridge.session_id().is_none());
}

#[tokio::test]
async fn missing_interpreter_is_process_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let worker = FakeWorker::write(dir.path(), WorkerBehavior::Respond);
    let bridge = BridgeSupervisor::new(
        LaunchSpec::new("/nonexistent/python3", worker.path()),
        Duration::from_secs(1),
        10,
    );
    let err = bridge.call(BridgeOp::Health, None).await.unwrap_err();
    assert!(matches!(err, MemlinkError::ProcessUnavailable { .. }), "{err:?}");
}

#[tokio::test]
async fn invalid_utf8_on_stderr_keeps_worker_alive() {
    let (bridge, _dir) = supervisor(WorkerBehavior::BinaryStderr, Duration::from_secs(10));

    for _ in 0..3 {
        let response = bridge.call(BridgeOp::Health, None).await.unwrap();
        assert!(response.ok);
    }
    assert!(bridge.is_running().await);

    let mut tail = Vec::new();
    for _ in 0..50 {
        tail = bridge.stderr_tail();
        if tail.iter().filter(|l| l.starts_with("bad ")).count() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(tail.contains(&"bad \u{FFFD} byte".to_string()), "{tail:?}");
    bridge.shutdown().await;
}
