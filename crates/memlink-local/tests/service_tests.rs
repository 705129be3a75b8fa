// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end service tests: host fixtures, the scripted worker, a mock catalog.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use memlink_bridge::{BridgeSupervisor, LaunchSpec};
use memlink_config::model::ServiceConfig;
use memlink_core::ModelKind;
use memlink_local::{
    DispatchRejection, LocalMemoryService, ModelListingCache, TaskId, TaskLookup, TaskStatus,
    TaskStore,
};
use memlink_profile::{HostLayout, ProfileResolver};
use memlink_test_utils::{FakeWorker, HostFixture, MockCatalog, WorkerBehavior};
use serde_json::json;
use tempfile::TempDir;

struct Harness {
    service: LocalMemoryService,
    catalog: MockCatalog,
    _host: HostFixture,
    _worker_dir: TempDir,
}

fn harness(behavior: WorkerBehavior) -> Harness {
    let host = HostFixture::new();
    host.write_settings(
        "default-user",
        &json!({"extension_settings": {"connectionManager": {"profiles": [
            {"id": "main", "name": "Main", "api": "openai", "model": "gpt-4o",
             "api-url": "http://127.0.0.1:5001"},
            {"id": "broken", "name": "Broken", "api": "custom", "model": "m"}
        ]}}}),
    )
    .write_secrets("default-user", &json!({"api_key_openai": "sk-test-0123456789"}));

    let worker_dir = tempfile::tempdir().unwrap();
    let worker = FakeWorker::write(worker_dir.path(), behavior);
    let bridge = BridgeSupervisor::new(
        LaunchSpec::new(worker.command(), worker.path()),
        Duration::from_secs(10),
        50,
    );

    let catalog = MockCatalog::new();
    let service = LocalMemoryService::new(
        ServiceConfig::default(),
        ProfileResolver::new(HostLayout::new(host.root(), Vec::new())),
        Arc::new(bridge),
        Arc::new(catalog.clone()),
        TaskStore::new(None),
        ModelListingCache::new(Duration::from_secs(600)),
    );
    Harness {
        service,
        catalog,
        _host: host,
        _worker_dir: worker_dir,
    }
}

async fn wait_terminal(service: &LocalMemoryService, id: &TaskId) -> memlink_local::LocalTask {
    for _ in 0..200 {
        if let TaskLookup::Found(task) = service.task_status(id)
            && task.status.is_terminal()
        {
            return task;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("task {id} did not finish");
}

fn conversation() -> serde_json::Value {
    json!([
        {"role": "system", "content": "ignored"},
        {"role": "user", "content": "I moved to Lisbon last spring."},
        {"role": "assistant", "content": "How do you like it?"}
    ])
}

#[tokio::test]
async fn memorize_succeeds_and_is_pollable() {
    let h = harness(WorkerBehavior::Respond);
    let id = h
        .service
        .dispatch_memorize("user-1", "agent-1", &conversation())
        .await
        .unwrap();

    let task = wait_terminal(&h.service, &id).await;
    assert_eq!(task.status, TaskStatus::Success);
    assert_eq!(task.result.unwrap()["op"], "memorize");
    assert_eq!(task.session_id, h.service.bridge().session_id());
    h.service.shutdown().await;
}

#[tokio::test]
async fn worker_error_becomes_task_failure() {
    let h = harness(WorkerBehavior::ReportError("RuntimeError: llm down".into()));
    let id = h
        .service
        .dispatch_memorize("user-1", "agent-1", &conversation())
        .await
        .unwrap();

    let task = wait_terminal(&h.service, &id).await;
    assert_eq!(task.status, TaskStatus::Failure);
    assert!(task.error.unwrap().contains("llm down"));
    h.service.shutdown().await;
}

#[tokio::test]
async fn empty_conversation_is_rejected_synchronously() {
    let h = harness(WorkerBehavior::Respond);
    let err = h
        .service
        .dispatch_memorize("u", "a", &json!([{"role": "system", "content": "x"}]))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchRejection::EmptyConversation));
    assert!(h.service.bridge().session_id().is_none());
}

#[tokio::test]
async fn unknown_task_is_unknown() {
    let h = harness(WorkerBehavior::Respond);
    assert!(matches!(h.service.task_status(&TaskId::from("missing")), TaskLookup::Unknown));
}

#[tokio::test]
async fn health_reports_session_and_details() {
    let h = harness(WorkerBehavior::Respond);
    let health = h.service.bridge_health().await;
    assert!(health.ok, "{:?}", health.error);
    assert!(health.session_id.is_some());
    assert!(health.details.contains_key("bridge_instance_id"));
    h.service.shutdown().await;
}

#[tokio::test]
async fn health_of_crashing_worker_is_not_ok() {
    let h = harness(WorkerBehavior::CrashOnRequest(1));
    let health = h.service.bridge_health().await;
    assert!(!health.ok);
    assert!(health.error.is_some());
}

#[tokio::test]
async fn categories_come_from_worker_result() {
    let h = harness(WorkerBehavior::Respond);
    let categories = h.service.list_categories().await.unwrap();
    assert_eq!(categories["op"], "list_categories");
    h.service.shutdown().await;
}

#[tokio::test]
async fn model_listing_is_cached_per_profile_and_kind() {
    let h = harness(WorkerBehavior::Respond);
    h.catalog.push_models(&["b", "a", "b"]).await;

    let first = h.service.list_models_for_profile("main", ModelKind::Llm, false).await;
    let second = h.service.list_models_for_profile("main", ModelKind::Llm, false).await;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.models, vec!["a", "b"]);
    assert_eq!(h.catalog.calls(), 1);

    h.service.list_models_for_profile("main", ModelKind::Llm, true).await;
    assert_eq!(h.catalog.calls(), 2);

    h.service.list_models_for_profile("main", ModelKind::Embedding, false).await;
    assert_eq!(h.catalog.calls(), 3);
}

#[tokio::test]
async fn model_listing_failures_are_reported_and_cached() {
    let h = harness(WorkerBehavior::Respond);

    let missing = h.service.list_models_for_profile("nope", ModelKind::Llm, false).await;
    assert!(!missing.ok);
    assert!(missing.message.as_deref().unwrap().contains("not found"));

    let broken = h.service.list_models_for_profile("broken", ModelKind::Llm, false).await;
    assert!(!broken.ok);
    assert!(broken.message.as_deref().unwrap().contains("base_url"));

    h.catalog.push_failure("upstream 500").await;
    let failed = h.service.list_models_for_profile("main", ModelKind::Llm, false).await;
    assert!(!failed.ok);
    let cached = h.service.list_models_for_profile("main", ModelKind::Llm, false).await;
    assert!(Arc::ptr_eq(&failed, &cached));
    assert_eq!(h.catalog.calls(), 1);
}

#[tokio::test]
async fn incomplete_llm_profile_rejects_dispatch() {
    let host = HostFixture::new();
    host.write_settings(
        "default-user",
        &json!([{"id": "broken", "name": "Broken", "api": "custom", "model": "m"}]),
    );
    let service = LocalMemoryService::new(
        ServiceConfig::default(),
        ProfileResolver::new(HostLayout::new(host.root(), Vec::new())),
        Arc::new(BridgeSupervisor::new(
            LaunchSpec::new("sh", "/nonexistent/worker.sh"),
            Duration::from_secs(1),
            10,
        )),
        Arc::new(MockCatalog::new()),
        TaskStore::new(None),
        ModelListingCache::new(Duration::from_secs(600)),
    );

    let err = service
        .dispatch_memorize("u", "a", &conversation())
        .await
        .unwrap_err();
    match err {
        DispatchRejection::IncompleteCredential { profile, message } => {
            assert_eq!(profile, "default");
            assert!(message.contains("api_key"));
        }
        other => panic!("unexpected rejection: {other:?}"),
    }

    let summary = service.connection_profiles_summary().await;
    assert_eq!(summary.profiles.len(), 1);
    let credential = service.resolve_profile_credentials("broken").await.unwrap();
    assert!(!credential.ok);
}
