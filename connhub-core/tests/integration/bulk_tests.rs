//! Bulk health checks: concurrency cap, batch barrier and per-id results

use std::sync::Arc;
use std::time::Duration;

use connhub_core::health::BulkHealthChecker;
use connhub_core::models::{Connection, ConnectionStatus, ConnectionType};
use connhub_core::registry::{IN_PROGRESS_ERROR, INACTIVE_ERROR, NOT_FOUND_ERROR, NOT_RUN_MESSAGE};
use connhub_core::testing::{ConnectionTester, TestMode};
use tokio::time::Instant;
use uuid::Uuid;

use super::support::{Gate, ScriptedTransport, Step, form, registry};

fn connections(n: usize) -> Vec<Connection> {
    (0..n)
        .map(|i| {
            let mut conn = Connection::new(
                format!("svc-{i}"),
                ConnectionType::Api,
                "acme",
                format!("https://svc{i}.acme.test"),
            );
            conn.config.retry_attempts = 0;
            conn
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn never_exceeds_the_concurrency_cap() {
    for n in [1, 3, 5, 7, 12] {
        let transport = Arc::new(
            ScriptedTransport::new(Step::Status(200)).with_latency(Duration::from_millis(100)),
        );
        let checker = BulkHealthChecker::new(ConnectionTester::new(transport.clone()));

        let conns = connections(n);
        let results = checker.check(&conns, TestMode::HealthCheck).await;

        assert_eq!(results.len(), n);
        assert_eq!(transport.calls(), n);
        assert_eq!(transport.peak_concurrency(), n.min(5), "n = {n}");
    }
}

#[tokio::test(start_paused = true)]
async fn results_come_back_in_input_order() {
    let transport = Arc::new(ScriptedTransport::new(Step::Status(200)));
    let checker = BulkHealthChecker::new(ConnectionTester::new(transport)).with_concurrency(3);

    let conns = connections(8);
    let results = checker.check(&conns, TestMode::OnDemand).await;

    let ids: Vec<Uuid> = results.iter().map(|(id, _)| *id).collect();
    let expected: Vec<Uuid> = conns.iter().map(|c| c.id).collect();
    assert_eq!(ids, expected);
}

#[tokio::test(start_paused = true)]
async fn next_batch_waits_for_the_slowest_test() {
    let conns = connections(6);
    let slow = conns[0].config.base_url.clone();
    let transport = Arc::new(
        ScriptedTransport::new(Step::Status(200))
            .with_latency(Duration::from_millis(100))
            .script(
                &slow,
                [Step::TimedOut {
                    after: Duration::from_secs(2),
                }],
            ),
    );
    let checker = BulkHealthChecker::new(ConnectionTester::new(transport.clone()));

    let start = Instant::now();
    let results = checker.check(&conns, TestMode::OnDemand).await;
    let elapsed = start.elapsed();

    // batch one is held by the 2s test, batch two takes 100ms
    assert!(elapsed >= Duration::from_millis(2100), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(2500), "{elapsed:?}");
    assert!(!results[0].1.success);
    assert!(results[1..].iter().all(|(_, r)| r.success));
}

#[tokio::test(start_paused = true)]
async fn registry_bulk_gives_every_id_a_result() {
    let transport = Arc::new(
        ScriptedTransport::new(Step::Status(200))
            .script("https://down.acme.test", [Step::Status(500)]),
    );
    let registry = registry(transport.clone());

    let up = registry.create(form("up", "https://up.acme.test")).await.unwrap();
    let down = registry
        .create(form("down", "https://down.acme.test"))
        .await
        .unwrap();
    let off = registry
        .create(form("off", "https://off.acme.test").with_active(false))
        .await
        .unwrap();
    let ghost = Uuid::new_v4();

    let report = registry
        .test_connections(&[up.id, down.id, off.id, ghost, up.id], TestMode::OnDemand)
        .await;

    assert_eq!(report.total(), 4);
    assert_eq!(report.healthy, 1);
    assert_eq!(report.failed, 3);
    assert_eq!(report.summary_line(), "1/4 connections healthy");
    assert_eq!(transport.calls(), 2);

    assert!(report.get(&up.id).unwrap().success);
    let not_found = report.get(&ghost).unwrap();
    assert_eq!(not_found.message, NOT_RUN_MESSAGE);
    assert_eq!(not_found.error.as_deref(), Some(NOT_FOUND_ERROR));
    assert_eq!(
        report.get(&off.id).unwrap().error.as_deref(),
        Some(INACTIVE_ERROR)
    );

    assert_eq!(registry.get(up.id).await.unwrap().status, ConnectionStatus::Active);
    assert_eq!(registry.get(down.id).await.unwrap().status, ConnectionStatus::Error);
    assert_eq!(registry.get(off.id).await.unwrap().status, ConnectionStatus::Inactive);
}

#[tokio::test]
async fn bulk_skips_connections_already_under_test() {
    let gate = Arc::new(Gate::default());
    let transport = Arc::new(ScriptedTransport::new(Step::Status(200)).with_gate(gate.clone()));
    let registry = Arc::new(registry(transport.clone()));
    let conn = registry.create(form("busy", "https://busy.acme.test")).await.unwrap();

    let single = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.test_connection(conn.id).await })
    };
    gate.entered().await;

    let report = registry.test_connections(&[conn.id], TestMode::OnDemand).await;
    assert_eq!(
        report.get(&conn.id).unwrap().error.as_deref(),
        Some(IN_PROGRESS_ERROR)
    );

    gate.open();
    let result = single.await.unwrap().unwrap();
    assert!(result.success);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn due_health_checks_feed_the_bulk_run() {
    let transport = Arc::new(ScriptedTransport::new(Step::Status(200)));
    let registry = registry(transport.clone());

    let first = registry.create(form("a", "https://a.acme.test")).await.unwrap();
    let second = registry.create(form("b", "https://b.acme.test")).await.unwrap();
    let mut disabled = form("c", "https://c.acme.test");
    disabled.health_check.enabled = false;
    registry.create(disabled).await.unwrap();

    let now = chrono::Utc::now();
    let due = registry.due_health_checks(now).await.unwrap();
    assert_eq!(due.len(), 2);
    assert!(due.contains(&first.id) && due.contains(&second.id));

    let report = registry.run_due_health_checks(now).await.unwrap();
    assert!(report.all_healthy());
    assert_eq!(report.total(), 2);

    // just tested, so nothing is due until the interval elapses
    let later = chrono::Utc::now();
    assert!(registry.due_health_checks(later).await.unwrap().is_empty());
    let much_later = later + chrono::Duration::minutes(61);
    assert_eq!(registry.due_health_checks(much_later).await.unwrap().len(), 2);
}

#[tokio::test]
async fn bulk_drops_results_for_connections_changed_mid_run() {
    let gate = Arc::new(Gate::default());
    let transport = Arc::new(ScriptedTransport::new(Step::Status(200)).with_gate(gate.clone()));
    let registry = Arc::new(registry(transport.clone()));

    let mut ids = Vec::new();
    for name in ["a", "b", "c", "d"] {
        let url = format!("https://{name}.acme.test");
        ids.push(registry.create(form(name, &url)).await.unwrap().id);
    }
    let (kept, deleted, disabled, other) = (ids[0], ids[1], ids[2], ids[3]);

    let run = {
        let registry = Arc::clone(&registry);
        let ids = ids.clone();
        tokio::spawn(async move { registry.test_connections(&ids, TestMode::OnDemand).await })
    };
    gate.entered().await;

    registry.delete(deleted).await.unwrap();
    registry.set_active(disabled, false).await.unwrap();
    gate.open();

    let report = run.await.unwrap();
    assert_eq!(report.total(), 4);
    assert!(report.all_healthy());
    assert_eq!(transport.calls(), 4);

    for id in [kept, other] {
        let stored = registry.get(id).await.unwrap();
        assert_eq!(stored.status, ConnectionStatus::Active);
        assert_eq!(stored.success_count, 1);
        assert_eq!(registry.history(id, 10).await.unwrap().len(), 1);
    }

    assert!(registry.get(deleted).await.is_err());
    let off = registry.get(disabled).await.unwrap();
    assert_eq!(off.status, ConnectionStatus::Inactive);
    assert_eq!(off.success_count, 0);
    assert!(off.last_tested.is_none());
    assert!(registry.history(disabled, 10).await.unwrap().is_empty());
    assert!(ids.iter().all(|&id| !registry.is_testing(id)));
}
