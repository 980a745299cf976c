//! Registry façade: CRUD, single tests, stale results and read models

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use connhub_core::error::ConnHubError;
use connhub_core::models::{
    ConnectionStatus, ConnectionType, ConnectionUpdate, Credentials,
};
use connhub_core::registry::ABANDONED_ERROR;
use connhub_core::store::{ConnectionQuery, MemoryConnectionStore};
use connhub_core::testing::{ConnectionTester, TestOverrides};
use connhub_core::ConnectionRegistry;
use uuid::Uuid;

use super::support::{
    CountingStore, FlakyStore, Gate, ScriptedTransport, Step, form, registry,
};

#[tokio::test(start_paused = true)]
async fn timeouts_then_success_marks_connection_active() {
    let url = "https://slow.acme.test";
    let half = Duration::from_millis(500);
    let transport = Arc::new(ScriptedTransport::new(Step::Status(500)).script(
        url,
        [
            Step::TimedOut { after: half },
            Step::TimedOut { after: half },
            Step::Status(200),
        ],
    ));
    let registry = registry(transport.clone());

    let mut input = form("slow", url);
    input.config = input.config.with_timeout(30).with_retries(3, 1);
    let conn = registry.create(input).await.unwrap();
    assert_eq!(conn.status, ConnectionStatus::Pending);

    let result = registry.test_connection(conn.id).await.unwrap();

    assert!(result.success);
    assert_eq!(result.attempts, 3);
    let elapsed = result.response_time.unwrap();
    assert!((2.9..3.2).contains(&elapsed), "elapsed {elapsed}");

    let stored = registry.get(conn.id).await.unwrap();
    assert_eq!(stored.status, ConnectionStatus::Active);
    assert_eq!(stored.success_count, 1);
    assert_eq!(stored.error_count, 0);
    assert!(stored.last_connected.is_some());
    assert!(stored.last_tested.is_some());
}

#[tokio::test]
async fn failed_test_marks_connection_error() {
    let transport = Arc::new(ScriptedTransport::new(Step::Status(401)));
    let registry = registry(transport);
    let conn = registry.create(form("auth", "https://auth.acme.test")).await.unwrap();

    let result = registry.test_connection(conn.id).await.unwrap();

    assert!(!result.success);
    let stored = registry.get(conn.id).await.unwrap();
    assert_eq!(stored.status, ConnectionStatus::Error);
    assert_eq!(stored.error_count, 1);
    assert!(stored.last_connected.is_none());
}

#[tokio::test]
async fn second_concurrent_test_is_rejected() {
    let gate = Arc::new(Gate::default());
    let transport = Arc::new(ScriptedTransport::new(Step::Status(200)).with_gate(gate.clone()));
    let registry = Arc::new(registry(transport.clone()));
    let conn = registry.create(form("svc", "https://svc.acme.test")).await.unwrap();

    let first = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.test_connection(conn.id).await })
    };
    gate.entered().await;
    assert!(registry.is_testing(conn.id));
    assert_eq!(
        registry.get(conn.id).await.unwrap().status,
        ConnectionStatus::Testing
    );

    let err = registry.test_connection(conn.id).await.unwrap_err();
    assert!(matches!(err, ConnHubError::TestInProgress(id) if id == conn.id));

    gate.open();
    assert!(first.await.unwrap().unwrap().success);
    assert!(!registry.is_testing(conn.id));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn inactive_connection_is_not_tested() {
    let transport = Arc::new(ScriptedTransport::new(Step::Status(200)));
    let registry = registry(transport.clone());
    let conn = registry
        .create(form("off", "https://off.acme.test").with_active(false))
        .await
        .unwrap();

    let err = registry.test_connection(conn.id).await.unwrap_err();

    assert!(matches!(err, ConnHubError::Inactive(_)));
    assert_eq!(transport.calls(), 0);
    assert_eq!(
        registry.get(conn.id).await.unwrap().status,
        ConnectionStatus::Inactive
    );
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let registry = registry(Arc::new(ScriptedTransport::new(Step::Status(200))));
    let id = Uuid::new_v4();

    assert!(matches!(
        registry.test_connection(id).await,
        Err(ConnHubError::NotFound(found)) if found == id
    ));
    assert!(matches!(registry.delete(id).await, Err(ConnHubError::NotFound(_))));
    assert!(matches!(
        registry.update(id, ConnectionUpdate::default()).await,
        Err(ConnHubError::NotFound(_))
    ));
    assert!(matches!(registry.history(id, 10).await, Err(ConnHubError::NotFound(_))));
}

#[tokio::test]
async fn validation_fails_before_any_store_call() {
    let store = Arc::new(CountingStore::default());
    let transport = Arc::new(ScriptedTransport::new(Step::Status(200)));
    let registry = ConnectionRegistry::new(store.clone(), ConnectionTester::new(transport));

    let mut zero_timeout = form("svc", "https://svc.acme.test");
    zero_timeout.config.timeout = 0;
    let missing_key = form("svc", "https://svc.acme.test").with_credentials(Credentials::api_key(""));
    let bad_url = form("svc", "not a url");
    let no_name = form("   ", "https://svc.acme.test");

    for input in [zero_timeout, missing_key, bad_url, no_name] {
        let err = registry.create(input).await.unwrap_err();
        assert!(matches!(err, ConnHubError::Validation(_)), "{err}");
    }

    let update = ConnectionUpdate {
        name: Some(String::new()),
        ..ConnectionUpdate::default()
    };
    let err = registry.update(Uuid::new_v4(), update).await.unwrap_err();
    assert!(matches!(err, ConnHubError::Validation(_)));

    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn result_for_deleted_connection_is_discarded() {
    let gate = Arc::new(Gate::default());
    let transport = Arc::new(ScriptedTransport::new(Step::Status(200)).with_gate(gate.clone()));
    let registry = Arc::new(registry(transport));
    let conn = registry.create(form("gone", "https://gone.acme.test")).await.unwrap();

    let pending = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.test_connection(conn.id).await })
    };
    gate.entered().await;

    registry.delete(conn.id).await.unwrap();
    gate.open();

    // the caller still gets its result
    assert!(pending.await.unwrap().unwrap().success);
    assert!(matches!(registry.get(conn.id).await, Err(ConnHubError::NotFound(_))));
    assert!(!registry.is_testing(conn.id));
}

#[tokio::test]
async fn result_after_deactivation_does_not_touch_state() {
    let gate = Arc::new(Gate::default());
    let transport = Arc::new(ScriptedTransport::new(Step::Status(200)).with_gate(gate.clone()));
    let registry = Arc::new(registry(transport));
    let conn = registry.create(form("svc", "https://svc.acme.test")).await.unwrap();

    let pending = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.test_connection(conn.id).await })
    };
    gate.entered().await;

    let off = registry.set_active(conn.id, false).await.unwrap();
    assert_eq!(off.status, ConnectionStatus::Inactive);
    // reactivating before the stale result lands must not let it apply
    let on = registry.set_active(conn.id, true).await.unwrap();
    assert_eq!(on.status, ConnectionStatus::Pending);

    gate.open();
    assert!(pending.await.unwrap().unwrap().success);

    let stored = registry.get(conn.id).await.unwrap();
    assert_eq!(stored.status, ConnectionStatus::Pending);
    assert_eq!(stored.success_count, 0);
    assert!(stored.last_tested.is_none());
    // discarded results stay out of history and stats
    assert!(registry.history(conn.id, 10).await.unwrap().is_empty());
    let stats = registry.stats(Utc::now()).await.unwrap();
    assert_eq!(stats.average_response_time, None);
}

#[tokio::test]
async fn store_failure_while_recording_does_not_wedge_the_connection() {
    // begin reads once, the second read is the write-back of the result
    let store = Arc::new(FlakyStore::failing_get(2));
    let transport = Arc::new(ScriptedTransport::new(Step::Status(200)));
    let registry = ConnectionRegistry::new(store, ConnectionTester::new(transport.clone()));
    let conn = registry.create(form("svc", "https://svc.acme.test")).await.unwrap();

    let err = registry.test_connection(conn.id).await.unwrap_err();
    assert!(matches!(err, ConnHubError::Store(_)), "{err}");
    assert!(!registry.is_testing(conn.id));
    assert_eq!(
        registry.get(conn.id).await.unwrap().status,
        ConnectionStatus::Testing
    );

    let later = Utc::now() + chrono::Duration::days(30);
    assert_eq!(registry.due_health_checks(later).await.unwrap(), vec![conn.id]);

    let result = registry.test_connection(conn.id).await.unwrap();
    assert!(result.success);
    assert_eq!(transport.calls(), 2);

    let stored = registry.get(conn.id).await.unwrap();
    assert_eq!(stored.status, ConnectionStatus::Active);
    assert_eq!(stored.error_count, 1);
    assert_eq!(stored.success_count, 1);

    let history = registry.history(conn.id, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].error.as_deref(), Some(ABANDONED_ERROR));
    assert!(history[1].success);
}

#[tokio::test]
async fn form_test_touches_no_state() {
    let store = Arc::new(CountingStore::default());
    let transport = Arc::new(
        ScriptedTransport::new(Step::Status(200))
            .script("https://down.acme.test", [Step::Status(503)]),
    );
    let registry = ConnectionRegistry::new(store.clone(), ConnectionTester::new(transport.clone()));

    let up = registry
        .test_form(&form("up", "https://up.acme.test"), &TestOverrides::default())
        .await
        .unwrap();
    assert!(up.success);

    let down = registry
        .test_form(&form("down", "https://down.acme.test"), &TestOverrides::default())
        .await
        .unwrap();
    assert!(!down.success);
    assert_eq!(down.status_code, Some(503));

    let err = registry
        .test_form(&form("bad", "not a url"), &TestOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConnHubError::Validation(_)));

    assert_eq!(transport.calls(), 2);
    assert_eq!(store.calls(), 0);
    assert!(registry.stats(Utc::now()).await.unwrap().average_response_time.is_none());
}

#[tokio::test]
async fn update_and_activation_follow_the_state_machine() {
    let registry = registry(Arc::new(ScriptedTransport::new(Step::Status(200))));
    let conn = registry.create(form("svc", "https://svc.acme.test")).await.unwrap();

    let update = ConnectionUpdate {
        name: Some("renamed".into()),
        is_active: Some(false),
        ..ConnectionUpdate::default()
    };
    let updated = registry.update(conn.id, update).await.unwrap();
    assert_eq!(updated.name, "renamed");
    assert!(!updated.is_active);
    assert_eq!(updated.status, ConnectionStatus::Inactive);

    // same value again is a no-op
    let again = registry.set_active(conn.id, false).await.unwrap();
    assert_eq!(again.status, ConnectionStatus::Inactive);

    let back = registry.set_active(conn.id, true).await.unwrap();
    assert!(back.is_active);
    assert_eq!(back.status, ConnectionStatus::Pending);
    assert_eq!(back.created_at, conn.created_at);
}

#[tokio::test]
async fn history_is_bounded_and_cleared_on_delete() {
    let transport = Arc::new(ScriptedTransport::new(Step::Status(200)));
    let registry = registry(transport).with_history_limit(3);
    let conn = registry.create(form("svc", "https://svc.acme.test")).await.unwrap();

    for _ in 0..5 {
        registry.test_connection(conn.id).await.unwrap();
    }
    let history = registry.history(conn.id, 10).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(registry.history(conn.id, 1).await.unwrap().len(), 1);

    registry.delete(conn.id).await.unwrap();
    let recreated = registry.create(form("svc", "https://svc.acme.test")).await.unwrap();
    assert!(registry.history(recreated.id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn stats_on_empty_registry_are_zero() {
    let registry = registry(Arc::new(ScriptedTransport::new(Step::Status(200))));

    let stats = registry.stats(Utc::now()).await.unwrap();

    assert_eq!(stats.total, 0);
    assert_eq!(stats.by_status.total(), 0);
    assert!(stats.uptime.abs() < f64::EPSILON);
    assert!(stats.average_response_time.is_none());
    assert!(stats.recently_used.is_empty());
    assert!(stats.by_type.values().all(|&n| n == 0));
}

#[tokio::test]
async fn stats_reflect_tested_connections() {
    let transport = Arc::new(
        ScriptedTransport::new(Step::Status(200))
            .script("https://down.acme.test", [Step::Status(404)]),
    );
    let registry = registry(transport);
    let up = registry.create(form("up", "https://up.acme.test")).await.unwrap();
    let down = registry.create(form("down", "https://down.acme.test")).await.unwrap();
    let mut db = form("db", "https://db.acme.test");
    db.connection_type = ConnectionType::Database;
    registry.create(db).await.unwrap();

    registry.test_connection(up.id).await.unwrap();
    registry.test_connection(down.id).await.unwrap();

    let stats = registry.stats(Utc::now()).await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_status.active, 1);
    assert_eq!(stats.by_status.error, 1);
    assert_eq!(stats.by_status.pending, 1);
    assert_eq!(stats.count_for_type(ConnectionType::Api), 2);
    assert_eq!(stats.count_for_type(ConnectionType::Database), 1);
    assert!((stats.uptime - 100.0 / 3.0).abs() < 1e-9);
    assert!(stats.average_response_time.is_some());
    assert_eq!(stats.recently_used, vec![up.id]);
}

#[tokio::test]
async fn list_filters_and_paginates() {
    let store = Arc::new(MemoryConnectionStore::new());
    let registry = ConnectionRegistry::new(
        store,
        ConnectionTester::new(Arc::new(ScriptedTransport::new(Step::Status(200)))),
    );
    for i in 0..7 {
        let mut input = form(&format!("svc-{i}"), "https://svc.acme.test");
        if i % 2 == 0 {
            input.provider = "Stripe".into();
        }
        registry.create(input).await.unwrap();
    }

    let page = registry
        .list(&ConnectionQuery::page(1, 3).with_provider("stripe"))
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.connections.len(), 3);
    assert!(page.has_more());

    let page = registry
        .list(&ConnectionQuery::default().with_search("SVC-3"))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.connections[0].name, "svc-3");
}

#[tokio::test]
async fn templates_are_stable() {
    let registry = registry(Arc::new(ScriptedTransport::new(Step::Status(200))));
    assert_eq!(registry.list_templates(), registry.list_templates());
    assert!(!registry.list_templates().is_empty());
}
