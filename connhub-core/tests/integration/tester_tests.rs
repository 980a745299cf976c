//! Connection tester behaviour against a scripted transport

use std::sync::Arc;

use connhub_core::models::{Connection, ConnectionType, Credentials, HttpMethod};
use connhub_core::testing::{ConnectionTester, FAILURE_MESSAGE, TestMode, TestOverrides};

use super::support::{ScriptedTransport, Step};

const URL: &str = "https://api.acme.test";

fn connection(retries: u32, delay: u64) -> Connection {
    let mut conn = Connection::new("svc", ConnectionType::Api, "acme", URL);
    conn.config.retry_attempts = retries;
    conn.config.retry_delay = delay;
    conn
}

#[tokio::test(start_paused = true)]
async fn fails_twice_then_succeeds() {
    let transport = Arc::new(
        ScriptedTransport::new(Step::Status(200))
            .script(URL, [Step::Status(503), Step::Refused, Step::Status(200)]),
    );
    let tester = ConnectionTester::new(transport.clone());

    let result = tester.test(&connection(2, 1), TestMode::OnDemand).await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.attempts, 3);
    assert_eq!(transport.calls(), 3);
    assert!(result.response_time.unwrap() >= 2.0);
    assert_eq!(result.status_code, Some(200));
}

#[tokio::test(start_paused = true)]
async fn client_errors_are_never_retried() {
    for status in [400, 401, 403, 404, 422] {
        let transport = Arc::new(ScriptedTransport::new(Step::Status(status)));
        let tester = ConnectionTester::new(transport.clone());

        let result = tester.test(&connection(5, 1), TestMode::OnDemand).await;

        assert!(!result.success);
        assert_eq!(result.attempts, 1, "status {status} was retried");
        assert_eq!(transport.calls(), 1);
        assert_eq!(result.status_code, Some(status));
        assert_eq!(result.message, FAILURE_MESSAGE);
    }
}

#[tokio::test(start_paused = true)]
async fn each_attempt_is_bounded_by_the_timeout() {
    let transport = Arc::new(ScriptedTransport::new(Step::Hang));
    let tester = ConnectionTester::new(transport.clone());
    let mut conn = connection(1, 1);
    conn.config.timeout = 2;

    let result = tester.test(&conn, TestMode::OnDemand).await;

    assert!(!result.success);
    assert_eq!(result.attempts, 2);
    assert_eq!(result.error.as_deref(), Some("Connection timeout after 2 seconds"));
    // two timed-out attempts plus one delay
    let elapsed = result.response_time.unwrap();
    assert!((5.0..5.5).contains(&elapsed), "elapsed {elapsed}");
}

#[tokio::test(start_paused = true)]
async fn health_check_mode_uses_health_timeout() {
    let transport = Arc::new(ScriptedTransport::new(Step::Hang));
    let tester = ConnectionTester::new(transport);
    let mut conn = connection(0, 0);
    conn.config.timeout = 30;
    conn.health_check.timeout = 3;

    let result = tester.test(&conn, TestMode::HealthCheck).await;

    assert_eq!(result.error.as_deref(), Some("Connection timeout after 3 seconds"));
}

#[tokio::test]
async fn expected_status_mismatch_is_definitive() {
    let transport = Arc::new(ScriptedTransport::new(Step::Status(200)));
    let tester = ConnectionTester::new(transport.clone());
    let mut conn = connection(3, 0);
    conn.health_check.expected_status = Some(204);

    let result = tester.test(&conn, TestMode::OnDemand).await;

    assert!(!result.success);
    assert_eq!(transport.calls(), 1);
    assert_eq!(
        result.error.as_deref(),
        Some("Unexpected status: expected 204, got 200")
    );
}

#[tokio::test]
async fn health_endpoint_and_overrides_pick_the_target() {
    let transport = Arc::new(ScriptedTransport::new(Step::Status(200)));
    let tester = ConnectionTester::new(transport.clone());
    let mut conn = connection(0, 0);
    conn.health_check.endpoint = Some("/health".into());
    conn.credentials = Credentials::bearer("t0ken");

    tester.test(&conn, TestMode::HealthCheck).await;
    let overrides = TestOverrides {
        endpoint: Some("https://status.acme.test/ping".into()),
        method: Some(HttpMethod::Head),
    };
    tester.test_with(&conn, TestMode::OnDemand, &overrides).await;

    assert_eq!(
        transport.seen(),
        vec![
            format!("{URL}/health"),
            "https://status.acme.test/ping".to_string()
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn attempts_never_exceed_retries_plus_one() {
    let transport = Arc::new(ScriptedTransport::new(Step::Status(502)));
    let tester = ConnectionTester::new(transport.clone());

    let result = tester.test(&connection(4, 2), TestMode::OnDemand).await;

    assert_eq!(result.attempts, 5);
    assert_eq!(transport.calls(), 5);
    assert!(result.response_time.unwrap() >= 8.0);
}
