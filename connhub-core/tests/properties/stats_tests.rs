//! Property tests for dashboard statistics

use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use connhub_core::history::TestHistory;
use connhub_core::models::{Connection, ConnectionStatus, ConnectionTestResult, ConnectionType};
use connhub_core::stats::compute_stats;
use proptest::prelude::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
}

fn connection_strategy() -> impl Strategy<Value = Connection> {
    (
        prop::sample::select(ConnectionType::ALL.to_vec()),
        prop::sample::select(ConnectionStatus::ALL.to_vec()),
        prop::option::of(0i64..72),
    )
        .prop_map(|(connection_type, status, hours_ago)| {
            let mut conn = Connection::new("svc", connection_type, "acme", "https://acme.test");
            conn.status = status;
            conn.is_active = status != ConnectionStatus::Inactive;
            conn.last_connected = hours_ago.map(|h| now() - ChronoDuration::hours(h));
            conn
        })
}

proptest! {
    /// Property: counts partition the set and uptime stays within 0..=100
    #[test]
    fn counts_partition_the_set(conns in prop::collection::vec(connection_strategy(), 0..40)) {
        let stats = compute_stats(&conns, &TestHistory::default(), now());

        prop_assert_eq!(stats.total, conns.len());
        prop_assert_eq!(stats.by_status.total(), conns.len());
        prop_assert_eq!(stats.by_type.values().sum::<usize>(), conns.len());
        prop_assert_eq!(stats.by_type.len(), ConnectionType::ALL.len());
        prop_assert!((0.0..=100.0).contains(&stats.uptime));

        for status in ConnectionStatus::ALL {
            let expected = conns.iter().filter(|c| c.status == status).count();
            prop_assert_eq!(stats.by_status.get(status), expected);
        }
    }

    /// Property: uptime ignores connections under test
    #[test]
    fn uptime_excludes_testing(conns in prop::collection::vec(connection_strategy(), 0..40)) {
        let stats = compute_stats(&conns, &TestHistory::default(), now());
        let active = conns.iter().filter(|c| c.status == ConnectionStatus::Active).count();
        let counted = conns
            .iter()
            .filter(|c| c.status != ConnectionStatus::Testing)
            .count();

        if counted == 0 {
            prop_assert_eq!(stats.uptime, 0.0);
        } else {
            let expected = active as f64 / counted as f64 * 100.0;
            prop_assert!((stats.uptime - expected).abs() < 1e-9);
        }
    }

    /// Property: recently used holds exactly the last 24h, newest first
    #[test]
    fn recently_used_window(conns in prop::collection::vec(connection_strategy(), 0..40)) {
        let stats = compute_stats(&conns, &TestHistory::default(), now());
        let expected = conns
            .iter()
            .filter(|c| c.last_connected.is_some_and(|at| now() - at <= ChronoDuration::hours(24)))
            .count();

        prop_assert_eq!(stats.recently_used.len(), expected);
        let times: Vec<_> = stats
            .recently_used
            .iter()
            .map(|id| conns.iter().find(|c| c.id == *id).unwrap().last_connected)
            .collect();
        prop_assert!(times.windows(2).all(|w| w[0] >= w[1]));
    }

    /// Property: the average is the mean of each latest successful result
    #[test]
    fn average_uses_latest_success(latencies in prop::collection::vec(1u64..5_000, 1..10)) {
        let conns: Vec<Connection> = latencies
            .iter()
            .map(|_| Connection::new("svc", ConnectionType::Api, "acme", "https://acme.test"))
            .collect();
        let mut history = TestHistory::default();
        for (conn, ms) in conns.iter().zip(&latencies) {
            history.push(conn.id, ConnectionTestResult::success("ok", Duration::from_secs(60)));
            history.push(conn.id, ConnectionTestResult::success("ok", Duration::from_millis(*ms)));
            history.push(conn.id, ConnectionTestResult::failure("failed", "boom"));
        }

        let stats = compute_stats(&conns, &history, now());
        let expected =
            latencies.iter().map(|ms| *ms as f64 / 1000.0).sum::<f64>() / latencies.len() as f64;
        prop_assert!((stats.average_response_time.unwrap() - expected).abs() < 1e-9);
    }
}

#[test]
fn empty_set_is_all_zero() {
    let stats = compute_stats(&[], &TestHistory::default(), now());
    assert_eq!(stats.total, 0);
    assert_eq!(stats.uptime, 0.0);
    assert!(stats.average_response_time.is_none());
    assert!(stats.recently_used.is_empty());
}
