//! Property tests for the bounded test history

use std::time::Duration;

use connhub_core::history::TestHistory;
use connhub_core::models::ConnectionTestResult;
use proptest::prelude::*;
use uuid::Uuid;

fn result(n: u64) -> ConnectionTestResult {
    ConnectionTestResult::success(format!("run {n}"), Duration::from_millis(n))
}

proptest! {
    /// Property: the log never exceeds its limit and keeps the newest entries
    #[test]
    fn keeps_newest_within_limit(limit in 1usize..20, pushes in 0u64..60, query in 0usize..30) {
        let mut history = TestHistory::new(limit);
        let id = Uuid::new_v4();
        for n in 0..pushes {
            history.push(id, result(n));
        }

        let kept = pushes.min(limit as u64) as usize;
        prop_assert_eq!(history.len(id), kept);

        let recent = history.recent(id, query);
        prop_assert_eq!(recent.len(), kept.min(query));
        let expected: Vec<String> = (0..pushes as usize)
            .rev()
            .take(recent.len())
            .rev()
            .map(|n| format!("run {n}"))
            .collect();
        let messages: Vec<String> = recent.into_iter().map(|r| r.message).collect();
        prop_assert_eq!(messages, expected);
    }

    /// Property: connections never see each other's results
    #[test]
    fn logs_are_per_connection(a_pushes in 0u64..10, b_pushes in 0u64..10) {
        let mut history = TestHistory::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        for n in 0..a_pushes {
            history.push(a, result(n));
        }
        for n in 0..b_pushes {
            history.push(b, result(n));
        }

        history.clear(a);
        prop_assert_eq!(history.len(a), 0);
        prop_assert_eq!(history.len(b), b_pushes as usize);
    }
}
