//! Property tests for the connection status state machine

use std::time::Duration;

use connhub_core::models::{Connection, ConnectionStatus, ConnectionTestResult, ConnectionType};
use connhub_core::state::{
    StatusEvent, apply_event, apply_result, derive_status, is_legal_edge, next_status,
};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Start,
    Succeed,
    Fail,
    Deactivate,
    Reactivate,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Start),
        2 => Just(Op::Succeed),
        2 => Just(Op::Fail),
        1 => Just(Op::Deactivate),
        1 => Just(Op::Reactivate),
    ]
}

fn status_strategy() -> impl Strategy<Value = ConnectionStatus> {
    prop::sample::select(ConnectionStatus::ALL.to_vec())
}

fn event_strategy() -> impl Strategy<Value = StatusEvent> {
    prop::sample::select(StatusEvent::ALL.to_vec())
}

fn fresh() -> Connection {
    Connection::new("svc", ConnectionType::Api, "acme", "https://api.acme.test")
}

fn run(connection: &mut Connection, op: Op) -> bool {
    match op {
        Op::Start => apply_event(connection, StatusEvent::TestStarted).is_ok(),
        Op::Deactivate => apply_event(connection, StatusEvent::Deactivated).is_ok(),
        Op::Reactivate => apply_event(connection, StatusEvent::Reactivated).is_ok(),
        Op::Succeed => {
            let result = ConnectionTestResult::success("ok", Duration::from_millis(5));
            apply_result(connection, &result).is_ok()
        }
        Op::Fail => {
            let result = ConnectionTestResult::failure("failed", "boom");
            apply_result(connection, &result).is_ok()
        }
    }
}

proptest! {
    /// Property: every accepted step follows a table edge; rejected steps
    /// leave the connection unchanged
    #[test]
    fn only_table_edges_are_reachable(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut connection = fresh();
        for op in ops {
            let before = connection.clone();
            if run(&mut connection, op) {
                prop_assert!(
                    is_legal_edge(before.status, connection.status),
                    "{:?} -> {:?} via {:?}", before.status, connection.status, op
                );
            } else {
                prop_assert_eq!(before.status, connection.status);
                prop_assert_eq!(before.is_active, connection.is_active);
                prop_assert_eq!(before.success_count, connection.success_count);
                prop_assert_eq!(before.error_count, connection.error_count);
            }
        }
    }

    /// Property: an inactive connection is never active or testing
    #[test]
    fn inactive_is_never_active_or_testing(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut connection = fresh();
        for op in ops {
            run(&mut connection, op);
            if !connection.is_active {
                prop_assert_eq!(connection.status, ConnectionStatus::Inactive);
            }
            prop_assert_eq!(
                connection.is_active,
                connection.status != ConnectionStatus::Inactive
            );
        }
    }

    /// Property: counters only move on applied results
    #[test]
    fn counters_track_applied_results(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut connection = fresh();
        let (mut successes, mut failures) = (0u64, 0u64);
        for op in ops {
            if run(&mut connection, op) {
                match op {
                    Op::Succeed => successes += 1,
                    Op::Fail => failures += 1,
                    _ => {}
                }
            }
        }
        prop_assert_eq!(connection.success_count, successes);
        prop_assert_eq!(connection.error_count, failures);
    }

    /// Property: `next_status` and `is_legal_edge` agree
    #[test]
    fn next_status_edges_are_legal(from in status_strategy(), event in event_strategy()) {
        if let Ok(to) = next_status(from, event) {
            prop_assert!(is_legal_edge(from, to));
        }
    }

    /// Property: the derived status respects the administrative flag
    #[test]
    fn derived_status_respects_active_flag(
        is_active in any::<bool>(),
        last in prop::option::of(any::<bool>()),
        in_flight in any::<bool>(),
    ) {
        let status = derive_status(is_active, last, in_flight);
        if is_active {
            prop_assert_ne!(status, ConnectionStatus::Inactive);
        } else {
            prop_assert_eq!(status, ConnectionStatus::Inactive);
        }
    }
}

#[test]
fn table_rejects_results_outside_testing() {
    for from in [
        ConnectionStatus::Pending,
        ConnectionStatus::Active,
        ConnectionStatus::Error,
        ConnectionStatus::Inactive,
    ] {
        assert!(next_status(from, StatusEvent::TestSucceeded).is_err());
        assert!(next_status(from, StatusEvent::TestFailed).is_err());
    }
    assert!(next_status(ConnectionStatus::Testing, StatusEvent::TestStarted).is_err());
    assert!(next_status(ConnectionStatus::Active, StatusEvent::Reactivated).is_err());
}
