//! Property-based tests for the connection state machine.
//!
//! Drives a connection with arbitrary sequences of link events and timer
//! ticks, and checks the scheduling guarantees after every step.

#![allow(clippy::expect_used)]

use std::time::{Duration, Instant};

use galaxy_core::{
    Connection, ConnectionAction, ConnectionConfig, ConnectionState, DEFAULT_RECONNECT_DELAY,
    LinkId,
};
use galaxy_proto::Request;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    /// Advance the clock
    Advance(u64),
    /// Open event for the current link, or for an older one
    Open { stale: bool },
    /// Close event for the current link, or for an older one
    Close { stale: bool },
    /// Error event for the current link, or for an older one
    Error { stale: bool },
    /// Timer tick
    Tick,
    /// Outbound request
    Send,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (1u64..6000).prop_map(Step::Advance),
        2 => any::<bool>().prop_map(|stale| Step::Open { stale }),
        2 => any::<bool>().prop_map(|stale| Step::Close { stale }),
        1 => any::<bool>().prop_map(|stale| Step::Error { stale }),
        3 => Just(Step::Tick),
        1 => Just(Step::Send),
    ]
}

fn target(conn: &Connection, stale: bool) -> LinkId {
    let current = conn.current_link().unwrap_or(LinkId::FIRST);
    if stale { LinkId::new(current.get().saturating_sub(1)) } else { current }
}

fn apply(conn: &mut Connection, step: &Step, now: Instant) -> Vec<ConnectionAction> {
    match step {
        Step::Advance(_) => Vec::new(),
        Step::Open { stale } => conn.handle_open(target(conn, *stale), now),
        Step::Close { stale } => conn.handle_close(target(conn, *stale), now, "prop"),
        Step::Error { stale } => conn.handle_error(target(conn, *stale), now, "prop"),
        Step::Tick => conn.tick(now),
        Step::Send => {
            let envelope = Request::GetChatList.into_envelope().expect("encodable request");
            conn.send(&envelope, now)
        },
    }
}

proptest! {
    #[test]
    fn prop_reconnect_scheduling_is_idempotent(steps in prop::collection::vec(step_strategy(), 0..80)) {
        let mut now = Instant::now();
        let mut conn = Connection::new(7, ConnectionConfig::default(), LinkId::FIRST);
        conn.connect(now).expect("fresh connection connects");

        let mut last_open: Option<(LinkId, Instant)> = None;

        for step in &steps {
            if let Step::Advance(ms) = step {
                now += Duration::from_millis(*ms);
            }

            let was_connected = conn.is_connected();
            let actions = apply(&mut conn, step, now);

            // No reconnect is ever pending while connected
            if conn.is_connected() {
                prop_assert!(conn.reconnect_pending_since().is_none());
            }

            for action in &actions {
                match action {
                    ConnectionAction::OpenLink { link, .. } => {
                        // Fresh ids only, and never sooner than the delay
                        if let Some((prev, at)) = last_open {
                            prop_assert!(*link > prev);
                            prop_assert!(now - at >= DEFAULT_RECONNECT_DELAY);
                        }
                        last_open = Some((*link, now));
                    },
                    ConnectionAction::SendText { .. } => prop_assert!(was_connected),
                    ConnectionAction::CloseLink { link, .. } => {
                        prop_assert_eq!(Some(*link), conn.current_link());
                    },
                }
            }

            // At most one OpenLink per step
            let opens = actions
                .iter()
                .filter(|a| matches!(a, ConnectionAction::OpenLink { .. }))
                .count();
            prop_assert!(opens <= 1);
        }
    }

    #[test]
    fn prop_teardown_silences_everything(
        before in prop::collection::vec(step_strategy(), 0..30),
        after in prop::collection::vec(step_strategy(), 0..30),
    ) {
        let mut now = Instant::now();
        let mut conn = Connection::new(7, ConnectionConfig::default(), LinkId::FIRST);
        conn.connect(now).expect("fresh connection connects");

        for step in &before {
            if let Step::Advance(ms) = step {
                now += Duration::from_millis(*ms);
            }
            apply(&mut conn, step, now);
        }

        conn.teardown();

        for step in &after {
            if let Step::Advance(ms) = step {
                now += Duration::from_millis(*ms);
            }
            let actions = apply(&mut conn, step, now + Duration::from_secs(3600));
            prop_assert!(actions.is_empty());
            prop_assert_eq!(conn.state(), ConnectionState::Disconnected);
            prop_assert!(conn.reconnect_pending_since().is_none());
        }
    }
}
