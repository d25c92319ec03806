//! Fuzz target for the client session state machine
//!
//! # Strategy
//!
//! - Identity churn: sign in as a handful of identities, sign out
//! - Link events for current and stale links, in any order
//! - Arbitrary inbound text on the current link
//! - Timer ticks with clock jumps up to a minute
//!
//! # Invariants
//!
//! - Every outbound frame goes to the current link of a connected session
//!   and carries that session's identity
//! - Link ids handed out by `OpenLink` strictly increase
//! - At most one reconnect is ever pending

#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use galaxy_client::{Client, ClientAction, ClientConfig, ClientEvent, LinkId};
use galaxy_proto::{MessageBody, payloads::OutgoingMessage};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Advance(u16),
    SignIn(u8),
    SignOut,
    Open { stale: bool },
    Close { stale: bool },
    Error { stale: bool },
    Tick,
    Send,
    Frame(String),
    AttachTranscript(u8),
    MountLiveness,
}

fn target(client: &Client, stale: bool) -> LinkId {
    let current = client.connection().and_then(|c| c.current_link()).unwrap_or(LinkId::FIRST);
    if stale { LinkId::new(current.get().saturating_sub(1)) } else { current }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut now = Instant::now();
    let mut client: Client = Client::new(ClientConfig::default());
    let mut highest_link: Option<LinkId> = None;

    for op in ops {
        let actions = match op {
            Op::Advance(ms) => {
                now += Duration::from_millis(u64::from(ms));
                Vec::new()
            },
            Op::SignIn(identity) => match client.sign_in(u64::from(identity % 4), now) {
                Ok(actions) => actions,
                Err(_) => Vec::new(),
            },
            Op::SignOut => client.sign_out(),
            Op::Open { stale } => {
                let link = target(&client, stale);
                client.handle(ClientEvent::LinkOpened { link }, now)
            },
            Op::Close { stale } => {
                let link = target(&client, stale);
                client.handle(ClientEvent::LinkClosed { link, reason: String::new() }, now)
            },
            Op::Error { stale } => {
                let link = target(&client, stale);
                client.handle(ClientEvent::LinkError { link, reason: String::new() }, now)
            },
            Op::Tick => client.handle(ClientEvent::Tick, now),
            Op::Send => client
                .send_message(OutgoingMessage::new(1, &MessageBody::Text("x".into())), now),
            Op::Frame(text) => {
                let link = target(&client, false);
                client.handle(ClientEvent::FrameReceived { link, text }, now)
            },
            Op::AttachTranscript(friend) => client.attach_transcript(u64::from(friend), now).1,
            Op::MountLiveness => {
                client.mount_liveness(Duration::from_secs(5), now);
                Vec::new()
            },
        };

        for action in &actions {
            match action {
                ClientAction::SendText { link, text } => {
                    assert!(client.is_connected());
                    assert_eq!(Some(*link), client.connection().and_then(|c| c.current_link()));
                    let frame: serde_json::Value =
                        serde_json::from_str(text).expect("outbound frames are JSON");
                    assert_eq!(frame["userId"].as_u64(), client.identity());
                },
                ClientAction::OpenLink { link, .. } => {
                    if let Some(prev) = highest_link {
                        assert!(*link > prev);
                    }
                    highest_link = Some(*link);
                },
                _ => {},
            }
        }

        if let Some(conn) = client.connection() {
            assert!(!(conn.is_connected() && conn.reconnect_pending_since().is_some()));
        }
    }
});
