//! Property-based tests for the client session and dispatcher.

#![allow(clippy::unwrap_used)]

use std::time::{Duration, Instant};

use galaxy_client::{
    Client, ClientAction, ClientConfig, ClientEvent, Dispatcher, LinkId, Projection, ViewKind,
};
use galaxy_proto::{MessageBody, Tag, payloads::OutgoingMessage};
use proptest::prelude::*;
use serde_json::{Value, json};

#[derive(Debug, Clone)]
enum Step {
    Advance(u64),
    SignIn(u64),
    SignOut,
    Open { stale: bool },
    Close { stale: bool },
    Error,
    Tick,
    Send,
    Push(u64),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (1u64..6000).prop_map(Step::Advance),
        1 => (1u64..4).prop_map(Step::SignIn),
        1 => Just(Step::SignOut),
        3 => any::<bool>().prop_map(|stale| Step::Open { stale }),
        2 => any::<bool>().prop_map(|stale| Step::Close { stale }),
        1 => Just(Step::Error),
        3 => Just(Step::Tick),
        2 => Just(Step::Send),
        2 => (1u64..4).prop_map(Step::Push),
    ]
}

fn target(client: &Client, stale: bool) -> LinkId {
    let current = client.connection().and_then(|c| c.current_link()).unwrap_or(LinkId::FIRST);
    if stale { LinkId::new(current.get().saturating_sub(1)) } else { current }
}

fn push_frame(id: u64, from: u64) -> String {
    json!({
        "type": "new_message",
        "payload": {"id": id, "from": {"id": from}, "to": {"id": 9}, "message": "m"},
    })
    .to_string()
}

proptest! {
    #[test]
    fn prop_frames_only_target_current_identity_and_link(
        steps in prop::collection::vec(step_strategy(), 0..100),
    ) {
        let mut now = Instant::now();
        let mut client: Client = Client::new(ClientConfig::default());
        let (transcript, _) = client.attach_transcript(1, now);
        let mut next_message = 0u64;
        let mut highest_link: Option<LinkId> = None;

        for step in &steps {
            let actions = match step {
                Step::Advance(ms) => {
                    now += Duration::from_millis(*ms);
                    Vec::new()
                },
                Step::SignIn(identity) => client.sign_in(*identity, now).unwrap(),
                Step::SignOut => client.sign_out(),
                Step::Open { stale } => {
                    let link = target(&client, *stale);
                    client.handle(ClientEvent::LinkOpened { link }, now)
                },
                Step::Close { stale } => {
                    let link = target(&client, *stale);
                    client.handle(ClientEvent::LinkClosed { link, reason: "prop".into() }, now)
                },
                Step::Error => {
                    let link = target(&client, false);
                    client.handle(ClientEvent::LinkError { link, reason: "prop".into() }, now)
                },
                Step::Tick => client.handle(ClientEvent::Tick, now),
                Step::Send => client.send_message(
                    OutgoingMessage::new(1, &MessageBody::Text("hi".into())),
                    now,
                ),
                Step::Push(from) => {
                    next_message += 1;
                    let link = target(&client, false);
                    let text = push_frame(next_message, *from);
                    client.handle(ClientEvent::FrameReceived { link, text }, now)
                },
            };

            for action in &actions {
                match action {
                    ClientAction::SendText { link, text } => {
                        prop_assert!(client.is_connected());
                        prop_assert_eq!(
                            Some(*link),
                            client.connection().and_then(|c| c.current_link())
                        );
                        let frame: Value = serde_json::from_str(text).unwrap();
                        prop_assert_eq!(frame["userId"].as_u64(), client.identity());
                    },
                    ClientAction::OpenLink { link, url } => {
                        // Link ids keep growing across identities
                        if let Some(prev) = highest_link {
                            prop_assert!(*link > prev);
                        }
                        highest_link = Some(*link);

                        let identity = client.identity().unwrap();
                        let suffix = format!("userId={identity}");
                        prop_assert!(url.ends_with(&suffix));
                    },
                    _ => {},
                }
            }

            // Transcript only ever grows, and only with its own conversation
            let view = client.view(&transcript).unwrap();
            prop_assert!(view.messages().iter().all(|m| m.sender == 1 || m.recipient == 1));
            prop_assert!(!view.is_loading() || client.is_connected());
        }
    }

    #[test]
    fn prop_dispatcher_routes_match_attached_kinds(
        ops in prop::collection::vec((0usize..6, any::<bool>()), 0..60),
    ) {
        const KINDS: [ViewKind; 6] = [
            ViewKind::ChatList,
            ViewKind::Transcript,
            ViewKind::Roster,
            ViewKind::NewContact,
            ViewKind::Profile,
            ViewKind::Liveness,
        ];

        let mut dispatcher = Dispatcher::new();
        let mut attached = Vec::new();

        for (index, detach) in ops {
            if detach && !attached.is_empty() {
                let id = attached.remove(index % attached.len());
                prop_assert!(dispatcher.detach(id));
                prop_assert!(!dispatcher.detach(id));
            } else {
                attached.push(dispatcher.attach(KINDS[index]));
            }
        }

        prop_assert_eq!(dispatcher.len(), attached.len());

        for tag in Tag::ALL {
            let route = dispatcher.route(tag);
            let expected: Vec<_> = attached
                .iter()
                .copied()
                .filter(|id| dispatcher.kind_of(*id).is_some_and(|k| k.owned_tags().contains(&tag)))
                .collect();
            prop_assert_eq!(route, expected.as_slice());
        }
    }
}
