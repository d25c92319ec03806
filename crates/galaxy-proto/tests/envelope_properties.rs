//! Property-based tests for envelope decoding and encoding.
//!
//! These exercise the decoder with arbitrary text and the encoder with
//! arbitrary payload objects, checking the guarantees consumers rely on.

#![allow(clippy::expect_used)]

use galaxy_proto::{Envelope, MessageBody, ProtocolError, Tag};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for known tags
fn arbitrary_tag() -> impl Strategy<Value = Tag> {
    prop::sample::select(Tag::ALL.to_vec())
}

/// Strategy for flat JSON objects with scalar values
fn arbitrary_object() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(
        "[a-zA-Z]{1,12}",
        prop_oneof![
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
            ".{0,24}".prop_map(Value::from),
        ],
        0..8,
    )
    .prop_map(|fields| fields.into_iter().collect())
}

/// Strategy for message bodies
fn arbitrary_body() -> impl Strategy<Value = MessageBody> {
    prop_oneof![
        ".{0,64}".prop_map(MessageBody::Text),
        ".{0,64}".prop_map(|uri| MessageBody::Image { uri }),
        ".{0,64}".prop_map(|uri| MessageBody::File { uri }),
    ]
}

#[test]
fn prop_decode_never_panics() {
    proptest!(|(text in ".{0,256}")| {
        let _ = Envelope::decode(&text);
    });
}

#[test]
fn prop_decode_requires_string_tag() {
    proptest!(|(tag in any::<i64>(), payload in arbitrary_object())| {
        let text = serde_json::json!({"type": tag, "payload": payload}).to_string();
        prop_assert_eq!(Envelope::decode(&text), Err(ProtocolError::MissingTag));
    });
}

#[test]
fn prop_inbound_frames_decode_to_their_tag() {
    proptest!(|(tag in arbitrary_tag(), payload in arbitrary_object())| {
        let text = serde_json::json!({"type": tag.as_str(), "payload": payload}).to_string();
        let env = Envelope::decode(&text).expect("well-formed frame");

        prop_assert_eq!(env.tag(), Some(tag));
        prop_assert_eq!(env.payload(), &Value::Object(payload));
    });
}

#[test]
fn prop_encode_always_stamps_identity_and_tag() {
    proptest!(|(tag in arbitrary_tag(), payload in arbitrary_object(), identity in any::<u64>())| {
        let env = Envelope::new(tag, Value::Object(payload.clone()));
        let text = env.encode(identity).expect("encode should succeed");
        let value: Value = serde_json::from_str(&text).expect("valid JSON");

        prop_assert_eq!(&value["type"], &Value::from(tag.as_str()));
        prop_assert_eq!(&value["userId"], &Value::from(identity));

        for (key, field) in &payload {
            if key != "type" && key != "userId" {
                prop_assert_eq!(&value[key.as_str()], field);
            }
        }
    });
}

#[test]
fn prop_body_prefixes_survive_egress() {
    proptest!(|(body in arbitrary_body())| {
        let wire = body.encode();
        let decoded = MessageBody::decode(&wire);

        // A text body that happens to start with a prefix is read back as an
        // attachment; that is the wire convention.
        match &body {
            MessageBody::Image { .. } | MessageBody::File { .. } => {
                prop_assert_eq!(decoded, body);
            },
            MessageBody::Text(text) => {
                prop_assert_eq!(decoded.encode(), text.clone());
            },
        }
    });
}
