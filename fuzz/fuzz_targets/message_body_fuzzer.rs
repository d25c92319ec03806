//! Fuzz target for the attachment prefix convention
//!
//! # Invariants
//!
//! - Decoding never panics
//! - Encoding a decoded body reproduces the original wire text
//! - A body that starts with an attachment prefix never decodes as text

#![no_main]

use galaxy_proto::{FILE_PREFIX, IMAGE_PREFIX, MessageBody};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|raw: String| {
    let body = MessageBody::decode(&raw);

    assert_eq!(body.encode(), raw);

    if raw.starts_with(IMAGE_PREFIX) || raw.starts_with(FILE_PREFIX) {
        assert!(body.is_attachment());
    } else {
        assert!(!body.is_attachment());
    }
});
