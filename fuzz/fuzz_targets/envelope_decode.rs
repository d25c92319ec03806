//! Fuzz target for inbound frame handling
//!
//! Decodes arbitrary text as an envelope and, when that succeeds, folds it
//! into every view kind. Nothing here may panic: malformed frames and
//! wrongly shaped payloads must come back as errors.

#![no_main]

use galaxy_client::{
    ChatListView, NewContactView, ProfileView, Projection, RosterView, TranscriptView,
};
use galaxy_proto::{Envelope, Tag};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(envelope) = Envelope::decode(text) else {
        return;
    };

    // Re-encoding what was decoded always succeeds
    assert!(envelope.encode(1).is_ok());

    let Some(tag) = envelope.tag() else {
        return;
    };

    let mut chats = ChatListView::new();
    let mut transcript = TranscriptView::new(1);
    let mut roster = RosterView::new();
    let mut new_contact = NewContactView::new();
    let mut profile = ProfileView::new();

    let before = transcript.len();
    let _ = chats.fold(tag, &envelope);
    let _ = transcript.fold(tag, &envelope);
    let _ = roster.fold(tag, &envelope);
    let _ = new_contact.fold(tag, &envelope);
    let _ = profile.fold(tag, &envelope);

    // Transcripts never shrink
    assert!(transcript.len() >= before);

    // Folding a tag the view does not own changes nothing
    if tag != Tag::FriendList {
        assert!(chats.chats().is_empty());
    }
});
