//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] decouples the runtime from concrete I/O. Production uses
//! WebSocket links and the system clock; tests substitute scripted events
//! and a recording sink.

use std::{future::Future, ops::Sub, time::Duration};

use galaxy_client::{ClientEvent, LinkId, View};

/// Platform I/O for the [`Runtime`](crate::Runtime).
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in tests.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Wait for the next link event.
    ///
    /// Returns `None` once no further events can arrive.
    fn poll_event(&mut self) -> impl Future<Output = Option<ClientEvent>> + Send;

    /// Start dialing `url`. Its events must be tagged with `link`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be started at all. Dial failures
    /// are reported later as `LinkError` events instead.
    fn open_link(&mut self, link: LinkId, url: String) -> Result<(), Self::Error>;

    /// Write one text frame on `link`.
    fn send_text(
        &mut self,
        link: LinkId,
        text: String,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close `link`. Closing an unknown link is a no-op.
    fn close_link(&mut self, link: LinkId, reason: &str);

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Present an updated view.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, view: &View) -> Result<(), Self::Error>;

    /// The connected flag flipped.
    fn connectivity_changed(&mut self, connected: bool);

    /// Close every link and release resources.
    fn stop(&mut self);
}
