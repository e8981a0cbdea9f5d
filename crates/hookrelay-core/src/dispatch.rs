//! The `Dispatcher` trait — the seam between the session and the destination.

use async_trait::async_trait;

use crate::envelope::{Envelope, Event};
use crate::error::RelayError;

/// Header carrying the envelope token.
pub const HEADER_TOKEN: &str = "x-hook-token";
/// Header carrying the envelope signature.
pub const HEADER_SIGNATURE: &str = "x-hook-signature";

/// A forward the destination accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivered {
    pub status: u16,
}

/// Outcome of a single forward. Failures are terminal for the event.
pub type DispatchResult = Result<Delivered, RelayError>;

/// Delivers a decoded event to the destination.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; the session shares one
/// dispatcher across every in-flight forward as `Arc<dyn Dispatcher>`.
#[async_trait]
pub trait Dispatcher: Send + Sync + 'static {
    /// Deliver `envelope.payload` unchanged with the envelope's token and
    /// signature.
    ///
    /// Called at most once per envelope. Implementations must not retry.
    async fn dispatch(&self, envelope: &Envelope, event: &Event) -> DispatchResult;

    /// Destination identifier (URL or name).
    fn url(&self) -> &str;
}
