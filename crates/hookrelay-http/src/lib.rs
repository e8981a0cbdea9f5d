//! hookrelay-http — delivers relayed events as signed HTTP callbacks.
//!
//! Every forward is a single `POST` carrying the envelope's token and
//! signature in `x-hook-token` / `x-hook-signature`. There is no retry: a
//! non-2xx answer or an unreachable destination is final for that event.

pub mod client;

pub use client::{HttpForwarder, HttpForwarderConfig};
