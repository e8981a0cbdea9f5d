//! hookrelay-core — foundation types for hookrelay.
//!
//! # Overview
//!
//! hookrelay pulls events over an outbound WebSocket and pushes the ones it
//! is interested in to a local HTTP service. The core crate defines:
//!
//! - [`Envelope`] / [`Event`] / [`Handshake`] — wire types
//! - [`FilterMode`] — inbound frame layouts
//! - [`InterestSet`] — event names eligible for forwarding
//! - [`Dispatcher`] — the async trait every destination implements
//! - [`RelayConfig`] — validated session parameters
//! - [`RelayError`] — structured error type
//! - [`SessionState`] / [`SessionStats`] — session lifecycle and counters
//! - [`InFlightLimiter`] — bound on concurrent forwards

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod interest;
pub mod limiter;
pub mod preview;
pub mod session;

pub use config::RelayConfig;
pub use dispatch::{Delivered, DispatchResult, Dispatcher, HEADER_SIGNATURE, HEADER_TOKEN};
pub use envelope::{Envelope, Event, FilterMode, Handshake};
pub use error::RelayError;
pub use interest::{should_forward, InterestSet};
pub use limiter::InFlightLimiter;
pub use session::{SessionState, SessionStats, StatsSnapshot};
