//! hookrelay-ws — the WebSocket side of hookrelay.
//!
//! # Features
//! - Single outbound connection, handshake on open
//! - Per-frame decode and interest filtering
//! - Concurrent, bounded forwarding through any [`Dispatcher`](hookrelay_core::Dispatcher)
//! - No reconnect: the session ends when the connection does

pub mod handler;
pub mod session;

pub use handler::{FrameHandler, FrameOutcome};
pub use session::{run_session, RelaySession, SessionReport};
