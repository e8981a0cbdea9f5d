//! Session lifecycle and counters.
//!
//! ```text
//! Connecting ──open──▶ Open ──close──▶ Closed
//!      │                 │
//!      └─────error───────┴──error──▶ Errored
//! ```
//!
//! `Closed` and `Errored` are terminal. A new session needs a new process.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle state of a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closed,
    Errored,
}

impl SessionState {
    /// Transport established.
    pub fn opened(self) -> Self {
        match self {
            Self::Connecting => Self::Open,
            other => other,
        }
    }

    /// Peer closed the connection or the stream ended.
    pub fn closed(self) -> Self {
        match self {
            Self::Open => Self::Closed,
            other => other,
        }
    }

    /// Transport failure, either while connecting or while open.
    pub fn errored(self) -> Self {
        match self {
            Self::Connecting | Self::Open => Self::Errored,
            other => other,
        }
    }

    /// Only an open session handles frames.
    pub fn accepts_frames(self) -> bool {
        self == Self::Open
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Errored => write!(f, "errored"),
        }
    }
}

/// Lock-free counters updated by the reader and by spawned forwards.
#[derive(Debug, Default)]
pub struct SessionStats {
    received: AtomicU64,
    malformed: AtomicU64,
    ignored: AtomicU64,
    forwarded: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`SessionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub received: u64,
    /// Frames dropped because the envelope or its payload did not parse.
    pub malformed: u64,
    pub ignored: u64,
    pub forwarded: u64,
    pub failed: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
