//! Per-frame handling: decode, filter, hand off to the dispatcher.
//!
//! Every frame is handled on its own. A frame that fails to decode is
//! logged and dropped without touching the session; a matching event is
//! forwarded on a spawned task so the next frame can be read while the
//! callback is still outstanding.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use hookrelay_core::dispatch::Dispatcher;
use hookrelay_core::envelope::{Envelope, Event};
use hookrelay_core::error::RelayError;
use hookrelay_core::interest::should_forward;
use hookrelay_core::limiter::InFlightLimiter;
use hookrelay_core::preview::preview;
use hookrelay_core::session::{SessionStats, StatsSnapshot};
use hookrelay_core::RelayConfig;

const LOG_FRAME_LIMIT: usize = 512;

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Outer frame was not a JSON envelope.
    Malformed,
    /// Envelope parsed but its payload did not.
    InvalidPayload,
    /// Event name is outside the interest set.
    Ignored { event: String },
    /// A forward was spawned.
    Forwarding { event: String },
}

/// Decodes frames and spawns one forward per matching event.
pub struct FrameHandler {
    config: Arc<RelayConfig>,
    dispatcher: Arc<dyn Dispatcher>,
    limiter: InFlightLimiter,
    stats: Arc<SessionStats>,
    tasks: JoinSet<()>,
}

impl FrameHandler {
    pub fn new(config: Arc<RelayConfig>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        let limiter = InFlightLimiter::new(config.max_in_flight);
        Self {
            config,
            dispatcher,
            limiter,
            stats: Arc::new(SessionStats::new()),
            tasks: JoinSet::new(),
        }
    }

    /// Handle one text frame.
    ///
    /// Waits only when `max_in_flight` forwards are already running.
    pub async fn handle_text(&mut self, text: &str) -> FrameOutcome {
        self.stats.record_received();
        debug!(frame = %truncate(text, LOG_FRAME_LIMIT), "received message");
        self.reap();

        let (envelope, event) = match self.config.filter_mode.decode(text) {
            Ok(decoded) => decoded,
            Err(e @ RelayError::MalformedEnvelope(_)) => {
                self.stats.record_malformed();
                error!(error = %e, frame = %truncate(text, LOG_FRAME_LIMIT), "invalid JSON message, dropping frame");
                return FrameOutcome::Malformed;
            }
            Err(e) => {
                self.stats.record_malformed();
                error!(error = %e, "failed to handle event");
                return FrameOutcome::InvalidPayload;
            }
        };

        let name = event.display_name().to_string();
        if !should_forward(event.name.as_deref(), &self.config.interest) {
            self.stats.record_ignored();
            info!(event = %name, "ignored event");
            return FrameOutcome::Ignored { event: name };
        }

        info!(event = %name, "handling event");
        if !self.config.preview_fields.is_empty() {
            let fields = preview(&event.body, &self.config.preview_fields);
            info!(event = %name, preview = %fields, "payload preview");
        }

        let permit = self.limiter.acquire().await;
        let dispatcher = Arc::clone(&self.dispatcher);
        let stats = Arc::clone(&self.stats);
        self.tasks.spawn(async move {
            let _permit = permit;
            forward(dispatcher.as_ref(), &envelope, &event, &stats).await;
        });

        FrameOutcome::Forwarding { event: name }
    }

    /// Handle a binary frame by treating valid UTF-8 as text.
    pub async fn handle_binary(&mut self, bytes: Vec<u8>) -> Option<FrameOutcome> {
        match String::from_utf8(bytes) {
            Ok(text) => Some(self.handle_text(&text).await),
            Err(e) => {
                self.stats.record_received();
                self.stats.record_malformed();
                warn!(error = %e, "binary frame is not UTF-8, dropping");
                None
            }
        }
    }

    /// Wait for every outstanding forward to finish.
    pub async fn drain(&mut self) {
        while let Some(res) = self.tasks.join_next().await {
            if let Err(e) = res {
                error!(error = %e, "forward task panicked");
            }
        }
    }

    /// Number of forwards still running.
    pub fn in_flight(&self) -> usize {
        self.limiter.in_flight()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Drop bookkeeping for forwards that already finished.
    fn reap(&mut self) {
        while let Some(res) = self.tasks.try_join_next() {
            if let Err(e) = res {
                error!(error = %e, "forward task panicked");
            }
        }
    }
}

/// Run one dispatch and log its outcome. Never retries.
async fn forward(dispatcher: &dyn Dispatcher, envelope: &Envelope, event: &Event, stats: &SessionStats) {
    let name = event.display_name();
    match dispatcher.dispatch(envelope, event).await {
        Ok(delivered) => {
            stats.record_forwarded();
            info!(event = %name, status = delivered.status, "forwarded successfully");
        }
        Err(RelayError::Rejected { status, body }) => {
            stats.record_failed();
            error!(event = %name, status, response = %body, url = %dispatcher.url(), "error forwarding data");
        }
        Err(e) => {
            stats.record_failed();
            error!(event = %name, error = %e, url = %dispatcher.url(), "failed to forward event");
        }
    }
}

/// Cut `text` to at most `max` bytes on a char boundary.
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
