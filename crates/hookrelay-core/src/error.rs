//! Relay error types.

use thiserror::Error;

/// Errors that can occur while relaying events.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The WebSocket transport could not be established.
    #[error("connection to {url} failed: {reason}")]
    Connection { url: String, reason: String },

    /// WebSocket send/receive error on an open session.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Inbound frame is not a JSON envelope.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Envelope parsed but its inner `payload` did not.
    #[error("invalid event payload: {0}")]
    InvalidPayload(String),

    /// Destination could not be reached (connection refused, timeout, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Destination answered with a non-2xx status.
    #[error("destination rejected event with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization of an outbound message failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RelayError {
    /// Returns `true` if this error only affects the frame being handled.
    ///
    /// The session keeps reading after any of these.
    pub fn is_per_frame(&self) -> bool {
        matches!(
            self,
            Self::MalformedEnvelope(_)
                | Self::InvalidPayload(_)
                | Self::Http(_)
                | Self::Rejected { .. }
        )
    }

    /// Returns `true` if this error ends the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::WebSocket(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_errors_are_not_fatal() {
        let errs = [
            RelayError::MalformedEnvelope("x".into()),
            RelayError::InvalidPayload("x".into()),
            RelayError::Http("refused".into()),
            RelayError::Rejected { status: 500, body: "boom".into() },
        ];
        for e in errs {
            assert!(e.is_per_frame(), "{e} should be per-frame");
            assert!(!e.is_fatal(), "{e} should not be fatal");
        }
    }

    #[test]
    fn transport_errors_are_fatal() {
        let e = RelayError::Connection {
            url: "ws://localhost:1".into(),
            reason: "refused".into(),
        };
        assert!(e.is_fatal());
        assert!(!e.is_per_frame());
        assert!(RelayError::WebSocket("reset".into()).is_fatal());
    }

    #[test]
    fn rejected_display_includes_status_and_body() {
        let e = RelayError::Rejected { status: 503, body: "{\"error\":\"down\"}".into() };
        assert_eq!(
            e.to_string(),
            "destination rejected event with HTTP 503: {\"error\":\"down\"}"
        );
    }
}
