//! Wire types exchanged with the event source.
//!
//! The source wraps every event in an [`Envelope`]: an opaque token, a
//! signature and the event itself serialized as a JSON string. The relay
//! never looks inside the token or signature, it only carries them to the
//! destination as request headers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;

/// First and only message the relay sends after the socket opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Handshake {
    pub token: String,
    /// Callback address the source should associate with this client.
    #[serde(rename = "microserviceUrl")]
    pub microservice_url: String,
}

impl Handshake {
    pub fn new(token: impl Into<String>, microservice_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            microservice_url: microservice_url.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Raw inbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub token: String,
    pub signature: String,
    /// Serialized JSON document holding the event. Forwarded byte-for-byte
    /// so the destination can check the signature against it.
    pub payload: String,
}

impl Envelope {
    /// Parse the outer frame. Anything that is not a JSON object with
    /// string `token`, `signature` and `payload` is a malformed envelope.
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        serde_json::from_str(text).map_err(|e| RelayError::MalformedEnvelope(e.to_string()))
    }

    /// Parse the inner `payload` into an [`Event`].
    pub fn decode_event(&self) -> Result<Event, RelayError> {
        let body: Value = serde_json::from_str(&self.payload)
            .map_err(|e| RelayError::InvalidPayload(e.to_string()))?;
        Ok(Event::from_body(body))
    }
}

/// Decoded business event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Value of the `event` field, if the payload carried a string there.
    pub name: Option<String>,
    /// Parsed payload, used for filtering and log previews.
    pub body: Value,
}

impl Event {
    /// Build an event whose name is read from `body["event"]`.
    pub fn from_body(body: Value) -> Self {
        let name = body.get("event").and_then(Value::as_str).map(str::to_owned);
        Self { name, body }
    }

    /// Name for log lines; events without one read as `<unnamed>`.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

/// Legacy frame layout: the event name sits next to the credentials and
/// `payload` is already a JSON value.
#[derive(Debug, Clone, Deserialize)]
struct FlatFrame {
    event: Option<String>,
    token: String,
    signature: String,
    #[serde(default)]
    payload: Value,
}

/// How inbound frames are laid out and where the event name is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// `payload` is a JSON string; the name is the inner `event` field.
    #[default]
    Nested,
    /// `payload` is a JSON value; the name is the top-level `event` field.
    Flat,
}

impl FilterMode {
    /// Decode one text frame into its envelope and event.
    ///
    /// Returns [`RelayError::MalformedEnvelope`] when the outer frame does
    /// not parse and [`RelayError::InvalidPayload`] when a nested payload
    /// does not.
    pub fn decode(&self, text: &str) -> Result<(Envelope, Event), RelayError> {
        match self {
            Self::Nested => {
                let envelope = Envelope::parse(text)?;
                let event = envelope.decode_event()?;
                Ok((envelope, event))
            }
            Self::Flat => {
                let frame: FlatFrame = serde_json::from_str(text)
                    .map_err(|e| RelayError::MalformedEnvelope(e.to_string()))?;
                let envelope = Envelope {
                    token: frame.token,
                    signature: frame.signature,
                    payload: frame.payload.to_string(),
                };
                let event = Event {
                    name: frame.event,
                    body: frame.payload,
                };
                Ok((envelope, event))
            }
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nested => write!(f, "nested"),
            Self::Flat => write!(f, "flat"),
        }
    }
}
