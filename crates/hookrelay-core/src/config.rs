//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::envelope::FilterMode;
use crate::error::RelayError;
use crate::interest::InterestSet;

/// Connection parameters for one relay session. Built once at startup and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// WebSocket address of the event source (`ws://` or `wss://`).
    pub source_url: String,
    /// HTTP address events are forwarded to.
    pub forward_url: String,
    /// Token announced to the source in the handshake.
    pub token: String,
    /// Event names eligible for forwarding.
    pub interest: InterestSet,
    #[serde(default)]
    pub filter_mode: FilterMode,
    /// Upper bound on forwards awaiting a response.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Per-request timeout for forwards. `None` waits indefinitely.
    #[serde(default, with = "opt_secs")]
    pub request_timeout: Option<Duration>,
    /// Dot-separated payload paths logged before each forward.
    #[serde(default)]
    pub preview_fields: Vec<String>,
}

fn default_max_in_flight() -> usize { 64 }

impl RelayConfig {
    pub fn new(
        source_url: impl Into<String>,
        forward_url: impl Into<String>,
        token: impl Into<String>,
        interest: InterestSet,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            forward_url: forward_url.into(),
            token: token.into(),
            interest,
            filter_mode: FilterMode::default(),
            max_in_flight: default_max_in_flight(),
            request_timeout: None,
            preview_fields: vec![],
        }
    }

    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = mode;
        self
    }

    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = n;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_preview_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.preview_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Check addresses, token and interest set before a session starts.
    pub fn validate(&self) -> Result<(), RelayError> {
        check_scheme(&self.source_url, &["ws", "wss"], "source")?;
        check_scheme(&self.forward_url, &["http", "https"], "forward")?;
        if self.token.trim().is_empty() {
            return Err(RelayError::Config("token must not be empty".into()));
        }
        if self.interest.is_empty() {
            return Err(RelayError::Config("at least one event name is required".into()));
        }
        if self.max_in_flight == 0 {
            return Err(RelayError::Config("max_in_flight must be at least 1".into()));
        }
        Ok(())
    }
}

/// Convert a timeout given in seconds. Negative, NaN, infinite and
/// overflowing values are configuration errors.
pub fn timeout_from_secs(secs: f64) -> Result<Duration, RelayError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| RelayError::Config(format!("request timeout {secs}s is out of range: {e}")))
}

fn check_scheme(raw: &str, allowed: &[&str], which: &str) -> Result<(), RelayError> {
    let url = Url::parse(raw)
        .map_err(|e| RelayError::Config(format!("{which} URL '{raw}' is invalid: {e}")))?;
    if !allowed.contains(&url.scheme()) {
        return Err(RelayError::Config(format!(
            "{which} URL '{raw}' must use one of: {}",
            allowed.join(", ")
        )));
    }
    Ok(())
}

mod opt_secs {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(d)?
            .map(|secs| super::timeout_from_secs(secs).map_err(D::Error::custom))
            .transpose()
    }
}
