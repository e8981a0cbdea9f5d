//! HTTP dispatcher backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use hookrelay_core::dispatch::{Delivered, DispatchResult, Dispatcher, HEADER_SIGNATURE, HEADER_TOKEN};
use hookrelay_core::envelope::{Envelope, Event};
use hookrelay_core::error::RelayError;

/// Configuration for `HttpForwarder`.
#[derive(Debug, Clone, Default)]
pub struct HttpForwarderConfig {
    /// Per-request timeout. `None` lets a hung destination hold the
    /// forward open indefinitely.
    pub request_timeout: Option<Duration>,
}

/// Posts event payloads to a fixed destination URL.
///
/// The body is the envelope's serialized payload as received, so key order
/// and number formatting match what the source signed.
pub struct HttpForwarder {
    url: String,
    http: reqwest::Client,
}

impl HttpForwarder {
    /// Create a forwarder for the given destination URL.
    pub fn new(url: impl Into<String>, config: HttpForwarderConfig) -> Result<Self, RelayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { url: url.into(), http })
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Result<Self, RelayError> {
        Self::new(url, HttpForwarderConfig::default())
    }
}

#[async_trait]
impl Dispatcher for HttpForwarder {
    async fn dispatch(&self, envelope: &Envelope, event: &Event) -> DispatchResult {
        let resp = self
            .http
            .post(&self.url)
            .header(HEADER_TOKEN, &envelope.token)
            .header(HEADER_SIGNATURE, &envelope.signature)
            .header(CONTENT_TYPE, "application/json")
            .body(envelope.payload.clone())
            .send()
            .await
            .map_err(|e| RelayError::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RelayError::Rejected {
                status,
                body: render_body(&body),
            });
        }

        tracing::debug!(status, event = %event.display_name(), url = %self.url, "destination accepted event");
        Ok(Delivered { status })
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Compact JSON bodies; pass anything else through as text.
fn render_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(v) => v.to_string(),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    fn login_event() -> (Envelope, Event) {
        let envelope = Envelope {
            token: "t1".into(),
            signature: "s1".into(),
            payload: r#"{"event":"user.login","id":42}"#.into(),
        };
        let event = envelope.decode_event().unwrap();
        (envelope, event)
    }

    #[tokio::test]
    async fn posts_inner_payload_with_hook_headers() {
        let server = MockServer::start_async().await;
        let hook = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/hooks")
                    .header("x-hook-token", "t1")
                    .header("x-hook-signature", "s1")
                    .header("content-type", "application/json")
                    .json_body(json!({"event": "user.login", "id": 42}));
                then.status(200).json_body(json!({"ok": true}));
            })
            .await;

        let fwd = HttpForwarder::default_for(server.url("/hooks")).unwrap();
        let (envelope, event) = login_event();
        let delivered = fwd.dispatch(&envelope, &event).await.unwrap();

        assert_eq!(delivered.status, 200);
        hook.assert_async().await;
    }

    #[tokio::test]
    async fn body_is_sent_in_sender_key_order() {
        let server = MockServer::start_async().await;
        let hook = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/hooks")
                    .header("content-type", "application/json")
                    .body(r#"{"id":42,"event":"user.login","amount":1.0}"#);
                then.status(200);
            })
            .await;

        let envelope = Envelope {
            token: "t".into(),
            signature: "s".into(),
            payload: r#"{"id":42,"event":"user.login","amount":1.0}"#.into(),
        };
        let event = envelope.decode_event().unwrap();
        let fwd = HttpForwarder::default_for(server.url("/hooks")).unwrap();
        fwd.dispatch(&envelope, &event).await.unwrap();

        hook.assert_async().await;
    }

    #[tokio::test]
    async fn any_2xx_is_success() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/hooks");
                then.status(204);
            })
            .await;

        let fwd = HttpForwarder::default_for(server.url("/hooks")).unwrap();
        let (envelope, event) = login_event();
        assert_eq!(fwd.dispatch(&envelope, &event).await.unwrap().status, 204);
    }

    #[tokio::test]
    async fn non_2xx_is_rejected_with_body_and_not_retried() {
        let server = MockServer::start_async().await;
        let hook = server
            .mock_async(|when, then| {
                when.method(POST).path("/hooks");
                then.status(500).json_body(json!({"error": "boom"}));
            })
            .await;

        let fwd = HttpForwarder::default_for(server.url("/hooks")).unwrap();
        let (envelope, event) = login_event();
        let err = fwd.dispatch(&envelope, &event).await.unwrap_err();

        match err {
            RelayError::Rejected { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, r#"{"error":"boom"}"#);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(hook.hits_async().await, 1);
    }

    #[tokio::test]
    async fn plain_text_error_body_is_kept() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/hooks");
                then.status(401).body("bad signature");
            })
            .await;

        let fwd = HttpForwarder::default_for(server.url("/hooks")).unwrap();
        let (envelope, event) = login_event();
        let err = fwd.dispatch(&envelope, &event).await.unwrap_err();
        assert!(matches!(err, RelayError::Rejected { status: 401, ref body } if body == "bad signature"));
    }

    #[tokio::test]
    async fn unreachable_destination_is_http_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let fwd = HttpForwarder::default_for(format!("http://{addr}/hooks")).unwrap();
        let (envelope, event) = login_event();
        let err = fwd.dispatch(&envelope, &event).await.unwrap_err();
        assert!(matches!(err, RelayError::Http(_)), "got {err}");
        assert!(err.is_per_frame());
    }

    #[tokio::test]
    async fn request_timeout_applies() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/slow");
                then.status(200).delay(Duration::from_millis(500));
            })
            .await;

        let fwd = HttpForwarder::new(
            server.url("/slow"),
            HttpForwarderConfig { request_timeout: Some(Duration::from_millis(50)) },
        )
        .unwrap();
        let (envelope, event) = login_event();
        let err = fwd.dispatch(&envelope, &event).await.unwrap_err();
        assert!(matches!(err, RelayError::Http(_)), "got {err}");
    }

    #[test]
    fn render_body_compacts_json() {
        assert_eq!(render_body("{ \"a\" : 1 }"), r#"{"a":1}"#);
        assert_eq!(render_body("oops"), "oops");
        assert_eq!(render_body(""), "");
    }
}
