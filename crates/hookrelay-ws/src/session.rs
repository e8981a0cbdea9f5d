//! `RelaySession` — one outbound WebSocket subscription.
//!
//! The session owns the socket, the configuration and the frame handler.
//! It connects once, announces itself with a handshake, then reads frames
//! until the source closes the connection or the transport fails. There
//! is no reconnect; a dropped session ends the run.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use hookrelay_core::dispatch::Dispatcher;
use hookrelay_core::envelope::Handshake;
use hookrelay_core::error::RelayError;
use hookrelay_core::session::{SessionState, StatsSnapshot};
use hookrelay_core::RelayConfig;

use crate::handler::FrameHandler;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Final state and counters of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub state: SessionState,
    pub stats: StatsSnapshot,
}

/// An open relay session.
pub struct RelaySession {
    config: Arc<RelayConfig>,
    ws: WsStream,
    handler: FrameHandler,
    state: SessionState,
}

impl RelaySession {
    /// Connect to `config.source_url` and send the handshake.
    ///
    /// Fails with [`RelayError::Connection`] when the transport cannot be
    /// established. Nothing is retried.
    pub async fn connect(
        config: RelayConfig,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<Self, RelayError> {
        let config = Arc::new(config);
        let mut state = SessionState::Connecting;

        info!(url = %config.source_url, "connecting via WebSocket");
        let (ws, _) = connect_async(config.source_url.as_str())
            .await
            .map_err(|e| RelayError::Connection {
                url: config.source_url.clone(),
                reason: e.to_string(),
            })?;
        state = state.opened();
        info!(url = %config.source_url, "connected to WebSocket server");

        let handler = FrameHandler::new(Arc::clone(&config), dispatcher);
        let mut session = Self { config, ws, handler, state };
        session.send_handshake().await?;
        Ok(session)
    }

    async fn send_handshake(&mut self) -> Result<(), RelayError> {
        let handshake = Handshake::new(&self.config.token, &self.config.forward_url);
        info!(forward_url = %self.config.forward_url, "sending connection message with token and forward URL");
        let text = handshake.to_json()?;
        if let Err(e) = self.ws.send(Message::Text(text.into())).await {
            self.state = self.state.errored();
            return Err(RelayError::WebSocket(e.to_string()));
        }
        Ok(())
    }

    /// Read frames until the session reaches `Closed` or `Errored`, then
    /// wait for outstanding forwards.
    pub async fn run(mut self) -> SessionReport {
        while self.state.accepts_frames() {
            match self.ws.next().await {
                None => {
                    info!("WebSocket connection closed");
                    self.state = self.state.closed();
                }
                Some(Err(e)) => {
                    error!(error = %e, "WebSocket error");
                    self.state = self.state.errored();
                }
                Some(Ok(Message::Text(text))) => {
                    self.handler.handle_text(text.as_str()).await;
                }
                Some(Ok(Message::Binary(bytes))) => {
                    self.handler.handle_binary(bytes.into()).await;
                }
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = self.ws.send(Message::Pong(data)).await {
                        warn!(error = %e, "failed to answer ping");
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "WebSocket connection closed by server");
                    self.state = self.state.closed();
                    // flushes the queued close reply
                    if let Err(e) = self.ws.close(None).await {
                        debug!(error = %e, "close handshake ended");
                    }
                }
                Some(Ok(_)) => {}
            }
        }

        let pending = self.handler.in_flight();
        if pending > 0 {
            info!(pending, "waiting for in-flight forwards");
        }
        self.handler.drain().await;

        let stats = self.handler.stats();
        info!(
            state = %self.state,
            received = stats.received,
            forwarded = stats.forwarded,
            ignored = stats.ignored,
            malformed = stats.malformed,
            failed = stats.failed,
            "session ended"
        );
        SessionReport { state: self.state, stats }
    }
}

/// Connect, relay until the connection ends, and report.
///
/// A failed connect is logged and reported as an `Errored` session with
/// no frames handled.
pub async fn run_session(config: RelayConfig, dispatcher: Arc<dyn Dispatcher>) -> SessionReport {
    match RelaySession::connect(config, dispatcher).await {
        Ok(session) => session.run().await,
        Err(e) => {
            error!(error = %e, "failed to start session");
            SessionReport {
                state: SessionState::Connecting.errored(),
                stats: StatsSnapshot::default(),
            }
        }
    }
}
