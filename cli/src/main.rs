//! hookrelay CLI — relay events from a WebSocket source to a local HTTP service.
//!
//! Usage:
//! ```bash
//! # Forward user.login and order.created events to a local service
//! hookrelay listen -u ws://labs.example.com:3204 -f http://localhost:5000 \
//!     -t <token> -e user.login order.created
//!
//! # Legacy frame layout (event name at the top level)
//! hookrelay start -u ws://localhost:3001 -m http://localhost:5000 -t <token>
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use hookrelay_core::config::timeout_from_secs;
use hookrelay_core::{FilterMode, InterestSet, RelayConfig, RelayError};
use hookrelay_http::{HttpForwarder, HttpForwarderConfig};
use hookrelay_ws::run_session;

mod logging;

use logging::{init_tracing, LogConfig};

#[derive(Parser)]
#[command(
    name = "hookrelay",
    about = "Relay events from a WebSocket source to a local HTTP service",
    version
)]
struct Cli {
    /// Log level directive (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit JSON structured logs
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen on a WebSocket server and forward selected events
    Listen {
        /// WebSocket server URL, e.g. ws://labs.example.com:3204
        #[arg(short, long)]
        url: String,
        /// Local URL to forward event data to, e.g. http://localhost:5000
        #[arg(short, long)]
        forward: String,
        /// Events to forward, e.g. user.login order.created
        #[arg(short, long, num_args = 1.., required = true)]
        event: Vec<String>,
        /// Authentication token sent with the forward URL
        #[arg(short, long)]
        token: String,
        #[command(flatten)]
        tuning: Tuning,
    },

    /// Connect with the legacy frame layout and forward matching events
    Start {
        /// WebSocket server URL, e.g. ws://localhost:3001
        #[arg(short, long)]
        url: String,
        /// Local URL of the microservice, e.g. http://localhost:5000
        #[arg(short, long = "microservice-url")]
        microservice_url: String,
        /// Authentication token sent with the microservice URL
        #[arg(short, long)]
        token: String,
        /// Events to forward
        #[arg(short, long, num_args = 1.., default_value = "user.login")]
        event: Vec<String>,
        #[command(flatten)]
        tuning: Tuning,
    },
}

#[derive(Args, Debug, Clone)]
struct Tuning {
    /// Maximum forwards awaiting a response at once
    #[arg(long, default_value_t = 64)]
    max_in_flight: usize,
    /// Per-request timeout in seconds (default or 0: wait indefinitely)
    #[arg(long)]
    timeout_secs: Option<f64>,
    /// Payload field to log before forwarding, e.g. user.email (repeatable)
    #[arg(long = "preview-field")]
    preview_fields: Vec<String>,
}

impl Commands {
    fn into_config(self) -> Result<RelayConfig, RelayError> {
        let (url, forward, events, token, mode, tuning) = match self {
            Self::Listen { url, forward, event, token, tuning } => {
                (url, forward, event, token, FilterMode::Nested, tuning)
            }
            Self::Start { url, microservice_url, token, event, tuning } => {
                (url, microservice_url, event, token, FilterMode::Flat, tuning)
            }
        };

        let interest: InterestSet = events.into_iter().collect();
        let mut config = RelayConfig::new(url, forward, token, interest)
            .with_filter_mode(mode)
            .with_max_in_flight(tuning.max_in_flight)
            .with_preview_fields(tuning.preview_fields);
        if let Some(secs) = tuning.timeout_secs.filter(|s| *s != 0.0) {
            config = config.with_request_timeout(timeout_from_secs(secs)?);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&LogConfig {
        level: cli.log_level,
        json: cli.json_logs,
    });

    let config = cli.command.into_config().context("invalid arguments")?;
    config.validate().context("invalid arguments")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        source = %config.source_url,
        forward = %config.forward_url,
        events = %config.interest,
        mode = %config.filter_mode,
        "hookrelay is running"
    );

    let forwarder = HttpForwarder::new(
        config.forward_url.clone(),
        HttpForwarderConfig {
            request_timeout: config.request_timeout,
        },
    )?;

    run_session(config, Arc::new(forwarder)).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn listen_builds_nested_config() {
        let cli = parse(&[
            "hookrelay", "listen",
            "-u", "ws://labs.example.com:3204",
            "-f", "http://localhost:5000",
            "-t", "tok",
            "-e", "user.login", "order.created",
        ]);
        let cfg = cli.command.into_config().unwrap();
        assert_eq!(cfg.filter_mode, FilterMode::Nested);
        assert_eq!(cfg.source_url, "ws://labs.example.com:3204");
        assert_eq!(cfg.forward_url, "http://localhost:5000");
        assert!(cfg.interest.contains("user.login"));
        assert!(cfg.interest.contains("order.created"));
        assert_eq!(cfg.max_in_flight, 64);
        assert_eq!(cfg.request_timeout, None);
        cfg.validate().unwrap();
    }

    #[test]
    fn listen_requires_event() {
        let res = Cli::try_parse_from([
            "hookrelay", "listen", "-u", "ws://a", "-f", "http://b", "-t", "tok",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn start_defaults_to_user_login_flat() {
        let cli = parse(&[
            "hookrelay", "start",
            "-u", "ws://localhost:3001",
            "-m", "http://localhost:5000",
            "-t", "tok",
        ]);
        let cfg = cli.command.into_config().unwrap();
        assert_eq!(cfg.filter_mode, FilterMode::Flat);
        assert_eq!(cfg.interest.iter().collect::<Vec<_>>(), vec!["user.login"]);
    }

    #[test]
    fn tuning_flags_apply() {
        let cli = parse(&[
            "hookrelay", "--json-logs", "listen",
            "-u", "wss://events.example.com",
            "-f", "https://svc.internal/hook",
            "-t", "tok",
            "-e", "a",
            "--max-in-flight", "8",
            "--timeout-secs", "1.5",
            "--preview-field", "user.id",
            "--preview-field", "user.email",
        ]);
        assert!(cli.json_logs);
        let cfg = cli.command.into_config().unwrap();
        assert_eq!(cfg.max_in_flight, 8);
        assert_eq!(cfg.request_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(cfg.preview_fields, vec!["user.id", "user.email"]);
    }

    #[test]
    fn out_of_range_timeout_is_rejected() {
        for bad in ["inf", "1e30", "NaN"] {
            let cli = parse(&[
                "hookrelay", "listen",
                "-u", "ws://a", "-f", "http://b", "-t", "tok", "-e", "x",
                "--timeout-secs", bad,
            ]);
            let err = cli.command.into_config().unwrap_err();
            assert!(matches!(err, RelayError::Config(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn zero_timeout_means_none() {
        let cli = parse(&[
            "hookrelay", "listen",
            "-u", "ws://a", "-f", "http://b", "-t", "tok", "-e", "x",
            "--timeout-secs", "0",
        ]);
        assert_eq!(cli.command.into_config().unwrap().request_timeout, None);
    }
}
