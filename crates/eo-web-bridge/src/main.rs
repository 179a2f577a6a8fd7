//! EO WebSocket Bridge: entry point.
//!
//! This binary serves a small control panel over HTTP.  From it the user
//! starts a relay: a WebSocket listener that forwards every browser session
//! to an Endless Online game server over plain TCP, one packet per binary
//! WebSocket message.
//!
//! # Why a separate bridge process?
//!
//! Web browsers can only communicate over HTTP/WebSocket; they cannot open raw
//! TCP sockets.  EO game servers only speak raw TCP with length-prefixed
//! packets.  The bridge reframes between the two so a browser client can play
//! on an unmodified server.
//!
//! # Usage
//!
//! ```text
//! eo-web-bridge [OPTIONS]
//!
//! Options:
//!   --control-port <PORT>             Control panel port [default: 8081]
//!   --control-bind <IP>               Control panel interface [default: 0.0.0.0]
//!   --relay-bind-host <IP>            Interface relays bind [default: 0.0.0.0]
//!   --static-dir <DIR>                Control panel assets [default: ./static]
//!   --directory-url <URL>             Game-server directory
//!   --directory-timeout <SECS>        Directory fetch timeout [default: 10]
//!   --backend-connect-timeout <SECS>  Game-server dial timeout [default: 10]
//!   --allowed-origins <LIST>          Comma-separated origin allow list
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                     | Default    | Description                     |
//! |------------------------------|------------|---------------------------------|
//! | `EO_CONTROL_PORT`            | `8081`     | Control panel port              |
//! | `EO_CONTROL_BIND`            | `0.0.0.0`  | Control panel interface         |
//! | `EO_RELAY_BIND_HOST`         | `0.0.0.0`  | Interface relays bind           |
//! | `EO_STATIC_DIR`              | `./static` | Control panel assets            |
//! | `EO_DIRECTORY_URL`           | apollo     | Game-server directory URL       |
//! | `EO_DIRECTORY_TIMEOUT`       | `10`       | Directory fetch timeout (secs)  |
//! | `EO_BACKEND_CONNECT_TIMEOUT` | `10`       | Game-server dial timeout (secs) |
//! | `EO_ALLOWED_ORIGINS`         | (empty)    | Origin allow list, empty = any  |
//!
//! CLI args take precedence when both are present.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use eo_web_bridge::domain::config::DEFAULT_DIRECTORY_URL;
use eo_web_bridge::domain::{BridgeConfig, OriginPolicy};
use eo_web_bridge::infrastructure::{
    create_router, ControlState, HttpDirectorySource, ServerDirectory,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Endless Online WebSocket bridge.
///
/// Serves a control panel and relays browser WebSocket sessions to an EO game
/// server over TCP.
#[derive(Debug, Parser)]
#[command(
    name = "eo-web-bridge",
    about = "WebSocket-to-TCP relay for Endless Online web clients",
    version
)]
struct Cli {
    /// TCP port for the control panel HTTP server.
    #[arg(long, default_value_t = 8081, env = "EO_CONTROL_PORT")]
    control_port: u16,

    /// IP address to bind the control panel to.
    ///
    /// Use `127.0.0.1` to keep the control panel local to this machine.
    #[arg(long, default_value = "0.0.0.0", env = "EO_CONTROL_BIND")]
    control_bind: String,

    /// IP address every relay listener binds.  The port comes from the
    /// control panel's start request.
    #[arg(long, default_value = "0.0.0.0", env = "EO_RELAY_BIND_HOST")]
    relay_bind_host: String,

    /// Directory holding `index.html` and the control panel's assets.
    #[arg(long, default_value = "./static", env = "EO_STATIC_DIR")]
    static_dir: PathBuf,

    /// URL of the upstream game-server directory.
    #[arg(long, default_value = DEFAULT_DIRECTORY_URL, env = "EO_DIRECTORY_URL")]
    directory_url: String,

    /// Directory fetch timeout in seconds.
    #[arg(long, default_value_t = 10, env = "EO_DIRECTORY_TIMEOUT")]
    directory_timeout: u64,

    /// Game-server dial timeout in seconds, applied per browser connection.
    #[arg(long, default_value_t = 10, env = "EO_BACKEND_CONNECT_TIMEOUT")]
    backend_connect_timeout: u64,

    /// Browser origins allowed to open a relay WebSocket.
    ///
    /// Empty (the default) accepts every origin.
    #[arg(long, value_delimiter = ',', env = "EO_ALLOWED_ORIGINS")]
    allowed_origins: Vec<String>,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--control-bind` or `--relay-bind-host` is not a
    /// valid IP address.
    fn into_bridge_config(self) -> anyhow::Result<BridgeConfig> {
        let control_bind_addr: SocketAddr = format!("{}:{}", self.control_bind, self.control_port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid control bind address: '{}:{}'",
                    self.control_bind, self.control_port
                )
            })?;

        self.relay_bind_host
            .parse::<IpAddr>()
            .with_context(|| format!("invalid relay bind host: '{}'", self.relay_bind_host))?;

        Ok(BridgeConfig {
            control_bind_addr,
            relay_bind_host: self.relay_bind_host,
            static_dir: self.static_dir,
            directory_url: self.directory_url,
            directory_timeout: Duration::from_secs(self.directory_timeout),
            backend_connect_timeout: Duration::from_secs(self.backend_connect_timeout),
            origin_policy: OriginPolicy::from_origins(self.allowed_origins),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. `tracing_subscriber` is initialised; `RUST_LOG` controls the level.
/// 2. CLI arguments are parsed into a [`BridgeConfig`].
/// 3. The game-server directory is fetched once.  A failure is logged and
///    the control panel starts with an empty list.
/// 4. The control panel is served until Ctrl+C, after which any running
///    relay is stopped.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Parse CLI arguments ───────────────────────────────────────────────────
    let config = Cli::parse().into_bridge_config()?;

    info!(
        "EO WebSocket bridge starting: control=http://{}, relay host={}",
        config.control_bind_addr, config.relay_bind_host
    );

    // ── Server directory ──────────────────────────────────────────────────────
    let source = HttpDirectorySource::new(config.directory_url.clone(), config.directory_timeout)
        .context("failed to build directory HTTP client")?;
    info!("fetching server directory from {}", source.url());
    let directory = ServerDirectory::new(Box::new(source));
    if let Err(e) = directory.refresh().await {
        warn!("initial server directory fetch failed: {e}");
    }

    // ── Control panel ─────────────────────────────────────────────────────────
    let control_addr = config.control_bind_addr;
    let state = ControlState::new(config, directory);
    let app = create_router(std::sync::Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(control_addr)
        .await
        .with_context(|| format!("failed to bind control panel on {control_addr}"))?;
    info!("control panel listening on http://{control_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("control panel server error")?;

    // ── Teardown ──────────────────────────────────────────────────────────────
    state.manager.stop().await;

    info!("EO WebSocket bridge stopped");
    Ok(())
}

/// Resolves on Ctrl+C (SIGINT on Unix).
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, initiating shutdown"),
        Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
