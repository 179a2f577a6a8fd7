//! Bridge configuration types.
//!
//! Two levels of configuration exist:
//!
//! - [`BridgeConfig`] is built once at startup from CLI arguments and lives
//!   for the whole process (control panel address, static asset directory,
//!   directory URL, relay defaults).
//! - [`RelayConfig`] is built fresh for every start request and is immutable
//!   for the lifetime of the relay listener it configures.
//!
//! Both are plain structs with no environment reads inside the domain; the
//! binary is responsible for populating them.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default upstream game-server directory.
pub const DEFAULT_DIRECTORY_URL: &str = "https://apollo-games.com/SLN/sln.php/api";

// ── Origin policy ─────────────────────────────────────────────────────────────

/// Which browser origins may open a relay WebSocket.
///
/// The relay forwards opaque bytes to a public game server; it is not an
/// authorization boundary, so the default accepts every origin.  An allow
/// list only narrows which web pages can drive the relay from a browser.
/// Requests without an `Origin` header (non-browser clients) are accepted
/// under [`OriginPolicy::AllowAny`] and rejected under an allow list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Accept every origin, including requests with no `Origin` header.
    #[default]
    AllowAny,
    /// Accept only these exact origins (compared case-insensitively),
    /// e.g. `https://play.example.org`.
    AllowList(Vec<String>),
}

impl OriginPolicy {
    /// Builds a policy from a list of origins; an empty list means allow any.
    pub fn from_origins(origins: Vec<String>) -> Self {
        let origins: Vec<String> = origins
            .into_iter()
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if origins.is_empty() {
            OriginPolicy::AllowAny
        } else {
            OriginPolicy::AllowList(origins)
        }
    }

    /// Returns `true` if a handshake carrying `origin` may proceed.
    pub fn allows(&self, origin: Option<&str>) -> bool {
        match self {
            OriginPolicy::AllowAny => true,
            OriginPolicy::AllowList(allowed) => match origin {
                Some(origin) => allowed.iter().any(|a| a.eq_ignore_ascii_case(origin)),
                None => false,
            },
        }
    }
}

// ── Per-start relay configuration ─────────────────────────────────────────────

/// Configuration of one relay listener instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Interface the relay binds for browser WebSocket connections.
    pub bind_host: String,
    /// Port the relay binds.  `0` asks the OS for a free port.
    pub bind_port: u16,
    /// Game server address in `host:port` form.  Resolved at dial time, once
    /// per browser connection.
    pub backend_address: String,
    /// Origin check applied during the WebSocket handshake.
    pub origin_policy: OriginPolicy,
    /// Upper bound on how long a backend dial may take.
    pub backend_connect_timeout: Duration,
}

impl RelayConfig {
    /// Creates a config with the default origin policy and dial timeout.
    pub fn new(
        bind_host: impl Into<String>,
        bind_port: u16,
        backend_address: impl Into<String>,
    ) -> Self {
        Self {
            bind_host: bind_host.into(),
            bind_port,
            backend_address: backend_address.into(),
            origin_policy: OriginPolicy::AllowAny,
            backend_connect_timeout: Duration::from_secs(10),
        }
    }

    /// The `host:port` string passed to the listener bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }
}

// ── Process-level configuration ───────────────────────────────────────────────

/// All runtime configuration for the bridge process.
///
/// # Example
///
/// ```rust
/// use eo_web_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.control_bind_addr.port(), 8081);
/// assert_eq!(cfg.relay_bind_host, "0.0.0.0");
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Address of the control panel HTTP server.
    pub control_bind_addr: SocketAddr,

    /// Interface every relay listener binds; the port comes from the start
    /// request.
    pub relay_bind_host: String,

    /// Directory holding `index.html` and the control panel's assets.
    pub static_dir: PathBuf,

    /// URL of the upstream game-server directory (JSON array).
    pub directory_url: String,

    /// Timeout for one directory fetch.
    pub directory_timeout: Duration,

    /// Timeout for each backend dial made by a relay.
    pub backend_connect_timeout: Duration,

    /// Origin policy handed to every relay started by this process.
    pub origin_policy: OriginPolicy,
}

impl BridgeConfig {
    /// Builds the [`RelayConfig`] for a relay on `port` forwarding to
    /// `backend_address`, inheriting this process's relay defaults.
    pub fn relay_config(&self, port: u16, backend_address: impl Into<String>) -> RelayConfig {
        RelayConfig {
            bind_host: self.relay_bind_host.clone(),
            bind_port: port,
            backend_address: backend_address.into(),
            origin_policy: self.origin_policy.clone(),
            backend_connect_timeout: self.backend_connect_timeout,
        }
    }
}

impl Default for BridgeConfig {
    /// | Field                   | Default                                     |
    /// |-------------------------|---------------------------------------------|
    /// | control_bind_addr       | `0.0.0.0:8081`                              |
    /// | relay_bind_host         | `0.0.0.0`                                   |
    /// | static_dir              | `./static`                                  |
    /// | directory_url           | `https://apollo-games.com/SLN/sln.php/api`  |
    /// | directory_timeout       | 10 seconds                                  |
    /// | backend_connect_timeout | 10 seconds                                  |
    /// | origin_policy           | allow any                                   |
    fn default() -> Self {
        Self {
            control_bind_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            relay_bind_host: "0.0.0.0".to_string(),
            static_dir: PathBuf::from("./static"),
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            directory_timeout: Duration::from_secs(10),
            backend_connect_timeout: Duration::from_secs(10),
            origin_policy: OriginPolicy::AllowAny,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
