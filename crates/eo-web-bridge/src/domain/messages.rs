//! JSON message types for the control-plane HTTP API.
//!
//! The relay itself never looks inside game packets, so there is no JSON
//! shadow of the EO protocol here.  The only JSON the bridge speaks is with
//! its own control panel (start/stop/status) and with the upstream
//! game-server directory.
//!
//! # Message flow
//!
//! ```text
//! Control panel → Bridge:  POST /api/start  {"port":8080,"server":"host:port"}
//! Bridge → Control panel:  {"success":true} / {"success":false,"error":"..."}
//! Directory     → Bridge:  [{"name":"...","host":"...","port":8078,...}, ...]
//! ```
//!
//! Field names match what the existing web UI and the directory already use,
//! so they are not renamed to Rust conventions on the wire.

use serde::{Deserialize, Serialize};

// ── Control panel → Bridge ────────────────────────────────────────────────────

/// Body of `POST /api/start`.
///
/// ```json
/// {"port":8080,"server":"game.example.org:8078"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRequest {
    /// Port the relay listener should bind for browser WebSocket connections.
    ///
    /// Kept signed and wide so out-of-range values reach validation instead
    /// of failing JSON parsing with an opaque message.
    pub port: i64,

    /// Backend game server address in `host:port` form.
    pub server: String,
}

// ── Bridge → Control panel ────────────────────────────────────────────────────

/// Response to `POST /api/start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartResponse {
    pub success: bool,

    /// Human-readable failure reason, omitted on success.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl StartResponse {
    /// A successful start.
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A failed start carrying `reason`.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
        }
    }
}

/// Response to `POST /api/stop`.  Stopping always succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopResponse {
    pub success: bool,
}

/// Response to `GET /api/status`.
///
/// ```json
/// {"running":true,"status":"Bridge Running - ws://localhost:8080","port":"8080"}
/// {"running":false,"status":"Bridge Stopped","port":""}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub running: bool,
    /// Display text for the control panel status banner.
    pub status: String,
    /// Bound relay port as a string, empty when stopped.
    pub port: String,
}

/// Response to `POST /api/refresh-servers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

// ── Directory → Bridge ────────────────────────────────────────────────────────

/// One entry of the upstream game-server directory.
///
/// The bridge only ever uses `host` and `port` (to fill the control panel's
/// server picker); everything else is display metadata passed through to the
/// browser untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameServerDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub host: String,
    pub port: u16,
    /// Protocol version string advertised by the server.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub zone: String,
    /// Directories report `-1` for servers that hide their count.
    #[serde(default)]
    pub players: i64,
    /// Server homepage.
    #[serde(default)]
    pub site: String,
    /// Download page for the server's game client.
    #[serde(default)]
    pub clientsite: String,
}

impl GameServerDescriptor {
    /// The `host:port` string the control panel submits back in
    /// [`StartRequest::server`].
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_request_deserializes_from_control_panel_json() {
        // Arrange: the exact shape the web UI posts
        let json = r#"{"port":8080,"server":"eo.example.org:8078"}"#;

        // Act
        let req: StartRequest = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(req.port, 8080);
        assert_eq!(req.server, "eo.example.org:8078");
    }

    #[test]
    fn test_start_request_accepts_out_of_range_port_for_later_validation() {
        let req: StartRequest = serde_json::from_str(r#"{"port":-1,"server":"x:1"}"#).unwrap();
        assert_eq!(req.port, -1);
    }

    #[test]
    fn test_start_request_missing_server_is_rejected() {
        let result: Result<StartRequest, _> = serde_json::from_str(r#"{"port":8080}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_start_response_ok_omits_error_field() {
        let json = serde_json::to_value(StartResponse::ok()).unwrap();
        assert_eq!(json, serde_json::json!({"success": true}));
    }

    #[test]
    fn test_start_response_failed_includes_error() {
        let json = serde_json::to_value(StartResponse::failed("Bridge already running")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "error": "Bridge already running"})
        );
    }

    #[test]
    fn test_status_response_field_names() {
        let status = StatusResponse {
            running: false,
            status: "Bridge Stopped".to_string(),
            port: String::new(),
        };
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["running"], false);
        assert_eq!(json["status"], "Bridge Stopped");
        assert_eq!(json["port"], "");
    }

    #[test]
    fn test_descriptor_deserializes_directory_entry() {
        // Arrange: one entry as the directory publishes it
        let json = r#"{
            "name": "Apollo",
            "host": "game.apollo-games.com",
            "port": 8078,
            "version": "0.0.28",
            "zone": "EU",
            "players": 42,
            "site": "https://apollo-games.com",
            "clientsite": "https://apollo-games.com/client"
        }"#;

        // Act
        let desc: GameServerDescriptor = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(desc.name, "Apollo");
        assert_eq!(desc.players, 42);
        assert_eq!(desc.clientsite, "https://apollo-games.com/client");
        assert_eq!(desc.address(), "game.apollo-games.com:8078");
    }

    #[test]
    fn test_descriptor_tolerates_missing_metadata() {
        let json = r#"{"name":"Bare","host":"10.0.0.9","port":8078}"#;
        let desc: GameServerDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(desc.zone, "");
        assert_eq!(desc.players, 0);
    }

    #[test]
    fn test_descriptor_accepts_nameless_entry_with_negative_players() {
        // Arrange: a sloppy entry with no name and a hidden player count
        let json = r#"{"host":"10.0.0.9","port":8078,"players":-1}"#;

        // Act
        let desc: GameServerDescriptor = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(desc.name, "");
        assert_eq!(desc.players, -1);
        assert_eq!(desc.address(), "10.0.0.9:8078");
    }
}
