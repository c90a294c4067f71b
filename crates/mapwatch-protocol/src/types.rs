//! Serde types for the server's JSON documents.
//!
//! Field names follow the wire format exactly (`defaultworld`,
//! `updaterate`, `servertime`); Rust-side names are mapped with
//! `#[serde(rename)]`. Servers attach plugin-specific extras to most
//! objects, so every document keeps unknown fields in a flattened map
//! instead of dropping them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved world name the server reports for players that are hidden
/// from the map (vanished, in a disabled world, ...).
pub const HIDDEN_WORLD: &str = "-some-other-bogus-world-";

/// Default path of the bootstrap configuration document, relative to
/// the server base URL.
pub const DEFAULT_CONFIG_PATH: &str = "up/configuration";

/// Sentinel value of [`ServerConfig::error`] meaning the server wants
/// the client to authenticate before serving data.
const LOGIN_REQUIRED: &str = "login-required";

/// One world as described by the server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldDescriptor {
    /// Unique world name; the registry key.
    pub name: String,
    /// Human-readable display name, when the server provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Any additional server-supplied fields (map extents, sea level, ...).
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// The JSON configuration document fetched during bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Error sentinel; `"login-required"` means authentication is needed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Name of the world the client should track by default.
    #[serde(rename = "defaultworld")]
    pub default_world: String,
    /// All worlds the server exposes.
    #[serde(default)]
    pub worlds: Vec<WorldDescriptor>,
    /// Poll interval in milliseconds, dictated by the server.
    #[serde(rename = "updaterate")]
    pub update_rate_ms: u64,
    /// Any additional configuration fields.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ServerConfig {
    /// Whether the server refuses anonymous clients.
    pub fn requires_login(&self) -> bool {
        self.error.as_deref() == Some(LOGIN_REQUIRED)
    }
}

/// One player as reported by the update endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    /// Account name; unique key within a poll response.
    pub account: String,
    /// World the server reports the player in. Equal to
    /// [`HIDDEN_WORLD`] when the player is hidden.
    pub world: String,
    /// Position. Servers omit coordinates for hidden players.
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Health and armor, when the server shares them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor: Option<f64>,
    /// Any additional per-player fields (display name, sort order, ...).
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// The JSON document returned by the update endpoint on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload {
    /// Server-side clock at the time of the response.
    #[serde(rename = "servertime")]
    pub server_time: u64,
    /// Every currently visible player.
    #[serde(default)]
    pub players: Vec<PlayerEntry>,
    /// Other update data (tile notifications, chat, ...), untouched.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// One marker group as returned by the marker endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSet {
    /// Display label of the group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Whether the group starts hidden in map UIs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide: Option<bool>,
    /// Individual markers, keyed by marker id. Contents are
    /// server-defined and kept opaque.
    #[serde(default)]
    pub markers: HashMap<String, Value>,
    /// Areas, circles, lines and whatever else the group carries.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// The JSON document returned by the marker endpoint for one world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerPayload {
    /// Marker groups, keyed by group id.
    #[serde(default)]
    pub sets: HashMap<String, MarkerSet>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_decodes_wire_names() {
        let cfg: ServerConfig = serde_json::from_str(
            r#"{
                "defaultworld": "world1",
                "worlds": [{ "name": "world1", "title": "Overworld" }],
                "updaterate": 3000
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.default_world, "world1");
        assert_eq!(cfg.update_rate_ms, 3000);
        assert_eq!(cfg.worlds.len(), 1);
        assert_eq!(cfg.worlds[0].name, "world1");
        assert_eq!(cfg.worlds[0].title.as_deref(), Some("Overworld"));
        assert!(!cfg.requires_login());
    }

    #[test]
    fn test_server_config_login_required_sentinel() {
        let cfg: ServerConfig = serde_json::from_str(
            r#"{ "error": "login-required", "defaultworld": "", "updaterate": 2000 }"#,
        )
        .unwrap();
        assert!(cfg.requires_login());
    }

    #[test]
    fn test_server_config_other_error_is_not_login() {
        let cfg: ServerConfig = serde_json::from_str(
            r#"{ "error": "world-not-found", "defaultworld": "w", "updaterate": 2000 }"#,
        )
        .unwrap();
        assert!(!cfg.requires_login());
    }

    #[test]
    fn test_update_payload_keeps_unknown_fields() {
        let upd: UpdatePayload = serde_json::from_str(
            r#"{
                "servertime": 18000,
                "players": [
                    { "account": "a", "world": "world1", "x": 1.5, "y": 64.0, "z": -3.0,
                      "health": 20.0, "name": "&aAlice" }
                ],
                "hasStorm": false
            }"#,
        )
        .unwrap();

        assert_eq!(upd.server_time, 18000);
        assert_eq!(upd.players.len(), 1);
        let p = &upd.players[0];
        assert_eq!(p.account, "a");
        assert_eq!(p.x, 1.5);
        assert_eq!(p.health, Some(20.0));
        assert_eq!(p.extra["name"], "&aAlice");
        assert_eq!(upd.extra["hasStorm"], false);
    }

    #[test]
    fn test_player_entry_defaults_position_when_absent() {
        let p: PlayerEntry = serde_json::from_str(
            r#"{ "account": "ghost", "world": "-some-other-bogus-world-" }"#,
        )
        .unwrap();
        assert_eq!(p.world, HIDDEN_WORLD);
        assert_eq!((p.x, p.y, p.z), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_marker_payload_decodes_sets() {
        let m: MarkerPayload = serde_json::from_str(
            r#"{
                "sets": {
                    "towns": {
                        "label": "Towns",
                        "markers": { "spawn": { "x": 0, "z": 0, "label": "Spawn" } }
                    }
                }
            }"#,
        )
        .unwrap();

        let towns = &m.sets["towns"];
        assert_eq!(towns.label.as_deref(), Some("Towns"));
        assert!(towns.markers.contains_key("spawn"));
    }

    #[test]
    fn test_update_payload_missing_servertime_fails_decode() {
        let res = crate::decode::<UpdatePayload>(serde_json::json!({ "players": [] }));
        assert!(matches!(res, Err(crate::ProtocolError::Decode(_))));
    }
}
