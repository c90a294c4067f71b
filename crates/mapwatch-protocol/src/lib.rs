//! Wire surface of the live map server's HTTP/JSON API.
//!
//! Everything the server dictates bit-exactly lives here: the plain-text
//! bootstrap document and its pattern extraction, the endpoint URL
//! templates, and the serde types for the configuration, update, and
//! marker JSON documents.
//!
//! # Key types
//!
//! - [`BootstrapDoc`] — parsed bootstrap document (endpoint templates)
//! - [`EndpointTemplate`] — `{world}` / `{timestamp}` substitution
//! - [`ServerConfig`], [`UpdatePayload`], [`MarkerPayload`] — JSON documents
//! - [`HIDDEN_WORLD`] — the "player hidden" sentinel world name

mod bootstrap;
mod error;
mod template;
mod types;

pub use bootstrap::BootstrapDoc;
pub use error::ProtocolError;
pub use template::EndpointTemplate;
pub use types::{
    MarkerPayload, MarkerSet, PlayerEntry, ServerConfig, UpdatePayload,
    WorldDescriptor, DEFAULT_CONFIG_PATH, HIDDEN_WORLD,
};

use serde::de::DeserializeOwned;

/// Decodes an already-parsed JSON value into a typed wire document.
///
/// # Errors
/// Returns [`ProtocolError::Decode`] when the value doesn't match the
/// expected shape (missing fields, wrong types).
pub fn decode<T: DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(ProtocolError::Decode)
}
