//! Pattern extraction from the plain-text bootstrap document.
//!
//! The bootstrap document is a fragment of generated configuration code,
//! not JSON. The fields we need appear as quoted key/value pairs:
//!
//! ```text
//! configuration: 'up/configuration',
//! update: 'up/world/{world}/{timestamp}',
//! markers: 'tiles/',
//! login: 'up/login',
//! ```
//!
//! Only the quoted value matters; everything around it is ignored.

use crate::{EndpointTemplate, ProtocolError};

/// The endpoint templates and configuration pointer extracted from the
/// bootstrap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapDoc {
    /// Path of the JSON configuration document, relative to the base URL.
    pub config_path: String,
    /// Update endpoint template (`{world}`, `{timestamp}`).
    pub update: EndpointTemplate,
    /// Marker endpoint template (`{world}`).
    pub markers: EndpointTemplate,
    /// Login endpoint template. Unused by this client but extracted so
    /// a missing pattern is caught up front, matching the server contract.
    pub login: EndpointTemplate,
}

impl BootstrapDoc {
    /// Parses the bootstrap document.
    ///
    /// # Errors
    /// Returns [`ProtocolError::BootstrapParse`] naming the first field
    /// whose pattern is absent.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(Self {
            config_path: extract(text, "configuration")?.to_string(),
            update: EndpointTemplate::new(extract(text, "update")?),
            markers: EndpointTemplate::new(extract(text, "markers")?),
            login: EndpointTemplate::new(extract(text, "login")?),
        })
    }
}

/// Finds `field : '<value>'` (or double-quoted) and returns the value.
///
/// Scans every occurrence of the key so that substrings of longer keys
/// (`update` inside `updaterate`, `markers` inside `tilemarkers`) don't
/// trip the match — an occurrence only counts when it starts at an
/// identifier boundary and is followed by a colon and a quoted value.
fn extract<'a>(doc: &'a str, field: &'static str) -> Result<&'a str, ProtocolError> {
    for (idx, _) in doc.match_indices(field) {
        if idx > 0 {
            let prev = doc.as_bytes()[idx - 1];
            if prev.is_ascii_alphanumeric() || prev == b'_' {
                continue;
            }
        }
        let rest = doc[idx + field.len()..].trim_start();
        let Some(rest) = rest.strip_prefix(':') else {
            continue;
        };
        let rest = rest.trim_start();
        let Some(quote) = rest.chars().next().filter(|c| *c == '\'' || *c == '"')
        else {
            continue;
        };
        let value = &rest[1..];
        if let Some(end) = value.find(quote) {
            return Ok(&value[..end]);
        }
    }
    Err(ProtocolError::BootstrapParse { field })
}
