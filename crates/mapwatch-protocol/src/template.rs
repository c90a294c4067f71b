//! Endpoint URL templates extracted from the bootstrap document.

use std::fmt;

/// A server-supplied URL template with `{world}` and/or `{timestamp}`
/// placeholders.
///
/// Templates come straight out of the bootstrap document, e.g.
/// `up/world/{world}/{timestamp}`. Either placeholder may be absent —
/// the marker endpoint typically only uses `{world}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate(String);

impl EndpointTemplate {
    /// Wraps a raw template string.
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// The raw template, placeholders intact.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitutes the world name and timestamp into the template.
    ///
    /// Placeholders that don't occur are simply left out of the result;
    /// no substitution is an error.
    pub fn expand(&self, world: &str, timestamp: u64) -> String {
        self.0
            .replace("{world}", world)
            .replace("{timestamp}", &timestamp.to_string())
    }
}

impl fmt::Display for EndpointTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
