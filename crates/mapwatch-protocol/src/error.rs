//! Error types for the protocol layer.

/// Errors that can occur while interpreting server documents.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// An expected pattern was absent from the bootstrap document.
    /// Fatal: without the endpoint templates the client cannot proceed.
    #[error("bootstrap document is missing `{field}`")]
    BootstrapParse { field: &'static str },

    /// A JSON document didn't match the expected shape.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The server demands authentication, which this client does not
    /// support. Fatal: initialization aborts.
    #[error("server requires login")]
    LoginRequired,
}
