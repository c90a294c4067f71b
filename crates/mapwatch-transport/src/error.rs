/// Errors that can occur in the transport layer.
///
/// Transport errors are always recoverable from the client's point of
/// view: a failed poll cycle reports the error and retries on the next
/// natural interval.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or the response body could not
    /// be read.
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// The server answered with a non-success HTTP status.
    #[error("{url} returned HTTP {code}")]
    Status { code: u16, url: String },

    /// The response body was not what the caller asked for
    /// (e.g. not valid JSON).
    #[error("invalid body from {url}: {message}")]
    InvalidBody { url: String, message: String },

    /// The server could not be reached at all.
    ///
    /// In-memory test transports use this to simulate network loss.
    #[error("unreachable: {0}")]
    Unreachable(String),
}
