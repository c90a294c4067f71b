//! Unified error type for the mapwatch client.

use mapwatch_protocol::ProtocolError;
use mapwatch_transport::TransportError;

/// Top-level error covering every client operation.
///
/// Transport and protocol errors are wrapped transparently via `#[from]`,
/// so `?` converts them automatically. The remaining variants are the
/// client's own misuse/state errors.
///
/// Severity by origin:
/// - during bootstrap → terminal, the client never becomes ready;
/// - during a poll cycle → local to that cycle, reported as an event,
///   the timer keeps running;
/// - from an on-demand query → returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A network/HTTP failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A malformed or unexpected server document
    /// (includes the fatal bootstrap-parse and login-required cases).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The operation referenced a world absent from the registry.
    #[error("unknown world `{0}`")]
    UnknownWorld(String),

    /// `track` was called for a world that is already tracked.
    #[error("world `{0}` is already tracked")]
    AlreadyTracked(String),

    /// `untrack` was called for a world that is not tracked.
    #[error("world `{0}` is not tracked")]
    NotTracked(String),

    /// The client has not completed bootstrap (or bootstrap failed),
    /// so tracking and query operations are not valid yet.
    #[error("client is not ready (bootstrap has not completed)")]
    NotReady,
}
