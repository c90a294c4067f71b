//! # Mapwatch
//!
//! Polling client for live map server HTTP/JSON APIs.
//!
//! A [`MapClient`] bootstraps against a server's plain-text
//! configuration document, discovers the endpoint templates, and then
//! tracks worlds: each tracked world polls the update endpoint at the
//! server-specified interval, diffs the player set, and feeds an event
//! stream.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mapwatch::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MapClient::connect(
//!     HttpFetch::new(),
//!     ClientConfig::new("http://localhost:8123"),
//! );
//! let mut events = client.subscribe();
//! client.ready().await?;
//! client.track(None)?;
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod bootstrap;
mod client;
mod error;
mod events;
mod tracker;

pub use client::{ClientConfig, MapClient};
pub use error::ClientError;
pub use events::{MapEvent, Player};

pub use mapwatch_protocol::{
    MarkerSet, PlayerEntry, ServerConfig, UpdatePayload, WorldDescriptor,
    DEFAULT_CONFIG_PATH, HIDDEN_WORLD,
};
pub use mapwatch_transport::{Fetch, TransportError};

#[cfg(feature = "http")]
pub use mapwatch_transport::HttpFetch;

/// One-line import for the common surface.
pub mod prelude {
    pub use crate::{ClientConfig, ClientError, MapClient, MapEvent, Player};

    pub use mapwatch_transport::Fetch;

    #[cfg(feature = "http")]
    pub use mapwatch_transport::HttpFetch;
}
