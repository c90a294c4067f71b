//! One-time session bootstrap: endpoint discovery and world registry.
//!
//! Runs as a detached task spawned by [`MapClient::connect`]. The flow:
//!
//! 1. fetch the plain-text bootstrap document;
//! 2. pattern-extract the configuration path and endpoint templates;
//! 3. fetch and decode the JSON configuration document;
//! 4. reject `login-required` servers (authentication is unsupported);
//! 5. populate the world registry, default world, and poll interval;
//! 6. flip to ready and emit [`MapEvent::Ready`].
//!
//! Every failure along the way is terminal: the error becomes the
//! client's bootstrap outcome and is also emitted as an event.
//!
//! [`MapClient::connect`]: crate::MapClient::connect

use std::sync::Arc;
use std::time::Duration;

use mapwatch_protocol::{self as protocol, BootstrapDoc, ServerConfig};
use mapwatch_transport::Fetch;

use crate::client::{join_url, Endpoints, Phase, Shared};
use crate::events::{self, MapEvent};
use crate::ClientError;

/// Drives the bootstrap to its terminal state (ready or failed).
pub(crate) async fn run<F: Fetch>(shared: Arc<Shared<F>>) {
    match discover(&shared).await {
        Ok((doc, config)) => {
            let mut inner = shared.lock();
            inner.worlds = config
                .worlds
                .into_iter()
                .map(|w| (w.name.clone(), w))
                .collect();
            inner.default_world = config.default_world;
            inner.poll_interval = Duration::from_millis(config.update_rate_ms);
            inner.endpoints = Some(Endpoints {
                update: doc.update,
                markers: doc.markers,
            });
            inner.phase = Phase::Ready;
            events::emit(&mut inner.subscribers, &MapEvent::Ready);
            tracing::info!(
                worlds = inner.worlds.len(),
                default_world = %inner.default_world,
                interval_ms = inner.poll_interval.as_millis() as u64,
                "bootstrap complete"
            );
            drop(inner);
            let _ = shared.phase_tx.send(Phase::Ready);
        }
        Err(e) => {
            tracing::error!(error = %e, "bootstrap failed");
            let e = Arc::new(e);
            let mut inner = shared.lock();
            inner.phase = Phase::Failed;
            inner.bootstrap_error = Some(Arc::clone(&e));
            events::emit(&mut inner.subscribers, &MapEvent::Error(e));
            drop(inner);
            let _ = shared.phase_tx.send(Phase::Failed);
        }
    }
}

/// The two discovery fetches, separated from state application so `?`
/// can drive the control flow.
async fn discover<F: Fetch>(
    shared: &Shared<F>,
) -> Result<(BootstrapDoc, ServerConfig), ClientError> {
    let doc_url = join_url(&shared.base_url, &shared.config_path);
    let text = shared.transport.fetch_text(&doc_url).await?;
    let doc = BootstrapDoc::parse(&text)?;
    tracing::debug!(
        config_path = %doc.config_path,
        update = %doc.update,
        "bootstrap document parsed"
    );

    let config_url = join_url(&shared.base_url, &doc.config_path);
    let value = shared.transport.fetch_json(&config_url).await?;
    let config: ServerConfig = protocol::decode(value)?;

    if config.requires_login() {
        return Err(protocol::ProtocolError::LoginRequired.into());
    }

    Ok((doc, config))
}
