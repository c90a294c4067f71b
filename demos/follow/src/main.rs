//! Follows a live map server from the terminal.
//!
//! Connects to the server given on the command line, tracks its default
//! world, and prints player movement as it happens:
//!
//! ```text
//! follow http://localhost:8123
//! ```
//!
//! Set `RUST_LOG=mapwatch=debug` to watch the bootstrap and poll cycles.

use mapwatch::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let base_url = match std::env::args().nth(1) {
        Some(url) => url,
        None => {
            eprintln!("usage: follow <base-url>");
            eprintln!("example: follow http://localhost:8123");
            std::process::exit(2);
        }
    };

    let client = MapClient::connect(HttpFetch::new(), ClientConfig::new(base_url));
    let mut events = client.subscribe();

    client.ready().await?;
    let world = client.default_world().unwrap_or_default();
    println!(
        "connected: {} world(s), following `{world}`, polling every {:?}",
        client.worlds().len(),
        client.poll_interval(),
    );

    client.track(None)?;

    while let Some(event) = events.recv().await {
        match event {
            MapEvent::Ready => {}
            MapEvent::Update(payload) => {
                tracing::debug!(
                    server_time = payload.server_time,
                    players = payload.players.len(),
                    "update"
                );
            }
            MapEvent::PlayerAdded(p) => {
                println!("+ {} joined {} at ({:.0}, {:.0}, {:.0})", p.account, p.world, p.x, p.y, p.z);
            }
            MapEvent::PlayerUpdated(p) => {
                if p.visible {
                    println!("  {} @ {} ({:.0}, {:.0}, {:.0})", p.account, p.world, p.x, p.y, p.z);
                } else {
                    println!("  {} (hidden)", p.account);
                }
            }
            MapEvent::PlayerRemoved(p) => {
                println!("- {} left (last seen in {})", p.account, p.world);
            }
            MapEvent::Error(e) => {
                tracing::warn!(error = %e, "poll failed");
            }
        }
    }

    Ok(())
}
