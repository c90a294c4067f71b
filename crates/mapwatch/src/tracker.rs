//! Per-world tracker task: the fetch-diff-emit poll cycle.
//!
//! One tokio task per tracked world, driven by a [`PollScheduler`] at
//! the server-specified interval. A failed cycle (transport or decode)
//! emits an error event and leaves all state untouched; the scheduler
//! simply fires the next cycle on the next natural interval.
//!
//! Cycle results apply under the client lock only if the world's
//! tracking generation still matches — a fetch that completes after
//! `untrack` (or after an untrack-retrack pair) is discarded rather
//! than resurrecting discarded state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use mapwatch_poll::PollScheduler;
use mapwatch_protocol::{self as protocol, PlayerEntry, UpdatePayload};
use mapwatch_transport::Fetch;
use tokio::task::JoinHandle;

use crate::client::{join_url, now_ms, Shared};
use crate::events::{self, MapEvent, Player};
use crate::ClientError;

/// Spawns the poll task for one world.
pub(crate) fn spawn<F: Fetch>(
    shared: Arc<Shared<F>>,
    world: String,
    generation: u64,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(run(shared, world, generation, interval))
}

async fn run<F: Fetch>(
    shared: Arc<Shared<F>>,
    world: String,
    generation: u64,
    interval: Duration,
) {
    let mut scheduler = PollScheduler::with_interval(interval);
    tracing::debug!(world = %world, "tracker started");

    loop {
        let cycle = scheduler.wait_for_cycle().await;
        tracing::trace!(world = %world, cycle = cycle.cycle, "poll cycle due");
        poll_cycle(&shared, &world, generation).await;
        scheduler.record_cycle_end();
    }
}

/// One fetch-diff-emit cycle.
async fn poll_cycle<F: Fetch>(shared: &Shared<F>, world: &str, generation: u64) {
    // Snapshot the template without holding the lock across the fetch.
    let template = {
        let inner = shared.lock();
        if !inner.generation_current(world, generation) {
            return;
        }
        match &inner.endpoints {
            Some(e) => e.update.clone(),
            None => return,
        }
    };

    let timestamp = now_ms();
    let url = join_url(&shared.base_url, &template.expand(world, timestamp));

    let payload = match fetch_update(shared, &url).await {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(world, error = %e, "poll cycle failed");
            let event = MapEvent::Error(Arc::new(e));
            let mut inner = shared.lock();
            if inner.generation_current(world, generation) {
                events::emit(&mut inner.subscribers, &event);
            }
            return;
        }
    };

    // Apply the whole cycle in one critical section: no partial player
    // table is ever observable from emitted events.
    let mut inner = shared.lock();
    if !inner.generation_current(world, generation) {
        tracing::debug!(world, "discarding cycle result for untracked world");
        return;
    }

    inner.last_server_time = Some(payload.server_time);
    events::emit(&mut inner.subscribers, &MapEvent::Update(payload.clone()));

    let diff = diff_players(&mut inner.players, &payload.players);
    for event in &diff {
        events::emit(&mut inner.subscribers, event);
    }

    if let Some(handle) = inner.trackers.get_mut(world) {
        handle.last_poll_ms = Some(timestamp);
    }
}

async fn fetch_update<F: Fetch>(
    shared: &Shared<F>,
    url: &str,
) -> Result<UpdatePayload, ClientError> {
    let value = shared.transport.fetch_json(url).await?;
    Ok(protocol::decode(value)?)
}

/// Diffs a poll response against the player table, in place.
///
/// Returns the lifecycle events in emission order: added/updated in
/// response order first, then removed (payload = last-known record).
pub(crate) fn diff_players(
    table: &mut HashMap<String, Player>,
    entries: &[PlayerEntry],
) -> Vec<MapEvent> {
    let mut events = Vec::with_capacity(entries.len());
    let mut seen: HashSet<&str> = HashSet::with_capacity(entries.len());

    for entry in entries {
        seen.insert(entry.account.as_str());
        let player = Player::from_entry(entry);
        let previous = table.insert(entry.account.clone(), player.clone());
        events.push(match previous {
            Some(_) => MapEvent::PlayerUpdated(player),
            None => MapEvent::PlayerAdded(player),
        });
    }

    let gone: Vec<String> = table
        .keys()
        .filter(|account| !seen.contains(account.as_str()))
        .cloned()
        .collect();
    for account in gone {
        if let Some(old) = table.remove(&account) {
            events.push(MapEvent::PlayerRemoved(old));
        }
    }

    events
}
