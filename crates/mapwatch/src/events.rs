//! The client's event stream: event types and subscriber fan-out.

use std::collections::HashMap;
use std::sync::Arc;

use mapwatch_protocol::{PlayerEntry, UpdatePayload, HIDDEN_WORLD};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::ClientError;

/// One player as tracked by the client.
///
/// Built from a wire [`PlayerEntry`] plus the derived `visible` flag:
/// `visible == false` exactly when the server reported the player in
/// the reserved hidden world.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    /// Account name; the player-table key.
    pub account: String,
    /// Server-reported world name (the sentinel for hidden players).
    pub world: String,
    /// Derived visibility flag.
    pub visible: bool,
    /// Position.
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Health and armor, when shared by the server.
    pub health: Option<f64>,
    pub armor: Option<f64>,
    /// Additional server-supplied fields, untouched.
    pub extra: HashMap<String, Value>,
}

impl Player {
    /// Builds the client-side record from a wire entry.
    pub(crate) fn from_entry(entry: &PlayerEntry) -> Self {
        Self {
            account: entry.account.clone(),
            world: entry.world.clone(),
            visible: entry.world != HIDDEN_WORLD,
            x: entry.x,
            y: entry.y,
            z: entry.z,
            health: entry.health,
            armor: entry.armor,
            extra: entry.extra.clone(),
        }
    }
}

/// Events delivered to every subscriber, in emission order.
///
/// Within one poll cycle the order is: `Update`, then `PlayerAdded` /
/// `PlayerUpdated` in response order, then `PlayerRemoved`.
#[derive(Debug, Clone)]
pub enum MapEvent {
    /// Bootstrap completed; tracking operations are valid from now on.
    /// Emitted exactly once.
    Ready,
    /// A failure: fatal when it happens during bootstrap, local to one
    /// cycle when it happens while polling. Shared because events fan
    /// out to many subscribers and errors don't clone.
    Error(Arc<ClientError>),
    /// The raw update payload of a poll cycle, before diffing.
    Update(UpdatePayload),
    /// A player appeared in a poll response for the first time.
    PlayerAdded(Player),
    /// A player was present before and is still present.
    PlayerUpdated(Player),
    /// A player vanished from the poll response. Carries the
    /// last-known record.
    PlayerRemoved(Player),
}

/// Channel sender for delivering events to one subscriber.
pub(crate) type Subscriber = mpsc::UnboundedSender<MapEvent>;

/// Delivers an event to every live subscriber, pruning closed ones.
pub(crate) fn emit(subscribers: &mut Vec<Subscriber>, event: &MapEvent) {
    subscribers.retain(|tx| tx.send(event.clone()).is_ok());
}
