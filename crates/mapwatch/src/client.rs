//! The map client: construction, readiness, tracking, and queries.
//!
//! # Concurrency note
//!
//! All shared state lives in one plain `HashMap`-based [`Inner`] behind a
//! `std::sync::Mutex`. The lock is never held across an await: poll
//! cycles fetch first, then take the lock once to apply the whole
//! diff-and-emit step. That single critical section is what makes a
//! cycle atomic with respect to concurrent pollers of other worlds.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use mapwatch_protocol::{
    self as protocol, EndpointTemplate, MarkerPayload, MarkerSet, UpdatePayload,
    WorldDescriptor, DEFAULT_CONFIG_PATH,
};
use mapwatch_transport::Fetch;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::events::{MapEvent, Player, Subscriber};
use crate::{bootstrap, tracker, ClientError};

/// Where the client's bootstrap stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Pending,
    Ready,
    Failed,
}

/// Endpoint templates the client keeps after bootstrap.
///
/// The login template is validated during bootstrap but not retained —
/// this client has no authentication support.
#[derive(Debug, Clone)]
pub(crate) struct Endpoints {
    pub(crate) update: EndpointTemplate,
    pub(crate) markers: EndpointTemplate,
}

/// One actively tracked world.
pub(crate) struct TrackerHandle {
    /// Fences stale cycles: results only apply while the world's current
    /// generation matches the one the cycle started under.
    pub(crate) generation: u64,
    pub(crate) task: JoinHandle<()>,
    /// Unix-millis timestamp of the last successfully applied poll.
    pub(crate) last_poll_ms: Option<u64>,
}

/// All mutable client state, behind the one lock.
pub(crate) struct Inner {
    pub(crate) phase: Phase,
    pub(crate) bootstrap_error: Option<Arc<ClientError>>,
    pub(crate) worlds: HashMap<String, WorldDescriptor>,
    pub(crate) default_world: String,
    pub(crate) endpoints: Option<Endpoints>,
    pub(crate) poll_interval: Duration,
    pub(crate) players: HashMap<String, Player>,
    pub(crate) trackers: HashMap<String, TrackerHandle>,
    pub(crate) subscribers: Vec<Subscriber>,
    pub(crate) last_server_time: Option<u64>,
    pub(crate) marker_sets: HashMap<String, MarkerSet>,
    next_generation: u64,
}

impl Inner {
    fn new() -> Self {
        Self {
            phase: Phase::Pending,
            bootstrap_error: None,
            worlds: HashMap::new(),
            default_world: String::new(),
            endpoints: None,
            poll_interval: Duration::ZERO,
            players: HashMap::new(),
            trackers: HashMap::new(),
            subscribers: Vec::new(),
            last_server_time: None,
            marker_sets: HashMap::new(),
            next_generation: 1,
        }
    }

    /// Whether a cycle started under `generation` for `world` may still
    /// apply its results.
    pub(crate) fn generation_current(&self, world: &str, generation: u64) -> bool {
        self.trackers.get(world).map(|t| t.generation) == Some(generation)
    }
}

/// State shared between the client handle, the bootstrap task, and the
/// per-world tracker tasks.
pub(crate) struct Shared<F: Fetch> {
    pub(crate) transport: F,
    pub(crate) base_url: String,
    pub(crate) config_path: String,
    pub(crate) phase_tx: watch::Sender<Phase>,
    inner: Mutex<Inner>,
}

impl<F: Fetch> Shared<F> {
    /// Locks the client state. A poisoned lock means a cycle panicked
    /// mid-update; the maps themselves stay usable, so recover the guard.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Configuration for [`MapClient::connect`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the map server, e.g. `http://host:8123/`.
    pub base_url: String,
    /// Path of the bootstrap document relative to the base URL.
    /// Defaults to [`DEFAULT_CONFIG_PATH`].
    pub config_path: Option<String>,
}

impl ClientConfig {
    /// Config for a server at `base_url` with the default bootstrap path.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            config_path: None,
        }
    }
}

/// A live map client.
///
/// Construction starts a detached bootstrap task; [`ready`](Self::ready)
/// awaits its outcome. Once ready, worlds can be tracked — each tracked
/// world polls the update endpoint on the server-specified interval and
/// feeds the event stream returned by [`subscribe`](Self::subscribe).
///
/// Dropping the client aborts the bootstrap task and every tracker.
pub struct MapClient<F: Fetch> {
    shared: Arc<Shared<F>>,
    phase_rx: watch::Receiver<Phase>,
    bootstrap_task: JoinHandle<()>,
}

impl<F: Fetch> MapClient<F> {
    /// Creates a client and starts bootstrapping against the server.
    ///
    /// Never fails synchronously: discovery errors surface through
    /// [`ready`](Self::ready) and as a [`MapEvent::Error`].
    /// Must be called within a tokio runtime.
    pub fn connect(transport: F, config: ClientConfig) -> Self {
        let (phase_tx, phase_rx) = watch::channel(Phase::Pending);
        let shared = Arc::new(Shared {
            transport,
            base_url: config.base_url,
            config_path: config
                .config_path
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
            phase_tx,
            inner: Mutex::new(Inner::new()),
        });

        let bootstrap_task = tokio::spawn(bootstrap::run(Arc::clone(&shared)));

        Self {
            shared,
            phase_rx,
            bootstrap_task,
        }
    }

    /// Waits for the bootstrap outcome.
    ///
    /// Resolves `Ok(())` once the client is ready, or with the terminal
    /// bootstrap error if discovery failed. Safe to call from any number
    /// of tasks, before or after the outcome is known.
    pub async fn ready(&self) -> Result<(), Arc<ClientError>> {
        let mut rx = self.phase_rx.clone();
        let became_ready = match rx.wait_for(|p| *p != Phase::Pending).await {
            Ok(phase) => *phase == Phase::Ready,
            Err(_) => false,
        };
        if became_ready {
            return Ok(());
        }
        let inner = self.shared.lock();
        Err(inner
            .bootstrap_error
            .clone()
            .unwrap_or_else(|| Arc::new(ClientError::NotReady)))
    }

    /// Whether bootstrap has completed successfully.
    pub fn is_ready(&self) -> bool {
        self.shared.lock().phase == Phase::Ready
    }

    /// Subscribes to the event stream.
    ///
    /// Subscribe before awaiting [`ready`](Self::ready) to observe the
    /// `Ready` event itself. Every subscriber receives every event from
    /// the moment of subscription, in emission order.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<MapEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.lock().subscribers.push(tx);
        rx
    }

    /// Begins polling a world, defaulting to the server's default world.
    ///
    /// # Errors
    /// - [`ClientError::NotReady`] before bootstrap completed
    /// - [`ClientError::UnknownWorld`] for a world absent from the registry
    /// - [`ClientError::AlreadyTracked`] if the world is already tracked
    pub fn track(&self, world: Option<&str>) -> Result<(), ClientError> {
        let mut inner = self.shared.lock();
        if inner.phase != Phase::Ready {
            return Err(ClientError::NotReady);
        }

        let name = match world {
            Some(w) => w.to_string(),
            None => inner.default_world.clone(),
        };
        if !inner.worlds.contains_key(&name) {
            return Err(ClientError::UnknownWorld(name));
        }
        if inner.trackers.contains_key(&name) {
            return Err(ClientError::AlreadyTracked(name));
        }

        let generation = inner.next_generation;
        inner.next_generation += 1;
        let interval = inner.poll_interval;

        let task = tracker::spawn(
            Arc::clone(&self.shared),
            name.clone(),
            generation,
            interval,
        );
        inner.trackers.insert(
            name.clone(),
            TrackerHandle {
                generation,
                task,
                last_poll_ms: None,
            },
        );

        tracing::info!(world = %name, interval_ms = interval.as_millis() as u64, "world tracked");
        Ok(())
    }

    /// Stops polling a world.
    ///
    /// When this untracks the *last* world, the whole player table is
    /// cleared — no poller is left to keep it fresh. A cycle already in
    /// flight is discarded by the generation fence.
    ///
    /// # Errors
    /// - [`ClientError::NotReady`] before bootstrap completed
    /// - [`ClientError::NotTracked`] if the world is not tracked
    pub fn untrack(&self, world: &str) -> Result<(), ClientError> {
        let mut inner = self.shared.lock();
        if inner.phase != Phase::Ready {
            return Err(ClientError::NotReady);
        }

        let Some(handle) = inner.trackers.remove(world) else {
            return Err(ClientError::NotTracked(world.to_string()));
        };
        handle.task.abort();

        if inner.trackers.is_empty() {
            inner.players.clear();
            tracing::debug!("last world untracked — player table cleared");
        }

        tracing::info!(world, "world untracked");
        Ok(())
    }

    /// One-shot fetch of the server's current time via the update
    /// endpoint. Independent of any tracking state; refreshes the
    /// cached server time as a side effect.
    pub async fn server_time(&self, world: &str) -> Result<u64, ClientError> {
        let template = self.query_template(world, |e| e.update.clone())?;
        let url = join_url(
            &self.shared.base_url,
            &template.expand(world, now_ms()),
        );
        let value = self.shared.transport.fetch_json(&url).await?;
        let payload: UpdatePayload = protocol::decode(value)?;

        let mut inner = self.shared.lock();
        inner.last_server_time = Some(payload.server_time);
        Ok(payload.server_time)
    }

    /// One-shot fetch of a world's marker groups.
    ///
    /// Replaces the cached marker sets wholesale and returns them.
    /// The registry check happens before any transport call.
    pub async fn markers(
        &self,
        world: &str,
    ) -> Result<HashMap<String, MarkerSet>, ClientError> {
        let template = self.query_template(world, |e| e.markers.clone())?;
        let url = join_url(
            &self.shared.base_url,
            &template.expand(world, now_ms()),
        );
        let value = self.shared.transport.fetch_json(&url).await?;
        let payload: MarkerPayload = protocol::decode(value)?;

        let mut inner = self.shared.lock();
        inner.marker_sets = payload.sets.clone();
        Ok(payload.sets)
    }

    // -- Read accessors ----------------------------------------------------

    /// All worlds from the server configuration (empty before readiness).
    pub fn worlds(&self) -> Vec<WorldDescriptor> {
        self.shared.lock().worlds.values().cloned().collect()
    }

    /// Looks up one world descriptor by name.
    pub fn world(&self, name: &str) -> Option<WorldDescriptor> {
        self.shared.lock().worlds.get(name).cloned()
    }

    /// The server's default world, once ready.
    pub fn default_world(&self) -> Option<String> {
        let inner = self.shared.lock();
        (inner.phase == Phase::Ready).then(|| inner.default_world.clone())
    }

    /// Snapshot of the current player table.
    pub fn players(&self) -> HashMap<String, Player> {
        self.shared.lock().players.clone()
    }

    /// Names of the currently tracked worlds.
    pub fn tracked_worlds(&self) -> Vec<String> {
        self.shared.lock().trackers.keys().cloned().collect()
    }

    /// Unix-millis timestamp of a world's last successfully applied
    /// poll, if it is tracked and has polled at least once.
    pub fn last_poll_ms(&self, world: &str) -> Option<u64> {
        self.shared
            .lock()
            .trackers
            .get(world)
            .and_then(|t| t.last_poll_ms)
    }

    /// Last server time observed in any update payload.
    pub fn last_server_time(&self) -> Option<u64> {
        self.shared.lock().last_server_time
    }

    /// The cached marker sets from the most recent marker fetch.
    pub fn marker_sets(&self) -> HashMap<String, MarkerSet> {
        self.shared.lock().marker_sets.clone()
    }

    /// The server-specified poll interval (zero before readiness).
    pub fn poll_interval(&self) -> Duration {
        self.shared.lock().poll_interval
    }

    /// Readiness + registry gate shared by the on-demand queries.
    fn query_template(
        &self,
        world: &str,
        pick: impl Fn(&Endpoints) -> EndpointTemplate,
    ) -> Result<EndpointTemplate, ClientError> {
        let inner = self.shared.lock();
        if inner.phase != Phase::Ready {
            return Err(ClientError::NotReady);
        }
        if !inner.worlds.contains_key(world) {
            return Err(ClientError::UnknownWorld(world.to_string()));
        }
        let Some(endpoints) = &inner.endpoints else {
            return Err(ClientError::NotReady);
        };
        Ok(pick(endpoints))
    }
}

impl<F: Fetch> Drop for MapClient<F> {
    fn drop(&mut self) {
        self.bootstrap_task.abort();
        let mut inner = self.shared.lock();
        for (_, handle) in inner.trackers.drain() {
            handle.task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Small helpers shared with the bootstrap and tracker modules
// ---------------------------------------------------------------------------

/// Joins a base URL and a (possibly absolute) sub-path with exactly one
/// slash between them.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Current unix time in milliseconds, for `{timestamp}` substitution.
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
