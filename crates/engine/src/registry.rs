//! Session registry - who plays which game and who is watching it
//!
//! One registry is created at process start and shared by `Arc` with every
//! connection. Players are added when their connection is accepted and removed
//! when it closes; observers likewise. Each observer watches at most one game,
//! recorded both in the game's watcher set and in a per-observer back-reference,
//! so switching or dropping a subscription never scans other games.
//!
//! The maps sit behind one short-lived lock that is never held across an await.
//! Emission is synchronous: sinks only enqueue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::session::GameSession;
use crate::sink::{Outbound, Sink, SinkId};
use crate::types::GameId;

struct PlayerEntry {
    sink: Sink,
    session: Arc<GameSession>,
}

#[derive(Default)]
struct RegistryInner {
    players: HashMap<GameId, PlayerEntry>,
    observers: HashMap<SinkId, Sink>,
    watchers: HashMap<GameId, HashMap<SinkId, Sink>>,
    subscriptions: HashMap<SinkId, GameId>,
}

impl RegistryInner {
    /// Drop an observer's current subscription, removing the watcher set once empty
    fn detach(&mut self, observer: SinkId) -> Option<GameId> {
        let game_id = self.subscriptions.remove(&observer)?;
        if let Some(watchers) = self.watchers.get_mut(&game_id) {
            watchers.remove(&observer);
            if watchers.is_empty() {
                self.watchers.remove(&game_id);
            }
        }
        Some(game_id)
    }
}

/// Shared registry of players, observers and subscriptions
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Allocate a connection id (ids start at 1 and are never reused)
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Register a player connection; its sink id becomes the game id
    pub fn register_player(&self, sink: Sink, session: Arc<GameSession>) {
        let game_id = session.id();
        debug_assert_eq!(sink.id(), game_id);
        self.inner
            .lock()
            .players
            .insert(game_id, PlayerEntry { sink, session });
    }

    /// Forget a player. Watchers stay subscribed and simply receive nothing further.
    pub fn remove_player(&self, game_id: GameId) {
        let removed = self.inner.lock().players.remove(&game_id);
        if removed.is_some() {
            debug!("Game {} removed from registry", game_id);
        }
    }

    pub fn register_observer(&self, sink: Sink) {
        self.inner.lock().observers.insert(sink.id(), sink);
    }

    /// Forget an observer and whatever it was watching
    pub fn remove_observer(&self, observer: SinkId) {
        let mut inner = self.inner.lock();
        inner.detach(observer);
        inner.observers.remove(&observer);
    }

    /// Remove an observer from whatever watcher set it is in
    pub fn unsubscribe_all(&self, observer: SinkId) -> Option<GameId> {
        self.inner.lock().detach(observer)
    }

    /// Move `observer` onto `game_id` and send it that game's current state.
    ///
    /// Unknown games are ignored and the existing subscription is kept.
    pub async fn subscribe(&self, observer: &Sink, game_id: GameId) -> bool {
        let session = {
            let mut inner = self.inner.lock();
            let session = match inner.players.get(&game_id) {
                Some(entry) => Arc::clone(&entry.session),
                None => return false,
            };
            inner.detach(observer.id());
            inner
                .watchers
                .entry(game_id)
                .or_default()
                .insert(observer.id(), observer.clone());
            inner.subscriptions.insert(observer.id(), game_id);
            session
        };

        debug!("Observer {} now watching game {}", observer.id(), game_id);
        session.send_state(observer).await;
        true
    }

    /// Deliver `msg` to the game's player and every current watcher.
    /// Failed deliveries are skipped; returns how many sinks accepted it.
    pub fn emit(&self, game_id: GameId, msg: Outbound) -> usize {
        let inner = self.inner.lock();
        let player = inner.players.get(&game_id).map(|entry| &entry.sink);
        let watchers = inner.watchers.get(&game_id).into_iter().flat_map(|w| w.values());

        let mut delivered = 0;
        for sink in player.into_iter().chain(watchers) {
            if sink.send(msg.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Ids of games with a connected player, ascending
    pub fn list_active_games(&self) -> Vec<GameId> {
        let mut ids: Vec<GameId> = self.inner.lock().players.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Game the observer is currently watching
    pub fn subscription(&self, observer: SinkId) -> Option<GameId> {
        self.inner.lock().subscriptions.get(&observer).copied()
    }

    pub fn watcher_count(&self, game_id: GameId) -> usize {
        self.inner
            .lock()
            .watchers
            .get(&game_id)
            .map_or(0, HashMap::len)
    }

    pub fn player_count(&self) -> usize {
        self.inner.lock().players.len()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.lock().observers.len()
    }

    /// Shutdown sweep: ask every open player and observer connection to close
    pub fn close_all(&self) {
        let inner = self.inner.lock();
        for entry in inner.players.values() {
            entry.sink.close();
        }
        for sink in inner.observers.values() {
            sink.close();
        }
        debug!(
            "Closing {} player and {} observer connections",
            inner.players.len(),
            inner.observers.len()
        );
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
