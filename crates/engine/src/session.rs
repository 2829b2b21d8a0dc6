//! Per-game sessions
//!
//! A [`GameSession`] owns one [`GameState`] behind an async mutex. Player
//! commands and gravity ticks both take that lock for their whole
//! mutate-and-emit sequence, so they never interleave on the same game.
//!
//! [`PlayerSession`] and [`ObserverSession`] are connection-scoped guards:
//! constructing one registers the connection, dropping it deregisters it (and,
//! for players, stops the gravity task).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::core::{GameSnapshot, GameState, Outcome};
use crate::registry::SessionRegistry;
use crate::sink::{Outbound, Sink, SinkId};
use crate::types::{Command, GameId, ObserverRequest};

/// One game and its exclusive-access lock
pub struct GameSession {
    id: GameId,
    game: Mutex<GameState>,
}

impl GameSession {
    pub fn new(id: GameId, game: GameState) -> Self {
        Self {
            id,
            game: Mutex::new(game),
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    /// Apply a player command and emit the resulting state
    pub async fn handle(&self, registry: &SessionRegistry, command: Command) -> Outcome {
        self.step(registry, |game| game.apply(command)).await
    }

    /// Apply one gravity step and emit the resulting state
    pub async fn tick(&self, registry: &SessionRegistry) -> Outcome {
        self.step(registry, GameState::tick).await
    }

    async fn step(
        &self,
        registry: &SessionRegistry,
        f: impl FnOnce(&mut GameState) -> Outcome,
    ) -> Outcome {
        let mut game = self.game.lock().await;
        let outcome = f(&mut *game);
        if outcome.emits() {
            registry.emit(self.id, Outbound::State(Arc::new(game.snapshot())));
        }
        if outcome.is_game_over() {
            info!("Game {} over", self.id);
        }
        outcome
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        self.game.lock().await.snapshot()
    }

    /// Emit the current state to the player and all watchers
    pub async fn broadcast_state(&self, registry: &SessionRegistry) -> usize {
        let game = self.game.lock().await;
        registry.emit(self.id, Outbound::State(Arc::new(game.snapshot())))
    }

    /// Send the current state to a single sink
    pub async fn send_state(&self, sink: &Sink) -> bool {
        let game = self.game.lock().await;
        sink.send(Outbound::State(Arc::new(game.snapshot())))
    }
}

/// Spawn the gravity loop: one `tick` per period until the game ends.
/// The first tick fires one full period after the call.
pub fn spawn_gravity(
    session: Arc<GameSession>,
    registry: Arc<SessionRegistry>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let outcome = session.tick(&registry).await;
            // A running game never ignores a tick
            if outcome.is_game_over() || !outcome.emits() {
                break;
            }
        }
        debug!("Gravity for game {} stopped", session.id());
    })
}

/// Connection-scoped handle for a player and the game it owns
pub struct PlayerSession {
    session: Arc<GameSession>,
    registry: Arc<SessionRegistry>,
    gravity: JoinHandle<()>,
}

impl PlayerSession {
    /// Register the player under its sink id, send the initial state once, start gravity
    pub async fn start(
        registry: Arc<SessionRegistry>,
        sink: Sink,
        game: GameState,
        gravity_period: Duration,
    ) -> Self {
        let session = Arc::new(GameSession::new(sink.id(), game));
        registry.register_player(sink, Arc::clone(&session));
        session.broadcast_state(&registry).await;

        let gravity = spawn_gravity(Arc::clone(&session), Arc::clone(&registry), gravity_period);
        info!("Game {} started", session.id());

        Self {
            session,
            registry,
            gravity,
        }
    }

    pub fn game_id(&self) -> GameId {
        self.session.id()
    }

    pub fn session(&self) -> &Arc<GameSession> {
        &self.session
    }

    pub async fn handle(&self, command: Command) -> Outcome {
        self.session.handle(&self.registry, command).await
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.gravity.abort();
        self.registry.remove_player(self.session.id());
        info!("Game {} closed", self.session.id());
    }
}

/// Connection-scoped handle for a read-only observer
pub struct ObserverSession {
    sink: Sink,
    registry: Arc<SessionRegistry>,
}

impl ObserverSession {
    pub fn start(registry: Arc<SessionRegistry>, sink: Sink) -> Self {
        registry.register_observer(sink.clone());
        Self { sink, registry }
    }

    pub fn id(&self) -> SinkId {
        self.sink.id()
    }

    /// Answer `?` or switch subscription
    pub async fn handle(&self, request: ObserverRequest) {
        match request {
            ObserverRequest::ListGames => {
                self.sink
                    .send(Outbound::Games(self.registry.list_active_games()));
            }
            ObserverRequest::Subscribe(game_id) => {
                if !self.registry.subscribe(&self.sink, game_id).await {
                    debug!("Observer {} asked for unknown game {}", self.id(), game_id);
                }
            }
        }
    }

    pub fn subscription(&self) -> Option<GameId> {
        self.registry.subscription(self.id())
    }
}

impl Drop for ObserverSession {
    fn drop(&mut self) {
        self.registry.remove_observer(self.sink.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Board;
    use crate::types::PieceKind;
    use tokio::sync::mpsc::UnboundedReceiver;

    async fn next_state(rx: &mut UnboundedReceiver<Outbound>) -> GameSnapshot {
        match rx.recv().await {
            Some(Outbound::State(s)) => *s,
            other => panic!("expected state, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gravity_moves_piece_every_period() {
        let registry = Arc::new(SessionRegistry::new());
        let id = registry.next_id();
        let (sink, mut rx) = Sink::channel(id);
        let game = GameState::from_parts(Board::new(), PieceKind::O, PieceKind::T, 7);
        let player = PlayerSession::start(registry, sink, game, Duration::from_millis(500)).await;

        let initial = next_state(&mut rx).await;
        assert_eq!(initial.live.y, 0);

        let start = Instant::now();
        let first = next_state(&mut rx).await;
        assert_eq!(first.live.y, 1);
        assert!(start.elapsed() >= Duration::from_millis(500));

        let second = next_state(&mut rx).await;
        assert_eq!(second.live.y, 2);
        drop(player);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_player_stops_gravity_and_deregisters() {
        let registry = Arc::new(SessionRegistry::new());
        let id = registry.next_id();
        let (sink, mut rx) = Sink::channel(id);
        let player = PlayerSession::start(
            Arc::clone(&registry),
            sink,
            GameState::new(3),
            Duration::from_millis(500),
        )
        .await;
        assert_eq!(registry.list_active_games(), vec![id]);
        let _ = next_state(&mut rx).await;

        drop(player);
        assert!(registry.list_active_games().is_empty());

        // The registry held the only sender
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gravity_stops_after_game_over() {
        // Stack up the spawn columns so the promoted piece cannot spawn
        let mut rows = vec!["....TT...."; 19];
        rows.insert(0, "..........");
        let board = Board::from_ascii(&rows);
        let registry = Arc::new(SessionRegistry::new());
        let id = registry.next_id();
        let (sink, mut rx) = Sink::channel(id);
        // The flat I already rests on the stack and locks on the first tick
        let game = GameState::from_parts(board, PieceKind::I, PieceKind::O, 1);
        assert_eq!(game.live().max_fall, 0);
        let player = PlayerSession::start(registry, sink, game, Duration::from_millis(100)).await;

        let _initial = next_state(&mut rx).await;
        let terminal = next_state(&mut rx).await;
        assert!(terminal.game_over);

        // No further emissions: the loop ended
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        drop(player);
    }
}
