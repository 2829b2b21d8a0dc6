//! Fan-out tests - players, observers and subscription switching

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use net_tetris::core::{absolute_blocks, max_fall_distance, Board, GameSnapshot, GameState};
use net_tetris::engine::{ObserverSession, Outbound, PlayerSession, SessionRegistry, Sink};
use net_tetris::types::{Command, ObserverRequest, PieceKind, RotateDirection};

/// Long enough that gravity never fires during a test
const NO_GRAVITY: Duration = Duration::from_secs(3600);

async fn start_player(
    registry: &Arc<SessionRegistry>,
    live: PieceKind,
) -> (PlayerSession, UnboundedReceiver<Outbound>) {
    let (sink, mut rx) = Sink::channel(registry.next_id());
    let game = GameState::from_parts(Board::new(), live, PieceKind::O, 11);
    let player = PlayerSession::start(Arc::clone(registry), sink, game, NO_GRAVITY).await;
    // Initial state
    assert!(matches!(rx.try_recv(), Ok(Outbound::State(_))));
    (player, rx)
}

fn start_observer(
    registry: &Arc<SessionRegistry>,
) -> (ObserverSession, UnboundedReceiver<Outbound>) {
    let (sink, rx) = Sink::channel(registry.next_id());
    (ObserverSession::start(Arc::clone(registry), sink), rx)
}

fn expect_state(rx: &mut UnboundedReceiver<Outbound>) -> GameSnapshot {
    match rx.try_recv() {
        Ok(Outbound::State(snapshot)) => *snapshot,
        other => panic!("expected a state message, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_games_reflects_connected_players() {
    let registry = Arc::new(SessionRegistry::new());
    let (p1, _r1) = start_player(&registry, PieceKind::T).await;
    let (p2, _r2) = start_player(&registry, PieceKind::I).await;
    let (observer, mut orx) = start_observer(&registry);

    observer.handle(ObserverRequest::ListGames).await;
    assert_eq!(
        orx.try_recv(),
        Ok(Outbound::Games(vec![p1.game_id(), p2.game_id()]))
    );

    assert_eq!(registry.player_count(), 2);
    drop(p1);
    assert_eq!(registry.player_count(), 1);
    observer.handle(ObserverRequest::ListGames).await;
    assert_eq!(orx.try_recv(), Ok(Outbound::Games(vec![p2.game_id()])));
}

#[tokio::test]
async fn test_switching_subscription_moves_observer() {
    let registry = Arc::new(SessionRegistry::new());
    let (p1, mut r1) = start_player(&registry, PieceKind::T).await;
    let (p2, mut r2) = start_player(&registry, PieceKind::I).await;
    let (observer, mut orx) = start_observer(&registry);

    observer.handle(ObserverRequest::Subscribe(p1.game_id())).await;
    assert_eq!(expect_state(&mut orx).live.kind, PieceKind::T);

    p1.handle(Command::Left).await;
    assert_eq!(expect_state(&mut r1).live.x, 3);
    assert_eq!(expect_state(&mut orx).live.x, 3);

    // Switching delivers game 2's current state right away
    observer.handle(ObserverRequest::Subscribe(p2.game_id())).await;
    let current = expect_state(&mut orx);
    assert_eq!(current, p2.session().snapshot().await);
    assert_eq!(observer.subscription(), Some(p2.game_id()));
    assert_eq!(registry.watcher_count(p1.game_id()), 0);

    // Game 1 no longer reaches the observer
    p1.handle(Command::Right).await;
    assert!(matches!(r1.try_recv(), Ok(Outbound::State(_))));
    assert!(orx.try_recv().is_err());

    // Game 2 does, alongside its player
    p2.handle(Command::Down).await;
    assert_eq!(expect_state(&mut r2).live.y, 1);
    assert_eq!(expect_state(&mut orx).live.y, 1);
}

#[tokio::test]
async fn test_unknown_game_keeps_current_subscription() {
    let registry = Arc::new(SessionRegistry::new());
    let (p1, _r1) = start_player(&registry, PieceKind::S).await;
    let (observer, mut orx) = start_observer(&registry);

    observer.handle(ObserverRequest::Subscribe(p1.game_id())).await;
    let _ = expect_state(&mut orx);

    observer.handle(ObserverRequest::Subscribe(404)).await;
    assert_eq!(observer.subscription(), Some(p1.game_id()));
    assert!(orx.try_recv().is_err());
}

#[tokio::test]
async fn test_closed_watcher_does_not_block_delivery() {
    let registry = Arc::new(SessionRegistry::new());
    let (p1, mut r1) = start_player(&registry, PieceKind::Z).await;
    let (gone, gone_rx) = start_observer(&registry);
    let (alive, mut alive_rx) = start_observer(&registry);

    gone.handle(ObserverRequest::Subscribe(p1.game_id())).await;
    alive.handle(ObserverRequest::Subscribe(p1.game_id())).await;
    let _ = expect_state(&mut alive_rx);
    drop(gone_rx);

    p1.handle(Command::Drop).await;
    assert!(expect_state(&mut r1).board[19] != 0);
    assert!(expect_state(&mut alive_rx).board[19] != 0);
    drop(gone);
}

#[tokio::test]
async fn test_observer_disconnect_leaves_watcher_sets() {
    let registry = Arc::new(SessionRegistry::new());
    let (p1, _r1) = start_player(&registry, PieceKind::J).await;
    let (observer, _orx) = start_observer(&registry);

    observer.handle(ObserverRequest::Subscribe(p1.game_id())).await;
    assert_eq!(registry.watcher_count(p1.game_id()), 1);
    assert_eq!(registry.observer_count(), 1);

    drop(observer);
    assert_eq!(registry.watcher_count(p1.game_id()), 0);
    assert_eq!(registry.observer_count(), 0);
}

#[tokio::test]
async fn test_late_watcher_of_finished_game_gets_terminal_state() {
    let registry = Arc::new(SessionRegistry::new());
    let mut rows = vec!["....TT...."; 19];
    rows.insert(0, "..........");
    let (sink, mut prx) = Sink::channel(registry.next_id());
    let game = GameState::from_parts(Board::from_ascii(&rows), PieceKind::I, PieceKind::O, 2);
    let player = PlayerSession::start(Arc::clone(&registry), sink, game, NO_GRAVITY).await;
    let _ = expect_state(&mut prx);

    player.handle(Command::Drop).await;
    assert!(expect_state(&mut prx).game_over);

    let (observer, mut orx) = start_observer(&registry);
    observer.handle(ObserverRequest::Subscribe(player.game_id())).await;
    assert!(expect_state(&mut orx).game_over);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_commands_and_gravity_stay_serialized() {
    let registry = Arc::new(SessionRegistry::new());
    let (sink, mut rx) = Sink::channel(registry.next_id());
    let player = Arc::new(
        PlayerSession::start(
            Arc::clone(&registry),
            sink,
            GameState::new(2024),
            Duration::from_millis(1),
        )
        .await,
    );

    let commands = [
        Command::Down,
        Command::Drop,
        Command::Left,
        Command::Rotate(RotateDirection::Cw),
    ];
    let mut tasks = Vec::new();
    for command in commands {
        let player = Arc::clone(&player);
        tasks.push(tokio::spawn(async move {
            for _ in 0..100 {
                player.handle(command).await;
                tokio::task::yield_now().await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    drop(player);

    // The registry held the only sender, so the queue is now finite
    let mut snapshots = Vec::new();
    while let Some(msg) = rx.recv().await {
        match msg {
            Outbound::State(snapshot) => snapshots.push(*snapshot),
            other => panic!("unexpected message {:?}", other),
        }
    }
    assert!(snapshots.len() > 1);

    let mut finished = false;
    for snapshot in &snapshots {
        assert!(!finished, "state emitted after game over");
        if snapshot.game_over {
            finished = true;
            continue;
        }

        let board = Board::from_encoded(&snapshot.board);
        let live = snapshot.live;
        let blocks = absolute_blocks(live.kind, live.orientation, live.x, live.y);
        assert!(!board.collides(&blocks), "overlapping pose in {:?}", snapshot);
        assert_eq!(
            live.max_fall,
            max_fall_distance(&board, live.kind, live.orientation, live.x, live.y)
        );
    }
}
