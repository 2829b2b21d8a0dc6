//! WebSocket server for players and observers
//!
//! Each accepted socket is split: a writer task drains the connection's
//! [`Sink`] channel onto the socket, while the connection task reads text
//! frames and feeds them to the player's game or the observer's session.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::core::GameState;
use crate::engine::{ObserverSession, Outbound, PlayerSession, SessionRegistry, Sink, SinkId};
use crate::protocol::{self, WireFrame};
use crate::types::GRAVITY_MS;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub gravity_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            gravity_ms: GRAVITY_MS,
        }
    }
}

impl ServerConfig {
    /// Create from `TETRIS_HOST`, `TETRIS_PORT` and `TETRIS_GRAVITY_MS`.
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("TETRIS_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);
        let port = env::var("TETRIS_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let gravity_ms = env::var("TETRIS_GRAVITY_MS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|&ms| ms > 0)
            .unwrap_or(defaults.gravity_ms);

        Self {
            host,
            port,
            gravity_ms,
        }
    }

    /// Resolve and bind the listen address. `host` may be an IP or a hostname.
    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        TcpListener::bind((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("failed to bind {}:{}", self.host, self.port))
    }

    pub fn gravity_period(&self) -> Duration {
        Duration::from_millis(self.gravity_ms)
    }
}

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub config: Arc<ServerConfig>,
}

/// `/ws` for players, `/snoop` for observers, `/health` for probes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(player_handler))
        .route("/snoop", get(observer_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Bind, serve until `shutdown` resolves, then close every open connection.
///
/// `ready_tx` receives the bound address once the listener is up, which lets
/// tests bind port 0.
pub async fn run_server(
    config: ServerConfig,
    registry: Arc<SessionRegistry>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = config.bind().await?;
    let local_addr = listener.local_addr()?;

    info!("Tetris server listening on {}", local_addr);
    info!("   Players:   ws://{}/ws", local_addr);
    info!("   Observers: ws://{}/snoop", local_addr);

    if let Some(tx) = ready_tx {
        let _ = tx.send(local_addr);
    }

    let state = AppState {
        registry: Arc::clone(&registry),
        config: Arc::new(config),
    };

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutting down, closing open connections");
            registry.close_all();
        })
        .await
        .context("server error")
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn player_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_player(socket, state))
}

async fn observer_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_observer(socket, state))
}

async fn handle_player(socket: WebSocket, state: AppState) {
    let id = state.registry.next_id();
    let (sink, rx) = Sink::channel(id);
    let (sender, mut receiver) = socket.split();
    let writer = tokio::spawn(write_outbound(sender, rx, id));

    let game = GameState::new(rand::random());
    info!("Player {} connected (seed {})", id, game.seed());
    let player = PlayerSession::start(
        Arc::clone(&state.registry),
        sink,
        game,
        state.config.gravity_period(),
    )
    .await;

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match protocol::parse_player_command(text.as_str()) {
                Some(command) => {
                    player.handle(command).await;
                }
                None => debug!("Player {} sent unknown token {:?}", id, text.as_str()),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket error for player {}: {}", id, e);
                break;
            }
        }
    }

    drop(player);
    writer.abort();
    info!("Player {} disconnected", id);
}

async fn handle_observer(socket: WebSocket, state: AppState) {
    let id = state.registry.next_id();
    let (sink, rx) = Sink::channel(id);
    let (sender, mut receiver) = socket.split();
    let writer = tokio::spawn(write_outbound(sender, rx, id));

    let observer = ObserverSession::start(Arc::clone(&state.registry), sink);
    info!("Observer {} connected", id);

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match protocol::parse_observer_request(text.as_str()) {
                Some(request) => observer.handle(request).await,
                None => debug!("Observer {} sent unknown token {:?}", id, text.as_str()),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket error for observer {}: {}", id, e);
                break;
            }
        }
    }

    drop(observer);
    writer.abort();
    info!("Observer {} disconnected", id);
}

/// Drain a connection's outbound queue onto its socket
async fn write_outbound(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    id: SinkId,
) {
    while let Some(msg) = rx.recv().await {
        let text = match protocol::encode_outbound(&msg) {
            Ok(WireFrame::Text(text)) => text,
            Ok(WireFrame::Close) => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            Err(e) => {
                warn!("Failed to encode message for {}: {}", id, e);
                continue;
            }
        };
        if sender.send(Message::Text(text.into())).await.is_err() {
            debug!("Connection {} gone, writer stopping", id);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.gravity_period(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_bind_accepts_hostname() {
        let config = ServerConfig {
            host: "localhost".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        let listener = config.bind().await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn test_run_server_on_hostname_reports_address() {
        let config = ServerConfig {
            host: "localhost".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        let registry = Arc::new(SessionRegistry::new());
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(run_server(config, registry, Some(ready_tx), async move {
            let _ = stop_rx.await;
        }));

        let addr = ready_rx.await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);

        stop_tx.send(()).unwrap();
        assert!(server.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_an_error() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        assert!(config.bind().await.is_err());
    }

    #[test]
    fn test_server_config_from_env() {
        // Only checks that reading the environment never panics
        let config = ServerConfig::from_env();
        assert!(config.gravity_ms > 0);
    }
}
