//! Protocol module - JSON messages sent to players and watchers, text tokens received
//!
//! Outbound:
//!
//! ```text
//! {"live":[shape,orientation,x,y,max_fall],"next":shape,"board":[row, ...]}
//! {"live":[...],"next":shape,"board":[...],"event":"gameover"}
//! {"alive":[game_id, ...]}
//! ```
//!
//! Inbound tokens are plain text. Players send `cw`, `ccw`, `left`, `right`,
//! `down` or `drop`; observers send `?` or a game id. Anything else is ignored.

use serde::{Deserialize, Serialize};

use crate::core::GameSnapshot;
use crate::engine::Outbound;
use crate::types::{Command, GameId, ObserverRequest};

/// `[shape, orientation, x, y, max_fall]`
pub type LiveTuple = (u8, u8, i8, i8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameEvent {
    GameOver,
}

/// Per-game state message; carries `event` only when the game just ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMessage {
    pub live: LiveTuple,
    pub next: u8,
    pub board: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<GameEvent>,
}

impl From<&GameSnapshot> for StateMessage {
    fn from(snapshot: &GameSnapshot) -> Self {
        let live = snapshot.live;
        Self {
            live: (live.kind.id(), live.orientation, live.x, live.y, live.max_fall),
            next: snapshot.next.id(),
            board: snapshot.board.to_vec(),
            event: snapshot.game_over.then_some(GameEvent::GameOver),
        }
    }
}

/// Reply to an observer's `?`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliveMessage {
    pub alive: Vec<GameId>,
}

/// What the writer task puts on the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireFrame {
    Text(String),
    Close,
}

/// Serialize an outbound message into a socket frame
pub fn encode_outbound(msg: &Outbound) -> serde_json::Result<WireFrame> {
    match msg {
        Outbound::State(snapshot) => {
            serde_json::to_string(&StateMessage::from(snapshot.as_ref())).map(WireFrame::Text)
        }
        Outbound::Games(ids) => serde_json::to_string(&AliveMessage { alive: ids.clone() })
            .map(WireFrame::Text),
        Outbound::Close => Ok(WireFrame::Close),
    }
}

/// Parse a player's text frame
pub fn parse_player_command(text: &str) -> Option<Command> {
    Command::from_token(text.trim())
}

/// Parse an observer's text frame
pub fn parse_observer_request(text: &str) -> Option<ObserverRequest> {
    ObserverRequest::parse(text.trim())
}
