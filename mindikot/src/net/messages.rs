//! Wire messages. Each one travels as `{"type": ..., "data": ...}` on its
//! own line; variants without a payload omit `data`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    game::{GameError, GameState, PlayerId, PlayerInput, RoundResult},
    session::{Scoreboard, SessionError},
};

/// Broad category of an [`ErrorNotice`], so clients can react without
/// parsing the message text.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    TurnViolation,
    RuleViolation,
    Protocol,
    Capacity,
    RoundUnplayable,
    Session,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorNotice {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorNotice {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&GameError> for ErrorNotice {
    fn from(error: &GameError) -> Self {
        let kind = match error {
            GameError::Turn(_) => ErrorKind::TurnViolation,
            GameError::Rule(_) => ErrorKind::RuleViolation,
            GameError::InvalidConfiguration { .. } => ErrorKind::Session,
        };
        Self::new(kind, error.to_string())
    }
}

impl From<&SessionError> for ErrorNotice {
    fn from(error: &SessionError) -> Self {
        let kind = match error {
            SessionError::LobbyFull => ErrorKind::Capacity,
            SessionError::RoundUnplayable { .. } => ErrorKind::RoundUnplayable,
            _ => ErrorKind::Session,
        };
        Self::new(kind, error.to_string())
    }
}

impl fmt::Display for ErrorNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DisconnectNotice {
    /// Seat whose connection ended. The host seat means the session is over.
    pub player_id: PlayerId,
    pub reason: String,
}

/// Sent once a round's last trick is resolved.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundSummary {
    pub round_number: u32,
    pub result: RoundResult,
    pub scoreboard: Scoreboard,
}

/// A message from the host to a client.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// First message on every accepted connection: the seat it plays.
    AssignId(PlayerId),
    /// Full snapshot of the authoritative state.
    GameStateUpdate(GameState),
    RoundResult(RoundSummary),
    Error(ErrorNotice),
    Disconnected(DisconnectNotice),
    /// Every seat is taken. The connection closes after this.
    LobbyFull,
    /// The host removed this seat. The connection closes after this.
    Kicked,
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match &self {
            Self::AssignId(id) => format!("assigned seat {id}"),
            Self::GameStateUpdate(state) => format!("game state ({})", state.phase()),
            Self::RoundResult(summary) => format!("round {} result", summary.round_number),
            Self::Error(notice) => notice.to_string(),
            Self::Disconnected(notice) => {
                format!("seat {} disconnected: {}", notice.player_id, notice.reason)
            }
            Self::LobbyFull => "lobby is full".to_string(),
            Self::Kicked => "kicked by the host".to_string(),
        };
        write!(f, "{repr}")
    }
}

/// A message from a client to the host.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    PlayerName(String),
    PlayerAction(PlayerInput),
    /// Deal the next round. Only honored from the host seat.
    StartNextRound,
    /// Courtesy notice before closing. Clients don't have to send it.
    Disconnect,
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match &self {
            Self::PlayerName(name) => format!("is now known as {name}"),
            Self::PlayerAction(input) => input.to_string(),
            Self::StartNextRound => "started the next round".to_string(),
            Self::Disconnect => "disconnected".to_string(),
        };
        write!(f, "{repr}")
    }
}
