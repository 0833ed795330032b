//! Session error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::PlayerId;

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum SessionError {
    /// Every seat is taken, or a game is underway.
    #[error("lobby is full")]
    LobbyFull,

    #[error("session is closed")]
    Closed,

    #[error("seat {0} isn't connected")]
    SeatNotConnected(PlayerId),

    #[error("the host seat can't be kicked")]
    CannotKickHost,

    #[error("only the host can do that")]
    NotHost,

    #[error("the current round isn't over yet")]
    RoundInProgress,

    #[error("round can't be played with {connected} of {required} seats connected")]
    RoundUnplayable { connected: usize, required: usize },

    #[error("name can't be empty")]
    EmptyName,

    #[error("invalid session configuration: {0}")]
    InvalidConfiguration(String),

    /// The listener couldn't be bound.
    #[error("couldn't bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
}
