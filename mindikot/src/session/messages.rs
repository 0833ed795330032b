//! Session actor message types.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::{errors::SessionError, scoreboard::Scoreboard};
use crate::{
    game::{GameState, PlayerId},
    net::messages::{ClientMessage, ServerMessage},
};

/// Identifies one accepted connection for its whole life. Seats can be
/// reused in the lobby, connection ids never are.
pub type ConnectionId = u64;

/// Connection id of the host's own seat.
pub const HOST_CONNECTION: ConnectionId = 0;

/// Messages that can be sent to a [`SessionActor`](super::SessionActor).
#[derive(Debug)]
pub enum SessionMessage {
    /// A new connection wants a seat. On success the actor keeps `outbound`
    /// and has already queued `ASSIGN_ID` on it.
    Join {
        outbound: mpsc::Sender<ServerMessage>,
        response: oneshot::Sender<Result<(ConnectionId, PlayerId), SessionError>>,
    },

    /// A decoded message from a connection.
    Inbound {
        connection: ConnectionId,
        message: ClientMessage,
    },

    /// A connection sent something undecodable and is being dropped.
    ProtocolViolation {
        connection: ConnectionId,
        reason: String,
    },

    /// A connection's socket closed.
    Left { connection: ConnectionId },

    /// Host request to remove a remote seat.
    Kick {
        seat: PlayerId,
        response: oneshot::Sender<Result<(), SessionError>>,
    },

    GetSnapshot {
        response: oneshot::Sender<SessionSnapshot>,
    },

    /// Tell every connection the host is leaving and stop the actor.
    Close { response: oneshot::Sender<()> },
}

/// Read-only view of the session for the host's tooling and tests.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    pub state: GameState,
    pub scoreboard: Scoreboard,
    pub round_number: u32,
    /// Per seat: whether a live connection holds it.
    pub connected: Vec<bool>,
    pub round_playable: bool,
}

impl SessionSnapshot {
    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.connected.iter().filter(|&&live| live).count()
    }
}
