//! Host session: the authoritative owner of a table's game state.
//!
//! A [`SessionActor`] runs in its own Tokio task with an mpsc inbox and is
//! the serialization point for everything that touches the game: seat
//! assignment, names, player actions, kicks, round results and shutdown.
//! Connections and the host's terminal talk to it through a cloneable
//! [`SessionHandle`] and receive [`ServerMessage`]s on their own bounded
//! outbound queues.
//!
//! [`ServerMessage`]: crate::net::messages::ServerMessage

pub mod actor;
pub mod config;
pub mod errors;
pub mod messages;
pub mod scoreboard;

pub use actor::{SessionActor, SessionHandle};
pub use config::SessionConfig;
pub use errors::SessionError;
pub use messages::{ConnectionId, SessionMessage, SessionSnapshot};
pub use scoreboard::Scoreboard;
