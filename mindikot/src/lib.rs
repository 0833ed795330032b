//! # Mindikot
//!
//! A rule engine and authoritative LAN host for Mindikot, a partnership
//! trick-taking game for four or six players where the goal is to collect
//! the tens.
//!
//! ## Architecture
//!
//! One process hosts a session and owns the only writable [`GameState`].
//! Other players join over TCP and receive full snapshots after every
//! change. A round moves through these phases:
//!
//! - **Lobby**: seats filling up, nothing dealt
//! - **AwaitingLead / AwaitingFollow**: a seat owes a card
//! - **AwaitingTrumpDecision**: a void seat may reveal the hidden trump
//! - **TrickComplete / RoundComplete**: between tricks and rounds
//!
//! ## Core Modules
//!
//! - [`game`]: cards, deck, trump selection, trick engine, round evaluator
//!   and the turn dispatcher
//! - [`session`]: the host's session actor, seats and scoreboard
//! - [`net`]: wire messages, line framing, TCP host and blocking client
//! - [`bot`]: decision logic for automatic seats
//!
//! ## Example
//!
//! ```
//! use mindikot::{GameMode, GameState, Phase, Player};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let players = (0..4).map(|id| Player::new(id, "p")).collect();
//! let mut rng = StdRng::seed_from_u64(7);
//! let state = GameState::new_round(players, GameMode::ChooseWhenEmpty, 0, &mut rng).unwrap();
//! assert_eq!(state.phase(), Phase::AwaitingLead);
//! ```

/// Automatic players.
pub mod bot;

/// Core game logic, entities and the turn dispatcher.
pub mod game;
pub use game::{
    Card, GameError, GameMode, GameState, InputType, Phase, Player, PlayerId, PlayerInput, Rank,
    RoundResult, RuleViolation, Suit, Team, TeamId, Transition, TrickPlay, TrumpDecision,
    TurnViolation, constants, deck, entities, functional,
};

/// Networking components for host/client communication.
pub mod net;
pub use net::{client::Client, messages, server, utils};

/// The host's authoritative session.
pub mod session;
pub use session::{SessionConfig, SessionError};
