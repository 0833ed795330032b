//! Mindikot rule engine.
//!
//! - [`entities`]: cards, players, teams, modes and inputs
//! - [`deck`]: deck generation and dealing
//! - [`functional`]: legal moves, trick resolution, round scoring
//! - [`trump`]: trump transitions for both modes
//! - [`state_machine`]: the round state and its turn dispatcher

pub mod constants;
pub mod deck;
pub mod entities;
pub mod functional;
pub mod state_machine;
mod trump;

pub use entities::{
    Card, GameMode, InputType, Player, PlayerId, PlayerInput, Rank, Suit, Team, TeamId, TrickPlay,
    TrumpDecision,
};
pub use functional::RoundResult;
pub use state_machine::{
    GameError, GameState, Phase, RoundOutcome, RuleViolation, Transition, TrickOutcome,
    TurnViolation,
};
