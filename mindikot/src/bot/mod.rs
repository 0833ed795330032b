//! Automatic players.
//!
//! A bot is an ordinary client seat whose inputs come from a
//! [`BotDecisionMaker`] instead of a terminal. Two styles exist:
//!
//! - **Random**: any legal input
//! - **Greedy**: cheapest winning card, tens to a winning partner, lowest
//!   card otherwise; reveals hidden trump when an opponent holds the trick

pub mod decision;

pub use decision::{BotDecisionMaker, BotStyle, ParseBotStyleError};
