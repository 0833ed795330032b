//! Bot decision-making for a single seat.

use rand::{Rng, seq::IndexedRandom};
use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::game::{
    Card, GameState, InputType, PlayerId, PlayerInput, Rank, Suit, TrickPlay, TrumpDecision,
    functional::determine_trick_winner,
};

/// How a bot picks among its legal options.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BotStyle {
    /// Any legal input, uniformly.
    #[default]
    Random,
    /// Wins tricks cheaply, feeds tens to a partner who's already winning,
    /// and otherwise throws its lowest card.
    Greedy,
}

impl fmt::Display for BotStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Random => "random",
            Self::Greedy => "greedy",
        };
        write!(f, "{repr}")
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown bot style '{0}' (expected 'random' or 'greedy')")]
pub struct ParseBotStyleError(String);

impl FromStr for BotStyle {
    type Err = ParseBotStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "greedy" => Ok(Self::Greedy),
            other => Err(ParseBotStyleError(other.to_string())),
        }
    }
}

/// Picks inputs for one seat from the snapshots the host broadcasts.
pub struct BotDecisionMaker<R> {
    style: BotStyle,
    rng: R,
    /// The snapshot last answered through [`BotDecisionMaker::respond`].
    answered: Option<GameState>,
}

impl<R: Rng> BotDecisionMaker<R> {
    pub fn new(style: BotStyle, rng: R) -> Self {
        Self {
            style,
            rng,
            answered: None,
        }
    }

    #[must_use]
    pub fn style(&self) -> BotStyle {
        self.style
    }

    /// Like [`decide`](Self::decide), but stays quiet when `state` is the
    /// snapshot it answered last. The host rebroadcasts unchanged state
    /// after other seats' rejected inputs and renames.
    pub fn respond(&mut self, state: &GameState, seat: PlayerId) -> Option<PlayerInput> {
        if self.answered.as_ref() == Some(state) {
            return None;
        }
        let input = self.decide(state, seat)?;
        self.answered = Some(state.clone());
        Some(input)
    }

    /// Lets the next [`respond`](Self::respond) answer a repeated snapshot,
    /// for when the last answer was refused.
    pub fn forget_answer(&mut self) {
        self.answered = None;
    }

    /// The input `seat` should send for `state`, or `None` when it isn't
    /// that seat's turn or it has nothing it could play.
    pub fn decide(&mut self, state: &GameState, seat: PlayerId) -> Option<PlayerInput> {
        if state.awaiting_input_from_player_index != Some(seat) {
            return None;
        }

        if state.required_input_type? == InputType::RevealOrPass {
            let reveal = match self.style {
                BotStyle::Random => self.rng.random_bool(0.5),
                BotStyle::Greedy => !partner_is_winning(state, seat),
            };
            let decision = if reveal {
                TrumpDecision::Reveal
            } else {
                TrumpDecision::Pass
            };
            return Some(PlayerInput::TrumpDecision { decision });
        }

        let legal = state.legal_cards(seat);
        let card = match self.style {
            BotStyle::Random => legal.choose(&mut self.rng).copied(),
            BotStyle::Greedy => greedy_card(state, seat, &legal),
        }?;
        Some(PlayerInput::PlayCard { card })
    }
}

/// Orders cards by how little it hurts to give them away. Tens are worth
/// keeping, so they sort above every other rank.
fn discard_cost(card: &Card) -> (bool, Rank) {
    (card.rank == Rank::Ten, card.rank)
}

fn current_winner(plays: &[TrickPlay], trump: Option<Suit>) -> Option<TrickPlay> {
    determine_trick_winner(plays, trump)
}

fn partner_is_winning(state: &GameState, seat: PlayerId) -> bool {
    let Some(winning) = current_winner(&state.current_trick_plays, state.active_trump()) else {
        return false;
    };
    let team = |id: PlayerId| state.players.get(id).map(|player| player.team_id);
    winning.player_id != seat && team(winning.player_id) == team(seat)
}

fn greedy_card(state: &GameState, seat: PlayerId, legal: &[Card]) -> Option<Card> {
    let lowest = || legal.iter().min_by_key(|card| discard_cost(card)).copied();

    if state.current_trick_plays.is_empty() {
        // Lead the strongest card that isn't a ten.
        return legal
            .iter()
            .filter(|card| card.rank != Rank::Ten)
            .max_by_key(|card| card.rank)
            .or_else(|| legal.iter().min_by_key(|card| card.rank))
            .copied();
    }

    if partner_is_winning(state, seat) {
        return legal
            .iter()
            .find(|card| card.rank == Rank::Ten)
            .copied()
            .or_else(lowest);
    }

    let sets_trump = state.required_input_type == Some(InputType::ChooseTrumpSuit);
    let cheapest_winner = legal
        .iter()
        .filter(|&&card| {
            let mut plays = state.current_trick_plays.clone();
            plays.push(TrickPlay {
                player_id: seat,
                card,
            });
            let trump = if sets_trump {
                Some(card.suit)
            } else {
                state.active_trump()
            };
            current_winner(&plays, trump).is_some_and(|play| play.player_id == seat)
        })
        .min_by_key(|card| card.rank)
        .copied();
    cheapest_winner.or_else(lowest)
}
