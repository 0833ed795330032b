//! Pure rule functions: legal moves, trick resolution and round scoring.
//!
//! Nothing here touches a [`GameState`](super::state_machine::GameState);
//! the turn dispatcher feeds these functions the pieces of state they need.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entities::{Card, Suit, Team, TeamId, TrickPlay};

/// Cards from `hand` that may legally be played into `trick_so_far`.
///
/// A leader may play anything. A follower must follow the lead suit when
/// able and may play anything otherwise. The trump arguments don't narrow
/// the result: whether a void player has to decide on trump first is the
/// dispatcher's concern, expressed through the requested input type.
#[must_use]
pub fn determine_valid_moves(
    hand: &[Card],
    trick_so_far: &[TrickPlay],
    _trump_suit: Option<Suit>,
    _trump_revealed: bool,
) -> Vec<Card> {
    let Some(lead) = trick_so_far.first() else {
        return hand.to_vec();
    };

    let following: Vec<Card> = hand
        .iter()
        .copied()
        .filter(|card| card.suit == lead.card.suit)
        .collect();
    if following.is_empty() {
        hand.to_vec()
    } else {
        following
    }
}

/// The winning play of a trick, or `None` for an empty trick.
///
/// The highest trump wins if any trump was played; otherwise the highest
/// card of the lead suit. A deck holds each card once, so there are no ties.
#[must_use]
pub fn determine_trick_winner(plays: &[TrickPlay], trump_suit: Option<Suit>) -> Option<TrickPlay> {
    let lead_suit = plays.first()?.card.suit;
    let highest_of = |suit: Suit| {
        plays
            .iter()
            .filter(|play| play.card.suit == suit)
            .max_by_key(|play| play.card.rank)
            .copied()
    };

    trump_suit
        .and_then(highest_of)
        .or_else(|| highest_of(lead_suit))
}

/// Outcome of a finished round.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundResult {
    /// `None` means the round was drawn.
    pub winning_team: Option<TeamId>,
    /// The winners collected all four tens.
    pub is_kot: bool,
    pub tens_by_team: BTreeMap<TeamId, usize>,
}

impl RoundResult {
    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.winning_team.is_none()
    }
}

/// Decides a round.
///
/// A kot wins outright. Otherwise most tens wins; a tie on a non-zero
/// ten count goes to whichever of the tied teams took more tricks, and is
/// a draw if that's tied too. Nobody holding a ten is a draw.
#[must_use]
pub fn evaluate_round(teams: &[Team], tricks_won: &BTreeMap<TeamId, u32>) -> RoundResult {
    let tens_by_team: BTreeMap<TeamId, usize> =
        teams.iter().map(|team| (team.id, team.count_tens())).collect();

    if let Some(team) = teams.iter().find(|team| team.has_kot()) {
        return RoundResult {
            winning_team: Some(team.id),
            is_kot: true,
            tens_by_team,
        };
    }

    let max_tens = tens_by_team.values().copied().max().unwrap_or(0);
    let winning_team = if max_tens == 0 {
        None
    } else {
        let tied: Vec<TeamId> = tens_by_team
            .iter()
            .filter(|&(_, &tens)| tens == max_tens)
            .map(|(&id, _)| id)
            .collect();
        match tied.as_slice() {
            [only] => Some(*only),
            _ => unique_max(tied.iter().map(|id| {
                let tricks = tricks_won.get(id).copied().unwrap_or(0);
                (*id, tricks)
            })),
        }
    };

    RoundResult {
        winning_team,
        is_kot: false,
        tens_by_team,
    }
}

/// Key of the single largest value, or `None` if the maximum is shared.
fn unique_max<I>(entries: I) -> Option<TeamId>
where
    I: IntoIterator<Item = (TeamId, u32)>,
{
    let mut best: Option<(TeamId, u32)> = None;
    let mut shared = false;
    for (id, value) in entries {
        match best {
            Some((_, top)) if value < top => {}
            Some((_, top)) if value == top => shared = true,
            _ => {
                best = Some((id, value));
                shared = false;
            }
        }
    }
    if shared { None } else { best.map(|(id, _)| id) }
}
