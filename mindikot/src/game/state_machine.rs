//! The round state and the turn dispatcher that drives it.
//!
//! [`GameState`] is the single mutable aggregate of a round. Only the
//! dispatcher methods on it mutate it, always validating an input fully
//! before touching anything, so a rejected input leaves the state exactly
//! as it was and the outstanding request can simply be answered again.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use thiserror::Error;

use super::{
    constants::{LEFT_SUFFIX, TEAM_IDS},
    deck,
    entities::{
        Card, GameMode, InputType, Player, PlayerId, PlayerInput, Suit, Team, TeamId, TrickPlay,
        TrumpDecision, form_teams,
    },
    functional::{RoundResult, determine_trick_winner, determine_valid_moves, evaluate_round},
    trump,
};

/// The input arrived at the wrong time, from the wrong seat, or is the
/// wrong kind of input.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum TurnViolation {
    #[error("no input is expected right now")]
    NoInputExpected,
    #[error("not your turn (waiting on seat {expected})")]
    NotYourTurn {
        expected: PlayerId,
        actual: PlayerId,
    },
    #[error("expected input: {expected}")]
    UnexpectedInput { expected: InputType },
}

/// The input was the right kind at the right time but breaks a rule of play.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum RuleViolation {
    #[error("{card} isn't in your hand")]
    CardNotInHand { card: Card },
    #[error("must follow suit {lead}")]
    MustFollowSuit { lead: Suit },
    #[error("must play the revealed trump {trump} while holding one")]
    MustPlayRevealedTrump { trump: Suit },
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error(transparent)]
    Turn(#[from] TurnViolation),
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    #[error("unsupported player count {player_count} (need 4 or 6)")]
    InvalidConfiguration { player_count: usize },
}

/// Phase of a round, derived from the state rather than stored.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Seats are filling up and nothing has been dealt.
    Lobby,
    AwaitingLead,
    AwaitingFollow,
    AwaitingTrumpDecision,
    /// Between tricks with no request outstanding.
    TrickComplete,
    RoundComplete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Lobby => "lobby",
            Self::AwaitingLead => "awaiting lead",
            Self::AwaitingFollow => "awaiting follow",
            Self::AwaitingTrumpDecision => "awaiting trump decision",
            Self::TrickComplete => "trick complete",
            Self::RoundComplete => "round complete",
        };
        write!(f, "{repr}")
    }
}

/// A resolved trick.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TrickOutcome {
    pub winner: PlayerId,
    pub team_id: TeamId,
    pub plays: Vec<TrickPlay>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundOutcome {
    pub last_trick: TrickOutcome,
    pub result: RoundResult,
}

/// What an accepted input did to the round.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    /// Play moves on within the current trick.
    Continue,
    /// A trick was resolved and its winner has been asked to lead.
    TrickComplete(TrickOutcome),
    /// The last trick was resolved and the round has been evaluated.
    RoundComplete(RoundOutcome),
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameState {
    /// Seated players. A player's id is its index here.
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    pub game_mode: GameMode,
    pub current_leader_index: PlayerId,
    pub trump_suit: Option<Suit>,
    pub trump_revealed: bool,
    /// Card set aside face down in [`GameMode::FirstCardHidden`].
    pub hidden_card: Option<Card>,
    pub hidden_card_owner: Option<PlayerId>,
    pub current_trick_plays: Vec<TrickPlay>,
    pub tricks_won: BTreeMap<TeamId, u32>,
    pub awaiting_input_from_player_index: Option<PlayerId>,
    pub required_input_type: Option<InputType>,
    /// Reveal/pass decision made by the awaited player during their
    /// current turn. Cleared by the card they go on to play.
    pub trump_decision: Option<TrumpDecision>,
}

impl GameState {
    /// An undealt state used while seats are filling up.
    #[must_use]
    pub fn lobby(players: Vec<Player>, game_mode: GameMode) -> Self {
        let teams = form_teams(&players);
        Self {
            players,
            teams,
            game_mode,
            current_leader_index: 0,
            trump_suit: None,
            trump_revealed: false,
            hidden_card: None,
            hidden_card_owner: None,
            current_trick_plays: Vec::new(),
            tricks_won: TEAM_IDS.iter().map(|&id| (id, 0)).collect(),
            awaiting_input_from_player_index: None,
            required_input_type: None,
            trump_decision: None,
        }
    }

    /// Deals a fresh round to `players` and asks `first_leader` to lead.
    ///
    /// Hands and collected cards from any previous round are discarded. In
    /// [`GameMode::FirstCardHidden`] the first leader's hidden card is set
    /// aside before the request goes out.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfiguration`] unless there are 4 or 6
    /// players.
    pub fn new_round<R: Rng + ?Sized>(
        mut players: Vec<Player>,
        game_mode: GameMode,
        first_leader: PlayerId,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        let player_count = players.len();
        let deck = deck::generate_deck_with_rng(player_count, rng)?;
        let hands = deck::deal(deck, player_count)?;
        for (player, hand) in players.iter_mut().zip(hands) {
            player.hand = hand;
        }

        let first_leader = first_leader % player_count;
        let mut state = Self::lobby(players, game_mode);
        state.current_leader_index = first_leader;
        if game_mode == GameMode::FirstCardHidden {
            trump::set_aside_hidden_card(&mut state, first_leader, rng);
        }
        state.request_input(first_leader);
        debug!(
            "dealt {player_count}-player round in {game_mode} mode, seat {first_leader} leads"
        );
        Ok(state)
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn lead_suit(&self) -> Option<Suit> {
        self.current_trick_plays.first().map(|play| play.card.suit)
    }

    /// Trump suit as it applies to trick resolution right now.
    #[must_use]
    pub fn active_trump(&self) -> Option<Suit> {
        self.trump_suit.filter(|_| self.trump_revealed)
    }

    #[must_use]
    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|team| team.id == id)
    }

    /// Nothing dealt, nothing played.
    #[must_use]
    pub fn is_lobby(&self) -> bool {
        self.players.iter().all(|player| player.hand.is_empty())
            && self.teams.iter().all(|team| team.collected_cards.is_empty())
            && self.hidden_card.is_none()
            && self.current_trick_plays.is_empty()
            && self.tricks_won.values().all(|&count| count == 0)
    }

    /// Every card has been played and the last trick resolved.
    #[must_use]
    pub fn is_round_over(&self) -> bool {
        self.players.iter().all(|player| player.hand.is_empty())
            && self.hidden_card.is_none()
            && self.current_trick_plays.is_empty()
            && self.tricks_won.values().any(|&count| count > 0)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        match (self.awaiting_input_from_player_index, self.required_input_type) {
            (Some(_), Some(InputType::RevealOrPass)) => Phase::AwaitingTrumpDecision,
            (Some(_), _) if self.current_trick_plays.is_empty() => Phase::AwaitingLead,
            (Some(_), _) => Phase::AwaitingFollow,
            (None, _) if self.is_lobby() => Phase::Lobby,
            (None, _) if self.is_round_over() => Phase::RoundComplete,
            (None, _) => Phase::TrickComplete,
        }
    }

    /// Cards the given player could legally play right now, including the
    /// constraint a Reveal puts on the rest of that player's turn.
    #[must_use]
    pub fn legal_cards(&self, player_id: PlayerId) -> Vec<Card> {
        let Some(player) = self.players.get(player_id) else {
            return Vec::new();
        };
        let valid = determine_valid_moves(
            &player.hand,
            &self.current_trick_plays,
            self.trump_suit,
            self.trump_revealed,
        );
        match self.revealed_trump_owed(player) {
            Some(trump) => valid.into_iter().filter(|card| card.suit == trump).collect(),
            None => valid,
        }
    }

    /// Total cards in hands, tricks won, the current trick and the hidden
    /// slot. Equal to the deck size throughout an undisturbed round.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.players.iter().map(|player| player.hand.len()).sum::<usize>()
            + self
                .teams
                .iter()
                .map(|team| team.collected_cards.len())
                .sum::<usize>()
            + self.current_trick_plays.len()
            + usize::from(self.hidden_card.is_some())
    }

    /// Checks the structural invariants that must hold between any two
    /// transitions, returning a description of the first one broken.
    pub fn check_invariants(&self) -> Result<(), &'static str> {
        if self.trump_revealed && self.trump_suit.is_none() {
            return Err("trump revealed without a trump suit");
        }
        if self.hidden_card.is_some()
            && (self.game_mode != GameMode::FirstCardHidden || self.trump_revealed)
        {
            return Err("hidden card outside an unrevealed hidden-card round");
        }
        if self.hidden_card.is_some() != self.hidden_card_owner.is_some() {
            return Err("hidden card and its owner out of step");
        }
        if self.current_trick_plays.len() >= self.player_count() && self.player_count() > 0 {
            return Err("complete trick left unresolved");
        }
        if self.awaiting_input_from_player_index.is_some() != self.required_input_type.is_some() {
            return Err("input request half set");
        }
        let between = matches!(
            self.phase(),
            Phase::Lobby | Phase::TrickComplete | Phase::RoundComplete
        );
        if self.awaiting_input_from_player_index.is_some() == between {
            return Err("request outstanding between tricks or missing mid-trick");
        }
        Ok(())
    }

    /// Asks `player_index` for their next input and records what kind of
    /// input that is.
    ///
    /// A hidden card that was never revealed goes back to its owner here
    /// once the owner has nothing else left to play.
    pub fn request_input(&mut self, player_index: PlayerId) -> InputType {
        trump::return_hidden_card_if_due(self, player_index);
        let required = self.input_type_for(player_index);
        self.awaiting_input_from_player_index = Some(player_index);
        self.required_input_type = Some(required);
        debug!("requesting '{required}' from seat {player_index}");
        required
    }

    fn input_type_for(&self, player_index: PlayerId) -> InputType {
        let Some(lead) = self.lead_suit() else {
            return InputType::PlayCard;
        };
        let can_follow = self
            .players
            .get(player_index)
            .is_some_and(|player| player.holds_suit(lead));
        if can_follow || self.trump_revealed {
            return InputType::PlayCard;
        }

        match self.game_mode {
            GameMode::ChooseWhenEmpty => InputType::ChooseTrumpSuit,
            GameMode::FirstCardHidden
                if self.trump_decision.is_none() && self.hidden_card.is_some() =>
            {
                InputType::RevealOrPass
            }
            GameMode::FirstCardHidden => InputType::PlayCard,
        }
    }

    /// Applies one input from `player_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Turn`] when the input is out of turn or of the
    /// wrong kind and [`GameError::Rule`] when the card can't be played. In
    /// both cases the state is left untouched.
    pub fn process_player_input(
        &mut self,
        player_id: PlayerId,
        input: PlayerInput,
    ) -> Result<Transition, GameError> {
        let required = self.validate_turn(player_id, input)?;
        match input {
            PlayerInput::TrumpDecision { decision } => {
                self.apply_trump_decision(player_id, decision);
                Ok(Transition::Continue)
            }
            PlayerInput::PlayCard { card } => {
                self.validate_play(player_id, card)?;
                Ok(self.apply_play(player_id, card, required))
            }
        }
    }

    fn validate_turn(
        &self,
        player_id: PlayerId,
        input: PlayerInput,
    ) -> Result<InputType, TurnViolation> {
        let expected = self
            .awaiting_input_from_player_index
            .ok_or(TurnViolation::NoInputExpected)?;
        if player_id != expected {
            return Err(TurnViolation::NotYourTurn {
                expected,
                actual: player_id,
            });
        }
        let required = self
            .required_input_type
            .ok_or(TurnViolation::NoInputExpected)?;
        if !input.satisfies(required) {
            return Err(TurnViolation::UnexpectedInput { expected: required });
        }
        Ok(required)
    }

    fn validate_play(&self, player_id: PlayerId, card: Card) -> Result<(), RuleViolation> {
        let player = &self.players[player_id];
        if !player.hand.contains(&card) {
            return Err(RuleViolation::CardNotInHand { card });
        }

        let valid = determine_valid_moves(
            &player.hand,
            &self.current_trick_plays,
            self.trump_suit,
            self.trump_revealed,
        );
        if !valid.contains(&card) {
            if let Some(lead) = self.lead_suit() {
                return Err(RuleViolation::MustFollowSuit { lead });
            }
        }

        if let Some(trump) = self.revealed_trump_owed(player) {
            if card.suit != trump {
                return Err(RuleViolation::MustPlayRevealedTrump { trump });
            }
        }
        Ok(())
    }

    /// The trump suit `player` still owes this turn after revealing it.
    fn revealed_trump_owed(&self, player: &Player) -> Option<Suit> {
        if self.awaiting_input_from_player_index != Some(player.id)
            || self.trump_decision != Some(TrumpDecision::Reveal)
        {
            return None;
        }
        self.trump_suit.filter(|&trump| player.holds_suit(trump))
    }

    fn apply_trump_decision(&mut self, player_id: PlayerId, decision: TrumpDecision) {
        if decision == TrumpDecision::Reveal {
            trump::reveal_hidden_card(self);
        }
        self.trump_decision = Some(decision);
        debug!("seat {player_id} {decision}");
        self.request_input(player_id);
    }

    fn apply_play(&mut self, player_id: PlayerId, card: Card, required: InputType) -> Transition {
        let hand = &mut self.players[player_id].hand;
        if let Some(pos) = hand.iter().position(|held| *held == card) {
            hand.remove(pos);
        }
        if required == InputType::ChooseTrumpSuit {
            trump::set_trump_from_play(self, card);
        }
        self.current_trick_plays.push(TrickPlay { player_id, card });
        self.trump_decision = None;
        self.clear_request();

        let player_count = self.player_count();
        assert!(
            self.current_trick_plays.len() <= player_count,
            "trick holds {} plays at a {player_count}-player table",
            self.current_trick_plays.len()
        );
        if self.current_trick_plays.len() < player_count {
            self.request_input((player_id + 1) % player_count);
            return Transition::Continue;
        }

        let last_trick = self.finish_trick();
        if self.is_round_over() {
            let result = evaluate_round(&self.teams, &self.tricks_won);
            debug!("round over: {result:?}");
            Transition::RoundComplete(RoundOutcome { last_trick, result })
        } else {
            self.request_input(last_trick.winner);
            Transition::TrickComplete(last_trick)
        }
    }

    /// Moves a complete trick to the winning team and makes the winner
    /// the next leader.
    fn finish_trick(&mut self) -> TrickOutcome {
        let plays = std::mem::take(&mut self.current_trick_plays);
        let Some(winning_play) = determine_trick_winner(&plays, self.active_trump()) else {
            unreachable!("a complete trick has at least one play");
        };

        let winner = winning_play.player_id;
        let team_id = self.players[winner].team_id;
        if let Some(team) = self.teams.iter_mut().find(|team| team.id == team_id) {
            team.collected_cards.extend(plays.iter().map(|play| play.card));
        }
        *self.tricks_won.entry(team_id).or_insert(0) += 1;
        self.current_leader_index = winner;
        debug!("seat {winner} takes the trick with {}", winning_play.card);

        TrickOutcome {
            winner,
            team_id,
            plays,
        }
    }

    fn clear_request(&mut self) {
        self.awaiting_input_from_player_index = None;
        self.required_input_type = None;
    }

    /// Marks a seat whose connection dropped. The seat keeps its id, its
    /// hand is discarded and any request to it stays outstanding.
    pub fn mark_player_left(&mut self, player_id: PlayerId) {
        if let Some(player) = self.players.get_mut(player_id) {
            if !player.has_left() {
                player.name.push_str(LEFT_SUFFIX);
            }
            player.hand.clear();
        }
    }
}
