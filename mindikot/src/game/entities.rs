use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

use super::constants::{self, TEAM_IDS, TENS_FOR_KOT};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Clubs, Self::Diamonds, Self::Hearts, Self::Spades];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Clubs => "♣",
            Self::Diamonds => "♦",
            Self::Hearts => "♥",
            Self::Spades => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Card ranks, weakest first. The derived ordering is the trick-taking
/// ordering, so comparing two ranks is all trick resolution needs.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Self; 13] = [
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
        Self::Eight,
        Self::Nine,
        Self::Ten,
        Self::Jack,
        Self::Queen,
        Self::King,
        Self::Ace,
    ];

    /// Face value, two through fourteen (ace high).
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8 + 2
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Jack => "J".to_string(),
            Self::Queen => "Q".to_string(),
            Self::King => "K".to_string(),
            Self::Ace => "A".to_string(),
            rank => rank.value().to_string(),
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    #[must_use]
    pub const fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = format!("{}{}", self.rank, self.suit);
        write!(f, "{repr:>3}")
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ParseCardError {
    #[error("empty card")]
    Empty,
    #[error("unknown rank '{0}'")]
    UnknownRank(String),
    #[error("unknown suit '{0}'")]
    UnknownSuit(char),
}

/// Parses shorthand like `10h`, `QS`, `a♠` or `7d`.
impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let suit_char = trimmed.chars().last().ok_or(ParseCardError::Empty)?;
        let suit = match suit_char.to_ascii_lowercase() {
            'c' | '♣' => Suit::Clubs,
            'd' | '♦' => Suit::Diamonds,
            'h' | '♥' => Suit::Hearts,
            's' | '♠' => Suit::Spades,
            other => return Err(ParseCardError::UnknownSuit(other)),
        };
        let rank_part = &trimmed[..trimmed.len() - suit_char.len_utf8()];
        let rank = match rank_part.to_ascii_lowercase().as_str() {
            "2" => Rank::Two,
            "3" => Rank::Three,
            "4" => Rank::Four,
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "10" | "t" => Rank::Ten,
            "j" => Rank::Jack,
            "q" => Rank::Queen,
            "k" => Rank::King,
            "a" => Rank::Ace,
            "" => return Err(ParseCardError::Empty),
            other => return Err(ParseCardError::UnknownRank(other.to_string())),
        };
        Ok(Self::new(suit, rank))
    }
}

/// Seat position, stable for the whole session. Seat 0 is the host.
pub type PlayerId = usize;

pub type TeamId = u8;

/// Team a seat plays for. Partners sit opposite each other, so teams
/// alternate around the table.
#[must_use]
pub fn team_for_seat(seat: PlayerId) -> TeamId {
    TEAM_IDS[seat % TEAM_IDS.len()]
}

/// Trims a display name, replaces control characters, and caps its length.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .take(constants::MAX_NAME_LENGTH)
        .collect()
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team_id: TeamId,
    pub hand: Vec<Card>,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: &str) -> Self {
        Self {
            id,
            name: sanitize_name(name),
            team_id: team_for_seat(id),
            hand: Vec::new(),
        }
    }

    #[must_use]
    pub fn holds_suit(&self, suit: Suit) -> bool {
        self.hand.iter().any(|card| card.suit == suit)
    }

    #[must_use]
    pub fn has_placeholder_name(&self) -> bool {
        self.name.is_empty() || self.name == constants::PLACEHOLDER_NAME
    }

    #[must_use]
    pub fn has_left(&self) -> bool {
        self.name.ends_with(constants::LEFT_SUFFIX)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Team {
    pub id: TeamId,
    /// Ids of the seats playing for this team.
    pub roster: Vec<PlayerId>,
    /// Cards won in tricks this round.
    pub collected_cards: Vec<Card>,
}

impl Team {
    #[must_use]
    pub fn new(id: TeamId, roster: Vec<PlayerId>) -> Self {
        Self {
            id,
            roster,
            collected_cards: Vec::new(),
        }
    }

    #[must_use]
    pub fn count_tens(&self) -> usize {
        self.collected_cards
            .iter()
            .filter(|card| card.rank == Rank::Ten)
            .count()
    }

    #[must_use]
    pub fn has_kot(&self) -> bool {
        self.count_tens() == TENS_FOR_KOT
    }
}

/// Builds both teams from the seated players.
#[must_use]
pub fn form_teams(players: &[Player]) -> Vec<Team> {
    TEAM_IDS
        .iter()
        .map(|&id| {
            let roster = players
                .iter()
                .filter(|player| player.team_id == id)
                .map(|player| player.id)
                .collect();
            Team::new(id, roster)
        })
        .collect()
}

/// How the trump suit becomes known during a round. Chosen once when the
/// session is set up.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    /// The first player unable to follow suit sets trump with the card they play.
    #[default]
    ChooseWhenEmpty,
    /// The first leader hides a card before play; its suit becomes trump
    /// once someone unable to follow suit chooses to reveal it.
    FirstCardHidden,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::ChooseWhenEmpty => "choose when empty",
            Self::FirstCardHidden => "first card hidden",
        };
        write!(f, "{repr}")
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown game mode '{0}' (expected 'choose' or 'hidden')")]
pub struct ParseGameModeError(String);

impl FromStr for GameMode {
    type Err = ParseGameModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "choose" | "choose_when_empty" | "a" => Ok(Self::ChooseWhenEmpty),
            "hidden" | "first_card_hidden" | "b" => Ok(Self::FirstCardHidden),
            other => Err(ParseGameModeError(other.to_string())),
        }
    }
}

/// What kind of input the awaited player owes the dispatcher.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputType {
    PlayCard,
    /// The player can't follow suit and no trump is set yet: the card
    /// they play sets trump.
    ChooseTrumpSuit,
    /// The player can't follow suit and a hidden trump card is waiting to
    /// be revealed or passed over.
    RevealOrPass,
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::PlayCard => "play a card",
            Self::ChooseTrumpSuit => "play a card to set trump",
            Self::RevealOrPass => "reveal or pass",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrumpDecision {
    Reveal,
    Pass,
}

impl fmt::Display for TrumpDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Reveal => "reveals the hidden trump",
            Self::Pass => "passes",
        };
        write!(f, "{repr}")
    }
}

/// Input a player submits to the dispatcher. The explicit `kind` tag is
/// what the wire format decodes against.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerInput {
    PlayCard { card: Card },
    TrumpDecision { decision: TrumpDecision },
}

impl PlayerInput {
    /// Whether this kind of input answers the given request.
    #[must_use]
    pub fn satisfies(&self, required: InputType) -> bool {
        matches!(
            (self, required),
            (Self::PlayCard { .. }, InputType::PlayCard | InputType::ChooseTrumpSuit)
                | (Self::TrumpDecision { .. }, InputType::RevealOrPass)
        )
    }
}

impl fmt::Display for PlayerInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayCard { card } => write!(f, "plays {}", card.to_string().trim()),
            Self::TrumpDecision { decision } => write!(f, "{decision}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TrickPlay {
    pub player_id: PlayerId,
    pub card: Card,
}
