//! Deck generation and dealing.

use rand::{Rng, seq::SliceRandom};

use super::{
    constants::SUPPORTED_PLAYER_COUNTS,
    entities::{Card, Rank, Suit},
    state_machine::GameError,
};

/// Number of cards in the deck used for a table of `player_count`.
///
/// # Errors
///
/// Returns [`GameError::InvalidConfiguration`] for unsupported player counts.
pub fn deck_size(player_count: usize) -> Result<usize, GameError> {
    match player_count {
        4 => Ok(52),
        6 => Ok(48),
        _ => Err(GameError::InvalidConfiguration { player_count }),
    }
}

/// Generates a shuffled deck for `player_count` players using the thread RNG.
///
/// Four players use all 52 cards. Six players drop every two so the deck
/// splits evenly into hands of eight.
///
/// # Errors
///
/// Returns [`GameError::InvalidConfiguration`] unless `player_count` is 4 or 6.
pub fn generate_deck(player_count: usize) -> Result<Vec<Card>, GameError> {
    generate_deck_with_rng(player_count, &mut rand::rng())
}

/// Same as [`generate_deck`] but shuffles with the given RNG.
///
/// # Errors
///
/// Returns [`GameError::InvalidConfiguration`] unless `player_count` is 4 or 6.
pub fn generate_deck_with_rng<R: Rng + ?Sized>(
    player_count: usize,
    rng: &mut R,
) -> Result<Vec<Card>, GameError> {
    let size = deck_size(player_count)?;
    let include_twos = player_count == SUPPORTED_PLAYER_COUNTS[0];

    let mut deck = Vec::with_capacity(size);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            if rank == Rank::Two && !include_twos {
                continue;
            }
            deck.push(Card::new(suit, rank));
        }
    }
    debug_assert_eq!(deck.len(), size);

    deck.shuffle(rng);
    Ok(deck)
}

/// Splits a deck into `player_count` equal hands, dealing round-robin the
/// way cards go around a table.
///
/// # Errors
///
/// Returns [`GameError::InvalidConfiguration`] if the deck doesn't divide
/// evenly between the players.
pub fn deal(deck: Vec<Card>, player_count: usize) -> Result<Vec<Vec<Card>>, GameError> {
    if player_count == 0 || deck.len() % player_count != 0 {
        return Err(GameError::InvalidConfiguration { player_count });
    }

    let hand_size = deck.len() / player_count;
    let mut hands: Vec<Vec<Card>> = (0..player_count)
        .map(|_| Vec::with_capacity(hand_size))
        .collect();
    for (i, card) in deck.into_iter().enumerate() {
        hands[i % player_count].push(card);
    }
    Ok(hands)
}
