//! Trump transitions for both game modes.

use log::debug;
use rand::Rng;

use super::{
    entities::{Card, PlayerId, Suit},
    state_machine::GameState,
};

/// A void player's forced play in [`GameMode::ChooseWhenEmpty`] names trump.
///
/// [`GameMode::ChooseWhenEmpty`]: super::entities::GameMode::ChooseWhenEmpty
pub(crate) fn set_trump_from_play(state: &mut GameState, card: Card) {
    state.trump_suit = Some(card.suit);
    state.trump_revealed = true;
    debug!("trump set to {} by the card played", card.suit);
}

/// Moves a random card from `owner`'s hand into the hidden slot.
pub(crate) fn set_aside_hidden_card<R: Rng + ?Sized>(
    state: &mut GameState,
    owner: PlayerId,
    rng: &mut R,
) -> Option<Card> {
    let hand = &mut state.players.get_mut(owner)?.hand;
    if hand.is_empty() {
        return None;
    }
    let card = hand.remove(rng.random_range(0..hand.len()));
    state.hidden_card = Some(card);
    state.hidden_card_owner = Some(owner);
    debug!("seat {owner} set a card aside face down");
    Some(card)
}

/// Turns the hidden card over: its suit becomes trump and the card goes
/// back into its owner's hand.
pub(crate) fn reveal_hidden_card(state: &mut GameState) -> Option<Suit> {
    let card = state.hidden_card.take()?;
    let owner = state.hidden_card_owner.take();
    if let Some(player) = owner.and_then(|id| state.players.get_mut(id)) {
        player.hand.push(card);
    }
    state.trump_suit = Some(card.suit);
    state.trump_revealed = true;
    debug!("hidden card {card} revealed, trump is {}", card.suit);
    Some(card.suit)
}

/// Hands a never-revealed hidden card back to its owner, face down, once
/// the owner is due to act with nothing else in hand.
pub(crate) fn return_hidden_card_if_due(state: &mut GameState, player_index: PlayerId) -> bool {
    if state.hidden_card_owner != Some(player_index) {
        return false;
    }
    let Some(player) = state.players.get_mut(player_index) else {
        return false;
    };
    if !player.hand.is_empty() {
        return false;
    }
    let Some(card) = state.hidden_card.take() else {
        return false;
    };
    player.hand.push(card);
    state.hidden_card_owner = None;
    debug!("hidden card returned unrevealed to seat {player_index}");
    true
}
