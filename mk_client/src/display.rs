//! Plain-text rendering of what a seat is allowed to see.
//!
//! Snapshots carry every hand and the hidden card. Only the viewer's own
//! hand is printed; everyone else is shown as a card count.

use mindikot::{
    Card, GameState, InputType, PlayerId,
    messages::{DisconnectNotice, RoundSummary, ServerMessage},
};
use std::fmt::Write;

fn sorted(hand: &[Card]) -> Vec<Card> {
    let mut cards = hand.to_vec();
    cards.sort_by_key(|card| (card.suit as u8, card.rank));
    cards
}

fn join_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|card| card.to_string().trim().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The table as seen from `viewer`.
#[must_use]
pub fn render_state(state: &GameState, viewer: PlayerId) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- {} ({} mode) ---", state.phase(), state.game_mode);

    let trump = match (state.trump_suit, state.trump_revealed) {
        (Some(suit), true) => format!("trump {suit}"),
        _ if state.hidden_card.is_some() => match state.hidden_card_owner {
            Some(owner) if owner == viewer => match state.hidden_card {
                Some(card) => format!("trump hidden (you set aside {})", card.to_string().trim()),
                None => "trump hidden".to_string(),
            },
            _ => "trump hidden".to_string(),
        },
        _ => "no trump yet".to_string(),
    };
    let tricks = state
        .tricks_won
        .iter()
        .map(|(team, count)| format!("team {team}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "{trump} | tricks {tricks}");

    for player in &state.players {
        let marker = if state.awaiting_input_from_player_index == Some(player.id) {
            ">"
        } else {
            " "
        };
        let you = if player.id == viewer { " (you)" } else { "" };
        let _ = writeln!(
            out,
            "{marker} [{}] {}{you}, team {}, {} cards",
            player.id,
            player.name,
            player.team_id,
            player.hand.len()
        );
    }

    if !state.current_trick_plays.is_empty() {
        let plays = state
            .current_trick_plays
            .iter()
            .map(|play| format!("[{}] {}", play.player_id, play.card.to_string().trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "trick: {plays}");
    }

    if let Some(player) = state.players.get(viewer) {
        let _ = writeln!(out, "hand: {}", join_cards(&sorted(&player.hand)));
    }
    if let Some(prompt) = render_prompt(state, viewer) {
        let _ = writeln!(out, "{prompt}");
    }
    out
}

/// What the viewer is being asked for, if anything.
#[must_use]
pub fn render_prompt(state: &GameState, viewer: PlayerId) -> Option<String> {
    if state.awaiting_input_from_player_index != Some(viewer) {
        return None;
    }
    let prompt = match state.required_input_type? {
        InputType::RevealOrPass => "your turn: 'reveal' or 'pass'".to_string(),
        required => format!(
            "your turn ({required}), legal: {}",
            join_cards(&sorted(&state.legal_cards(viewer)))
        ),
    };
    Some(prompt)
}

#[must_use]
pub fn render_round_summary(summary: &RoundSummary) -> String {
    let result = &summary.result;
    let tens = result
        .tens_by_team
        .iter()
        .map(|(team, tens)| format!("team {team}: {tens}"))
        .collect::<Vec<_>>()
        .join(", ");
    let outcome = match result.winning_team {
        Some(team) if result.is_kot => format!("team {team} wins by kot!"),
        Some(team) => format!("team {team} wins"),
        None => "draw".to_string(),
    };
    format!(
        "=== round {}: {outcome} (tens {tens}) ===\nscore: {}",
        summary.round_number, summary.scoreboard
    )
}

/// One line for anything that isn't a state update.
#[must_use]
pub fn render_message(msg: &ServerMessage, viewer: PlayerId) -> String {
    match msg {
        ServerMessage::GameStateUpdate(state) => render_state(state, viewer),
        ServerMessage::RoundResult(summary) => render_round_summary(summary),
        ServerMessage::Error(notice) => format!("error: {notice}"),
        ServerMessage::Disconnected(DisconnectNotice { player_id, reason })
            if *player_id == viewer =>
        {
            format!("disconnected: {reason}")
        }
        other => other.to_string(),
    }
}
