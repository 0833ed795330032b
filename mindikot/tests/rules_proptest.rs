/// Property-based tests for the rule engine using proptest
///
/// These tests check trick resolution, legal moves and round scoring over
/// randomly generated tricks and hands, and the dispatcher over randomly
/// seeded rounds.
use mindikot::{
    Card, GameMode, GameState, Player, Rank, Suit, Team, TrickPlay,
    bot::{BotDecisionMaker, BotStyle},
    deck::generate_deck,
    functional::{determine_trick_winner, determine_valid_moves, evaluate_round},
};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use std::collections::BTreeMap;

fn full_deck() -> Vec<Card> {
    generate_deck(4).unwrap()
}

fn suit_strategy() -> impl Strategy<Value = Suit> {
    prop::sample::select(Suit::ALL.to_vec())
}

// Strategy to generate `n` distinct cards in random order
fn distinct_cards(n: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::sample::subsequence(full_deck(), n).prop_shuffle()
}

fn as_trick(cards: &[Card]) -> Vec<TrickPlay> {
    cards
        .iter()
        .enumerate()
        .map(|(player_id, &card)| TrickPlay { player_id, card })
        .collect()
}

proptest! {
    #[test]
    fn test_winner_is_one_of_the_plays(
        cards in distinct_cards(4),
        trump in prop::option::of(suit_strategy()),
    ) {
        let plays = as_trick(&cards);
        let winner = determine_trick_winner(&plays, trump).unwrap();
        prop_assert!(plays.contains(&winner));

        let lead = cards[0].suit;
        let trump_played = trump.is_some_and(|t| cards.iter().any(|c| c.suit == t));
        if trump_played {
            prop_assert_eq!(Some(winner.card.suit), trump);
        } else {
            prop_assert_eq!(winner.card.suit, lead);
        }
    }

    #[test]
    fn test_winner_ignores_order_of_followers(
        cards in distinct_cards(6),
        trump in prop::option::of(suit_strategy()),
        rotation in 0usize..5,
    ) {
        let plays = as_trick(&cards);
        let winner = determine_trick_winner(&plays, trump).unwrap();

        let mut reordered = plays.clone();
        reordered[1..].rotate_left(rotation);
        reordered[1..].reverse();
        prop_assert_eq!(determine_trick_winner(&reordered, trump), Some(winner));
    }

    #[test]
    fn test_valid_moves_follow_suit_when_able(
        cards in distinct_cards(14),
        hand_len in 1usize..=13,
    ) {
        let lead = cards[0];
        let hand = &cards[1..=hand_len];
        let trick = as_trick(&[lead]);
        let valid = determine_valid_moves(hand, &trick, None, false);

        let following: Vec<Card> = hand.iter().copied().filter(|c| c.suit == lead.suit).collect();
        if following.is_empty() {
            prop_assert_eq!(valid, hand.to_vec());
        } else {
            prop_assert_eq!(valid, following);
        }
    }

    #[test]
    fn test_leader_may_play_anything(cards in distinct_cards(13)) {
        prop_assert_eq!(determine_valid_moves(&cards, &[], None, false), cards);
    }

    #[test]
    fn test_all_four_tens_is_kot(
        cards in distinct_cards(52),
        kot_team in 1u8..=2,
        tricks_a in 0u32..=13,
    ) {
        let (tens, others): (Vec<Card>, Vec<Card>) =
            cards.into_iter().partition(|card| card.rank == Rank::Ten);
        let mut teams = vec![Team::new(1, vec![0, 2]), Team::new(2, vec![1, 3])];
        let (winners, losers) = if kot_team == 1 { (0, 1) } else { (1, 0) };
        teams[winners].collected_cards.extend(tens);
        teams[winners].collected_cards.extend(&others[..10]);
        teams[losers].collected_cards.extend(&others[10..]);

        let tricks = BTreeMap::from([(1, tricks_a), (2, 13 - tricks_a)]);
        let result = evaluate_round(&teams, &tricks);
        prop_assert!(result.is_kot);
        prop_assert_eq!(result.winning_team, Some(kot_team));
    }

    #[test]
    fn test_more_tens_wins_without_tie_break(
        cards in distinct_cards(52),
        tricks_a in 0u32..=13,
    ) {
        // Team 1 gets three tens, team 2 one.
        let (tens, others): (Vec<Card>, Vec<Card>) =
            cards.into_iter().partition(|card| card.rank == Rank::Ten);
        let mut teams = vec![Team::new(1, vec![0, 2]), Team::new(2, vec![1, 3])];
        teams[0].collected_cards.extend(&tens[..3]);
        teams[1].collected_cards.extend(&tens[3..]);
        teams[0].collected_cards.extend(&others[..24]);
        teams[1].collected_cards.extend(&others[24..]);

        let tricks = BTreeMap::from([(1, tricks_a), (2, 13 - tricks_a)]);
        let result = evaluate_round(&teams, &tricks);
        prop_assert!(!result.is_kot);
        prop_assert_eq!(result.winning_team, Some(1));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_random_rounds_conserve_cards(
        seed in any::<u64>(),
        six in any::<bool>(),
        hidden in any::<bool>(),
    ) {
        let n = if six { 6 } else { 4 };
        let mode = if hidden { GameMode::FirstCardHidden } else { GameMode::ChooseWhenEmpty };
        let players: Vec<Player> = (0..n).map(|id| Player::new(id, "p")).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = GameState::new_round(players, mode, (seed % n as u64) as usize, &mut rng).unwrap();
        let mut bot = BotDecisionMaker::new(BotStyle::Random, StdRng::seed_from_u64(seed));
        let total = state.card_count();
        prop_assert_eq!(total, if six { 48 } else { 52 });

        let mut revealed = false;
        while let Some(seat) = state.awaiting_input_from_player_index {
            let input = bot.decide(&state, seat).unwrap();
            state.process_player_input(seat, input).unwrap();
            prop_assert!(!revealed || state.trump_revealed);
            revealed = state.trump_revealed;
            prop_assert_eq!(state.card_count(), total);
            prop_assert!(state.check_invariants().is_ok());
        }
        prop_assert!(state.is_round_over());
    }

    #[test]
    fn test_state_json_round_trip(seed in any::<u64>(), steps in 0usize..40) {
        let players: Vec<Player> = (0..4).map(|id| Player::new(id, &format!("p{id}"))).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = GameState::new_round(players, GameMode::FirstCardHidden, 0, &mut rng).unwrap();
        let mut bot = BotDecisionMaker::new(BotStyle::Greedy, StdRng::seed_from_u64(seed));
        for _ in 0..steps {
            let Some(seat) = state.awaiting_input_from_player_index else {
                break;
            };
            let input = bot.decide(&state, seat).unwrap();
            state.process_player_input(seat, input).unwrap();
        }

        let json = serde_json::to_string(&state).unwrap();
        let decoded: GameState = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(decoded, state);
    }
}
