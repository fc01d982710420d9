//! Property tests for the combination rules (pure, no match state).
//!
//! Properties tested:
//! - A suite is 3+ cards, one suit, no repeated rank, gaps covered by jokers
//! - Point totals ignore card order and never count jokers
//! - No joker on the table means nothing to recover
//! - A fresh deck holds every card exactly once

use proptest::prelude::*;

use crate::engine::card::{Card, Rank, Suit};
use crate::engine::deck::Deck;
use crate::engine::rules::{Combination, calc_points, can_replace_joker, validate_suite};

fn build(specs: Vec<(usize, usize, bool)>) -> Vec<Card> {
    specs
        .into_iter()
        .enumerate()
        .map(|(i, (suit, rank, joker))| {
            if joker {
                Card::joker(i as u16)
            } else {
                Card::standard(Suit::ALL[suit], Rank::ALL[rank], i as u16)
            }
        })
        .collect()
}

/// Any cards at all.
fn loose_hand() -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec((0..4usize, 0..13usize, prop::bool::weighted(0.15)), 0..8).prop_map(build)
}

/// Mostly one suit in a narrow rank window, so suites come up often.
fn run_like_hand() -> impl Strategy<Value = Vec<Card>> {
    (
        0..4usize,
        0..9usize,
        prop::collection::vec((prop::bool::weighted(0.1), 0..5usize, prop::bool::weighted(0.2)), 2..7),
    )
        .prop_map(|(suit, base, specs)| {
            let specs = specs
                .into_iter()
                .map(|(stray, offset, joker)| {
                    let suit = if stray { (suit + 1) % 4 } else { suit };
                    (suit, base + offset, joker)
                })
                .collect();
            build(specs)
        })
}

fn any_hand() -> impl Strategy<Value = Vec<Card>> {
    prop_oneof![loose_hand(), run_like_hand()]
}

/// Independent statement of the suite rule.
fn is_suite_reference(cards: &[Card]) -> bool {
    if cards.len() < 3 {
        return false;
    }
    let naturals: Vec<(Suit, Rank)> = cards
        .iter()
        .filter_map(|c| c.suit().zip(c.rank()))
        .collect();
    let jokers = cards.len() - naturals.len();
    let Some(&(suit, _)) = naturals.first() else {
        return false;
    };
    if naturals.iter().any(|(s, _)| *s != suit) {
        return false;
    }

    let mut orders: Vec<i32> = naturals.iter().map(|(_, r)| r.order()).collect();
    orders.sort_unstable();
    if orders.windows(2).any(|w| w[0] == w[1]) {
        return false;
    }
    let span = (orders[orders.len() - 1] - orders[0] + 1) as usize;
    span - naturals.len() <= jokers
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn prop_validate_suite_matches_rule(cards in any_hand()) {
        prop_assert_eq!(validate_suite(&cards), is_suite_reference(&cards));
    }

    #[test]
    fn prop_points_ignore_order_and_jokers(cards in any_hand(), shift in 0..8usize) {
        let total = calc_points(&cards);

        let mut reversed = cards.clone();
        reversed.reverse();
        prop_assert_eq!(calc_points(&reversed), total);

        let mut rotated = cards.clone();
        if !rotated.is_empty() {
            let len = rotated.len();
            rotated.rotate_left(shift % len);
        }
        prop_assert_eq!(calc_points(&rotated), total);

        let naturals: Vec<Card> = cards.iter().filter(|c| !c.is_joker()).copied().collect();
        prop_assert_eq!(calc_points(&naturals), total);
    }

    #[test]
    fn prop_no_joker_nothing_to_recover(cards in any_hand(), suit in 0..4usize, rank in 0..13usize) {
        let naturals: Vec<Card> = cards.into_iter().filter(|c| !c.is_joker()).collect();
        let combination = Combination::new(naturals);
        let offered = Card::standard(Suit::ALL[suit], Rank::ALL[rank], 40);
        prop_assert_eq!(can_replace_joker(&combination, &offered), None);
    }

    #[test]
    fn prop_fresh_deck_is_complete(decks in 1..4u16, jokers in 0..6u16) {
        let deck = Deck::new(decks, jokers);
        prop_assert_eq!(deck.remaining(), decks as usize * 52 + jokers as usize);

        let mut ids: Vec<_> = deck.cards().iter().map(|c| c.id).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), deck.remaining());
    }
}
