use crate::engine::card::{Card, Rank, Suit};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombinationKind {
    /// Same suit, consecutive ranks, 3+ cards.
    Suite,
    /// Three of a kind, three distinct suits.
    Brelan,
    /// Four of a kind, one per suit.
    Carre,
}

/// A group of cards together with its classification and cached point total.
/// `kind` is `None` when the cards form no legal combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    pub kind: Option<CombinationKind>,
    pub cards: Vec<Card>,
    pub points: u32,
}

impl Combination {
    /// Classifies `cards` and caches their points.
    pub fn new(cards: Vec<Card>) -> Self {
        let kind = detect_combination_type(&cards);
        let points = calc_points(&cards);
        Self {
            kind,
            cards,
            points,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.kind.is_some()
    }

    pub fn is_suite(&self) -> bool {
        self.kind == Some(CombinationKind::Suite)
    }

    pub fn has_joker(&self) -> bool {
        self.cards.iter().any(Card::is_joker)
    }

    /// Appends a card that already passed [`can_add_card`], reclassifying the group.
    pub(crate) fn push(&mut self, card: Card) {
        self.cards.push(card);
        self.refresh();
    }

    /// Puts `real` where the joker at `position` was and returns the joker.
    pub(crate) fn swap_joker(&mut self, position: usize, real: Card) -> Card {
        let joker = std::mem::replace(&mut self.cards[position], real);
        self.refresh();
        joker
    }

    fn refresh(&mut self) {
        self.kind = detect_combination_type(&self.cards);
        self.points = calc_points(&self.cards);
    }
}

/// Sum of card points. Jokers count for nothing.
pub fn calc_points(cards: &[Card]) -> u32 {
    cards.iter().map(Card::points).sum()
}

fn split_jokers(cards: &[Card]) -> (Vec<(Suit, Rank)>, usize) {
    let mut naturals = Vec::with_capacity(cards.len());
    let mut jokers = 0;
    for card in cards {
        match (card.suit(), card.rank()) {
            (Some(suit), Some(rank)) => naturals.push((suit, rank)),
            _ => jokers += 1,
        }
    }
    (naturals, jokers)
}

/// 3+ cards, one suit, consecutive ranks. Jokers fill gaps from a shared pool.
pub fn validate_suite(cards: &[Card]) -> bool {
    if cards.len() < 3 {
        return false;
    }

    let (mut naturals, jokers) = split_jokers(cards);
    let Some(&(suit, _)) = naturals.first() else {
        return false;
    };
    if naturals.iter().any(|(s, _)| *s != suit) {
        return false;
    }

    naturals.sort_unstable_by_key(|(_, rank)| rank.order());

    let mut jokers_available = jokers as i32;
    for pair in naturals.windows(2) {
        let gap = pair[1].1.order() - pair[0].1.order() - 1;
        if gap < 0 {
            // Duplicate rank
            return false;
        }
        if gap > jokers_available {
            return false;
        }
        jokers_available -= gap;
    }

    true
}

fn same_rank_distinct_suits(cards: &[Card], len: usize) -> bool {
    if cards.len() != len {
        return false;
    }

    let (naturals, jokers) = split_jokers(cards);
    if naturals.is_empty() || jokers > 1 {
        return false;
    }

    let rank = naturals[0].1;
    if naturals.iter().any(|(_, r)| *r != rank) {
        return false;
    }

    let suits: HashSet<Suit> = naturals.iter().map(|(s, _)| *s).collect();
    suits.len() == naturals.len()
}

/// Exactly three cards of one rank in three different suits; one joker may stand in.
pub fn validate_brelan(cards: &[Card]) -> bool {
    same_rank_distinct_suits(cards, 3)
}

/// Exactly four cards of one rank, one per suit; one joker may stand in.
pub fn validate_carre(cards: &[Card]) -> bool {
    same_rank_distinct_suits(cards, 4)
}

/// First match wins: suite, then carre, then brelan.
pub fn detect_combination_type(cards: &[Card]) -> Option<CombinationKind> {
    if validate_suite(cards) {
        Some(CombinationKind::Suite)
    } else if validate_carre(cards) {
        Some(CombinationKind::Carre)
    } else if validate_brelan(cards) {
        Some(CombinationKind::Brelan)
    } else {
        None
    }
}

/// A suite takes any card that keeps it a suite; a brelan only the card that
/// completes a carre; a carre is closed.
pub fn can_add_card(combination: &Combination, card: &Card) -> bool {
    let Some(kind) = combination.kind else {
        return false;
    };

    let mut extended = combination.cards.clone();
    extended.push(*card);

    match kind {
        CombinationKind::Suite => validate_suite(&extended),
        CombinationKind::Brelan => validate_carre(&extended),
        CombinationKind::Carre => false,
    }
}

/// Returns the position of the first joker `real_card` can take the place of.
pub fn can_replace_joker(combination: &Combination, real_card: &Card) -> Option<usize> {
    if !combination.is_valid() || real_card.is_joker() {
        return None;
    }

    combination
        .cards
        .iter()
        .enumerate()
        .filter(|(_, card)| card.is_joker())
        .map(|(position, _)| position)
        .find(|&position| {
            let mut replaced = combination.cards.clone();
            replaced[position] = *real_card;
            detect_combination_type(&replaced).is_some()
        })
}
