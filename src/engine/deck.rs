use crate::engine::card::{Card, Rank, Suit};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{SeedableRng, rng};
use serde::{Deserialize, Serialize};

/// Face-down draw pile. The top of the pile is the end of the vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Builds `total_decks` standard 52-card decks plus `total_jokers` jokers,
    /// in a fixed order. Ids are only unique up to [`MAX_DECKS`](crate::engine::card::MAX_DECKS)
    /// decks, which `GameConfig::validate` enforces.
    pub fn new(total_decks: u16, total_jokers: u16) -> Self {
        let mut cards = Vec::with_capacity(total_decks as usize * 52 + total_jokers as usize);

        for deck_index in 0..total_decks {
            for suit in Suit::ALL {
                for rank in Rank::ALL {
                    cards.push(Card::standard(suit, rank, deck_index));
                }
            }
        }
        for index in 0..total_jokers {
            cards.push(Card::joker(index));
        }

        Self { cards }
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn shuffle(&mut self) {
        let mut rng = rng();
        self.shuffle_with(&mut rng);
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Shuffles deterministically from `seed`.
    pub fn shuffle_seeded(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.shuffle_with(&mut rng);
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Removes up to `count` cards from the top, in draw order.
    pub fn deal(&mut self, count: usize) -> Vec<Card> {
        let take = count.min(self.cards.len());
        let mut dealt = self.cards.split_off(self.cards.len() - take);
        dealt.reverse();
        dealt
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::card::MAX_DECKS;

    #[test]
    fn test_deck_creation() {
        let deck = Deck::new(2, 4);
        assert_eq!(deck.remaining(), 108);

        let jokers = deck.cards.iter().filter(|c| c.is_joker()).count();
        assert_eq!(jokers, 4);
    }

    #[test]
    fn classic_deck_has_no_jokers() {
        let deck = Deck::new(2, 0);
        assert_eq!(deck.remaining(), 104);
        assert!(deck.cards.iter().all(|c| !c.is_joker()));
    }

    #[test]
    fn card_ids_are_unique() {
        let deck = Deck::new(2, 4);
        let ids: std::collections::HashSet<_> = deck.cards.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), deck.remaining());
    }

    #[test]
    fn card_ids_stay_unique_at_the_deck_limit() {
        let deck = Deck::new(MAX_DECKS, 4);
        let ids: std::collections::HashSet<_> = deck.cards.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), MAX_DECKS as usize * 52 + 4);
    }

    #[test]
    fn test_deck_draw() {
        let mut deck = Deck::new(2, 4);
        let initial_len = deck.remaining();

        let card = deck.draw();
        assert!(card.is_some());
        assert_eq!(deck.remaining(), initial_len - 1);
    }

    #[test]
    fn deal_takes_from_the_top() {
        let mut deck = Deck::new(1, 0);
        let top = *deck.cards.last().unwrap();
        let hand = deck.deal(5);
        assert_eq!(hand.len(), 5);
        assert_eq!(hand[0], top);
        assert_eq!(deck.remaining(), 47);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let mut a = Deck::new(2, 4);
        let mut b = Deck::new(2, 4);
        a.shuffle_seeded(42);
        b.shuffle_seeded(42);
        assert_eq!(a, b);
        assert_ne!(a, Deck::new(2, 4));
    }
}
