use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    fn index(self) -> u16 {
        match self {
            Suit::Hearts => 0,
            Suit::Diamonds => 1,
            Suit::Clubs => 2,
            Suit::Spades => 3,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suit::Hearts => write!(f, "♥"),
            Suit::Diamonds => write!(f, "♦"),
            Suit::Clubs => write!(f, "♣"),
            Suit::Spades => write!(f, "♠"),
        }
    }
}

/// Card ranks in run order. The Ace sits below the Two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Ace = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Position used for consecutiveness checks (Ace = 1, King = 13).
    pub fn order(self) -> i32 {
        self as i32
    }

    /// Points the rank is worth when laid down.
    pub fn points(self) -> u32 {
        match self {
            Rank::Ace => 11,
            Rank::Jack | Rank::Queen | Rank::King => 10,
            other => other as u32,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Ace => write!(f, "A"),
            Rank::Jack => write!(f, "J"),
            Rank::Queen => write!(f, "Q"),
            Rank::King => write!(f, "K"),
            other => write!(f, "{}", *other as u8),
        }
    }
}

/// Stable identity of a physical card. Two decks hold two 7♥, each with its own id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u16);

const JOKER_ID_BASE: u16 = 1000;

/// Most decks whose natural ids stay below the joker ids.
pub const MAX_DECKS: u16 = JOKER_ID_BASE / 52;

/// Most jokers before their ids run out of `u16`.
pub const MAX_JOKERS: u16 = u16::MAX - JOKER_ID_BASE;

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Standard { suit: Suit, rank: Rank },
    Joker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub face: Face,
}

impl Card {
    /// A natural card from the `deck_index`-th deck.
    pub fn standard(suit: Suit, rank: Rank, deck_index: u16) -> Self {
        let id = deck_index * 52 + suit.index() * 13 + (rank as u16 - 1);
        Self {
            id: CardId(id),
            face: Face::Standard { suit, rank },
        }
    }

    pub fn joker(index: u16) -> Self {
        Self {
            id: CardId(JOKER_ID_BASE + index),
            face: Face::Joker,
        }
    }

    pub fn is_joker(&self) -> bool {
        matches!(self.face, Face::Joker)
    }

    pub fn suit(&self) -> Option<Suit> {
        match self.face {
            Face::Standard { suit, .. } => Some(suit),
            Face::Joker => None,
        }
    }

    pub fn rank(&self) -> Option<Rank> {
        match self.face {
            Face::Standard { rank, .. } => Some(rank),
            Face::Joker => None,
        }
    }

    /// Jokers are worth nothing, whatever rank they stand for.
    pub fn points(&self) -> u32 {
        match self.face {
            Face::Standard { rank, .. } => rank.points(),
            Face::Joker => 0,
        }
    }

    /// Same suit and rank, regardless of which deck the card came from.
    pub fn same_face(&self, other: &Card) -> bool {
        self.face == other.face
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.face {
            Face::Standard { suit, rank } => write!(f, "{}{}", rank, suit),
            Face::Joker => write!(f, "🃏"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_points() {
        let ace_spades = Card::standard(Suit::Spades, Rank::Ace, 0);
        assert_eq!(ace_spades.points(), 11);

        let seven_hearts = Card::standard(Suit::Hearts, Rank::Seven, 0);
        assert_eq!(seven_hearts.points(), 7);

        let jack_clubs = Card::standard(Suit::Clubs, Rank::Jack, 0);
        assert_eq!(jack_clubs.points(), 10);

        assert_eq!(Card::joker(0).points(), 0);
    }

    #[test]
    fn ace_is_lowest_in_run_order() {
        assert!(Rank::Ace.order() < Rank::Two.order());
        assert_eq!(Rank::King.order(), 13);
    }

    #[test]
    fn ids_are_unique_across_decks() {
        let a = Card::standard(Suit::Hearts, Rank::Seven, 0);
        let b = Card::standard(Suit::Hearts, Rank::Seven, 1);
        assert_ne!(a.id, b.id);
        assert!(a.same_face(&b));
        assert_ne!(Card::joker(0).id, Card::joker(1).id);
    }

    #[test]
    fn jokers_have_no_suit_or_rank() {
        let joker = Card::joker(3);
        assert!(joker.is_joker());
        assert_eq!(joker.suit(), None);
        assert_eq!(joker.rank(), None);
    }
}
