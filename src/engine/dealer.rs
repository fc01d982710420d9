use rand::{Rng, RngExt};

use crate::engine::card::Card;
use crate::engine::config::GameConfig;
use crate::engine::deck::Deck;
use crate::engine::error::ConfigError;
use crate::engine::game::Player;

/// Hands in player order, the rest of the deck, and the first face-up discard.
#[derive(Debug, Clone)]
pub struct DealResult {
    pub hands: Vec<Vec<Card>>,
    pub deck: Deck,
    pub discard_pile: Vec<Card>,
}

/// Picks the dealer's seat uniformly at random. An empty table deals from seat 0.
pub fn choose_dealer<R: Rng + ?Sized>(player_count: usize, rng: &mut R) -> usize {
    if player_count == 0 {
        return 0;
    }
    rng.random_range(0..player_count)
}

/// Seat order starting with the dealer, continuing clockwise.
pub fn play_order<T>(mut players: Vec<T>, dealer_index: usize) -> Vec<T> {
    if !players.is_empty() {
        let shift = dealer_index % players.len();
        players.rotate_left(shift);
    }
    players
}

/// Deals from an already shuffled `deck`: the dealer gets `cards_per_dealer`,
/// everyone else `cards_per_player`, then one card opens the discard pile.
pub fn deal_cards(players: &[Player], config: &GameConfig, mut deck: Deck) -> Result<DealResult, ConfigError> {
    let needed: usize = players
        .iter()
        .map(|p| hand_size(p, config))
        .sum::<usize>()
        + 1;
    if needed > deck.remaining() {
        return Err(ConfigError::DeckTooSmall {
            available: deck.remaining(),
            needed,
        });
    }

    let hands = players
        .iter()
        .map(|p| deck.deal(hand_size(p, config)))
        .collect();
    let discard_pile = deck.draw().into_iter().collect();

    Ok(DealResult {
        hands,
        deck,
        discard_pile,
    })
}

fn hand_size(player: &Player, config: &GameConfig) -> usize {
    if player.is_dealer {
        config.cards_per_dealer
    } else {
        config.cards_per_player
    }
}
