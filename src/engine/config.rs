use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::card::{MAX_DECKS, MAX_JOKERS};
use crate::engine::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Two decks, no jokers.
    Classique,
    /// Two decks plus four jokers that can be won back from the table.
    AvecJokers,
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classique" | "classic" => Ok(Variant::Classique),
            "avec-jokers" | "avecjokers" | "jokers" => Ok(Variant::AvecJokers),
            other => Err(ConfigError::UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Classique => write!(f, "classique"),
            Variant::AvecJokers => write!(f, "avec-jokers"),
        }
    }
}

/// Rules of one match. Fixed once the match is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub variant: Variant,
    pub total_decks: u16,
    pub total_jokers: u16,
    pub cards_per_dealer: usize,
    pub cards_per_player: usize,
    pub opening_min_points: u32,
    pub opening_requires_suite: bool,
    pub can_take_discard: bool,
    /// When false, unopened players take the discard without penalty.
    pub discard_requires_opening: bool,
    pub discard_penalty: u32,
    pub penalty_per_card: u32,
    pub joker_recoverable: bool,
    pub min_players: usize,
    pub max_players: usize,
    pub team_mode: bool,
}

impl GameConfig {
    pub fn for_variant(variant: Variant, team_mode: bool) -> Self {
        let (total_jokers, joker_recoverable) = match variant {
            Variant::Classique => (0, false),
            Variant::AvecJokers => (4, true),
        };

        Self {
            variant,
            total_decks: 2,
            total_jokers,
            cards_per_dealer: 15,
            cards_per_player: 14,
            opening_min_points: 71,
            opening_requires_suite: true,
            can_take_discard: true,
            discard_requires_opening: true,
            discard_penalty: 71,
            penalty_per_card: 10,
            joker_recoverable,
            min_players: 2,
            max_players: 4,
            team_mode,
        }
    }

    pub fn deck_size(&self) -> usize {
        self.total_decks as usize * 52 + self.total_jokers as usize
    }

    /// Checks that a match with `player_count` players can be dealt under these rules.
    pub fn validate(&self, player_count: usize) -> Result<(), ConfigError> {
        if self.total_decks == 0 {
            return Err(ConfigError::NoDecks);
        }
        if self.total_decks > MAX_DECKS {
            return Err(ConfigError::TooManyDecks {
                count: self.total_decks,
                max: MAX_DECKS,
            });
        }
        if self.total_jokers > MAX_JOKERS {
            return Err(ConfigError::TooManyJokers {
                count: self.total_jokers,
                max: MAX_JOKERS,
            });
        }
        if player_count < self.min_players || player_count > self.max_players {
            return Err(ConfigError::PlayerCount {
                count: player_count,
                min: self.min_players,
                max: self.max_players,
            });
        }

        // Dealer hand, the other hands, and the first face-up discard.
        let needed = self.cards_per_dealer
            + self.cards_per_player * player_count.saturating_sub(1)
            + 1;
        if needed > self.deck_size() {
            return Err(ConfigError::DeckTooSmall {
                available: self.deck_size(),
                needed,
            });
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::for_variant(Variant::Classique, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ_only_in_jokers() {
        let classique = GameConfig::for_variant(Variant::Classique, false);
        let jokers = GameConfig::for_variant(Variant::AvecJokers, false);

        assert_eq!(classique.total_jokers, 0);
        assert!(!classique.joker_recoverable);
        assert_eq!(jokers.total_jokers, 4);
        assert!(jokers.joker_recoverable);
        assert_eq!(classique.opening_min_points, 71);
        assert_eq!(jokers.opening_min_points, 71);
    }

    #[test]
    fn rejects_player_counts_out_of_bounds() {
        let config = GameConfig::default();
        assert!(matches!(
            config.validate(1),
            Err(ConfigError::PlayerCount { count: 1, .. })
        ));
        assert!(config.validate(5).is_err());
        assert!(config.validate(4).is_ok());
    }

    #[test]
    fn rejects_deck_too_small_for_deal() {
        let config = GameConfig {
            total_decks: 1,
            cards_per_dealer: 20,
            cards_per_player: 20,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(3),
            Err(ConfigError::DeckTooSmall { .. })
        ));
    }

    #[test]
    fn rejects_deck_counts_that_would_reuse_card_ids() {
        let config = GameConfig {
            total_decks: MAX_DECKS,
            ..GameConfig::for_variant(Variant::AvecJokers, false)
        };
        assert!(config.validate(2).is_ok());

        for total_decks in [MAX_DECKS + 1, 1300] {
            let config = GameConfig {
                total_decks,
                ..GameConfig::for_variant(Variant::AvecJokers, false)
            };
            assert_eq!(
                config.validate(2),
                Err(ConfigError::TooManyDecks {
                    count: total_decks,
                    max: MAX_DECKS
                })
            );
        }

        let config = GameConfig {
            total_jokers: MAX_JOKERS + 1,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(2), Err(ConfigError::TooManyJokers { .. })));
    }

    #[test]
    fn parses_variant_names() {
        assert_eq!("classique".parse::<Variant>(), Ok(Variant::Classique));
        assert_eq!("Avec-Jokers".parse::<Variant>(), Ok(Variant::AvecJokers));
        assert!("poker".parse::<Variant>().is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let config = GameConfig::for_variant(Variant::AvecJokers, true);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"avec-jokers\""));
        let back: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
