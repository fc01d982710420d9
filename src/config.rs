//! Driver configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::bot::BotDifficulty;
use crate::engine::config::{GameConfig, Variant};
use crate::engine::error::ConfigError;
use crate::engine::game::TeamAssignment;
use crate::matchmaking::registry::{MatchRequest, Seat};
use crate::matchmaking::room::RoomSettings;

const DEFAULT_PLAYERS: &str = "easy:easy,medium:medium,hard:hard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub variant: Variant,
    pub team_mode: bool,
    pub seed: Option<u64>,
    pub bot_delay: Duration,
    pub max_rounds: u32,
    pub seats: Vec<Seat>,
}

impl DriverConfig {
    /// Reads `RAMI_VARIANT`, `RAMI_TEAM_MODE`, `RAMI_SEED`, `RAMI_BOT_DELAY_MS`,
    /// `RAMI_MAX_ROUNDS` and `RAMI_PLAYERS`; unset variables take their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let variant = match lookup("RAMI_VARIANT") {
            Some(raw) => raw.parse()?,
            None => Variant::Classique,
        };
        let team_mode = parse_or("RAMI_TEAM_MODE", lookup("RAMI_TEAM_MODE"), false)?;
        let seed = lookup("RAMI_SEED")
            .map(|raw| parse_value::<u64>("RAMI_SEED", &raw))
            .transpose()?;
        let bot_delay_ms = parse_or("RAMI_BOT_DELAY_MS", lookup("RAMI_BOT_DELAY_MS"), 0u64)?;
        let max_rounds = parse_or("RAMI_MAX_ROUNDS", lookup("RAMI_MAX_ROUNDS"), 1000u32)?;
        let seats = parse_seats(&lookup("RAMI_PLAYERS").unwrap_or_else(|| DEFAULT_PLAYERS.to_string()))?;

        Ok(Self {
            variant,
            team_mode,
            seed,
            bot_delay: Duration::from_millis(bot_delay_ms),
            max_rounds,
            seats,
        })
    }

    /// Seats alternate between two teams in team mode.
    pub fn team_assignments(&self) -> Vec<TeamAssignment> {
        if !self.team_mode {
            return Vec::new();
        }
        self.seats
            .iter()
            .enumerate()
            .map(|(i, seat)| TeamAssignment::new(seat.name.clone(), format!("team-{}", i % 2 + 1)))
            .collect()
    }

    pub fn match_request(&self) -> MatchRequest {
        MatchRequest {
            seats: self.seats.clone(),
            config: GameConfig::for_variant(self.variant, self.team_mode),
            teams: self.team_assignments(),
            seed: self.seed,
            settings: RoomSettings {
                bot_delay: self.bot_delay,
                max_rounds: self.max_rounds,
            },
        }
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    raw.map_or(Ok(default), |raw| parse_value(key, &raw))
}

/// `name:difficulty` pairs separated by commas; a bare name is a human seat.
fn parse_seats(raw: &str) -> Result<Vec<Seat>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| -> Result<Seat, ConfigError> {
            match entry.split_once(':') {
                Some((name, difficulty)) => Ok(Seat::bot(name.trim(), difficulty.parse()?)),
                None => Ok(Seat::human(entry)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_three_bots() {
        let config = DriverConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.variant, Variant::Classique);
        assert!(!config.team_mode);
        assert_eq!(config.seed, None);
        assert_eq!(config.max_rounds, 1000);
        assert_eq!(config.seats.len(), 3);
        assert_eq!(config.seats[2], Seat::bot("hard", BotDifficulty::Hard));
    }

    #[test]
    fn reads_every_variable() {
        let config = DriverConfig::from_lookup(lookup(&[
            ("RAMI_VARIANT", "avec-jokers"),
            ("RAMI_TEAM_MODE", "true"),
            ("RAMI_SEED", "99"),
            ("RAMI_BOT_DELAY_MS", "250"),
            ("RAMI_MAX_ROUNDS", "50"),
            ("RAMI_PLAYERS", "ana:hard, ben, cy:easy, dee:medium"),
        ]))
        .unwrap();

        assert_eq!(config.variant, Variant::AvecJokers);
        assert!(config.team_mode);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.bot_delay, Duration::from_millis(250));
        assert_eq!(config.max_rounds, 50);
        assert_eq!(config.seats[1], Seat::human("ben"));

        let teams = config.team_assignments();
        assert_eq!(teams[0].team, "team-1");
        assert_eq!(teams[1].team, "team-2");
        assert_eq!(teams[2].team, "team-1");

        let request = config.match_request();
        assert!(request.config.team_mode);
        assert!(request.config.joker_recoverable);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            DriverConfig::from_lookup(lookup(&[("RAMI_SEED", "abc")])),
            Err(ConfigError::InvalidValue { key: "RAMI_SEED", .. })
        ));
        assert!(matches!(
            DriverConfig::from_lookup(lookup(&[("RAMI_VARIANT", "poker")])),
            Err(ConfigError::UnknownVariant(_))
        ));
        assert!(DriverConfig::from_lookup(lookup(&[("RAMI_PLAYERS", "a:genius")])).is_err());
    }
}
