//! The opening rule: the first lay-down of a player (or team) must contain a
//! suite and beat a point threshold that escalates as others open.

use serde::{Deserialize, Serialize};

use crate::engine::config::GameConfig;
use crate::engine::error::OpeningRejection;
use crate::engine::game::{GameState, Player, Team};
use crate::engine::rules::Combination;

/// Outcome of checking a proposed opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningValidation {
    pub total_points: u32,
    pub has_suite: bool,
    pub required_points: u32,
    pub rejection: Option<OpeningRejection>,
}

impl OpeningValidation {
    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }

    /// Achieved points on success.
    pub fn into_result(self) -> Result<u32, OpeningRejection> {
        match self.rejection {
            None => Ok(self.total_points),
            Some(rejection) => Err(rejection),
        }
    }
}

pub fn validate_opening(
    combinations: &[Combination],
    config: &GameConfig,
    state: &GameState,
    player: &Player,
) -> OpeningValidation {
    let required_points = required_opening_points(state, player, config);
    let total_points: u32 = combinations.iter().map(|c| c.points).sum();
    let has_suite = combinations.iter().any(Combination::is_suite);

    let rejection = if combinations.is_empty() {
        Some(OpeningRejection::Empty)
    } else if !combinations.iter().all(Combination::is_valid) {
        Some(OpeningRejection::InvalidCombination)
    } else if config.opening_requires_suite && !has_suite {
        Some(OpeningRejection::MissingSuite)
    } else if total_points < required_points {
        Some(OpeningRejection::InsufficientPoints {
            total: total_points,
            required: required_points,
        })
    } else {
        None
    };

    OpeningValidation {
        total_points,
        has_suite,
        required_points,
        rejection,
    }
}

/// Points `player` must reach to open right now.
///
/// Solo: the configured minimum until someone opens, then the best opponent
/// opening + 1. Teams: the best opposing team opening + 1 if any; otherwise 0
/// once the player's own team has opened (the suite stays mandatory).
pub fn required_opening_points(state: &GameState, player: &Player, config: &GameConfig) -> u32 {
    if config.team_mode
        && let Some(team_id) = &player.team_id
    {
        let best_opposing = state
            .teams
            .iter()
            .filter(|t| &t.id != team_id && t.has_opened)
            .map(|t| t.opening_points)
            .max();
        if let Some(points) = best_opposing {
            return points + 1;
        }

        let own_team_opened = state
            .teams
            .iter()
            .any(|t| &t.id == team_id && t.has_opened);
        if own_team_opened {
            return 0;
        }

        return config.opening_min_points;
    }

    state
        .players
        .iter()
        .filter(|p| p.id != player.id && p.has_opened)
        .map(|p| p.opening_points)
        .max()
        .map_or(config.opening_min_points, |best| best + 1)
}

/// Whether taking the top discard is allowed, and at what price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscardPickup {
    Forbidden,
    Free,
    /// Allowed, but the player's score takes the discard penalty.
    Penalized,
}

impl DiscardPickup {
    pub fn is_allowed(self) -> bool {
        !matches!(self, DiscardPickup::Forbidden)
    }
}

pub fn can_take_discard(player: &Player, state: &GameState, config: &GameConfig) -> DiscardPickup {
    if !config.can_take_discard {
        return DiscardPickup::Forbidden;
    }

    let team_opened = config.team_mode
        && player.team_id.as_ref().is_some_and(|team_id| {
            state
                .teams
                .iter()
                .any(|t| &t.id == team_id && t.has_opened)
        });

    if player.has_opened || team_opened || !config.discard_requires_opening {
        DiscardPickup::Free
    } else {
        DiscardPickup::Penalized
    }
}

/// Marks the player, and their team if any, as opened with `total_points`.
/// The team keeps the latest member's total, even when it is lower.
pub fn apply_opening(player: &mut Player, team: Option<&mut Team>, total_points: u32) {
    player.has_opened = true;
    player.opening_points = total_points;

    if let Some(team) = team {
        team.has_opened = true;
        team.opening_points = total_points;
    }
}
