use serde::{Deserialize, Serialize};

use crate::engine::config::GameConfig;
use crate::engine::game::{GameState, Player, PlayerId, TeamId};

/// Who an end-of-match penalty is booked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreOwner {
    Player(PlayerId),
    Team(TeamId),
}

/// Remaining cards times the per-card penalty.
pub fn player_penalty(player: &Player, config: &GameConfig) -> u32 {
    player.hand.len() as u32 * config.penalty_per_card
}

/// End-of-match penalties: per team (sum of members) in team mode, per player otherwise.
pub fn end_game_scores(state: &GameState) -> Vec<(ScoreOwner, u32)> {
    if state.config.team_mode {
        state
            .teams
            .iter()
            .map(|team| {
                let penalty = team
                    .player_ids
                    .iter()
                    .filter_map(|id| state.player(*id))
                    .map(|p| player_penalty(p, &state.config))
                    .sum();
                (ScoreOwner::Team(team.id.clone()), penalty)
            })
            .collect()
    } else {
        state
            .players
            .iter()
            .map(|p| (ScoreOwner::Player(p.id), player_penalty(p, &state.config)))
            .collect()
    }
}

pub fn apply_discard_penalty(player: &mut Player, config: &GameConfig) {
    player.score += config.discard_penalty;
}

/// The first player with an empty hand, with their team.
pub fn detect_winner(state: &GameState) -> Option<(PlayerId, Option<TeamId>)> {
    state
        .players
        .iter()
        .find(|p| p.hand.is_empty())
        .map(|p| (p.id, p.team_id.clone()))
}

/// Books the end-of-match penalties onto player or team scores.
pub fn finalize_scores(state: &mut GameState) {
    for (owner, penalty) in end_game_scores(state) {
        match owner {
            ScoreOwner::Player(id) => {
                if let Some(player) = state.players.iter_mut().find(|p| p.id == id) {
                    player.score += penalty;
                }
            }
            ScoreOwner::Team(id) => {
                if let Some(team) = state.teams.iter_mut().find(|t| t.id == id) {
                    team.score += penalty;
                }
            }
        }
    }
}
