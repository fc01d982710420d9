use serde::{Deserialize, Serialize};

use crate::engine::bot::TurnAction;
use crate::engine::card::Card;
use crate::engine::game::{GameState, MatchSummary, Player, PlayerId, TeamId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    Action { action: TurnAction },
    RequestState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    Error {
        message: String,
    },
    StateUpdate {
        // Only the receiver's own hand is revealed
        my_hand: Vec<Card>,
        players: Vec<SanitizedPlayerState>,
        summary: MatchSummary,
    },
    MatchFinished(MatchOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedPlayerState {
    pub id: PlayerId,
    pub name: String,
    pub hand_count: usize, // Hide actual cards
    pub has_opened: bool,
    pub score: u32,
    pub team_id: Option<TeamId>,
}

impl SanitizedPlayerState {
    pub fn from_player(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            hand_count: player.hand.len(),
            has_opened: player.has_opened,
            score: player.score,
            team_id: player.team_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub name: String,
    pub team_id: Option<TeamId>,
    pub cards_left: usize,
    pub score: u32,
}

/// How a room ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchEnd {
    Won,
    DeckExhausted,
    RoundLimit,
    /// Every human left a room with no bots.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub end: MatchEnd,
    pub summary: MatchSummary,
    /// Players sorted by score, lowest first.
    pub standings: Vec<Standing>,
    /// Team totals in team mode, lowest first.
    pub team_scores: Vec<(TeamId, u32)>,
}

impl MatchOutcome {
    pub fn from_state(state: &GameState, end: MatchEnd) -> Self {
        let mut standings: Vec<Standing> = state
            .players
            .iter()
            .map(|p| Standing {
                name: p.name.clone(),
                team_id: p.team_id.clone(),
                cards_left: p.hand.len(),
                score: p.score,
            })
            .collect();
        standings.sort_by_key(|s| s.score);

        let mut team_scores: Vec<(TeamId, u32)> = state
            .teams
            .iter()
            .map(|t| (t.id.clone(), t.score))
            .collect();
        team_scores.sort_by_key(|(_, score)| *score);

        Self {
            end,
            summary: state.summary(),
            standings,
            team_scores,
        }
    }
}
