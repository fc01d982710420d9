use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::engine::bot::BotDifficulty;
use crate::engine::config::GameConfig;
use crate::engine::error::GameError;
use crate::engine::game::{GameState, TeamAssignment};
use crate::matchmaking::events::MatchOutcome;
use crate::matchmaking::room::{Room, RoomEvent, RoomSettings};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn generate() -> Self {
        let raw = Uuid::new_v4().simple().to_string();
        Self(raw[..8].to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A seat at the table: a human, or a bot of some difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub name: String,
    pub bot: Option<BotDifficulty>,
}

impl Seat {
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bot: None,
        }
    }

    pub fn bot(name: impl Into<String>, difficulty: BotDifficulty) -> Self {
        Self {
            name: name.into(),
            bot: Some(difficulty),
        }
    }
}

/// Everything needed to open a room.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub seats: Vec<Seat>,
    pub config: GameConfig,
    pub teams: Vec<TeamAssignment>,
    pub seed: Option<u64>,
    pub settings: RoomSettings,
}

/// Live rooms by code. Each room removes itself when its match ends.
#[derive(Clone, Default)]
pub struct MatchRegistry {
    rooms: Arc<Mutex<HashMap<RoomCode, mpsc::Sender<RoomEvent>>>>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deals a new match and starts its room task.
    pub async fn open_room(
        &self,
        request: MatchRequest,
    ) -> Result<(RoomCode, JoinHandle<MatchOutcome>), GameError> {
        let names: Vec<&str> = request.seats.iter().map(|s| s.name.as_str()).collect();
        let game_state = match request.seed {
            Some(seed) => GameState::with_seed(&names, request.config, &request.teams, seed)?,
            None => GameState::new(&names, request.config, &request.teams)?,
        };
        let bots: HashMap<String, BotDifficulty> = request
            .seats
            .iter()
            .filter_map(|s| s.bot.map(|d| (s.name.clone(), d)))
            .collect();

        let mut rooms = self.rooms.lock().await;
        let mut code = RoomCode::generate();
        while rooms.contains_key(&code) {
            code = RoomCode::generate();
        }

        let (sender, receiver) = mpsc::channel(64);
        let room = Room::new(
            code.clone(),
            game_state,
            &bots,
            receiver,
            sender.clone(),
            request.settings,
        );
        rooms.insert(code.clone(), sender);
        drop(rooms);

        info!(room = %code, seats = request.seats.len(), bots = bots.len(), "room opened");

        let registry = self.clone();
        let room_code = code.clone();
        let handle = tokio::spawn(async move {
            let outcome = room.run().await;
            registry.close(&room_code).await;
            outcome
        });

        Ok((code, handle))
    }

    /// Channel into a live room, for joining players and their actions.
    pub async fn sender(&self, code: &RoomCode) -> Option<mpsc::Sender<RoomEvent>> {
        self.rooms.lock().await.get(code).cloned()
    }

    pub async fn close(&self, code: &RoomCode) {
        self.rooms.lock().await.remove(code);
    }

    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
