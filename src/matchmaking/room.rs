use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::bot::{BotDifficulty, apply_action, execute_turn};
use crate::engine::error::GameError;
use crate::engine::game::{GameState, PlayerId};
use crate::matchmaking::events::{
    ClientMessage, MatchEnd, MatchOutcome, SanitizedPlayerState, ServerMessage,
};
use crate::matchmaking::registry::RoomCode;

#[derive(Debug, Clone)]
pub enum RoomEvent {
    PlayerJoined(String, mpsc::Sender<ServerMessage>), // Pass sender to the room
    PlayerLeft(String),
    PlayerAction(String, ClientMessage),
    /// A bot's delayed turn is due.
    BotTurn(PlayerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSettings {
    /// Pause before a bot acts.
    pub bot_delay: Duration,
    /// The room gives up once the round counter passes this.
    pub max_rounds: u32,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            bot_delay: Duration::from_millis(1500),
            max_rounds: 1000,
        }
    }
}

/// One match. Every event goes through `run`, so the game state only ever
/// sees one operation at a time.
pub struct Room {
    pub code: RoomCode,
    pub game_state: GameState,
    bots: HashMap<PlayerId, BotDifficulty>,
    player_channels: HashMap<String, mpsc::Sender<ServerMessage>>,
    // Channel to receive events from players and bot timers
    receiver: mpsc::Receiver<RoomEvent>,
    sender: mpsc::Sender<RoomEvent>,
    settings: RoomSettings,
    bot_turn_pending: bool,
    deck_exhausted: bool,
    abandoned: bool,
}

impl Room {
    /// `bots` maps seat names to the difficulty playing them; other seats are human.
    pub fn new(
        code: RoomCode,
        game_state: GameState,
        bots: &HashMap<String, BotDifficulty>,
        receiver: mpsc::Receiver<RoomEvent>,
        sender: mpsc::Sender<RoomEvent>,
        settings: RoomSettings,
    ) -> Self {
        let bots = game_state
            .players
            .iter()
            .filter_map(|p| bots.get(&p.name).map(|d| (p.id, *d)))
            .collect();

        Self {
            code,
            game_state,
            bots,
            player_channels: HashMap::new(),
            receiver,
            sender,
            settings,
            bot_turn_pending: false,
            deck_exhausted: false,
            abandoned: false,
        }
    }

    pub async fn run(mut self) -> MatchOutcome {
        info!(
            room = %self.code,
            players = ?self.game_state.players.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            "room started"
        );

        // Trigger bot turn if the dealer happens to be a bot
        self.schedule_bot_turn();

        let end = loop {
            if let Some(end) = self.match_end() {
                break end;
            }
            let Some(event) = self.receiver.recv().await else {
                break MatchEnd::RoundLimit;
            };

            match event {
                RoomEvent::PlayerJoined(name, sender) => {
                    debug!(room = %self.code, player = %name, "player joined");
                    self.player_channels.insert(name, sender);
                    self.broadcast_state().await;
                }
                RoomEvent::PlayerLeft(name) => {
                    debug!(room = %self.code, player = %name, "player left");
                    self.player_channels.remove(&name);
                    // The room holds its own sender, so `recv` never ends an empty room
                    if self.player_channels.is_empty() && self.bots.is_empty() {
                        self.abandoned = true;
                    }
                }
                RoomEvent::PlayerAction(name, message) => {
                    self.handle_message(&name, message).await;
                }
                RoomEvent::BotTurn(player_id) => {
                    self.bot_turn_pending = false;
                    self.play_bot_turn(player_id);
                    self.broadcast_state().await;
                }
            }

            self.schedule_bot_turn();
        };

        let outcome = MatchOutcome::from_state(&self.game_state, end);
        info!(room = %self.code, end = ?end, round = self.game_state.round, winner = ?outcome.summary.winner, "room closed");
        for sender in self.player_channels.values() {
            let _ = sender.send(ServerMessage::MatchFinished(outcome.clone())).await;
        }
        outcome
    }

    fn match_end(&self) -> Option<MatchEnd> {
        if self.game_state.is_finished() {
            Some(MatchEnd::Won)
        } else if self.deck_exhausted {
            Some(MatchEnd::DeckExhausted)
        } else if self.abandoned {
            Some(MatchEnd::Abandoned)
        } else if self.game_state.round > self.settings.max_rounds {
            Some(MatchEnd::RoundLimit)
        } else {
            None
        }
    }

    fn schedule_bot_turn(&mut self) {
        if self.bot_turn_pending || self.game_state.is_finished() {
            return;
        }
        let Some(current) = self.game_state.current_player() else {
            return;
        };
        if !self.bots.contains_key(&current.id) {
            return;
        }

        self.bot_turn_pending = true;
        let sender = self.sender.clone();
        let player_id = current.id;
        let delay = self.settings.bot_delay;

        tokio::spawn(async move {
            // Slight human-like delay
            tokio::time::sleep(delay).await;
            let _ = sender.send(RoomEvent::BotTurn(player_id)).await;
        });
    }

    fn play_bot_turn(&mut self, player_id: PlayerId) {
        let Some(&difficulty) = self.bots.get(&player_id) else {
            return;
        };

        match execute_turn(&mut self.game_state, player_id, difficulty) {
            Ok(report) => debug!(
                room = %self.code,
                applied = report.applied.len(),
                rejected = report.rejected.len(),
                "bot turn played"
            ),
            Err(GameError::DeckExhausted) => {
                warn!(room = %self.code, "deck and discard pile exhausted");
                self.deck_exhausted = true;
            }
            // A stale timer after the turn moved on
            Err(err) => debug!(room = %self.code, error = %err, "bot turn skipped"),
        }
    }

    async fn handle_message(&mut self, name: &str, message: ClientMessage) {
        match message {
            ClientMessage::RequestState => self.send_state(name).await,
            ClientMessage::Action { action } => {
                let Some(player_id) = self.game_state.player_by_name(name).map(|p| p.id) else {
                    self.send_error(name, &GameError::UnknownPlayer).await;
                    return;
                };
                if self.bots.contains_key(&player_id) {
                    self.send_error(name, &GameError::NotYourTurn).await;
                    return;
                }

                match apply_action(&mut self.game_state, player_id, &action) {
                    Ok(_) => self.broadcast_state().await,
                    Err(GameError::DeckExhausted) => {
                        self.deck_exhausted = true;
                        self.send_error(name, &GameError::DeckExhausted).await;
                    }
                    Err(err) => self.send_error(name, &err).await,
                }
            }
        }
    }

    async fn send_error(&self, name: &str, err: &GameError) {
        if let Some(sender) = self.player_channels.get(name) {
            let _ = sender
                .send(ServerMessage::Error {
                    message: err.to_string(),
                })
                .await;
        }
    }

    fn state_for(&self, name: &str) -> ServerMessage {
        let players = self
            .game_state
            .players
            .iter()
            .map(SanitizedPlayerState::from_player)
            .collect();

        // Find this specific player's hand, default to empty for spectators
        let my_hand = self
            .game_state
            .player_by_name(name)
            .map(|p| p.hand.clone())
            .unwrap_or_default();

        ServerMessage::StateUpdate {
            my_hand,
            players,
            summary: self.game_state.summary(),
        }
    }

    async fn send_state(&self, name: &str) {
        if let Some(sender) = self.player_channels.get(name) {
            let _ = sender.send(self.state_for(name)).await;
        }
    }

    async fn broadcast_state(&self) {
        for (name, sender) in &self.player_channels {
            let _ = sender.send(self.state_for(name)).await;
        }
    }
}
