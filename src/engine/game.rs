use crate::engine::card::{Card, CardId};
use crate::engine::config::GameConfig;
use crate::engine::dealer::{choose_dealer, deal_cards, play_order};
use crate::engine::deck::Deck;
use crate::engine::error::GameError;
use crate::engine::opening::{
    DiscardPickup, apply_opening, can_take_discard, required_opening_points, validate_opening,
};
use crate::engine::rules::{Combination, can_add_card, can_replace_joker};
use crate::engine::scoring::{apply_discard_penalty, detect_winner, finalize_scores};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub type TeamId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub hand: Vec<Card>,
    pub has_opened: bool,
    pub opening_points: u32,
    pub team_id: Option<TeamId>,
    pub is_dealer: bool,
    /// Penalty points; lower is better.
    pub score: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            hand: Vec::new(),
            has_opened: false,
            opening_points: 0,
            team_id: None,
            is_dealer: false,
            score: 0,
        }
    }

    pub fn holds(&self, card_id: CardId) -> bool {
        self.hand.iter().any(|c| c.id == card_id)
    }

    fn hand_position(&self, card_id: CardId) -> Result<usize, GameError> {
        self.hand
            .iter()
            .position(|c| c.id == card_id)
            .ok_or(GameError::CardNotInHand(card_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub player_ids: Vec<PlayerId>,
    pub has_opened: bool,
    pub opening_points: u32,
    pub score: u32,
}

/// Seats the player named `player` in team `team`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamAssignment {
    pub player: String,
    pub team: TeamId,
}

impl TeamAssignment {
    pub fn new(player: impl Into<String>, team: impl Into<TeamId>) -> Self {
        Self {
            player: player.into(),
            team: team.into(),
        }
    }
}

/// A combination laid face-up, tagged with whoever may extend it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCombination {
    pub combination: Combination,
    pub player_id: PlayerId,
    pub team_id: Option<TeamId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Dealing,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnMode {
    /// The dealer's first turn: no draw, just discard.
    DiscardOnly,
    DrawThenPlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// The turn goes on.
    Continue,
    /// The turn passed to the next player.
    TurnPassed,
    /// The acting player emptied their hand and the match is over.
    Won,
}

/// Read-only snapshot for display and transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub id: Uuid,
    pub phase: GamePhase,
    pub round: u32,
    pub current_player: Option<String>,
    pub deck_size: usize,
    pub discard_top: Option<Card>,
    pub table_combinations: usize,
    pub winner: Option<String>,
    pub winner_team: Option<TeamId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub id: Uuid,
    pub config: GameConfig,
    pub phase: GamePhase,
    /// Seat order, dealer first.
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    pub deck: Deck,
    pub discard_pile: Vec<Card>,
    pub table: Vec<TableCombination>,
    pub current_turn: usize, // Index in the players array
    pub turn_mode: TurnMode,
    pub drawn_this_turn: bool,
    pub round: u32,
    pub winner_id: Option<PlayerId>,
    pub winner_team_id: Option<TeamId>,
    /// Seed of a reproducible match; reshuffles derive from it.
    pub seed: Option<u64>,
    pub reshuffles: u32,
}

impl GameState {
    /// Shuffles, picks a dealer and deals using the thread RNG.
    pub fn new(
        player_names: &[impl AsRef<str>],
        config: GameConfig,
        teams: &[TeamAssignment],
    ) -> Result<Self, GameError> {
        let mut rng = rng();
        Self::build(player_names, config, teams, &mut rng, None)
    }

    /// Same as [`GameState::new`] but fully determined by `seed`.
    pub fn with_seed(
        player_names: &[impl AsRef<str>],
        config: GameConfig,
        teams: &[TeamAssignment],
        seed: u64,
    ) -> Result<Self, GameError> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::build(player_names, config, teams, &mut rng, Some(seed))
    }

    fn build<R: Rng + ?Sized>(
        player_names: &[impl AsRef<str>],
        config: GameConfig,
        assignments: &[TeamAssignment],
        rng: &mut R,
        seed: Option<u64>,
    ) -> Result<Self, GameError> {
        config.validate(player_names.len())?;

        let mut players: Vec<Player> = player_names
            .iter()
            .map(|name| Player::new(PlayerId::new(), name.as_ref().to_string()))
            .collect();

        let dealer = choose_dealer(players.len(), rng);
        players[dealer].is_dealer = true;

        let teams = if config.team_mode {
            build_teams(&mut players, assignments)?
        } else {
            Vec::new()
        };

        let players = play_order(players, dealer);

        let mut deck = Deck::new(config.total_decks, config.total_jokers);
        deck.shuffle_with(rng);

        let mut state = Self {
            id: Uuid::new_v4(),
            config,
            phase: GamePhase::Dealing,
            players,
            teams,
            deck: Deck::default(),
            discard_pile: Vec::new(),
            table: Vec::new(),
            current_turn: 0,
            turn_mode: TurnMode::DiscardOnly,
            drawn_this_turn: false,
            round: 1,
            winner_id: None,
            winner_team_id: None,
            seed,
            reshuffles: 0,
        };

        let dealt = deal_cards(&state.players, &state.config, deck)?;
        for (player, hand) in state.players.iter_mut().zip(dealt.hands) {
            player.hand = hand;
        }
        state.deck = dealt.deck;
        state.discard_pile = dealt.discard_pile;
        state.phase = GamePhase::Playing;

        info!(
            match_id = %state.id,
            variant = %state.config.variant,
            players = state.players.len(),
            dealer = %state.players[0].name,
            "match dealt"
        );
        Ok(state)
    }

    // ─── Queries ──────────────────────────────────────────────────────────────

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_turn)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn is_finished(&self) -> bool {
        self.phase == GamePhase::Finished
    }

    pub fn top_discard(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    /// The opening threshold `player_id` faces right now.
    pub fn required_opening_points(&self, player_id: PlayerId) -> Option<u32> {
        self.player(player_id)
            .map(|p| required_opening_points(self, p, &self.config))
    }

    /// True if `player` may extend `table_combination`: their own, or a teammate's.
    pub fn can_access(&self, player: &Player, table_combination: &TableCombination) -> bool {
        table_combination.player_id == player.id
            || (self.config.team_mode
                && player.team_id.is_some()
                && table_combination.team_id == player.team_id)
    }

    pub fn summary(&self) -> MatchSummary {
        let winner = self
            .winner_id
            .and_then(|id| self.player(id))
            .map(|p| p.name.clone());

        MatchSummary {
            id: self.id,
            phase: self.phase,
            round: self.round,
            current_player: self.current_player().map(|p| p.name.clone()),
            deck_size: self.deck.remaining(),
            discard_top: self.top_discard().copied(),
            table_combinations: self.table.len(),
            winner,
            winner_team: self.winner_team_id.clone(),
        }
    }

    // ─── Operations ───────────────────────────────────────────────────────────

    pub fn draw_from_deck(&mut self, player_id: PlayerId) -> Result<Card, GameError> {
        let idx = self.ensure_turn(player_id)?;
        self.ensure_can_draw()?;

        if self.deck.is_empty() {
            self.reshuffle_discard_pile()?;
        }

        let card = self.deck.draw().ok_or(GameError::DeckExhausted)?;
        self.players[idx].hand.push(card);
        self.drawn_this_turn = true;

        debug!(player = %self.players[idx].name, %card, "drew from deck");
        Ok(card)
    }

    pub fn draw_from_discard(&mut self, player_id: PlayerId) -> Result<Card, GameError> {
        let idx = self.ensure_turn(player_id)?;
        self.ensure_can_draw()?;

        if self.discard_pile.is_empty() {
            return Err(GameError::EmptyDiscardPile);
        }

        let pickup = can_take_discard(&self.players[idx], self, &self.config);
        match pickup {
            DiscardPickup::Forbidden => return Err(GameError::DiscardPickupForbidden),
            DiscardPickup::Penalized => {
                apply_discard_penalty(&mut self.players[idx], &self.config);
                info!(
                    player = %self.players[idx].name,
                    penalty = self.config.discard_penalty,
                    "took discard before opening"
                );
            }
            DiscardPickup::Free => {}
        }

        let card = self.discard_pile.pop().ok_or(GameError::EmptyDiscardPile)?;
        self.players[idx].hand.push(card);
        self.drawn_this_turn = true;

        debug!(player = %self.players[idx].name, %card, "drew from discard");
        Ok(card)
    }

    /// Ends the turn by discarding `card_id`. Emptying the hand wins the match.
    pub fn discard(&mut self, player_id: PlayerId, card_id: CardId) -> Result<ActionOutcome, GameError> {
        let idx = self.ensure_turn(player_id)?;
        self.ensure_drawn()?;

        let position = self.players[idx].hand_position(card_id)?;
        let card = self.players[idx].hand.remove(position);
        self.discard_pile.push(card);

        debug!(player = %self.players[idx].name, %card, "discarded");

        if self.players[idx].hand.is_empty() {
            self.finish();
            return Ok(ActionOutcome::Won);
        }

        self.advance_turn();
        Ok(ActionOutcome::TurnPassed)
    }

    /// Lays down new combinations. The first lay-down goes through the opening rule.
    pub fn play_combinations(
        &mut self,
        player_id: PlayerId,
        groups: &[Vec<CardId>],
    ) -> Result<ActionOutcome, GameError> {
        let idx = self.ensure_turn(player_id)?;
        self.ensure_drawn()?;

        // Resolve against a copy so a failure leaves the hand untouched.
        let mut remaining = self.players[idx].hand.clone();
        let mut combinations = Vec::with_capacity(groups.len());
        for group in groups {
            let mut cards = Vec::with_capacity(group.len());
            for &card_id in group {
                let position = remaining
                    .iter()
                    .position(|c| c.id == card_id)
                    .ok_or(GameError::CardNotInHand(card_id))?;
                cards.push(remaining.remove(position));
            }
            combinations.push(Combination::new(cards));
        }

        let player = &self.players[idx];
        if !player.has_opened {
            let points = validate_opening(&combinations, &self.config, self, player).into_result()?;
            let team_id = player.team_id.clone();
            let team = team_id
                .as_deref()
                .and_then(|id| self.teams.iter_mut().find(|t| t.id == id));
            apply_opening(&mut self.players[idx], team, points);

            info!(player = %self.players[idx].name, points, "opened");
        } else if combinations.is_empty() || !combinations.iter().all(Combination::is_valid) {
            return Err(GameError::InvalidCombination);
        }

        let player = &mut self.players[idx];
        player.hand = remaining;
        let (owner, team_id) = (player.id, player.team_id.clone());
        debug!(player = %player.name, count = combinations.len(), "laid down combinations");

        self.table
            .extend(combinations.into_iter().map(|combination| TableCombination {
                combination,
                player_id: owner,
                team_id: team_id.clone(),
            }));

        Ok(self.finish_if_empty(idx))
    }

    /// Extends a table combination owned by the player or a teammate.
    pub fn add_card_to_table(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
        combination_index: usize,
    ) -> Result<ActionOutcome, GameError> {
        let idx = self.ensure_turn(player_id)?;
        self.ensure_drawn()?;

        let player = &self.players[idx];
        if !player.has_opened {
            return Err(GameError::NotOpened);
        }
        let position = player.hand_position(card_id)?;

        let target = self
            .table
            .get(combination_index)
            .ok_or(GameError::CombinationNotFound(combination_index))?;
        if !self.can_access(player, target) {
            return Err(GameError::CombinationNotAccessible);
        }

        let card = player.hand[position];
        if !can_add_card(&target.combination, &card) {
            return Err(GameError::CardDoesNotFit);
        }

        self.players[idx].hand.remove(position);
        self.table[combination_index].combination.push(card);

        debug!(player = %self.players[idx].name, %card, combination_index, "added to table");
        Ok(self.finish_if_empty(idx))
    }

    /// Swaps a natural card from hand for a joker on the table. Returns the joker.
    pub fn recover_joker(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
        combination_index: usize,
    ) -> Result<Card, GameError> {
        let idx = self.ensure_turn(player_id)?;
        if !self.config.joker_recoverable {
            return Err(GameError::JokerRecoveryDisabled);
        }
        self.ensure_drawn()?;

        let player = &self.players[idx];
        if !player.has_opened {
            return Err(GameError::NotOpened);
        }
        let position = player.hand_position(card_id)?;

        let target = self
            .table
            .get(combination_index)
            .ok_or(GameError::CombinationNotFound(combination_index))?;
        let card = player.hand[position];
        let joker_position = can_replace_joker(&target.combination, &card)
            .ok_or(GameError::JokerNotReplaceable)?;

        self.players[idx].hand.remove(position);
        let joker = self.table[combination_index]
            .combination
            .swap_joker(joker_position, card);
        self.players[idx].hand.push(joker);

        info!(player = %self.players[idx].name, %card, combination_index, "recovered joker");
        Ok(joker)
    }

    // ─── Helpers ──────────────────────────────────────────────────────────────

    fn ensure_turn(&self, player_id: PlayerId) -> Result<usize, GameError> {
        if self.phase != GamePhase::Playing {
            return Err(GameError::MatchFinished);
        }
        match self.current_player() {
            Some(p) if p.id == player_id => Ok(self.current_turn),
            _ if self.player(player_id).is_none() => Err(GameError::UnknownPlayer),
            _ => Err(GameError::NotYourTurn),
        }
    }

    fn ensure_can_draw(&self) -> Result<(), GameError> {
        match self.turn_mode {
            TurnMode::DiscardOnly => Err(GameError::DiscardOnlyTurn),
            TurnMode::DrawThenPlay if self.drawn_this_turn => Err(GameError::AlreadyDrew),
            TurnMode::DrawThenPlay => Ok(()),
        }
    }

    fn ensure_drawn(&self) -> Result<(), GameError> {
        match self.turn_mode {
            TurnMode::DrawThenPlay if !self.drawn_this_turn => Err(GameError::MustDrawFirst),
            _ => Ok(()),
        }
    }

    /// Turns every discard but the top one into a fresh deck.
    fn reshuffle_discard_pile(&mut self) -> Result<(), GameError> {
        if self.discard_pile.len() <= 1 {
            return Err(GameError::DeckExhausted);
        }

        let top = self.discard_pile.pop().ok_or(GameError::DeckExhausted)?;
        let mut deck = Deck::from_cards(std::mem::take(&mut self.discard_pile));
        self.reshuffles += 1;
        match self.seed {
            Some(seed) => deck.shuffle_seeded(seed.wrapping_add(u64::from(self.reshuffles))),
            None => deck.shuffle(),
        }
        self.deck = deck;
        self.discard_pile.push(top);

        info!(cards = self.deck.remaining(), reshuffles = self.reshuffles, "reshuffled discard pile into deck");
        Ok(())
    }

    fn finish_if_empty(&mut self, idx: usize) -> ActionOutcome {
        if self.players[idx].hand.is_empty() {
            self.finish();
            ActionOutcome::Won
        } else {
            ActionOutcome::Continue
        }
    }

    fn finish(&mut self) {
        let Some((winner_id, winner_team_id)) = detect_winner(self) else {
            return;
        };
        self.winner_id = Some(winner_id);
        self.winner_team_id = winner_team_id;
        self.phase = GamePhase::Finished;
        finalize_scores(self);

        info!(
            match_id = %self.id,
            winner = ?self.player(winner_id).map(|p| p.name.as_str()),
            round = self.round,
            "match finished"
        );
    }

    fn advance_turn(&mut self) {
        self.current_turn = (self.current_turn + 1) % self.players.len();
        self.turn_mode = TurnMode::DrawThenPlay;
        self.drawn_this_turn = false;
        self.round += 1;
    }
}

fn build_teams(players: &mut [Player], assignments: &[TeamAssignment]) -> Result<Vec<Team>, GameError> {
    let mut teams: Vec<Team> = Vec::new();

    for assignment in assignments {
        let player = players
            .iter_mut()
            .find(|p| p.name == assignment.player)
            .ok_or_else(|| GameError::InvalidTeams(format!("unknown player `{}`", assignment.player)))?;
        if player.team_id.is_some() {
            return Err(GameError::InvalidTeams(format!(
                "player `{}` assigned twice",
                assignment.player
            )));
        }
        player.team_id = Some(assignment.team.clone());

        match teams.iter_mut().find(|t| t.id == assignment.team) {
            Some(team) => team.player_ids.push(player.id),
            None => teams.push(Team {
                id: assignment.team.clone(),
                player_ids: vec![player.id],
                has_opened: false,
                opening_points: 0,
                score: 0,
            }),
        }
    }

    if let Some(unassigned) = players.iter().find(|p| p.team_id.is_none()) {
        return Err(GameError::InvalidTeams(format!(
            "player `{}` has no team",
            unassigned.name
        )));
    }
    if teams.len() < 2 {
        return Err(GameError::InvalidTeams("team mode needs at least two teams".to_string()));
    }

    Ok(teams)
}
