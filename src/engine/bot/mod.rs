//! Computer players. Each difficulty reads the match and returns a
//! [`TurnPlan`]; [`execute_turn`] then pushes that plan through the ordinary
//! game operations, so a bot can never do anything a human could not.

mod easy;
mod hard;
mod medium;

use crate::engine::card::{Card, CardId};
use crate::engine::combo_finder::ComboCandidate;
use crate::engine::error::{ConfigError, GameError};
use crate::engine::game::{ActionOutcome, GameState, Player, PlayerId, TurnMode};
use crate::engine::rules::can_add_card;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotDifficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for BotDifficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(ConfigError::InvalidValue {
                key: "difficulty",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for BotDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        };
        f.write_str(name)
    }
}

// ─── Actions ──────────────────────────────────────────────────────────────────

/// One step of a turn, as submitted by a bot or a remote player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum TurnAction {
    DrawDeck,
    DrawDiscard,
    PlayCombinations { combinations: Vec<Vec<CardId>> },
    AddToTable { card_id: CardId, combination_index: usize },
    RecoverJoker { card_id: CardId, combination_index: usize },
    Discard { card_id: CardId },
}

/// A whole turn: the draw (absent when none is due), the plays, the discard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnPlan {
    pub draw: Option<TurnAction>,
    pub plays: Vec<TurnAction>,
    pub discard: Option<TurnAction>,
}

impl TurnPlan {
    pub fn actions(&self) -> impl Iterator<Item = &TurnAction> {
        self.draw.iter().chain(&self.plays).chain(&self.discard)
    }
}

/// What happened when a plan met the live match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub plan: TurnPlan,
    pub applied: Vec<TurnAction>,
    pub rejected: Vec<(TurnAction, GameError)>,
    /// Set when a fallback card replaced the planned discard.
    pub fallback_discard: Option<CardId>,
    pub finished: bool,
}

// ─── Public Entry Points ──────────────────────────────────────────────────────

/// Plans the current player's turn. Pure: `game` is only read.
pub fn get_turn(game: &GameState, player_id: PlayerId, difficulty: BotDifficulty) -> Option<TurnPlan> {
    let player = game.player(player_id)?;
    let plan = match difficulty {
        BotDifficulty::Easy => easy::plan_turn(game, player),
        BotDifficulty::Medium => medium::plan_turn(game, player),
        BotDifficulty::Hard => hard::plan_turn(game, player),
    };
    debug!(player = %player.name, %difficulty, actions = plan.actions().count(), "bot planned turn");
    Some(plan)
}

/// Applies a single action through the matching game operation.
pub fn apply_action(
    game: &mut GameState,
    player_id: PlayerId,
    action: &TurnAction,
) -> Result<ActionOutcome, GameError> {
    match action {
        TurnAction::DrawDeck => game.draw_from_deck(player_id).map(|_| ActionOutcome::Continue),
        TurnAction::DrawDiscard => game.draw_from_discard(player_id).map(|_| ActionOutcome::Continue),
        TurnAction::PlayCombinations { combinations } => game.play_combinations(player_id, combinations),
        TurnAction::AddToTable {
            card_id,
            combination_index,
        } => game.add_card_to_table(player_id, *card_id, *combination_index),
        TurnAction::RecoverJoker {
            card_id,
            combination_index,
        } => game
            .recover_joker(player_id, *card_id, *combination_index)
            .map(|_| ActionOutcome::Continue),
        TurnAction::Discard { card_id } => game.discard(player_id, *card_id),
    }
}

/// Plans and plays a full turn for `player_id`.
///
/// Rejected plays are logged and skipped. A refused discard pickup falls back
/// to the deck, and a planned discard that is no longer in hand is replaced by
/// the last card held. Only a failed draw aborts the turn.
pub fn execute_turn(
    game: &mut GameState,
    player_id: PlayerId,
    difficulty: BotDifficulty,
) -> Result<TurnReport, GameError> {
    if game.is_finished() {
        return Err(GameError::MatchFinished);
    }
    match game.current_player() {
        Some(p) if p.id == player_id => {}
        _ if game.player(player_id).is_none() => return Err(GameError::UnknownPlayer),
        _ => return Err(GameError::NotYourTurn),
    }

    let plan = get_turn(game, player_id, difficulty).ok_or(GameError::UnknownPlayer)?;
    let mut report = TurnReport {
        plan: plan.clone(),
        applied: Vec::new(),
        rejected: Vec::new(),
        fallback_discard: None,
        finished: false,
    };

    // 1. Draw
    if draw_due(game)
        && let Some(draw) = &plan.draw
    {
        match apply_action(game, player_id, draw) {
            Ok(_) => report.applied.push(draw.clone()),
            Err(err) if *draw == TurnAction::DrawDiscard => {
                warn!(error = %err, "discard pickup refused, drawing from deck");
                report.rejected.push((draw.clone(), err));
                game.draw_from_deck(player_id)?;
                report.applied.push(TurnAction::DrawDeck);
            }
            Err(err) => return Err(err),
        }
    }

    // 2. Plays
    for action in &plan.plays {
        if game.is_finished() {
            break;
        }
        match apply_action(game, player_id, action) {
            Ok(_) => report.applied.push(action.clone()),
            Err(err) => {
                warn!(?action, error = %err, "bot action rejected");
                report.rejected.push((action.clone(), err));
            }
        }
    }

    // 3. Discard
    if !game.is_finished() {
        let hand = game.player(player_id).map(|p| p.hand.as_slice()).unwrap_or_default();
        let planned = match &plan.discard {
            Some(TurnAction::Discard { card_id }) => Some(*card_id),
            _ => None,
        };
        let card_id = match planned {
            Some(id) if hand.iter().any(|c| c.id == id) => Some(id),
            _ => {
                let fallback = hand.last().map(|c| c.id);
                if let Some(id) = fallback {
                    debug!(card = %id, "planned discard gone, using last card");
                    report.fallback_discard = Some(id);
                }
                fallback
            }
        };

        if let Some(card_id) = card_id {
            let action = TurnAction::Discard { card_id };
            apply_action(game, player_id, &action)?;
            report.applied.push(action);
        }
    }

    report.finished = game.is_finished();
    Ok(report)
}

// ─── Shared Planning Helpers ──────────────────────────────────────────────────

/// True when the current turn still needs its draw.
pub(crate) fn draw_due(game: &GameState) -> bool {
    game.turn_mode == TurnMode::DrawThenPlay && !game.drawn_this_turn
}

/// The hand as it will be once `taken` has been picked up.
pub(crate) fn simulated_hand(player: &Player, taken: Option<Card>) -> Vec<Card> {
    let mut hand = player.hand.clone();
    hand.extend(taken);
    hand
}

pub(crate) fn play_action(combinations: &[ComboCandidate]) -> Option<TurnAction> {
    if combinations.is_empty() {
        return None;
    }
    Some(TurnAction::PlayCombinations {
        combinations: combinations.iter().map(ComboCandidate::card_ids).collect(),
    })
}

/// `hand` minus every card the planned `plays` put on the table.
pub(crate) fn remaining_after(hand: &[Card], plays: &[TurnAction]) -> Vec<Card> {
    let mut spent: Vec<CardId> = Vec::new();
    for action in plays {
        match action {
            TurnAction::PlayCombinations { combinations } => {
                spent.extend(combinations.iter().flatten().copied());
            }
            TurnAction::AddToTable { card_id, .. } | TurnAction::RecoverJoker { card_id, .. } => {
                spent.push(*card_id);
            }
            _ => {}
        }
    }
    hand.iter().filter(|c| !spent.contains(&c.id)).copied().collect()
}

/// Table extensions for the player's own and teammates' combinations.
///
/// With `exhaustive` every fitting card is placed, growing each combination
/// as it goes; otherwise at most one card per combination.
pub(crate) fn table_additions(
    hand: &[Card],
    game: &GameState,
    player: &Player,
    exhaustive: bool,
) -> Vec<TurnAction> {
    let mut available: Vec<Card> = hand.to_vec();
    let mut actions = Vec::new();

    for (index, table_combination) in game.table.iter().enumerate() {
        if !game.can_access(player, table_combination) {
            continue;
        }

        let mut combination = table_combination.combination.clone();
        loop {
            let Some(position) = available.iter().position(|c| can_add_card(&combination, c)) else {
                break;
            };
            let card = available.remove(position);
            combination.push(card);
            actions.push(TurnAction::AddToTable {
                card_id: card.id,
                combination_index: index,
            });
            if !exhaustive {
                break;
            }
        }
    }

    actions
}

/// Lowest-point natural card among `cards`, skipping anything `keep` rejects.
pub(crate) fn cheapest<'a>(
    cards: impl IntoIterator<Item = &'a Card>,
    keep: impl Fn(&Card) -> bool,
) -> Option<Card> {
    cards
        .into_iter()
        .filter(|c| !c.is_joker() && keep(c))
        .min_by_key(|c| c.points())
        .copied()
}

fn discard_action(card: Option<Card>) -> Option<TurnAction> {
    card.map(|c| TurnAction::Discard { card_id: c.id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::card::{Rank, Suit};
    use crate::engine::config::{GameConfig, Variant};
    use crate::engine::deck::Deck;
    use crate::engine::game::{GamePhase, TableCombination};
    use crate::engine::rules::Combination;

    fn std(suit: Suit, rank: Rank) -> Card {
        Card::standard(suit, rank, 0)
    }

    fn game_at_regular_turn(variant: Variant, hand: Vec<Card>) -> (GameState, PlayerId) {
        let config = GameConfig::for_variant(variant, false);
        let mut game = GameState::with_seed(&["bot", "human"], config, &[], 21).unwrap();
        game.turn_mode = TurnMode::DrawThenPlay;
        game.drawn_this_turn = false;
        game.players[0].hand = hand;
        let id = game.players[0].id;
        (game, id)
    }

    fn opening_hand() -> Vec<Card> {
        vec![
            std(Suit::Hearts, Rank::Nine),
            std(Suit::Hearts, Rank::Ten),
            std(Suit::Hearts, Rank::Jack),
            std(Suit::Hearts, Rank::Queen),
            std(Suit::Hearts, Rank::King),
            std(Suit::Hearts, Rank::Ace),
            std(Suit::Diamonds, Rank::Ace),
            std(Suit::Spades, Rank::Ace),
            std(Suit::Clubs, Rank::Two),
            std(Suit::Diamonds, Rank::Six),
        ]
    }

    fn total_cards(game: &GameState) -> usize {
        game.players.iter().map(|p| p.hand.len()).sum::<usize>()
            + game.deck.remaining()
            + game.discard_pile.len()
            + game
                .table
                .iter()
                .map(|t| t.combination.cards.len())
                .sum::<usize>()
    }

    #[test]
    fn difficulty_parses_and_displays() {
        assert_eq!("Hard".parse::<BotDifficulty>().unwrap(), BotDifficulty::Hard);
        assert_eq!(BotDifficulty::Medium.to_string(), "medium");
        assert!("expert".parse::<BotDifficulty>().is_err());
    }

    #[test]
    fn turn_action_serializes_with_type_tag() {
        let action = TurnAction::Discard { card_id: CardId(7) };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "discard");
        assert_eq!(json["payload"]["card_id"], 7);

        let back: TurnAction = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn planning_does_not_touch_the_match() {
        let (game, id) = game_at_regular_turn(Variant::Classique, opening_hand());
        let snapshot = game.clone();
        for difficulty in [BotDifficulty::Easy, BotDifficulty::Medium, BotDifficulty::Hard] {
            assert!(get_turn(&game, id, difficulty).is_some());
        }
        assert_eq!(game, snapshot);
        assert!(get_turn(&game, PlayerId::new(), BotDifficulty::Easy).is_none());
    }

    #[test]
    fn remaining_after_subtracts_planned_cards() {
        let hand = opening_hand();
        let plays = vec![
            TurnAction::PlayCombinations {
                combinations: vec![vec![hand[0].id, hand[1].id, hand[2].id]],
            },
            TurnAction::AddToTable {
                card_id: hand[8].id,
                combination_index: 0,
            },
        ];
        let rest = remaining_after(&hand, &plays);
        assert_eq!(rest.len(), hand.len() - 4);
        assert!(!rest.contains(&hand[8]));
    }

    #[test]
    fn exhaustive_additions_grow_the_combination() {
        let (mut game, id) = game_at_regular_turn(Variant::Classique, Vec::new());
        game.table.push(TableCombination {
            combination: Combination::new(vec![
                std(Suit::Clubs, Rank::Four),
                std(Suit::Clubs, Rank::Five),
                std(Suit::Clubs, Rank::Six),
            ]),
            player_id: id,
            team_id: None,
        });
        let hand = vec![std(Suit::Clubs, Rank::Eight), std(Suit::Clubs, Rank::Seven)];
        let player = game.player(id).unwrap().clone();

        assert_eq!(table_additions(&hand, &game, &player, false).len(), 1);
        let all = table_additions(&hand, &game, &player, true);
        assert_eq!(
            all,
            vec![
                TurnAction::AddToTable {
                    card_id: hand[1].id,
                    combination_index: 0
                },
                TurnAction::AddToTable {
                    card_id: hand[0].id,
                    combination_index: 0
                },
            ]
        );
    }

    #[test]
    fn execute_turn_opens_and_discards() {
        let (mut game, id) = game_at_regular_turn(Variant::Classique, opening_hand());
        let report = execute_turn(&mut game, id, BotDifficulty::Easy).unwrap();

        assert!(report.rejected.is_empty());
        let player = game.player(id).unwrap();
        assert!(player.has_opened);
        assert_eq!(game.table.len(), 2);
        // 10 cards + draw - 7 played - 1 discarded
        assert_eq!(player.hand.len(), 3);
        assert_eq!(game.current_turn, 1);
        assert!(matches!(report.applied.last(), Some(TurnAction::Discard { .. })));
    }

    #[test]
    fn spent_discard_falls_back_to_last_card_held() {
        let eight = std(Suit::Hearts, Rank::Eight);
        let (mut game, id) = game_at_regular_turn(Variant::AvecJokers, vec![eight]);
        game.players[0].has_opened = true;
        // A carre is closed, so the eight can only win the joker back
        game.table.push(TableCombination {
            combination: Combination::new(vec![
                std(Suit::Clubs, Rank::Eight),
                std(Suit::Diamonds, Rank::Eight),
                std(Suit::Spades, Rank::Eight),
                Card::joker(0),
            ]),
            player_id: id,
            team_id: None,
        });
        let drawn = Card::standard(Suit::Clubs, Rank::Three, 1);
        game.deck = Deck::from_cards(vec![drawn]);
        game.discard_pile = vec![Card::standard(Suit::Clubs, Rank::Two, 1)];

        let plan = get_turn(&game, id, BotDifficulty::Hard).unwrap();
        assert_eq!(
            plan.plays,
            vec![TurnAction::RecoverJoker {
                card_id: eight.id,
                combination_index: 0
            }]
        );
        assert_eq!(plan.discard, Some(TurnAction::Discard { card_id: eight.id }));

        let report = execute_turn(&mut game, id, BotDifficulty::Hard).unwrap();
        let joker_id = Card::joker(0).id;
        assert_eq!(report.fallback_discard, Some(joker_id));
        assert_eq!(
            report.applied.last(),
            Some(&TurnAction::Discard { card_id: joker_id })
        );
        assert!(!report.finished);
        assert_eq!(game.current_turn, 1);
        assert_eq!(game.player(id).unwrap().hand, vec![drawn]);
        assert_eq!(game.top_discard().map(|c| c.id), Some(joker_id));
        assert!(!game.table[0].combination.has_joker());
    }

    #[test]
    fn execute_turn_skips_draw_on_discard_only_turn() {
        let config = GameConfig::default();
        let mut game = GameState::with_seed(&["a", "b"], config, &[], 3).unwrap();
        let dealer = game.players[0].id;
        let deck_before = game.deck.remaining();

        let report = execute_turn(&mut game, dealer, BotDifficulty::Medium).unwrap();
        assert!(!report.applied.contains(&TurnAction::DrawDeck));
        assert_eq!(game.deck.remaining(), deck_before);
        assert_eq!(game.current_turn, 1);
    }

    #[test]
    fn execute_turn_rejects_wrong_player_and_finished_match() {
        let (mut game, id) = game_at_regular_turn(Variant::Classique, opening_hand());
        let other = game.players[1].id;
        assert_eq!(
            execute_turn(&mut game, other, BotDifficulty::Easy).unwrap_err(),
            GameError::NotYourTurn
        );

        game.phase = GamePhase::Finished;
        assert_eq!(
            execute_turn(&mut game, id, BotDifficulty::Easy).unwrap_err(),
            GameError::MatchFinished
        );
    }

    #[test]
    fn bots_play_whole_matches_without_losing_cards() {
        for (seed, variant) in [(1, Variant::Classique), (2, Variant::AvecJokers), (3, Variant::AvecJokers)] {
            let config = GameConfig::for_variant(variant, false);
            let mut game = GameState::with_seed(&["easy", "medium", "hard"], config, &[], seed).unwrap();
            let expected = total_cards(&game);
            let levels = [BotDifficulty::Easy, BotDifficulty::Medium, BotDifficulty::Hard];

            for _ in 0..600 {
                if game.is_finished() {
                    break;
                }
                let current = game.current_turn;
                let id = game.players[current].id;
                let difficulty = levels[current % levels.len()];
                match execute_turn(&mut game, id, difficulty) {
                    Ok(_) => {}
                    Err(GameError::DeckExhausted) => break,
                    Err(other) => panic!("unexpected error: {other}"),
                }
                assert_eq!(total_cards(&game), expected);
            }
        }
    }
}
