use std::collections::HashSet;

use super::{
    TurnAction, TurnPlan, cheapest, discard_action, draw_due, play_action, remaining_after,
    simulated_hand, table_additions,
};
use crate::engine::card::{Card, Rank};
use crate::engine::combo_finder::{
    HandAnalysis, analyze_hand, choose_card_to_discard, disjoint_combinations,
};
use crate::engine::game::{GameState, Player};
use crate::engine::opening::{DiscardPickup, can_take_discard, required_opening_points};
use crate::engine::rules::{can_add_card, can_replace_joker, detect_combination_type};

/// Points from which a card counts as valuable for the scarcity rule.
const SCARCE_MIN_POINTS: u32 = 10;
/// Visible copies that make a valuable discard worth grabbing.
const SCARCE_MIN_SEEN: usize = 1;

/// Every card face-up on the table or in the discard pile.
fn visible_cards(game: &GameState) -> Vec<Card> {
    game.table
        .iter()
        .flat_map(|t| t.combination.cards.iter().copied())
        .chain(game.discard_pile.iter().copied())
        .collect()
}

/// Remembers the visible cards, never pays the pickup penalty, opens at the
/// live threshold, and keeps opponents' ranks out of the discard pile.
pub(super) fn plan_turn(game: &GameState, player: &Player) -> TurnPlan {
    let config = &game.config;
    let required = required_opening_points(game, player, config);
    let analysis = analyze_hand(&player.hand, required);
    let seen = visible_cards(game);

    let mut taken = None;
    let draw = if draw_due(game) {
        let free = can_take_discard(player, game, config) == DiscardPickup::Free;
        taken = game
            .top_discard()
            .copied()
            .filter(|card| free && should_take_discard(card, &analysis, &seen));
        Some(if taken.is_some() {
            TurnAction::DrawDiscard
        } else {
            TurnAction::DrawDeck
        })
    } else {
        None
    };

    let hand = simulated_hand(player, taken);
    let analysis = analyze_hand(&hand, required);

    let mut plays = Vec::new();
    if !player.has_opened {
        if let Some(best) = &analysis.best_opening {
            plays.extend(play_action(best));
        }
    } else {
        plays.extend(play_action(&disjoint_combinations(&analysis.valid_combinations)));

        let rest = remaining_after(&hand, &plays);
        plays.extend(table_additions(&rest, game, player, true));

        if config.joker_recoverable {
            let rest = remaining_after(&hand, &plays);
            plays.extend(joker_recoveries(&rest, game));
        }
    }

    let rest = remaining_after(&hand, &plays);
    let discard = if rest.is_empty() {
        hand.last().copied()
    } else {
        defensive_discard(&rest, &analyze_hand(&rest, required), game, player)
    };

    TurnPlan {
        draw,
        plays,
        discard: discard_action(discard),
    }
}

fn should_take_discard(card: &Card, analysis: &HandAnalysis, seen: &[Card]) -> bool {
    if card.is_joker() {
        return true;
    }

    let completes_partial = analysis.partial_groups.iter().any(|group| {
        let mut cards = group.clone();
        cards.push(*card);
        detect_combination_type(&cards).is_some()
    });
    if completes_partial {
        return true;
    }

    if analysis
        .valid_combinations
        .iter()
        .any(|c| can_add_card(&c.combination, card))
    {
        return true;
    }

    // Scarcity: the twin of a valuable card is already out of play.
    let copies_seen = seen
        .iter()
        .filter(|c| c.id != card.id && c.same_face(card))
        .count();
    card.points() >= SCARCE_MIN_POINTS && copies_seen >= SCARCE_MIN_SEEN
}

/// One recovery per joker-holding table combination, using the first natural card that fits.
fn joker_recoveries(hand: &[Card], game: &GameState) -> Vec<TurnAction> {
    let mut available: Vec<Card> = hand.iter().filter(|c| !c.is_joker()).copied().collect();
    let mut actions = Vec::new();

    for (index, table_combination) in game.table.iter().enumerate() {
        if !table_combination.combination.has_joker() {
            continue;
        }
        if let Some(position) = available
            .iter()
            .position(|c| can_replace_joker(&table_combination.combination, c).is_some())
        {
            let card = available.remove(position);
            actions.push(TurnAction::RecoverJoker {
                card_id: card.id,
                combination_index: index,
            });
        }
    }

    actions
}

/// Ranks laid down by players who are neither this player nor a teammate.
fn opponent_ranks(game: &GameState, player: &Player) -> HashSet<Rank> {
    game.table
        .iter()
        .filter(|t| t.player_id != player.id)
        .filter(|t| !(player.team_id.is_some() && t.team_id == player.team_id))
        .flat_map(|t| t.combination.cards.iter().filter_map(Card::rank))
        .collect()
}

fn defensive_discard(hand: &[Card], analysis: &HandAnalysis, game: &GameState, player: &Player) -> Option<Card> {
    let dangerous = opponent_ranks(game, player);
    let safe = |c: &Card| c.rank().is_none_or(|r| !dangerous.contains(&r));

    cheapest(&analysis.lone_cards, safe)
        .or_else(|| cheapest(analysis.partial_groups.iter().flatten(), safe))
        .or_else(|| cheapest(hand, safe))
        .or_else(|| cheapest(&analysis.lone_cards, |_| true))
        .or_else(|| choose_card_to_discard(hand, analysis))
}
