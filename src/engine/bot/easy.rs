use super::{TurnAction, TurnPlan, discard_action, draw_due, play_action, remaining_after};
use crate::engine::combo_finder::{analyze_hand, choose_card_to_discard, disjoint_combinations};
use crate::engine::game::{GameState, Player};

/// Always draws from the deck, opens as soon as the base minimum is reachable,
/// then dumps whatever combinations it holds. Discards its cheapest loose card.
pub(super) fn plan_turn(game: &GameState, player: &Player) -> TurnPlan {
    let min_points = game.config.opening_min_points;
    let hand = &player.hand;
    let analysis = analyze_hand(hand, min_points);

    let draw = draw_due(game).then_some(TurnAction::DrawDeck);

    let mut plays = Vec::new();
    if !player.has_opened {
        if let Some(best) = &analysis.best_opening {
            plays.extend(play_action(best));
        }
    } else {
        plays.extend(play_action(&disjoint_combinations(&analysis.valid_combinations)));
    }

    let rest = remaining_after(hand, &plays);
    let discard = if rest.is_empty() {
        hand.last().copied()
    } else {
        choose_card_to_discard(&rest, &analyze_hand(&rest, min_points))
    };

    TurnPlan {
        draw,
        plays,
        discard: discard_action(discard),
    }
}
