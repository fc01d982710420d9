use super::{
    TurnAction, TurnPlan, cheapest, discard_action, draw_due, play_action, remaining_after,
    simulated_hand, table_additions,
};
use crate::engine::card::Card;
use crate::engine::combo_finder::{
    HandAnalysis, analyze_hand, choose_card_to_discard, disjoint_combinations,
};
use crate::engine::game::{GameState, Player};
use crate::engine::opening::can_take_discard;
use crate::engine::rules::{can_add_card, detect_combination_type};

/// Takes the discard when it helps, even at a penalty, opens on the base
/// minimum, extends its own table combinations and guards its partial groups.
pub(super) fn plan_turn(game: &GameState, player: &Player) -> TurnPlan {
    let min_points = game.config.opening_min_points;
    let analysis = analyze_hand(&player.hand, min_points);

    let mut taken = None;
    let draw = if draw_due(game) {
        taken = game.top_discard().copied().filter(|card| {
            discard_is_useful(card, &analysis)
                && can_take_discard(player, game, &game.config).is_allowed()
        });
        Some(if taken.is_some() {
            TurnAction::DrawDiscard
        } else {
            TurnAction::DrawDeck
        })
    } else {
        None
    };

    let hand = simulated_hand(player, taken);
    let analysis = analyze_hand(&hand, min_points);

    let mut plays = Vec::new();
    if !player.has_opened {
        if let Some(best) = &analysis.best_opening {
            plays.extend(play_action(best));
        }
    } else {
        plays.extend(play_action(&disjoint_combinations(&analysis.valid_combinations)));
        let rest = remaining_after(&hand, &plays);
        plays.extend(table_additions(&rest, game, player, false));
    }

    let rest = remaining_after(&hand, &plays);
    let discard = if rest.is_empty() {
        hand.last().copied()
    } else {
        smart_discard(&rest, &analyze_hand(&rest, min_points))
    };

    TurnPlan {
        draw,
        plays,
        discard: discard_action(discard),
    }
}

/// A joker, a card completing a partial group, or a card extending a combination.
pub(super) fn discard_is_useful(card: &Card, analysis: &HandAnalysis) -> bool {
    if card.is_joker() {
        return true;
    }

    let completes_partial = analysis.partial_groups.iter().any(|group| {
        let mut cards = group.clone();
        cards.push(*card);
        detect_combination_type(&cards).is_some()
    });

    completes_partial
        || analysis
            .valid_combinations
            .iter()
            .any(|c| can_add_card(&c.combination, card))
}

fn smart_discard(hand: &[Card], analysis: &HandAnalysis) -> Option<Card> {
    let protected: Vec<&Card> = analysis.partial_groups.iter().flatten().collect();
    cheapest(&analysis.lone_cards, |c| !protected.contains(&c))
        .or_else(|| choose_card_to_discard(hand, analysis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::card::{Rank, Suit};
    use crate::engine::config::GameConfig;
    use crate::engine::game::TurnMode;

    fn std(suit: Suit, rank: Rank) -> Card {
        Card::standard(suit, rank, 0)
    }

    fn game_with_hand(hand: Vec<Card>, top: Card) -> GameState {
        let mut game = GameState::with_seed(&["bot", "other"], GameConfig::default(), &[], 8).unwrap();
        game.turn_mode = TurnMode::DrawThenPlay;
        game.players[0].hand = hand;
        game.discard_pile = vec![top];
        game
    }

    #[test]
    fn takes_discard_that_completes_a_pair() {
        let hand = vec![
            std(Suit::Hearts, Rank::Eight),
            std(Suit::Clubs, Rank::Eight),
            std(Suit::Spades, Rank::Two),
        ];
        let game = game_with_hand(hand, std(Suit::Diamonds, Rank::Eight));
        let plan = plan_turn(&game, &game.players[0]);
        assert_eq!(plan.draw, Some(TurnAction::DrawDiscard));
    }

    #[test]
    fn takes_discard_even_when_penalized() {
        let hand = vec![
            std(Suit::Hearts, Rank::Five),
            std(Suit::Hearts, Rank::Six),
            std(Suit::Clubs, Rank::King),
        ];
        let game = game_with_hand(hand, std(Suit::Hearts, Rank::Seven));
        assert!(!game.players[0].has_opened);
        let plan = plan_turn(&game, &game.players[0]);
        assert_eq!(plan.draw, Some(TurnAction::DrawDiscard));
    }

    #[test]
    fn ignores_useless_discard() {
        let hand = vec![
            std(Suit::Hearts, Rank::Five),
            std(Suit::Hearts, Rank::Six),
            std(Suit::Clubs, Rank::King),
        ];
        let game = game_with_hand(hand, std(Suit::Spades, Rank::Two));
        let plan = plan_turn(&game, &game.players[0]);
        assert_eq!(plan.draw, Some(TurnAction::DrawDeck));
    }

    #[test]
    fn ignores_discard_when_pickup_is_forbidden() {
        let hand = vec![std(Suit::Hearts, Rank::Eight), std(Suit::Clubs, Rank::Eight)];
        let mut game = game_with_hand(hand, std(Suit::Diamonds, Rank::Eight));
        game.config.can_take_discard = false;
        let plan = plan_turn(&game, &game.players[0]);
        assert_eq!(plan.draw, Some(TurnAction::DrawDeck));
    }

    #[test]
    fn joker_is_always_useful() {
        let analysis = analyze_hand(&[std(Suit::Clubs, Rank::Two)], 71);
        assert!(discard_is_useful(&Card::joker(0), &analysis));
    }

    #[test]
    fn discard_keeps_partial_groups() {
        let hand = vec![
            std(Suit::Hearts, Rank::Two),
            std(Suit::Hearts, Rank::Three),
            std(Suit::Clubs, Rank::Nine),
        ];
        let game = game_with_hand(hand.clone(), std(Suit::Spades, Rank::King));
        let plan = plan_turn(&game, &game.players[0]);
        assert_eq!(plan.discard, Some(TurnAction::Discard { card_id: hand[2].id }));
    }

    #[test]
    fn taken_discard_completes_the_opening() {
        // 10-K of hearts is 40; the aces only reach 73 with the ace of spades
        let hand = vec![
            std(Suit::Hearts, Rank::Ten),
            std(Suit::Hearts, Rank::Jack),
            std(Suit::Hearts, Rank::Queen),
            std(Suit::Hearts, Rank::King),
            std(Suit::Hearts, Rank::Ace),
            std(Suit::Diamonds, Rank::Ace),
            std(Suit::Clubs, Rank::Two),
        ];
        let ace = std(Suit::Spades, Rank::Ace);

        let without = game_with_hand(hand.clone(), std(Suit::Spades, Rank::Four));
        let plan = plan_turn(&without, &without.players[0]);
        assert_eq!(plan.draw, Some(TurnAction::DrawDeck));
        assert!(plan.plays.is_empty());

        let game = game_with_hand(hand, ace);
        let plan = plan_turn(&game, &game.players[0]);
        assert_eq!(plan.draw, Some(TurnAction::DrawDiscard));
        let Some(TurnAction::PlayCombinations { combinations }) = plan.plays.first() else {
            panic!("expected an opening, got {:?}", plan.plays);
        };
        assert_eq!(combinations.len(), 2);
        assert!(combinations.iter().flatten().any(|id| *id == ace.id));
        let two_of_clubs = game.players[0].hand[6].id;
        assert_eq!(plan.discard, Some(TurnAction::Discard { card_id: two_of_clubs }));
    }
}
