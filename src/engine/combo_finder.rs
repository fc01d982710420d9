use crate::engine::card::{Card, CardId, Rank, Suit};
use crate::engine::rules::{Combination, calc_points};
use tracing::debug;

// ─── Core Types ───────────────────────────────────────────────────────────────

/// A bitmask of hand positions used by a combination.
/// Only the first 64 cards of a hand are considered.
pub type HandMask = u64;

const MAX_HAND_POSITIONS: usize = HandMask::BITS as usize;

/// Upper bound on the candidate list fed to the opening search.
pub const MAX_OPENING_CANDIDATES: usize = 32;

/// A valid combination found in a hand, with the hand positions it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComboCandidate {
    pub combination: Combination,
    /// Indices into the analysed hand
    pub card_indices: Vec<usize>,
    /// Precomputed bitmask for fast overlap detection
    pub mask: HandMask,
}

impl ComboCandidate {
    fn from_indices(hand: &[Card], card_indices: Vec<usize>) -> Option<Self> {
        if card_indices.iter().any(|&i| i >= MAX_HAND_POSITIONS || i >= hand.len()) {
            return None;
        }
        let combination = Combination::new(card_indices.iter().map(|&i| hand[i]).collect());
        if !combination.is_valid() {
            return None;
        }
        let mask = card_indices.iter().fold(0, |m, &i| m | (1 << i));
        Some(Self {
            combination,
            card_indices,
            mask,
        })
    }

    /// True if this combination shares any hand position with another.
    pub fn overlaps(&self, other: &ComboCandidate) -> bool {
        (self.mask & other.mask) != 0
    }

    pub fn points(&self) -> u32 {
        self.combination.points
    }

    pub fn card_ids(&self) -> Vec<CardId> {
        self.combination.cards.iter().map(|c| c.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandAnalysis {
    /// Suites first, then brelans and carres. May overlap.
    pub valid_combinations: Vec<ComboCandidate>,
    /// Two-card near-combinations among cards no valid combination uses.
    pub partial_groups: Vec<Vec<Card>>,
    pub lone_cards: Vec<Card>,
    pub total_points: u32,
    /// Cheapest disjoint subset clearing the threshold with a suite, if any.
    pub best_opening: Option<Vec<ComboCandidate>>,
}

impl HandAnalysis {
    pub fn best_opening_points(&self) -> u32 {
        self.best_opening
            .iter()
            .flatten()
            .map(ComboCandidate::points)
            .sum()
    }
}

fn joker_positions(hand: &[Card]) -> Vec<usize> {
    hand.iter()
        .enumerate()
        .filter(|(_, c)| c.is_joker())
        .map(|(i, _)| i)
        .collect()
}

// ─── Suites ───────────────────────────────────────────────────────────────────

/// Greedy runs per suit, one per starting card.
///
/// Each run extends through consecutive ranks and fills gaps from the shared
/// joker pool, stopping at the first gap the pool cannot cover. A second copy
/// of a rank already in the run is skipped.
pub fn find_suites(hand: &[Card]) -> Vec<ComboCandidate> {
    let jokers = joker_positions(hand);
    let mut candidates: Vec<ComboCandidate> = Vec::new();

    for suit in Suit::ALL {
        let mut suit_cards: Vec<(usize, Rank)> = hand
            .iter()
            .enumerate()
            .filter(|(_, c)| c.suit() == Some(suit))
            .filter_map(|(i, c)| c.rank().map(|r| (i, r)))
            .collect();
        suit_cards.sort_by_key(|(_, rank)| rank.order());

        for start in 0..suit_cards.len() {
            let (first, first_rank) = suit_cards[start];
            let mut run = vec![first];
            let mut last = first_rank.order();
            let mut jokers_used = 0;

            for &(idx, rank) in &suit_cards[start + 1..] {
                let gap = rank.order() - last - 1;
                if gap < 0 {
                    continue;
                }
                let gap = gap as usize;
                if gap > jokers.len() - jokers_used {
                    break;
                }
                run.extend_from_slice(&jokers[jokers_used..jokers_used + gap]);
                jokers_used += gap;
                run.push(idx);
                last = rank.order();
            }

            if run.len() >= 3
                && let Some(candidate) = ComboCandidate::from_indices(hand, run)
                && !candidates.iter().any(|c| c.mask == candidate.mask)
            {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

// ─── Brelans and Carres ───────────────────────────────────────────────────────

/// For each rank: a brelan from the first three distinct suits, a carre when
/// all four suits are present, or a joker-completed brelan from two suits.
pub fn find_sets_of_kind(hand: &[Card]) -> Vec<ComboCandidate> {
    let jokers = joker_positions(hand);
    let mut candidates = Vec::new();

    for rank in Rank::ALL {
        let mut seen_suits: Vec<Suit> = Vec::with_capacity(4);
        let mut distinct: Vec<usize> = Vec::with_capacity(4);
        for (i, card) in hand.iter().enumerate() {
            if card.rank() == Some(rank)
                && let Some(suit) = card.suit()
                && !seen_suits.contains(&suit)
            {
                seen_suits.push(suit);
                distinct.push(i);
            }
        }

        let mut groups: Vec<Vec<usize>> = Vec::new();
        match (distinct.len(), jokers.first()) {
            (n, _) if n >= 3 => {
                groups.push(distinct[..3].to_vec());
                if n == 4 {
                    groups.push(distinct.clone());
                }
            }
            (2, Some(&joker)) => groups.push(vec![distinct[0], distinct[1], joker]),
            _ => {}
        }

        candidates.extend(
            groups
                .into_iter()
                .filter_map(|g| ComboCandidate::from_indices(hand, g)),
        );
    }

    candidates
}

// ─── Partial Groups ───────────────────────────────────────────────────────────

/// Two-card starts: same-rank pairs in different suits, and same-suit pairs
/// one or two ranks apart.
pub fn find_partial_groups(cards: &[Card]) -> Vec<Vec<Card>> {
    let mut partials = Vec::new();

    for rank in Rank::ALL {
        let of_rank: Vec<&Card> = cards.iter().filter(|c| c.rank() == Some(rank)).collect();
        let pair = of_rank.iter().enumerate().find_map(|(i, a)| {
            of_rank[i + 1..]
                .iter()
                .find(|b| b.suit() != a.suit())
                .map(|b| vec![**a, **b])
        });
        partials.extend(pair);
    }

    for suit in Suit::ALL {
        let mut of_suit: Vec<(Rank, Card)> = cards
            .iter()
            .filter(|c| c.suit() == Some(suit))
            .filter_map(|c| c.rank().map(|r| (r, *c)))
            .collect();
        of_suit.sort_by_key(|(r, _)| r.order());

        for pair in of_suit.windows(2) {
            let gap = pair[1].0.order() - pair[0].0.order();
            if (1..=2).contains(&gap) {
                partials.push(vec![pair[0].1, pair[1].1]);
            }
        }
    }

    partials
}

// ─── Opening Search ───────────────────────────────────────────────────────────

/// Running state of the opening search.
struct OpeningSearch<'a> {
    candidates: &'a [ComboCandidate],
    required: u32,
    best: Option<(u32, u64)>,
}

impl OpeningSearch<'_> {
    /// Depth-first over include/exclude decisions. `selection` has bit `i` set
    /// when candidate `i` is chosen, so comparing selections compares subsets
    /// in ascending bitmask enumeration order.
    fn solve(&mut self, next: usize, used: HandMask, selection: u64, points: u32, has_suite: bool) {
        if selection != 0 && has_suite && points >= self.required {
            if self.best.is_none_or(|best| (points, selection) < best) {
                self.best = Some((points, selection));
            }
            // Every extension costs more points.
            return;
        }

        if let Some((best_points, _)) = self.best
            && points >= best_points
        {
            return;
        }

        for i in next..self.candidates.len() {
            let candidate = &self.candidates[i];
            if candidate.mask & used != 0 {
                continue;
            }
            self.solve(
                i + 1,
                used | candidate.mask,
                selection | (1 << i),
                points + candidate.points(),
                has_suite || candidate.combination.is_suite(),
            );
        }
    }
}

/// Cheapest non-overlapping subset of `candidates` holding a suite and
/// totalling at least `required` points. Ties go to the earliest subset in
/// ascending bitmask order. Only the first [`MAX_OPENING_CANDIDATES`] are searched.
pub fn find_best_opening(candidates: &[ComboCandidate], required: u32) -> Option<Vec<ComboCandidate>> {
    let searched = if candidates.len() > MAX_OPENING_CANDIDATES {
        debug!(
            candidates = candidates.len(),
            kept = MAX_OPENING_CANDIDATES,
            "truncating opening search"
        );
        &candidates[..MAX_OPENING_CANDIDATES]
    } else {
        candidates
    };

    let mut search = OpeningSearch {
        candidates: searched,
        required,
        best: None,
    };
    search.solve(0, 0, 0, 0, false);

    let (_, selection) = search.best?;
    Some(
        searched
            .iter()
            .enumerate()
            .filter(|(i, _)| selection & (1 << i) != 0)
            .map(|(_, c)| c.clone())
            .collect(),
    )
}

/// A non-overlapping selection that favours longer, then richer, combinations.
pub fn disjoint_combinations(candidates: &[ComboCandidate]) -> Vec<ComboCandidate> {
    let mut order: Vec<&ComboCandidate> = candidates.iter().collect();
    order.sort_by(|a, b| {
        b.card_indices
            .len()
            .cmp(&a.card_indices.len())
            .then(b.points().cmp(&a.points()))
    });

    let mut used: HandMask = 0;
    let mut chosen = Vec::new();
    for candidate in order {
        if candidate.mask & used == 0 {
            used |= candidate.mask;
            chosen.push(candidate.clone());
        }
    }
    chosen
}

// ─── Analysis ─────────────────────────────────────────────────────────────────

pub fn analyze_hand(hand: &[Card], required_points: u32) -> HandAnalysis {
    let mut valid_combinations = find_suites(hand);
    valid_combinations.extend(find_sets_of_kind(hand));

    let used: HandMask = valid_combinations.iter().fold(0, |m, c| m | c.mask);
    let is_used = |i: usize| i < MAX_HAND_POSITIONS && used & (1 << i) != 0;

    let unused: Vec<Card> = hand
        .iter()
        .enumerate()
        .filter(|&(i, _)| !is_used(i))
        .map(|(_, c)| *c)
        .collect();
    let partial_groups = find_partial_groups(&unused);

    let lone_cards = unused
        .into_iter()
        .filter(|c| !partial_groups.iter().flatten().any(|p| p.id == c.id))
        .collect();

    let best_opening = find_best_opening(&valid_combinations, required_points);

    HandAnalysis {
        valid_combinations,
        partial_groups,
        lone_cards,
        total_points: calc_points(hand),
        best_opening,
    }
}

fn lowest_natural<'a>(cards: impl IntoIterator<Item = &'a Card>) -> Option<Card> {
    cards
        .into_iter()
        .filter(|c| !c.is_joker())
        .min_by_key(|c| c.points())
        .copied()
}

/// Lowest-point lone card, else lowest-point card of a partial group, else
/// lowest-point card overall. Jokers go only when nothing else is left.
pub fn choose_card_to_discard(hand: &[Card], analysis: &HandAnalysis) -> Option<Card> {
    lowest_natural(&analysis.lone_cards)
        .or_else(|| lowest_natural(analysis.partial_groups.iter().flatten()))
        .or_else(|| lowest_natural(hand))
        .or_else(|| hand.last().copied())
}
