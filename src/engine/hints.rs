use std::cmp::Reverse;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use crate::game::{Card, Desk, Game, Move, Suit};

/// How sure the generator is that a suggested move cannot hurt. Totally
/// ordered; higher tiers gate cheaper decisions in the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence {
    Low,
    Medium,
    High,
    VeryHigh,
    Absolute,
}

impl Confidence {
    pub const ALL: [Confidence; 5] = [
        Confidence::Low,
        Confidence::Medium,
        Confidence::High,
        Confidence::VeryHigh,
        Confidence::Absolute,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintMode {
    /// Consider only the currently visible waste card.
    CurrentState,
    /// Cycle the stock on a scratch copy to enumerate every card reachable
    /// without touching the tableau or foundations.
    WithFullStock,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveHint {
    pub mv: Move,
    pub card: Card,
    pub confidence: Confidence,
}

pub fn hash_desk(desk: &Desk) -> u64 {
    let mut hasher = DefaultHasher::new();
    desk.hash(&mut hasher);
    hasher.finish()
}

/// Ranked legal-move suggestions, ordered by descending confidence. Every
/// returned move executes without error, after any stock cycling a waste
/// hint implies.
pub fn move_hints(game: &Game, mode: HintMode) -> Vec<MoveHint> {
    let desk = game.state();
    let rules = game.rules();
    let allow = rules.allow_non_king_to_empty;
    let victory_locked = desk.is_victory_guaranteed();
    let mut hints = Vec::new();

    for (pile, cards) in desk.tableau().piles().iter().enumerate() {
        let Some(card) = cards.top() else {
            continue;
        };
        if !card.face_up {
            hints.push(MoveHint {
                mv: Move::RevealTableauCard { pile },
                card: *card,
                confidence: Confidence::Absolute,
            });
        }
    }

    for (pile, cards) in desk.tableau().piles().iter().enumerate() {
        let Some(card) = cards.top() else {
            continue;
        };
        if card.face_up && desk.can_place_on_foundation(card) {
            hints.push(MoveHint {
                mv: Move::TableauToFoundation { pile },
                card: *card,
                confidence: foundation_confidence(desk, card, victory_locked),
            });
        }
    }

    let waste_cards = match mode {
        HintMode::CurrentState => desk.waste().top().copied().into_iter().collect(),
        HintMode::WithFullStock => reachable_waste_cards(game),
    };
    for card in &waste_cards {
        if desk.can_place_on_foundation(card) {
            hints.push(MoveHint {
                mv: Move::WasteToFoundation,
                card: *card,
                confidence: foundation_confidence(desk, card, victory_locked),
            });
        }
        for pile in 0..desk.tableau().pile_count() {
            if desk.can_place_on_tableau_pile(pile, card, allow) {
                hints.push(MoveHint {
                    mv: Move::WasteToTableau { pile },
                    card: *card,
                    confidence: Confidence::Medium,
                });
            }
        }
    }

    let pile_count = desk.tableau().pile_count();
    for src in 0..pile_count {
        let source = &desk.tableau().piles()[src];
        for card_index in 0..source.len() {
            for dst in 0..pile_count {
                if !desk.can_move_tableau_run(src, card_index, dst, allow) {
                    continue;
                }
                let uncovers = card_index > 0
                    && source
                        .get(card_index - 1)
                        .map(|below| !below.face_up)
                        .unwrap_or(false);
                let to_empty = desk.tableau().piles()[dst].is_empty();
                // Shuffling a whole pile onto an empty pile gains nothing.
                if to_empty && card_index == 0 {
                    continue;
                }
                let confidence = if uncovers && !to_empty {
                    Confidence::VeryHigh
                } else if uncovers {
                    Confidence::High
                } else {
                    Confidence::Low
                };
                let card = source.cards()[card_index];
                hints.push(MoveHint {
                    mv: Move::TableauToTableau {
                        src,
                        card_index,
                        dst,
                    },
                    card,
                    confidence,
                });
            }
        }
    }

    if !victory_locked {
        for suit in Suit::ALL {
            let Some(card) = desk.foundation(suit).top() else {
                continue;
            };
            for pile in 0..pile_count {
                if desk.can_place_on_tableau_pile(pile, card, allow) {
                    hints.push(MoveHint {
                        mv: Move::FoundationToTableau { suit, pile },
                        card: *card,
                        confidence: Confidence::Low,
                    });
                }
            }
        }
    }

    hints.sort_by_key(|hint| Reverse(hint.confidence));
    hints
}

fn foundation_confidence(desk: &Desk, card: &Card, victory_locked: bool) -> Confidence {
    if victory_locked || card.rank <= 2 || is_safe_foundation_move(desk, card) {
        Confidence::Absolute
    } else {
        Confidence::VeryHigh
    }
}

/// A foundation move can never be needed back in the tableau once both
/// opposite-color foundations have reached the rank below it.
fn is_safe_foundation_move(desk: &Desk, card: &Card) -> bool {
    match card.suit {
        Suit::Hearts | Suit::Diamonds => {
            desk.foundation_top_rank(Suit::Clubs) >= card.rank - 1
                && desk.foundation_top_rank(Suit::Spades) >= card.rank - 1
        }
        Suit::Clubs | Suit::Spades => {
            desk.foundation_top_rank(Suit::Hearts) >= card.rank - 1
                && desk.foundation_top_rank(Suit::Diamonds) >= card.rank - 1
        }
    }
}

/// First-seen waste tops over one full stock cycle on a scratch desk. The
/// caller's game is never modified. Draw/redeal is deterministic, so the
/// walk stops as soon as a desk state repeats.
pub(crate) fn reachable_waste_cards(game: &Game) -> Vec<Card> {
    let rules = game.rules();
    let mut desk = game.state().clone();
    let mut seen_states = HashSet::new();
    seen_states.insert(hash_desk(&desk));
    let mut seen_cards = HashSet::new();
    let mut cards = Vec::new();

    if let Some(card) = desk.waste().top() {
        seen_cards.insert(card.deal_order);
        cards.push(*card);
    }

    loop {
        let next = if desk.stock().is_empty() {
            if desk.waste().is_empty() {
                break;
            }
            match desk.redeal() {
                Ok(next) => next,
                Err(_) => break,
            }
        } else {
            match desk.draw_cards(rules.drawn_cards) {
                Ok(next) => next,
                Err(_) => break,
            }
        };
        desk = next;
        if !seen_states.insert(hash_desk(&desk)) {
            break;
        }
        if let Some(card) = desk.waste().top() {
            if seen_cards.insert(card.deal_order) {
                cards.push(*card);
            }
        }
    }

    cards
}
