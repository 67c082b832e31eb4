use crate::engine::hints::{move_hints, Confidence, HintMode, MoveHint};
use crate::game::{Game, GameError, Move};

pub type RankingHeuristic = fn(&Game) -> i64;

/// Face-up cards across foundations and tableau; higher is better.
pub fn default_state_ranking(game: &Game) -> i64 {
    let desk = game.state();
    (desk.foundation_count() + desk.tableau().face_up_count()) as i64
}

pub const MAX_LOOK_AHEAD_MOVES: u8 = 8;

#[derive(Debug, Clone, Copy)]
pub struct BotOptions {
    /// Best hint at or above this tier is taken immediately, no search.
    pub min_auto_accept_confidence: Option<Confidence>,
    /// How many tiers below the best available tier still enter the search.
    pub max_considered_confidence_levels: u8,
    /// Recursion depth of the best-move search.
    pub look_ahead_moves: u8,
    pub ranking: RankingHeuristic,
}

impl Default for BotOptions {
    fn default() -> Self {
        BotOptions {
            min_auto_accept_confidence: Some(Confidence::Absolute),
            max_considered_confidence_levels: 1,
            look_ahead_moves: 2,
            ranking: default_state_ranking,
        }
    }
}

impl BotOptions {
    /// The fields are unsigned, so the caps are what keeps a malformed
    /// configuration from requesting an unbounded search.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.look_ahead_moves > MAX_LOOK_AHEAD_MOVES {
            return Err(GameError::InvalidBotOptions(format!(
                "look_ahead_moves {} exceeds the supported maximum {MAX_LOOK_AHEAD_MOVES}",
                self.look_ahead_moves
            )));
        }
        if usize::from(self.max_considered_confidence_levels) >= Confidence::ALL.len() {
            return Err(GameError::InvalidBotOptions(format!(
                "max_considered_confidence_levels {} exceeds the {} available tiers",
                self.max_considered_confidence_levels,
                Confidence::ALL.len()
            )));
        }
        Ok(())
    }
}

/// Plays the single best move and returns the resulting game. Returns the
/// game unchanged when it is already won or no hint exists; callers detect
/// "no progress" by comparing the result to the input.
pub fn play_best_move(game: &Game, options: &BotOptions) -> Result<Game, GameError> {
    options.validate()?;
    if game.is_won() {
        return Ok(game.clone());
    }
    let hints = move_hints(game, HintMode::WithFullStock);
    let Some(best) = hints.first() else {
        return Ok(game.clone());
    };

    if let Some(min) = options.min_auto_accept_confidence {
        if best.confidence >= min {
            return apply_hint(game, best);
        }
    }

    let mut chosen: Option<(i64, Game)> = None;
    for hint in considered(&hints, options.max_considered_confidence_levels) {
        let Ok(next) = apply_hint(game, hint) else {
            continue;
        };
        let rank = if options.look_ahead_moves > 0 && !next.state().is_victory_guaranteed() {
            lookahead_rank(&next, options, options.look_ahead_moves - 1)
        } else {
            (options.ranking)(&next)
        };
        // Strictly greater, so ties keep the first-seen (highest tier) hint.
        match &chosen {
            Some((best_rank, _)) if rank <= *best_rank => {}
            _ => chosen = Some((rank, next)),
        }
    }
    Ok(chosen.map(|(_, game)| game).unwrap_or_else(|| game.clone()))
}

fn considered<'a>(hints: &'a [MoveHint], levels: u8) -> impl Iterator<Item = &'a MoveHint> {
    let best_tier = hints.first().map(|h| h.confidence as usize).unwrap_or(0);
    hints
        .iter()
        .filter(move |hint| best_tier - (hint.confidence as usize) <= usize::from(levels))
}

fn lookahead_rank(game: &Game, options: &BotOptions, depth: u8) -> i64 {
    if game.is_won() {
        return (options.ranking)(game);
    }
    let hints = move_hints(game, HintMode::WithFullStock);
    if hints.is_empty() {
        return (options.ranking)(game);
    }
    let mut best = i64::MIN;
    for hint in considered(&hints, options.max_considered_confidence_levels) {
        let Ok(next) = apply_hint(game, hint) else {
            continue;
        };
        let rank = if depth > 0 && !next.state().is_victory_guaranteed() {
            lookahead_rank(&next, options, depth - 1)
        } else {
            (options.ranking)(&next)
        };
        if rank > best {
            best = rank;
        }
    }
    if best == i64::MIN {
        (options.ranking)(game)
    } else {
        best
    }
}

/// Executes a hint, first cycling the stock until the hint's target card
/// surfaces on the waste when the hint requires it.
pub fn apply_hint(game: &Game, hint: &MoveHint) -> Result<Game, GameError> {
    let mut current = game.clone();
    if matches!(hint.mv, Move::WasteToFoundation | Move::WasteToTableau { .. }) {
        // One full stock cycle is enough to surface any reachable card.
        let mut budget = 2 * (current.state().stock().len() + current.state().waste().len()) + 2;
        loop {
            let on_top = current
                .state()
                .waste()
                .top()
                .map(|card| card.is_same_card(&hint.card))
                .unwrap_or(false);
            if on_top {
                break;
            }
            if budget == 0 {
                return Err(GameError::IllegalMove(format!(
                    "card {} is not reachable from the stock",
                    hint.card.label()
                )));
            }
            budget -= 1;
            let mv = if current.state().stock().is_empty() {
                Move::Redeal
            } else {
                Move::DrawCards {
                    count: current.rules().drawn_cards,
                }
            };
            current = current.execute_move(mv)?;
        }
    }
    current.execute_move(hint.mv)
}
