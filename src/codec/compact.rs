use crate::codec::error::CodecError;
use crate::game::{Card, Desk, Game, GameRules, GameTime, Move};

/// Move ticks are stored in whole granules of this many milliseconds.
pub const TIME_GRANULARITY_MS: u64 = 100;
/// Hard ceiling on representable deck copies.
pub const MAX_DECK_COUNT: usize = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactMove {
    pub mv: Move,
    /// Granules since the previous record (or game start for the first).
    pub tick_delta: i64,
}

/// The reduced projection of a game that the serializer works with: deal
/// order, rules, start time, and delta-compressed move records. Derived on
/// demand; never held long-term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactGame {
    pub deck: Vec<Card>,
    pub rules: GameRules,
    pub time: GameTime,
    pub history: Vec<CompactMove>,
    pub future: Vec<CompactMove>,
}

impl CompactGame {
    /// Projects a game down to its compact form, rejecting shapes the
    /// format cannot represent before any encoding happens.
    pub fn from_game(game: &Game) -> Result<CompactGame, CodecError> {
        let rules = game.rules();
        if rules.deck_count > MAX_DECK_COUNT {
            return Err(CodecError::UnsupportedGame(format!(
                "{} decks exceed the supported maximum of {MAX_DECK_COUNT}",
                rules.deck_count
            )));
        }
        rules
            .validate()
            .map_err(|err| CodecError::UnsupportedGame(err.to_string()))?;

        let records: Vec<(Move, u64)> = game
            .history()
            .iter()
            .chain(game.future().iter())
            .map(|record| (record.mv, record.tick))
            .collect();
        for (mv, _) in &records {
            if let Move::DrawCards { count } = mv {
                if *count != rules.drawn_cards {
                    return Err(CodecError::UnsupportedGame(format!(
                        "history draws {count} cards but the rules draw {}",
                        rules.drawn_cards
                    )));
                }
            }
        }

        let deck = recover_deck(game.initial_state());
        if deck.len() != rules.total_cards() {
            return Err(CodecError::InconsistentGame(format!(
                "initial state holds {} cards, rules require {}",
                deck.len(),
                rules.total_cards()
            )));
        }

        let time = game.time();
        let mut prev = time.started_tick as i64;
        let deltas: Vec<i64> = records
            .iter()
            .map(|(_, tick)| {
                let delta = *tick as i64 - prev;
                prev = *tick as i64;
                delta
            })
            .collect();
        let quantized = quantize_deltas(&deltas);

        let mut moves: Vec<CompactMove> = records
            .iter()
            .zip(quantized)
            .map(|((mv, _), tick_delta)| CompactMove {
                mv: *mv,
                tick_delta,
            })
            .collect();
        let future = moves.split_off(game.history().len());

        Ok(CompactGame {
            deck,
            rules,
            time,
            history: moves,
            future,
        })
    }

    /// Re-derives the full game: deal the deck, replay history and future,
    /// then undo the future back onto its stack.
    pub fn into_game(self) -> Result<Game, CodecError> {
        self.rules
            .validate()
            .map_err(|err| CodecError::InconsistentGame(err.to_string()))?;
        if self.deck.len() != self.rules.total_cards() {
            return Err(CodecError::InconsistentGame(format!(
                "deck holds {} cards, rules require {}",
                self.deck.len(),
                self.rules.total_cards()
            )));
        }

        let mut game = Game::from_deck_at(&self.deck, self.rules, self.time)
            .map_err(|err| CodecError::InconsistentGame(err.to_string()))?;

        let granule = TIME_GRANULARITY_MS as i64;
        let mut tick = self.time.started_tick as i64;
        let future_len = self.future.len();
        for record in self.history.iter().chain(self.future.iter()) {
            tick += record.tick_delta * granule;
            game = game
                .execute_move_at(record.mv, tick.max(0) as u64)
                .map_err(|err| {
                    CodecError::InconsistentGame(format!(
                        "replay of {:?} failed: {err}",
                        record.mv
                    ))
                })?;
        }
        for _ in 0..future_len {
            game = game.undo_last_move();
        }
        Ok(game)
    }
}

/// Reads the deal deck back out of an initial desk: stock bottom-to-top,
/// then each tableau pile reversed, orientation dropped. This is the exact
/// inverse of `Desk::deal`.
pub fn recover_deck(initial: &Desk) -> Vec<Card> {
    let mut deck: Vec<Card> = initial.stock().iter().map(|card| card.face_down()).collect();
    for pile in initial.tableau().piles() {
        deck.extend(pile.iter().rev().map(|card| card.face_down()));
    }
    deck
}

/// Divides each delta into whole granules, carrying the remainder forward
/// so cumulative timing never drifts by more than one granule; the leftover
/// folds into the final record.
fn quantize_deltas(deltas: &[i64]) -> Vec<i64> {
    let granule = TIME_GRANULARITY_MS as i64;
    let mut out = Vec::with_capacity(deltas.len());
    let mut carry = 0i64;
    for (index, delta) in deltas.iter().enumerate() {
        let total = delta + carry;
        if index + 1 == deltas.len() {
            out.push((total + granule / 2).div_euclid(granule));
        } else {
            out.push(total.div_euclid(granule));
            carry = total.rem_euclid(granule);
        }
    }
    out
}
