use std::collections::VecDeque;
use std::sync::LazyLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::desk::Desk;
use crate::game::error::GameError;
use crate::game::pile::Pile;
use crate::game::types::{full_deck, Card, GameRules, Move};

static PROCESS_CLOCK: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Monotonic millisecond counter, independent of wall-clock adjustments.
/// Move records are stamped with this so duration math survives replay.
pub fn logical_now_ms() -> u64 {
    PROCESS_CLOCK.elapsed().as_millis() as u64
}

fn epoch_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameTime {
    pub started_at_ms: u64,
    pub started_tick: u64,
}

impl GameTime {
    fn now() -> Self {
        GameTime {
            started_at_ms: epoch_now_ms(),
            started_tick: logical_now_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub prior: Desk,
    pub mv: Move,
    pub tick: u64,
}

/// A desk plus rules, timestamps, and the move history needed for undo and
/// redo. Every operation returns a new game; prior snapshots are never
/// touched after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub(crate) state: Desk,
    pub(crate) rules: GameRules,
    pub(crate) history: Vec<MoveRecord>,
    pub(crate) future: VecDeque<MoveRecord>,
    pub(crate) time: GameTime,
}

impl Game {
    pub fn new_shuffled(rules: GameRules) -> Result<Game, GameError> {
        let mut rng = rand::thread_rng();
        Self::new_with_seed(rules, rng.gen())
    }

    pub fn new_with_seed(rules: GameRules, seed: u64) -> Result<Game, GameError> {
        rules.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let deck = Pile::from_cards(full_deck(rules.deck_count)).shuffled(&mut rng);
        Self::from_deck(deck.cards(), rules)
    }

    pub fn from_deck(deck: &[Card], rules: GameRules) -> Result<Game, GameError> {
        Self::from_deck_at(deck, rules, GameTime::now())
    }

    pub(crate) fn from_deck_at(
        deck: &[Card],
        rules: GameRules,
        time: GameTime,
    ) -> Result<Game, GameError> {
        let state = Desk::deal(deck, &rules)?;
        Ok(Game {
            state,
            rules,
            history: Vec::new(),
            future: VecDeque::new(),
            time,
        })
    }

    pub fn state(&self) -> &Desk {
        &self.state
    }

    pub fn rules(&self) -> GameRules {
        self.rules
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn future(&self) -> &VecDeque<MoveRecord> {
        &self.future
    }

    pub fn time(&self) -> GameTime {
        self.time
    }

    /// The desk as it was dealt.
    pub fn initial_state(&self) -> &Desk {
        self.history
            .first()
            .map(|record| &record.prior)
            .unwrap_or(&self.state)
    }

    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    pub fn is_won(&self) -> bool {
        self.state.is_victory()
    }

    pub fn execute_move(&self, mv: Move) -> Result<Game, GameError> {
        self.execute_move_at(mv, logical_now_ms())
    }

    /// Applies the move stamped with an explicit tick; replay and tests use
    /// this to stay deterministic.
    pub fn execute_move_at(&self, mv: Move, tick: u64) -> Result<Game, GameError> {
        let next = self.state.apply(mv, &self.rules)?;
        let mut history = self.history.clone();
        history.push(MoveRecord {
            prior: self.state.clone(),
            mv,
            tick,
        });
        Ok(Game {
            state: next,
            rules: self.rules,
            history,
            future: VecDeque::new(),
            time: self.time,
        })
    }

    /// Identity on an empty history.
    pub fn undo_last_move(&self) -> Game {
        let mut game = self.clone();
        if let Some(record) = game.history.pop() {
            game.state = record.prior.clone();
            game.future.push_front(record);
        }
        game
    }

    /// Identity on an empty future. The resulting state comes from the next
    /// future record's prior snapshot, or by re-executing the move when this
    /// was the only undone entry.
    pub fn redo_next_move(&self) -> Game {
        let mut game = self.clone();
        let Some(record) = game.future.pop_front() else {
            return game;
        };
        let next_state = match game.future.front() {
            Some(next) => next.prior.clone(),
            None => match game.state.apply(record.mv, &game.rules) {
                Ok(state) => state,
                Err(_) => {
                    game.future.push_front(record);
                    return game;
                }
            },
        };
        game.history.push(record);
        game.state = next_state;
        game
    }

    /// Back to the initial deal with empty history and restarted clocks.
    pub fn reset(&self) -> Game {
        Game {
            state: self.initial_state().clone(),
            rules: self.rules,
            history: Vec::new(),
            future: VecDeque::new(),
            time: GameTime::now(),
        }
    }
}
