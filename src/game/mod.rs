mod desk;
mod error;
#[allow(clippy::module_inception)]
mod game;
mod pile;
mod types;

pub use desk::{Desk, Tableau};
pub use error::GameError;
pub use game::{logical_now_ms, Game, GameTime, MoveRecord};
pub use pile::Pile;
pub use types::{
    card_from_deck_index, full_deck, rank_label, Card, GameRules, Move, Suit, RANK_ACE, RANK_KING,
    RANKS_PER_SUIT, SINGLE_DECK_SIZE,
};
