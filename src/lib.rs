//! Klondike solitaire rules and decision engine: immutable game state with
//! undo/redo, ranked move hints, a bounded-lookahead bot, a background
//! searcher for winnable deals, and a compact string codec for sharing
//! decks and whole games.

pub mod codec;
pub mod engine;
pub mod game;

pub use codec::{deserialize_deck, deserialize_game, serialize_deck, serialize_game, CodecError};
pub use engine::bot::{play_best_move, BotOptions};
pub use engine::generator::{
    GeneratorOptions, TaskScheduler, ThreadScheduler, WinnableGameHandle, WinnableGamesGenerator,
};
pub use engine::hints::{move_hints, Confidence, HintMode, MoveHint};
pub use game::{Card, Desk, Game, GameError, GameRules, Move, Pile, Suit};
