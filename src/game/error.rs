use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid rules: {0}")]
    InvalidRules(String),
    #[error("invalid bot options: {0}")]
    InvalidBotOptions(String),
    #[error("insufficient cards: requested {requested}, pile holds {available}")]
    InsufficientCards { requested: usize, available: usize },
    #[error("pile index {index} out of range ({piles} piles)")]
    PileOutOfRange { index: usize, piles: usize },
    #[error("illegal move: {0}")]
    IllegalMove(String),
}
