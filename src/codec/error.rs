use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unsupported format version '{0}'")]
    UnsupportedVersion(char),
    #[error("unexpected symbol '{symbol}' at position {position}, expected {expected}")]
    UnexpectedSymbol {
        symbol: char,
        position: usize,
        expected: &'static str,
    },
    #[error("unexpected end of input at position {position}")]
    UnexpectedEnd { position: usize },
    #[error("unsupported game: {0}")]
    UnsupportedGame(String),
    #[error("inconsistent encoded game: {0}")]
    InconsistentGame(String),
}
