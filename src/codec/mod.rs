mod compact;
mod error;
mod serializer;
mod symbols;

pub use compact::{CompactGame, CompactMove, MAX_DECK_COUNT, TIME_GRANULARITY_MS};
pub use error::CodecError;
pub use serializer::{deserialize_deck, deserialize_game, serialize_deck, serialize_game};

#[cfg(test)]
mod tests;
