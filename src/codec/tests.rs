use super::symbols::{verify_alphabets, Cursor, Writer, CARD_SYMBOLS, MOVE_TAGS};
use super::{
    deserialize_deck, deserialize_game, serialize_deck, serialize_game, CodecError,
    TIME_GRANULARITY_MS,
};
use crate::game::{Game, GameRules, Move, SINGLE_DECK_SIZE};

fn draw_one() -> Move {
    Move::DrawCards { count: 1 }
}

#[test]
fn symbol_alphabets_are_consistent() {
    verify_alphabets();
    assert_eq!(CARD_SYMBOLS.len(), SINGLE_DECK_SIZE);
    assert_eq!(MOVE_TAGS.len(), 8);
}

#[test]
fn integers_round_trip_through_the_writer() {
    let mut w = Writer::new();
    w.push_uint(0);
    w.push_uint(12_345);
    w.push_int(-42);
    w.push_int(7);
    let encoded = w.finish();

    let mut cur = Cursor::new(&encoded);
    assert_eq!(cur.read_uint().unwrap(), 0);
    assert_eq!(cur.read_uint().unwrap(), 12_345);
    assert_eq!(cur.read_int().unwrap(), -42);
    assert_eq!(cur.read_int().unwrap(), 7);
    assert!(cur.expect_end().is_ok());
}

#[test]
fn oversized_magnitudes_do_not_wrap_into_negative_deltas() {
    // u64::MAX parses as an unsigned integer but has no signed counterpart.
    let encoded = "18446744073709551615~";
    assert_eq!(Cursor::new(encoded).read_uint().unwrap(), u64::MAX);
    assert!(matches!(
        Cursor::new(encoded).read_int(),
        Err(CodecError::UnexpectedSymbol { symbol: '~', .. })
    ));

    let above_max = format!("{}~", i64::MAX as u64 + 1);
    assert!(Cursor::new(&above_max).read_int().is_err());
    let at_max = format!("{}~", i64::MAX);
    assert_eq!(Cursor::new(&at_max).read_int().unwrap(), i64::MAX);
}

#[test]
fn a_bare_terminator_is_not_an_integer() {
    let mut cur = Cursor::new("~");
    assert!(matches!(
        cur.read_uint(),
        Err(CodecError::UnexpectedSymbol { position: 0, .. })
    ));
}

#[test]
fn deck_strings_round_trip() {
    let game = Game::new_with_seed(GameRules::klondike(), 3).unwrap();
    let encoded = serialize_deck(&game).unwrap();
    assert!(encoded.starts_with('1'));

    let decoded = deserialize_deck(&encoded).unwrap();
    assert_eq!(decoded.rules(), game.rules());
    assert_eq!(decoded.state(), game.state());
    assert_eq!(decoded.move_count(), 0);
}

#[test]
fn a_fresh_game_round_trips_exactly() {
    let game = Game::new_with_seed(GameRules::klondike(), 5).unwrap();
    let encoded = serialize_game(&game).unwrap();
    assert!(encoded.starts_with('3'));
    assert_eq!(deserialize_game(&encoded).unwrap(), game);
}

#[test]
fn a_played_game_round_trips_exactly_on_granule_ticks() {
    let dealt = Game::new_with_seed(GameRules::klondike(), 5).unwrap();
    let t = dealt.time().started_tick;
    let game = dealt
        .execute_move_at(draw_one(), t + 100)
        .unwrap()
        .execute_move_at(draw_one(), t + 200)
        .unwrap()
        .execute_move_at(draw_one(), t + 300)
        .unwrap()
        .undo_last_move();
    assert_eq!(game.future().len(), 1);

    let encoded = serialize_game(&game).unwrap();
    let decoded = deserialize_game(&encoded).unwrap();
    assert_eq!(decoded, game);
}

#[test]
fn odd_ticks_drift_less_than_one_granule() {
    let dealt = Game::new_with_seed(GameRules::klondike(), 5).unwrap();
    let t = dealt.time().started_tick;
    let game = dealt
        .execute_move_at(draw_one(), t + 130)
        .unwrap()
        .execute_move_at(draw_one(), t + 220)
        .unwrap();

    let decoded = deserialize_game(&serialize_game(&game).unwrap()).unwrap();
    assert_eq!(decoded.history().len(), game.history().len());
    for (decoded, original) in decoded.history().iter().zip(game.history()) {
        assert_eq!(decoded.mv, original.mv);
        let drift = (decoded.tick as i64 - original.tick as i64).unsigned_abs();
        assert!(drift < TIME_GRANULARITY_MS);
    }
    // The final record absorbs the carry, so total duration stays within
    // half a granule.
    let last_drift = (decoded.history().last().unwrap().tick as i64
        - game.history().last().unwrap().tick as i64)
        .unsigned_abs();
    assert!(last_drift <= TIME_GRANULARITY_MS / 2);
}

#[test]
fn the_formats_reject_each_other() {
    let game = Game::new_with_seed(GameRules::klondike(), 8).unwrap();
    let deck = serialize_deck(&game).unwrap();
    let full = serialize_game(&game).unwrap();

    assert!(matches!(
        deserialize_game(&deck),
        Err(CodecError::UnsupportedVersion('1'))
    ));
    assert!(matches!(
        deserialize_deck(&full),
        Err(CodecError::UnsupportedVersion('3'))
    ));
}

#[test]
fn unknown_versions_and_empty_input_are_rejected() {
    assert!(matches!(
        deserialize_game("9~"),
        Err(CodecError::UnsupportedVersion('9'))
    ));
    assert!(matches!(
        deserialize_game(""),
        Err(CodecError::UnexpectedEnd { position: 0 })
    ));
    assert!(matches!(
        deserialize_deck(""),
        Err(CodecError::UnexpectedEnd { position: 0 })
    ));
}

#[test]
fn stray_symbols_are_reported_with_their_position() {
    assert!(matches!(
        deserialize_game("3x"),
        Err(CodecError::UnexpectedSymbol {
            symbol: 'x',
            position: 1,
            ..
        })
    ));
}

#[test]
fn truncated_and_padded_strings_are_rejected() {
    let game = Game::new_with_seed(GameRules::klondike(), 8).unwrap();
    let encoded = serialize_game(&game).unwrap();

    assert!(deserialize_game(&encoded[..encoded.len() - 1]).is_err());

    let padded = format!("{encoded}Z");
    assert!(matches!(
        deserialize_game(&padded),
        Err(CodecError::UnexpectedSymbol { symbol: 'Z', .. })
    ));
}

#[test]
fn draws_that_disagree_with_the_rules_are_unsupported() {
    let game = Game::new_with_seed(GameRules::klondike(), 8)
        .unwrap()
        .execute_move(Move::DrawCards { count: 3 })
        .unwrap();
    assert!(matches!(
        serialize_game(&game),
        Err(CodecError::UnsupportedGame(_))
    ));
}

#[test]
fn oversized_deck_counts_are_unsupported() {
    let rules = GameRules {
        deck_count: 36,
        ..GameRules::klondike()
    };
    let game = Game::new_with_seed(rules, 8).unwrap();
    assert!(matches!(
        serialize_game(&game),
        Err(CodecError::UnsupportedGame(_))
    ));
    assert!(matches!(
        serialize_deck(&game),
        Err(CodecError::UnsupportedGame(_))
    ));
}

#[test]
fn multi_deck_games_round_trip() {
    let rules = GameRules {
        drawn_cards: 3,
        deck_count: 2,
        ..GameRules::klondike()
    };
    let dealt = Game::new_with_seed(rules, 13).unwrap();
    let t = dealt.time().started_tick;
    let game = dealt
        .execute_move_at(Move::DrawCards { count: 3 }, t + 100)
        .unwrap()
        .execute_move_at(Move::DrawCards { count: 3 }, t + 200)
        .unwrap()
        .undo_last_move();

    let decoded = deserialize_game(&serialize_game(&game).unwrap()).unwrap();
    assert_eq!(decoded, game);

    let deck = serialize_deck(&game).unwrap();
    let fresh = deserialize_deck(&deck).unwrap();
    assert_eq!(fresh.state(), game.initial_state());
}
