use crate::codec::compact::{CompactGame, CompactMove, MAX_DECK_COUNT};
use crate::codec::error::CodecError;
use crate::codec::symbols::{
    move_tag, verify_alphabets, Cursor, Writer, VERSION_DECK, VERSION_GAME,
};
use crate::codec::compact;
use crate::game::{
    card_from_deck_index, Card, Game, GameRules, GameTime, Move, Suit, SINGLE_DECK_SIZE,
};

/// Encodes a full game (deal, rules, timing, history and future) as a short
/// URL-safe string in the version-3 format.
pub fn serialize_game(game: &Game) -> Result<String, CodecError> {
    verify_alphabets();
    let compact = CompactGame::from_game(game)?;
    let mut w = Writer::new();
    w.push(VERSION_GAME);
    write_rules(&mut w, &compact.rules);
    w.push_uint(compact.time.started_at_ms);
    w.push_uint(compact.time.started_tick);
    write_deck(&mut w, &compact.deck, &compact.rules)?;
    write_records(&mut w, &compact.history, &compact.rules)?;
    write_records(&mut w, &compact.future, &compact.rules)?;
    Ok(w.finish())
}

/// Decodes a version-3 string; any other version tag is rejected.
pub fn deserialize_game(input: &str) -> Result<Game, CodecError> {
    verify_alphabets();
    let mut cur = Cursor::new(input);
    let version = cur.next()?;
    if version != VERSION_GAME {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let rules = read_rules(&mut cur)?;
    let time = GameTime {
        started_at_ms: cur.read_uint()?,
        started_tick: cur.read_uint()?,
    };
    let deck = read_deck(&mut cur, &rules)?;
    let history = read_records(&mut cur, &rules)?;
    let future = read_records(&mut cur, &rules)?;
    cur.expect_end()?;
    CompactGame {
        deck,
        rules,
        time,
        history,
        future,
    }
    .into_game()
}

/// Deck-only sharing: just the rules and the initial deal, version 1.
pub fn serialize_deck(game: &Game) -> Result<String, CodecError> {
    verify_alphabets();
    let rules = game.rules();
    if rules.deck_count > MAX_DECK_COUNT {
        return Err(CodecError::UnsupportedGame(format!(
            "{} decks exceed the supported maximum of {MAX_DECK_COUNT}",
            rules.deck_count
        )));
    }
    let deck = compact::recover_deck(game.initial_state());
    if deck.len() != rules.total_cards() {
        return Err(CodecError::InconsistentGame(format!(
            "initial state holds {} cards, rules require {}",
            deck.len(),
            rules.total_cards()
        )));
    }
    let mut w = Writer::new();
    w.push(VERSION_DECK);
    write_rules(&mut w, &rules);
    write_deck(&mut w, &deck, &rules)?;
    Ok(w.finish())
}

/// Decodes a version-1 string into a freshly dealt game.
pub fn deserialize_deck(input: &str) -> Result<Game, CodecError> {
    verify_alphabets();
    let mut cur = Cursor::new(input);
    let version = cur.next()?;
    if version != VERSION_DECK {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let rules = read_rules(&mut cur)?;
    let deck = read_deck(&mut cur, &rules)?;
    cur.expect_end()?;
    Game::from_deck(&deck, rules)
        .map_err(|err| CodecError::InconsistentGame(err.to_string()))
}

fn write_rules(w: &mut Writer, rules: &GameRules) {
    w.push_uint(u64::from(rules.drawn_cards));
    w.push(if rules.allow_non_king_to_empty { '1' } else { '0' });
    w.push_uint(rules.tableau_piles as u64);
    w.push_uint(rules.deck_count as u64);
}

fn read_rules(cur: &mut Cursor) -> Result<GameRules, CodecError> {
    let drawn = cur.read_uint()?;
    if drawn == 0 || drawn > u64::from(u8::MAX) {
        return Err(CodecError::InconsistentGame(format!(
            "draw count {drawn} is out of range"
        )));
    }
    let allow_non_king_to_empty = cur.read_flag()?;
    let tableau_piles = cur.read_uint()? as usize;
    let deck_count = cur.read_uint()? as usize;
    if deck_count > MAX_DECK_COUNT {
        return Err(CodecError::UnsupportedGame(format!(
            "{deck_count} decks exceed the supported maximum of {MAX_DECK_COUNT}"
        )));
    }
    let rules = GameRules {
        drawn_cards: drawn as u8,
        deck_count,
        tableau_piles,
        allow_non_king_to_empty,
    };
    rules
        .validate()
        .map_err(|err| CodecError::InconsistentGame(err.to_string()))?;
    Ok(rules)
}

/// The final card is omitted: it is always the one deck position whose
/// suit/rank count falls short.
fn write_deck(w: &mut Writer, deck: &[Card], rules: &GameRules) -> Result<(), CodecError> {
    for card in &deck[..deck.len() - 1] {
        if rules.deck_count == 1 {
            w.push_card_symbol(card.deck_index())?;
        } else {
            w.push_uint(card.deck_index() as u64);
        }
    }
    Ok(())
}

fn read_deck(cur: &mut Cursor, rules: &GameRules) -> Result<Vec<Card>, CodecError> {
    let total = rules.total_cards();
    let mut counts = [0usize; SINGLE_DECK_SIZE];
    let mut deck = Vec::with_capacity(total);
    for deal_order in 0..total - 1 {
        let index = if rules.deck_count == 1 {
            cur.read_card_symbol()?
        } else {
            let raw = cur.read_uint()? as usize;
            if raw >= SINGLE_DECK_SIZE {
                return Err(CodecError::InconsistentGame(format!(
                    "card index {raw} is out of range"
                )));
            }
            raw
        };
        counts[index] += 1;
        if counts[index] > rules.deck_count {
            return Err(CodecError::InconsistentGame(format!(
                "card index {index} appears more than {} times",
                rules.deck_count
            )));
        }
        let card = card_from_deck_index(index, deal_order as u16).ok_or_else(|| {
            CodecError::InconsistentGame(format!("card index {index} is out of range"))
        })?;
        deck.push(card);
    }
    let missing = counts
        .iter()
        .position(|&count| count < rules.deck_count)
        .ok_or_else(|| {
            CodecError::InconsistentGame("could not infer the omitted final card".to_string())
        })?;
    let last = card_from_deck_index(missing, (total - 1) as u16).ok_or_else(|| {
        CodecError::InconsistentGame(format!("card index {missing} is out of range"))
    })?;
    deck.push(last);
    Ok(deck)
}

fn write_records(
    w: &mut Writer,
    records: &[CompactMove],
    rules: &GameRules,
) -> Result<(), CodecError> {
    // Single-deck games fit every pile index in one digit and every in-pile
    // position in one card symbol; larger games use delimited integers.
    let fixed = rules.deck_count == 1;
    w.push_uint(records.len() as u64);
    for record in records {
        w.push(move_tag(&record.mv));
        match record.mv {
            Move::DrawCards { .. } | Move::Redeal | Move::WasteToFoundation => {}
            Move::WasteToTableau { pile }
            | Move::TableauToFoundation { pile }
            | Move::RevealTableauCard { pile } => {
                write_index(w, pile, fixed);
            }
            Move::FoundationToTableau { suit, pile } => {
                write_index(w, suit.foundation_index(), fixed);
                write_index(w, pile, fixed);
            }
            Move::TableauToTableau {
                src,
                card_index,
                dst,
            } => {
                write_index(w, src, fixed);
                write_position(w, card_index, fixed)?;
                write_index(w, dst, fixed);
            }
        }
        w.push_int(record.tick_delta);
    }
    Ok(())
}

fn read_records(cur: &mut Cursor, rules: &GameRules) -> Result<Vec<CompactMove>, CodecError> {
    let fixed = rules.deck_count == 1;
    let count = cur.read_uint()? as usize;
    let mut records = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        let tag = cur.next()?;
        let mv = match tag {
            'D' => Move::DrawCards {
                count: rules.drawn_cards,
            },
            'R' => Move::Redeal,
            'F' => Move::WasteToFoundation,
            'W' => Move::WasteToTableau {
                pile: read_index(cur, fixed)?,
            },
            'T' => Move::TableauToFoundation {
                pile: read_index(cur, fixed)?,
            },
            'V' => Move::RevealTableauCard {
                pile: read_index(cur, fixed)?,
            },
            'G' => {
                let suit_index = read_index(cur, fixed)?;
                let suit = Suit::from_index(suit_index).ok_or_else(|| {
                    CodecError::InconsistentGame(format!(
                        "suit index {suit_index} is out of range"
                    ))
                })?;
                Move::FoundationToTableau {
                    suit,
                    pile: read_index(cur, fixed)?,
                }
            }
            'M' => Move::TableauToTableau {
                src: read_index(cur, fixed)?,
                card_index: read_position(cur, fixed)?,
                dst: read_index(cur, fixed)?,
            },
            symbol => {
                return Err(CodecError::UnexpectedSymbol {
                    symbol,
                    position: cur.position() - 1,
                    expected: "a move tag",
                })
            }
        };
        let tick_delta = cur.read_int()?;
        records.push(CompactMove { mv, tick_delta });
    }
    Ok(records)
}

fn write_index(w: &mut Writer, value: usize, fixed: bool) {
    if fixed {
        w.push_digit(value);
    } else {
        w.push_uint(value as u64);
    }
}

fn read_index(cur: &mut Cursor, fixed: bool) -> Result<usize, CodecError> {
    if fixed {
        cur.read_digit()
    } else {
        Ok(cur.read_uint()? as usize)
    }
}

fn write_position(w: &mut Writer, value: usize, fixed: bool) -> Result<(), CodecError> {
    if fixed {
        // In-pile positions never reach the deck size in a single-deck game.
        w.push_card_symbol(value)
    } else {
        w.push_uint(value as u64);
        Ok(())
    }
}

fn read_position(cur: &mut Cursor, fixed: bool) -> Result<usize, CodecError> {
    if fixed {
        cur.read_card_symbol()
    } else {
        Ok(cur.read_uint()? as usize)
    }
}
