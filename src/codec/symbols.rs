use std::collections::HashSet;
use std::sync::LazyLock;

use crate::codec::error::CodecError;
use crate::game::{Move, SINGLE_DECK_SIZE};

pub const VERSION_DECK: char = '1';
pub const VERSION_GAME: char = '3';

pub const RADIX: u64 = 10;
pub const NEGATIVE_MARKER: char = '-';
/// Delimits variable-length integer fragments.
pub const TERMINATOR: char = '~';

/// One symbol per single-deck position; the alphabet length must equal the
/// deck size so a card identity is always a single symbol.
pub const CARD_SYMBOLS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub const MOVE_TAGS: [char; 8] = ['D', 'R', 'F', 'W', 'T', 'V', 'G', 'M'];

pub fn move_tag(mv: &Move) -> char {
    match mv {
        Move::DrawCards { .. } => 'D',
        Move::Redeal => 'R',
        Move::WasteToFoundation => 'F',
        Move::WasteToTableau { .. } => 'W',
        Move::TableauToFoundation { .. } => 'T',
        Move::RevealTableauCard { .. } => 'V',
        Move::FoundationToTableau { .. } => 'G',
        Move::TableauToTableau { .. } => 'M',
    }
}

static ALPHABET_CHECK: LazyLock<()> = LazyLock::new(|| {
    assert_eq!(
        CARD_SYMBOLS.len(),
        SINGLE_DECK_SIZE,
        "card alphabet length must equal the deck size"
    );
    let mut tags = HashSet::new();
    for tag in MOVE_TAGS {
        assert!(tags.insert(tag), "duplicate move tag '{tag}'");
        assert!(
            !tag.is_ascii_digit(),
            "move tag '{tag}' collides with the digit alphabet"
        );
        assert_ne!(
            tag, NEGATIVE_MARKER,
            "move tag '{tag}' collides with the sign marker"
        );
        assert_ne!(
            tag, TERMINATOR,
            "move tag '{tag}' collides with the terminator"
        );
    }
    assert!(!CARD_SYMBOLS.contains(TERMINATOR));
    assert!(!CARD_SYMBOLS.contains(NEGATIVE_MARKER));
});

/// Cross-checks the symbol sets once; panics immediately if the encoding
/// invariants are violated.
pub fn verify_alphabets() {
    LazyLock::force(&ALPHABET_CHECK);
}

pub fn card_symbol(index: usize) -> Result<char, CodecError> {
    CARD_SYMBOLS
        .as_bytes()
        .get(index)
        .map(|b| *b as char)
        .ok_or_else(|| {
            CodecError::UnsupportedGame(format!("card index {index} has no single-deck symbol"))
        })
}

fn card_symbol_index(symbol: char) -> Option<usize> {
    match symbol {
        'A'..='Z' => Some(symbol as usize - 'A' as usize),
        'a'..='z' => Some(26 + symbol as usize - 'a' as usize),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct Writer {
    out: String,
}

impl Writer {
    pub fn new() -> Self {
        Writer { out: String::new() }
    }

    pub fn push(&mut self, symbol: char) {
        self.out.push(symbol);
    }

    /// Radix digits followed by the terminator.
    pub fn push_uint(&mut self, value: u64) {
        self.out.push_str(&value.to_string());
        self.out.push(TERMINATOR);
    }

    /// Sign marker, radix digits, terminator.
    pub fn push_int(&mut self, value: i64) {
        if value < 0 {
            self.out.push(NEGATIVE_MARKER);
        }
        self.push_uint(value.unsigned_abs());
    }

    /// Fixed-width single digit; callers guarantee `value < 10`.
    pub fn push_digit(&mut self, value: usize) {
        debug_assert!(value < RADIX as usize);
        self.out.push((b'0' + value as u8) as char);
    }

    pub fn push_card_symbol(&mut self, index: usize) -> Result<(), CodecError> {
        self.out.push(card_symbol(index)?);
        Ok(())
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[derive(Debug)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Cursor {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn next(&mut self) -> Result<char, CodecError> {
        let byte = self
            .bytes
            .get(self.pos)
            .copied()
            .ok_or(CodecError::UnexpectedEnd { position: self.pos })?;
        self.pos += 1;
        Ok(byte as char)
    }

    fn unexpected(&self, symbol: char, expected: &'static str) -> CodecError {
        CodecError::UnexpectedSymbol {
            symbol,
            position: self.pos - 1,
            expected,
        }
    }

    pub fn read_uint(&mut self) -> Result<u64, CodecError> {
        let mut value: u64 = 0;
        let mut digits = 0;
        loop {
            let symbol = self.next()?;
            if symbol == TERMINATOR {
                if digits == 0 {
                    return Err(self.unexpected(symbol, "a digit"));
                }
                return Ok(value);
            }
            let digit = symbol
                .to_digit(RADIX as u32)
                .ok_or_else(|| self.unexpected(symbol, "a digit or terminator"))?;
            value = value
                .checked_mul(RADIX)
                .and_then(|v| v.checked_add(u64::from(digit)))
                .ok_or_else(|| self.unexpected(symbol, "a smaller integer"))?;
            digits += 1;
        }
    }

    pub fn read_int(&mut self) -> Result<i64, CodecError> {
        let negative = match self.peek() {
            Some(NEGATIVE_MARKER) => {
                self.pos += 1;
                true
            }
            _ => false,
        };
        let magnitude = i64::try_from(self.read_uint()?)
            .map_err(|_| self.unexpected(TERMINATOR, "a smaller integer"))?;
        Ok(if negative { -magnitude } else { magnitude })
    }

    pub fn read_digit(&mut self) -> Result<usize, CodecError> {
        let symbol = self.next()?;
        symbol
            .to_digit(RADIX as u32)
            .map(|d| d as usize)
            .ok_or_else(|| self.unexpected(symbol, "a digit"))
    }

    pub fn read_card_symbol(&mut self) -> Result<usize, CodecError> {
        let symbol = self.next()?;
        card_symbol_index(symbol).ok_or_else(|| self.unexpected(symbol, "a card symbol"))
    }

    pub fn read_flag(&mut self) -> Result<bool, CodecError> {
        match self.next()? {
            '0' => Ok(false),
            '1' => Ok(true),
            symbol => Err(self.unexpected(symbol, "'0' or '1'")),
        }
    }

    fn peek(&self) -> Option<char> {
        self.bytes.get(self.pos).map(|b| *b as char)
    }

    pub fn expect_end(&mut self) -> Result<(), CodecError> {
        match self.peek() {
            None => Ok(()),
            Some(symbol) => {
                self.pos += 1;
                Err(self.unexpected(symbol, "end of input"))
            }
        }
    }
}
