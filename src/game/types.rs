use crate::game::error::GameError;

pub const RANK_ACE: u8 = 1;
pub const RANK_KING: u8 = 13;
pub const RANKS_PER_SUIT: usize = 13;
pub const SINGLE_DECK_SIZE: usize = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn is_red(self) -> bool {
        matches!(self, Suit::Diamonds | Suit::Hearts)
    }

    pub fn short(self) -> &'static str {
        match self {
            Suit::Clubs => "C",
            Suit::Diamonds => "D",
            Suit::Hearts => "H",
            Suit::Spades => "S",
        }
    }

    pub fn foundation_index(self) -> usize {
        match self {
            Suit::Clubs => 0,
            Suit::Diamonds => 1,
            Suit::Hearts => 2,
            Suit::Spades => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Suit> {
        Suit::ALL.get(index).copied()
    }
}

pub fn rank_label(rank: u8) -> &'static str {
    match rank {
        1 => "A",
        2 => "2",
        3 => "3",
        4 => "4",
        5 => "5",
        6 => "6",
        7 => "7",
        8 => "8",
        9 => "9",
        10 => "10",
        11 => "J",
        12 => "Q",
        13 => "K",
        _ => "?",
    }
}

/// A playing card. `deal_order` is the card's position in the deal deck,
/// assigned once when the game is dealt; it distinguishes equal suit/rank
/// pairs when more than one deck is in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub suit: Suit,
    pub rank: u8,
    pub face_up: bool,
    pub deal_order: u16,
}

impl Card {
    pub fn label(&self) -> String {
        format!("{}{}", rank_label(self.rank), self.suit.short())
    }

    pub fn color_red(&self) -> bool {
        self.suit.is_red()
    }

    /// Same physical card, regardless of orientation.
    pub fn is_same_card(&self, other: &Card) -> bool {
        self.suit == other.suit && self.rank == other.rank && self.deal_order == other.deal_order
    }

    /// Position of this card's suit/rank pair within one canonical deck.
    pub fn deck_index(&self) -> usize {
        self.suit.foundation_index() * RANKS_PER_SUIT + usize::from(self.rank - 1)
    }

    pub fn face_up(self) -> Card {
        Card {
            face_up: true,
            ..self
        }
    }

    pub fn face_down(self) -> Card {
        Card {
            face_up: false,
            ..self
        }
    }
}

pub fn card_from_deck_index(index: usize, deal_order: u16) -> Option<Card> {
    let suit = Suit::from_index(index / RANKS_PER_SUIT)?;
    let rank = (index % RANKS_PER_SUIT) as u8 + 1;
    Some(Card {
        suit,
        rank,
        face_up: false,
        deal_order,
    })
}

/// Canonically ordered cards for `deck_count` decks, all face down.
/// Deal order is assigned when the cards are actually dealt.
pub fn full_deck(deck_count: usize) -> Vec<Card> {
    let mut deck = Vec::with_capacity(deck_count * SINGLE_DECK_SIZE);
    for _ in 0..deck_count {
        for suit in Suit::ALL {
            for rank in 1..=RANK_KING {
                deck.push(Card {
                    suit,
                    rank,
                    face_up: false,
                    deal_order: 0,
                });
            }
        }
    }
    deck
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameRules {
    pub drawn_cards: u8,
    pub deck_count: usize,
    pub tableau_piles: usize,
    pub allow_non_king_to_empty: bool,
}

impl GameRules {
    pub fn klondike() -> Self {
        GameRules {
            drawn_cards: 1,
            deck_count: 1,
            tableau_piles: 7,
            allow_non_king_to_empty: false,
        }
    }

    pub fn total_cards(&self) -> usize {
        self.deck_count * SINGLE_DECK_SIZE
    }

    pub fn tableau_cards(&self) -> usize {
        self.tableau_piles * (self.tableau_piles + 1) / 2
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.drawn_cards == 0 {
            return Err(GameError::InvalidRules(
                "drawn_cards must be positive".to_string(),
            ));
        }
        if self.deck_count == 0 {
            return Err(GameError::InvalidRules(
                "deck_count must be positive".to_string(),
            ));
        }
        if self.tableau_piles == 0 {
            return Err(GameError::InvalidRules(
                "tableau_piles must be positive".to_string(),
            ));
        }
        if self.tableau_cards() + usize::from(self.drawn_cards) > self.total_cards() {
            return Err(GameError::InvalidRules(format!(
                "{} tableau piles and a draw of {} do not fit a {}-card deck",
                self.tableau_piles,
                self.drawn_cards,
                self.total_cards()
            )));
        }
        Ok(())
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self::klondike()
    }
}

/// Every action a player or the bot can take. Consumers match exhaustively;
/// the set is closed by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    DrawCards { count: u8 },
    Redeal,
    WasteToFoundation,
    WasteToTableau { pile: usize },
    TableauToFoundation { pile: usize },
    RevealTableauCard { pile: usize },
    FoundationToTableau { suit: Suit, pile: usize },
    TableauToTableau { src: usize, card_index: usize, dst: usize },
}
