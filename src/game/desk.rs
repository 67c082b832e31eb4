use crate::game::error::GameError;
use crate::game::pile::Pile;
use crate::game::types::{Card, GameRules, Move, Suit, RANK_ACE, RANK_KING};

/// The fanned playing area: a fixed number of piles mixing face-up and
/// face-down cards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tableau {
    pub(crate) piles: Vec<Pile>,
}

impl Tableau {
    pub fn new(piles: Vec<Pile>) -> Self {
        Tableau { piles }
    }

    pub fn pile_count(&self) -> usize {
        self.piles.len()
    }

    pub fn piles(&self) -> &[Pile] {
        &self.piles
    }

    pub fn pile(&self, index: usize) -> Result<&Pile, GameError> {
        self.piles.get(index).ok_or(GameError::PileOutOfRange {
            index,
            piles: self.piles.len(),
        })
    }

    fn with_pile(&self, index: usize, pile: Pile) -> Tableau {
        let mut piles = self.piles.clone();
        piles[index] = pile;
        Tableau { piles }
    }

    pub fn face_up_count(&self) -> usize {
        self.piles
            .iter()
            .flat_map(Pile::iter)
            .filter(|card| card.face_up)
            .count()
    }

    pub fn hidden_count(&self) -> usize {
        self.piles
            .iter()
            .flat_map(Pile::iter)
            .filter(|card| !card.face_up)
            .count()
    }

    pub fn is_all_face_up(&self) -> bool {
        self.hidden_count() == 0
    }

    /// Locates the pile and in-pile index holding this exact card.
    pub fn find_card(&self, card: &Card) -> Option<(usize, usize)> {
        for (pile_index, pile) in self.piles.iter().enumerate() {
            if let Some(card_index) = pile.iter().position(|c| c.is_same_card(card)) {
                return Some((pile_index, card_index));
            }
        }
        None
    }
}

/// Full table state: stock, waste, one foundation pile per suit, and the
/// tableau. Every move operation is a pure function returning a new desk, or
/// a descriptive error when the move is illegal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Desk {
    pub(crate) stock: Pile,
    pub(crate) waste: Pile,
    pub(crate) foundations: [Pile; 4],
    pub(crate) tableau: Tableau,
}

impl Desk {
    /// Deals a deck: the leading cards become the stock, the rest fill the
    /// tableau triangularly with only each pile's top card face up. The
    /// layout is the exact inverse of the codec's deck recovery, so deal
    /// order survives a serialize/deserialize round trip.
    pub fn deal(deck: &[Card], rules: &GameRules) -> Result<Desk, GameError> {
        rules.validate()?;
        if deck.len() != rules.total_cards() {
            return Err(GameError::InvalidRules(format!(
                "deck has {} cards, rules require {}",
                deck.len(),
                rules.total_cards()
            )));
        }

        let cards: Vec<Card> = deck
            .iter()
            .enumerate()
            .map(|(i, card)| Card {
                deal_order: i as u16,
                face_up: false,
                ..*card
            })
            .collect();

        let stock_len = cards.len() - rules.tableau_cards();
        let stock = Pile::from_cards(cards[..stock_len].to_vec());

        let mut piles = Vec::with_capacity(rules.tableau_piles);
        let mut cursor = stock_len;
        for col in 0..rules.tableau_piles {
            let take = col + 1;
            let mut segment = cards[cursor..cursor + take].to_vec();
            cursor += take;
            segment.reverse();
            if let Some(top) = segment.last_mut() {
                top.face_up = true;
            }
            piles.push(Pile::from_cards(segment));
        }

        Ok(Desk {
            stock,
            waste: Pile::new(),
            foundations: std::array::from_fn(|_| Pile::new()),
            tableau: Tableau::new(piles),
        })
    }

    pub fn stock(&self) -> &Pile {
        &self.stock
    }

    pub fn waste(&self) -> &Pile {
        &self.waste
    }

    pub fn foundation(&self, suit: Suit) -> &Pile {
        &self.foundations[suit.foundation_index()]
    }

    pub fn foundations(&self) -> &[Pile; 4] {
        &self.foundations
    }

    pub fn tableau(&self) -> &Tableau {
        &self.tableau
    }

    pub fn foundation_top_rank(&self, suit: Suit) -> u8 {
        self.foundation(suit).top().map(|c| c.rank).unwrap_or(0)
    }

    pub fn foundation_count(&self) -> usize {
        self.foundations.iter().map(Pile::len).sum()
    }

    pub fn total_cards(&self) -> usize {
        self.stock.len()
            + self.waste.len()
            + self.foundation_count()
            + self.tableau.piles().iter().map(Pile::len).sum::<usize>()
    }

    /// Flips up to `count` cards from the stock onto the waste. Fails on an
    /// empty stock (redeal instead); draws fewer when the stock runs short.
    pub fn draw_cards(&self, count: u8) -> Result<Desk, GameError> {
        if count == 0 {
            return Err(GameError::IllegalMove("cannot draw zero cards".to_string()));
        }
        if self.stock.is_empty() {
            return Err(GameError::IllegalMove(
                "stock is empty, redeal instead".to_string(),
            ));
        }
        let take = usize::from(count).min(self.stock.len());
        let (stock, drawn) = self.stock.draw(take)?;
        let mut waste = self.waste.clone();
        for card in drawn {
            waste = waste.place_card_on_top(card.face_up());
        }
        Ok(Desk {
            stock,
            waste,
            ..self.clone()
        })
    }

    /// Returns the whole waste to the stock face down, reversing the order.
    pub fn redeal(&self) -> Result<Desk, GameError> {
        if !self.stock.is_empty() {
            return Err(GameError::IllegalMove(
                "redeal requires an empty stock".to_string(),
            ));
        }
        if self.waste.is_empty() {
            return Err(GameError::IllegalMove(
                "nothing to redeal, waste is empty".to_string(),
            ));
        }
        let stock_cards: Vec<Card> = self.waste.iter().rev().map(|c| c.face_down()).collect();
        Ok(Desk {
            stock: Pile::from_cards(stock_cards),
            waste: Pile::new(),
            ..self.clone()
        })
    }

    pub fn can_place_on_foundation(&self, card: &Card) -> bool {
        can_stack_foundation(self.foundation(card.suit).top(), card)
    }

    pub fn can_place_on_tableau_pile(&self, pile: usize, card: &Card, allow_non_king: bool) -> bool {
        match self.tableau.pile(pile) {
            Ok(target) => can_stack_tableau(target.top(), card, allow_non_king),
            Err(_) => false,
        }
    }

    pub fn waste_to_foundation(&self) -> Result<Desk, GameError> {
        let card = *self
            .waste
            .top()
            .ok_or_else(|| GameError::IllegalMove("waste is empty".to_string()))?;
        self.check_foundation_placement(&card)?;
        let (waste, _) = self.waste.draw(1)?;
        Ok(Desk {
            waste,
            foundations: self.foundations_with(card.face_up()),
            ..self.clone()
        })
    }

    pub fn waste_to_tableau(&self, pile: usize, allow_non_king: bool) -> Result<Desk, GameError> {
        let card = *self
            .waste
            .top()
            .ok_or_else(|| GameError::IllegalMove("waste is empty".to_string()))?;
        let target = self.tableau.pile(pile)?;
        check_tableau_placement(target.top(), &card, pile, allow_non_king)?;
        let (waste, _) = self.waste.draw(1)?;
        let target = target.place_card_on_top(card.face_up());
        Ok(Desk {
            waste,
            tableau: self.tableau.with_pile(pile, target),
            ..self.clone()
        })
    }

    pub fn tableau_to_foundation(&self, pile: usize) -> Result<Desk, GameError> {
        let source = self.tableau.pile(pile)?;
        let card = *source.top().ok_or_else(|| {
            GameError::IllegalMove(format!("tableau pile {pile} is empty"))
        })?;
        if !card.face_up {
            return Err(GameError::IllegalMove(format!(
                "top card of tableau pile {pile} is face down"
            )));
        }
        self.check_foundation_placement(&card)?;
        let (source, _) = source.draw(1)?;
        Ok(Desk {
            foundations: self.foundations_with(card.face_up()),
            tableau: self.tableau.with_pile(pile, source),
            ..self.clone()
        })
    }

    /// Turns the pile's face-down top card face up. Because cards above a
    /// hidden card must be removed before it surfaces, reveals progress
    /// strictly bottom-up within a pile.
    pub fn reveal_tableau_card(&self, pile: usize) -> Result<Desk, GameError> {
        let source = self.tableau.pile(pile)?;
        let card = *source.top().ok_or_else(|| {
            GameError::IllegalMove(format!("tableau pile {pile} is empty"))
        })?;
        if card.face_up {
            return Err(GameError::IllegalMove(format!(
                "top card of tableau pile {pile} is already face up"
            )));
        }
        let source = source.replace_card(&card, card.face_up());
        Ok(Desk {
            tableau: self.tableau.with_pile(pile, source),
            ..self.clone()
        })
    }

    pub fn foundation_to_tableau(
        &self,
        suit: Suit,
        pile: usize,
        allow_non_king: bool,
    ) -> Result<Desk, GameError> {
        let foundation = self.foundation(suit);
        let card = *foundation.top().ok_or_else(|| {
            GameError::IllegalMove(format!("the {} foundation is empty", suit.short()))
        })?;
        let target = self.tableau.pile(pile)?;
        check_tableau_placement(target.top(), &card, pile, allow_non_king)?;
        let (foundation, _) = foundation.draw(1)?;
        let mut foundations = self.foundations.clone();
        foundations[suit.foundation_index()] = foundation;
        let target = target.place_card_on_top(card.face_up());
        Ok(Desk {
            foundations,
            tableau: self.tableau.with_pile(pile, target),
            ..self.clone()
        })
    }

    pub fn can_move_tableau_run(
        &self,
        src: usize,
        card_index: usize,
        dst: usize,
        allow_non_king: bool,
    ) -> bool {
        if src == dst {
            return false;
        }
        let Ok(source) = self.tableau.pile(src) else {
            return false;
        };
        let Ok(target) = self.tableau.pile(dst) else {
            return false;
        };
        let run = match source.cards().get(card_index..) {
            Some(run) if !run.is_empty() => run,
            _ => return false,
        };
        is_face_up_run(run) && can_stack_tableau(target.top(), &run[0], allow_non_king)
    }

    pub fn tableau_to_tableau(
        &self,
        src: usize,
        card_index: usize,
        dst: usize,
        allow_non_king: bool,
    ) -> Result<Desk, GameError> {
        if src == dst {
            return Err(GameError::IllegalMove(
                "source and target piles are the same".to_string(),
            ));
        }
        let source = self.tableau.pile(src)?;
        let target = self.tableau.pile(dst)?;
        let run = source
            .cards()
            .get(card_index..)
            .filter(|run| !run.is_empty())
            .ok_or_else(|| {
                GameError::IllegalMove(format!(
                    "no card at index {card_index} in tableau pile {src}"
                ))
            })?;
        if !is_face_up_run(run) {
            return Err(GameError::IllegalMove(format!(
                "cards from index {card_index} in tableau pile {src} do not form a face-up run"
            )));
        }
        check_tableau_placement(target.top(), &run[0], dst, allow_non_king)?;

        let remainder = Pile::from_cards(source.cards()[..card_index].to_vec());
        let target = target.place_pile_on_top(&Pile::from_cards(run.to_vec()));
        let mut piles = self.tableau.piles.clone();
        piles[src] = remainder;
        piles[dst] = target;
        Ok(Desk {
            tableau: Tableau::new(piles),
            ..self.clone()
        })
    }

    /// Applies a move, dispatching exhaustively over the move vocabulary.
    pub fn apply(&self, mv: Move, rules: &GameRules) -> Result<Desk, GameError> {
        let allow = rules.allow_non_king_to_empty;
        match mv {
            Move::DrawCards { count } => self.draw_cards(count),
            Move::Redeal => self.redeal(),
            Move::WasteToFoundation => self.waste_to_foundation(),
            Move::WasteToTableau { pile } => self.waste_to_tableau(pile, allow),
            Move::TableauToFoundation { pile } => self.tableau_to_foundation(pile),
            Move::RevealTableauCard { pile } => self.reveal_tableau_card(pile),
            Move::FoundationToTableau { suit, pile } => {
                self.foundation_to_tableau(suit, pile, allow)
            }
            Move::TableauToTableau {
                src,
                card_index,
                dst,
            } => self.tableau_to_tableau(src, card_index, dst, allow),
        }
    }

    /// Won: every card sits face up in the foundations.
    pub fn is_victory(&self) -> bool {
        self.stock.is_empty()
            && self.waste.is_empty()
            && self.tableau.piles().iter().all(Pile::is_empty)
    }

    /// Stock and waste are spent and nothing in the tableau is hidden, so
    /// the remaining play is foundation-only and always completable.
    pub fn is_victory_guaranteed(&self) -> bool {
        self.stock.is_empty() && self.waste.is_empty() && self.tableau.is_all_face_up()
    }

    fn check_foundation_placement(&self, card: &Card) -> Result<(), GameError> {
        if self.can_place_on_foundation(card) {
            Ok(())
        } else {
            Err(GameError::IllegalMove(format!(
                "{} cannot go on the {} foundation (top rank {})",
                card.label(),
                card.suit.short(),
                self.foundation_top_rank(card.suit)
            )))
        }
    }

    fn foundations_with(&self, card: Card) -> [Pile; 4] {
        let mut foundations = self.foundations.clone();
        let index = card.suit.foundation_index();
        foundations[index] = foundations[index].place_card_on_top(card);
        foundations
    }
}

fn can_stack_foundation(top: Option<&Card>, card: &Card) -> bool {
    match top {
        None => card.rank == RANK_ACE,
        Some(top_card) => top_card.suit == card.suit && card.rank == top_card.rank + 1,
    }
}

fn can_stack_tableau(top: Option<&Card>, card: &Card, allow_non_king: bool) -> bool {
    match top {
        None => allow_non_king || card.rank == RANK_KING,
        Some(top_card) => {
            top_card.face_up
                && top_card.color_red() != card.color_red()
                && top_card.rank == card.rank + 1
        }
    }
}

fn check_tableau_placement(
    top: Option<&Card>,
    card: &Card,
    pile: usize,
    allow_non_king: bool,
) -> Result<(), GameError> {
    if can_stack_tableau(top, card, allow_non_king) {
        Ok(())
    } else {
        Err(GameError::IllegalMove(format!(
            "{} cannot be placed on tableau pile {pile}",
            card.label()
        )))
    }
}

fn is_face_up_run(run: &[Card]) -> bool {
    run.iter().all(|card| card.face_up)
        && run.windows(2).all(|pair| {
            pair[0].color_red() != pair[1].color_red() && pair[0].rank == pair[1].rank + 1
        })
}
