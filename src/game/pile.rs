use rand::seq::SliceRandom;
use rand::Rng;

use crate::game::error::GameError;
use crate::game::types::Card;

/// An ordered stack of cards; the last element is the top. All operations
/// return new piles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pile {
    pub(crate) cards: Vec<Card>,
}

impl Pile {
    pub fn new() -> Self {
        Pile { cards: Vec::new() }
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Pile { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn top(&self) -> Option<&Card> {
        self.cards.last()
    }

    pub fn get(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    /// Removes the top `count` cards, returned top-first. Asking for zero
    /// cards or more than the pile holds is an error; callers that want
    /// clamping decide it themselves.
    pub fn draw(&self, count: usize) -> Result<(Pile, Vec<Card>), GameError> {
        if count == 0 || count > self.cards.len() {
            return Err(GameError::InsufficientCards {
                requested: count,
                available: self.cards.len(),
            });
        }
        let mut remainder = self.cards.clone();
        let mut drawn = remainder.split_off(self.cards.len() - count);
        drawn.reverse();
        Ok((Pile { cards: remainder }, drawn))
    }

    pub fn place_card_on_top(&self, card: Card) -> Pile {
        let mut cards = self.cards.clone();
        cards.push(card);
        Pile { cards }
    }

    /// Concatenates `other` on top of this pile, keeping its internal order.
    pub fn place_pile_on_top(&self, other: &Pile) -> Pile {
        let mut cards = self.cards.clone();
        cards.extend_from_slice(&other.cards);
        Pile { cards }
    }

    /// Substitutes the card that is the same physical card as `target`.
    /// No-op when the card is not in this pile.
    pub fn replace_card(&self, target: &Card, replacement: Card) -> Pile {
        let mut cards = self.cards.clone();
        if let Some(found) = cards.iter_mut().find(|c| c.is_same_card(target)) {
            *found = replacement;
        }
        Pile { cards }
    }

    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Pile {
        let mut cards = self.cards.clone();
        cards.shuffle(rng);
        Pile { cards }
    }
}
