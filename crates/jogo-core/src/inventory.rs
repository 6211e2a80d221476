use serde::{Deserialize, Serialize};

use crate::card::Card;

/// A player's cards and available packs.
///
/// `lock_token` is bumped on every write and is the optimistic version
/// counter `trade_cards` prepare/decide checks against (SPEC_FULL.md §4.2,
/// Open Question 3) — it is not part of the wire contract in spec.md §3 but
/// is carried alongside the Inventory record in the Coordination Store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub player_id: String,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub packs_available: u32,
    #[serde(default)]
    pub lock_token: u64,
}

impl Inventory {
    pub fn new(player_id: impl Into<String>) -> Self {
        Inventory {
            player_id: player_id.into(),
            cards: Vec::new(),
            packs_available: 0,
            lock_token: 0,
        }
    }

    pub fn with_starting_pack(player_id: impl Into<String>) -> Self {
        Inventory {
            packs_available: 1,
            ..Inventory::new(player_id)
        }
    }

    pub fn has_card(&self, card_id: &str) -> bool {
        self.cards.iter().any(|c| c.card_id == card_id)
    }

    pub fn remove_card(&mut self, card_id: &str) -> Option<Card> {
        let position = self.cards.iter().position(|c| c.card_id == card_id)?;
        Some(self.cards.remove(position))
    }

    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Bump the version token. Called on every CS write so the next
    /// `trade_cards` prepare observes a fresh value.
    pub fn touch(&mut self) {
        self.lock_token += 1;
    }
}
