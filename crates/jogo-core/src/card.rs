use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The three card kinds the game is built around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Rock,
    Paper,
    Scissors,
}

impl CardKind {
    const ALL: [CardKind; 3] = [CardKind::Rock, CardKind::Paper, CardKind::Scissors];

    fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    fn skins(self) -> &'static [&'static str] {
        match self {
            CardKind::Rock => &["Rocha Vulcanica", "Marmore Polido", "Seixo de Rio"],
            CardKind::Paper => &["Papiro Antigo", "Jornal Velho", "Nota de Dolar"],
            CardKind::Scissors => &["Lamina Afiada", "Tesoura de Jardim", "Navalha de Barbeiro"],
        }
    }

    fn label(self) -> &'static str {
        match self {
            CardKind::Rock => "Pedra",
            CardKind::Paper => "Papel",
            CardKind::Scissors => "Tesoura",
        }
    }
}

/// Card rarity, ordered from most to least common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Weighted rarity table, matching `servico_2pc.py`'s `raridades` list
/// (three commons for every rare, rare repeated, one epic, one legendary).
const RARITY_TABLE: [Rarity; 7] = [
    Rarity::Common,
    Rarity::Common,
    Rarity::Common,
    Rarity::Rare,
    Rarity::Rare,
    Rarity::Epic,
    Rarity::Legendary,
];

/// A single card. Value object: identity is `card_id`, no owner pointer —
/// ownership is expressed by which Inventory currently holds it (I3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub card_id: String,
    pub kind: CardKind,
    pub skin: String,
    pub rarity: Rarity,
    pub display_name: String,
}

/// Deterministic card minting keyed by `(tx_id, index)`.
///
/// Every node that independently mints for the same transaction produces
/// byte-identical cards, so it is safe for more than one participant to
/// perform the commit-side write (SPEC_FULL.md §4.2, Open Question 2).
pub fn mint_card(tx_id: &str, index: u64) -> Card {
    let mut hasher = Sha256::new();
    hasher.update(tx_id.as_bytes());
    hasher.update(b":card:");
    hasher.update(index.to_le_bytes());
    let digest = hasher.finalize();

    let kind = CardKind::from_index(digest[0] as usize);
    let skins = kind.skins();
    let skin = skins[digest[1] as usize % skins.len()];
    let rarity = RARITY_TABLE[digest[2] as usize % RARITY_TABLE.len()];
    let card_id = format!("CARTA-{}", hex::encode(&digest[3..7]));

    Card {
        card_id,
        kind,
        skin: skin.to_string(),
        rarity,
        display_name: format!("{} ({})", kind.label(), skin),
    }
}

/// Mint the `quantity * 3` cards a single `open_pack` transaction produces.
pub fn mint_pack(tx_id: &str, quantity: u32) -> Vec<Card> {
    (0..quantity as u64 * 3).map(|i| mint_card(tx_id, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_pack_produces_three_cards_per_pack() {
        let cards = mint_pack("tx-1", 2);
        assert_eq!(cards.len(), 6);
    }

    #[test]
    fn mint_card_is_deterministic_in_tx_id() {
        let a = mint_card("tx-abc", 0);
        let b = mint_card("tx-abc", 0);
        assert_eq!(a, b);
    }

    #[test]
    fn mint_card_varies_by_index() {
        let a = mint_card("tx-abc", 0);
        let b = mint_card("tx-abc", 1);
        assert_ne!(a.card_id, b.card_id);
    }

    #[test]
    fn mint_card_varies_by_tx_id() {
        let a = mint_card("tx-abc", 0);
        let b = mint_card("tx-xyz", 0);
        assert_ne!(a.card_id, b.card_id);
    }
}
