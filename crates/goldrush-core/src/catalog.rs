//! ============================================================================
//! Catalog - Purchasable items, packs and their effect bundles
//! ============================================================================
//! Static shop definition. Consumables credit themselves once per purchase;
//! packs ("chests") expand into several ledger items.
//! ============================================================================

use serde::Serialize;
use std::fmt;

/// Ledger item identifiers
pub mod items {
    /// Clears every rock on screen
    pub const TNT_PACK: &str = "tnt_pack";
    /// +30 seconds to the running session
    pub const TIMER_BOOST: &str = "timer_boost";
    /// Hitbox +50% for 20 seconds, 3 uses per pack
    pub const PRECISION_PACK: &str = "precision_pack";
    /// Extra games that ignore the play cooldown
    pub const EXTRA_PLAYS: &str = "extra_plays";
    pub const SILVER_CHEST: &str = "silver_chest";
    pub const GOLDEN_CHEST: &str = "golden_chest";
    pub const DIAMOND_CHEST: &str = "diamond_chest";
}

/// Symbol of the token prices are denominated in
pub const PRICE_TOKEN_SYMBOL: &str = "WLD";

/// Decimals of the host token's raw amount
pub const PRICE_TOKEN_DECIMALS: u8 = 18;

/// Decimals kept by `TokenAmount`
const MICRO_DECIMALS: u8 = 6;

/// Fixed-point token amount (micro-units, 6 decimals)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TokenAmount(u64);

impl TokenAmount {
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Whole-token hundredths, e.g. `cents(15)` is 0.15
    pub const fn cents(hundredths: u64) -> Self {
        Self(hundredths * 10_000)
    }

    pub fn micros(&self) -> u64 {
        self.0
    }

    /// Human-readable amount
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Raw integer amount for a token with `decimals` decimals
    pub fn to_decimals(&self, decimals: u8) -> u128 {
        let micros = self.0 as u128;
        if decimals >= MICRO_DECIMALS {
            micros * 10u128.pow((decimals - MICRO_DECIMALS) as u32)
        } else {
            micros / 10u128.pow((MICRO_DECIMALS - decimals) as u32)
        }
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 1_000_000;
        let frac = self.0 % 1_000_000;
        if frac == 0 {
            return write!(f, "{}.00", whole);
        }
        let digits = format!("{:06}", frac);
        let trimmed = digits.trim_end_matches('0');
        if trimmed.len() < 2 {
            write!(f, "{}.{:0<2}", whole, trimmed)
        } else {
            write!(f, "{}.{}", whole, trimmed)
        }
    }
}

/// Whether a purchase credits the item itself or unpacks a bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Consumable,
    Pack,
}

/// Effect contained in an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    Tnt,
    Timer,
    Precision,
    ExtraPlays,
}

impl EffectKind {
    /// Ledger item credited for this effect when a pack is opened
    pub fn ledger_item(&self) -> &'static str {
        match self {
            Self::Tnt => items::TNT_PACK,
            Self::Timer => items::TIMER_BOOST,
            Self::Precision => items::PRECISION_PACK,
            Self::ExtraPlays => items::EXTRA_PLAYS,
        }
    }
}

/// A shop entry
#[derive(Debug, Clone, Serialize)]
pub struct CatalogItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: TokenAmount,
    pub image: &'static str,
    pub kind: ItemKind,
    pub effects: &'static [(EffectKind, u32)],
}

impl CatalogItem {
    /// Ledger credits produced by one purchase of this item
    pub fn credits(&self) -> Vec<(&'static str, u32)> {
        match self.kind {
            ItemKind::Pack => self
                .effects
                .iter()
                .filter(|(_, count)| *count > 0)
                .map(|(effect, count)| (effect.ledger_item(), *count))
                .collect(),
            ItemKind::Consumable => vec![(self.id, 1)],
        }
    }

    /// Description shown by the wallet's payment sheet
    pub fn payment_description(&self) -> String {
        format!("Gold Rush Miner: {}", self.name)
    }
}

static STORE_ITEMS: [CatalogItem; 7] = [
    CatalogItem {
        id: items::TNT_PACK,
        name: "TNT Pack",
        description: "Destroys ALL rocks on screen during game",
        price: TokenAmount::cents(15),
        image: "/game-assets/tnt01.png",
        kind: ItemKind::Consumable,
        effects: &[(EffectKind::Tnt, 1)],
    },
    CatalogItem {
        id: items::TIMER_BOOST,
        name: "Timer Boost",
        description: "+30 seconds to current time during game",
        price: TokenAmount::cents(10),
        image: "/game-assets/timer-boost.png",
        kind: ItemKind::Consumable,
        effects: &[(EffectKind::Timer, 1)],
    },
    CatalogItem {
        id: items::PRECISION_PACK,
        name: "Precision Pack",
        description: "Click area +50% for 20 seconds (3 uses per pack)",
        price: TokenAmount::cents(25),
        image: "/game-assets/precision-pack.png",
        kind: ItemKind::Consumable,
        effects: &[(EffectKind::Precision, 3)],
    },
    CatalogItem {
        id: items::EXTRA_PLAYS,
        name: "Extra Plays",
        description: "+2 extra games (ignores daily limit)",
        price: TokenAmount::cents(25),
        image: "/game-assets/extra-plays.png",
        kind: ItemKind::Consumable,
        effects: &[(EffectKind::ExtraPlays, 2)],
    },
    CatalogItem {
        id: items::SILVER_CHEST,
        name: "Silver Chest",
        description: "Pack: 3 plays + 2 TNT + 2 Timers + 1 Precision Pack",
        price: TokenAmount::cents(99),
        image: "/game-assets/silver-chest.png",
        kind: ItemKind::Pack,
        effects: &[
            (EffectKind::ExtraPlays, 3),
            (EffectKind::Tnt, 2),
            (EffectKind::Timer, 2),
            (EffectKind::Precision, 1),
        ],
    },
    CatalogItem {
        id: items::GOLDEN_CHEST,
        name: "Golden Chest",
        description: "Pack: 5 plays + 3 TNT + 3 Timers + 2 Precision Packs",
        price: TokenAmount::cents(125),
        image: "/game-assets/golden-chest.png",
        kind: ItemKind::Pack,
        effects: &[
            (EffectKind::ExtraPlays, 5),
            (EffectKind::Tnt, 3),
            (EffectKind::Timer, 3),
            (EffectKind::Precision, 2),
        ],
    },
    CatalogItem {
        id: items::DIAMOND_CHEST,
        name: "Diamond Chest",
        description: "Pack: 10 plays + 5 TNT + 5 Timers + 3 Precision Packs",
        price: TokenAmount::cents(175),
        image: "/game-assets/diamond-chest.png",
        kind: ItemKind::Pack,
        effects: &[
            (EffectKind::ExtraPlays, 10),
            (EffectKind::Tnt, 5),
            (EffectKind::Timer, 5),
            (EffectKind::Precision, 3),
        ],
    },
];

/// Every item in the shop, in display order
pub fn all() -> &'static [CatalogItem] {
    &STORE_ITEMS
}

/// Look up an item by id
pub fn find(id: &str) -> Option<&'static CatalogItem> {
    STORE_ITEMS.iter().find(|item| item.id == id)
}

/// Ledger credits for one purchase of `id`, `None` for unknown items
pub fn credits_for(id: &str) -> Option<Vec<(&'static str, u32)>> {
    find(id).map(CatalogItem::credits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_unique() {
        let ids: HashSet<_> = all().iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), all().len());
    }

    #[test]
    fn test_consumable_credits_itself_once() {
        let tnt = find(items::TNT_PACK).unwrap();
        assert_eq!(tnt.credits(), vec![(items::TNT_PACK, 1)]);

        let precision = find(items::PRECISION_PACK).unwrap();
        assert_eq!(precision.credits(), vec![(items::PRECISION_PACK, 1)]);
    }

    #[test]
    fn test_pack_expands_bundle() {
        let chest = find(items::GOLDEN_CHEST).unwrap();
        assert_eq!(
            chest.credits(),
            vec![
                (items::EXTRA_PLAYS, 5),
                (items::TNT_PACK, 3),
                (items::TIMER_BOOST, 3),
                (items::PRECISION_PACK, 2),
            ]
        );
    }

    #[test]
    fn test_price_conversion_is_exact() {
        let price = find(items::TNT_PACK).unwrap().price;
        assert_eq!(price.to_decimals(PRICE_TOKEN_DECIMALS), 150_000_000_000_000_000);
        assert_eq!(price.to_decimals(2), 15);
        assert_eq!(price.to_string(), "0.15");
        assert_eq!(TokenAmount::cents(175).to_string(), "1.75");
        assert_eq!(TokenAmount::cents(100).to_string(), "1.00");
        assert_eq!(TokenAmount::from_micros(1_500_000).to_string(), "1.50");
    }

    #[test]
    fn test_unknown_item() {
        assert!(find("golden_pickaxe").is_none());
        assert!(credits_for("golden_pickaxe").is_none());
        assert_eq!(credits_for(items::TIMER_BOOST), Some(vec![(items::TIMER_BOOST, 1)]));
    }
}
