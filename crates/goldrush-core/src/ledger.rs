//! ============================================================================
//! Inventory Ledger - Held item quantities and the precision use-pool
//! ============================================================================
//! One entry per held item id. Zero-quantity entries are dropped, so an absent
//! entry and a quantity of 0 mean the same thing.
//!
//! Two couplings with the catalog live here on purpose:
//! - `extra_plays` is credited at twice the requested quantity
//! - `precision_pack` carries a pooled `uses_left` counter, 3 uses per unit
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::catalog::items;

/// Uses granted by one precision pack
pub const PRECISION_USES_PER_PACK: u32 = 3;

/// Plays granted per credited `extra_plays` unit
pub const EXTRA_PLAYS_PER_UNIT: u32 = 2;

/// A held item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub item_id: String,
    pub quantity: u32,
    /// Only present for multi-use items (precision pack)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses_left: Option<u32>,
}

/// How precision uses map back onto whole packs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrecisionAccounting {
    /// Single pooled counter; one pack is removed each time the pool empties,
    /// after which the pool restarts at 3. Exact for a single held pack,
    /// approximate when several are held.
    #[default]
    Pooled,
    /// Quantity is always `ceil(uses_left / 3)`
    PerUnit,
}

impl FromStr for PrecisionAccounting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pooled" => Ok(Self::Pooled),
            "per-unit" | "per_unit" | "perunit" => Ok(Self::PerUnit),
            other => Err(format!(
                "Unknown precision accounting '{}'. Valid values: pooled, per-unit",
                other
            )),
        }
    }
}

/// Item id → entry mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<InventoryEntry>,
    accounting: PrecisionAccounting,
}

impl Ledger {
    pub fn new(accounting: PrecisionAccounting) -> Self {
        Self {
            entries: Vec::new(),
            accounting,
        }
    }

    /// Rebuild from a persisted snapshot, migrating legacy entries
    pub fn from_entries(entries: Vec<InventoryEntry>, accounting: PrecisionAccounting) -> Self {
        let mut ledger = Self::new(accounting);
        for mut entry in entries {
            if entry.quantity == 0 {
                continue;
            }
            if entry.item_id == items::PRECISION_PACK && entry.uses_left.is_none() {
                entry.uses_left = Some(pack_uses(entry.quantity));
            }
            match ledger.position(&entry.item_id) {
                Some(idx) => {
                    let existing = &mut ledger.entries[idx];
                    existing.quantity = existing.quantity.saturating_add(entry.quantity);
                    existing.uses_left = match (existing.uses_left, entry.uses_left) {
                        (Some(a), Some(b)) => Some(a.saturating_add(b)),
                        (a, b) => a.or(b),
                    };
                }
                None => ledger.entries.push(entry),
            }
        }
        for entry in &ledger.entries {
            if entry.quantity == u32::MAX || entry.uses_left == Some(u32::MAX) {
                warn!("Inventory entry {} clamped to the maximum quantity", entry.item_id);
            }
        }
        ledger
    }

    pub fn entries(&self) -> &[InventoryEntry] {
        &self.entries
    }

    pub fn accounting(&self) -> PrecisionAccounting {
        self.accounting
    }

    pub fn get(&self, item_id: &str) -> Option<&InventoryEntry> {
        self.entries.iter().find(|e| e.item_id == item_id)
    }

    fn position(&self, item_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.item_id == item_id)
    }

    /// Held quantity, 0 if absent
    pub fn quantity_of(&self, item_id: &str) -> u32 {
        self.get(item_id).map(|e| e.quantity).unwrap_or(0)
    }

    /// Remaining precision uses; legacy entries count 3 per pack
    pub fn precision_uses(&self) -> u32 {
        match self.get(items::PRECISION_PACK) {
            Some(entry) => entry
                .uses_left
                .unwrap_or_else(|| pack_uses(entry.quantity)),
            None => 0,
        }
    }

    /// Add `quantity` units of an item. Quantities saturate at `u32::MAX`.
    pub fn credit(&mut self, item_id: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let actual = if item_id == items::EXTRA_PLAYS {
            quantity.saturating_mul(EXTRA_PLAYS_PER_UNIT)
        } else {
            quantity
        };
        let is_precision = item_id == items::PRECISION_PACK;

        match self.position(item_id) {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.quantity = entry.quantity.saturating_add(actual);
                if is_precision {
                    entry.uses_left =
                        Some(entry.uses_left.unwrap_or(0).saturating_add(pack_uses(quantity)));
                }
            }
            None => self.entries.push(InventoryEntry {
                item_id: item_id.to_string(),
                quantity: actual,
                uses_left: is_precision.then(|| pack_uses(quantity)),
            }),
        }

        debug!("Credited {} x{} (now {})", item_id, actual, self.quantity_of(item_id));
    }

    /// Remove `quantity` units; the entry disappears when nothing is left
    pub fn debit(&mut self, item_id: &str, quantity: u32) {
        let Some(idx) = self.position(item_id) else {
            return;
        };
        let entry = &mut self.entries[idx];
        if entry.quantity <= quantity {
            self.entries.remove(idx);
            debug!("Debited {} x{} (entry removed)", item_id, quantity);
            return;
        }

        entry.quantity -= quantity;
        if item_id == items::PRECISION_PACK {
            if let Some(uses) = entry.uses_left {
                entry.uses_left =
                    Some(uses.saturating_sub(pack_uses(quantity)));
            }
        }
        debug!("Debited {} x{} (now {})", item_id, quantity, entry.quantity);
    }

    /// Spend one unit (or one precision use). False when nothing is held.
    pub fn consume_one(&mut self, item_id: &str) -> bool {
        let Some(idx) = self.position(item_id) else {
            debug!("Cannot use {}: not in inventory", item_id);
            return false;
        };

        if item_id != items::PRECISION_PACK {
            self.debit(item_id, 1);
            return true;
        }

        let entry = &mut self.entries[idx];
        let uses_left = entry.uses_left;
        match uses_left {
            Some(uses) if uses > 0 => {
                let remaining = uses - 1;
                match self.accounting {
                    PrecisionAccounting::Pooled => {
                        if remaining == 0 {
                            entry.quantity -= 1;
                            entry.uses_left = Some(PRECISION_USES_PER_PACK);
                        } else {
                            entry.uses_left = Some(remaining);
                        }
                    }
                    PrecisionAccounting::PerUnit => {
                        entry.uses_left = Some(remaining);
                        entry.quantity = remaining.div_ceil(PRECISION_USES_PER_PACK);
                    }
                }
                if entry.quantity == 0 {
                    self.entries.remove(idx);
                }
                debug!(
                    "Used precision: {} uses left across {} packs",
                    self.precision_uses(),
                    self.quantity_of(item_id)
                );
            }
            // Legacy entry without a pool, or a pool drained by a debit
            _ => self.debit(item_id, 1),
        }
        true
    }
}

fn pack_uses(packs: u32) -> u32 {
    packs.saturating_mul(PRECISION_USES_PER_PACK)
}
