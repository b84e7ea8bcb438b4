//! Wood stock on hand
//!
//! Separate from the consumption log in [`crate::wood`]: this is what is
//! stacked in the sheds, measured in cords, and it outlives a single firing.

use crate::error::{KilnError, Result};
use crate::event_log::EntryId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Wood at or below this moisture content counts as seasoned
pub const SEASONED_MOISTURE_PCT: u8 = 20;

pub const MAX_MOISTURE_PCT: u8 = 100;

/// A stack before it has been recorded
#[derive(Debug, Clone, PartialEq)]
pub struct NewStockEntry {
    pub species: String,
    pub cords: f64,
    /// Percent, 0 to 100
    pub moisture_pct: u8,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    pub id: EntryId,
    pub species: String,
    pub cords: f64,
    pub moisture_pct: u8,
    pub location: String,
}

impl StockEntry {
    pub fn is_seasoned(&self) -> bool {
        self.moisture_pct <= SEASONED_MOISTURE_PCT
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockSummary {
    pub total_cords: f64,
    pub seasoned_cords: f64,
    pub species_variety: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WoodInventory {
    entries: Vec<StockEntry>,
    next_id: EntryId,
}

impl Default for WoodInventory {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl WoodInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stack. Cords must be a finite amount, zero or more, and
    /// moisture a percentage; anything else is rejected before an id is taken.
    pub fn append(&mut self, entry: NewStockEntry) -> Result<EntryId> {
        if !entry.cords.is_finite() || entry.cords < 0.0 {
            return Err(KilnError::OutOfRange {
                field: "cords",
                value: entry.cords.to_string(),
                range: "0 or more",
            });
        }
        if entry.moisture_pct > MAX_MOISTURE_PCT {
            return Err(KilnError::OutOfRange {
                field: "moisture_pct",
                value: entry.moisture_pct.to_string(),
                range: "0-100",
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        debug!(id, species = %entry.species, cords = entry.cords, "added wood stock");
        self.entries.push(StockEntry {
            id,
            species: entry.species.trim().to_string(),
            cords: entry.cords,
            moisture_pct: entry.moisture_pct,
            location: entry.location.trim().to_string(),
        });
        Ok(id)
    }

    pub fn delete_by_id(&mut self, id: EntryId) -> Option<StockEntry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(idx))
    }

    /// Species are compared case-insensitively ("Oak" and "oak" are one)
    pub fn summary(&self) -> StockSummary {
        let species: HashSet<String> = self
            .entries
            .iter()
            .map(|e| e.species.to_lowercase())
            .collect();
        StockSummary {
            total_cords: self.entries.iter().map(|e| e.cords).sum(),
            seasoned_cords: self
                .entries
                .iter()
                .filter(|e| e.is_seasoned())
                .map(|e| e.cords)
                .sum(),
            species_variety: species.len(),
        }
    }

    /// Entries in the order they were recorded
    pub fn iter(&self) -> impl Iterator<Item = &StockEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stack(species: &str, cords: f64, moisture_pct: u8) -> NewStockEntry {
        NewStockEntry {
            species: species.to_string(),
            cords,
            moisture_pct,
            location: "shed A".to_string(),
        }
    }

    #[test]
    fn test_summary() {
        let mut inv = WoodInventory::new();
        assert_eq!(inv.summary(), StockSummary::default());

        inv.append(stack("pine", 1.5, 18)).unwrap();
        inv.append(stack("Oak", 0.5, 35)).unwrap();
        inv.append(stack("oak", 2.0, 20)).unwrap();

        let summary = inv.summary();
        assert_eq!(summary.total_cords, 4.0);
        assert_eq!(summary.seasoned_cords, 3.5);
        assert_eq!(summary.species_variety, 2);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut inv = WoodInventory::new();
        assert!(matches!(
            inv.append(stack("pine", -0.1, 20)),
            Err(KilnError::OutOfRange { field: "cords", .. })
        ));
        assert!(inv.append(stack("pine", f64::NAN, 20)).is_err());
        assert!(matches!(
            inv.append(stack("pine", 1.0, 101)),
            Err(KilnError::OutOfRange { field: "moisture_pct", .. })
        ));
        assert!(inv.is_empty());

        // Rejected entries don't use up ids
        assert_eq!(inv.append(stack("pine", 0.0, 100)).unwrap(), 1);
    }

    #[test]
    fn test_delete_by_id() {
        let mut inv = WoodInventory::new();
        let first = inv.append(stack("pine", 1.0, 15)).unwrap();
        let second = inv.append(stack("ash", 1.0, 15)).unwrap();
        assert_eq!(inv.delete_by_id(first).map(|e| e.species), Some("pine".to_string()));
        assert!(inv.delete_by_id(first).is_none());
        assert_eq!(inv.iter().map(|e| e.id).collect::<Vec<_>>(), vec![second]);
    }

    proptest! {
        #[test]
        fn prop_total_is_sum_of_accepted_stacks(
            items in prop::collection::vec((0u32..400, 0u8..=100), 0..30)
        ) {
            let mut inv = WoodInventory::new();
            let mut expected = 0.0;
            for (tenths, mc) in &items {
                let cords = f64::from(*tenths) / 10.0;
                inv.append(stack("mixed", cords, *mc)).unwrap();
                expected += cords;
            }
            let summary = inv.summary();
            prop_assert!((summary.total_cords - expected).abs() < 1e-9);
            prop_assert!(summary.seasoned_cords <= summary.total_cords + 1e-9);
            prop_assert_eq!(inv.len(), items.len());
        }
    }
}
