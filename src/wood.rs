//! Wood consumption log
//!
//! Independent of the event log, but every entry carries the same firing id.

use crate::event_log::EntryId;
use crate::model::{self, StokeLocation, WoodSize, WoodSpecies};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Largest number of pieces accepted in one entry
pub const MAX_PIECES_PER_ENTRY: u32 = 50;

/// A wood-use event before it has been appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewWoodEntry {
    pub time: NaiveDateTime,
    pub firing_id: String,
    pub logged_by: String,
    pub species: WoodSpecies,
    pub size: WoodSize,
    /// Pieces, 1 to 50
    pub quantity: u32,
    pub location: StokeLocation,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WoodEntry {
    pub id: EntryId,
    pub time: NaiveDateTime,
    pub firing_id: String,
    pub logged_by: String,
    pub species: WoodSpecies,
    pub size: WoodSize,
    pub quantity: u32,
    pub location: StokeLocation,
    pub notes: String,
}

/// Point on the cumulative consumption curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunningTotal {
    pub id: EntryId,
    pub time: NaiveDateTime,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WoodSummary {
    pub total_pieces: u64,
    pub species_variety: usize,
    pub last_entry: Option<WoodEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WoodLog {
    entries: Vec<WoodEntry>,
    next_id: EntryId,
}

impl Default for WoodLog {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl WoodLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: NewWoodEntry) -> EntryId {
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, species = %entry.species, quantity = entry.quantity, "logged wood");
        self.entries.push(WoodEntry {
            id,
            time: model::whole_seconds(entry.time),
            firing_id: entry.firing_id,
            logged_by: entry.logged_by,
            species: entry.species,
            size: entry.size,
            quantity: entry.quantity,
            location: entry.location,
            notes: entry.notes,
        });
        id
    }

    /// Entries ordered by time, ties in insertion order
    pub fn by_time(&self) -> Vec<&WoodEntry> {
        let mut sorted: Vec<&WoodEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|e| e.time);
        sorted
    }

    /// Cumulative pieces burned, one point per entry in time order
    pub fn running_total(&self) -> Vec<RunningTotal> {
        let mut total = 0u64;
        self.by_time()
            .into_iter()
            .map(|e| {
                total += u64::from(e.quantity);
                RunningTotal {
                    id: e.id,
                    time: e.time,
                    total,
                }
            })
            .collect()
    }

    pub fn summary(&self) -> WoodSummary {
        let species: HashSet<WoodSpecies> = self.entries.iter().map(|e| e.species).collect();
        WoodSummary {
            total_pieces: self.entries.iter().map(|e| u64::from(e.quantity)).sum(),
            species_variety: species.len(),
            last_entry: self.entries.iter().max_by_key(|e| e.time).cloned(),
        }
    }

    /// Remove the first entry logged at `time` by `logged_by` with `species`
    pub fn delete_matching(
        &mut self,
        time: NaiveDateTime,
        logged_by: &str,
        species: WoodSpecies,
    ) -> Option<WoodEntry> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.time == time && e.logged_by == logged_by && e.species == species)?;
        Some(self.entries.remove(idx))
    }

    pub fn delete_by_id(&mut self, id: EntryId) -> Option<WoodEntry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &WoodEntry> {
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
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn wood(time: NaiveDateTime, species: WoodSpecies, quantity: u32) -> NewWoodEntry {
        NewWoodEntry {
            time,
            firing_id: "20250314-0600".to_string(),
            logged_by: "jo".to_string(),
            species,
            size: WoodSize::Medium,
            quantity,
            location: StokeLocation::Primary,
            notes: String::new(),
        }
    }

    #[test]
    fn test_running_total_follows_time_not_insertion() {
        let mut log = WoodLog::new();
        log.append(wood(at(9, 0), WoodSpecies::Oak, 4));
        log.append(wood(at(7, 0), WoodSpecies::Pine, 10));
        log.append(wood(at(8, 0), WoodSpecies::Pine, 6));

        let totals: Vec<u64> = log.running_total().iter().map(|p| p.total).collect();
        assert_eq!(totals, vec![10, 16, 20]);
    }

    #[test]
    fn test_summary() {
        let mut log = WoodLog::new();
        assert_eq!(log.summary().total_pieces, 0);
        assert!(log.summary().last_entry.is_none());

        log.append(wood(at(7, 0), WoodSpecies::Pine, 10));
        let last = log.append(wood(at(9, 0), WoodSpecies::Oak, 4));
        log.append(wood(at(8, 0), WoodSpecies::Pine, 6));

        let summary = log.summary();
        assert_eq!(summary.total_pieces, 20);
        assert_eq!(summary.species_variety, 2);
        assert_eq!(summary.last_entry.unwrap().id, last);
    }

    #[test]
    fn test_delete_matching_first_only() {
        let mut log = WoodLog::new();
        let first = log.append(wood(at(7, 0), WoodSpecies::Pine, 10));
        log.append(wood(at(7, 0), WoodSpecies::Pine, 3));
        let removed = log.delete_matching(at(7, 0), "jo", WoodSpecies::Pine).unwrap();
        assert_eq!(removed.id, first);
        assert_eq!(log.len(), 1);
        assert!(log.delete_matching(at(7, 0), "mara", WoodSpecies::Pine).is_none());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_totals_do_not_overflow_on_oversized_entries() {
        let mut log = WoodLog::new();
        log.append(wood(at(7, 0), WoodSpecies::Oak, u32::MAX));
        log.append(wood(at(8, 0), WoodSpecies::Oak, u32::MAX));
        let expected = 2 * u64::from(u32::MAX);
        assert_eq!(log.summary().total_pieces, expected);
        assert_eq!(log.running_total().last().map(|p| p.total), Some(expected));
    }

    proptest! {
        #[test]
        fn prop_running_total_monotonic_and_matches_summary(
            items in prop::collection::vec((0u32..1440, 1u32..=MAX_PIECES_PER_ENTRY), 0..40)
        ) {
            let mut log = WoodLog::new();
            for (m, qty) in &items {
                log.append(wood(at(m / 60, m % 60), WoodSpecies::Ash, *qty));
            }
            let totals = log.running_total();
            for pair in totals.windows(2) {
                prop_assert!(pair[0].total <= pair[1].total);
            }
            let last = totals.last().map(|p| p.total).unwrap_or(0);
            prop_assert_eq!(last, log.summary().total_pieces);
        }
    }
}
