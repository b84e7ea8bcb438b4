//! The firing event log
//!
//! An append-only sequence of observations. Insertion order is the identity
//! of last resort: sorted views are stable, so entries logged at the same
//! instant keep the order they were typed in.
//!
//! Each entry carries a surrogate `id` handed out at append time, and mutations
//! should go through it (`edit_by_id`, `delete_by_id`). The older field-matching
//! calls (`edit`, `delete`) are kept for records that only exist as
//! (timestamp, logged_by, temp_front) tuples, e.g. rows pasted from a
//! spreadsheet. They act on the first match and silently do nothing when
//! nothing matches.

use crate::model::{self, Atmosphere, EntryType, FuelType, Phase};
use crate::weather::WeatherSnapshot;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Surrogate identifier for records in any collection
pub type EntryId = u64;

/// A log entry before it has been appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub timestamp: NaiveDateTime,
    pub firing_id: String,
    pub logged_by: String,
    pub phase: Phase,
    pub entry_type: EntryType,
    pub temp_front: i32,
    pub temp_middle: i32,
    pub temp_back: i32,
    pub temp_stack: i32,
    pub atmosphere: Atmosphere,
    pub damper_position: u8,
    pub air_intake: u8,
    pub fuel_type: FuelType,
    pub cones: String,
    pub flame_color: String,
    pub spy_color: String,
    pub draft_sound: String,
    pub action_taken: String,
    pub notes: String,
    pub weather: Option<WeatherSnapshot>,
}

impl NewLogEntry {
    /// Plain observation with every optional reading left at its default
    pub fn observation(
        timestamp: NaiveDateTime,
        firing_id: &str,
        logged_by: &str,
        temp_front: i32,
    ) -> Self {
        Self {
            timestamp,
            firing_id: firing_id.to_string(),
            logged_by: logged_by.to_string(),
            phase: Phase::default(),
            entry_type: EntryType::Observation,
            temp_front,
            temp_middle: 0,
            temp_back: 0,
            temp_stack: 0,
            atmosphere: Atmosphere::Neutral,
            damper_position: 50,
            air_intake: 50,
            fuel_type: FuelType::Hardwood,
            cones: String::new(),
            flame_color: String::new(),
            spy_color: String::new(),
            draft_sound: String::new(),
            action_taken: String::new(),
            notes: String::new(),
            weather: None,
        }
    }
}

/// A stored log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: EntryId,
    pub timestamp: NaiveDateTime,
    pub firing_id: String,
    pub logged_by: String,
    pub phase: Phase,
    pub entry_type: EntryType,
    pub temp_front: i32,
    pub temp_middle: i32,
    pub temp_back: i32,
    pub temp_stack: i32,
    pub atmosphere: Atmosphere,
    pub damper_position: u8,
    pub air_intake: u8,
    pub fuel_type: FuelType,
    /// Free-text cone movement, e.g. "5 soft"
    #[serde(default)]
    pub cones: String,
    pub flame_color: String,
    pub spy_color: String,
    pub draft_sound: String,
    pub action_taken: String,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSnapshot>,
    #[serde(default)]
    pub edited_by: Option<String>,
    #[serde(default)]
    pub edited_at: Option<NaiveDateTime>,
}

impl LogEntry {
    fn from_new(id: EntryId, new: NewLogEntry) -> Self {
        Self {
            id,
            timestamp: model::whole_seconds(new.timestamp),
            firing_id: new.firing_id,
            logged_by: new.logged_by,
            phase: new.phase,
            entry_type: new.entry_type,
            temp_front: new.temp_front,
            temp_middle: new.temp_middle,
            temp_back: new.temp_back,
            temp_stack: new.temp_stack,
            atmosphere: new.atmosphere,
            damper_position: new.damper_position,
            air_intake: new.air_intake,
            fuel_type: new.fuel_type,
            cones: new.cones,
            flame_color: new.flame_color,
            spy_color: new.spy_color,
            draft_sound: new.draft_sound,
            action_taken: new.action_taken,
            notes: new.notes,
            weather: new.weather,
            edited_by: None,
            edited_at: None,
        }
    }

    /// Hottest of the three spy-hole readings
    pub fn peak_temp(&self) -> i32 {
        self.temp_front.max(self.temp_middle).max(self.temp_back)
    }
}

/// Fields to overwrite on an existing entry. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogEntryPatch {
    pub timestamp: Option<NaiveDateTime>,
    pub entry_type: Option<EntryType>,
    pub temp_front: Option<i32>,
    pub temp_middle: Option<i32>,
    pub temp_back: Option<i32>,
    pub temp_stack: Option<i32>,
    pub atmosphere: Option<Atmosphere>,
    pub damper_position: Option<u8>,
    pub air_intake: Option<u8>,
    pub fuel_type: Option<FuelType>,
    pub cones: Option<String>,
    pub flame_color: Option<String>,
    pub spy_color: Option<String>,
    pub draft_sound: Option<String>,
    pub action_taken: Option<String>,
    pub notes: Option<String>,
}

impl LogEntryPatch {
    pub fn is_empty(&self) -> bool {
        *self == LogEntryPatch::default()
    }

    fn apply_to(&self, entry: &mut LogEntry) {
        if let Some(ts) = self.timestamp {
            entry.timestamp = model::whole_seconds(ts);
        }
        if let Some(t) = self.entry_type {
            entry.entry_type = t;
        }
        if let Some(v) = self.temp_front {
            entry.temp_front = v;
        }
        if let Some(v) = self.temp_middle {
            entry.temp_middle = v;
        }
        if let Some(v) = self.temp_back {
            entry.temp_back = v;
        }
        if let Some(v) = self.temp_stack {
            entry.temp_stack = v;
        }
        if let Some(a) = self.atmosphere {
            entry.atmosphere = a;
        }
        if let Some(v) = self.damper_position {
            entry.damper_position = v;
        }
        if let Some(v) = self.air_intake {
            entry.air_intake = v;
        }
        if let Some(f) = self.fuel_type {
            entry.fuel_type = f;
        }
        let text_fields = [
            (&self.cones, &mut entry.cones),
            (&self.flame_color, &mut entry.flame_color),
            (&self.spy_color, &mut entry.spy_color),
            (&self.draft_sound, &mut entry.draft_sound),
            (&self.action_taken, &mut entry.action_taken),
            (&self.notes, &mut entry.notes),
        ];
        for (new, slot) in text_fields {
            if let Some(text) = new {
                *slot = text.clone();
            }
        }
    }
}

/// Legacy lookup key: the tuple the dashboard used to find an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCriteria {
    pub timestamp: NaiveDateTime,
    pub logged_by: String,
    pub temp_front: i32,
}

impl MatchCriteria {
    pub fn of(entry: &LogEntry) -> Self {
        Self {
            timestamp: entry.timestamp,
            logged_by: entry.logged_by.clone(),
            temp_front: entry.temp_front,
        }
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        entry.timestamp == self.timestamp
            && entry.logged_by == self.logged_by
            && entry.temp_front == self.temp_front
    }
}

/// Direction of a time-ordered view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first, for analysis and export
    Ascending,
    /// Newest first, for display
    Descending,
}

/// A time-ordered view over the log. Iterate it as many times as needed.
#[derive(Debug, Clone)]
pub struct SortedView<'a> {
    entries: &'a [LogEntry],
    order: Vec<usize>,
}

impl<'a> SortedView<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a LogEntry> + '_ {
        let entries = self.entries;
        self.order.iter().map(move |&i| &entries[i])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Ordered collection of firing observations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<LogEntry>,
    next_id: EntryId,
}

impl Default for EventLog {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the end. Never fails, never deduplicates.
    /// The timestamp is stored to the whole second.
    pub fn append(&mut self, entry: NewLogEntry) -> EntryId {
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, firing_id = %entry.firing_id, temp_front = entry.temp_front, "appended log entry");
        self.entries.push(LogEntry::from_new(id, entry));
        id
    }

    /// Patch the first entry matching `criteria` and stamp the editor.
    /// Returns false, changing nothing, when no entry matches.
    pub fn edit(
        &mut self,
        criteria: &MatchCriteria,
        patch: &LogEntryPatch,
        editor: &str,
        at: NaiveDateTime,
    ) -> bool {
        match self.entries.iter().position(|e| criteria.matches(e)) {
            Some(idx) => {
                Self::apply_edit(&mut self.entries[idx], patch, editor, at);
                true
            }
            None => {
                debug!(logged_by = %criteria.logged_by, "edit matched no log entry");
                false
            }
        }
    }

    /// Remove the first entry matching `criteria`
    pub fn delete(&mut self, criteria: &MatchCriteria) -> Option<LogEntry> {
        let idx = self.entries.iter().position(|e| criteria.matches(e))?;
        Some(self.entries.remove(idx))
    }

    /// Patch the entry with the given id and stamp the editor
    pub fn edit_by_id(
        &mut self,
        id: EntryId,
        patch: &LogEntryPatch,
        editor: &str,
        at: NaiveDateTime,
    ) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                Self::apply_edit(entry, patch, editor, at);
                true
            }
            None => false,
        }
    }

    pub fn delete_by_id(&mut self, id: EntryId) -> Option<LogEntry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        debug!(id, "deleted log entry");
        Some(self.entries.remove(idx))
    }

    fn apply_edit(entry: &mut LogEntry, patch: &LogEntryPatch, editor: &str, at: NaiveDateTime) {
        patch.apply_to(entry);
        entry.edited_by = Some(editor.to_string());
        entry.edited_at = Some(at);
        debug!(id = entry.id, editor, "edited log entry");
    }

    /// Entries ordered by timestamp; ties keep insertion order
    pub fn sorted_view(&self, order: SortOrder) -> SortedView<'_> {
        let mut idx: Vec<usize> = (0..self.entries.len()).collect();
        match order {
            SortOrder::Ascending => {
                idx.sort_by(|&a, &b| self.entries[a].timestamp.cmp(&self.entries[b].timestamp))
            }
            SortOrder::Descending => {
                idx.sort_by(|&a, &b| self.entries[b].timestamp.cmp(&self.entries[a].timestamp))
            }
        }
        SortedView {
            entries: &self.entries,
            order: idx,
        }
    }

    /// Entry with the greatest timestamp (the later insert wins a tie)
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.iter().max_by_key(|e| e.timestamp)
    }

    /// Entry with the smallest timestamp (the earlier insert wins a tie)
    pub fn earliest(&self) -> Option<&LogEntry> {
        self.entries.iter().min_by_key(|e| e.timestamp)
    }

    pub fn get(&self, id: EntryId) -> Option<&LogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn filter_by_type(&self, entry_type: EntryType) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.entry_type == entry_type)
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

    fn entry(ts: NaiveDateTime, by: &str, front: i32) -> NewLogEntry {
        NewLogEntry::observation(ts, "20250314-0600", by, front)
    }

    #[test]
    fn test_append_assigns_increasing_ids() {
        let mut log = EventLog::new();
        let a = log.append(entry(at(6, 0), "mara", 200));
        let b = log.append(entry(at(6, 30), "mara", 400));
        assert!(b > a);
        assert_eq!(log.len(), 2);
        assert_eq!(log.get(b).unwrap().temp_front, 400);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut log = EventLog::new();
        let a = log.append(entry(at(6, 0), "mara", 200));
        log.delete_by_id(a).unwrap();
        let b = log.append(entry(at(6, 5), "mara", 210));
        assert_ne!(a, b);
    }

    #[test]
    fn test_sorted_view_orders_and_keeps_ties_stable() {
        let mut log = EventLog::new();
        log.append(entry(at(8, 0), "jo", 900));
        let first_tie = log.append(entry(at(7, 0), "mara", 700));
        let second_tie = log.append(entry(at(7, 0), "jo", 710));
        log.append(entry(at(6, 0), "mara", 500));

        let asc: Vec<i32> = log
            .sorted_view(SortOrder::Ascending)
            .iter()
            .map(|e| e.temp_front)
            .collect();
        assert_eq!(asc, vec![500, 700, 710, 900]);

        let desc: Vec<EntryId> = log
            .sorted_view(SortOrder::Descending)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(desc[1], first_tie);
        assert_eq!(desc[2], second_tie);
    }

    #[test]
    fn test_sorted_view_is_restartable() {
        let mut log = EventLog::new();
        log.append(entry(at(7, 0), "jo", 700));
        log.append(entry(at(6, 0), "jo", 600));
        let view = log.sorted_view(SortOrder::Ascending);
        let first: Vec<_> = view.iter().map(|e| e.id).collect();
        let second: Vec<_> = view.iter().map(|e| e.id).collect();
        assert_eq!(first, second);
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_latest_and_earliest() {
        let mut log = EventLog::new();
        assert!(log.latest().is_none());
        log.append(entry(at(7, 0), "jo", 700));
        log.append(entry(at(9, 0), "jo", 1200));
        log.append(entry(at(6, 0), "jo", 600));
        assert_eq!(log.latest().unwrap().temp_front, 1200);
        assert_eq!(log.earliest().unwrap().temp_front, 600);
    }

    #[test]
    fn test_edit_by_criteria_patches_first_match_and_stamps_editor() {
        let mut log = EventLog::new();
        let first = log.append(entry(at(7, 0), "jo", 700));
        let twin = log.append(entry(at(7, 0), "jo", 700));
        let criteria = MatchCriteria::of(log.get(first).unwrap());

        let patch = LogEntryPatch {
            notes: Some("stoked two splits".to_string()),
            atmosphere: Some(Atmosphere::Reduction),
            ..Default::default()
        };
        assert!(log.edit(&criteria, &patch, "mara", at(7, 5)));

        let edited = log.get(first).unwrap();
        assert_eq!(edited.notes, "stoked two splits");
        assert_eq!(edited.atmosphere, Atmosphere::Reduction);
        assert_eq!(edited.edited_by.as_deref(), Some("mara"));
        assert_eq!(edited.edited_at, Some(at(7, 5)));
        assert!(log.get(twin).unwrap().edited_by.is_none());
    }

    #[test]
    fn test_edit_and_delete_without_match_change_nothing() {
        let mut log = EventLog::new();
        log.append(entry(at(7, 0), "jo", 700));
        log.append(entry(at(8, 0), "mara", 800));
        let before: Vec<LogEntry> = log.iter().cloned().collect();

        let missing = MatchCriteria {
            timestamp: at(7, 0),
            logged_by: "jo".to_string(),
            temp_front: 701,
        };
        let patch = LogEntryPatch {
            notes: Some("never applied".to_string()),
            ..Default::default()
        };
        assert!(!log.edit(&missing, &patch, "mara", at(9, 0)));
        assert!(log.delete(&missing).is_none());
        assert!(!log.edit_by_id(999, &patch, "mara", at(9, 0)));
        assert!(log.delete_by_id(999).is_none());

        let after: Vec<LogEntry> = log.iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_delete_removes_only_first_duplicate() {
        let mut log = EventLog::new();
        let first = log.append(entry(at(7, 0), "jo", 700));
        let twin = log.append(entry(at(7, 0), "jo", 700));
        let criteria = MatchCriteria::of(log.get(first).unwrap());
        let removed = log.delete(&criteria).unwrap();
        assert_eq!(removed.id, first);
        assert_eq!(log.len(), 1);
        assert!(log.get(twin).is_some());
    }

    #[test]
    fn test_filter_by_type() {
        let mut log = EventLog::new();
        log.append(entry(at(7, 0), "jo", 700));
        log.append(NewLogEntry {
            entry_type: EntryType::Incident,
            notes: "door brick cracked".to_string(),
            ..entry(at(7, 10), "jo", 720)
        });
        assert_eq!(log.filter_by_type(EntryType::Incident).count(), 1);
        assert_eq!(log.filter_by_type(EntryType::Stoke).count(), 0);
    }

    #[test]
    fn test_peak_temp_uses_spy_holes_only() {
        let mut log = EventLog::new();
        let id = log.append(NewLogEntry {
            temp_middle: 2250,
            temp_back: 2100,
            temp_stack: 2400,
            ..entry(at(7, 0), "jo", 2200)
        });
        assert_eq!(log.get(id).unwrap().peak_temp(), 2250);
    }

    proptest! {
        #[test]
        fn prop_sorted_view_is_ordered_permutation(minutes in prop::collection::vec(0u32..1440, 0..40)) {
            let mut log = EventLog::new();
            for (i, m) in minutes.iter().enumerate() {
                log.append(entry(at(m / 60, m % 60), "jo", i as i32));
            }
            let view = log.sorted_view(SortOrder::Ascending);
            let sorted: Vec<&LogEntry> = view.iter().collect();
            prop_assert_eq!(sorted.len(), minutes.len());
            for pair in sorted.windows(2) {
                prop_assert!(pair[0].timestamp <= pair[1].timestamp);
            }
            let mut ids: Vec<EntryId> = sorted.iter().map(|e| e.id).collect();
            ids.sort_unstable();
            let mut expected: Vec<EntryId> = log.iter().map(|e| e.id).collect();
            expected.sort_unstable();
            prop_assert_eq!(ids, expected);
        }
    }
}
