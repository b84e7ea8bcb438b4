//! Pre-firing safety checklist

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The fixed checks every firing starts with, in the order they are walked
pub const SAFETY_ITEMS: &[&str] = &[
    "Fire extinguisher staged",
    "Water hose charged",
    "Protective gear available",
    "First aid kit located",
    "Kiln area cleared of combustibles",
    "Emergency contacts posted",
    "Crew briefed on emergency plan",
    "Ventilation checked",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    pub checked: bool,
    pub checked_by: Option<String>,
    pub checked_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyChecklist {
    items: Vec<ChecklistItem>,
}

impl Default for SafetyChecklist {
    fn default() -> Self {
        Self {
            items: SAFETY_ITEMS
                .iter()
                .map(|label| ChecklistItem {
                    label: label.to_string(),
                    checked: false,
                    checked_by: None,
                    checked_at: None,
                })
                .collect(),
        }
    }
}

impl SafetyChecklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tick item `index` (zero-based). Returns false if there is no such item.
    pub fn check(&mut self, index: usize, by: &str, at: NaiveDateTime) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.checked = true;
                item.checked_by = Some(by.to_string());
                item.checked_at = Some(at);
                true
            }
            None => false,
        }
    }

    pub fn uncheck(&mut self, index: usize) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.checked = false;
                item.checked_by = None;
                item.checked_at = None;
                true
            }
            None => false,
        }
    }

    pub fn completed(&self) -> bool {
        self.items.iter().all(|i| i.checked)
    }

    pub fn checked_count(&self) -> usize {
        self.items.iter().filter(|i| i.checked).count()
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }
}
