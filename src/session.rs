//! Firing session identity and the workbook that holds one firing's records
//!
//! The workbook is the single state container: every command receives it
//! explicitly and reads or mutates the one collection it cares about.

use crate::archive::HistoricalArchive;
use crate::checklist::SafetyChecklist;
use crate::cone_grid::ConeGrid;
use crate::crew::CrewRoster;
use crate::event_log::{EventLog, NewLogEntry};
use crate::inventory::WoodInventory;
use crate::model::{Phase, StokeLocation, WoodSize, WoodSpecies};
use crate::timer::StokeTimer;
use crate::wood::{NewWoodEntry, WoodLog};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Author recorded when nobody has claimed the session
pub const UNKNOWN_USER: &str = "unknown";

/// The active firing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiringSession {
    pub kiln_name: String,
    pub firing_id: String,
    pub phase: Phase,
    pub active_user: Option<String>,
    pub started_at: NaiveDateTime,
}

impl FiringSession {
    pub fn new(kiln_name: &str, firing_id: &str, started_at: NaiveDateTime) -> Self {
        Self {
            kiln_name: kiln_name.to_string(),
            firing_id: firing_id.to_string(),
            phase: Phase::default(),
            active_user: None,
            started_at,
        }
    }

    /// Firing id derived from a start time, e.g. "20250314-0600"
    pub fn default_firing_id(at: NaiveDateTime) -> String {
        at.format("%Y%m%d-%H%M").to_string()
    }

    /// Move to any phase. Returns the phase being left.
    pub fn set_phase(&mut self, phase: Phase) -> Phase {
        let previous = std::mem::replace(&mut self.phase, phase);
        info!(from = %previous, to = %phase, firing_id = %self.firing_id, "phase change");
        previous
    }

    pub fn current_user(&self) -> &str {
        self.active_user.as_deref().unwrap_or(UNKNOWN_USER)
    }

    /// New observation stamped with this firing's id, phase and active user
    pub fn draft_entry(&self, timestamp: NaiveDateTime, temp_front: i32) -> NewLogEntry {
        NewLogEntry {
            phase: self.phase,
            ..NewLogEntry::observation(timestamp, &self.firing_id, self.current_user(), temp_front)
        }
    }

    /// New wood entry stamped with this firing's id and active user
    pub fn draft_wood(
        &self,
        time: NaiveDateTime,
        species: WoodSpecies,
        size: WoodSize,
        quantity: u32,
        location: StokeLocation,
    ) -> NewWoodEntry {
        NewWoodEntry {
            time,
            firing_id: self.firing_id.clone(),
            logged_by: self.current_user().to_string(),
            species,
            size,
            quantity,
            location,
            notes: String::new(),
        }
    }
}

/// Every collection belonging to one firing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiringWorkbook {
    pub session: FiringSession,
    #[serde(default)]
    pub log: EventLog,
    #[serde(default)]
    pub wood: WoodLog,
    #[serde(default)]
    pub inventory: WoodInventory,
    #[serde(default)]
    pub crew: CrewRoster,
    #[serde(default)]
    pub cones: ConeGrid,
    #[serde(default)]
    pub checklist: SafetyChecklist,
    #[serde(default)]
    pub timer: StokeTimer,
    #[serde(default)]
    pub archive: HistoricalArchive,
}

impl FiringWorkbook {
    pub fn new(session: FiringSession) -> Self {
        Self {
            session,
            log: EventLog::new(),
            wood: WoodLog::new(),
            inventory: WoodInventory::new(),
            crew: CrewRoster::new(),
            cones: ConeGrid::new(),
            checklist: SafetyChecklist::new(),
            timer: StokeTimer::default(),
            archive: HistoricalArchive::new(),
        }
    }

    /// Start a fresh firing, carrying the archive, wood stock and timer
    /// interval over
    pub fn start_next_firing(&mut self, session: FiringSession) {
        let archive = std::mem::take(&mut self.archive);
        let inventory = std::mem::take(&mut self.inventory);
        let interval = self.timer.interval_minutes;
        *self = Self::new(session);
        self.archive = archive;
        self.inventory = inventory;
        self.timer = StokeTimer::new(interval);
    }
}
