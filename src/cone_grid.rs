//! Kiln map of cone packs
//!
//! The kiln is mapped as a fixed 6 x 8 grid of positions. Each position holds
//! any number of labelled cones ("06", "9", ...) and the last observed status
//! of each. An empty position and a never-touched position are the same thing.

use crate::error::{KilnError, Result};
use crate::model::{ConeStatus, SeverityTier};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const ROWS: usize = 6;
pub const COLS: usize = 8;

/// A validated, zero-based grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPosition {
    row: usize,
    col: usize,
}

impl GridPosition {
    pub fn new(row: usize, col: usize) -> Result<Self> {
        if row >= ROWS || col >= COLS {
            return Err(KilnError::InvalidPosition(format!("row {} col {}", row, col)));
        }
        Ok(Self { row, col })
    }

    /// Parse a one-based label like "R3C4" (case and spacing are ignored)
    pub fn parse(label: &str) -> Result<Self> {
        let re = Regex::new(r"(?i)^\s*r\s*(\d+)\s*c\s*(\d+)\s*$")
            .map_err(|_| KilnError::InvalidPosition(label.to_string()))?;
        let caps = re
            .captures(label)
            .ok_or_else(|| KilnError::InvalidPosition(label.to_string()))?;
        let row: usize = caps[1]
            .parse()
            .map_err(|_| KilnError::InvalidPosition(label.to_string()))?;
        let col: usize = caps[2]
            .parse()
            .map_err(|_| KilnError::InvalidPosition(label.to_string()))?;
        if row == 0 || col == 0 {
            return Err(KilnError::InvalidPosition(label.to_string()));
        }
        Self::new(row - 1, col - 1).map_err(|_| KilnError::InvalidPosition(label.to_string()))
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }
}

impl std::fmt::Display for GridPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}C{}", self.row + 1, self.col + 1)
    }
}

/// Map a cone status to its display tier. This table is fixed; exported
/// severity summaries depend on it.
pub fn classify(status: ConeStatus) -> SeverityTier {
    match status {
        ConeStatus::Standing => SeverityTier::Low,
        ConeStatus::Soft | ConeStatus::Bending => SeverityTier::Mid,
        ConeStatus::Bent | ConeStatus::Down | ConeStatus::Overfired => SeverityTier::High,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConeCell {
    pub cones: BTreeMap<String, ConeStatus>,
    pub last_updated: Option<NaiveDateTime>,
}

impl ConeCell {
    pub fn is_empty(&self) -> bool {
        self.cones.is_empty()
    }

    /// Mean tier weight across the cell's cones, `None` when empty
    pub fn severity_score(&self) -> Option<f64> {
        if self.cones.is_empty() {
            return None;
        }
        let sum: f64 = self.cones.values().map(|s| classify(*s).weight()).sum();
        Some(sum / self.cones.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridSummary {
    pub positions_tracked: usize,
    pub total_cones: usize,
}

/// Cone count per severity tier across the whole grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts {
    pub low: usize,
    pub mid: usize,
    pub high: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConeGrid {
    cells: [[ConeCell; COLS]; ROWS],
}

impl ConeGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one cone's status in a cell and stamp the cell
    pub fn upsert(&mut self, pos: GridPosition, label: &str, status: ConeStatus, at: NaiveDateTime) {
        let cell = &mut self.cells[pos.row][pos.col];
        cell.cones.insert(label.trim().to_string(), status);
        cell.last_updated = Some(at);
        debug!(position = %pos, cone = label, status = %status, "updated cone");
    }

    /// Drop a single cone from a cell. Returns its last status.
    pub fn remove_cone(&mut self, pos: GridPosition, label: &str, at: NaiveDateTime) -> Option<ConeStatus> {
        let cell = &mut self.cells[pos.row][pos.col];
        let removed = cell.cones.remove(label.trim())?;
        cell.last_updated = Some(at);
        Some(removed)
    }

    /// Reset a cell to empty
    pub fn clear(&mut self, pos: GridPosition) {
        self.cells[pos.row][pos.col] = ConeCell::default();
        debug!(position = %pos, "cleared cone cell");
    }

    pub fn cell(&self, pos: GridPosition) -> &ConeCell {
        &self.cells[pos.row][pos.col]
    }

    /// Non-empty cells in row-major order
    pub fn occupied(&self) -> impl Iterator<Item = (GridPosition, &ConeCell)> {
        self.cells.iter().enumerate().flat_map(|(row, cols)| {
            cols.iter()
                .enumerate()
                .filter(|(_, cell)| !cell.is_empty())
                .map(move |(col, cell)| (GridPosition { row, col }, cell))
        })
    }

    pub fn summary(&self) -> GridSummary {
        self.occupied().fold(GridSummary::default(), |mut acc, (_, cell)| {
            acc.positions_tracked += 1;
            acc.total_cones += cell.cones.len();
            acc
        })
    }

    pub fn tier_counts(&self) -> TierCounts {
        let mut counts = TierCounts::default();
        for (_, cell) in self.occupied() {
            for status in cell.cones.values() {
                match classify(*status) {
                    SeverityTier::Low => counts.low += 1,
                    SeverityTier::Mid => counts.mid += 1,
                    SeverityTier::High => counts.high += 1,
                }
            }
        }
        counts
    }

    /// Weighted severity per position, for heat-map style display
    pub fn severity_overlay(&self) -> [[Option<f64>; COLS]; ROWS] {
        let mut overlay = [[None; COLS]; ROWS];
        for (pos, cell) in self.occupied() {
            overlay[pos.row][pos.col] = cell.severity_score();
        }
        overlay
    }
}
