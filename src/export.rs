//! Tabular exports
//!
//! Every collection projects onto a [`Table`] with a fixed column order, and
//! a table writes itself out as CSV. The projections are pure: they read the
//! workbook as it is right now and never cache anything.

use crate::archive::RawRecord;
use crate::cone_grid::ConeGrid;
use crate::crew::CrewRoster;
use crate::error::Result;
use crate::event_log::{EventLog, LogEntry, SortOrder};
use crate::inventory::WoodInventory;
use crate::model::{self, EntryType};
use crate::session::{FiringSession, FiringWorkbook};
use crate::wood::WoodLog;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const FIRING_LOG_COLUMNS: &[&str] = &[
    "kiln",
    "firing_id",
    "time",
    "logged_by",
    "phase",
    "entry_type",
    "temp_front",
    "temp_middle",
    "temp_back",
    "temp_stack",
    "atmosphere",
    "damper_position",
    "air_intake",
    "fuel_type",
    "flame_color",
    "spy_color",
    "draft_sound",
    "action_taken",
    "notes",
];

/// Appended to the firing log only when some entry carries weather
pub const WEATHER_COLUMNS: &[&str] = &[
    "weather_temperature",
    "weather_humidity",
    "weather_pressure",
    "weather_wind_speed",
    "weather_wind_direction",
    "weather_conditions",
    "weather_source",
];

pub const WOOD_COLUMNS: &[&str] = &[
    "time",
    "logged_by",
    "species",
    "size",
    "quantity",
    "location",
    "notes",
    "firing_id",
];

pub const INVENTORY_COLUMNS: &[&str] = &["species", "cords", "moisture_pct", "location"];

pub const CREW_COLUMNS: &[&str] = &[
    "name",
    "role",
    "shift_start",
    "shift_end",
    "notes",
    "added_by",
    "date",
];

pub const CONE_MAP_COLUMNS: &[&str] = &["position", "cone_number", "status", "last_updated"];

pub const SUMMARY_COLUMNS: &[&str] = &[
    "firing_id",
    "kiln",
    "final_phase",
    "start_time",
    "last_entry",
    "duration_hours",
    "max_temp_front",
    "max_temp_middle",
    "max_temp_back",
    "total_log_entries",
    "total_crew_members",
    "wood_pieces_used",
    "primary_kiln_master",
    "weather_impact_entries",
    "safety_checklist_completed",
    "incidents_logged",
];

/// A header row plus data rows, all as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn with_columns(columns: &[&str]) -> Self {
        Self {
            headers: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)?;
        info!(path = %path.display(), rows = self.rows.len(), "wrote export");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn opt_time(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| model::format_time(&t)).unwrap_or_default()
}

fn opt_num(v: Option<i32>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}

/// Firing log, oldest entry first
pub fn firing_log_table(session: &FiringSession, log: &EventLog) -> Table {
    let with_weather = log.iter().any(|e| e.weather.is_some());
    let mut table = Table::with_columns(FIRING_LOG_COLUMNS);
    if with_weather {
        table.headers.extend(WEATHER_COLUMNS.iter().map(|c| c.to_string()));
    }

    for e in log.sorted_view(SortOrder::Ascending).iter() {
        let mut row = vec![
            session.kiln_name.clone(),
            e.firing_id.clone(),
            model::format_time(&e.timestamp),
            e.logged_by.clone(),
            e.phase.to_string(),
            e.entry_type.to_string(),
            e.temp_front.to_string(),
            e.temp_middle.to_string(),
            e.temp_back.to_string(),
            e.temp_stack.to_string(),
            e.atmosphere.to_string(),
            e.damper_position.to_string(),
            e.air_intake.to_string(),
            e.fuel_type.to_string(),
            e.flame_color.clone(),
            e.spy_color.clone(),
            e.draft_sound.clone(),
            e.action_taken.clone(),
            e.notes.clone(),
        ];
        if with_weather {
            row.extend(weather_cells(e));
        }
        table.rows.push(row);
    }
    table
}

fn weather_cells(entry: &LogEntry) -> Vec<String> {
    match &entry.weather {
        Some(w) => vec![
            w.temperature_f.to_string(),
            w.humidity_pct.to_string(),
            format!("{:.2}", w.pressure_inhg),
            w.wind_speed_mph.to_string(),
            w.wind_direction.clone(),
            w.conditions.clone(),
            w.source.to_string(),
        ],
        None => vec![String::new(); WEATHER_COLUMNS.len()],
    }
}

/// Wood log, oldest entry first
pub fn wood_table(wood: &WoodLog) -> Table {
    let mut table = Table::with_columns(WOOD_COLUMNS);
    table.rows = wood
        .by_time()
        .into_iter()
        .map(|w| {
            vec![
                model::format_time(&w.time),
                w.logged_by.clone(),
                w.species.to_string(),
                w.size.to_string(),
                w.quantity.to_string(),
                w.location.to_string(),
                w.notes.clone(),
                w.firing_id.clone(),
            ]
        })
        .collect();
    table
}

/// Stock on hand, in the order it was recorded
pub fn inventory_table(inventory: &WoodInventory) -> Table {
    let mut table = Table::with_columns(INVENTORY_COLUMNS);
    table.rows = inventory
        .iter()
        .map(|e| {
            vec![
                e.species.clone(),
                e.cords.to_string(),
                e.moisture_pct.to_string(),
                e.location.clone(),
            ]
        })
        .collect();
    table
}

pub fn crew_table(crew: &CrewRoster) -> Table {
    let mut table = Table::with_columns(CREW_COLUMNS);
    table.rows = crew
        .iter()
        .map(|m| {
            vec![
                m.name.clone(),
                m.role.to_string(),
                m.shift_start.format("%H:%M").to_string(),
                m.shift_end
                    .map(|t| t.format("%H:%M").to_string())
                    .unwrap_or_default(),
                m.notes.clone(),
                m.added_by.clone(),
                m.date.format("%Y-%m-%d").to_string(),
            ]
        })
        .collect();
    table
}

/// One row per cone, positions in row-major order
pub fn cone_map_table(grid: &ConeGrid) -> Table {
    let mut table = Table::with_columns(CONE_MAP_COLUMNS);
    for (pos, cell) in grid.occupied() {
        for (label, status) in &cell.cones {
            table.rows.push(vec![
                pos.to_string(),
                label.clone(),
                status.to_string(),
                opt_time(cell.last_updated),
            ]);
        }
    }
    table
}

/// Derived figures for one firing's log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FiringStats {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub max_temp_front: Option<i32>,
    pub max_temp_middle: Option<i32>,
    pub max_temp_back: Option<i32>,
    pub entry_count: usize,
    /// Most frequent author; ties go to whoever appears first
    pub primary_logger: Option<String>,
}

impl FiringStats {
    pub fn from_log(log: &EventLog) -> Self {
        let mut stats = Self::default();
        let mut loggers = LoggerTally::default();
        for e in log.iter() {
            stats.observe_time(Some(e.timestamp));
            stats.observe_temps(Some(e.temp_front), Some(e.temp_middle), Some(e.temp_back));
            loggers.count(&e.logged_by);
            stats.entry_count += 1;
        }
        stats.primary_logger = loggers.mode();
        stats
    }

    /// Same figures from archived rows; unparseable cells are skipped
    pub fn from_records(records: &[RawRecord]) -> Self {
        let mut stats = Self::default();
        let mut loggers = LoggerTally::default();
        for r in records {
            stats.observe_time(r.time());
            stats.observe_temps(r.temp_front(), r.number("temp_middle"), r.number("temp_back"));
            if let Some(by) = r.get("logged_by") {
                loggers.count(by);
            }
            stats.entry_count += 1;
        }
        stats.primary_logger = loggers.mode();
        stats
    }

    fn observe_time(&mut self, ts: Option<NaiveDateTime>) {
        let Some(ts) = ts else { return };
        self.start = Some(self.start.map_or(ts, |s| s.min(ts)));
        self.end = Some(self.end.map_or(ts, |e| e.max(ts)));
    }

    fn observe_temps(&mut self, front: Option<i32>, middle: Option<i32>, back: Option<i32>) {
        fn bump(slot: &mut Option<i32>, v: Option<i32>) {
            if let Some(v) = v {
                *slot = Some(slot.map_or(v, |cur| cur.max(v)));
            }
        }
        bump(&mut self.max_temp_front, front);
        bump(&mut self.max_temp_middle, middle);
        bump(&mut self.max_temp_back, back);
    }

    /// Hours between first and last reading, zero for fewer than two times
    pub fn duration_hours(&self) -> f64 {
        match (self.start, self.end) {
            (Some(s), Some(e)) => (e - s).num_seconds() as f64 / 3600.0,
            _ => 0.0,
        }
    }

    /// Hottest spy-hole reading of the firing
    pub fn peak_temp(&self) -> Option<i32> {
        [self.max_temp_front, self.max_temp_middle, self.max_temp_back]
            .into_iter()
            .flatten()
            .max()
    }
}

#[derive(Default)]
struct LoggerTally {
    order: Vec<String>,
    counts: HashMap<String, usize>,
}

impl LoggerTally {
    /// Blank author cells are not a logger
    fn count(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        let n = self.counts.entry(name.to_string()).or_insert(0);
        if *n == 0 {
            self.order.push(name.to_string());
        }
        *n += 1;
    }

    fn mode(&self) -> Option<String> {
        let mut best: Option<(&String, usize)> = None;
        for name in &self.order {
            let n = self.counts[name];
            let beats = match best {
                Some((_, top)) => n > top,
                None => true,
            };
            if beats {
                best = Some((name, n));
            }
        }
        best.map(|(name, _)| name.clone())
    }
}

/// Single-row overview of the whole firing
pub fn master_summary_table(book: &FiringWorkbook) -> Table {
    let stats = FiringStats::from_log(&book.log);
    let mut table = Table::with_columns(SUMMARY_COLUMNS);
    table.rows.push(vec![
        book.session.firing_id.clone(),
        book.session.kiln_name.clone(),
        book.session.phase.to_string(),
        opt_time(stats.start.or(Some(book.session.started_at))),
        opt_time(stats.end),
        format!("{:.2}", stats.duration_hours()),
        opt_num(stats.max_temp_front),
        opt_num(stats.max_temp_middle),
        opt_num(stats.max_temp_back),
        stats.entry_count.to_string(),
        book.crew.len().to_string(),
        book.wood.summary().total_pieces.to_string(),
        stats.primary_logger.unwrap_or_default(),
        book.log.iter().filter(|e| e.weather.is_some()).count().to_string(),
        book.checklist.completed().to_string(),
        book.log.filter_by_type(EntryType::Incident).count().to_string(),
    ]);
    table
}

/// The exportable streams and the file each one is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    FiringLog,
    Wood,
    Inventory,
    Crew,
    ConeMap,
    Summary,
}

impl ExportKind {
    pub const ALL: &'static [ExportKind] = &[
        ExportKind::FiringLog,
        ExportKind::Wood,
        ExportKind::Inventory,
        ExportKind::Crew,
        ExportKind::ConeMap,
        ExportKind::Summary,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportKind::FiringLog => "firing_log.csv",
            ExportKind::Wood => "wood.csv",
            ExportKind::Inventory => "wood_inventory.csv",
            ExportKind::Crew => "crew.csv",
            ExportKind::ConeMap => "kiln_map.csv",
            ExportKind::Summary => "summary.csv",
        }
    }

    pub fn table(&self, book: &FiringWorkbook) -> Table {
        match self {
            ExportKind::FiringLog => firing_log_table(&book.session, &book.log),
            ExportKind::Wood => wood_table(&book.wood),
            ExportKind::Inventory => inventory_table(&book.inventory),
            ExportKind::Crew => crew_table(&book.crew),
            ExportKind::ConeMap => cone_map_table(&book.cones),
            ExportKind::Summary => master_summary_table(book),
        }
    }
}

/// Write every stream into `dir` under its standard file name
pub fn write_all(dir: &Path, book: &FiringWorkbook) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    ExportKind::ALL
        .iter()
        .map(|kind| {
            let path = dir.join(kind.file_name());
            kind.table(book).save(&path)?;
            Ok(path)
        })
        .collect()
}
