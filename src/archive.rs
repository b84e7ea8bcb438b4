//! Archive of completed firings
//!
//! Past firings are kept as raw rows: (column, text) pairs in file order,
//! exactly as they were exported or imported. Repeated column names are kept. Nothing about their schema is enforced here;
//! readers pull typed values out with the accessors on [`RawRecord`] and skip
//! rows that don't parse.

use crate::error::{KilnError, Result};
use crate::event_log::EventLog;
use crate::export;
use crate::model::{self, ArchiveSource};
use crate::session::FiringSession;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::info;
use uuid::Uuid;

/// Column names accepted for the front spy-hole temperature
const TEMP_FRONT_COLUMNS: &[&str] = &["temp_front", "temp_F"];
/// Column names accepted for the reading time
const TIME_COLUMNS: &[&str] = &["time", "timestamp"];

/// One archived row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub fields: Vec<(String, String)>,
}

impl RawRecord {
    /// Pair a header row with one row of values
    pub fn from_row<H, V>(headers: H, values: V) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        Self {
            fields: headers
                .into_iter()
                .map(Into::into)
                .zip(values.into_iter().map(Into::into))
                .collect(),
        }
    }

    /// Value of the first column with this name
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Every value under this column name, left to right
    pub fn get_all<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Column names in file order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    fn first_of(&self, columns: &[&str]) -> Option<&str> {
        columns
            .iter()
            .find_map(|c| self.get(c))
            .filter(|v| !v.trim().is_empty())
    }

    /// Integer reading from a column; decimals round to the nearest degree
    pub fn number(&self, column: &str) -> Option<i32> {
        parse_reading(self.get(column)?)
    }

    pub fn temp_front(&self) -> Option<i32> {
        parse_reading(self.first_of(TEMP_FRONT_COLUMNS)?)
    }

    pub fn time(&self) -> Option<NaiveDateTime> {
        model::parse_time(self.first_of(TIME_COLUMNS)?)
    }
}

fn parse_reading(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i32>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    if v.is_finite() && v.abs() < f64::from(i32::MAX) {
        Some(v.round() as i32)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalFiring {
    pub archive_id: Uuid,
    pub firing_id: String,
    pub kiln: Option<String>,
    pub source: ArchiveSource,
    pub archived_at: NaiveDateTime,
    pub log_data: Vec<RawRecord>,
}

impl HistoricalFiring {
    /// Rows with a usable front temperature, in original order
    pub fn comparable_rows(&self) -> impl Iterator<Item = (&RawRecord, i32)> {
        self.log_data
            .iter()
            .filter_map(|r| r.temp_front().map(|t| (r, t)))
    }

    pub fn short_id(&self) -> String {
        self.archive_id.to_string()[..8].to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalArchive {
    firings: Vec<HistoricalFiring>,
}

impl HistoricalArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, firing: HistoricalFiring) -> Uuid {
        let id = firing.archive_id;
        info!(archive_id = %id, firing_id = %firing.firing_id, rows = firing.log_data.len(), source = %firing.source, "archived firing");
        self.firings.push(firing);
        id
    }

    /// Archive the live log as it would be exported
    pub fn save_current(&mut self, session: &FiringSession, log: &EventLog, at: NaiveDateTime) -> Uuid {
        let table = export::firing_log_table(session, log);
        let log_data = table
            .rows
            .iter()
            .map(|row| RawRecord::from_row(table.headers.iter().cloned(), row.iter().cloned()))
            .collect();
        self.add(HistoricalFiring {
            archive_id: Uuid::new_v4(),
            firing_id: session.firing_id.clone(),
            kiln: Some(session.kiln_name.clone()),
            source: ArchiveSource::Saved,
            archived_at: at,
            log_data,
        })
    }

    /// Import a firing from CSV. On any parse failure the archive is left
    /// untouched and a `MalformedImport` error names the source.
    pub fn import_csv<R: Read>(&mut self, reader: R, source_name: &str, at: NaiveDateTime) -> Result<Uuid> {
        let firing = parse_firing_csv(reader, source_name, at)?;
        Ok(self.add(firing))
    }

    /// Look up by firing id, or by archive id prefix
    pub fn find(&self, query: &str) -> Option<&HistoricalFiring> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        self.firings
            .iter()
            .rev()
            .find(|f| f.firing_id == query)
            .or_else(|| {
                self.firings
                    .iter()
                    .find(|f| f.archive_id.to_string().starts_with(query))
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoricalFiring> {
        self.firings.iter()
    }

    pub fn len(&self) -> usize {
        self.firings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.firings.is_empty()
    }
}

fn malformed(source_name: &str, reason: impl std::fmt::Display) -> KilnError {
    KilnError::MalformedImport {
        source_name: source_name.to_string(),
        reason: reason.to_string(),
    }
}

/// Read a CSV table into an archived firing. Any column layout is accepted
/// as long as the file is a well-formed table with a header row.
pub fn parse_firing_csv<R: Read>(reader: R, source_name: &str, at: NaiveDateTime) -> Result<HistoricalFiring> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| malformed(source_name, e))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(malformed(source_name, "missing header row"));
    }

    let mut log_data = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| malformed(source_name, format!("row {}: {}", line + 1, e)))?;
        log_data.push(RawRecord::from_row(headers.iter().cloned(), record.iter()));
    }

    let first = log_data.first();
    let firing_id = first
        .and_then(|r| r.get("firing_id"))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| source_name.to_string());
    let kiln = first
        .and_then(|r| r.get("kiln"))
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    Ok(HistoricalFiring {
        archive_id: Uuid::new_v4(),
        firing_id,
        kiln,
        source: ArchiveSource::Imported,
        archived_at: at,
        log_data,
    })
}
