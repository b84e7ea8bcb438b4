//! Similarity matching against archived firings
//!
//! Answers "when was a past firing at the temperature we are at now?" Matching
//! is on the front spy-hole reading only, with a strict tolerance window.

use crate::archive::{HistoricalFiring, RawRecord};
use crate::event_log::EventLog;
use chrono::{Duration, NaiveDateTime};

/// Default half-width of the match window in degrees Fahrenheit
pub const DEFAULT_TOLERANCE_F: i32 = 50;

/// Archived rows whose front temperature is strictly within `tolerance` of
/// `current_temp`, in their original order. Rows without a usable
/// temperature never match.
pub fn find_similar(current_temp: i32, firing: &HistoricalFiring, tolerance: i32) -> Vec<&RawRecord> {
    firing
        .comparable_rows()
        .filter(|(_, t)| (i64::from(*t) - i64::from(current_temp)).abs() < i64::from(tolerance))
        .map(|(row, _)| row)
        .collect()
}

/// One archived reading moved onto the current firing's clock
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPoint {
    pub original: NaiveDateTime,
    pub shifted: NaiveDateTime,
    pub temp_front: Option<i32>,
}

/// An archived firing overlaid on the current one, start to start
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAlignment {
    /// Current start minus archived start
    pub offset: Duration,
    pub points: Vec<AlignedPoint>,
}

/// Shift every parseable archived timestamp so both firings start together.
/// Rows whose time does not parse are left out. `None` when the archived
/// firing has no parseable time at all.
///
/// Computed fresh on every call; nothing is stored on the firing.
pub fn align(current_start: NaiveDateTime, firing: &HistoricalFiring) -> Option<TimeAlignment> {
    let timed: Vec<(NaiveDateTime, &RawRecord)> = firing
        .log_data
        .iter()
        .filter_map(|r| r.time().map(|t| (t, r)))
        .collect();
    let archived_start = timed.iter().map(|(t, _)| *t).min()?;
    let offset = current_start - archived_start;

    let points = timed
        .into_iter()
        .map(|(original, row)| AlignedPoint {
            original,
            shifted: original + offset,
            temp_front: row.temp_front(),
        })
        .collect();

    Some(TimeAlignment { offset, points })
}

/// Everything the compare view shows for one archived firing
#[derive(Debug, Clone)]
pub struct Comparison<'a> {
    /// Latest front reading of the live firing, `None` with an empty log
    pub current_temp: Option<i32>,
    pub matches: Vec<&'a RawRecord>,
    pub alignment: Option<TimeAlignment>,
}

pub fn compare<'a>(log: &EventLog, firing: &'a HistoricalFiring, tolerance: i32) -> Comparison<'a> {
    let current_temp = log.latest().map(|e| e.temp_front);
    let matches = current_temp
        .map(|t| find_similar(t, firing, tolerance))
        .unwrap_or_default();
    let alignment = log.earliest().and_then(|e| align(e.timestamp, firing));
    Comparison {
        current_temp,
        matches,
        alignment,
    }
}
