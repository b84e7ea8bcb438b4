//! Error type shared by the library modules

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong in kilnlog.
///
/// Edit/delete calls that match nothing are *not* errors; they report `false`
/// and leave the collection untouched. Weather failures never surface here
/// either, the weather service falls back to fixed values instead.
#[derive(Debug, Error)]
pub enum KilnError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An uploaded historical file could not be read as a table
    #[error("Could not import {source_name}: {reason}")]
    MalformedImport { source_name: String, reason: String },

    #[error("Invalid {field} '{value}' (expected one of: {expected})")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: String,
    },

    #[error("{field} {value} is out of range ({range})")]
    OutOfRange {
        field: &'static str,
        value: String,
        range: &'static str,
    },

    #[error("Invalid kiln position '{0}' (expected R1C1 through R6C8)")]
    InvalidPosition(String),

    #[error("No firing session at {}. Run 'kilnlog init' first.", .0.display())]
    NoSession(PathBuf),

    #[error("No archived firing matches '{0}'. Run 'kilnlog archive list' to see archived firings.")]
    ArchiveNotFound(String),
}

pub type Result<T> = std::result::Result<T, KilnError>;
