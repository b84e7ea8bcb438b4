//! On-disk snapshot of the workbook
//!
//! The CLI is one process per command, so the workbook is read from and
//! written back to a JSON snapshot around every mutation. Location can be
//! overridden with the KILNLOG_SESSION_PATH env var.

use crate::error::{KilnError, Result};
use crate::session::FiringWorkbook;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Env var that pins the snapshot file
pub const SESSION_PATH_ENV: &str = "KILNLOG_SESSION_PATH";

/// Snapshot format version
pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub saved_at: DateTime<Utc>,
    pub workbook: FiringWorkbook,
}

/// Get the snapshot path: env var first, then the nearest `.kilnlog` folder
/// up the directory tree, then `.kilnlog/session.json` in the current dir
pub fn default_session_path() -> PathBuf {
    if let Ok(path) = std::env::var(SESSION_PATH_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let mut dir = current_dir.as_path();
        loop {
            let kiln_dir = dir.join(".kilnlog");
            if kiln_dir.is_dir() {
                return kiln_dir.join("session.json");
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
    }

    PathBuf::from(".kilnlog/session.json")
}

/// Reads and writes one snapshot file
#[derive(Debug, Clone)]
pub struct WorkbookStore {
    path: PathBuf,
}

impl WorkbookStore {
    /// Store at the default location (respects KILNLOG_SESSION_PATH)
    pub fn locate() -> Self {
        Self::at(default_session_path())
    }

    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<FiringWorkbook> {
        if !self.exists() {
            return Err(KilnError::NoSession(self.path.clone()));
        }
        let content = std::fs::read_to_string(&self.path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), version = %snapshot.version, "loaded snapshot");
        Ok(snapshot.workbook)
    }

    /// Write the snapshot, creating the parent directory when needed.
    /// The file is replaced through a temporary sibling so a crash mid-write
    /// leaves the previous snapshot intact.
    pub fn save(&self, workbook: &FiringWorkbook) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION.to_string(),
            saved_at: Utc::now(),
            workbook: workbook.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "saved snapshot");
        Ok(())
    }
}
