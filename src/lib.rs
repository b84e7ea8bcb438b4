//! Kilnlog - Wood-firing session log
//!
//! Record a firing as it happens, compare it with past firings, export it all.
//!
//! # Overview
//!
//! A wood firing runs for hours or days with a rotating crew. Kilnlog keeps one
//! firing's records in a [`FiringWorkbook`]: temperature and atmosphere
//! observations, wood burned, who is on shift, and where the cone packs stand.
//! Finished firings go into a [`HistoricalArchive`] so the next firing can ask
//! "when were we last at this temperature?"
//!
//! # Record Streams
//!
//! | Stream | Purpose |
//! |--------|---------|
//! | `log` | Timestamped spy-hole readings, atmosphere, damper, notes |
//! | `wood` | Pieces burned by species, size and firebox |
//! | `wood stock` | Cords on hand by species, moisture and shed |
//! | `crew` | Roster with roles and shift times |
//! | `cones` | 6 x 8 kiln map of cone packs and their status |
//! | `checklist` | Pre-firing safety walk |
//! | `archive` | Past firings as raw rows, for comparison |
//!
//! # Quick Start
//!
//! ```no_run
//! use kilnlog::{FiringSession, FiringWorkbook, HistoricalArchive, WorkbookStore};
//! use kilnlog::matcher::{find_similar, DEFAULT_TOLERANCE_F};
//!
//! let now = chrono::Local::now().naive_local();
//! let mut book = FiringWorkbook::new(FiringSession::new("Ana", "20250314-0600", now));
//!
//! // Log a reading
//! let entry = book.session.draft_entry(now, 1180);
//! book.log.append(entry);
//!
//! // Compare against a firing exported last season
//! let csv = std::fs::read("firing_log.csv").unwrap();
//! let mut archive = HistoricalArchive::new();
//! let id = archive.import_csv(csv.as_slice(), "last-season", now).unwrap();
//! let past = archive.find(&id.to_string()).unwrap();
//! println!("{} similar readings", find_similar(1180, past, DEFAULT_TOLERANCE_F).len());
//!
//! // Persist for the next command
//! WorkbookStore::locate().save(&book).unwrap();
//! ```

pub mod archive;
pub mod checklist;
pub mod cone_grid;
pub mod config;
pub mod crew;
pub mod error;
pub mod event_log;
pub mod export;
pub mod inventory;
pub mod matcher;
pub mod model;
pub mod session;
pub mod store;
pub mod timer;
pub mod weather;
pub mod wood;

pub use archive::{HistoricalArchive, HistoricalFiring, RawRecord};
pub use checklist::SafetyChecklist;
pub use cone_grid::{ConeGrid, GridPosition};
pub use config::Config;
pub use crew::{CrewMember, CrewRoster, NewCrewMember};
pub use error::{KilnError, Result};
pub use event_log::{EntryId, EventLog, LogEntry, LogEntryPatch, NewLogEntry, SortOrder};
pub use export::{ExportKind, FiringStats, Table};
pub use inventory::{NewStockEntry, WoodInventory};
pub use session::{FiringSession, FiringWorkbook};
pub use store::WorkbookStore;
pub use timer::StokeTimer;
pub use weather::{WeatherService, WeatherSnapshot};
pub use wood::{NewWoodEntry, WoodLog};
