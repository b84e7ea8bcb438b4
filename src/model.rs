//! Vocabulary shared by every record stream
//!
//! Every enum here round-trips through the same lowercase snake_case label
//! in snapshots, CSV exports and CLI arguments.

use crate::error::KilnError;
use chrono::{NaiveDateTime, NaiveTime, Timelike};

/// Format used for every timestamp written to a CSV export
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats accepted when reading timestamps back from imported files
const IMPORT_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Format a timestamp the way exports write it
pub fn format_time(ts: &NaiveDateTime) -> String {
    ts.format(TIME_FORMAT).to_string()
}

/// Parse a timestamp from an export or a hand-made spreadsheet.
/// RFC 3339 values keep their wall-clock reading and drop the offset.
pub fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in IMPORT_TIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_local())
}

/// Parse a clock time such as "21:30" or "21:30:00"
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// Drop sub-second precision. Exports write whole seconds, so stored
/// records are kept at the same resolution.
pub fn whole_seconds<T: Timelike + Copy>(t: T) -> T {
    t.with_nanosecond(0).unwrap_or(t)
}

/// Declares a closed set of labels with string conversions in both directions.
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $label)] $variant),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = KilnError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| KilnError::InvalidValue {
                        field: $field,
                        value: s.to_string(),
                        expected: $name::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }
    };
}

labeled_enum! {
    /// Named stage of a firing. Purely descriptive: any phase may follow any other.
    #[derive(Default)]
    pub enum Phase as "phase" {
        #[default]
        Heating => "heating",
        WaterSmoking => "water_smoking",
        Dehydration => "dehydration",
        BodyReduction => "body_reduction",
        GlazeMaturation => "glaze_maturation",
        Flash => "flash",
        Cooling => "cooling",
        Finished => "finished",
    }
}

labeled_enum! {
    /// What kind of observation a log entry records
    pub enum EntryType as "entry type" {
        Observation => "observation",
        Stoke => "stoke",
        DamperChange => "damper_change",
        DoorBrick => "door_brick",
        Problem => "problem",
        Milestone => "milestone",
        ShiftChange => "shift_change",
        Incident => "incident",
        /// Short entry captured from a phone at the kiln
        MobileQuick => "mobile_quick",
    }
}

labeled_enum! {
    pub enum Atmosphere as "atmosphere" {
        Neutral => "neutral",
        LightOxidation => "light_oxidation",
        Oxidation => "oxidation",
        LightReduction => "light_reduction",
        Reduction => "reduction",
        HeavyReduction => "heavy_reduction",
    }
}

labeled_enum! {
    pub enum FuelType as "fuel type" {
        Hardwood => "hardwood",
        Softwood => "softwood",
        Mixed => "mixed",
        Slab => "slab",
        Kindling => "kindling",
        Scrap => "scrap",
    }
}

labeled_enum! {
    pub enum WoodSpecies as "species" {
        Pine => "pine",
        Oak => "oak",
        Ash => "ash",
        Maple => "maple",
        Birch => "birch",
        Cedar => "cedar",
        Fir => "fir",
        Poplar => "poplar",
        Mixed => "mixed",
        Other => "other",
    }
}

labeled_enum! {
    pub enum WoodSize as "size" {
        Kindling => "kindling",
        Small => "small",
        Medium => "medium",
        Large => "large",
        Slab => "slab",
    }
}

labeled_enum! {
    /// Which firebox or port the wood went into
    pub enum StokeLocation as "location" {
        Primary => "primary",
        Secondary => "secondary",
        SideStoke => "side_stoke",
        All => "all",
    }
}

labeled_enum! {
    pub enum CrewRole as "role" {
        Lead => "lead",
        Stoker => "stoker",
        Spotter => "spotter",
        Wood => "wood",
        Float => "float",
    }
}

labeled_enum! {
    /// Observed state of a single pyrometric cone
    pub enum ConeStatus as "cone status" {
        Standing => "standing",
        Soft => "soft",
        Bending => "bending",
        Bent => "bent",
        Down => "down",
        Overfired => "overfired",
    }
}

labeled_enum! {
    /// Three-level display tier a cone status aggregates into
    pub enum SeverityTier as "severity tier" {
        Low => "low",
        Mid => "mid",
        High => "high",
    }
}

labeled_enum! {
    /// Where a weather snapshot's numbers came from
    pub enum WeatherOrigin as "weather source" {
        Live => "live",
        Fallback => "fallback",
    }
}

labeled_enum! {
    /// How a firing ended up in the historical archive
    pub enum ArchiveSource as "archive source" {
        Saved => "saved",
        Imported => "imported",
    }
}

impl SeverityTier {
    /// Weight used when averaging a cell's cones into one overlay score
    pub fn weight(&self) -> f64 {
        match self {
            SeverityTier::Low => 1.0,
            SeverityTier::Mid => 2.0,
            SeverityTier::High => 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for phase in Phase::ALL {
            assert_eq!(phase.as_str().parse::<Phase>().unwrap(), *phase);
        }
        for status in ConeStatus::ALL {
            assert_eq!(status.to_string().parse::<ConeStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn test_from_str_is_forgiving_about_spacing() {
        assert_eq!("Heavy Reduction".parse::<Atmosphere>().unwrap(), Atmosphere::HeavyReduction);
        assert_eq!("side-stoke".parse::<StokeLocation>().unwrap(), StokeLocation::SideStoke);
    }

    #[test]
    fn test_unknown_label_lists_choices() {
        let err = "lava".parse::<Atmosphere>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("atmosphere"));
        assert!(msg.contains("light_reduction"));
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&EntryType::DamperChange).unwrap();
        assert_eq!(json, "\"damper_change\"");
        let back: EntryType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntryType::DamperChange);
    }

    #[test]
    fn test_parse_time_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(21, 30, 0)
            .unwrap();
        assert_eq!(parse_time("2025-03-14 21:30:00"), Some(expected));
        assert_eq!(parse_time("2025-03-14T21:30:00"), Some(expected));
        assert_eq!(parse_time("2025-03-14 21:30"), Some(expected));
        assert_eq!(parse_time("2025-03-14T21:30:00-05:00"), Some(expected));
        assert_eq!(parse_time("not a time"), None);
        assert_eq!(parse_time(""), None);
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("06:00"), NaiveTime::from_hms_opt(6, 0, 0));
        assert_eq!(parse_clock("18:15:30"), NaiveTime::from_hms_opt(18, 15, 30));
        assert_eq!(parse_clock("6pm"), None);
    }

    #[test]
    fn test_whole_seconds_drops_fraction() {
        let ts = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_milli_opt(6, 0, 0, 900)
            .unwrap();
        assert_eq!(whole_seconds(ts), ts.with_nanosecond(0).unwrap());
        assert_eq!(whole_seconds(ts).nanosecond(), 0);
        let clock = NaiveTime::from_hms_milli_opt(18, 15, 30, 250).unwrap();
        assert_eq!(whole_seconds(clock), NaiveTime::from_hms_opt(18, 15, 30).unwrap());
    }
}
