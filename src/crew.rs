//! Crew board
//!
//! Who is working the firing and when their shift runs.

use crate::event_log::EntryId;
use crate::model::{self, CrewRole};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct NewCrewMember {
    pub name: String,
    pub role: CrewRole,
    pub shift_start: NaiveTime,
    pub shift_end: Option<NaiveTime>,
    pub notes: String,
    pub added_by: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: EntryId,
    pub name: String,
    pub role: CrewRole,
    pub shift_start: NaiveTime,
    pub shift_end: Option<NaiveTime>,
    pub notes: String,
    pub added_by: String,
    pub date: NaiveDate,
}

impl CrewMember {
    /// Whether `time` falls inside this shift. Shifts ending before they start
    /// run past midnight; a shift with no end is open.
    pub fn on_shift_at(&self, time: NaiveTime) -> bool {
        match self.shift_end {
            None => time >= self.shift_start,
            Some(end) if end >= self.shift_start => time >= self.shift_start && time < end,
            Some(end) => time >= self.shift_start || time < end,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewRoster {
    members: Vec<CrewMember>,
    next_id: EntryId,
}

impl Default for CrewRoster {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            next_id: 1,
        }
    }
}

impl CrewRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, member: NewCrewMember) -> EntryId {
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, name = %member.name, role = %member.role, "added crew member");
        self.members.push(CrewMember {
            id,
            name: member.name,
            role: member.role,
            shift_start: model::whole_seconds(member.shift_start),
            shift_end: member.shift_end.map(model::whole_seconds),
            notes: member.notes,
            added_by: member.added_by,
            date: member.date,
        });
        id
    }

    /// Remove the first member with this name and role
    pub fn remove_matching(&mut self, name: &str, role: CrewRole) -> Option<CrewMember> {
        let idx = self
            .members
            .iter()
            .position(|m| m.name == name && m.role == role)?;
        Some(self.members.remove(idx))
    }

    pub fn remove_by_id(&mut self, id: EntryId) -> Option<CrewMember> {
        let idx = self.members.iter().position(|m| m.id == id)?;
        Some(self.members.remove(idx))
    }

    pub fn on_shift_at(&self, time: NaiveTime) -> impl Iterator<Item = &CrewMember> {
        self.members.iter().filter(move |m| m.on_shift_at(time))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CrewMember> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
