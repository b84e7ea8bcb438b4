//! Stoke interval timer
//!
//! Not a scheduled callback. The timer is a deadline; every query compares it
//! with the `now` the caller passes in. The first poll at or after the deadline
//! raises a single alert and clears the deadline.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Raised once when a running timer reaches its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerAlert {
    pub deadline: DateTime<Utc>,
    /// How long past the deadline the poll happened
    pub overdue: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerStatus {
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StokeTimer {
    pub interval_minutes: u32,
    deadline: Option<DateTime<Utc>>,
}

impl Default for StokeTimer {
    fn default() -> Self {
        Self {
            interval_minutes: 7,
            deadline: None,
        }
    }
}

impl StokeTimer {
    pub fn new(interval_minutes: u32) -> Self {
        Self {
            interval_minutes,
            deadline: None,
        }
    }

    /// Arm the timer for `minutes` (or the stored interval) from `now`
    pub fn start(&mut self, now: DateTime<Utc>, minutes: Option<u32>) -> DateTime<Utc> {
        if let Some(m) = minutes {
            self.interval_minutes = m;
        }
        let deadline = now + Duration::minutes(i64::from(self.interval_minutes));
        self.deadline = Some(deadline);
        deadline
    }

    pub fn stop(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn status(&self) -> TimerStatus {
        if self.deadline.is_some() {
            TimerStatus::Running
        } else {
            TimerStatus::Idle
        }
    }

    /// Time left, never negative. `None` when idle.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.deadline
            .map(|deadline| std::cmp::max(deadline - now, Duration::zero()))
    }

    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline.map(|d| now >= d).unwrap_or(false)
    }

    /// One-shot expiry check. Returns the alert the first time the deadline
    /// has passed and disarms the timer; later polls return `None`.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<TimerAlert> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        Some(TimerAlert {
            deadline,
            overdue: now - deadline,
        })
    }

    /// Remaining time as MM:SS, "idle" when not running
    pub fn display(&self, now: DateTime<Utc>) -> String {
        match self.remaining(now) {
            Some(left) => {
                let secs = left.num_seconds();
                format!("{:02}:{:02}", secs / 60, secs % 60)
            }
            None => "idle".to_string(),
        }
    }
}
