use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::months::{MonthRange, segment};

/// Weekday labels in week order, Monday first.
pub const WEEKDAYS: [&str; 7] = ["PN", "WT", "ŚR", "CZ", "PT", "SO", "ND"];

/// Position of a weekday label in [`WEEKDAYS`].
pub fn weekday_index(label: &str) -> Option<usize> {
    WEEKDAYS.iter().position(|day| *day == label)
}

pub fn is_weekend(label: &str) -> bool {
    matches!(label, "SO" | "ND")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CycleError {
    #[error("roster is read-only; unlock it before editing")]
    ReadOnly,
    #[error("operator index {idx} out of range ({len} operators)")]
    WorkerOutOfRange { idx: usize, len: usize },
    #[error("day index {idx} out of range ({len} days)")]
    DayOutOfRange { idx: usize, len: usize },
    #[error("{field} has {found} entries but the cycle has {expected} days")]
    LengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },
    #[error("day {value} at index {idx} is not a day of month")]
    InvalidDay { idx: usize, value: u32 },
    #[error("end of data stream: no month {target} (cycle has {months})")]
    MonthBoundary { target: isize, months: usize },
}

/// Operator identifiers are numeric-like but documents carry them either as
/// JSON numbers or strings.  The original representation is kept so a
/// pushed document differs from the pulled one only where it was edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperatorId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for OperatorId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
    /// One raw code per cycle day; empty strings are unassigned days.
    #[serde(default)]
    pub shifts: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Day numbers are written by hand as often as by tools, so `"7"` is
/// accepted next to `7`.
#[derive(Deserialize)]
#[serde(untagged)]
enum DayNumber {
    Number(u32),
    Text(String),
}

fn lenient_days<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u32>, D::Error> {
    Vec::<DayNumber>::deserialize(deserializer)?
        .into_iter()
        .map(|day| match day {
            DayNumber::Number(n) => Ok(n),
            DayNumber::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid day number '{text}'"))),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleMeta {
    #[serde(deserialize_with = "lenient_days")]
    pub days: Vec<u32>,
    pub weekdays: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One roster period: the document that is pulled, edited and pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub meta: CycleMeta,
    pub workers: Vec<Operator>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cycle {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Stable two-space indented rendering used for pushes and the cache.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn day_count(&self) -> usize {
        self.meta.days.len()
    }

    /// Check that weekdays and every operator's shifts line up with `days`.
    pub fn validate(&self) -> Result<(), CycleError> {
        let expected = self.meta.days.len();
        if self.meta.weekdays.len() != expected {
            return Err(CycleError::LengthMismatch {
                field: "meta.weekdays".to_string(),
                expected,
                found: self.meta.weekdays.len(),
            });
        }
        if let Some((idx, &value)) = self
            .meta
            .days
            .iter()
            .enumerate()
            .find(|(_, day)| !(1..=31).contains(*day))
        {
            return Err(CycleError::InvalidDay { idx, value });
        }
        for worker in &self.workers {
            if worker.shifts.len() != expected {
                return Err(CycleError::LengthMismatch {
                    field: format!("shifts of operator {}", worker.id),
                    expected,
                    found: worker.shifts.len(),
                });
            }
        }
        Ok(())
    }
}

/// The live document plus the navigation and edit state around it.
#[derive(Debug)]
pub struct CycleStore {
    cycle: Option<Cycle>,
    /// Content hash of the remote version this document was pulled from (or
    /// last pushed as).  `None` until the first successful transfer.
    revision: Option<String>,
    months: Vec<MonthRange>,
    current_day: usize,
    locked: bool,
}

impl Default for CycleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStore {
    /// An empty, read-only store.
    pub fn new() -> Self {
        Self {
            cycle: None,
            revision: None,
            months: Vec::new(),
            current_day: 0,
            locked: true,
        }
    }

    /// Replace the document and its revision, then re-segment months.
    ///
    /// An invalid document is rejected and the previous state kept.
    pub fn load(
        &mut self,
        cycle: Cycle,
        revision: Option<String>,
        stream_label: &str,
    ) -> Result<(), CycleError> {
        cycle.validate()?;
        if self.current_day >= cycle.day_count() {
            self.current_day = 0;
        }
        self.cycle = Some(cycle);
        self.revision = revision;
        self.resegment(stream_label);
        Ok(())
    }

    /// Drop the document and revision.  Used when switching streams.
    pub fn clear(&mut self) {
        self.cycle = None;
        self.revision = None;
        self.months.clear();
        self.current_day = 0;
    }

    /// Recompute month ranges.  Needed whenever the document is replaced or
    /// the stream label used for synthesised names changes.
    pub fn resegment(&mut self, stream_label: &str) {
        self.months = match &self.cycle {
            Some(cycle) => segment(&cycle.meta.days, cycle.meta.months.as_deref(), stream_label),
            None => Vec::new(),
        };
    }

    pub fn cycle(&self) -> Option<&Cycle> {
        self.cycle.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.cycle.is_some()
    }

    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    pub fn set_revision(&mut self, revision: impl Into<String>) {
        self.revision = Some(revision.into());
    }

    pub fn months(&self) -> &[MonthRange] {
        &self.months
    }

    pub fn current_day(&self) -> usize {
        self.current_day
    }

    pub fn current_month(&self) -> Option<&MonthRange> {
        self.months.iter().find(|m| m.contains(self.current_day))
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Flip the edit lock and return the new state (`true` = read-only).
    pub fn toggle_lock(&mut self) -> bool {
        self.locked = !self.locked;
        self.locked
    }

    /// Store `raw` upper-cased into one cell.
    ///
    /// Returns `Ok(false)` without doing anything when no document is loaded
    /// and `Ok(true)` when the cell was written.  Callers persist the cache
    /// after every `Ok(true)`.
    pub fn set_shift(&mut self, worker_idx: usize, day_idx: usize, raw: &str) -> Result<bool, CycleError> {
        let locked = self.locked;
        let Some(cycle) = self.cycle.as_mut() else {
            return Ok(false);
        };
        if locked {
            return Err(CycleError::ReadOnly);
        }

        let worker_count = cycle.workers.len();
        let worker = cycle
            .workers
            .get_mut(worker_idx)
            .ok_or(CycleError::WorkerOutOfRange {
                idx: worker_idx,
                len: worker_count,
            })?;
        let day_count = worker.shifts.len();
        let cell = worker
            .shifts
            .get_mut(day_idx)
            .ok_or(CycleError::DayOutOfRange {
                idx: day_idx,
                len: day_count,
            })?;
        *cell = raw.to_uppercase();
        Ok(true)
    }

    /// Move the current day by `delta`.  Moves that would leave the cycle are
    /// ignored; returns whether the day changed.
    pub fn step_day(&mut self, delta: isize) -> bool {
        let Some(cycle) = &self.cycle else {
            return false;
        };
        match self.current_day.checked_add_signed(delta) {
            Some(target) if target < cycle.day_count() => {
                self.current_day = target;
                true
            }
            _ => false,
        }
    }

    /// Jump to the first day of the month `delta` months away.
    ///
    /// `Ok(false)` when nothing is loaded; a target outside the cycle is a
    /// [`CycleError::MonthBoundary`] and leaves the current day unchanged.
    /// A current day past the end (see [`Self::jump_to_day`]) belongs to no
    /// month and reports [`CycleError::DayOutOfRange`].
    pub fn step_month(&mut self, delta: isize) -> Result<bool, CycleError> {
        if self.cycle.is_none() {
            return Ok(false);
        }
        let Some(month_idx) = self.months.iter().position(|m| m.contains(self.current_day)) else {
            return Err(CycleError::DayOutOfRange {
                idx: self.current_day,
                len: self.cycle.as_ref().map_or(0, Cycle::day_count),
            });
        };

        let target = month_idx as isize + delta;
        match usize::try_from(target).ok().and_then(|t| self.months.get(t)) {
            Some(month) => {
                self.current_day = month.start;
                Ok(true)
            }
            None => Err(CycleError::MonthBoundary {
                target,
                months: self.months.len(),
            }),
        }
    }

    /// Set the current day directly.  No bounds check: views treat an index
    /// past the end as an empty day.
    pub fn jump_to_day(&mut self, day_idx: usize) {
        self.current_day = day_idx;
    }

    /// Focus the first day whose day-of-month matches, or the first day.
    pub fn focus_day_of_month(&mut self, day_of_month: u32) {
        self.current_day = self
            .cycle
            .as_ref()
            .and_then(|cycle| cycle.meta.days.iter().position(|&d| d == day_of_month))
            .unwrap_or(0);
    }
}
