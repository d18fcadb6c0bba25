//! Read-only roll-ups over a loaded cycle.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cycle::{Cycle, Operator, weekday_index};
use crate::group::GroupTable;
use crate::shift::{ShiftCategory, ShiftCode, classify, counts_as_full_shift};

const HOURS_PER_SHIFT: u32 = 12;
const DAY_BUCKET_CODES: &[&str] = &["1", "N1", "NP1", "P1"];
const NIGHT_BUCKET_CODES: &[&str] = &["2", "N2", "NP2", "P2"];

/// One operator on duty in a bucket.  `code` is the operator's own code for
/// the day, which may differ from the bucket key (`P1` inside bucket `1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub worker_idx: usize,
    pub operator_id: String,
    pub name: String,
    pub code: String,
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftBucket {
    pub key: String,
    pub label: String,
    pub category: ShiftCategory,
    pub entries: Vec<RosterEntry>,
}

fn bucket_key(code: &str) -> &str {
    if DAY_BUCKET_CODES.contains(&code) {
        "1"
    } else if NIGHT_BUCKET_CODES.contains(&code) {
        "2"
    } else {
        code
    }
}

fn bucket_label(key: &str) -> String {
    match key {
        "1" => "DAY_06-18 [+P1]".to_string(),
        "2" => "NIGHT_18-06 [+P2]".to_string(),
        other => match ShiftCode::parse(other) {
            Some(code) => code.label().to_string(),
            None => format!("STATUS_{other}"),
        },
    }
}

/// Group everyone on duty on `day_idx` into shift buckets, ordered by key.
///
/// Day-type codes collapse into bucket `1`, night-type codes into bucket `2`,
/// every other code gets its own bucket.  Operators without a code that day
/// are left out.  An index past the end yields no buckets.
pub fn daily_roster(cycle: &Cycle, groups: &GroupTable, day_idx: usize) -> Vec<ShiftBucket> {
    let mut buckets: BTreeMap<String, Vec<RosterEntry>> = BTreeMap::new();

    for (worker_idx, worker) in cycle.workers.iter().enumerate() {
        let code = worker
            .shifts
            .get(day_idx)
            .map(|raw| raw.trim().to_uppercase())
            .unwrap_or_default();
        if code.is_empty() {
            continue;
        }

        let operator_id = worker.id.to_string();
        let group = groups.resolve(&operator_id).map(|g| g.key.clone());
        buckets
            .entry(bucket_key(&code).to_string())
            .or_default()
            .push(RosterEntry {
                worker_idx,
                operator_id,
                name: worker.name.clone(),
                code,
                group,
            });
    }

    buckets
        .into_iter()
        .map(|(key, entries)| ShiftBucket {
            label: bucket_label(&key),
            category: classify(&key),
            key,
            entries,
        })
        .collect()
}

/// Twelve hours for every full-shift day.
pub fn duty_hours(shifts: &[String]) -> u32 {
    let full_days = shifts.iter().filter(|code| counts_as_full_shift(code)).count() as u32;
    full_days * HOURS_PER_SHIFT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorStats {
    pub operator_id: String,
    pub name: String,
    pub group: Option<String>,
    pub duty_hours: u32,
    /// Occurrences of every non-empty code, keyed by upper-cased code.
    pub counts: BTreeMap<String, usize>,
    /// Empty calendar cells before the first day, from its weekday label
    /// (Monday = 0, unknown labels = 0).
    pub calendar_padding: usize,
}

pub fn operator_stats(cycle: &Cycle, groups: &GroupTable, worker_idx: usize) -> Option<OperatorStats> {
    let worker = cycle.workers.get(worker_idx)?;

    let mut counts = BTreeMap::new();
    for raw in &worker.shifts {
        let code = raw.to_uppercase();
        if !code.is_empty() {
            *counts.entry(code).or_insert(0) += 1;
        }
    }

    let operator_id = worker.id.to_string();
    let calendar_padding = cycle
        .meta
        .weekdays
        .first()
        .and_then(|label| weekday_index(label))
        .unwrap_or(0);

    Some(OperatorStats {
        group: groups.resolve(&operator_id).map(|g| g.key.clone()),
        operator_id,
        name: worker.name.clone(),
        duty_hours: duty_hours(&worker.shifts),
        counts,
        calendar_padding,
    })
}

/// Operators whose name contains `query`, ignoring case, with their
/// position in the cycle.  A blank query matches everyone.
pub fn search_operators<'a>(cycle: &'a Cycle, query: &str) -> Vec<(usize, &'a Operator)> {
    let needle = query.trim().to_lowercase();
    cycle
        .workers
        .iter()
        .enumerate()
        .filter(|(_, worker)| needle.is_empty() || worker.name.to_lowercase().contains(&needle))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetStats {
    pub workers: usize,
    pub days: usize,
    pub total_hours: u32,
    /// `None` when the cycle has no operators.
    pub average_hours: Option<f64>,
}

impl FleetStats {
    /// Average rendered with one decimal, e.g. `"126.0 H"`.
    pub fn average_label(&self) -> String {
        match self.average_hours {
            Some(avg) => format!("{avg:.1} H"),
            None => "n/a".to_string(),
        }
    }
}

pub fn fleet_stats(cycle: &Cycle) -> FleetStats {
    let total_hours: u32 = cycle.workers.iter().map(|w| duty_hours(&w.shifts)).sum();
    let workers = cycle.workers.len();
    FleetStats {
        workers,
        days: cycle.day_count(),
        total_hours,
        average_hours: (workers > 0).then(|| f64::from(total_hours) / workers as f64),
    }
}
