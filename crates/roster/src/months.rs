//! Month segmentation over the day-of-month sequence.
//!
//! There are no real dates in a cycle document, only day numbers.  A day
//! number lower than its predecessor is taken as the first day of a new
//! month.  This is a heuristic: noisy sequences with several decreases in a
//! row simply produce more (shorter) months.

use serde::Serialize;

/// A contiguous, inclusive span of day indices treated as one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthRange {
    pub start: usize,
    pub end: usize,
    pub name: String,
}

impl MonthRange {
    pub fn contains(&self, day_idx: usize) -> bool {
        day_idx >= self.start && day_idx <= self.end
    }

    pub fn day_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Split `days` into month ranges.
///
/// Names come from `months[i]` when present and non-empty; otherwise they are
/// synthesised as `"<stream_label> <i + 1>"`, or just `stream_label` when the
/// whole cycle is a single month.  An empty day sequence yields no ranges.
pub fn segment(days: &[u32], months: Option<&[String]>, stream_label: &str) -> Vec<MonthRange> {
    if days.is_empty() {
        return Vec::new();
    }

    let boundaries: Vec<usize> = (1..days.len())
        .filter(|&i| days[i] < days[i - 1])
        .collect();
    let single_month = boundaries.is_empty();

    let starts = std::iter::once(0).chain(boundaries.iter().copied());
    let ends = boundaries
        .iter()
        .map(|&b| b - 1)
        .chain(std::iter::once(days.len() - 1));

    starts
        .zip(ends)
        .enumerate()
        .map(|(month_idx, (start, end))| {
            let declared = months
                .and_then(|names| names.get(month_idx))
                .filter(|name| !name.is_empty());
            let name = match declared {
                Some(name) => name.clone(),
                None if single_month => stream_label.to_string(),
                None => format!("{stream_label} {}", month_idx + 1),
            };
            MonthRange { start, end, name }
        })
        .collect()
}
