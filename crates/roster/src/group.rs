//! Range-based operator groups.
//!
//! Groups partition the identifier space by their `from` lower bound: a
//! group covers `[from, next_from)` where `next_from` is the `from` of the
//! next group in ascending order, and the highest group is unbounded above.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("unknown group '{0}'")]
    UnknownGroup(String),
    #[error("group '{key}' cannot start at {from}: ranges start at 0")]
    NegativeFrom { key: String, from: i64 },
    #[error("groups '{first}' and '{second}' both start at {from}")]
    DuplicateFrom {
        first: String,
        second: String,
        from: i64,
    },
    #[error("group key '{0}' is defined twice")]
    DuplicateKey(String),
    #[error("invalid group configuration: {0}")]
    Parse(String),
}

/// Active display theme; decides which of a group's colours is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Anything other than `light` is treated as the dark theme.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("light") {
            Self::Light
        } else {
            Self::Dark
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(skip)]
    pub key: String,
    pub from: i64,
    pub label: String,
    pub css_var: String,
    pub color_dark: String,
    pub color_light: String,
    /// Icon URL; empty when the group is shown as a plain label badge.
    pub icon: String,
}

impl Group {
    pub fn color(&self, theme: Theme) -> &str {
        match theme {
            Theme::Dark => &self.color_dark,
            Theme::Light => &self.color_light,
        }
    }
}

/// One row of a group-matrix edit.  `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct GroupEdit {
    pub key: String,
    pub from: Option<i64>,
    pub color_dark: Option<String>,
    pub color_light: Option<String>,
}

/// Saved per-group overrides.  Older saves carried a single `color`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupPatch {
    from: Option<i64>,
    label: Option<String>,
    css_var: Option<String>,
    color_dark: Option<String>,
    color_light: Option<String>,
    color: Option<String>,
    icon: Option<String>,
}

const RANK_3: &str = "https://api.iconify.design/game-icons:rank-3.svg";
const RANK_2: &str = "https://api.iconify.design/game-icons:rank-2.svg";
const RANK_1: &str = "https://api.iconify.design/game-icons:rank-1.svg";

fn default_groups() -> Vec<Group> {
    [
        ("D", 0, "bg-d", "#cc8a28", "#d35400", RANK_3),
        ("S", 5, "bg-s", "#0052cc", "#0056b3", RANK_2),
        ("L", 10, "bg-l", "#5981cc", "#3178c6", RANK_1),
        ("K", 12, "bg-k", "#cc6f44", "#c0392b", RANK_1),
        ("M", 25, "bg-m", "#cccc00", "#b7950b", RANK_1),
        ("Y", 37, "bg-y", "#00cc00", "#196f3d", RANK_1),
    ]
    .into_iter()
    .map(|(key, from, css_var, dark, light, icon)| Group {
        key: key.to_string(),
        from,
        label: key.to_string(),
        css_var: css_var.to_string(),
        color_dark: dark.to_string(),
        color_light: light.to_string(),
        icon: icon.to_string(),
    })
    .collect()
}

/// The configured groups, kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTable {
    groups: Vec<Group>,
}

impl Default for GroupTable {
    fn default() -> Self {
        Self {
            groups: default_groups(),
        }
    }
}

impl GroupTable {
    /// Build a table without validation.  Resolution still works when two
    /// groups share a `from`: the one inserted first wins.
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    /// Merge a saved group matrix over the defaults.  Keys that are not
    /// default groups are ignored; missing fields keep their defaults.
    pub fn from_saved_json(raw: &str) -> Result<Self, GroupError> {
        let saved: BTreeMap<String, GroupPatch> =
            serde_json::from_str(raw).map_err(|err| GroupError::Parse(err.to_string()))?;

        let mut table = Self::default();
        for group in &mut table.groups {
            let Some(patch) = saved.get(&group.key) else {
                continue;
            };
            if let Some(from) = patch.from {
                group.from = from;
            }
            if let Some(label) = non_empty(&patch.label) {
                group.label = label;
            }
            if let Some(css_var) = non_empty(&patch.css_var) {
                group.css_var = css_var;
            }
            if let Some(icon) = patch.icon.clone() {
                group.icon = icon;
            }
            let legacy = non_empty(&patch.color);
            if let Some(dark) = non_empty(&patch.color_dark).or_else(|| legacy.clone()) {
                group.color_dark = dark;
            }
            if let Some(light) = non_empty(&patch.color_light).or(legacy) {
                group.color_light = light;
            }
        }
        Ok(table)
    }

    /// Serialise as a key → settings JSON object, the shape read back by
    /// [`GroupTable::from_saved_json`].
    pub fn to_json(&self) -> Result<String, GroupError> {
        let map: BTreeMap<&str, &Group> = self
            .groups
            .iter()
            .map(|group| (group.key.as_str(), group))
            .collect();
        serde_json::to_string_pretty(&map).map_err(|err| GroupError::Parse(err.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.key == key)
    }

    /// Groups in ascending `from` order.  Recomputed on every call since
    /// bounds are editable at runtime.
    pub fn sorted(&self) -> Vec<&Group> {
        let mut sorted: Vec<&Group> = self.groups.iter().collect();
        sorted.sort_by_key(|group| group.from);
        sorted
    }

    /// Find the group whose range contains the operator's numeric id.
    ///
    /// The id is read like a lenient integer parse: leading whitespace and a
    /// sign are accepted and parsing stops at the first non-digit, so `"12a"`
    /// resolves as 12, and an id too large for `i64` lands in the top range.
    /// Returns `None` when no digits lead the id.
    pub fn resolve(&self, operator_id: &str) -> Option<&Group> {
        let id = parse_leading_int(operator_id)?;
        let sorted = self.sorted();

        for (idx, group) in sorted.iter().enumerate() {
            let next_from = sorted.get(idx + 1).map(|next| next.from);
            let below_next = next_from.is_none_or(|next| id < next);
            if id >= group.from && below_next {
                return Some(group);
            }
        }
        None
    }

    /// Check the partition invariants: unique keys, non-negative and
    /// pairwise distinct `from` values.
    pub fn validate(&self) -> Result<(), GroupError> {
        for (idx, group) in self.groups.iter().enumerate() {
            if group.from < 0 {
                return Err(GroupError::NegativeFrom {
                    key: group.key.clone(),
                    from: group.from,
                });
            }
            for earlier in &self.groups[..idx] {
                if earlier.key == group.key {
                    return Err(GroupError::DuplicateKey(group.key.clone()));
                }
                if earlier.from == group.from {
                    return Err(GroupError::DuplicateFrom {
                        first: earlier.key.clone(),
                        second: group.key.clone(),
                        from: group.from,
                    });
                }
            }
        }
        Ok(())
    }

    /// Apply a group-matrix edit atomically: either every row applies and
    /// the result validates, or the table is left untouched.
    pub fn apply_edits(&mut self, edits: &[GroupEdit]) -> Result<(), GroupError> {
        let mut candidate = self.clone();
        for edit in edits {
            let group = candidate
                .groups
                .iter_mut()
                .find(|group| group.key == edit.key)
                .ok_or_else(|| GroupError::UnknownGroup(edit.key.clone()))?;
            if let Some(from) = edit.from {
                group.from = from;
            }
            if let Some(dark) = &edit.color_dark {
                group.color_dark = dark.clone();
            }
            if let Some(light) = &edit.color_light {
                group.color_light = light.clone();
            }
        }
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    pub fn set_from(&mut self, key: &str, from: i64) -> Result<(), GroupError> {
        self.apply_edits(&[GroupEdit {
            key: key.to_string(),
            from: Some(from),
            ..Default::default()
        }])
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Overlong digit runs saturate instead of failing.
    let value = digits[..end].bytes().fold(0i64, |acc, digit| {
        let digit = i64::from(digit - b'0');
        if negative {
            acc.saturating_mul(10).saturating_sub(digit)
        } else {
            acc.saturating_mul(10).saturating_add(digit)
        }
    });
    Some(value)
}
