use serde::{Deserialize, Serialize};

/// Codes whose days count as a full twelve-hour duty.  Deliberately separate
/// from [`classify`]: overtime-parking (`NP1`/`NP2`) is aggregated with day and
/// night shifts but does not add hours.
const FULL_SHIFT_CODES: &[&str] = &["1", "2", "P1", "P2", "N1", "N2"];

/// Broad family a shift code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftCategory {
    Day,
    Night,
    Parking,
    Overtime,
    CriticalAbsence,
    Leave,
    Training,
    Unknown,
}

impl ShiftCategory {
    /// Category used for styling: overtime renders like a day shift and
    /// anything unrecognised renders like a critical absence.
    pub fn display(self) -> Self {
        match self {
            Self::Overtime => Self::Day,
            Self::Unknown => Self::CriticalAbsence,
            other => other,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Night => "night",
            Self::Parking => "parking",
            Self::Overtime => "overtime",
            Self::CriticalAbsence => "critical",
            Self::Leave => "leave",
            Self::Training => "training",
            Self::Unknown => "unknown",
        }
    }
}

/// The closed shift-code vocabulary.
///
/// | Code  | Meaning                       |
/// |-------|-------------------------------|
/// | `1`   | Day shift 06–18               |
/// | `2`   | Night shift 18–06             |
/// | `P1`  | Parking post, day             |
/// | `P2`  | Parking post, night           |
/// | `N1`  | Overtime, day                 |
/// | `N2`  | Overtime, night               |
/// | `NP1` | Overtime on parking, day      |
/// | `NP2` | Overtime on parking, night    |
/// | `X`   | Critical absence              |
/// | `U`   | Leave                         |
/// | `S1`  | Technical training            |
/// | `S2`  | Technical training            |
/// | `ZW`  | Sick leave                    |
/// | `W`   | Weekend off                   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShiftCode {
    Day,
    Night,
    ParkingDay,
    ParkingNight,
    OvertimeDay,
    OvertimeNight,
    OvertimeParkingDay,
    OvertimeParkingNight,
    Absence,
    Leave,
    TrainingS1,
    TrainingS2,
    SickLeave,
    WeekendOff,
}

impl ShiftCode {
    pub const ALL: [ShiftCode; 14] = [
        Self::Day,
        Self::Night,
        Self::ParkingDay,
        Self::ParkingNight,
        Self::OvertimeDay,
        Self::OvertimeNight,
        Self::OvertimeParkingDay,
        Self::OvertimeParkingNight,
        Self::Absence,
        Self::Leave,
        Self::TrainingS1,
        Self::TrainingS2,
        Self::SickLeave,
        Self::WeekendOff,
    ];

    /// Parse a raw cell value.  Surrounding whitespace is ignored and matching
    /// is case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == normalized)
    }

    /// Canonical (upper-case) spelling as stored in documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "1",
            Self::Night => "2",
            Self::ParkingDay => "P1",
            Self::ParkingNight => "P2",
            Self::OvertimeDay => "N1",
            Self::OvertimeNight => "N2",
            Self::OvertimeParkingDay => "NP1",
            Self::OvertimeParkingNight => "NP2",
            Self::Absence => "X",
            Self::Leave => "U",
            Self::TrainingS1 => "S1",
            Self::TrainingS2 => "S2",
            Self::SickLeave => "ZW",
            Self::WeekendOff => "W",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Day => "DAY_06-18",
            Self::Night => "NIGHT_18-06",
            Self::ParkingDay => "PARKING_D1",
            Self::ParkingNight => "PARKING_D2",
            Self::OvertimeDay => "OVERTIME_N1",
            Self::OvertimeNight => "OVERTIME_N2",
            Self::OvertimeParkingDay => "OVERTIME_P1",
            Self::OvertimeParkingNight => "OVERTIME_P2",
            Self::Absence => "ABSENCE_CRITICAL",
            Self::Leave => "LEAVE_GRANTED",
            Self::TrainingS1 | Self::TrainingS2 => "TRAINING_TECH",
            Self::SickLeave => "SICK_LEAVE",
            Self::WeekendOff => "WEEKEND_OFF",
        }
    }

    pub fn category(self) -> ShiftCategory {
        match self {
            Self::Day => ShiftCategory::Day,
            Self::Night => ShiftCategory::Night,
            Self::ParkingDay | Self::ParkingNight => ShiftCategory::Parking,
            Self::OvertimeDay
            | Self::OvertimeNight
            | Self::OvertimeParkingDay
            | Self::OvertimeParkingNight => ShiftCategory::Overtime,
            Self::Absence => ShiftCategory::CriticalAbsence,
            Self::Leave | Self::SickLeave => ShiftCategory::Leave,
            // Only a bare `S` is styled as training.
            Self::TrainingS1 | Self::TrainingS2 | Self::WeekendOff => ShiftCategory::Unknown,
        }
    }
}

impl std::fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify any raw cell value.
///
/// Vocabulary codes go through [`ShiftCode::category`]; anything else falls
/// back to prefix rules (`P…` parking, `N…` overtime, bare `S` training).
pub fn classify(raw: &str) -> ShiftCategory {
    if let Some(code) = ShiftCode::parse(raw) {
        return code.category();
    }

    let code = raw.trim().to_ascii_uppercase();
    if code == "S" {
        ShiftCategory::Training
    } else if code.starts_with('P') {
        ShiftCategory::Parking
    } else if code.starts_with('N') {
        ShiftCategory::Overtime
    } else {
        ShiftCategory::Unknown
    }
}

/// Whether a day with this code contributes twelve duty hours.
pub fn counts_as_full_shift(raw: &str) -> bool {
    let code = raw.to_ascii_uppercase();
    FULL_SHIFT_CODES.contains(&code.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_core_codes() {
        assert_eq!(classify("1"), ShiftCategory::Day);
        assert_eq!(classify("2"), ShiftCategory::Night);
        assert_eq!(classify("p1"), ShiftCategory::Parking);
        assert_eq!(classify("N2"), ShiftCategory::Overtime);
        assert_eq!(classify("np1"), ShiftCategory::Overtime);
        assert_eq!(classify("X"), ShiftCategory::CriticalAbsence);
        assert_eq!(classify("u"), ShiftCategory::Leave);
        assert_eq!(classify("ZW"), ShiftCategory::Leave);
        assert_eq!(classify("S"), ShiftCategory::Training);
        assert_eq!(classify("S1"), ShiftCategory::Unknown);
        assert_eq!(classify("s2"), ShiftCategory::Unknown);
        assert_eq!(classify("S1").display(), ShiftCategory::CriticalAbsence);
        assert_eq!(ShiftCode::TrainingS1.label(), "TRAINING_TECH");
    }

    #[test]
    fn classify_falls_back_to_prefix_rules() {
        assert_eq!(classify("P9"), ShiftCategory::Parking);
        assert_eq!(classify("NX"), ShiftCategory::Overtime);
        assert_eq!(classify("Q"), ShiftCategory::Unknown);
        assert_eq!(classify(""), ShiftCategory::Unknown);
    }

    #[test]
    fn unknown_displays_as_critical_and_overtime_as_day() {
        assert_eq!(classify("??").display(), ShiftCategory::CriticalAbsence);
        assert_eq!(classify("N1").display(), ShiftCategory::Day);
        assert_eq!(classify("2").display(), ShiftCategory::Night);
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(ShiftCode::parse(" zw "), Some(ShiftCode::SickLeave));
        assert_eq!(ShiftCode::parse("np2"), Some(ShiftCode::OvertimeParkingNight));
        assert_eq!(ShiftCode::parse("S"), None);
        assert_eq!(ShiftCode::parse(""), None);
    }

    #[test]
    fn every_code_roundtrips_through_its_spelling() {
        for code in ShiftCode::ALL {
            assert_eq!(ShiftCode::parse(code.as_str()), Some(code));
            assert_eq!(code.to_string(), code.as_str());
        }
    }

    #[test]
    fn full_shift_set_is_exact() {
        for code in ["1", "2", "P1", "P2", "N1", "N2", "p1", "n2"] {
            assert!(counts_as_full_shift(code), "{code} should count");
        }
        for code in ["", "X", "U", "S1", "NP1", "NP2", "ZW", "W", " 1"] {
            assert!(!counts_as_full_shift(code), "{code:?} should not count");
        }
    }
}
