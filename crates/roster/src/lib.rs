//! Roster data model and the views derived from it.
//!
//! Nothing in this crate performs I/O.  Documents arrive already decoded
//! (see `rota-sync`) and every view is recomputed from the in-memory
//! [`CycleStore`] on demand.

pub mod aggregate;
pub mod cycle;
pub mod group;
pub mod months;
pub mod shift;

pub use aggregate::{
    FleetStats, OperatorStats, RosterEntry, ShiftBucket, daily_roster, duty_hours, fleet_stats,
    operator_stats, search_operators,
};
pub use cycle::{
    Cycle, CycleError, CycleMeta, CycleStore, Operator, OperatorId, WEEKDAYS, is_weekend,
    weekday_index,
};
pub use group::{Group, GroupEdit, GroupError, GroupTable, Theme};
pub use months::{MonthRange, segment};
pub use shift::{ShiftCategory, ShiftCode, classify, counts_as_full_shift};
