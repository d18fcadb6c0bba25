use anyhow::Result;

use rota_roster::{ShiftCategory, WEEKDAYS, classify, duty_hours, is_weekend};
use rota_runtime::RosterSession;
use rota_sync::ContentStore;

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn run_streams<S: ContentStore>(session: &RosterSession<S>, json: bool) -> Result<()> {
    if json {
        return print_json(session.streams());
    }
    println!("── data streams ─────────────────────────────────────");
    for stream in session.streams() {
        let marker = if stream.file == session.active_path() { "*" } else { " " };
        println!("{marker} {:<12} {:<24} {}", stream.id, stream.label, stream.file);
    }
    if session.streams().iter().all(|s| s.file != session.active_path()) {
        println!("  (active: {})", session.active_path());
    }
    Ok(())
}

pub(crate) fn run_day<S: ContentStore>(session: &RosterSession<S>, json: bool) -> Result<()> {
    let Some(cycle) = session.cycles().cycle() else {
        println!("no document loaded; run `rota pull`");
        return Ok(());
    };
    let idx = session.cycles().current_day();
    let buckets = session.daily_roster();
    if json {
        return print_json(&buckets);
    }

    let day = cycle.meta.days.get(idx).map_or("--".to_string(), u32::to_string);
    let weekday = cycle.meta.weekdays.get(idx).map_or("--", String::as_str);
    let month = session
        .cycles()
        .current_month()
        .map_or(session.stream_label(), |m| m.name.as_str());
    println!("── {month} · day {day} {weekday} (index {idx}) ──────────────────");
    if buckets.is_empty() {
        println!("  nobody on duty");
    }
    for bucket in &buckets {
        println!("{} ({})", bucket.label, bucket.entries.len());
        for entry in &bucket.entries {
            println!(
                "  {:>4}  {:<20} {:<3} {}",
                entry.operator_id,
                entry.name,
                entry.group.as_deref().unwrap_or("-"),
                entry.code
            );
        }
    }
    Ok(())
}

fn cell_marker(code: &str) -> char {
    match classify(code).display() {
        ShiftCategory::Day => ' ',
        ShiftCategory::Night => '~',
        ShiftCategory::Parking => 'p',
        ShiftCategory::Leave => 'u',
        ShiftCategory::Training => 's',
        _ => '!',
    }
}

/// One grid line: identity, one marked cell per day, then the duty-hour total.
fn table_row(id: &str, group: &str, name: &str, shifts: &[String]) -> String {
    let mut row = format!("{id:>4} {group:<2} {name:<18}");
    for code in shifts {
        let marker = if code.trim().is_empty() { ' ' } else { cell_marker(code) };
        row.push_str(&format!("{marker}{code:>4}"));
    }
    row.push_str(&format!("  Σ{}", duty_hours(shifts)));
    row
}

pub(crate) fn run_table<S: ContentStore>(session: &RosterSession<S>) {
    let Some(cycle) = session.cycles().cycle() else {
        println!("no document loaded; run `rota pull`");
        return;
    };
    let current = session.cycles().current_day();

    let mut days = format!("{:<26}", "");
    let mut weekdays = format!("{:<26}", "");
    for (idx, (day, weekday)) in cycle.meta.days.iter().zip(&cycle.meta.weekdays).enumerate() {
        let focus = if idx == current { '>' } else { ' ' };
        days.push_str(&format!("{focus}{day:>4}"));
        let flag = if is_weekend(weekday) { '*' } else { ' ' };
        weekdays.push_str(&format!("{flag}{weekday:>4}"));
    }
    println!("{days}");
    println!("{weekdays}");

    for worker in &cycle.workers {
        let id = worker.id.to_string();
        let group = session
            .groups()
            .resolve(&id)
            .map_or("-", |g| g.key.as_str());
        println!("{}", table_row(&id, group, &worker.name, &worker.shifts));
    }
    println!(
        "mode: {}",
        if session.cycles().is_locked() { "READ_ONLY" } else { "EDIT_MODE" }
    );
}

#[derive(serde::Serialize)]
struct OperatorRow<'a> {
    index: usize,
    operator_id: String,
    name: &'a str,
    group: Option<&'a str>,
}

pub(crate) fn run_operators<S: ContentStore>(session: &RosterSession<S>, query: &str, json: bool) -> Result<()> {
    if session.cycles().cycle().is_none() {
        println!("no document loaded; run `rota pull`");
        return Ok(());
    }
    let rows: Vec<OperatorRow<'_>> = session
        .search_operators(query)
        .into_iter()
        .map(|(index, worker)| {
            let operator_id = worker.id.to_string();
            let group = session.groups().resolve(&operator_id).map(|g| g.key.as_str());
            OperatorRow {
                index,
                operator_id,
                name: &worker.name,
                group,
            }
        })
        .collect();
    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("  no operator matches \"{}\"", query.trim());
    }
    for row in &rows {
        println!(
            "  [{:>2}] {:>4} {:<2} {}",
            row.index,
            row.operator_id,
            row.group.unwrap_or("-"),
            row.name
        );
    }
    Ok(())
}

pub(crate) fn run_operator<S: ContentStore>(session: &RosterSession<S>, index: usize, json: bool) -> Result<()> {
    let Some(stats) = session.operator_stats(index) else {
        println!("no operator at index {index}");
        return Ok(());
    };
    if json {
        return print_json(&stats);
    }

    println!("── operator {} · {} ─────────────────────────────", stats.operator_id, stats.name);
    println!("  group      : {}", stats.group.as_deref().unwrap_or("(none)"));
    println!("  duty hours : {}", stats.duty_hours);
    println!(
        "  cycle opens: {} (offset {})",
        WEEKDAYS.get(stats.calendar_padding).copied().unwrap_or("?"),
        stats.calendar_padding
    );
    for (code, count) in &stats.counts {
        println!("  {code:<5} x{count:<3} {}", classify(code).display().slug());
    }
    Ok(())
}

pub(crate) fn run_fleet<S: ContentStore>(session: &RosterSession<S>, json: bool) -> Result<()> {
    let Some(stats) = session.fleet_stats() else {
        println!("no document loaded; run `rota pull`");
        return Ok(());
    };
    if json {
        return print_json(&stats);
    }
    println!("── fleet ────────────────────────────────────────────");
    println!("  operators    : {}", stats.workers);
    println!("  days         : {}", stats.days);
    println!("  total hours  : {}", stats.total_hours);
    println!("  average/head : {}", stats.average_label());
    Ok(())
}

pub(crate) fn run_groups_list<S: ContentStore>(session: &RosterSession<S>) {
    let theme = session.theme();
    let sorted = session.groups().sorted();
    println!("── group matrix ─────────────────────────────────────");
    for (pos, group) in sorted.iter().enumerate() {
        let upper = sorted
            .get(pos + 1)
            .map_or("∞".to_string(), |next| (next.from - 1).to_string());
        println!(
            "  {:<3} {:>3}..{:<4} {:<9} {}",
            group.key,
            group.from,
            upper,
            group.color(theme),
            group.label
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shifts(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn table_rows_end_with_duty_hours() {
        let row = table_row("3", "D", "Adam", &shifts(&["1", "X", "P1", "2"]));
        assert!(row.ends_with("  Σ36"), "{row}");
        assert!(row.starts_with("   3 D  Adam"));
    }

    #[test]
    fn empty_rows_total_zero() {
        let row = table_row("12", "K", "Cezary", &shifts(&["", "NP2", "S1"]));
        assert!(row.ends_with("  Σ0"), "{row}");
        assert!(row.contains("!  S1"), "technical training is marked critical: {row}");
    }

    #[test]
    fn cell_markers_follow_display_category() {
        assert_eq!(cell_marker("S"), 's');
        assert_eq!(cell_marker("S1"), '!');
        assert_eq!(cell_marker("N2"), ' ');
        assert_eq!(cell_marker("2"), '~');
        assert_eq!(cell_marker("P1"), 'p');
    }
}
