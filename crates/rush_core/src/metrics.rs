//! Snapshot metrics computed from `RunState`.
//!
//! A single `compute_metrics(&RunState) -> MetricsSnapshot` function samples
//! the current state for time-series analysis. No state mutation, no IO.

use crate::{CustomerPhase, RunState, StallState};
use serde::Serialize;
use std::io::Write;

/// Current schema version — bump when fields are added/removed/reordered.
const METRICS_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub tick: u64,
    pub metrics_version: u32,

    pub shift: u32,
    pub time_left_ms: f64,
    pub score: u64,
    pub rating: f32,
    pub combo: u32,
    pub max_combo: u32,
    pub coins: u64,

    // Stall occupancy
    pub stalls_total: u32,
    pub stalls_empty: u32,
    pub stalls_occupied: u32,
    pub stalls_dirty: u32,
    pub stalls_cleaning: u32,

    // Floor population
    pub customers_active: u32,
    pub customers_seeking: u32,
    pub customers_in_stall: u32,
    pub customers_washing: u32,
    pub avg_patience_pct: f32,

    // Hygiene
    pub sinks_dirty: u32,
    pub messes_on_floor: u32,
    pub towels_remaining: u32,

    // Shift tallies
    pub served: u32,
    pub cleaned: u32,
    pub dirty_incidents: u32,
    pub abandoned: u32,
    pub saves: u32,

    // Events
    pub rush_active: bool,
    pub inspector_present: bool,
}

#[allow(clippy::cast_possible_truncation)]
pub fn compute_metrics(state: &RunState) -> MetricsSnapshot {
    let mut stalls_empty = 0_u32;
    let mut stalls_occupied = 0_u32;
    let mut stalls_dirty = 0_u32;
    let mut stalls_cleaning = 0_u32;
    for stall in &state.stalls {
        match stall.state {
            StallState::Empty => stalls_empty += 1,
            StallState::Occupied => stalls_occupied += 1,
            StallState::Dirty => stalls_dirty += 1,
            StallState::Cleaning => stalls_cleaning += 1,
        }
    }

    let mut customers_seeking = 0_u32;
    let mut customers_in_stall = 0_u32;
    let mut customers_washing = 0_u32;
    let mut patience_pct_sum = 0.0_f32;
    for cu in &state.customers {
        match cu.phase {
            CustomerPhase::SeekStall => customers_seeking += 1,
            CustomerPhase::InStall { .. } => customers_in_stall += 1,
            CustomerPhase::Washing { .. } => customers_washing += 1,
            _ => {}
        }
        if cu.patience_max_ms > 0.0 {
            patience_pct_sum += (cu.patience_ms / cu.patience_max_ms) as f32;
        }
    }
    let avg_patience_pct = if state.customers.is_empty() {
        0.0
    } else {
        patience_pct_sum / state.customers.len() as f32
    };

    MetricsSnapshot {
        tick: state.meta.tick,
        metrics_version: METRICS_VERSION,
        shift: state.shift as u32,
        time_left_ms: state.time_left_ms,
        score: state.score,
        rating: state.rating,
        combo: state.combo,
        max_combo: state.max_combo,
        coins: state.coins,
        stalls_total: state.stalls.len() as u32,
        stalls_empty,
        stalls_occupied,
        stalls_dirty,
        stalls_cleaning,
        customers_active: state.customers.len() as u32,
        customers_seeking,
        customers_in_stall,
        customers_washing,
        avg_patience_pct,
        sinks_dirty: state.sinks.iter().filter(|s| s.dirty).count() as u32,
        messes_on_floor: state.messes.len() as u32,
        towels_remaining: state.towels,
        served: state.stats.served,
        cleaned: state.stats.cleaned,
        dirty_incidents: state.stats.dirty,
        abandoned: state.stats.abandoned,
        saves: state.stats.saves,
        rush_active: state.rush.active,
        inspector_present: state.inspector.visitor.is_some(),
    }
}

/// Write the CSV header row for metrics.
pub fn write_metrics_header(writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(
        writer,
        "tick,metrics_version,shift,time_left_ms,score,rating,combo,max_combo,coins,\
         stalls_total,stalls_empty,stalls_occupied,stalls_dirty,stalls_cleaning,\
         customers_active,customers_seeking,customers_in_stall,customers_washing,\
         avg_patience_pct,sinks_dirty,messes_on_floor,towels_remaining,\
         served,cleaned,dirty_incidents,abandoned,saves,rush_active,inspector_present"
    )
}

/// Append a single metrics snapshot as a CSV row.
pub fn append_metrics_row(writer: &mut impl Write, snapshot: &MetricsSnapshot) -> std::io::Result<()> {
    writeln!(
        writer,
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        snapshot.tick,
        snapshot.metrics_version,
        snapshot.shift,
        snapshot.time_left_ms,
        snapshot.score,
        snapshot.rating,
        snapshot.combo,
        snapshot.max_combo,
        snapshot.coins,
        snapshot.stalls_total,
        snapshot.stalls_empty,
        snapshot.stalls_occupied,
        snapshot.stalls_dirty,
        snapshot.stalls_cleaning,
        snapshot.customers_active,
        snapshot.customers_seeking,
        snapshot.customers_in_stall,
        snapshot.customers_washing,
        snapshot.avg_patience_pct,
        snapshot.sinks_dirty,
        snapshot.messes_on_floor,
        snapshot.towels_remaining,
        snapshot.served,
        snapshot.cleaned,
        snapshot.dirty_incidents,
        snapshot.abandoned,
        snapshot.saves,
        snapshot.rush_active,
        snapshot.inspector_present,
    )
}

/// Write a collection of snapshots to a CSV file.
pub fn write_metrics_csv(path: &str, snapshots: &[MetricsSnapshot]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_metrics_header(&mut file)?;
    for snapshot in snapshots {
        append_metrics_row(&mut file, snapshot)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{base_content, base_state};

    #[test]
    fn test_fresh_state_counts() {
        let content = base_content();
        let state = base_state(&content);
        let snapshot = compute_metrics(&state);

        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.metrics_version, METRICS_VERSION);
        assert_eq!(snapshot.stalls_total, state.stalls.len() as u32);
        assert_eq!(snapshot.stalls_empty, snapshot.stalls_total);
        assert_eq!(snapshot.customers_active, 0);
        assert_eq!(snapshot.avg_patience_pct, 0.0);
        assert_eq!(snapshot.messes_on_floor, 0);
        assert!(!snapshot.rush_active);
        assert!(!snapshot.inspector_present);
    }

    #[test]
    fn test_stall_state_breakdown() {
        let content = base_content();
        let mut state = base_state(&content);
        state.stalls[0].state = crate::StallState::Dirty;
        state.stalls[1].state = crate::StallState::Occupied;

        let snapshot = compute_metrics(&state);

        assert_eq!(snapshot.stalls_dirty, 1);
        assert_eq!(snapshot.stalls_occupied, 1);
        assert_eq!(
            snapshot.stalls_empty,
            snapshot.stalls_total - 2,
            "remaining stalls should be counted empty"
        );
    }

    #[test]
    fn test_csv_row_matches_header_width() {
        let content = base_content();
        let state = base_state(&content);
        let snapshot = compute_metrics(&state);

        let mut header = Vec::new();
        let mut row = Vec::new();
        write_metrics_header(&mut header).unwrap();
        append_metrics_row(&mut row, &snapshot).unwrap();

        let header_cols = String::from_utf8(header).unwrap().trim().split(',').count();
        let row_cols = String::from_utf8(row).unwrap().trim().split(',').count();
        assert_eq!(header_cols, row_cols, "CSV header and row must align");
    }
}
