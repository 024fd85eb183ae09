//! `rush_core` — deterministic restroom-shift simulation.
//!
//! No IO, no network. All randomness via the passed-in Rng.

pub(crate) mod cleaning;
pub(crate) mod customers;
pub(crate) mod director;
mod engine;
pub mod layout;
pub(crate) mod mess;
pub mod metrics;
pub mod scoring;
mod types;

pub use engine::{finish_shift, start_shift, tick};
pub use metrics::{compute_metrics, write_metrics_csv, MetricsSnapshot};
pub use scoring::{coins_earned, grade_for, ShiftReport};
pub use types::*;

pub(crate) fn emit(counters: &mut Counters, tick: u64, event: Event) -> EventEnvelope {
    let id = EventId(format!("evt_{:06}", counters.next_event_id));
    counters.next_event_id += 1;
    EventEnvelope { id, tick, event }
}

/// Wrap a player input into an envelope. The host collects envelopes during a
/// frame and hands them to the next `tick` call, so they land atomically at
/// that tick boundary.
pub fn envelope_input(
    counters: &mut Counters,
    current_tick: u64,
    input: PlayerInput,
) -> InputEnvelope {
    let id = InputId(format!("inp_{:06}", counters.next_input_id));
    counters.next_input_id += 1;
    InputEnvelope {
        id,
        issued_tick: current_tick,
        execute_at_tick: current_tick,
        input,
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

#[cfg(test)]
mod tests;
