use crate::test_fixtures::base_content;
use crate::{Customer, CustomerId, CustomerKind, CustomerPhase, GameContent, RunState, Vec2};
use rand::Rng;

mod director_tests;
mod engine_tests;

// --- Shared helpers -----------------------------------------------------

/// Park the spawn timer so scripted scenarios keep a stable population.
pub(crate) fn suppress_spawns(state: &mut RunState) {
    state.spawn_timer_ms = 1e12;
}

/// Insert a regular customer directly in the given phase.
pub(crate) fn add_customer(state: &mut RunState, phase: CustomerPhase, pos: Vec2) -> CustomerId {
    let id = CustomerId(state.counters.next_customer_id);
    state.counters.next_customer_id += 1;
    state.customers.push(Customer {
        id,
        kind: CustomerKind::Regular,
        phase,
        pos,
        patience_ms: 10_000.0,
        patience_max_ms: 10_000.0,
        urgent: false,
        messiness: 0,
        stepped_in_mess: None,
        messy_feet: false,
        prints_left: 0,
        print_timer_ms: 0.0,
        distracted: false,
    });
    id
}

/// Soil a stall with the fixture content's deterministic single-Scrub list.
pub(crate) fn make_dirty(
    state: &mut RunState,
    content: &GameContent,
    rng: &mut impl Rng,
    stall: usize,
) {
    let mut events = Vec::new();
    crate::cleaning::soil_stall(state, content, rng, stall, 0, false, &mut events);
}

pub(crate) fn test_content() -> GameContent {
    base_content()
}
