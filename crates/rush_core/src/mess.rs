//! Floor messes: puddles, footprints, and their cleanup.

use crate::scoring::{apply_rating, check_milestones};
use crate::{
    emit, Event, EventEnvelope, GameContent, Mess, MessId, MessKind, RunState, Vec2,
};

/// Distance within which a walking customer steps in a mess.
pub(crate) const STEP_IN_RADIUS: f64 = 24.0;

/// Spacing between footprints shed by messy feet.
pub(crate) const PRINT_INTERVAL_MS: f64 = 400.0;
pub(crate) const PRINTS_PER_CUSTOMER: u8 = 3;

pub(crate) fn spawn_mess(
    state: &mut RunState,
    kind: MessKind,
    pos: Vec2,
    events: &mut Vec<EventEnvelope>,
) -> MessId {
    let id = MessId(state.counters.next_mess_id);
    state.counters.next_mess_id += 1;
    state.messes.push(Mess {
        id,
        kind,
        pos,
        cleaning: false,
        progress_ms: 0.0,
    });
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::MessSpawned { mess: id, kind },
    ));
    id
}

/// First tap starts the cleanup, further taps boost it.
pub(crate) fn click_mess(state: &mut RunState, content: &GameContent, id: MessId) {
    let boost = if state.effects.speed_ms > 0.0 {
        content.constants.mess_click_boost_speed_ms
    } else {
        content.constants.mess_click_boost_ms
    };
    if let Some(mess) = state.messes.iter_mut().find(|m| m.id == id) {
        if mess.cleaning {
            mess.progress_ms += boost;
        } else {
            mess.cleaning = true;
            mess.progress_ms = 0.0;
        }
    }
}

/// Advance started cleanups. A finished mess scores, extends the combo, and
/// counts toward milestones like a stall does.
pub(crate) fn advance_messes(
    state: &mut RunState,
    content: &GameContent,
    dt: f64,
    events: &mut Vec<EventEnvelope>,
) {
    let mut finished: Vec<MessId> = Vec::new();
    for mess in &mut state.messes {
        if !mess.cleaning {
            continue;
        }
        mess.progress_ms += dt;
        let def = content.mess_def(mess.kind);
        if mess.progress_ms >= def.clean_time_ms {
            finished.push(mess.id);
        }
    }
    for id in finished {
        let Some(idx) = state.messes.iter().position(|m| m.id == id) else {
            continue;
        };
        let kind = state.messes[idx].kind;
        state.messes.remove(idx);
        let points = content.mess_def(kind).points;
        state.score += points;
        state.combo += 1;
        state.max_combo = state.max_combo.max(state.combo);
        let tick = state.meta.tick;
        events.push(emit(
            &mut state.counters,
            tick,
            Event::MessCleaned { mess: id, points },
        ));
        check_milestones(state, content, events);
    }
}

/// Step-in check for a customer at `pos`. The rating penalty lands once per
/// customer; tracking messes additionally dirty their shoes.
///
/// Returns `(stepped_mess, tracks)` so the caller can update the customer it
/// currently holds.
pub(crate) fn step_in_at(
    state: &mut RunState,
    content: &GameContent,
    pos: Vec2,
    customer: crate::CustomerId,
    events: &mut Vec<EventEnvelope>,
) -> Option<(MessId, bool)> {
    let hit = state
        .messes
        .iter()
        .find(|m| !m.cleaning && m.pos.distance(pos) <= STEP_IN_RADIUS)
        .map(|m| (m.id, content.mess_def(m.kind).tracks))?;
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::SteppedInMess {
            customer,
            mess: hit.0,
        },
    ));
    apply_rating(state, -content.constants.step_in_mess_penalty, events);
    Some(hit)
}
