//! Shift events: rush hour and the health inspector.
//!
//! Both are armed probabilistically at shift start and run off one-shot
//! timers. The inspector is a real agent on the floor; rush hour only bends
//! spawn pacing and litters the walkway.

use rand::Rng;

use crate::layout::{door_pos, move_towards, random_walkway_point, stall_pos};
use crate::mess::spawn_mess;
use crate::scoring::apply_rating;
use crate::{
    emit, Event, EventEnvelope, GameContent, Inspector, InspectorPhase, MessKind, RunState,
    StallState,
};

/// Roll whether this shift gets a rush hour and/or an inspection. The first
/// shift is always quiet.
pub(crate) fn arm_shift_events(state: &mut RunState, content: &GameContent, rng: &mut impl Rng) {
    if state.shift == 0 {
        return;
    }
    let c = &content.constants;
    if rng.gen::<f64>() < c.rush_chance {
        state.rush.timer_ms = rng.gen_range(c.rush_start_min_ms..=c.rush_start_max_ms);
    }
    if rng.gen::<f64>() < c.inspector_chance {
        state.inspector.timer_ms = rng.gen_range(c.inspector_start_min_ms..=c.inspector_start_max_ms);
    }
}

pub(crate) fn update_director(
    state: &mut RunState,
    content: &GameContent,
    rng: &mut impl Rng,
    dt: f64,
    events: &mut Vec<EventEnvelope>,
) {
    update_rush(state, content, rng, dt, events);
    update_inspector(state, content, rng, dt, events);
}

fn update_rush(
    state: &mut RunState,
    content: &GameContent,
    rng: &mut impl Rng,
    dt: f64,
    events: &mut Vec<EventEnvelope>,
) {
    let c = &content.constants;
    if !state.rush.active && state.rush.timer_ms > 0.0 {
        state.rush.timer_ms -= dt;
        if state.rush.timer_ms <= 0.0 {
            state.rush.active = true;
            state.rush.remaining_ms = c.rush_duration_ms;
            let tick = state.meta.tick;
            events.push(emit(&mut state.counters, tick, Event::RushHourStarted));
        }
    }
    if state.rush.active {
        // Foot traffic tracks grime in at a steady per-second rate.
        if rng.gen::<f64>() < c.mess_chances.walkway_random * dt / 1000.0 {
            let kind = if rng.gen::<bool>() {
                MessKind::Water
            } else {
                MessKind::Muddy
            };
            let pos = random_walkway_point(rng);
            spawn_mess(state, kind, pos, events);
        }
        state.rush.remaining_ms -= dt;
        if state.rush.remaining_ms <= 0.0 {
            state.rush.active = false;
            let tick = state.meta.tick;
            events.push(emit(&mut state.counters, tick, Event::RushHourEnded));
        }
    }
}

fn update_inspector(
    state: &mut RunState,
    content: &GameContent,
    _rng: &mut impl Rng,
    dt: f64,
    events: &mut Vec<EventEnvelope>,
) {
    let c = &content.constants;

    if state.inspector.visitor.is_none() && state.inspector.timer_ms > 0.0 {
        state.inspector.timer_ms -= dt;
        if !state.inspector.warned && state.inspector.timer_ms <= c.inspector_lead_ms {
            state.inspector.warned = true;
            let tick = state.meta.tick;
            events.push(emit(&mut state.counters, tick, Event::InspectorWarning));
        }
        if state.inspector.timer_ms <= 0.0 {
            state.inspector.visitor = Some(Inspector {
                pos: door_pos(),
                phase: InspectorPhase::Enter,
                current_stall: 0,
                violations: 0,
                dwell_ms: c.inspector_dwell_ms,
                countdown_ms: c.inspector_verdict_delay_ms,
            });
            let tick = state.meta.tick;
            events.push(emit(&mut state.counters, tick, Event::InspectorArrived));
        }
    }

    let Some(mut visitor) = state.inspector.visitor.take() else {
        return;
    };
    let step = c.walk_speed * c.inspector_speed_mult * dt / 1000.0;
    let stall_count = state.stalls.len();
    let mut gone = false;

    match visitor.phase {
        InspectorPhase::Enter => {
            let (pos, arrived) = move_towards(visitor.pos, stall_pos(0, stall_count), step);
            visitor.pos = pos;
            if arrived {
                visitor.phase = InspectorPhase::Inspect;
                visitor.dwell_ms = c.inspector_dwell_ms;
            }
        }
        InspectorPhase::Inspect => {
            if visitor.current_stall >= stall_count {
                visitor.phase = InspectorPhase::Counting;
            } else {
                let target = stall_pos(visitor.current_stall, stall_count);
                let (pos, arrived) = move_towards(visitor.pos, target, step);
                visitor.pos = pos;
                if arrived {
                    visitor.dwell_ms -= dt;
                    if visitor.dwell_ms <= 0.0 {
                        classify_stall(state, &mut visitor, events);
                        visitor.current_stall += 1;
                        visitor.dwell_ms = c.inspector_dwell_ms;
                        if visitor.current_stall >= stall_count {
                            visitor.phase = InspectorPhase::Counting;
                        }
                    }
                }
            }
        }
        InspectorPhase::Counting => {
            visitor.countdown_ms -= dt;
            if visitor.countdown_ms <= 0.0 {
                deliver_verdict(state, &visitor, content, events);
                visitor.phase = InspectorPhase::Leave;
            }
        }
        InspectorPhase::Leave => {
            let (pos, arrived) = move_towards(visitor.pos, door_pos(), step);
            visitor.pos = pos;
            if arrived {
                gone = true;
                let tick = state.meta.tick;
                events.push(emit(&mut state.counters, tick, Event::InspectorLeft));
            }
        }
    }

    if !gone {
        state.inspector.visitor = Some(visitor);
    }
}

/// Dirty counts against the verdict, empty counts for it. A stall that is
/// occupied or mid-clean is skipped outright.
fn classify_stall(state: &mut RunState, visitor: &mut Inspector, events: &mut Vec<EventEnvelope>) {
    let idx = visitor.current_stall;
    let violation = match state.stalls[idx].state {
        StallState::Dirty => true,
        StallState::Empty => false,
        StallState::Occupied | StallState::Cleaning => return,
    };
    if violation {
        visitor.violations += 1;
    }
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::InspectorCheckedStall {
            stall: idx,
            violation,
        },
    ));
}

fn deliver_verdict(
    state: &mut RunState,
    visitor: &Inspector,
    content: &GameContent,
    events: &mut Vec<EventEnvelope>,
) {
    let c = &content.constants;
    let (rating_delta, bonus) = if visitor.violations == 0 {
        (c.inspector_rating_bonus, c.inspector_bonus_points)
    } else {
        (
            -c.inspector_penalty_per_stall * visitor.violations as f32,
            0,
        )
    };
    state.score += bonus;
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::InspectorVerdict {
            violations: visitor.violations,
            rating_delta,
            bonus_points: bonus,
        },
    ));
    apply_rating(state, rating_delta, events);
}
