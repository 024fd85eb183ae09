use rand::Rng;

use crate::cleaning::{
    advance_cleaning, advance_sinks, begin_stall_cleaning, click_boost_ms, instant_clean_stall,
};
use crate::customers::{spawn_customers, sweep_stale_reservations, update_customers};
use crate::director::update_director;
use crate::mess::advance_messes;
use crate::{
    emit, Event, EventEnvelope, GameContent, InputEnvelope, PlayerInput, PowerupKind, RunOutcome,
    RunState, Sink, Stall, StallState,
};

/// Advance the simulation by one frame.
///
/// Order of operations:
/// 1. Apply inputs queued for this tick.
/// 2. Run the event director (rush hour, inspector).
/// 3. Spawn customers.
/// 4. Advance the focused cleaning job, sinks, and floor messes.
/// 5. Step every customer agent (reservation sweep first).
/// 6. Decay effect timers and the shift clock, then check terminal state.
///
/// `dt_ms` is wall-clock time since the previous frame, clamped to
/// `constants.max_frame_ms`. A paused host simply stops calling `tick`.
/// Once `state.outcome` is set the function is a no-op.
///
/// Returns all events produced this frame.
pub fn tick(
    state: &mut RunState,
    inputs: &[InputEnvelope],
    content: &GameContent,
    rng: &mut impl Rng,
    dt_ms: f64,
) -> Vec<EventEnvelope> {
    let mut events = Vec::new();
    if state.outcome.is_some() {
        return events;
    }
    let dt = dt_ms.min(content.constants.max_frame_ms).max(0.0);

    apply_inputs(state, inputs, content, &mut events);
    update_director(state, content, rng, dt, &mut events);
    spawn_customers(state, content, rng, dt, &mut events);
    advance_cleaning(state, content, dt, &mut events);
    advance_sinks(state, content, dt, &mut events);
    advance_messes(state, content, dt, &mut events);
    sweep_stale_reservations(state);
    update_customers(state, content, rng, dt, &mut events);
    decay_effects(state, dt);
    advance_clock(state, dt, &mut events);

    state.meta.tick += 1;
    events
}

fn apply_inputs(
    state: &mut RunState,
    inputs: &[InputEnvelope],
    content: &GameContent,
    events: &mut Vec<EventEnvelope>,
) {
    let current_tick = state.meta.tick;
    for envelope in inputs {
        if envelope.execute_at_tick > current_tick {
            continue;
        }
        match &envelope.input {
            PlayerInput::ClickStall { stall } => click_stall(state, content, *stall, events),
            PlayerInput::ClickTask { stall, task } => {
                click_task(state, content, *stall, *task, events);
            }
            PlayerInput::ClickSink { sink } => click_sink(state, *sink),
            PlayerInput::ClickMess { mess } => {
                crate::mess::click_mess(state, content, *mess);
            }
            PlayerInput::RestockTowels => restock_towels(state, content, events),
            PlayerInput::UsePowerup { kind } => use_powerup(state, content, *kind, events),
        }
    }
}

fn click_stall(
    state: &mut RunState,
    content: &GameContent,
    stall_idx: usize,
    events: &mut Vec<EventEnvelope>,
) {
    let Some(stall) = state.stalls.get(stall_idx) else {
        return;
    };
    match stall.state {
        StallState::Dirty => begin_stall_cleaning(state, stall_idx, events),
        StallState::Cleaning => {
            if state.cleaning.active_stall == Some(stall_idx) {
                state.cleaning.progress_ms += click_boost_ms(content, &state.effects);
            } else {
                // Switch focus; progress on the old job is lost.
                state.cleaning.active_stall = Some(stall_idx);
                state.cleaning.active_task = first_open_task(&state.stalls[stall_idx]);
                state.cleaning.progress_ms = 0.0;
            }
        }
        StallState::Empty | StallState::Occupied => {}
    }
}

fn click_task(
    state: &mut RunState,
    content: &GameContent,
    stall_idx: usize,
    task_idx: usize,
    events: &mut Vec<EventEnvelope>,
) {
    let Some(stall) = state.stalls.get(stall_idx) else {
        return;
    };
    if stall.state == StallState::Dirty {
        begin_stall_cleaning(state, stall_idx, events);
    }
    let stall = &state.stalls[stall_idx];
    if stall.state != StallState::Cleaning {
        return;
    }
    match stall.tasks.get(task_idx) {
        Some(item) if !item.done => {}
        _ => return,
    }
    let focused =
        state.cleaning.active_stall == Some(stall_idx) && state.cleaning.active_task == Some(task_idx);
    if focused {
        state.cleaning.progress_ms += click_boost_ms(content, &state.effects);
    } else {
        state.cleaning.active_stall = Some(stall_idx);
        state.cleaning.active_task = Some(task_idx);
        state.cleaning.progress_ms = 0.0;
    }
}

fn click_sink(state: &mut RunState, sink_idx: usize) {
    if let Some(sink) = state.sinks.get_mut(sink_idx) {
        if sink.dirty && !sink.cleaning {
            sink.cleaning = true;
            sink.progress_ms = 0.0;
        }
    }
}

fn restock_towels(state: &mut RunState, content: &GameContent, events: &mut Vec<EventEnvelope>) {
    if state.towels >= content.constants.towel_capacity {
        return;
    }
    state.towels = content.constants.towel_capacity;
    state.score += content.constants.restock_points;
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::TowelsRestocked {
            points: content.constants.restock_points,
        },
    ));
}

fn use_powerup(
    state: &mut RunState,
    content: &GameContent,
    kind: PowerupKind,
    events: &mut Vec<EventEnvelope>,
) {
    let stock = match kind {
        PowerupKind::Speed => &mut state.powerups.speed,
        PowerupKind::Slow => &mut state.powerups.slow,
        PowerupKind::Auto => &mut state.powerups.auto,
        PowerupKind::Mascot => &mut state.powerups.mascot,
    };
    if *stock == 0 {
        return;
    }
    let duration = content.item_def(kind).map_or(0.0, |i| i.duration_ms);
    match kind {
        PowerupKind::Speed => state.effects.speed_ms = duration,
        PowerupKind::Slow => state.effects.slow_ms = duration,
        PowerupKind::Mascot => {
            state.effects.mascot_ms = duration;
        }
        PowerupKind::Auto => {
            // Needs a target; without one the powerup is not consumed.
            let Some(target) = state
                .stalls
                .iter()
                .position(|s| s.state == StallState::Dirty)
            else {
                return;
            };
            instant_clean_stall(state, content, target, events);
        }
    }
    // Re-borrow: instant_clean_stall needed the whole state.
    let stock = match kind {
        PowerupKind::Speed => &mut state.powerups.speed,
        PowerupKind::Slow => &mut state.powerups.slow,
        PowerupKind::Auto => &mut state.powerups.auto,
        PowerupKind::Mascot => &mut state.powerups.mascot,
    };
    *stock -= 1;
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::PowerupActivated { kind },
    ));
}

fn first_open_task(stall: &Stall) -> Option<usize> {
    stall.tasks.iter().position(|t| !t.done)
}

fn decay_effects(state: &mut RunState, dt: f64) {
    let e = &mut state.effects;
    e.speed_ms = (e.speed_ms - dt).max(0.0);
    e.slow_ms = (e.slow_ms - dt).max(0.0);
    e.mascot_ms = (e.mascot_ms - dt).max(0.0);
    e.combo_boost_ms = (e.combo_boost_ms - dt).max(0.0);
}

fn advance_clock(state: &mut RunState, dt: f64, events: &mut Vec<EventEnvelope>) {
    if state.outcome.is_some() {
        return;
    }
    state.time_left_ms = (state.time_left_ms - dt).max(0.0);
    if state.time_left_ms <= 0.0 {
        state.outcome = Some(RunOutcome::ShiftComplete);
        let tick = state.meta.tick;
        events.push(emit(
            &mut state.counters,
            tick,
            Event::ShiftEnded {
                shift: state.shift,
                score: state.score,
                rating: state.rating,
                max_combo: state.max_combo,
            },
        ));
    }
}

/// Reset per-shift state and arm the shift's random events. Skills, coins,
/// score, rating, and powerup stock carry over between shifts.
pub fn start_shift(state: &mut RunState, content: &GameContent, rng: &mut impl Rng) {
    let cfg = content.shift_config(state.shift);
    let c = &content.constants;

    state.stalls = (0..cfg.stalls).map(|_| Stall::new()).collect();
    state.sinks = (0..cfg.sinks).map(|_| Sink::default()).collect();
    state.customers.clear();
    state.messes.clear();
    state.towels = c.towel_capacity;
    state.combo = 0;
    state.last_milestone = 0;
    state.stats = crate::ShiftStats::default();
    state.cleaning = crate::CleaningFocus::default();
    state.effects = crate::EffectTimers::default();
    state.rush = crate::RushState::default();
    state.inspector = crate::InspectorSchedule::default();
    state.time_left_ms = cfg.duration_secs * 1000.0;
    state.spawn_timer_ms = rng.gen_range(c.spawn_initial_min_ms..=c.spawn_initial_max_ms);
    state.outcome = None;

    crate::director::arm_shift_events(state, content, rng);
}

/// Close out a completed shift: grade it, award coins, unlock the next skill,
/// and advance the shift counter. Call after `tick` reports `ShiftComplete`.
pub fn finish_shift(state: &mut RunState, content: &GameContent) -> crate::ShiftReport {
    let report = crate::scoring::shift_report(state, content);
    state.coins += report.coins;
    if let Some(skill) = report.unlocked {
        let level = state.skills.level_mut(skill);
        *level += 1;
    }
    state.shift += 1;
    report
}
