//! Stall soiling, the task list, and cleaning progress.
//!
//! The player can focus exactly one sub-task at a time. Focused tasks gain
//! slow automatic progress plus a fixed boost per tap; switching focus throws
//! away partial progress on the old task.

use rand::Rng;

use crate::scoring::{apply_rating, check_milestones};
use crate::{
    emit, EffectTimers, Event, EventEnvelope, GameContent, RunState, StallState, TaskItem, TaskKind,
};

pub(crate) fn speed_mult(effects: &EffectTimers) -> f64 {
    if effects.speed_ms > 0.0 {
        2.0
    } else {
        1.0
    }
}

pub(crate) fn click_boost_ms(content: &GameContent, effects: &EffectTimers) -> f64 {
    content.constants.click_boost_ms * speed_mult(effects)
}

/// Time a focused sub-task needs to complete, after skill and combo-boost
/// reductions.
pub(crate) fn effective_task_time(content: &GameContent, state: &RunState) -> f64 {
    let scrub = content.skill_effect(crate::SkillId::Scrub, &state.skills);
    let boost = if state.effects.combo_boost_ms > 0.0 {
        content.constants.combo_boost_task_mult
    } else {
        1.0
    };
    content.constants.base_task_time_ms * (1.0 - scrub) * boost
}

/// Roll the task list for a freshly soiled stall. Messiness shifts every
/// task's inclusion chance; a clean customer rarely leaves more than a scrub.
pub(crate) fn generate_tasks(
    content: &GameContent,
    rng: &mut impl Rng,
    messiness: i8,
) -> Vec<TaskItem> {
    let c = &content.constants;
    let modifier = match messiness {
        i8::MIN..=-1 => c.clean_task_chance_mult,
        0 => 1.0,
        _ => c.messy_task_chance_mult,
    };
    let mut tasks: Vec<TaskItem> = content
        .tasks
        .iter()
        .filter(|def| rng.gen::<f64>() < (def.chance * modifier).min(1.0))
        .map(|def| TaskItem {
            kind: def.kind,
            done: false,
        })
        .collect();

    if tasks.is_empty() {
        tasks.push(TaskItem {
            kind: TaskKind::Scrub,
            done: false,
        });
    }
    if messiness > 0 {
        // Messy customers always leave a real job behind.
        for def in &content.tasks {
            if tasks.len() >= c.messy_min_tasks {
                break;
            }
            if !tasks.iter().any(|t| t.kind == def.kind) {
                tasks.push(TaskItem {
                    kind: def.kind,
                    done: false,
                });
            }
        }
    }
    tasks
}

/// Mark a vacated stall dirty and roll its task list.
pub(crate) fn soil_stall(
    state: &mut RunState,
    content: &GameContent,
    rng: &mut impl Rng,
    stall_idx: usize,
    messiness: i8,
    vip: bool,
    events: &mut Vec<EventEnvelope>,
) {
    let tasks = generate_tasks(content, rng, messiness);
    let task_count = tasks.len();
    let stall = &mut state.stalls[stall_idx];
    stall.state = StallState::Dirty;
    stall.occupancy_ms = 0.0;
    stall.door_open = true;
    stall.tasks = tasks;
    stall.was_vip = vip;
    stall.messiness = messiness;
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::StallSoiled {
            stall: stall_idx,
            task_count,
        },
    ));
}

/// Transition a dirty stall to Cleaning and focus its first open task.
pub(crate) fn begin_stall_cleaning(
    state: &mut RunState,
    stall_idx: usize,
    events: &mut Vec<EventEnvelope>,
) {
    let stall = &mut state.stalls[stall_idx];
    if stall.state != StallState::Dirty {
        return;
    }
    stall.state = StallState::Cleaning;
    state.cleaning.active_stall = Some(stall_idx);
    state.cleaning.active_task = stall.tasks.iter().position(|t| !t.done);
    state.cleaning.progress_ms = 0.0;
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::CleaningStarted { stall: stall_idx },
    ));
}

/// Advance the focused sub-task. Completion is idempotent: a task already
/// done is skipped, never re-awarded.
pub(crate) fn advance_cleaning(
    state: &mut RunState,
    content: &GameContent,
    dt: f64,
    events: &mut Vec<EventEnvelope>,
) {
    let Some(stall_idx) = state.cleaning.active_stall else {
        return;
    };
    let Some(task_idx) = state.cleaning.active_task else {
        // Focused stall with no open task: resolve completion below.
        try_complete_stall(state, content, stall_idx, events);
        return;
    };
    if state
        .stalls
        .get(stall_idx)
        .map_or(true, |s| s.state != StallState::Cleaning)
    {
        state.cleaning = crate::CleaningFocus::default();
        return;
    }

    state.cleaning.progress_ms +=
        dt * content.constants.auto_progress_rate * speed_mult(&state.effects);

    let needed = effective_task_time(content, state);
    if state.cleaning.progress_ms < needed {
        return;
    }

    let stall = &mut state.stalls[stall_idx];
    let kind = match stall.tasks.get_mut(task_idx) {
        Some(item) if !item.done => {
            item.done = true;
            item.kind
        }
        _ => {
            state.cleaning.active_task = stall.tasks.iter().position(|t| !t.done);
            state.cleaning.progress_ms = 0.0;
            return;
        }
    };
    state.cleaning.progress_ms = 0.0;
    state.cleaning.active_task = state.stalls[stall_idx].tasks.iter().position(|t| !t.done);
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::SubTaskCompleted {
            stall: stall_idx,
            task: kind,
        },
    ));

    if state.cleaning.active_task.is_none() {
        try_complete_stall(state, content, stall_idx, events);
    }
}

fn try_complete_stall(
    state: &mut RunState,
    content: &GameContent,
    stall_idx: usize,
    events: &mut Vec<EventEnvelope>,
) {
    let Some(stall) = state.stalls.get(stall_idx) else {
        return;
    };
    if stall.state != StallState::Cleaning || stall.tasks.iter().any(|t| !t.done) {
        return;
    }
    complete_stall(state, content, stall_idx, events);
}

/// A fully cleaned stall: combo, score, rating, milestone check, reset.
pub(crate) fn complete_stall(
    state: &mut RunState,
    content: &GameContent,
    stall_idx: usize,
    events: &mut Vec<EventEnvelope>,
) {
    let c = &content.constants;
    let vip = state.stalls[stall_idx].was_vip;
    let vip_mult = if vip { 2.0 } else { 1.0 };

    state.combo += 1;
    state.max_combo = state.max_combo.max(state.combo);
    state.stats.cleaned += 1;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let points = ((c.base_points as f64) * (1.0 + f64::from(state.combo) * c.combo_weight)
        * vip_mult)
        .floor() as u64;
    state.score += points;

    reset_stall(state, stall_idx);

    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::StallCleaned {
            stall: stall_idx,
            points,
            combo: state.combo,
            vip,
        },
    ));

    let rating_gain = c.rating_gain_per_stall * if vip { 2.0 } else { 1.0 };
    apply_rating(state, rating_gain, events);
    check_milestones(state, content, events);
}

/// Auto-powerup path: the stall is wiped without combo or rating changes.
pub(crate) fn instant_clean_stall(
    state: &mut RunState,
    content: &GameContent,
    stall_idx: usize,
    events: &mut Vec<EventEnvelope>,
) {
    let points = content.constants.auto_clean_points;
    state.score += points;
    state.stats.cleaned += 1;
    reset_stall(state, stall_idx);
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::StallCleaned {
            stall: stall_idx,
            points,
            combo: state.combo,
            vip: false,
        },
    ));
}

/// Complete every open task without scoring. Used by the grace-period save.
pub(crate) fn finish_tasks(state: &mut RunState, stall_idx: usize) {
    for task in &mut state.stalls[stall_idx].tasks {
        task.done = true;
    }
    if state.cleaning.active_stall == Some(stall_idx) {
        state.cleaning = crate::CleaningFocus::default();
    }
}

fn reset_stall(state: &mut RunState, stall_idx: usize) {
    let stall = &mut state.stalls[stall_idx];
    stall.state = StallState::Empty;
    stall.tasks.clear();
    stall.door_open = false;
    stall.was_vip = false;
    stall.messiness = 0;
    if state.cleaning.active_stall == Some(stall_idx) {
        state.cleaning = crate::CleaningFocus::default();
    }
}

/// Sink cleanup runs unattended once started.
pub(crate) fn advance_sinks(
    state: &mut RunState,
    content: &GameContent,
    dt: f64,
    events: &mut Vec<EventEnvelope>,
) {
    let c = &content.constants;
    let mut cleaned = Vec::new();
    for (idx, sink) in state.sinks.iter_mut().enumerate() {
        if !sink.cleaning {
            continue;
        }
        sink.progress_ms += dt;
        if sink.progress_ms >= c.sink_clean_time_ms {
            sink.dirty = false;
            sink.cleaning = false;
            sink.progress_ms = 0.0;
            cleaned.push(idx);
        }
    }
    for idx in cleaned {
        state.score += c.sink_points;
        let tick = state.meta.tick;
        events.push(emit(
            &mut state.counters,
            tick,
            Event::SinkCleaned {
                sink: idx,
                points: c.sink_points,
            },
        ));
    }
}
