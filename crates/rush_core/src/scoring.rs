//! Rating, combo milestones, shift grading, and coin payout.

use serde::{Deserialize, Serialize};

use crate::{
    emit, Event, EventEnvelope, GameContent, Grade, RunOutcome, RunState, ShiftStats, SkillId,
};

pub(crate) const RATING_MAX: f32 = 5.0;

/// Apply a rating delta, clamped to `[0, 5]`. Hitting zero is terminal and
/// reported exactly once, even if further penalties land the same tick.
pub(crate) fn apply_rating(state: &mut RunState, delta: f32, events: &mut Vec<EventEnvelope>) {
    state.rating = (state.rating + delta).clamp(0.0, RATING_MAX);
    if state.rating <= 0.0 && state.outcome.is_none() {
        state.outcome = Some(RunOutcome::RunFailed);
        let tick = state.meta.tick;
        events.push(emit(
            &mut state.counters,
            tick,
            Event::RunFailed {
                shift: state.shift,
                score: state.score,
            },
        ));
    }
}

/// Reset the streak and its milestone tracking.
pub(crate) fn break_combo(state: &mut RunState, events: &mut Vec<EventEnvelope>) {
    if state.combo == 0 {
        return;
    }
    let had = state.combo;
    state.combo = 0;
    state.last_milestone = 0;
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::ComboBroken { had_combo: had },
    ));
}

/// Trigger the highest qualifying milestone not yet reached this streak.
/// At most one fires per call, so a jump over two thresholds still yields a
/// single reward.
pub(crate) fn check_milestones(
    state: &mut RunState,
    content: &GameContent,
    events: &mut Vec<EventEnvelope>,
) {
    let Some(def) = content
        .milestones
        .iter()
        .filter(|m| m.level <= state.combo && m.level > state.last_milestone)
        .max_by_key(|m| m.level)
    else {
        return;
    };
    state.last_milestone = def.level;
    state.effects.combo_boost_ms = state.effects.combo_boost_ms.max(def.speed_boost_ms);
    state.score += def.points;
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::MilestoneReached {
            level: def.level,
            points: def.points,
        },
    ));
    if def.rating > 0.0 {
        apply_rating(state, def.rating, events);
    }
}

/// Shift grade from the dirty-incident ratio. S additionally demands a
/// spotless record on walkouts.
pub fn grade_for(stats: &ShiftStats) -> Grade {
    let ratio = f64::from(stats.dirty) / f64::from(stats.served.max(1));
    if stats.dirty == 0 && stats.abandoned == 0 {
        Grade::S
    } else if ratio <= 0.1 {
        Grade::A
    } else if ratio <= 0.2 {
        Grade::B
    } else if ratio <= 0.35 {
        Grade::C
    } else {
        Grade::F
    }
}

fn grade_bonus(grade: Grade) -> f64 {
    match grade {
        Grade::S => 2.0,
        Grade::A => 1.5,
        Grade::B => 1.2,
        Grade::C => 1.0,
        Grade::F => 0.5,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coins_earned(score: u64, grade: Grade, tips_effect: f64) -> u64 {
    (((score / 10) as f64) * grade_bonus(grade) * (1.0 + tips_effect)).floor() as u64
}

/// Summary handed to the host when a shift ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftReport {
    pub shift: usize,
    pub score: u64,
    pub rating: f32,
    pub grade: Grade,
    pub coins: u64,
    pub max_combo: u32,
    pub stats: ShiftStats,
    pub unlocked: Option<SkillId>,
}

pub(crate) fn shift_report(state: &RunState, content: &GameContent) -> ShiftReport {
    let grade = grade_for(&state.stats);
    let tips = content.skill_effect(SkillId::Tips, &state.skills);
    let unlocked = content
        .skill_unlock_order
        .get(state.shift)
        .copied()
        .filter(|&id| {
            content
                .skills
                .iter()
                .find(|s| s.id == id)
                .is_some_and(|s| state.skills.level(id) < s.max_level)
        });
    ShiftReport {
        shift: state.shift,
        score: state.score,
        rating: state.rating,
        grade,
        coins: coins_earned(state.score, grade, tips),
        max_combo: state.max_combo,
        stats: state.stats.clone(),
        unlocked,
    }
}
