use super::{suppress_spawns, test_content};
use crate::test_fixtures::{base_state, make_rng};
use crate::{
    envelope_input, finish_shift, start_shift, tick, Event, PlayerInput, PowerupKind, RunOutcome,
    SkillId, StallState,
};

#[test]
fn test_tick_is_noop_after_outcome() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    state.outcome = Some(RunOutcome::ShiftComplete);

    let events = tick(&mut state, &[], &content, &mut rng, 16.0);

    assert!(events.is_empty(), "terminal state must not produce events");
    assert_eq!(state.meta.tick, 0, "tick counter must not advance");
}

#[test]
fn test_frame_delta_is_clamped() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);
    let before = state.time_left_ms;

    tick(&mut state, &[], &content, &mut rng, 10_000.0);

    assert!(
        (before - state.time_left_ms - content.constants.max_frame_ms).abs() < 1e-9,
        "a huge frame delta must be clamped to max_frame_ms"
    );
}

#[test]
fn test_shift_clock_runs_out() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);
    state.time_left_ms = 50.0;

    let events = tick(&mut state, &[], &content, &mut rng, 100.0);

    assert_eq!(state.outcome, Some(RunOutcome::ShiftComplete));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e.event, Event::ShiftEnded { .. }))
            .count(),
        1,
        "ShiftEnded must fire exactly once"
    );

    let later = tick(&mut state, &[], &content, &mut rng, 100.0);
    assert!(later.is_empty(), "no events after the shift has ended");
}

#[test]
fn test_restock_refills_and_scores() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);
    state.towels = 3;

    let input = envelope_input(&mut state.counters, state.meta.tick, PlayerInput::RestockTowels);
    let events = tick(&mut state, &[input], &content, &mut rng, 16.0);

    assert_eq!(state.towels, content.constants.towel_capacity);
    assert_eq!(state.score, content.constants.restock_points);
    assert!(events
        .iter()
        .any(|e| matches!(e.event, Event::TowelsRestocked { .. })));
}

#[test]
fn test_restock_at_capacity_is_ignored() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);

    let input = envelope_input(&mut state.counters, state.meta.tick, PlayerInput::RestockTowels);
    tick(&mut state, &[input], &content, &mut rng, 16.0);

    assert_eq!(state.score, 0, "restocking a full dispenser scores nothing");
}

#[test]
fn test_input_scheduled_for_future_tick_is_deferred() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);
    state.towels = 3;

    let mut input =
        envelope_input(&mut state.counters, state.meta.tick, PlayerInput::RestockTowels);
    input.execute_at_tick = 5;
    tick(&mut state, &[input], &content, &mut rng, 16.0);

    assert_eq!(state.towels, 3, "input for a later tick must not apply now");
}

#[test]
fn test_speed_powerup_consumed_and_timed() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);

    let input = envelope_input(
        &mut state.counters,
        state.meta.tick,
        PlayerInput::UsePowerup {
            kind: PowerupKind::Speed,
        },
    );
    let events = tick(&mut state, &[input], &content, &mut rng, 16.0);

    assert_eq!(state.powerups.speed, 0);
    assert!(state.effects.speed_ms > 0.0, "speed effect should be armed");
    assert!(events.iter().any(|e| matches!(
        e.event,
        Event::PowerupActivated {
            kind: PowerupKind::Speed
        }
    )));
}

#[test]
fn test_auto_powerup_without_target_not_consumed() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);
    state.powerups.auto = 1;

    let input = envelope_input(
        &mut state.counters,
        state.meta.tick,
        PlayerInput::UsePowerup {
            kind: PowerupKind::Auto,
        },
    );
    tick(&mut state, &[input], &content, &mut rng, 16.0);

    assert_eq!(state.powerups.auto, 1, "no dirty stall: nothing to spend on");
}

#[test]
fn test_auto_powerup_cleans_first_dirty_stall() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);
    state.powerups.auto = 1;
    super::make_dirty(&mut state, &content, &mut rng, 1);
    super::make_dirty(&mut state, &content, &mut rng, 2);

    let input = envelope_input(
        &mut state.counters,
        state.meta.tick,
        PlayerInput::UsePowerup {
            kind: PowerupKind::Auto,
        },
    );
    tick(&mut state, &[input], &content, &mut rng, 16.0);

    assert_eq!(state.powerups.auto, 0);
    assert_eq!(state.stalls[1].state, StallState::Empty, "lowest index first");
    assert_eq!(state.stalls[2].state, StallState::Dirty);
    assert_eq!(state.score, content.constants.auto_clean_points);
    assert_eq!(state.combo, 0, "auto cleans do not extend the combo");
}

#[test]
fn test_start_shift_resets_floor() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    state.combo = 7;
    state.last_milestone = 5;
    state.towels = 1;
    state.stats.served = 9;
    super::make_dirty(&mut state, &content, &mut rng, 0);
    state.outcome = Some(RunOutcome::ShiftComplete);

    start_shift(&mut state, &content, &mut rng);

    assert_eq!(state.combo, 0);
    assert_eq!(state.last_milestone, 0);
    assert_eq!(state.towels, content.constants.towel_capacity);
    assert_eq!(state.stats.served, 0);
    assert!(state.stalls.iter().all(|s| s.state == StallState::Empty));
    assert_eq!(state.outcome, None);
    assert!(
        (state.time_left_ms - content.shift_config(0).duration_secs * 1000.0).abs() < 1e-9
    );
}

#[test]
fn test_finish_shift_awards_coins_and_unlocks_skill() {
    let content = test_content();
    let mut state = base_state(&content);
    state.score = 1000;
    state.stats.served = 10;
    state.stats.dirty = 0;
    state.stats.abandoned = 0;

    let report = finish_shift(&mut state, &content);

    assert_eq!(report.grade, crate::Grade::S);
    // floor(1000 / 10) * 2.0 grade bonus, no tips skill yet.
    assert_eq!(report.coins, 200);
    assert_eq!(state.coins, 200);
    assert_eq!(report.unlocked, Some(SkillId::Scrub));
    assert_eq!(state.skills.scrub, 1);
    assert_eq!(state.shift, 1);
}

#[test]
fn test_run_state_survives_json_round_trip() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    for _ in 0..20 {
        tick(&mut state, &[], &content, &mut rng, 100.0);
    }

    let json = serde_json::to_string(&state).expect("state serializes");
    let restored: crate::RunState = serde_json::from_str(&json).expect("state deserializes");

    assert_eq!(restored.meta.tick, state.meta.tick);
    assert_eq!(restored.customers.len(), state.customers.len());
    assert_eq!(restored.score, state.score);
}
