use super::{make_dirty, suppress_spawns, test_content};
use crate::test_fixtures::{base_state, make_rng};
use crate::{tick, Event, RunOutcome, StallState};

#[test]
fn test_rush_hour_starts_and_ends() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);
    state.rush.timer_ms = 50.0;

    let started = tick(&mut state, &[], &content, &mut rng, 100.0);
    assert!(state.rush.active);
    assert!(started
        .iter()
        .any(|e| matches!(e.event, Event::RushHourStarted)));

    state.rush.remaining_ms = 50.0;
    let ended = tick(&mut state, &[], &content, &mut rng, 100.0);
    assert!(!state.rush.active);
    assert!(ended.iter().any(|e| matches!(e.event, Event::RushHourEnded)));
}

#[test]
fn test_rush_compresses_spawn_interval() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    state.rush.active = true;
    state.rush.remaining_ms = 8_000.0;
    state.spawn_timer_ms = 50.0;

    tick(&mut state, &[], &content, &mut rng, 100.0);

    // Fixture interval is a fixed 500ms; rush multiplies by 0.3.
    assert!(
        (state.spawn_timer_ms - 150.0).abs() < 1e-9,
        "expected 150, got {}",
        state.spawn_timer_ms
    );
}

#[test]
fn test_slow_powerup_stretches_spawn_interval() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    state.effects.slow_ms = 5_000.0;
    state.spawn_timer_ms = 50.0;

    tick(&mut state, &[], &content, &mut rng, 100.0);

    assert!(
        (state.spawn_timer_ms - 1000.0).abs() < 1e-9,
        "expected 500 * 2, got {}",
        state.spawn_timer_ms
    );
}

#[test]
fn test_inspector_warning_precedes_arrival() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);
    state.inspector.timer_ms = 3_050.0;

    let events = tick(&mut state, &[], &content, &mut rng, 100.0);

    assert!(state.inspector.warned);
    assert!(events
        .iter()
        .any(|e| matches!(e.event, Event::InspectorWarning)));
    assert!(
        state.inspector.visitor.is_none(),
        "warning lands before the inspector does"
    );
}

#[test]
fn test_inspector_arrives_after_timer() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);
    state.inspector.timer_ms = 50.0;

    let events = tick(&mut state, &[], &content, &mut rng, 100.0);

    assert!(state.inspector.visitor.is_some());
    assert!(events
        .iter()
        .any(|e| matches!(e.event, Event::InspectorArrived)));
}

/// Drive ticks until the verdict lands (or the tick budget runs out).
fn run_to_verdict(
    state: &mut crate::RunState,
    content: &crate::GameContent,
    rng: &mut impl rand::Rng,
) -> Vec<crate::EventEnvelope> {
    let mut all = Vec::new();
    for _ in 0..500 {
        all.extend(tick(state, &[], content, rng, 100.0));
        if all
            .iter()
            .any(|e| matches!(e.event, Event::InspectorVerdict { .. }))
        {
            break;
        }
    }
    all
}

#[test]
fn test_inspection_penalizes_dirty_stalls_only() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);
    state.time_left_ms = 600_000.0;
    make_dirty(&mut state, &content, &mut rng, 0);
    state.stalls[1].state = StallState::Occupied;
    state.stalls[1].occupancy_ms = 600_000.0;
    state.inspector.timer_ms = 50.0;

    let events = run_to_verdict(&mut state, &content, &mut rng);

    let verdict = events
        .iter()
        .find_map(|e| match e.event {
            Event::InspectorVerdict {
                violations,
                rating_delta,
                ..
            } => Some((violations, rating_delta)),
            _ => None,
        })
        .expect("inspector must deliver a verdict");
    assert_eq!(verdict.0, 1, "only the dirty stall counts as a violation");
    assert!((verdict.1 + 0.5).abs() < 1e-4, "0.5 penalty per violation");
    assert!((state.rating - 4.5).abs() < 1e-4);
    // The occupied stall is excluded from the walkthrough tally entirely.
    assert!(!events
        .iter()
        .any(|e| matches!(e.event, Event::InspectorCheckedStall { stall: 1, .. })));
}

#[test]
fn test_clean_inspection_pays_bonus() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);
    state.time_left_ms = 600_000.0;
    state.rating = 4.0;
    state.inspector.timer_ms = 50.0;

    let events = run_to_verdict(&mut state, &content, &mut rng);

    assert!(events.iter().any(|e| matches!(
        e.event,
        Event::InspectorVerdict { violations: 0, .. }
    )));
    assert_eq!(state.score, content.constants.inspector_bonus_points);
    assert!((state.rating - 4.3).abs() < 1e-4, "clean pass grants +0.3");
}

#[test]
fn test_inspector_leaves_after_verdict() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);
    state.time_left_ms = 600_000.0;
    state.inspector.timer_ms = 50.0;

    run_to_verdict(&mut state, &content, &mut rng);
    let mut left = Vec::new();
    for _ in 0..200 {
        left.extend(tick(&mut state, &[], &content, &mut rng, 100.0));
        if state.inspector.visitor.is_none() {
            break;
        }
    }

    assert!(state.inspector.visitor.is_none(), "inspector walks out");
    assert!(left.iter().any(|e| matches!(e.event, Event::InspectorLeft)));
}

#[test]
fn test_verdict_can_end_the_run() {
    let content = test_content();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    suppress_spawns(&mut state);
    state.time_left_ms = 600_000.0;
    state.rating = 0.4;
    make_dirty(&mut state, &content, &mut rng, 0);
    state.inspector.timer_ms = 50.0;

    let events = run_to_verdict(&mut state, &content, &mut rng);

    assert_eq!(state.outcome, Some(RunOutcome::RunFailed));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e.event, Event::RunFailed { .. }))
            .count(),
        1,
        "terminal failure is reported exactly once"
    );
}
