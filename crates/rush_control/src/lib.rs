//! Automatic play for headless runs.
//!
//! `InputSource` abstracts "where player inputs come from" so the daemon and
//! CLI can drive a run without a human. `AutoJanitor` is a simple reactive
//! bot: it mashes whatever job is focused, opens new jobs by urgency, and
//! keeps consumables topped up.

use rush_core::{
    CustomerPhase, GameContent, InputEnvelope, InputId, PlayerInput, PowerupKind, RunState,
    StallState,
};

pub trait InputSource {
    fn generate_inputs(
        &mut self,
        state: &RunState,
        content: &GameContent,
        next_input_id: &mut u64,
    ) -> Vec<InputEnvelope>;
}

/// Plays the shift automatically:
/// 1. Fire the Auto powerup when the floor is drowning in dirty stalls.
/// 2. Keep tapping the focused task.
/// 3. Start cleaning a dirty stall, preferring one with a customer at the
///    door in their grace window.
/// 4. Clean dirty sinks, then floor messes.
/// 5. Restock towels when the dispenser runs dry.
pub struct AutoJanitor {
    /// Taps per frame on the focused task. Roughly caps at human mash speed.
    pub taps_per_frame: usize,
}

impl Default for AutoJanitor {
    fn default() -> Self {
        Self { taps_per_frame: 3 }
    }
}

const AUTO_POWERUP_DIRTY_THRESHOLD: usize = 3;

/// Allocates an input ID and builds an `InputEnvelope`.
fn make_input(tick: u64, next_id: &mut u64, input: PlayerInput) -> InputEnvelope {
    let id = InputId(format!("inp_{:06}", *next_id));
    *next_id += 1;
    InputEnvelope {
        id,
        issued_tick: tick,
        execute_at_tick: tick,
        input,
    }
}

/// Lowest-index dirty stall, preferring one whose customer is mid-grace.
fn pick_dirty_stall(state: &RunState) -> Option<usize> {
    let in_grace = state.customers.iter().find_map(|cu| match cu.phase {
        CustomerPhase::Entering {
            stall,
            grace_ms: Some(_),
            ..
        } => Some(stall),
        _ => None,
    });
    if let Some(stall) = in_grace {
        if state.stalls[stall].state == StallState::Dirty {
            return Some(stall);
        }
    }
    state
        .stalls
        .iter()
        .position(|s| s.state == StallState::Dirty)
}

impl InputSource for AutoJanitor {
    fn generate_inputs(
        &mut self,
        state: &RunState,
        _content: &GameContent,
        next_input_id: &mut u64,
    ) -> Vec<InputEnvelope> {
        let tick = state.meta.tick;
        let mut inputs = Vec::new();

        let dirty_count = state
            .stalls
            .iter()
            .filter(|s| s.state == StallState::Dirty)
            .count();
        if state.powerups.auto > 0 && dirty_count >= AUTO_POWERUP_DIRTY_THRESHOLD {
            inputs.push(make_input(
                tick,
                next_input_id,
                PlayerInput::UsePowerup {
                    kind: PowerupKind::Auto,
                },
            ));
        }

        match (state.cleaning.active_stall, state.cleaning.active_task) {
            (Some(stall), Some(task)) => {
                for _ in 0..self.taps_per_frame {
                    inputs.push(make_input(
                        tick,
                        next_input_id,
                        PlayerInput::ClickTask { stall, task },
                    ));
                }
            }
            _ => {
                if let Some(stall) = pick_dirty_stall(state) {
                    inputs.push(make_input(
                        tick,
                        next_input_id,
                        PlayerInput::ClickStall { stall },
                    ));
                }
            }
        }

        if let Some(sink) = state.sinks.iter().position(|s| s.dirty && !s.cleaning) {
            inputs.push(make_input(
                tick,
                next_input_id,
                PlayerInput::ClickSink { sink },
            ));
        }

        if let Some(mess) = state.messes.iter().find(|m| !m.cleaning) {
            inputs.push(make_input(
                tick,
                next_input_id,
                PlayerInput::ClickMess { mess: mess.id },
            ));
        }

        if state.towels == 0 {
            inputs.push(make_input(tick, next_input_id, PlayerInput::RestockTowels));
        }

        inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rush_core::test_fixtures::{base_content, base_state, make_rng};
    use rush_core::tick;

    fn janitor() -> AutoJanitor {
        AutoJanitor::default()
    }

    fn soil(state: &mut RunState, stall: usize) {
        state.stalls[stall].state = StallState::Dirty;
        state.stalls[stall].tasks = vec![rush_core::TaskItem {
            kind: rush_core::TaskKind::Scrub,
            done: false,
        }];
    }

    #[test]
    fn test_idle_floor_produces_no_inputs() {
        let content = base_content();
        let state = base_state(&content);
        let mut next_id = 0;

        let inputs = janitor().generate_inputs(&state, &content, &mut next_id);

        assert!(inputs.is_empty(), "nothing to do on a clean floor");
    }

    #[test]
    fn test_opens_lowest_dirty_stall() {
        let content = base_content();
        let mut state = base_state(&content);
        soil(&mut state, 1);
        soil(&mut state, 2);
        let mut next_id = 0;

        let inputs = janitor().generate_inputs(&state, &content, &mut next_id);

        assert!(inputs
            .iter()
            .any(|i| matches!(i.input, PlayerInput::ClickStall { stall: 1 })));
    }

    #[test]
    fn test_prefers_stall_with_customer_in_grace() {
        let content = base_content();
        let mut state = base_state(&content);
        soil(&mut state, 0);
        soil(&mut state, 2);
        state.customers.push(rush_core::Customer {
            id: rush_core::CustomerId(1),
            kind: rush_core::CustomerKind::Regular,
            phase: CustomerPhase::Entering {
                stall: 2,
                timer_ms: 300.0,
                grace_ms: Some(150.0),
                committed_dirty: false,
            },
            pos: rush_core::layout::stall_pos(2, 3),
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
        let mut next_id = 0;

        let inputs = janitor().generate_inputs(&state, &content, &mut next_id);

        assert!(
            inputs
                .iter()
                .any(|i| matches!(i.input, PlayerInput::ClickStall { stall: 2 })),
            "the stall with a save on the line comes first"
        );
    }

    #[test]
    fn test_mashes_focused_task() {
        let content = base_content();
        let mut state = base_state(&content);
        soil(&mut state, 0);
        state.stalls[0].state = StallState::Cleaning;
        state.cleaning.active_stall = Some(0);
        state.cleaning.active_task = Some(0);
        let mut next_id = 0;

        let inputs = janitor().generate_inputs(&state, &content, &mut next_id);

        let taps = inputs
            .iter()
            .filter(|i| matches!(i.input, PlayerInput::ClickTask { stall: 0, task: 0 }))
            .count();
        assert_eq!(taps, 3, "default janitor taps three times per frame");
    }

    #[test]
    fn test_restocks_empty_towels_and_cleans_sink() {
        let content = base_content();
        let mut state = base_state(&content);
        state.towels = 0;
        state.sinks[1].dirty = true;
        let mut next_id = 0;

        let inputs = janitor().generate_inputs(&state, &content, &mut next_id);

        assert!(inputs
            .iter()
            .any(|i| matches!(i.input, PlayerInput::RestockTowels)));
        assert!(inputs
            .iter()
            .any(|i| matches!(i.input, PlayerInput::ClickSink { sink: 1 })));
    }

    #[test]
    fn test_fires_auto_powerup_when_overwhelmed() {
        let content = base_content();
        let mut state = base_state(&content);
        state.powerups.auto = 1;
        for stall in 0..3 {
            soil(&mut state, stall);
        }
        let mut next_id = 0;

        let inputs = janitor().generate_inputs(&state, &content, &mut next_id);

        assert!(inputs.iter().any(|i| matches!(
            i.input,
            PlayerInput::UsePowerup {
                kind: PowerupKind::Auto
            }
        )));
    }

    #[test]
    fn test_headless_shift_makes_progress() {
        let content = base_content();
        let mut state = base_state(&content);
        let mut rng = make_rng();
        let mut bot = janitor();
        let mut next_id = 0;

        // 60s shift at 100ms frames.
        for _ in 0..600 {
            let inputs = bot.generate_inputs(&state, &content, &mut next_id);
            tick(&mut state, &inputs, &content, &mut rng, 100.0);
            if state.outcome.is_some() {
                break;
            }
        }

        assert!(state.stats.served > 0, "customers should get served");
        assert!(
            state.stats.cleaned > 0,
            "the janitor should finish at least one stall"
        );
        assert!(state.rating > 0.0, "a tended floor should not fail the run");
    }
}
