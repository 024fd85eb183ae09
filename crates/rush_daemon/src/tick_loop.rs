use crate::state::{EventTx, SharedSim, SimState};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rush_control::InputSource;
use rush_core::RunOutcome;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Advances the sim one fixed frame per interval tick. While paused the
/// loop keeps spinning but the state does not advance; the fixed step
/// means resuming never produces a catch-up delta.
pub async fn run_tick_loop(
    sim: SharedSim,
    event_tx: EventTx,
    paused: Arc<AtomicBool>,
    frame_ms: f64,
    max_ticks: Option<u64>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs_f64(frame_ms / 1000.0));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        if paused.load(Ordering::Relaxed) {
            continue;
        }

        let (events, done) = {
            let mut guard = sim.lock();
            let SimState {
                ref run,
                ref content,
                ref mut janitor,
                ref mut next_input_id,
                ..
            } = *guard;
            let inputs = janitor.generate_inputs(run, content, next_input_id);

            let SimState {
                ref mut run,
                ref content,
                ref mut rng,
                ..
            } = *guard;
            let events = rush_core::tick(run, &inputs, content, rng, frame_ms);

            match run.outcome {
                Some(RunOutcome::ShiftComplete) => {
                    let report = rush_core::finish_shift(run, content);
                    tracing::info!(
                        shift = report.shift,
                        grade = %report.grade,
                        score = report.score,
                        coins = report.coins,
                        "shift complete, starting the next"
                    );
                    rush_core::start_shift(run, content, rng);
                }
                Some(RunOutcome::RunFailed) => {
                    tracing::warn!(
                        shift = run.shift,
                        score = run.score,
                        "run failed, starting a fresh run"
                    );
                    let seed = run.meta.seed.wrapping_add(1);
                    *rng = ChaCha8Rng::seed_from_u64(seed);
                    *run = rush_world::build_initial_state(content, seed, rng);
                }
                None => {}
            }

            let done = max_ticks.is_some_and(|max| run.meta.tick >= max);
            (events, done)
        };

        let _ = event_tx.send(events);

        if done {
            break;
        }
    }
}
