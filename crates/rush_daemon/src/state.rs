use crate::store::BackendStore;
use parking_lot::Mutex;
use rand_chacha::ChaCha8Rng;
use rush_control::AutoJanitor;
use rush_core::{EventEnvelope, GameContent, RunState};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct SimState {
    pub run: RunState,
    pub content: GameContent,
    pub rng: ChaCha8Rng,
    pub janitor: AutoJanitor,
    pub next_input_id: u64,
}

pub type SharedSim = Arc<Mutex<SimState>>;
pub type SharedStore = Arc<Mutex<BackendStore>>;
pub type EventTx = broadcast::Sender<Vec<EventEnvelope>>;

#[derive(Clone)]
pub struct AppState {
    pub sim: SharedSim,
    pub store: SharedStore,
    pub event_tx: EventTx,
    pub paused: Arc<AtomicBool>,
    pub frame_ms: f64,
}
