//! HTTP daemon: runs the bathroom sim headless with `AutoJanitor` and
//! serves it (snapshot + SSE event stream) next to the backend API
//! (leaderboard, users, coupons, purchases).

mod routes;
mod state;
mod store;
mod tick_loop;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rush_control::AutoJanitor;
use rush_world::{build_initial_state, builtin_content, load_content};
use state::{AppState, SimState};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use store::BackendStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rush_daemon", about = "Bathroom Rush daemon")]
struct Args {
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// RNG seed; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Load game content from a directory instead of the built-in data.
    #[arg(long)]
    content_dir: Option<String>,
    #[arg(long, default_value = "http://localhost:5173")]
    cors_origin: String,
    /// Fixed simulation step in milliseconds.
    #[arg(long, default_value_t = 16.0)]
    frame_ms: f64,
    /// Stop the tick loop after this many ticks (for scripted runs).
    #[arg(long)]
    max_ticks: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let content = match &args.content_dir {
        Some(dir) => load_content(dir)?,
        None => builtin_content(),
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let run = build_initial_state(&content, seed, &mut rng);
    tracing::info!(
        seed,
        content_version = %content.content_version,
        stalls = run.stalls.len(),
        "run initialized"
    );

    let mut backend = BackendStore::new();
    backend.add_coupon("WELCOME10", 10, 1000);
    backend.add_coupon("SQUEAKY", 50, 100);

    let (event_tx, _) = tokio::sync::broadcast::channel(256);
    let app_state = AppState {
        sim: Arc::new(Mutex::new(SimState {
            run,
            content,
            rng,
            janitor: AutoJanitor::default(),
            next_input_id: 0,
        })),
        store: Arc::new(Mutex::new(backend)),
        event_tx: event_tx.clone(),
        paused: Arc::new(AtomicBool::new(false)),
        frame_ms: args.frame_ms,
    };

    tokio::spawn(tick_loop::run_tick_loop(
        app_state.sim.clone(),
        event_tx,
        app_state.paused.clone(),
        args.frame_ms,
        args.max_ticks,
    ));

    let router = routes::make_router_with_cors(app_state, &args.cors_origin);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("binding port {}", args.port))?;
    tracing::info!(port = args.port, "listening");
    axum::serve(listener, router)
        .await
        .context("server error")?;
    Ok(())
}
