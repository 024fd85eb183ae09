use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rush_control::{AutoJanitor, InputSource};
use rush_core::{MetricsSnapshot, RunOutcome, ShiftReport};
use rush_world::{build_initial_state, builtin_content, load_content};

/// Fixed simulation step for headless play.
const FRAME_MS: f64 = 16.0;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "rush_cli", about = "Bathroom Rush CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a campaign headless with the auto-janitor.
    Run {
        /// Number of shifts to attempt.
        #[arg(long, default_value_t = 3)]
        shifts: u64,
        /// RNG seed; random when omitted.
        #[arg(long)]
        seed: Option<u64>,
        /// Load game content from a directory instead of the built-in data.
        #[arg(long)]
        content_dir: Option<String>,
        /// Sample metrics every N frames.
        #[arg(long, default_value_t = 60)]
        metrics_every: u64,
        /// Disable metrics collection to the runs/ directory.
        #[arg(long)]
        no_metrics: bool,
    },
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

fn generate_run_id(seed: u64) -> String {
    format!("{}_seed{seed}", Utc::now().format("%Y%m%d_%H%M%S"))
}

fn create_run_dir(run_id: &str) -> Result<std::path::PathBuf> {
    let dir = std::path::PathBuf::from("runs").join(run_id);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating run directory: {}", dir.display()))?;
    Ok(dir)
}

fn write_run_info(
    dir: &std::path::Path,
    run_id: &str,
    seed: u64,
    shifts: u64,
    content_version: &str,
    metrics_every: u64,
) -> Result<()> {
    let info = serde_json::json!({
        "run_id": run_id,
        "seed": seed,
        "content_version": content_version,
        "metrics_every": metrics_every,
        "runner": "rush_cli",
        "args": {
            "shifts": shifts,
        }
    });
    let path = dir.join("run_info.json");
    let file =
        std::fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, &info)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn print_shift_summary(report: &ShiftReport) {
    let s = &report.stats;
    println!(
        "Shift {:2} done  grade={}  score={:6}  rating={:.2}  coins=+{}  \
         served={} cleaned={} dirty={} abandoned={} saves={}  max_combo={}",
        report.shift + 1,
        report.grade,
        report.score,
        report.rating,
        report.coins,
        s.served,
        s.cleaned,
        s.dirty,
        s.abandoned,
        s.saves,
        report.max_combo,
    );
    if let Some(skill) = report.unlocked {
        println!("  skill unlocked: {skill:?}");
    }
}

fn run(
    shifts: u64,
    seed: Option<u64>,
    content_dir: Option<&str>,
    metrics_every: u64,
    no_metrics: bool,
) -> Result<()> {
    let content = match content_dir {
        Some(dir) => load_content(dir)?,
        None => builtin_content(),
    };

    let resolved_seed = seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(resolved_seed);
    let mut state = build_initial_state(&content, resolved_seed, &mut rng);

    let mut run_dir = None;
    if !no_metrics {
        let run_id = generate_run_id(resolved_seed);
        let dir = create_run_dir(&run_id)?;
        write_run_info(
            &dir,
            &run_id,
            resolved_seed,
            shifts,
            &content.content_version,
            metrics_every,
        )?;
        println!("Run directory: {}", dir.display());
        run_dir = Some(dir);
    }

    let mut janitor = AutoJanitor::default();
    let mut next_input_id = 0u64;
    let mut snapshots: Vec<MetricsSnapshot> = Vec::new();
    let mut frame = 0u64;

    println!(
        "Starting campaign: shifts={shifts} seed={resolved_seed} content_version={}",
        content.content_version,
    );
    println!("{}", "-".repeat(80));

    'campaign: for _ in 0..shifts {
        loop {
            let inputs = janitor.generate_inputs(&state, &content, &mut next_input_id);
            rush_core::tick(&mut state, &inputs, &content, &mut rng, FRAME_MS);

            if metrics_every > 0 && frame % metrics_every == 0 {
                snapshots.push(rush_core::compute_metrics(&state));
            }
            frame += 1;

            match state.outcome {
                Some(RunOutcome::ShiftComplete) => break,
                Some(RunOutcome::RunFailed) => {
                    println!(
                        "RUN FAILED on shift {} at score {} (rating hit zero)",
                        state.shift + 1,
                        state.score
                    );
                    break 'campaign;
                }
                None => {}
            }
        }

        let report = rush_core::finish_shift(&mut state, &content);
        print_shift_summary(&report);
        rush_core::start_shift(&mut state, &content, &mut rng);
    }

    println!("{}", "-".repeat(80));
    println!(
        "Campaign over: shifts completed={}  score={}  coins={}  max_combo={}",
        state.shift, state.score, state.coins, state.max_combo,
    );

    if let Some(dir) = run_dir {
        let path = dir.join("metrics.csv");
        let path_str = path.to_string_lossy();
        rush_core::write_metrics_csv(&path_str, &snapshots)
            .with_context(|| format!("writing {path_str}"))?;
        println!("Metrics written to {path_str}");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            shifts,
            seed,
            content_dir,
            metrics_every,
            no_metrics,
        } => {
            run(
                shifts,
                seed,
                content_dir.as_deref(),
                metrics_every,
                no_metrics,
            )?;
        }
    }
    Ok(())
}
