//! Content loading, initial-state construction, and saved-run snapshots
//! shared between rush_cli and rush_daemon.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use rush_core::{
    CleaningFocus, Constants, Counters, EffectTimers, GameContent, InspectorSchedule, ItemDef,
    MessChances, MessDef, MessKind, MetaState, MilestoneDef, PowerupKind, PowerupStock, RunState,
    RushState, ShiftConfig, ShiftStats, SkillDef, SkillId, SkillLevels, SpecialCustomerDef,
    TaskDef, TaskKind,
};
use std::path::Path;

#[derive(Deserialize)]
struct ShiftsFile {
    content_version: String,
    shifts: Vec<ShiftConfig>,
    tasks: Vec<TaskDef>,
    messes: Vec<MessDef>,
    milestones: Vec<MilestoneDef>,
    skills: Vec<SkillDef>,
    items: Vec<ItemDef>,
    specials: Vec<SpecialCustomerDef>,
    skill_unlock_order: Vec<SkillId>,
}

/// Validates loaded content, panicking on any authoring error.
///
/// Catches mistakes like: an empty shift table, milestones out of order, a
/// probability outside [0, 1], or a mess kind without a definition.
pub fn validate_content(content: &GameContent) {
    assert!(!content.shifts.is_empty(), "content must define at least one shift");
    for (i, cfg) in content.shifts.iter().enumerate() {
        assert!(cfg.stalls > 0, "shift {i} has no stalls");
        assert!(cfg.sinks > 0, "shift {i} has no sinks");
        assert!(
            cfg.spawn_min_ms <= cfg.spawn_max_ms,
            "shift {i} spawn interval range is inverted"
        );
        assert!(
            cfg.occupancy_min_ms <= cfg.occupancy_max_ms,
            "shift {i} occupancy range is inverted"
        );
        assert!(cfg.duration_secs > 0.0, "shift {i} has zero duration");
    }

    let mut last_level = 0;
    for milestone in &content.milestones {
        assert!(
            milestone.level > last_level,
            "milestone levels must be strictly ascending, found {} after {}",
            milestone.level,
            last_level,
        );
        last_level = milestone.level;
    }

    assert!(!content.tasks.is_empty(), "content must define cleaning tasks");
    for task in &content.tasks {
        assert!(
            (0.0..=1.0).contains(&task.chance),
            "task '{}' chance {} is not a probability",
            task.label,
            task.chance,
        );
    }
    for special in &content.specials {
        assert!(
            (0.0..=1.0).contains(&special.chance),
            "special '{}' chance {} is not a probability",
            special.name,
            special.chance,
        );
    }

    for kind in [MessKind::Water, MessKind::Pee, MessKind::Vomit, MessKind::Muddy] {
        assert!(
            content.messes.iter().any(|m| m.kind == kind),
            "mess kind {kind:?} has no definition",
        );
    }

    for skill in &content.skill_unlock_order {
        assert!(
            content.skills.iter().any(|s| s.id == *skill),
            "skill unlock order references undefined skill {skill:?}",
        );
    }
}

pub fn load_content(content_dir: &str) -> Result<GameContent> {
    let dir = Path::new(content_dir);
    let constants: Constants = serde_json::from_str(
        &std::fs::read_to_string(dir.join("constants.json")).context("reading constants.json")?,
    )
    .context("parsing constants.json")?;
    let shifts_file: ShiftsFile = serde_json::from_str(
        &std::fs::read_to_string(dir.join("shifts.json")).context("reading shifts.json")?,
    )
    .context("parsing shifts.json")?;
    let content = GameContent {
        content_version: shifts_file.content_version,
        shifts: shifts_file.shifts,
        constants,
        tasks: shifts_file.tasks,
        messes: shifts_file.messes,
        milestones: shifts_file.milestones,
        skills: shifts_file.skills,
        items: shifts_file.items,
        specials: shifts_file.specials,
        skill_unlock_order: shifts_file.skill_unlock_order,
    };
    validate_content(&content);
    Ok(content)
}

/// The shipped game data, used when no content directory is given.
#[allow(clippy::too_many_lines)]
pub fn builtin_content() -> GameContent {
    let content = GameContent {
        content_version: "1.0.0".to_string(),
        shifts: vec![
            ShiftConfig {
                stalls: 5,
                sinks: 2,
                spawn_min_ms: 4300.0,
                spawn_max_ms: 6400.0,
                occupancy_min_ms: 2000.0,
                occupancy_max_ms: 4000.0,
                duration_secs: 60.0,
            },
            ShiftConfig {
                stalls: 6,
                sinks: 2,
                spawn_min_ms: 3600.0,
                spawn_max_ms: 5400.0,
                occupancy_min_ms: 1800.0,
                occupancy_max_ms: 3600.0,
                duration_secs: 65.0,
            },
            ShiftConfig {
                stalls: 7,
                sinks: 3,
                spawn_min_ms: 3000.0,
                spawn_max_ms: 4600.0,
                occupancy_min_ms: 1600.0,
                occupancy_max_ms: 3200.0,
                duration_secs: 70.0,
            },
            ShiftConfig {
                stalls: 8,
                sinks: 3,
                spawn_min_ms: 2400.0,
                spawn_max_ms: 3800.0,
                occupancy_min_ms: 1400.0,
                occupancy_max_ms: 2800.0,
                duration_secs: 75.0,
            },
            ShiftConfig {
                stalls: 9,
                sinks: 4,
                spawn_min_ms: 1800.0,
                spawn_max_ms: 2800.0,
                occupancy_min_ms: 1200.0,
                occupancy_max_ms: 2500.0,
                duration_secs: 80.0,
            },
            ShiftConfig {
                stalls: 10,
                sinks: 4,
                spawn_min_ms: 1200.0,
                spawn_max_ms: 2000.0,
                occupancy_min_ms: 1000.0,
                occupancy_max_ms: 2200.0,
                duration_secs: 90.0,
            },
        ],
        constants: Constants {
            max_frame_ms: 100.0,
            walk_speed: 120.0,
            urgent_speed_mult: 1.4,
            max_active_customers: 12,
            patience_ms: 10_000.0,
            urgent_chance: 0.2,
            urgent_patience_mult: 0.6,
            vip_chance: 0.12,
            vip_patience_mult: 0.8,
            clean_customer_chance: 0.15,
            messy_customer_chance: 0.20,
            base_task_time_ms: 500.0,
            click_boost_ms: 80.0,
            auto_progress_rate: 0.3,
            combo_boost_task_mult: 0.7,
            clean_task_chance_mult: 0.4,
            messy_task_chance_mult: 1.5,
            messy_min_tasks: 3,
            base_points: 100,
            combo_weight: 0.5,
            rating_gain_per_stall: 0.08,
            abandon_penalty: 0.3,
            disgust_penalty: 0.4,
            step_in_mess_penalty: 0.05,
            enter_time_ms: 350.0,
            grace_period_ms: 200.0,
            save_points: 50,
            wash_time_ms: 1000.0,
            sink_dirty_chance: 0.25,
            sink_clean_time_ms: 400.0,
            sink_points: 25,
            towel_capacity: 10,
            towel_skip_chance: 0.3,
            towel_penalty: 0.15,
            restock_points: 20,
            rush_chance: 0.15,
            rush_start_min_ms: 15_000.0,
            rush_start_max_ms: 30_000.0,
            rush_duration_ms: 8_000.0,
            rush_spawn_mult: 0.3,
            inspector_chance: 0.25,
            inspector_start_min_ms: 20_000.0,
            inspector_start_max_ms: 40_000.0,
            inspector_lead_ms: 3_000.0,
            inspector_dwell_ms: 600.0,
            inspector_verdict_delay_ms: 1_500.0,
            inspector_penalty_per_stall: 0.5,
            inspector_rating_bonus: 0.3,
            inspector_bonus_points: 100,
            inspector_speed_mult: 1.2,
            slow_spawn_mult: 2.0,
            auto_clean_points: 75,
            mess_click_boost_ms: 80.0,
            mess_click_boost_speed_ms: 160.0,
            spawn_initial_min_ms: 300.0,
            spawn_initial_max_ms: 800.0,
            mess_chances: MessChances {
                sink_splash: 0.08,
                walkway_random: 0.02,
                vomit_clean: 0.05,
                vomit_average: 0.12,
                vomit_messy: 0.25,
            },
        },
        tasks: vec![
            TaskDef {
                kind: TaskKind::Plunge,
                label: "Plunge".to_string(),
                chance: 0.3,
            },
            TaskDef {
                kind: TaskKind::Scrub,
                label: "Scrub".to_string(),
                chance: 0.75,
            },
            TaskDef {
                kind: TaskKind::Mop,
                label: "Mop".to_string(),
                chance: 0.45,
            },
            TaskDef {
                kind: TaskKind::Restock,
                label: "Restock".to_string(),
                chance: 0.4,
            },
        ],
        messes: vec![
            MessDef {
                kind: MessKind::Water,
                clean_time_ms: 200.0,
                points: 15,
                tracks: false,
            },
            MessDef {
                kind: MessKind::Pee,
                clean_time_ms: 400.0,
                points: 30,
                tracks: false,
            },
            MessDef {
                kind: MessKind::Vomit,
                clean_time_ms: 600.0,
                points: 50,
                tracks: true,
            },
            MessDef {
                kind: MessKind::Muddy,
                clean_time_ms: 250.0,
                points: 20,
                tracks: true,
            },
        ],
        milestones: vec![
            MilestoneDef {
                level: 3,
                speed_boost_ms: 3_000.0,
                rating: 0.0,
                points: 50,
            },
            MilestoneDef {
                level: 5,
                speed_boost_ms: 4_000.0,
                rating: 0.1,
                points: 100,
            },
            MilestoneDef {
                level: 10,
                speed_boost_ms: 5_000.0,
                rating: 0.3,
                points: 250,
            },
        ],
        skills: vec![
            SkillDef {
                id: SkillId::Scrub,
                effect: 0.10,
                max_level: 3,
            },
            SkillDef {
                id: SkillId::Patience,
                effect: 0.12,
                max_level: 3,
            },
            SkillDef {
                id: SkillId::Tips,
                effect: 0.15,
                max_level: 3,
            },
        ],
        items: vec![
            ItemDef {
                id: PowerupKind::Speed,
                duration_ms: 10_000.0,
                cost: 100,
            },
            ItemDef {
                id: PowerupKind::Slow,
                duration_ms: 12_000.0,
                cost: 80,
            },
            ItemDef {
                id: PowerupKind::Auto,
                duration_ms: 0.0,
                cost: 150,
            },
            ItemDef {
                id: PowerupKind::Mascot,
                duration_ms: 8_000.0,
                cost: 120,
            },
        ],
        specials: vec![
            SpecialCustomerDef {
                name: "Pop Star".to_string(),
                chance: 0.02,
                patience_mult: 0.7,
                messiness: 1,
            },
            SpecialCustomerDef {
                name: "Granny".to_string(),
                chance: 0.03,
                patience_mult: 1.5,
                messiness: -1,
            },
            SpecialCustomerDef {
                name: "Little League Coach".to_string(),
                chance: 0.025,
                patience_mult: 0.9,
                messiness: 1,
            },
        ],
        skill_unlock_order: vec![
            SkillId::Scrub,
            SkillId::Patience,
            SkillId::Tips,
            SkillId::Scrub,
            SkillId::Patience,
            SkillId::Tips,
        ],
    };
    validate_content(&content);
    content
}

/// Fresh run at shift 0, armed via `start_shift`.
pub fn build_initial_state(content: &GameContent, seed: u64, rng: &mut impl Rng) -> RunState {
    let mut state = RunState {
        meta: MetaState {
            tick: 0,
            seed,
            schema_version: 1,
            content_version: content.content_version.clone(),
        },
        shift: 0,
        score: 0,
        rating: 5.0,
        combo: 0,
        max_combo: 0,
        time_left_ms: 0.0,
        coins: 0,
        towels: content.constants.towel_capacity,
        stalls: vec![],
        sinks: vec![],
        customers: vec![],
        messes: vec![],
        spawn_timer_ms: 0.0,
        cleaning: CleaningFocus::default(),
        effects: EffectTimers::default(),
        powerups: PowerupStock::default(),
        skills: SkillLevels::default(),
        stats: ShiftStats::default(),
        rush: RushState::default(),
        inspector: InspectorSchedule::default(),
        last_milestone: 0,
        counters: Counters::default(),
        outcome: None,
    };
    rush_core::start_shift(&mut state, content, rng);
    state
}

// ---------------------------------------------------------------------------
// Saved runs
// ---------------------------------------------------------------------------

/// A snapshot can be resumed for this long; after that it is silently dropped.
pub const SAVE_EXPIRY_MINUTES: i64 = 10;

#[derive(Serialize, Deserialize)]
pub struct SavedRun {
    pub saved_at: DateTime<Utc>,
    pub state: RunState,
}

pub fn save_run(path: &Path, state: &RunState) -> Result<()> {
    let saved = SavedRun {
        saved_at: Utc::now(),
        state: state.clone(),
    };
    let json = serde_json::to_string(&saved).context("serializing saved run")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Load a saved run if one exists and is still fresh. An expired or missing
/// snapshot yields `None`; a corrupt file is an error.
pub fn load_run(path: &Path) -> Result<Option<RunState>> {
    if !path.exists() {
        return Ok(None);
    }
    let json =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let saved: SavedRun = serde_json::from_str(&json).context("parsing saved run")?;
    let age = Utc::now().signed_duration_since(saved.saved_at);
    if age > chrono::Duration::minutes(SAVE_EXPIRY_MINUTES) {
        return Ok(None);
    }
    Ok(Some(saved.state))
}

/// Drop the snapshot, if any. Called on resume and on new-game so a stale
/// save can never be loaded twice.
pub fn discard_run(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path).with_context(|| format!("removing {}", path.display()))?;
    }
    Ok(())
}
