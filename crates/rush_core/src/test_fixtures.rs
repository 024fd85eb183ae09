//! Shared test fixtures for rush_core and downstream crates.
//!
//! `base_content()` provides a full-featured `GameContent` with every random
//! chance pinned (mostly to 0 or 1) so tick-level tests are deterministic.
//! `base_state(&content)` is a fresh shift-0 run with nobody on the floor.

use crate::{
    CleaningFocus, Constants, Counters, EffectTimers, GameContent, InspectorSchedule, ItemDef,
    MessChances, MessDef, MessKind, MetaState, MilestoneDef, PowerupKind, PowerupStock, RunState,
    RushState, ShiftConfig, ShiftStats, Sink, SkillDef, SkillId, SkillLevels, Stall, TaskDef,
    TaskKind,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Full-featured content with deterministic rolls: only Scrub ever generates,
/// sinks never dirty, nobody skips towels, no specials, no urgency or VIPs.
/// Tests that need a specific roll override the field they care about.
pub fn base_content() -> GameContent {
    GameContent {
        content_version: "test".to_string(),
        shifts: vec![ShiftConfig {
            stalls: 3,
            sinks: 2,
            // Fixed ranges so spawn and occupancy timing is deterministic.
            spawn_min_ms: 500.0,
            spawn_max_ms: 500.0,
            occupancy_min_ms: 1000.0,
            occupancy_max_ms: 1000.0,
            duration_secs: 60.0,
        }],
        constants: Constants {
            max_frame_ms: 100.0,
            walk_speed: 120.0,
            urgent_speed_mult: 1.4,
            max_active_customers: 12,
            patience_ms: 10_000.0,
            urgent_chance: 0.0,
            urgent_patience_mult: 0.6,
            vip_chance: 0.0,
            vip_patience_mult: 0.8,
            clean_customer_chance: 0.0,
            messy_customer_chance: 0.0,
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
            sink_dirty_chance: 0.0,
            sink_clean_time_ms: 400.0,
            sink_points: 25,
            towel_capacity: 10,
            towel_skip_chance: 0.0,
            towel_penalty: 0.15,
            restock_points: 20,
            rush_chance: 0.0,
            rush_start_min_ms: 15_000.0,
            rush_start_max_ms: 15_000.0,
            rush_duration_ms: 8_000.0,
            rush_spawn_mult: 0.3,
            inspector_chance: 0.0,
            inspector_start_min_ms: 20_000.0,
            inspector_start_max_ms: 20_000.0,
            inspector_lead_ms: 3_000.0,
            inspector_dwell_ms: 600.0,
            inspector_verdict_delay_ms: 1_500.0,
            inspector_penalty_per_stall: 0.5,
            inspector_rating_bonus: 0.3,
            inspector_bonus_points: 100,
            inspector_speed_mult: 1.0,
            slow_spawn_mult: 2.0,
            auto_clean_points: 75,
            mess_click_boost_ms: 80.0,
            mess_click_boost_speed_ms: 160.0,
            spawn_initial_min_ms: 500.0,
            spawn_initial_max_ms: 500.0,
            mess_chances: MessChances {
                sink_splash: 0.0,
                walkway_random: 0.0,
                vomit_clean: 0.0,
                vomit_average: 0.0,
                vomit_messy: 0.0,
            },
        },
        tasks: vec![
            TaskDef {
                kind: TaskKind::Plunge,
                label: "Plunge".to_string(),
                chance: 0.0,
            },
            TaskDef {
                kind: TaskKind::Scrub,
                label: "Scrub".to_string(),
                chance: 1.0,
            },
            TaskDef {
                kind: TaskKind::Mop,
                label: "Mop".to_string(),
                chance: 0.0,
            },
            TaskDef {
                kind: TaskKind::Restock,
                label: "Restock".to_string(),
                chance: 0.0,
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
        specials: vec![],
        skill_unlock_order: vec![
            SkillId::Scrub,
            SkillId::Patience,
            SkillId::Tips,
            SkillId::Scrub,
            SkillId::Patience,
            SkillId::Tips,
        ],
    }
}

/// Fresh shift-0 run: empty floor, full towels, full rating.
pub fn base_state(content: &GameContent) -> RunState {
    let cfg = content.shift_config(0);
    RunState {
        meta: MetaState {
            tick: 0,
            seed: 42,
            schema_version: 1,
            content_version: content.content_version.clone(),
        },
        shift: 0,
        score: 0,
        rating: crate::scoring::RATING_MAX,
        combo: 0,
        max_combo: 0,
        time_left_ms: cfg.duration_secs * 1000.0,
        coins: 0,
        towels: content.constants.towel_capacity,
        stalls: (0..cfg.stalls).map(|_| Stall::new()).collect(),
        sinks: (0..cfg.sinks).map(|_| Sink::default()).collect(),
        customers: vec![],
        messes: vec![],
        spawn_timer_ms: 500.0,
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
    }
}

/// Deterministic RNG seeded with 42.
pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}
