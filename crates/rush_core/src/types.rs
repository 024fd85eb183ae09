//! Type definitions for `rush_core`.
//!
//! All public state, content, input, and event types used by the simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! counter_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

counter_id!(CustomerId);
counter_id!(MessId);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Floor position in abstract floor units. The presentation layer decides how
/// units map to pixels; the core only needs consistent distances for travel
/// timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ---------------------------------------------------------------------------
// Core enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StallState {
    Empty,
    Occupied,
    Dirty,
    Cleaning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Plunge,
    Scrub,
    Mop,
    Restock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessKind {
    Water,
    Pee,
    Vomit,
    Muddy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    /// 2x cleaning speed for a duration.
    Speed,
    /// Customer spawn interval doubled for a duration.
    Slow,
    /// Instantly cleans the first dirty stall.
    Auto,
    /// Mascot walk: distracts customers who are entering or seeking.
    Mascot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillId {
    /// Reduces effective task time.
    Scrub,
    /// Increases customer patience.
    Patience,
    /// Increases coins earned at shift end.
    Tips,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    F,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

/// How the current run ended. `None` on `RunState` while a shift is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Shift clock ran out with rating above zero.
    ShiftComplete,
    /// Rating hit zero — terminal, reported exactly once.
    RunFailed,
}

// ---------------------------------------------------------------------------
// Resources: stalls, sinks, messes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskItem {
    pub kind: TaskKind,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stall {
    pub state: StallState,
    /// Remaining occupancy when `state == Occupied`.
    pub occupancy_ms: f64,
    /// Generated at the moment the stall turns dirty, not at cleaning start.
    pub tasks: Vec<TaskItem>,
    pub door_open: bool,
    /// Exclusive claim while a customer travels here. At most one holder.
    pub reserved_by: Option<CustomerId>,
    pub was_vip: bool,
    /// Messiness of the departing customer: -1 clean, 0 average, 1 messy.
    pub messiness: i8,
}

impl Stall {
    pub fn new() -> Self {
        Self {
            state: StallState::Empty,
            occupancy_ms: 0.0,
            tasks: Vec::new(),
            door_open: false,
            reserved_by: None,
            was_vip: false,
            messiness: 0,
        }
    }
}

impl Default for Stall {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sink {
    pub dirty: bool,
    pub cleaning: bool,
    pub progress_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mess {
    pub id: MessId,
    pub kind: MessKind,
    pub pos: Vec2,
    pub cleaning: bool,
    pub progress_ms: f64,
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

/// Named special character profile (content-defined).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialProfile {
    pub name: String,
    pub patience_mult: f64,
    pub messiness: i8,
}

/// Regular customers carry no extra data; specials keep their profile so the
/// presentation layer can show flavor. VIP status doubles rewards and
/// penalties tied to this customer's outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CustomerKind {
    Regular,
    Vip,
    Special(SpecialProfile),
}

impl CustomerKind {
    pub fn is_vip(&self) -> bool {
        matches!(self, CustomerKind::Vip)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CustomerPhase {
    /// Walking from the door toward the floor center.
    Enter,
    /// Scanning for a stall. Patience drains here while no qualifying empty
    /// stall exists.
    SeekStall,
    /// Traveling to a reserved stall.
    ToStall { stall: usize },
    /// Crossing the threshold. Grace window runs here if the stall was dirty
    /// on arrival.
    Entering {
        stall: usize,
        timer_ms: f64,
        /// Remaining grace window, if the stall was dirty on arrival.
        grace_ms: Option<f64>,
        /// Set once the grace window expires — no more redirection.
        committed_dirty: bool,
    },
    InStall { stall: usize },
    /// Stepping back out onto the floor after occupancy ends.
    ExitStall,
    /// Heading to the first clean sink (retargeted every tick).
    ToSink,
    Washing { sink: usize, timer_ms: f64 },
    ToTowels,
    /// Walking out. Removal happens on reaching the door.
    Exit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub kind: CustomerKind,
    pub phase: CustomerPhase,
    pub pos: Vec2,
    pub patience_ms: f64,
    pub patience_max_ms: f64,
    /// Urgent customers walk faster and start with reduced patience.
    pub urgent: bool,
    /// -1 clean, 0 average, 1 messy. Drives task generation after their visit.
    pub messiness: i8,
    /// Mess they already stepped in — the penalty applies once per customer.
    pub stepped_in_mess: Option<MessId>,
    /// Tracks mud/vomit on shoes; sheds muddy prints while walking.
    pub messy_feet: bool,
    /// Footprints still to be shed while `messy_feet` is set.
    pub prints_left: u8,
    /// Cooldown between consecutive footprints.
    pub print_timer_ms: f64,
    /// Mascot walk effect: suspends seeking/entering movement.
    pub distracted: bool,
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaState {
    pub tick: u64,
    pub seed: u64,
    pub schema_version: u32,
    pub content_version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counters {
    pub next_event_id: u64,
    pub next_input_id: u64,
    pub next_customer_id: u64,
    pub next_mess_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftStats {
    pub cleaned: u32,
    pub served: u32,
    /// Dirty-stall penalty events (grace-period failures).
    pub dirty: u32,
    pub abandoned: u32,
    pub saves: u32,
}

/// Which stall/sub-task currently receives player-accelerated progress.
/// At most one of each at any time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningFocus {
    pub active_stall: Option<usize>,
    pub active_task: Option<usize>,
    pub progress_ms: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectTimers {
    pub speed_ms: f64,
    pub slow_ms: f64,
    pub mascot_ms: f64,
    /// Cleaning-speed boost granted by combo milestones.
    pub combo_boost_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerupStock {
    pub speed: u32,
    pub slow: u32,
    pub auto: u32,
    pub mascot: u32,
}

impl Default for PowerupStock {
    fn default() -> Self {
        // One of each basic consumable at run start; extras carry over.
        Self {
            speed: 1,
            slow: 1,
            auto: 0,
            mascot: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillLevels {
    pub scrub: u32,
    pub patience: u32,
    pub tips: u32,
}

impl SkillLevels {
    pub fn level(&self, id: SkillId) -> u32 {
        match id {
            SkillId::Scrub => self.scrub,
            SkillId::Patience => self.patience,
            SkillId::Tips => self.tips,
        }
    }

    pub fn level_mut(&mut self, id: SkillId) -> &mut u32 {
        match id {
            SkillId::Scrub => &mut self.scrub,
            SkillId::Patience => &mut self.patience,
            SkillId::Tips => &mut self.tips,
        }
    }
}

/// Rush-hour event: a one-shot countdown followed by an active window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RushState {
    /// Countdown until rush hour starts. Zero means not armed.
    pub timer_ms: f64,
    pub active: bool,
    pub remaining_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectorPhase {
    Enter,
    /// Visits each stall in index order with a fixed dwell per stall.
    Inspect,
    /// Fixed countdown before the verdict is applied.
    Counting,
    Leave,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspector {
    pub pos: Vec2,
    pub phase: InspectorPhase,
    pub current_stall: usize,
    pub violations: u32,
    pub dwell_ms: f64,
    pub countdown_ms: f64,
}

/// Inspector scheduling layered over the live agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InspectorSchedule {
    /// Countdown until the inspector arrives. Zero means not armed.
    pub timer_ms: f64,
    pub warned: bool,
    pub visitor: Option<Inspector>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub meta: MetaState,
    pub shift: usize,
    pub score: u64,
    /// Bounded [0, 5]. Reaching 0 is terminal.
    pub rating: f32,
    pub combo: u32,
    pub max_combo: u32,
    pub time_left_ms: f64,
    pub coins: u64,
    pub towels: u32,
    pub stalls: Vec<Stall>,
    pub sinks: Vec<Sink>,
    pub customers: Vec<Customer>,
    pub messes: Vec<Mess>,
    pub spawn_timer_ms: f64,
    pub cleaning: CleaningFocus,
    pub effects: EffectTimers,
    pub powerups: PowerupStock,
    pub skills: SkillLevels,
    pub stats: ShiftStats,
    pub rush: RushState,
    pub inspector: InspectorSchedule,
    /// Highest milestone level already triggered this streak.
    pub last_milestone: u32,
    pub counters: Counters,
    pub outcome: Option<RunOutcome>,
}

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// A player interaction. External clicks are queued and applied atomically at
/// the next tick boundary — never mid-tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerInput {
    /// Tap a dirty/cleaning stall: begins cleaning and focuses it.
    ClickStall { stall: usize },
    /// Tap a sub-task button: boosts progress if it is the active task,
    /// otherwise switches focus to it (resetting progress).
    ClickTask { stall: usize, task: usize },
    /// Tap a dirty sink to start its cleanup.
    ClickSink { sink: usize },
    /// Tap a floor mess: first tap starts cleaning, further taps boost it.
    ClickMess { mess: MessId },
    /// Refill the towel dispenser.
    RestockTowels,
    UsePowerup { kind: PowerupKind },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputEnvelope {
    pub id: InputId,
    pub issued_tick: u64,
    pub execute_at_tick: u64,
    pub input: PlayerInput,
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub tick: u64,
    pub event: Event,
}

/// Everything the presentation layer needs to trigger sound/animation/DOM
/// updates. The core never performs side effects itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CustomerArrived {
        customer: CustomerId,
        vip: bool,
        special: Option<String>,
    },
    StallReserved {
        customer: CustomerId,
        stall: usize,
    },
    CustomerServed {
        customer: CustomerId,
        stall: usize,
    },
    StallSoiled {
        stall: usize,
        task_count: usize,
    },
    CleaningStarted {
        stall: usize,
    },
    SubTaskCompleted {
        stall: usize,
        task: TaskKind,
    },
    StallCleaned {
        stall: usize,
        points: u64,
        combo: u32,
        vip: bool,
    },
    GraceSave {
        customer: CustomerId,
        stall: usize,
        points: u64,
    },
    CustomerDisgusted {
        customer: CustomerId,
        stall: usize,
        rating_loss: f32,
    },
    CustomerAbandoned {
        customer: CustomerId,
        rating_loss: f32,
    },
    ComboBroken {
        had_combo: u32,
    },
    MilestoneReached {
        level: u32,
        points: u64,
    },
    SteppedInMess {
        customer: CustomerId,
        mess: MessId,
    },
    MessSpawned {
        mess: MessId,
        kind: MessKind,
    },
    MessCleaned {
        mess: MessId,
        points: u64,
    },
    SinkDirtied {
        sink: usize,
    },
    SinkCleaned {
        sink: usize,
        points: u64,
    },
    TowelTaken {
        customer: CustomerId,
        remaining: u32,
    },
    TowelsEmpty {
        customer: CustomerId,
        rating_loss: f32,
    },
    TowelsRestocked {
        points: u64,
    },
    PowerupActivated {
        kind: PowerupKind,
    },
    RushHourStarted,
    RushHourEnded,
    InspectorWarning,
    InspectorArrived,
    InspectorCheckedStall {
        stall: usize,
        violation: bool,
    },
    InspectorVerdict {
        violations: u32,
        rating_delta: f32,
        bonus_points: u64,
    },
    InspectorLeft,
    ShiftEnded {
        shift: usize,
        score: u64,
        rating: f32,
        max_combo: u32,
    },
    RunFailed {
        shift: usize,
        score: u64,
    },
}

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

/// Immutable per-level parameters. Selected by shift index; out-of-range
/// indexes clamp to the last entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftConfig {
    pub stalls: usize,
    pub sinks: usize,
    pub spawn_min_ms: f64,
    pub spawn_max_ms: f64,
    pub occupancy_min_ms: f64,
    pub occupancy_max_ms: f64,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDef {
    pub kind: TaskKind,
    pub label: String,
    /// Base inclusion probability when a stall turns dirty.
    pub chance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessDef {
    pub kind: MessKind,
    pub clean_time_ms: f64,
    pub points: u64,
    /// Leaves footprints when stepped in.
    pub tracks: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneDef {
    pub level: u32,
    pub speed_boost_ms: f64,
    pub rating: f32,
    pub points: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: SkillId,
    /// Per-level effect magnitude (fractional).
    pub effect: f64,
    pub max_level: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: PowerupKind,
    pub duration_ms: f64,
    pub cost: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialCustomerDef {
    pub name: String,
    pub chance: f64,
    pub patience_mult: f64,
    pub messiness: i8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessChances {
    /// Water puddle after sink use.
    pub sink_splash: f64,
    /// Random walkway mess per second during rush hour.
    pub walkway_random: f64,
    /// Vomit on stall exit: [clean, average, messy] by customer messiness.
    pub vomit_clean: f64,
    pub vomit_average: f64,
    pub vomit_messy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constants {
    /// Maximum wall-clock delta fed into one update step.
    pub max_frame_ms: f64,
    pub walk_speed: f64,
    pub urgent_speed_mult: f64,
    pub max_active_customers: usize,

    pub patience_ms: f64,
    pub urgent_chance: f64,
    pub urgent_patience_mult: f64,
    pub vip_chance: f64,
    pub vip_patience_mult: f64,
    /// Messiness roll: < clean_chance → clean; < clean_chance + messy_chance → messy.
    pub clean_customer_chance: f64,
    pub messy_customer_chance: f64,

    pub base_task_time_ms: f64,
    pub click_boost_ms: f64,
    /// Auto progress per elapsed millisecond while a task is focused.
    pub auto_progress_rate: f64,
    /// Task-time multiplier while a combo boost is active.
    pub combo_boost_task_mult: f64,
    pub clean_task_chance_mult: f64,
    pub messy_task_chance_mult: f64,
    pub messy_min_tasks: usize,

    pub base_points: u64,
    pub combo_weight: f64,
    pub rating_gain_per_stall: f32,
    pub abandon_penalty: f32,
    pub disgust_penalty: f32,
    pub step_in_mess_penalty: f32,

    pub enter_time_ms: f64,
    pub grace_period_ms: f64,
    pub save_points: u64,

    pub wash_time_ms: f64,
    pub sink_dirty_chance: f64,
    pub sink_clean_time_ms: f64,
    pub sink_points: u64,
    pub towel_capacity: u32,
    pub towel_skip_chance: f64,
    pub towel_penalty: f32,
    pub restock_points: u64,

    pub rush_chance: f64,
    pub rush_start_min_ms: f64,
    pub rush_start_max_ms: f64,
    pub rush_duration_ms: f64,
    /// Spawn-interval multiplier while rush hour is active.
    pub rush_spawn_mult: f64,

    pub inspector_chance: f64,
    pub inspector_start_min_ms: f64,
    pub inspector_start_max_ms: f64,
    pub inspector_lead_ms: f64,
    pub inspector_dwell_ms: f64,
    pub inspector_verdict_delay_ms: f64,
    pub inspector_penalty_per_stall: f32,
    pub inspector_rating_bonus: f32,
    pub inspector_bonus_points: u64,
    /// Inspector walk-speed multiplier relative to customers.
    pub inspector_speed_mult: f64,

    pub slow_spawn_mult: f64,
    pub auto_clean_points: u64,
    /// Click-boost for messes without/with the speed effect.
    pub mess_click_boost_ms: f64,
    pub mess_click_boost_speed_ms: f64,

    pub spawn_initial_min_ms: f64,
    pub spawn_initial_max_ms: f64,
    pub mess_chances: MessChances,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameContent {
    pub content_version: String,
    pub shifts: Vec<ShiftConfig>,
    pub constants: Constants,
    pub tasks: Vec<TaskDef>,
    pub messes: Vec<MessDef>,
    pub milestones: Vec<MilestoneDef>,
    pub skills: Vec<SkillDef>,
    pub items: Vec<ItemDef>,
    pub specials: Vec<SpecialCustomerDef>,
    /// Which skill levels up after each completed shift, in order.
    pub skill_unlock_order: Vec<SkillId>,
}

impl GameContent {
    /// Shift config for the given index, clamped to the last defined shift.
    pub fn shift_config(&self, shift: usize) -> &ShiftConfig {
        let idx = shift.min(self.shifts.len().saturating_sub(1));
        &self.shifts[idx]
    }

    pub fn mess_def(&self, kind: MessKind) -> &MessDef {
        self.messes
            .iter()
            .find(|m| m.kind == kind)
            .unwrap_or_else(|| panic!("mess kind {kind:?} not found in content"))
    }

    pub fn item_def(&self, id: PowerupKind) -> Option<&ItemDef> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn skill_effect(&self, id: SkillId, levels: &SkillLevels) -> f64 {
        self.skills
            .iter()
            .find(|s| s.id == id)
            .map_or(0.0, |s| s.effect * f64::from(levels.level(id)))
    }
}
