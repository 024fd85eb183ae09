//! Customer spawning and the per-customer state machine.

use rand::Rng;

use crate::cleaning::{finish_tasks, soil_stall};
use crate::layout::{door_pos, floor_center, move_towards, sink_pos, stall_pos, towel_pos};
use crate::mess::{spawn_mess, step_in_at, PRINTS_PER_CUSTOMER, PRINT_INTERVAL_MS};
use crate::scoring::{apply_rating, break_combo};
use crate::{
    emit, Customer, CustomerId, CustomerKind, CustomerPhase, Event, EventEnvelope, GameContent,
    MessKind, RunState, SkillId, StallState,
};

/// Roll and admit a new customer once the spawn timer lapses. The active
/// population is capped; at the cap the timer simply holds.
pub(crate) fn spawn_customers(
    state: &mut RunState,
    content: &GameContent,
    rng: &mut impl Rng,
    dt: f64,
    events: &mut Vec<EventEnvelope>,
) {
    let c = &content.constants;
    if state.customers.len() >= c.max_active_customers {
        return;
    }
    state.spawn_timer_ms -= dt;
    if state.spawn_timer_ms > 0.0 {
        return;
    }

    let special = content
        .specials
        .iter()
        .find(|s| rng.gen::<f64>() < s.chance)
        .cloned();
    let urgent = rng.gen::<f64>() < c.urgent_chance;
    let vip = special.is_none() && !urgent && rng.gen::<f64>() < c.vip_chance;

    let roll = rng.gen::<f64>();
    let mut messiness: i8 = if roll < c.clean_customer_chance {
        -1
    } else if roll < c.clean_customer_chance + c.messy_customer_chance {
        1
    } else {
        0
    };

    let mut patience = c.patience_ms * (1.0 + content.skill_effect(SkillId::Patience, &state.skills));
    if urgent {
        patience *= c.urgent_patience_mult;
    }
    if vip {
        patience *= c.vip_patience_mult;
    }
    let kind = match special {
        Some(def) => {
            patience *= def.patience_mult;
            messiness = def.messiness;
            CustomerKind::Special(crate::SpecialProfile {
                name: def.name,
                patience_mult: def.patience_mult,
                messiness: def.messiness,
            })
        }
        None if vip => CustomerKind::Vip,
        None => CustomerKind::Regular,
    };

    let id = CustomerId(state.counters.next_customer_id);
    state.counters.next_customer_id += 1;
    let special_name = match &kind {
        CustomerKind::Special(p) => Some(p.name.clone()),
        _ => None,
    };
    state.customers.push(Customer {
        id,
        kind,
        phase: CustomerPhase::Enter,
        pos: door_pos(),
        patience_ms: patience,
        patience_max_ms: patience,
        urgent,
        messiness,
        stepped_in_mess: None,
        messy_feet: false,
        prints_left: 0,
        print_timer_ms: 0.0,
        distracted: false,
    });
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::CustomerArrived {
            customer: id,
            vip,
            special: special_name,
        },
    ));

    let mut interval = rng.gen_range(
        content.shift_config(state.shift).spawn_min_ms
            ..=content.shift_config(state.shift).spawn_max_ms,
    );
    if state.effects.slow_ms > 0.0 {
        interval *= c.slow_spawn_mult;
    }
    if state.rush.active {
        interval *= c.rush_spawn_mult;
    }
    state.spawn_timer_ms = interval;
}

/// Drop reservations whose holder is gone or no longer traveling here.
/// Runs before seeking so a freed stall is claimable the same tick.
pub(crate) fn sweep_stale_reservations(state: &mut RunState) {
    for idx in 0..state.stalls.len() {
        let Some(holder) = state.stalls[idx].reserved_by else {
            continue;
        };
        let still_bound = state.customers.iter().any(|cu| {
            cu.id == holder
                && matches!(
                    cu.phase,
                    CustomerPhase::ToStall { stall } | CustomerPhase::Entering { stall, .. }
                        if stall == idx
                )
        });
        if !still_bound {
            state.stalls[idx].reserved_by = None;
        }
    }
}

pub(crate) fn update_customers(
    state: &mut RunState,
    content: &GameContent,
    rng: &mut impl Rng,
    dt: f64,
    events: &mut Vec<EventEnvelope>,
) {
    let mut departed: Vec<CustomerId> = Vec::new();

    for i in 0..state.customers.len() {
        // Take a working copy to release the borrow on state.customers;
        // written back at the end of the step.
        let mut cu = state.customers[i].clone();
        cu.distracted = state.effects.mascot_ms > 0.0
            && matches!(cu.phase, CustomerPhase::Enter | CustomerPhase::SeekStall);

        let step = walk_step(content, &cu, dt);
        let mut moved = false;

        match cu.phase.clone() {
            CustomerPhase::Enter => {
                if !cu.distracted {
                    let (pos, arrived) = move_towards(cu.pos, floor_center(), step);
                    cu.pos = pos;
                    moved = true;
                    if arrived {
                        cu.phase = CustomerPhase::SeekStall;
                    }
                }
            }
            CustomerPhase::SeekStall => {
                step_seek(state, content, &mut cu, dt, events);
            }
            CustomerPhase::ToStall { stall } => {
                if !target_still_valid(state, stall, cu.id) {
                    if let Some(s) = state.stalls.get_mut(stall) {
                        if s.reserved_by == Some(cu.id) {
                            s.reserved_by = None;
                        }
                    }
                    cu.phase = CustomerPhase::SeekStall;
                } else {
                    let target = stall_pos(stall, state.stalls.len());
                    let (pos, arrived) = move_towards(cu.pos, target, step);
                    cu.pos = pos;
                    moved = true;
                    if arrived {
                        let dirty = state.stalls[stall].state == StallState::Dirty;
                        state.stalls[stall].door_open = true;
                        cu.phase = CustomerPhase::Entering {
                            stall,
                            timer_ms: content.constants.enter_time_ms,
                            grace_ms: dirty.then_some(content.constants.grace_period_ms),
                            committed_dirty: false,
                        };
                    }
                }
            }
            CustomerPhase::Entering {
                stall,
                timer_ms,
                grace_ms,
                committed_dirty,
            } => {
                step_entering(
                    state, content, rng, &mut cu, dt, stall, timer_ms, grace_ms, committed_dirty,
                    events,
                );
            }
            CustomerPhase::InStall { stall } => {
                state.stalls[stall].occupancy_ms -= dt;
                if state.stalls[stall].occupancy_ms <= 0.0 {
                    leave_stall(state, content, rng, &mut cu, stall, events);
                }
            }
            CustomerPhase::ExitStall => {
                let (pos, arrived) = move_towards(cu.pos, floor_center(), step);
                cu.pos = pos;
                moved = true;
                if arrived {
                    cu.phase = if state.sinks.iter().any(|s| !s.dirty) {
                        CustomerPhase::ToSink
                    } else {
                        CustomerPhase::Exit
                    };
                }
            }
            CustomerPhase::ToSink => {
                // Retarget every tick; sinks can dirty mid-walk.
                match state.sinks.iter().position(|s| !s.dirty) {
                    None => cu.phase = CustomerPhase::Exit,
                    Some(sink) => {
                        let (pos, arrived) = move_towards(cu.pos, sink_pos(sink), step);
                        cu.pos = pos;
                        moved = true;
                        if arrived {
                            cu.phase = CustomerPhase::Washing {
                                sink,
                                timer_ms: content.constants.wash_time_ms,
                            };
                        }
                    }
                }
            }
            CustomerPhase::Washing { sink, timer_ms } => {
                let remaining = timer_ms - dt;
                if remaining > 0.0 {
                    cu.phase = CustomerPhase::Washing {
                        sink,
                        timer_ms: remaining,
                    };
                } else {
                    finish_washing(state, content, rng, &mut cu, sink, events);
                }
            }
            CustomerPhase::ToTowels => {
                let target = towel_pos(state.sinks.len());
                let (pos, arrived) = move_towards(cu.pos, target, step);
                cu.pos = pos;
                moved = true;
                if arrived {
                    take_towel(state, content, &mut cu, events);
                }
            }
            CustomerPhase::Exit => {
                let (pos, arrived) = move_towards(cu.pos, door_pos(), step);
                cu.pos = pos;
                moved = true;
                if arrived {
                    departed.push(cu.id);
                }
            }
        }

        if moved {
            walk_side_effects(state, content, &mut cu, dt, events);
        }
        state.customers[i] = cu;
    }

    state.customers.retain(|cu| !departed.contains(&cu.id));
}

fn walk_step(content: &GameContent, cu: &Customer, dt: f64) -> f64 {
    let mut speed = content.constants.walk_speed;
    if cu.urgent {
        speed *= content.constants.urgent_speed_mult;
    }
    speed * dt / 1000.0
}

/// Mess interactions shared by every walking phase.
fn walk_side_effects(
    state: &mut RunState,
    content: &GameContent,
    cu: &mut Customer,
    dt: f64,
    events: &mut Vec<EventEnvelope>,
) {
    if cu.stepped_in_mess.is_none() {
        if let Some((mess, tracks)) = step_in_at(state, content, cu.pos, cu.id, events) {
            cu.stepped_in_mess = Some(mess);
            if tracks {
                cu.messy_feet = true;
                cu.prints_left = PRINTS_PER_CUSTOMER;
                cu.print_timer_ms = PRINT_INTERVAL_MS;
            }
        }
    }
    if cu.messy_feet {
        cu.print_timer_ms -= dt;
        if cu.print_timer_ms <= 0.0 {
            spawn_mess(state, MessKind::Muddy, cu.pos, events);
            cu.print_timer_ms = PRINT_INTERVAL_MS;
            cu.prints_left = cu.prints_left.saturating_sub(1);
            if cu.prints_left == 0 {
                cu.messy_feet = false;
            }
        }
    }
}

/// Seek a stall, lowest index first: any empty unreserved stall wins,
/// otherwise a dirty unreserved one. Patience drains only while no
/// claimable stall exists at all.
fn step_seek(
    state: &mut RunState,
    content: &GameContent,
    cu: &mut Customer,
    dt: f64,
    events: &mut Vec<EventEnvelope>,
) {
    let empty = state
        .stalls
        .iter()
        .position(|s| s.state == StallState::Empty && s.reserved_by.is_none());
    if let Some(stall) = empty {
        if !cu.distracted {
            reserve(state, cu, stall, events);
        }
        return;
    }

    if !cu.distracted {
        let dirty = state
            .stalls
            .iter()
            .position(|s| s.state == StallState::Dirty && s.reserved_by.is_none());
        if let Some(stall) = dirty {
            reserve(state, cu, stall, events);
            return;
        }
    }

    cu.patience_ms -= dt;
    if cu.patience_ms <= 0.0 {
        abandon(state, content, cu, events);
    }
}

fn reserve(state: &mut RunState, cu: &mut Customer, stall: usize, events: &mut Vec<EventEnvelope>) {
    state.stalls[stall].reserved_by = Some(cu.id);
    cu.phase = CustomerPhase::ToStall { stall };
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::StallReserved {
            customer: cu.id,
            stall,
        },
    ));
}

/// A reserved target stays valid while it is ours and still usable: an
/// occupied stall or one under active cleaning forces a re-seek.
fn target_still_valid(state: &RunState, stall: usize, id: CustomerId) -> bool {
    let Some(s) = state.stalls.get(stall) else {
        return false;
    };
    s.reserved_by == Some(id)
        && matches!(s.state, StallState::Empty | StallState::Dirty)
}

fn abandon(
    state: &mut RunState,
    content: &GameContent,
    cu: &mut Customer,
    events: &mut Vec<EventEnvelope>,
) {
    let vip_mult = if cu.kind.is_vip() { 2.0 } else { 1.0 };
    let loss = content.constants.abandon_penalty * vip_mult;
    state.stats.abandoned += 1;
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::CustomerAbandoned {
            customer: cu.id,
            rating_loss: loss,
        },
    ));
    break_combo(state, events);
    apply_rating(state, -loss, events);
    // They really had to go.
    spawn_mess(state, MessKind::Pee, cu.pos, events);
    cu.phase = CustomerPhase::Exit;
}

#[allow(clippy::too_many_arguments)]
fn step_entering(
    state: &mut RunState,
    content: &GameContent,
    rng: &mut impl Rng,
    cu: &mut Customer,
    dt: f64,
    stall: usize,
    timer_ms: f64,
    grace_ms: Option<f64>,
    committed_dirty: bool,
    events: &mut Vec<EventEnvelope>,
) {
    let c = &content.constants;
    let mut grace = grace_ms;
    let mut committed = committed_dirty;

    if let Some(g) = grace {
        if state.stalls[stall].state != StallState::Dirty {
            // Saved at the door: the clean in progress counts as finished.
            finish_tasks(state, stall);
            state.stalls[stall].state = StallState::Empty;
            state.score += c.save_points;
            state.stats.saves += 1;
            let tick = state.meta.tick;
            events.push(emit(
                &mut state.counters,
                tick,
                Event::GraceSave {
                    customer: cu.id,
                    stall,
                    points: c.save_points,
                },
            ));
            grace = None;
        } else {
            let remaining = g - dt;
            if remaining <= 0.0 {
                let vip_mult = if cu.kind.is_vip() { 2.0 } else { 1.0 };
                let loss = c.disgust_penalty * vip_mult;
                state.stats.dirty += 1;
                let tick = state.meta.tick;
                events.push(emit(
                    &mut state.counters,
                    tick,
                    Event::CustomerDisgusted {
                        customer: cu.id,
                        stall,
                        rating_loss: loss,
                    },
                ));
                break_combo(state, events);
                apply_rating(state, -loss, events);
                grace = None;
                committed = true;
            } else {
                grace = Some(remaining);
            }
        }
    }

    let remaining = timer_ms - dt;
    if remaining > 0.0 {
        cu.phase = CustomerPhase::Entering {
            stall,
            timer_ms: remaining,
            grace_ms: grace,
            committed_dirty: committed,
        };
        return;
    }

    let cfg = content.shift_config(state.shift);
    let s = &mut state.stalls[stall];
    s.state = StallState::Occupied;
    s.occupancy_ms = rng.gen_range(cfg.occupancy_min_ms..=cfg.occupancy_max_ms);
    s.reserved_by = None;
    s.door_open = false;
    s.was_vip = cu.kind.is_vip();
    s.tasks.clear();
    cu.pos = stall_pos(stall, state.stalls.len());
    cu.phase = CustomerPhase::InStall { stall };
}

fn leave_stall(
    state: &mut RunState,
    content: &GameContent,
    rng: &mut impl Rng,
    cu: &mut Customer,
    stall: usize,
    events: &mut Vec<EventEnvelope>,
) {
    state.stats.served += 1;
    let tick = state.meta.tick;
    events.push(emit(
        &mut state.counters,
        tick,
        Event::CustomerServed {
            customer: cu.id,
            stall,
        },
    ));

    soil_stall(
        state,
        content,
        rng,
        stall,
        cu.messiness,
        cu.kind.is_vip(),
        events,
    );

    let chances = &content.constants.mess_chances;
    let vomit_chance = match cu.messiness {
        i8::MIN..=-1 => chances.vomit_clean,
        0 => chances.vomit_average,
        _ => chances.vomit_messy,
    };
    if rng.gen::<f64>() < vomit_chance {
        let mut pos = stall_pos(stall, state.stalls.len());
        pos.y += 60.0;
        spawn_mess(state, MessKind::Vomit, pos, events);
    }

    cu.pos = stall_pos(stall, state.stalls.len());
    cu.phase = CustomerPhase::ExitStall;
}

fn finish_washing(
    state: &mut RunState,
    content: &GameContent,
    rng: &mut impl Rng,
    cu: &mut Customer,
    sink: usize,
    events: &mut Vec<EventEnvelope>,
) {
    let c = &content.constants;
    if rng.gen::<f64>() < c.sink_dirty_chance {
        state.sinks[sink].dirty = true;
        let tick = state.meta.tick;
        events.push(emit(
            &mut state.counters,
            tick,
            Event::SinkDirtied { sink },
        ));
    }
    if rng.gen::<f64>() < c.mess_chances.sink_splash {
        let mut pos = sink_pos(sink);
        pos.x += 50.0;
        spawn_mess(state, MessKind::Water, pos, events);
    }
    cu.phase = if rng.gen::<f64>() < c.towel_skip_chance {
        CustomerPhase::Exit
    } else {
        CustomerPhase::ToTowels
    };
}

fn take_towel(
    state: &mut RunState,
    content: &GameContent,
    cu: &mut Customer,
    events: &mut Vec<EventEnvelope>,
) {
    let tick = state.meta.tick;
    if state.towels > 0 {
        state.towels -= 1;
        let remaining = state.towels;
        events.push(emit(
            &mut state.counters,
            tick,
            Event::TowelTaken {
                customer: cu.id,
                remaining,
            },
        ));
    } else {
        let vip_mult = if cu.kind.is_vip() { 2.0 } else { 1.0 };
        let loss = content.constants.towel_penalty * vip_mult;
        events.push(emit(
            &mut state.counters,
            tick,
            Event::TowelsEmpty {
                customer: cu.id,
                rating_loss: loss,
            },
        ));
        apply_rating(state, -loss, events);
    }
    cu.phase = CustomerPhase::Exit;
}
