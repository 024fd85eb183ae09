//! Floor geometry in abstract units.
//!
//! Stalls line the top wall, sinks the left wall, the towel dispenser sits
//! next to the last sink, the door is on the bottom edge. The presentation
//! layer scales these to pixels; the core only uses them for travel timing
//! and mess placement.

use crate::Vec2;

pub const FLOOR_WIDTH: f64 = 800.0;
pub const FLOOR_HEIGHT: f64 = 600.0;

/// Distance at which an agent counts as "arrived" at its target.
pub const ARRIVE_EPSILON: f64 = 4.0;

pub fn door_pos() -> Vec2 {
    Vec2::new(FLOOR_WIDTH / 2.0, FLOOR_HEIGHT)
}

pub fn floor_center() -> Vec2 {
    Vec2::new(FLOOR_WIDTH / 2.0, FLOOR_HEIGHT * 0.6)
}

pub fn stall_pos(index: usize, count: usize) -> Vec2 {
    let slot = FLOOR_WIDTH / count.max(1) as f64;
    Vec2::new(slot * (index as f64 + 0.5), 60.0)
}

pub fn sink_pos(index: usize) -> Vec2 {
    Vec2::new(40.0, 180.0 + 90.0 * index as f64)
}

pub fn towel_pos(sink_count: usize) -> Vec2 {
    Vec2::new(40.0, 180.0 + 90.0 * sink_count as f64)
}

/// Move `from` toward `to` by at most `step` units. Returns the new position
/// and whether the target was reached this step.
pub fn move_towards(from: Vec2, to: Vec2, step: f64) -> (Vec2, bool) {
    let dist = from.distance(to);
    if dist <= step || dist <= ARRIVE_EPSILON {
        return (to, true);
    }
    let t = step / dist;
    (
        Vec2::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t),
        false,
    )
}

/// Random point inside the central walkway, away from fixtures.
pub fn random_walkway_point(rng: &mut impl rand::Rng) -> Vec2 {
    Vec2::new(
        rng.gen_range(120.0..FLOOR_WIDTH - 60.0),
        rng.gen_range(160.0..FLOOR_HEIGHT - 80.0),
    )
}
