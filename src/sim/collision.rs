//! Circle collision and near-miss geometry
//!
//! Everything is center-distance based. The near-miss band starts a few
//! pixels outside the hit radius so one distance can never count as both.

use glam::Vec2;

use crate::consts::{DANGER_DISTANCE, NEAR_MISS_DEAD_ZONE, PASS_AXIS_OFFSET, PASS_DISTANCE};

/// Outcome of testing one obstacle against the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proximity {
    Hit,
    NearMiss,
    Clear,
}

/// Circles overlap: `dist < obstacle_radius + hitbox_radius`
#[inline]
pub fn is_hit(dist: f32, obstacle_radius: f32, hitbox_radius: f32) -> bool {
    dist < obstacle_radius + hitbox_radius
}

/// Near miss: `R + H + dead_zone < dist <= R + near_miss_radius`
#[inline]
pub fn is_near_miss(dist: f32, obstacle_radius: f32, hitbox_radius: f32, near_miss_radius: f32) -> bool {
    dist > obstacle_radius + hitbox_radius + NEAR_MISS_DEAD_ZONE
        && dist <= obstacle_radius + near_miss_radius
}

/// Classify a distance. A hit always wins over a near miss.
pub fn classify(dist: f32, obstacle_radius: f32, hitbox_radius: f32, near_miss_radius: f32) -> Proximity {
    if is_hit(dist, obstacle_radius, hitbox_radius) {
        Proximity::Hit
    } else if is_near_miss(dist, obstacle_radius, hitbox_radius, near_miss_radius) {
        Proximity::NearMiss
    } else {
        Proximity::Clear
    }
}

/// Whether an obstacle has gone past the player and should stop counting for
/// near misses: more than `PASS_DISTANCE` away, and more than
/// `PASS_AXIS_OFFSET` beyond the player on any axis it is moving along.
/// Each axis with nonzero velocity is checked on its own, not just the
/// dominant one.
pub fn has_passed(obstacle_pos: Vec2, obstacle_vel: Vec2, player_pos: Vec2) -> bool {
    if obstacle_pos.distance(player_pos) <= PASS_DISTANCE {
        return false;
    }
    (obstacle_vel.x > 0.0 && obstacle_pos.x > player_pos.x + PASS_AXIS_OFFSET)
        || (obstacle_vel.x < 0.0 && obstacle_pos.x < player_pos.x - PASS_AXIS_OFFSET)
        || (obstacle_vel.y > 0.0 && obstacle_pos.y > player_pos.y + PASS_AXIS_OFFSET)
        || (obstacle_vel.y < 0.0 && obstacle_pos.y < player_pos.y - PASS_AXIS_OFFSET)
}

/// Danger in `[0, 1]`: 0 at `DANGER_DISTANCE` or further, 1 at contact
pub fn danger_level(nearest_dist: f32) -> f32 {
    if nearest_dist < DANGER_DISTANCE {
        1.0 - nearest_dist / DANGER_DISTANCE
    } else {
        0.0
    }
}
