//! Player-drawn strokes and ball reflection
//!
//! A stroke is an ordered polyline painted by the player. It reflects the
//! first ball that touches it and is consumed by that single collision.

use glam::Vec2;

use super::ball::Ball;
use crate::consts::*;
use crate::dist_to_segment;

/// A player-drawn polyline, usable once to reflect a ball
#[derive(Debug, Clone, Default)]
pub struct Stroke {
    pub id: u32,
    points: Vec<Vec2>,
    removed: bool,
    /// One-shot guard so a single resolution pass reflects at most once;
    /// cleared for all live strokes at the start of every tick
    collision_handled: bool,
}

impl Stroke {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Append a point, dropping the oldest once the cap is reached
    pub fn add_point(&mut self, point: Vec2) {
        self.points.push(point);
        if self.points.len() > STROKE_MAX_POINTS {
            self.points.remove(0);
        }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn last_point(&self) -> Option<Vec2> {
        self.points.last().copied()
    }

    /// Mark for removal; purged from the active set next tick
    pub fn mark_removed(&mut self) {
        self.removed = true;
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn reset_collision_flag(&mut self) {
        self.collision_handled = false;
    }

    /// Whether the ball currently touches any segment of this stroke
    pub fn collides_with(&self, ball: &Ball) -> bool {
        self.segments()
            .any(|(p1, p2)| dist_to_segment(ball.pos, p1, p2) <= ball.radius)
    }

    /// Reflect the ball off the first qualifying segment (insertion order).
    ///
    /// Returns true if a reflection happened. The one-shot guard makes a
    /// second call within the same tick a no-op.
    pub fn try_reflect(&mut self, ball: &mut Ball) -> bool {
        if self.removed || self.collision_handled {
            return false;
        }
        let hit = self
            .segments()
            .find(|&(p1, p2)| dist_to_segment(ball.pos, p1, p2) <= ball.radius);
        let Some((p1, p2)) = hit else {
            return false;
        };
        ball.vel = reflect(ball.vel, unit_normal(p2 - p1));
        self.collision_handled = true;
        true
    }

    /// Whether `point` lies on the stroke, within half the stroke width
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.segments()
            .any(|(p1, p2)| dist_to_segment(point, p1, p2) <= STROKE_WIDTH / 2.0)
    }

    fn segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Reflect velocity off a surface: v' = v - 2(v.n)n
#[inline]
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Unit normal of a segment direction vector
#[inline]
fn unit_normal(direction: Vec2) -> Vec2 {
    Vec2::new(-direction.y, direction.x).normalize_or_zero()
}
