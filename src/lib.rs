//! Inkgrid - a grid-based ink-drawing arcade puzzle game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ball physics, hole capture, strokes, level state machine)
//! - `config`: Data-driven level configuration
//!
//! The simulation is headless: rendering, asset loading and raw input capture
//! are collaborators of the embedding application. The core exposes read-only
//! snapshots of the board, entities and state-machine flags each tick.

pub mod config;
pub mod sim;

pub use config::{GameConfig, LevelConfig};
pub use sim::{GameState, TickInput, tick};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Size of one board cell in pixels
    pub const CELL_SIZE: f32 = 32.0;
    /// Height of the top bar; the playfield starts below it
    pub const TOP_BAR: f32 = 64.0;
    /// Number of columns/rows on the board
    pub const BOARD_SIZE: usize = 18;
    /// Window width (18 * 32)
    pub const WIDTH: f32 = 576.0;
    /// Window height (playfield + top bar)
    pub const HEIGHT: f32 = 640.0;
    /// Simulation steps per second
    pub const FPS: u32 = 30;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 12.0;
    pub const BALL_MIN_SPEED: f32 = 0.1;
    pub const BALL_MAX_SPEED: f32 = 5.0;
    /// Velocity components below this are treated as no movement on that axis
    pub const VELOCITY_EPSILON: f32 = 0.00001;

    /// Hole attraction radius in pixels
    pub const ATTRACTION_RADIUS: f32 = 32.0;
    /// Fraction of the ball-to-hole vector added to velocity per tick
    pub const ATTRACTION_FORCE: f32 = 0.005;
    /// Center distance below which the ball is captured
    pub const CAPTURE_DISTANCE: f32 = 15.0;
    /// Radius below which the ball counts as captured
    pub const CAPTURE_SIZE: f32 = 3.0;

    /// Timed tile opacity lost per tick (from 255 down to 0)
    pub const TILE_ALPHA_DECREMENT: f32 = 0.5;

    /// Stroke defaults
    pub const STROKE_WIDTH: f32 = 10.0;
    pub const STROKE_MAX_POINTS: usize = 600;
    /// Minimum cursor travel before a new stroke point is recorded
    pub const STROKE_POINT_THRESHOLD: f32 = 5.0;
    /// Maximum new stroke points accepted per tick
    pub const STROKE_POINTS_PER_TICK: usize = 5;

    /// Ticks the spawn-queue slide animation takes before the head is popped
    pub const QUEUE_SHIFT_TICKS: u32 = 30;

    /// Milliseconds between drain-thread steps during the victory sequence
    pub const DRAIN_STEP_MS: u64 = 67;
}

/// Squared distance between two points
#[inline]
pub fn dist_sq(a: Vec2, b: Vec2) -> f32 {
    (b - a).length_squared()
}

/// Shortest distance from `point` to the segment `start`..`end`.
///
/// The projection parameter is clamped to [0, 1]; a zero-length segment
/// degenerates to point distance.
pub fn dist_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let length_sq = dist_sq(start, end);
    if length_sq == 0.0 {
        return point.distance(start);
    }
    let t = ((point - start).dot(end - start) / length_sq).clamp(0.0, 1.0);
    let proj = start + (end - start) * t;
    point.distance(proj)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dist_to_segment_projection() {
        let d = dist_to_segment(Vec2::new(5.0, 3.0), Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        assert!((d - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_dist_to_segment_clamps_to_endpoints() {
        let d = dist_to_segment(Vec2::new(-4.0, 3.0), Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        assert!((d - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_dist_to_segment_degenerate() {
        let p = Vec2::new(1.0, 1.0);
        let d = dist_to_segment(Vec2::new(4.0, 5.0), p, p);
        assert!((d - 5.0).abs() < 0.001);
    }
}
