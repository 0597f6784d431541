//! Ball kinematics, wall collision and hole capture
//!
//! The collision order inside [`Ball::tick`] is load-bearing: horizontal wall
//! check, then vertical, then drift correction, then playfield-edge bounce,
//! then the speed clamp. Reordering these changes bounce trajectories.

use glam::Vec2;

use super::board::{Board, Color, Hole, Tile, TimedTile};
use crate::consts::*;

/// Result of a ball being swallowed by a hole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOutcome {
    /// Color the ball had at capture time
    pub color: Color,
    /// Whether the colors matched (grey is wild on either side)
    pub success: bool,
}

/// A moving circular entity
#[derive(Debug, Clone, Copy)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Shrinks while inside a hole's attraction radius
    pub radius: f32,
    pub color: Color,
    captured: bool,
}

impl Ball {
    pub fn new(pos: Vec2, vel: Vec2, color: Color) -> Self {
        Self {
            pos,
            vel,
            radius: BALL_RADIUS,
            color,
            captured: false,
        }
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Advance one tick: move, resolve wall and edge collisions, clamp speed
    pub fn tick(&mut self, board: &Board, timed_tiles: &[TimedTile]) {
        if self.captured {
            return;
        }

        let prev = self.pos;
        self.pos += self.vel;

        let col = column_at(self.pos.x);
        let row = row_at(self.pos.y);
        self.resolve_wall(board, timed_tiles, col, row, true);
        self.resolve_wall(board, timed_tiles, col, row, false);

        // A numerically negligible velocity component means no real movement
        // on that axis; restore it so the ball cannot drift sideways.
        if self.vel.x.abs() < VELOCITY_EPSILON {
            self.pos.x = prev.x;
        }
        if self.vel.y.abs() < VELOCITY_EPSILON {
            self.pos.y = prev.y;
        }

        self.bounce_off_edges();
        self.clamp_speed();
    }

    /// Check the cell under the ball's leading edge on one axis and invert
    /// that axis's velocity on wall contact. Colored variants recolor the
    /// ball; the universal wall and timed walls do not.
    fn resolve_wall(
        &mut self,
        board: &Board,
        timed_tiles: &[TimedTile],
        col: i32,
        row: i32,
        horizontal: bool,
    ) {
        let (vel, pos) = if horizontal {
            (self.vel.x, self.pos.x)
        } else {
            (self.vel.y, self.pos.y)
        };
        let front_edge = if vel > 0.0 {
            pos + self.radius
        } else {
            pos - self.radius
        };

        let (target_col, target_row) = if horizontal {
            (column_at(front_edge), row)
        } else {
            (col, row_at(front_edge))
        };

        if is_wall(board, timed_tiles, target_col, target_row) {
            if let Some(color) = board.tile(target_col, target_row).recolor() {
                self.color = color;
            }
            if horizontal {
                self.vel.x = -self.vel.x;
            } else {
                self.vel.y = -self.vel.y;
            }
        }
    }

    /// Bounce off the playfield edges. The top bound is the bottom of the
    /// top bar, the other three are the window edges.
    fn bounce_off_edges(&mut self) {
        if self.pos.x - self.radius < 0.0 || self.pos.x + self.radius > WIDTH {
            self.vel.x = -self.vel.x;
        }
        if self.pos.y - self.radius < TOP_BAR || self.pos.y + self.radius > HEIGHT {
            self.vel.y = -self.vel.y;
        }
    }

    /// Clamp speed magnitude into [BALL_MIN_SPEED, BALL_MAX_SPEED], scaling
    /// down proportionally when too fast and snapping both components to
    /// +-MIN_SPEED (sign preserved) when about to stall.
    fn clamp_speed(&mut self) {
        let speed = self.vel.length();
        if speed > BALL_MAX_SPEED {
            self.vel *= BALL_MAX_SPEED / speed;
        }
        if speed < BALL_MIN_SPEED {
            self.vel.x = signum_or_zero(self.vel.x) * BALL_MIN_SPEED;
            self.vel.y = signum_or_zero(self.vel.y) * BALL_MIN_SPEED;
        }
    }

    /// Pull the ball toward a hole and resolve capture when it gets close
    /// enough or shrinks below the capture size.
    ///
    /// Returns `Some` exactly once, at the moment of capture; the caller
    /// removes the ball and settles the score/queue side effects.
    pub fn attract_to_hole(&mut self, hole: &Hole) -> Option<CaptureOutcome> {
        if self.captured {
            return None;
        }

        let center = hole.center();
        let distance = self.pos.distance(center);
        if distance > ATTRACTION_RADIUS {
            return None;
        }

        // 0.5% of the ball-to-center vector, added to velocity each tick
        self.vel += (center - self.pos) * ATTRACTION_FORCE;

        // Shrink proportionally to distance; the map deliberately
        // extrapolates past [0.2, 1.0] just outside one cell's distance
        let shrink = map_range(distance, 0.0, CELL_SIZE, 0.2, 1.0);
        self.radius = BALL_RADIUS * shrink;

        if distance < CAPTURE_DISTANCE || self.radius < CAPTURE_SIZE {
            self.captured = true;
            return Some(CaptureOutcome {
                color: self.color,
                success: self.color.matches(hole.color),
            });
        }
        None
    }
}

/// Board column under an x pixel coordinate, clamped to board bounds
fn column_at(x: f32) -> i32 {
    ((x / CELL_SIZE) as i32).clamp(0, BOARD_SIZE as i32 - 1)
}

/// Board row under a y pixel coordinate (playfield starts below the top bar)
fn row_at(y: f32) -> i32 {
    (((y - TOP_BAR) / CELL_SIZE) as i32).clamp(0, BOARD_SIZE as i32 - 1)
}

/// True if the cell is a fixed wall or a still-active timed wall
fn is_wall(board: &Board, timed_tiles: &[TimedTile], col: i32, row: i32) -> bool {
    if board.is_static_wall(col, row) {
        return true;
    }
    if board.tile(col, row) == Tile::TimedWall {
        return timed_tiles
            .iter()
            .any(|t| t.col as i32 == col && t.row as i32 == row && t.is_active());
    }
    false
}

/// Sign of `v`, or zero for exactly zero (so a dead axis stays dead)
#[inline]
fn signum_or_zero(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Linear interpolation of `value` from [in_min, in_max] onto
/// [out_min, out_max], without clamping
#[inline]
fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    out_min + (value - in_min) / (in_max - in_min) * (out_max - out_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::board::Level;
    use proptest::prelude::*;

    fn open_board() -> Board {
        Board::default()
    }

    #[test]
    fn test_ball_moves_by_velocity() {
        let mut ball = Ball::new(Vec2::new(100.0, 200.0), Vec2::new(2.0, -1.5), Color::Grey);
        ball.tick(&open_board(), &[]);
        assert_eq!(ball.pos, Vec2::new(102.0, 198.5));
    }

    #[test]
    fn test_wall_bounce_flips_velocity_and_recolors() {
        // Orange wall at column 5, row 0; ball moving right into it
        let level = Level::parse("     1");
        let mut ball = Ball::new(
            Vec2::new(5.0 * CELL_SIZE - 14.0, TOP_BAR + 16.0),
            Vec2::new(3.0, 0.0),
            Color::Grey,
        );
        ball.tick(&level.board, &[]);
        assert!(ball.vel.x < 0.0);
        assert_eq!(ball.color, Color::Orange);
    }

    #[test]
    fn test_universal_wall_does_not_recolor() {
        let level = Level::parse("     X");
        let mut ball = Ball::new(
            Vec2::new(5.0 * CELL_SIZE - 14.0, TOP_BAR + 16.0),
            Vec2::new(3.0, 0.0),
            Color::Blue,
        );
        ball.tick(&level.board, &[]);
        assert!(ball.vel.x < 0.0);
        assert_eq!(ball.color, Color::Blue);
    }

    #[test]
    fn test_faded_timed_wall_is_passable() {
        let level = Level::parse("     T");
        let mut timed = level.timed_tiles.clone();

        let start = Vec2::new(5.0 * CELL_SIZE - 14.0, TOP_BAR + 16.0);
        let mut ball = Ball::new(start, Vec2::new(3.0, 0.0), Color::Grey);
        ball.tick(&level.board, &timed);
        assert!(ball.vel.x < 0.0, "active timed wall must bounce");

        for tile in &mut timed {
            for _ in 0..510 {
                tile.update_alpha();
            }
        }
        let mut ball = Ball::new(start, Vec2::new(3.0, 0.0), Color::Grey);
        ball.tick(&level.board, &timed);
        assert!(ball.vel.x > 0.0, "faded timed wall must be passable");
    }

    #[test]
    fn test_top_bar_edge_bounce() {
        let mut ball = Ball::new(
            Vec2::new(100.0, TOP_BAR + BALL_RADIUS + 1.0),
            Vec2::new(0.5, -3.0),
            Color::Grey,
        );
        ball.tick(&open_board(), &[]);
        assert!(ball.vel.y > 0.0);
    }

    #[test]
    fn test_speed_clamped_high() {
        let mut ball = Ball::new(Vec2::new(100.0, 200.0), Vec2::new(40.0, 30.0), Color::Grey);
        ball.tick(&open_board(), &[]);
        assert!((ball.vel.length() - BALL_MAX_SPEED).abs() < 0.001);
        // Direction preserved
        assert!(ball.vel.x > 0.0 && ball.vel.y > 0.0);
    }

    #[test]
    fn test_speed_snapped_low() {
        let mut ball = Ball::new(
            Vec2::new(100.0, 200.0),
            Vec2::new(0.01, -0.02),
            Color::Grey,
        );
        ball.tick(&open_board(), &[]);
        assert_eq!(ball.vel, Vec2::new(BALL_MIN_SPEED, -BALL_MIN_SPEED));
    }

    #[test]
    fn test_attraction_pulls_and_shrinks() {
        let hole = Hole {
            col: 3,
            row: 3,
            color: Color::Grey,
        };
        let center = hole.center();
        let mut ball = Ball::new(center + Vec2::new(30.0, 0.0), Vec2::new(0.0, 1.0), Color::Blue);
        let outcome = ball.attract_to_hole(&hole);
        assert!(outcome.is_none());
        assert!(ball.vel.x < 0.0, "velocity gains an inward component");
        assert!(ball.radius < BALL_RADIUS);
    }

    #[test]
    fn test_shrink_is_monotonic_in_distance() {
        let hole = Hole {
            col: 3,
            row: 3,
            color: Color::Grey,
        };
        let center = hole.center();
        let mut prev_radius = f32::MAX;
        for dist in [30.0f32, 26.0, 22.0, 18.0] {
            let mut ball = Ball::new(center + Vec2::new(dist, 0.0), Vec2::ZERO, Color::Blue);
            ball.attract_to_hole(&hole);
            assert!(ball.radius < prev_radius);
            prev_radius = ball.radius;
        }
    }

    #[test]
    fn test_no_attraction_outside_radius() {
        let hole = Hole {
            col: 3,
            row: 3,
            color: Color::Grey,
        };
        let mut ball = Ball::new(
            hole.center() + Vec2::new(ATTRACTION_RADIUS + 1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Color::Blue,
        );
        let before = ball;
        assert!(ball.attract_to_hole(&hole).is_none());
        assert_eq!(ball.vel, before.vel);
        assert_eq!(ball.radius, before.radius);
    }

    #[test]
    fn test_capture_within_distance_threshold() {
        let hole = Hole {
            col: 3,
            row: 3,
            color: Color::Blue,
        };
        let mut ball = Ball::new(
            hole.center() + Vec2::new(CAPTURE_DISTANCE - 1.0, 0.0),
            Vec2::ZERO,
            Color::Blue,
        );
        let outcome = ball.attract_to_hole(&hole).expect("must capture");
        assert!(outcome.success);
        assert!(ball.is_captured());
        // Capture is resolved exactly once
        assert!(ball.attract_to_hole(&hole).is_none());
    }

    #[test]
    fn test_wrong_color_capture_fails() {
        let hole = Hole {
            col: 3,
            row: 3,
            color: Color::Yellow,
        };
        let mut ball = Ball::new(hole.center(), Vec2::ZERO, Color::Blue);
        let outcome = ball.attract_to_hole(&hole).expect("must capture");
        assert!(!outcome.success);
        assert_eq!(outcome.color, Color::Blue);
    }

    #[test]
    fn test_grey_matches_any_hole() {
        let hole = Hole {
            col: 3,
            row: 3,
            color: Color::Green,
        };
        let mut ball = Ball::new(hole.center(), Vec2::ZERO, Color::Grey);
        assert!(ball.attract_to_hole(&hole).unwrap().success);
    }

    #[test]
    fn test_captured_ball_does_not_move() {
        let hole = Hole {
            col: 3,
            row: 3,
            color: Color::Grey,
        };
        let mut ball = Ball::new(hole.center(), Vec2::new(2.0, 2.0), Color::Grey);
        ball.attract_to_hole(&hole).unwrap();
        let pos = ball.pos;
        ball.tick(&open_board(), &[]);
        assert_eq!(ball.pos, pos);
    }

    proptest! {
        #[test]
        fn prop_speed_clamp_invariant(
            dx in -10.0f32..10.0,
            dy in -10.0f32..10.0,
            x in 50.0f32..500.0,
            y in 100.0f32..600.0,
        ) {
            prop_assume!(dx != 0.0 || dy != 0.0);
            let mut ball = Ball::new(Vec2::new(x, y), Vec2::new(dx, dy), Color::Grey);
            ball.tick(&Board::default(), &[]);
            let speed = ball.vel.length();
            prop_assert!(speed >= BALL_MIN_SPEED - 0.001);
            prop_assert!(speed <= BALL_MAX_SPEED + 0.001);
        }
    }
}
