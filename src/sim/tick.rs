//! Per-tick orchestration
//!
//! [`tick`] advances the whole session by one fixed step in a strict
//! order: input, stroke housekeeping, spawning, timer, timed-tile decay,
//! then per-ball physics (walls, then holes, then strokes), and finally
//! the victory sequence. Given the same state, input and seed, every
//! tick is reproducible.

use glam::Vec2;

use super::state::GameState;
use crate::consts::{BALL_RADIUS, STROKE_POINTS_PER_TICK};

/// Player input gathered since the last tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Toggle pause
    pub pause: bool,
    /// Restart the level (or the whole game, once it has ended)
    pub restart: bool,
    /// Start a new stroke at this point
    pub press: Option<Vec2>,
    /// Drag samples, oldest first
    pub drag: Vec<Vec2>,
    /// Finish the in-progress stroke
    pub release: bool,
    /// Remove the topmost stroke under this point
    pub erase: Option<Vec2>,
}

/// Advance the session by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) -> anyhow::Result<()> {
    if input.restart {
        return state.restart();
    }
    if input.pause {
        state.toggle_pause();
    }
    if let Some(point) = input.erase {
        state.erase_stroke_at(point);
    }
    if let Some(point) = input.press {
        state.begin_stroke(point);
    }
    let mut recorded = 0;
    for &point in &input.drag {
        if recorded >= STROKE_POINTS_PER_TICK {
            break;
        }
        if state.extend_stroke(point) {
            recorded += 1;
        }
    }
    if input.release {
        state.end_stroke();
    }

    // Strokes consumed last tick disappear before anything can hit them
    state.purge_removed_strokes();

    state.handle_spawning();

    let level_complete = state.is_level_complete();
    if !level_complete {
        state.update_timer();
    }

    let paused = state.is_paused();
    let failed = state.is_level_failed();

    if !paused && !level_complete && !failed {
        for tile in &mut state.timed_tiles {
            tile.update_alpha();
        }
    }

    if !paused && !failed {
        step_balls(state);
    }

    // Re-check: the last ball may have just been captured
    if state.is_level_complete() && !state.is_time_up() {
        state.start_victory_sequence();
    }
    if state.victory_in_progress() {
        state.update_victory_tiles();
    }
    state.check_victory_and_advance()
}

/// Per-ball physics pass: walls, then holes, then strokes
fn step_balls(state: &mut GameState) {
    let mut outcomes = Vec::new();

    for ball in state.balls.iter_mut() {
        ball.tick(&state.board, &state.timed_tiles);

        // Out of range of every hole, the ball is back to full size
        ball.radius = BALL_RADIUS;
        for hole in &state.holes {
            if let Some(outcome) = ball.attract_to_hole(hole) {
                outcomes.push(outcome);
                break;
            }
        }
        if ball.is_captured() {
            continue;
        }

        // First stroke hit wins; the stroke is spent either way
        for stroke in state.strokes.iter_mut() {
            if stroke.try_reflect(ball) {
                stroke.mark_removed();
                break;
            }
        }
    }

    state.balls.retain(|b| !b.is_captured());
    for outcome in outcomes {
        state.resolve_capture(outcome);
    }
}
