//! Session state and the level life-cycle state machine
//!
//! All state that must survive a tick lives here: the board and entity
//! lists, the spawn queue, the score ledger and every state-machine flag
//! from `Running` through `GameEnded`.
//!
//! Remaining time, score and the drain flags are shared with the victory
//! drain worker through [`SessionClock`], a `Mutex`+`Condvar` pair. The
//! frame loop and the worker only ever touch those fields through the
//! clock, so neither side can lose an update.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::ball::{Ball, CaptureOutcome};
use super::board::{Board, Color, Hole, Level, Spawner, TimedTile};
use super::drain::spawn_drain_thread;
use super::stroke::Stroke;
use crate::config::GameConfig;
use crate::consts::*;

/// State shared between the frame loop and the drain worker
#[derive(Debug, Default)]
struct ClockInner {
    remaining_ticks: i32,
    score: i32,
    paused: bool,
    draining: bool,
    drained: bool,
}

/// Shared clock: remaining time, score and the drain/pause flags.
///
/// This is the score ledger too - `add_score`/`subtract_score` are the only
/// operations that mutate the score anywhere in the crate.
#[derive(Debug, Default)]
pub struct SessionClock {
    inner: Mutex<ClockInner>,
    unpaused: Condvar,
}

impl SessionClock {
    fn lock(&self) -> MutexGuard<'_, ClockInner> {
        // A poisoned clock just means another thread panicked mid-update;
        // the inner values are still plain scalars, so keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn remaining_ticks(&self) -> i32 {
        self.lock().remaining_ticks
    }

    pub fn score(&self) -> i32 {
        self.lock().score
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn is_draining(&self) -> bool {
        self.lock().draining
    }

    pub fn is_drained(&self) -> bool {
        self.lock().drained
    }

    /// Increase the score (unbounded)
    pub fn add_score(&self, amount: i32) {
        let mut inner = self.lock();
        inner.score += amount;
        log::info!("score increased by {amount}, total {}", inner.score);
    }

    /// Decrease the score, floored at zero
    pub fn subtract_score(&self, amount: i32) {
        let mut inner = self.lock();
        inner.score = (inner.score - amount).max(0);
        log::info!("score decreased by {amount}, total {}", inner.score);
    }

    fn set_score(&self, score: i32) {
        self.lock().score = score;
    }

    fn set_remaining_ticks(&self, ticks: i32) {
        self.lock().remaining_ticks = ticks;
    }

    /// Decrement remaining time by one tick (frame-loop timer countdown)
    fn decrement_remaining(&self) {
        let mut inner = self.lock();
        if inner.remaining_ticks > 0 {
            inner.remaining_ticks -= 1;
        }
    }

    fn set_paused(&self, paused: bool) {
        let mut inner = self.lock();
        inner.paused = paused;
        if !paused {
            // Wake the drain worker promptly on unpause
            self.unpaused.notify_all();
        }
    }

    /// Block the calling thread while the game is paused
    pub fn wait_while_paused(&self) {
        let mut inner = self.lock();
        while inner.paused {
            inner = self
                .unpaused
                .wait(inner)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Arm the drain flags for a new victory sequence
    fn begin_drain(&self) {
        let mut inner = self.lock();
        inner.draining = true;
        inner.drained = false;
    }

    /// Clear the drain flags; a running worker exits at its next check
    fn cancel_drain(&self) {
        let mut inner = self.lock();
        inner.draining = false;
        inner.drained = false;
        // A paused worker must wake up to observe the cancellation
        self.unpaused.notify_all();
    }

    /// One drain payment: a second's worth of frames becomes one score point
    pub fn drain_decrement(&self) {
        let mut inner = self.lock();
        inner.remaining_ticks -= FPS as i32;
        inner.score += 1;
    }

    /// Whether the drain worker should keep running
    pub fn should_continue_draining(&self) -> bool {
        let inner = self.lock();
        inner.remaining_ticks > 0 && inner.draining
    }

    #[cfg(test)]
    pub(crate) fn test_arm(&self, remaining: i32) {
        self.set_remaining_ticks(remaining);
        self.begin_drain();
    }

    #[cfg(test)]
    pub(crate) fn test_set_remaining(&self, remaining: i32) {
        self.set_remaining_ticks(remaining);
    }

    /// Mark draining finished
    pub fn finish_drain(&self) {
        let mut inner = self.lock();
        inner.draining = false;
        inner.drained = true;
    }
}

/// Complete game/session state
pub struct GameState {
    config: GameConfig,
    pub board: Board,
    pub holes: Vec<Hole>,
    pub spawners: Vec<Spawner>,
    pub timed_tiles: Vec<TimedTile>,
    pub balls: Vec<Ball>,
    pub strokes: Vec<Stroke>,
    /// Ordered colors awaiting ball creation (head spawns first)
    pub spawn_queue: VecDeque<Color>,

    /// Ticks until the next spawn attempt
    spawn_timer: i32,
    /// Remaining ticks of the queue slide animation; the head color is
    /// popped when it reaches zero and no spawn can start while it runs
    queue_shift: Option<u32>,

    /// Current 1-based level index
    level: u32,
    /// Score checkpoint restored by an in-level restart
    score_at_level_start: i32,

    time_up: bool,
    level_failed: bool,
    victory_in_progress: bool,
    victory_animation_complete: bool,
    victory_frame_counter: u32,
    /// Perimeter cursors of the two victory tiles, half a lap apart
    first_cursor: usize,
    second_cursor: usize,
    game_ended: bool,

    /// Stroke currently being drawn, by id
    current_stroke: Option<u32>,
    drawing: bool,
    /// Last recorded point of the in-progress stroke
    last_point: Vec2,
    next_stroke_id: u32,

    /// Spawn the background drain worker on victory. Embedders that drive
    /// [`super::drain::drain_step`] themselves can turn this off.
    pub background_drain: bool,

    clock: Arc<SessionClock>,
    rng: Pcg32,
}

impl GameState {
    /// Create a session with the given config and RNG seed, loading level 1
    pub fn new(config: GameConfig, seed: u64) -> anyhow::Result<Self> {
        let mut state = Self {
            config,
            board: Board::default(),
            holes: Vec::new(),
            spawners: Vec::new(),
            timed_tiles: Vec::new(),
            balls: Vec::new(),
            strokes: Vec::new(),
            spawn_queue: VecDeque::new(),
            spawn_timer: 0,
            queue_shift: None,
            level: 1,
            score_at_level_start: 0,
            time_up: false,
            level_failed: false,
            victory_in_progress: false,
            victory_animation_complete: false,
            victory_frame_counter: 0,
            first_cursor: 0,
            second_cursor: 0,
            game_ended: false,
            current_stroke: None,
            drawing: false,
            last_point: Vec2::ZERO,
            next_stroke_id: 1,
            background_drain: true,
            clock: Arc::new(SessionClock::default()),
            rng: Pcg32::seed_from_u64(seed),
        };
        state.load_current_level()?;
        Ok(state)
    }

    /// (Re)load the current level: board, entities, queue, timers and flags.
    /// The score is left alone; only the level-start checkpoint updates.
    pub fn load_current_level(&mut self) -> anyhow::Result<()> {
        let layout = self.config.load_layout(self.level)?;
        let level_config = self
            .config
            .level(self.level)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("level {} not configured", self.level))?;

        let parsed = Level::parse(&layout);
        self.board = parsed.board;
        self.holes = parsed.holes;
        self.spawners = parsed.spawners;
        self.timed_tiles = parsed.timed_tiles;

        self.balls.clear();
        for seeded in parsed.seeded_balls {
            let vel = self.random_diagonal();
            self.balls.push(Ball::new(seeded.pos, vel, seeded.color));
        }

        self.strokes.clear();
        self.current_stroke = None;
        self.drawing = false;

        self.spawn_queue = level_config
            .balls
            .iter()
            .map(|name| Color::from_name(name))
            .collect();
        self.spawn_timer = (level_config.spawn_interval * FPS) as i32;
        self.queue_shift = None;

        self.time_up = false;
        self.level_failed = false;
        self.victory_in_progress = false;
        self.victory_animation_complete = false;
        self.victory_frame_counter = 0;
        self.first_cursor = 0;
        self.second_cursor = 0;
        self.game_ended = false;

        self.clock.cancel_drain();
        self.clock.set_paused(false);
        self.clock
            .set_remaining_ticks((level_config.time * FPS) as i32);
        self.score_at_level_start = self.clock.score();

        log::info!(
            "level {} loaded with {} seconds",
            self.level,
            level_config.time
        );
        Ok(())
    }

    // --- snapshot accessors -------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn score(&self) -> i32 {
        self.clock.score()
    }

    pub fn remaining_ticks(&self) -> i32 {
        self.clock.remaining_ticks()
    }

    pub fn current_level(&self) -> u32 {
        self.level
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn is_time_up(&self) -> bool {
        self.time_up
    }

    pub fn is_level_failed(&self) -> bool {
        self.level_failed
    }

    pub fn is_game_ended(&self) -> bool {
        self.game_ended
    }

    pub fn victory_in_progress(&self) -> bool {
        self.victory_in_progress
    }

    pub fn is_victory_animation_complete(&self) -> bool {
        self.victory_animation_complete
    }

    pub fn is_time_drained(&self) -> bool {
        self.clock.is_drained()
    }

    pub fn clock(&self) -> &Arc<SessionClock> {
        &self.clock
    }

    pub fn spawn_timer(&self) -> i32 {
        self.spawn_timer
    }

    /// The level is complete when nothing is waiting and nothing is rolling
    pub fn is_level_complete(&self) -> bool {
        self.spawn_queue.is_empty() && self.balls.is_empty()
    }

    /// Grid positions of the two victory tiles, for the presentation layer
    pub fn victory_tiles(&self) -> [(usize, usize); 2] {
        [
            perimeter_position(self.first_cursor),
            perimeter_position(self.second_cursor),
        ]
    }

    // --- timers and spawning ------------------------------------------------

    /// Drain one tick from the level timer and detect time-up failure
    pub fn update_timer(&mut self) {
        if self.clock.is_paused() || self.clock.is_draining() || self.level_failed {
            return;
        }
        self.clock.decrement_remaining();
        if self.clock.remaining_ticks() < FPS as i32 {
            self.time_up = true;
            self.level_failed = true;
            log::info!("time up on level {}", self.level);
        }
    }

    /// Run the spawn countdown and create a ball when it fires.
    /// Suspended entirely while paused or failed.
    pub fn handle_spawning(&mut self) {
        if self.clock.is_paused() || self.level_failed {
            return;
        }

        // Advance the queue slide; the head color leaves the queue only
        // once the slide finishes
        if let Some(ticks) = self.queue_shift {
            if ticks <= 1 {
                self.spawn_queue.pop_front();
                self.queue_shift = None;
            } else {
                self.queue_shift = Some(ticks - 1);
            }
        }

        self.spawn_timer -= 1;
        if self.spawn_timer <= 0
            && !self.spawn_queue.is_empty()
            && self.queue_shift.is_none()
            && !self.spawners.is_empty()
        {
            let color = self.spawn_queue[0];
            let spawner = self.spawners[self.rng.random_range(0..self.spawners.len())];
            let vel = self.random_diagonal();
            self.balls.push(Ball::new(spawner.center(), vel, color));
            self.queue_shift = Some(QUEUE_SHIFT_TICKS);
            self.spawn_timer = self.spawn_interval_ticks();
            log::debug!("spawned {} ball at ({}, {})", color.name(), spawner.col, spawner.row);
        }
    }

    fn spawn_interval_ticks(&self) -> i32 {
        self.config
            .level(self.level)
            .map(|l| (l.spawn_interval * FPS) as i32)
            .unwrap_or(0)
    }

    /// Each axis independently +-2
    fn random_diagonal(&mut self) -> Vec2 {
        let dx = if self.rng.random_bool(0.5) { -2.0 } else { 2.0 };
        let dy = if self.rng.random_bool(0.5) { -2.0 } else { 2.0 };
        Vec2::new(dx, dy)
    }

    // --- capture settlement -------------------------------------------------

    /// Append a failed ball's color to the queue tail. If the queue was
    /// empty, the spawn countdown resets so it cannot respawn instantly.
    pub fn requeue_ball(&mut self, color: Color) {
        let was_empty = self.spawn_queue.is_empty();
        self.spawn_queue.push_back(color);
        if was_empty {
            self.spawn_timer = self.spawn_interval_ticks();
        }
    }

    /// Settle the score/queue side effects of a capture
    pub fn resolve_capture(&mut self, outcome: CaptureOutcome) {
        if outcome.success {
            let amount = self.config.score_increase(self.level, outcome.color);
            self.clock.add_score(amount);
        } else {
            let amount = self.config.score_decrease(self.level, outcome.color);
            self.clock.subtract_score(amount);
            self.requeue_ball(outcome.color);
        }
    }

    // --- strokes ------------------------------------------------------------

    /// Begin a new stroke at the press point
    pub fn begin_stroke(&mut self, point: Vec2) {
        if self.level_failed || self.victory_in_progress {
            return;
        }
        let id = self.next_stroke_id;
        self.next_stroke_id += 1;
        let mut stroke = Stroke::new(id);
        stroke.add_point(point);
        self.strokes.push(stroke);
        self.current_stroke = Some(id);
        self.drawing = true;
        self.last_point = point;
    }

    /// Append a drag point to the in-progress stroke if it moved far enough.
    /// Returns true if a point was recorded (the caller budgets these).
    pub fn extend_stroke(&mut self, point: Vec2) -> bool {
        if self.level_failed || self.victory_in_progress || !self.drawing {
            return false;
        }
        let Some(id) = self.current_stroke else {
            return false;
        };
        if self.last_point.distance(point) <= STROKE_POINT_THRESHOLD {
            return false;
        }
        let Some(stroke) = self.strokes.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        stroke.add_point(point);
        self.last_point = point;
        true
    }

    /// End the in-progress stroke
    pub fn end_stroke(&mut self) {
        self.drawing = false;
        self.current_stroke = None;
    }

    /// Remove the most-recently-drawn stroke under the point, if any.
    /// Like drawing, erasing is disabled once the level has failed.
    pub fn erase_stroke_at(&mut self, point: Vec2) {
        if self.level_failed {
            return;
        }
        for i in (0..self.strokes.len()).rev() {
            if self.strokes[i].contains_point(point) {
                if self.current_stroke == Some(self.strokes[i].id) {
                    self.current_stroke = None;
                    self.drawing = false;
                }
                self.strokes.remove(i);
                break;
            }
        }
    }

    /// Drop strokes consumed last tick and clear every one-shot collision
    /// guard. Runs at the start of the tick's stroke pass.
    pub fn purge_removed_strokes(&mut self) {
        let current = self.current_stroke;
        self.strokes.retain(|s| !s.is_removed());
        if let Some(id) = current {
            if !self.strokes.iter().any(|s| s.id == id) {
                self.current_stroke = None;
                self.drawing = false;
            }
        }
        for stroke in &mut self.strokes {
            stroke.reset_collision_flag();
        }
    }

    // --- pause / restart ----------------------------------------------------

    /// Toggle the pause flag. Ignored when the game has ended and the level
    /// failed at the same time; unpausing wakes the drain worker.
    pub fn toggle_pause(&mut self) {
        if self.game_ended && self.level_failed {
            return;
        }
        self.clock.set_paused(!self.clock.is_paused());
    }

    /// Restart signal: a full reset (score 0, level 1) once the game is
    /// over, otherwise reload the current level at its score checkpoint.
    pub fn restart(&mut self) -> anyhow::Result<()> {
        if self.game_ended {
            self.clock.set_score(0);
            self.level = 1;
        } else {
            self.clock.set_score(self.score_at_level_start);
        }
        self.load_current_level()
    }

    // --- victory sequence ---------------------------------------------------

    /// Begin the victory sequence: arm the drain flags, park the two
    /// perimeter cursors half a lap apart and start the drain worker.
    /// Idempotent while a sequence is in progress, and refused outright
    /// once the game has ended.
    pub fn start_victory_sequence(&mut self) {
        if self.victory_in_progress || self.game_ended {
            return;
        }
        self.victory_in_progress = true;
        self.victory_animation_complete = false;
        self.victory_frame_counter = 0;
        self.first_cursor = 0;
        self.second_cursor = perimeter_length() / 2;
        self.score_at_level_start = self.clock.score();
        self.clock.begin_drain();
        if self.background_drain {
            spawn_drain_thread(Arc::clone(&self.clock));
        }
        log::info!("victory sequence started on level {}", self.level);
    }

    /// Advance both perimeter cursors every second frame; once the drain
    /// worker reports drained, the animation is complete.
    pub fn update_victory_tiles(&mut self) {
        if self.clock.is_paused() {
            return;
        }
        self.victory_frame_counter += 1;
        if self.victory_frame_counter % 2 == 0 {
            let perimeter = perimeter_length();
            self.first_cursor = (self.first_cursor + 1) % perimeter;
            self.second_cursor = (self.second_cursor + 1) % perimeter;

            if self.clock.is_drained() {
                self.victory_animation_complete = true;
                self.victory_in_progress = false;
                log::info!("victory animation complete");
            }
        }
    }

    /// Advance to the next level once both the drain and the animation have
    /// finished. Safe to call every tick; it fires at most once per level.
    pub fn check_victory_and_advance(&mut self) -> anyhow::Result<()> {
        if self.game_ended || !self.clock.is_drained() || !self.victory_animation_complete {
            return Ok(());
        }
        self.level += 1;
        if self.level <= self.config.level_count() as u32 {
            self.load_current_level()
        } else {
            log::info!("all levels completed");
            self.victory_in_progress = false;
            self.clock.cancel_drain();
            self.game_ended = true;
            Ok(())
        }
    }
}

/// Number of perimeter cells of the playfield, corners counted once
pub fn perimeter_length() -> usize {
    2 * (BOARD_SIZE + BOARD_SIZE) - 4
}

/// Grid position of a perimeter step, walking clockwise from the top-left:
/// top edge left-to-right, right edge top-to-bottom, bottom edge
/// right-to-left, left edge bottom-to-top.
pub fn perimeter_position(step: usize) -> (usize, usize) {
    let w = BOARD_SIZE;
    let h = BOARD_SIZE;
    let step = step % perimeter_length();

    if step < w {
        (step, 0)
    } else if step < w + h - 1 {
        (w - 1, step - w + 1)
    } else if step < 2 * w + h - 2 {
        (2 * w + h - 3 - step, h - 1)
    } else {
        (0, 2 * (w + h) - 4 - step)
    }
}
