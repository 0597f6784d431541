//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one tick per rendered frame at 30 Hz)
//! - Seeded RNG only
//! - Stable iteration order (balls, holes and strokes in list order)
//! - No rendering or platform dependencies
//!
//! The one exception to "everything happens in the tick" is the victory-time
//! drain worker in [`drain`], which runs on its own real-time cadence and
//! shares only the [`state::SessionClock`] with the frame loop.

pub mod ball;
pub mod board;
pub mod drain;
pub mod state;
pub mod stroke;
pub mod tick;

pub use ball::{Ball, CaptureOutcome};
pub use board::{Board, Color, Hole, Level, Spawner, Tile, TimedTile};
pub use drain::{drain_step, spawn_drain_thread};
pub use state::{GameState, SessionClock};
pub use stroke::Stroke;
pub use tick::{TickInput, tick};
