//! Inkgrid entry point
//!
//! Runs the simulation headless at the fixed tick rate, logging score and
//! timer progress. Embedders wanting a presentation layer drive
//! [`inkgrid::tick`] themselves instead.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;

use inkgrid::consts::FPS;
use inkgrid::sim::{tick, TickInput};
use inkgrid::{GameConfig, GameState};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path: PathBuf = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "assets/config.json".into())
        .into();
    let config = GameConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let seed = std::env::args()
        .nth(2)
        .map(|s| s.parse::<u64>())
        .transpose()
        .context("seed must be an integer")?
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });

    log::info!("starting session with seed {seed}");
    let mut state = GameState::new(config, seed)?;

    let step = Duration::from_secs(1) / FPS;
    let input = TickInput::default();
    let mut next_tick = Instant::now();
    let mut frame: u64 = 0;

    loop {
        tick(&mut state, &input)?;
        frame += 1;

        if frame % (FPS as u64 * 5) == 0 {
            log::info!(
                "level {} score {} time {}s balls {} queued {}",
                state.current_level(),
                state.score(),
                state.remaining_ticks() / FPS as i32,
                state.balls.len(),
                state.spawn_queue.len(),
            );
        }

        if state.is_game_ended() {
            log::info!("game ended with score {}", state.score());
            break;
        }
        if state.is_level_failed() {
            log::info!(
                "level {} failed with score {}",
                state.current_level(),
                state.score()
            );
            break;
        }

        next_tick += step;
        let now = Instant::now();
        if next_tick > now {
            std::thread::sleep(next_tick - now);
        } else {
            // Fell behind; resynchronize rather than bursting ticks
            next_tick = now;
        }
    }

    Ok(())
}
