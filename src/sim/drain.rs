//! Remaining-time drain worker for the victory sequence
//!
//! When a level is won, leftover time converts into bonus score at one
//! point per second, paced so the conversion is visible. The worker runs
//! on its own thread and only touches the shared [`SessionClock`]; the
//! frame loop watches the clock's `drained` flag to know when to advance.
//!
//! [`drain_step`] is the whole per-step protocol, split out so tests and
//! embedders can drive the drain synchronously instead.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::state::SessionClock;
use crate::consts::DRAIN_STEP_MS;

/// One drain step: block while paused, then on every second step convert
/// one second of remaining time into one point. Returns false once the
/// drain has finished (and marks the clock drained).
pub fn drain_step(clock: &Arc<SessionClock>, step_counter: &mut u32) -> bool {
    clock.wait_while_paused();

    if !clock.should_continue_draining() {
        clock.finish_drain();
        return false;
    }

    *step_counter += 1;
    if *step_counter % 2 == 0 {
        clock.drain_decrement();
    }
    true
}

/// Spawn the background drain worker for one victory sequence. The thread
/// exits on its own when the remaining time hits zero or the drain is
/// cancelled by a level reload.
pub fn spawn_drain_thread(clock: Arc<SessionClock>) {
    thread::Builder::new()
        .name("time-drain".into())
        .spawn(move || {
            log::debug!("drain worker started");
            let mut step_counter = 0;
            while drain_step(&clock, &mut step_counter) {
                thread::sleep(Duration::from_millis(DRAIN_STEP_MS));
            }
            log::debug!("drain worker finished");
        })
        .map(|_| ())
        .unwrap_or_else(|e| log::error!("failed to spawn drain worker: {e}"));
}
