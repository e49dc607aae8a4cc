/// Fixed-timestep driver.
///
/// The host loop calls `advance` once per frame with the current time.
/// Elapsed time is banked in an accumulator and spent one tick interval
/// at a time, so the number of steps per second depends only on the
/// current `tick_ms`, never on the frame rate.
///
///   - A frame delta is clamped to `max_frame_ms` (a suspended terminal
///     does not replay minutes of moves on wake-up).
///   - The accumulator is discarded while the game is not Playing, so
///     time spent paused or on an overlay is never spent later.
///   - The tick interval is re-read before every step: a speed-up takes
///     effect on the very next tick of the same frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::event::GameEvent;
use super::session::Game;
use super::step::step;
use super::world::Phase;

// ── Clock ──

pub trait Clock {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock { origin: Instant::now() }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

// ── Cancellation ──

/// Shared stop flag. Clones observe the same flag.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// ── Stepper ──

#[derive(Debug, Default)]
pub struct FrameReport {
    pub ticks: u32,
    pub events: Vec<GameEvent>,
}

pub struct FixedStep {
    accumulator_ms: f64,
    last_frame: Option<Duration>,
    max_frame_ms: f64,
}

impl FixedStep {
    pub fn new(max_frame_ms: u32) -> Self {
        FixedStep {
            accumulator_ms: 0.0,
            last_frame: None,
            max_frame_ms: f64::from(max_frame_ms.max(1)),
        }
    }

    /// Run as many ticks as the elapsed time pays for.
    pub fn advance(&mut self, now: Duration, game: &mut Game) -> FrameReport {
        let mut report = FrameReport::default();

        let delta_ms = match self.last_frame {
            Some(prev) => now.saturating_sub(prev).as_secs_f64() * 1000.0,
            None => 0.0,
        };
        self.last_frame = Some(now);

        if game.phase != Phase::Playing {
            self.accumulator_ms = 0.0;
            return report;
        }

        self.accumulator_ms += delta_ms.min(self.max_frame_ms);

        while game.phase == Phase::Playing {
            let interval = f64::from(game.tick_ms().max(1));
            if self.accumulator_ms < interval {
                break;
            }
            self.accumulator_ms -= interval;
            report.events.extend(step(game));
            report.ticks += 1;
        }

        if game.phase != Phase::Playing {
            self.accumulator_ms = 0.0;
        }
        report
    }
}
