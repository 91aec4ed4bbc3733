//! # Time — Fixed-Step Accounting
//!
//! The mechanism (after the classic "fix your timestep" formulation): the
//! host hands us one callback per display refresh, we bank the elapsed
//! wall-clock time in an accumulator, and pay it out in whole, constant
//! ticks. Whatever fraction of a tick is left over becomes the
//! interpolation factor the renderer uses to blend between the last two
//! simulated states.
//!
//! ```text
//! host frame:  |----- 23 ms -----|
//! accumulator: ######################        fixed step = 16.6 ms
//!              └─ tick ─┘└ 6.4 ms ┘          → 1 tick, interpolation 0.38
//! ```
//!
//! Two guards keep a stall from becoming a death spiral:
//!
//! - the per-frame delta is clamped (a debugger pause or a long GC in the
//!   host must not bank seconds of catch-up), and
//! - at most `max_ticks_per_frame` ticks are paid out per host callback.
//!   Whole ticks still owed beyond the cap are *dropped*: the simulation
//!   accepts falling behind wall-clock time rather than freezing the frame
//!   trying to catch up.

use std::time::{Duration, Instant};

/// Accumulator that converts irregular host-frame deltas into a stream of
/// constant simulation ticks.
#[derive(Debug)]
pub struct FixedTimestep {
    /// Length of one simulated tick.
    step: Duration,
    /// `step` in seconds, the value every system receives as `dt`.
    step_secs: f32,
    /// Banked wall-clock time not yet paid out as ticks. Always < `step`
    /// between frames.
    accumulator: Duration,
    /// Clamp on a single host-frame delta (stall guard).
    max_frame_delta: Duration,
    /// Catch-up cap per host callback (spiral-of-death guard).
    max_ticks_per_frame: u32,
    /// Wall-clock sample from the previous host callback.
    last_sample: Option<Instant>,
}

/// What one host callback owes the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameBudget {
    /// Ticks to run now.
    pub ticks: u32,
    /// Whole ticks owed beyond the cap, discarded. Non-zero means overrun.
    pub dropped: u32,
}

impl FixedTimestep {
    /// Default clamp on one host-frame delta: 250 ms.
    pub const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(250);
    /// Default catch-up cap per host callback.
    pub const DEFAULT_MAX_TICKS_PER_FRAME: u32 = 5;

    /// # Panics
    ///
    /// Panics if `step` is zero; a zero-length tick is a configuration bug.
    pub fn new(step: Duration) -> Self {
        assert!(step > Duration::ZERO, "fixed step must be non-zero");
        Self {
            step,
            step_secs: step.as_secs_f32(),
            accumulator: Duration::ZERO,
            max_frame_delta: Self::DEFAULT_MAX_FRAME_DELTA,
            max_ticks_per_frame: Self::DEFAULT_MAX_TICKS_PER_FRAME,
            last_sample: None,
        }
    }

    /// Length of one simulated tick.
    pub fn step(&self) -> Duration {
        self.step
    }

    /// The constant `dt`, in seconds, every system receives.
    pub fn step_secs(&self) -> f32 {
        self.step_secs
    }

    pub(crate) fn set_max_frame_delta(&mut self, clamp: Duration) {
        self.max_frame_delta = clamp;
    }

    pub(crate) fn set_max_ticks_per_frame(&mut self, cap: u32) {
        self.max_ticks_per_frame = cap.max(1);
    }

    pub(crate) fn max_ticks_per_frame(&self) -> u32 {
        self.max_ticks_per_frame
    }

    /// Reset the accumulator and take the initial wall-clock sample.
    pub(crate) fn begin(&mut self, now: Instant) {
        self.accumulator = Duration::ZERO;
        self.last_sample = Some(now);
    }

    /// Account for one host callback at `now`.
    ///
    /// Always advances the wall-clock sample, so a paused loop does not bank
    /// a catch-up burst for the moment it resumes. While `paused`, the
    /// accumulator itself is frozen and no ticks are due.
    pub(crate) fn advance(&mut self, now: Instant, paused: bool) -> FrameBudget {
        let last = self.last_sample.replace(now).unwrap_or(now);
        let frame_delta = now.saturating_duration_since(last).min(self.max_frame_delta);

        if paused {
            return FrameBudget {
                ticks: 0,
                dropped: 0,
            };
        }

        self.accumulator += frame_delta;
        let mut ticks = 0;
        while self.accumulator >= self.step && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.step;
            ticks += 1;
        }
        // Past the cap: discard whole owed ticks, keep the fraction so the
        // interpolation factor stays in [0, 1).
        let mut dropped = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            dropped += 1;
        }
        FrameBudget { ticks, dropped }
    }

    /// Fractional progress into the next tick, in `[0, 1)`. The renderer
    /// blends the last two simulated states by this much.
    pub fn interpolation(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.step_secs
    }
}

// ── Stats ────────────────────────────────────────────────────────────────

/// Read-only loop observability. Sampled via
/// [`GameLoop::stats`](crate::runner::GameLoop::stats); never feeds back
/// into scheduling.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopStats {
    /// Total ticks run since construction.
    pub ticks: u64,
    /// Tick rate measured over roughly the last second of wall time.
    pub ticks_per_second: f32,
    /// Wall-clock cost of the most recent tick.
    pub last_tick_duration: Duration,
    /// Host frames on which owed ticks had to be dropped.
    pub overruns: u64,
    /// Whether the loop is currently Running (false when Paused or
    /// Stopped).
    pub running: bool,
}

/// Measures ticks-per-second over a sliding ~1 second window.
#[derive(Debug, Default)]
pub(crate) struct TpsWindow {
    window_start: Option<Instant>,
    ticks_in_window: u32,
    rate: f32,
}

impl TpsWindow {
    const WINDOW: Duration = Duration::from_secs(1);

    /// Record one executed tick at `now`.
    pub fn record(&mut self, now: Instant) {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            self.ticks_in_window = 1;
            return;
        };
        self.ticks_in_window += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= Self::WINDOW {
            self.rate = self.ticks_in_window as f32 / elapsed.as_secs_f32();
            self.window_start = Some(now);
            self.ticks_in_window = 0;
        }
    }

    /// The most recently completed window's rate, 0 until one completes.
    pub fn rate(&self) -> f32 {
        self.rate
    }
}
