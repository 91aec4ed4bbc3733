//! # GameLoop — The Top-Level Driver
//!
//! Owns the [`World`] and the [`Schedule`], and converts the host's
//! once-per-display-refresh callback into zero or more fixed simulation
//! ticks plus exactly one render callback.
//!
//! ## State machine
//!
//! ```text
//! Stopped ──start()──▶ Running ◀──set_paused(false)──┐
//!    ▲                    │                          │
//!    │                    ├──set_paused(true)──▶  Paused
//!    └───────stop()───────┴──────────stop()──────────┘
//! ```
//!
//! While Paused the host keeps calling [`frame`](GameLoop::frame), the
//! frozen scene keeps rendering with an unchanged interpolation factor, and
//! no tick runs. After [`stop`](GameLoop::stop), neither a tick nor a
//! render happens again.
//!
//! ## One host frame
//!
//! 1. Sample the clock, clamp the delta, bank it (unless paused).
//! 2. Run due ticks through the schedule, up to the catch-up cap; dropped
//!    ticks are counted as an overrun and logged at warn level.
//! 3. Invoke the render callback once with `accumulator / fixed_step`.
//! 4. Honor control requests filed during the frame, by systems or by the
//!    render callback, via [`World::request_stop`]/[`World::request_pause`]
//!    — the deferred, in-frame form of
//!    [`stop`](GameLoop::stop)/[`set_paused`](GameLoop::set_paused).
//!
//! The host owns the cadence. A windowed game calls `frame()` from its
//! redraw event; the demo and the tests drive [`frame_at`](GameLoop::frame_at)
//! with explicit instants, which makes the whole loop deterministic under
//! test.

use std::time::{Duration, Instant};

use crate::ecs::system::Schedule;
use crate::ecs::world::World;
use crate::error::SchedulerOverrun;
use crate::time::{FixedTimestep, LoopStats, TpsWindow};

/// Callback invoked once per host frame after all due ticks, with shared
/// world access and the interpolation factor in `[0, 1)`.
pub type RenderFn = Box<dyn FnMut(&World, f32)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Stopped,
    Running,
    Paused,
}

/// Fixed-timestep driver: the only owner of the world while the game runs.
pub struct GameLoop {
    world: World,
    schedule: Schedule,
    timestep: FixedTimestep,
    render: RenderFn,
    state: LoopState,
    ticks: u64,
    overruns: u64,
    last_tick_duration: Duration,
    tps: TpsWindow,
}

impl GameLoop {
    /// Assemble a loop from a populated world and schedule. The render
    /// callback is installed here, once; there is exactly one.
    pub fn new(
        world: World,
        schedule: Schedule,
        fixed_step: Duration,
        render: impl FnMut(&World, f32) + 'static,
    ) -> Self {
        Self {
            world,
            schedule,
            timestep: FixedTimestep::new(fixed_step),
            render: Box::new(render),
            state: LoopState::Stopped,
            ticks: 0,
            overruns: 0,
            last_tick_duration: Duration::ZERO,
            tps: TpsWindow::default(),
        }
    }

    /// Override the stall clamp on a single host-frame delta.
    pub fn with_max_frame_delta(mut self, clamp: Duration) -> Self {
        self.timestep.set_max_frame_delta(clamp);
        self
    }

    /// Override the catch-up cap (ticks per host frame). Clamped to ≥ 1.
    pub fn with_max_ticks_per_frame(mut self, cap: u32) -> Self {
        self.timestep.set_max_ticks_per_frame(cap);
        self
    }

    /// Shared access to the world between frames (setup, inspection).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Exclusive access to the world between frames.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    // ── State machine ────────────────────────────────────────────────

    /// Stopped → Running. Resets the accumulator and takes a fresh clock
    /// sample; a stopped span never becomes catch-up work. No-op unless
    /// currently Stopped (resume from Paused goes through
    /// [`set_paused`](GameLoop::set_paused)).
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// [`start`](GameLoop::start) with an explicit clock sample, for
    /// deterministic hosts and tests.
    pub fn start_at(&mut self, now: Instant) {
        if self.state != LoopState::Stopped {
            return;
        }
        self.timestep.begin(now);
        self.state = LoopState::Running;
    }

    /// Running or Paused → Stopped. Idempotent. After this returns, no
    /// further tick or render callback will run; the host should drop its
    /// per-frame callback registration.
    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
    }

    /// Toggle Running ⇄ Paused. Ignored while Stopped. Pausing freezes the
    /// accumulator but frames keep rendering the frozen scene.
    pub fn set_paused(&mut self, paused: bool) {
        self.state = match (self.state, paused) {
            (LoopState::Running, true) => LoopState::Paused,
            (LoopState::Paused, false) => LoopState::Running,
            (other, _) => other,
        };
    }

    // ── Frame pump ───────────────────────────────────────────────────

    /// One host callback, sampling the real clock.
    pub fn frame(&mut self) {
        self.frame_at(Instant::now());
    }

    /// One host callback at an explicit instant: run due ticks, render
    /// once, honor deferred control requests. Does nothing while Stopped.
    pub fn frame_at(&mut self, now: Instant) {
        if self.state == LoopState::Stopped {
            return;
        }
        let paused = self.state == LoopState::Paused;
        let budget = self.timestep.advance(now, paused);

        for _ in 0..budget.ticks {
            let started = Instant::now();
            self.schedule.run_tick(&mut self.world, self.timestep.step_secs());
            self.last_tick_duration = started.elapsed();
            self.ticks += 1;
            self.tps.record(now);
        }
        if budget.dropped > 0 {
            self.overruns += 1;
            let warn = SchedulerOverrun {
                owed: budget.dropped,
                cap: self.timestep.max_ticks_per_frame(),
            };
            log::warn!("{warn}");
        }

        (self.render)(&self.world, self.timestep.interpolation());

        // Control requests filed during ticks or the render callback take
        // effect only now, between frames.
        let (stop, pause) = self.world.take_control();
        if let Some(paused) = pause {
            self.set_paused(paused);
        }
        if stop {
            self.stop();
        }
    }

    /// Read-only loop statistics. Observability only; nothing in the loop
    /// reads these back.
    pub fn stats(&self) -> LoopStats {
        LoopStats {
            ticks: self.ticks,
            ticks_per_second: self.tps.rate(),
            last_tick_duration: self.last_tick_duration,
            overruns: self.overruns,
            running: self.state == LoopState::Running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{Component, ComponentKind, Position, Velocity};
    use crate::error::EcsError;
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    const STEP: Duration = Duration::from_millis(10);

    fn movement_schedule() -> Schedule {
        let mut schedule = Schedule::new();
        schedule.add_system(
            |world: &mut World, dt: f32| -> Result<(), EcsError> {
                for entity in world.query(&[ComponentKind::Position, ComponentKind::Velocity]) {
                    let step = world.get::<Velocity>(entity).copied().unwrap_or_default();
                    if let Some(pos) = world.get_mut::<Position>(entity) {
                        pos.0 += step.0 * dt;
                    }
                }
                Ok(())
            },
            0,
        );
        schedule
    }

    /// Render probe capturing every interpolation value handed out.
    fn probe() -> (Rc<RefCell<Vec<f32>>>, impl FnMut(&World, f32)) {
        let seen: Rc<RefCell<Vec<f32>>> = Rc::new(RefCell::new(Vec::new()));
        let seen_cb = Rc::clone(&seen);
        (seen, move |_: &World, alpha: f32| {
            seen_cb.borrow_mut().push(alpha)
        })
    }

    #[test]
    fn ticks_advance_the_simulation() {
        let mut world = World::new();
        let e = world
            .create([
                Position(Vec2::ZERO).wrap(),
                Velocity(Vec2::new(60.0, 0.0)).wrap(),
            ])
            .unwrap();

        let (alphas, render) = probe();
        let mut game = GameLoop::new(world, movement_schedule(), STEP, render);
        let base = Instant::now();
        game.start_at(base);

        // Six 10 ms frames: one tick each, one render each.
        for i in 1..=6u32 {
            game.frame_at(base + Duration::from_millis(u64::from(i) * 10));
        }
        let stats = game.stats();
        assert_eq!(stats.ticks, 6);
        assert!(stats.running);
        assert_eq!(alphas.borrow().len(), 6);

        // 6 ticks × 10 ms at 60 u/s = 3.6 units.
        let pos = game.world().get::<Position>(e).unwrap();
        assert!((pos.0.x - 3.6).abs() < 1e-4);
    }

    #[test]
    fn render_runs_every_frame_even_with_no_tick_due() {
        let world = World::new();
        let (alphas, render) = probe();
        let mut game = GameLoop::new(world, Schedule::new(), STEP, render);
        let base = Instant::now();
        game.start_at(base);

        // 4 ms frame: no tick due, render still happens, alpha = 0.4.
        game.frame_at(base + Duration::from_millis(4));
        assert_eq!(game.stats().ticks, 0);
        let seen = alphas.borrow();
        assert_eq!(seen.len(), 1);
        assert!((seen[0] - 0.4).abs() < 1e-3);
    }

    #[test]
    fn paused_frames_render_with_frozen_interpolation() {
        // Pause mid-run; further host frames tick nothing and hand the
        // renderer an unchanged interpolation.
        let world = World::new();
        let (alphas, render) = probe();
        let mut game = GameLoop::new(world, Schedule::new(), STEP, render);
        let base = Instant::now();
        game.start_at(base);

        game.frame_at(base + Duration::from_millis(15)); // 1 tick, alpha 0.5
        assert_eq!(game.stats().ticks, 1);

        game.set_paused(true);
        assert!(!game.stats().running);
        for ms in [40u64, 80, 120] {
            game.frame_at(base + Duration::from_millis(15 + ms));
        }
        assert_eq!(game.stats().ticks, 1); // no ticks while paused

        let seen = alphas.borrow();
        assert_eq!(seen.len(), 4);
        assert!(seen[1..].iter().all(|&alpha| (alpha - seen[0]).abs() < 1e-6));
        drop(seen);

        // Resume: time while paused was not banked.
        game.set_paused(false);
        game.frame_at(base + Duration::from_millis(137));
        assert_eq!(game.stats().ticks, 1); // only 2 ms since the last sample
        assert!(game.stats().running);
    }

    #[test]
    fn stop_is_final_for_ticks_and_renders() {
        let world = World::new();
        let (alphas, render) = probe();
        let mut game = GameLoop::new(world, Schedule::new(), STEP, render);
        let base = Instant::now();
        game.start_at(base);
        game.frame_at(base + Duration::from_millis(10));
        assert_eq!(alphas.borrow().len(), 1);

        game.stop();
        game.stop(); // idempotent
        game.frame_at(base + Duration::from_millis(20));
        game.frame_at(base + Duration::from_millis(30));
        assert_eq!(game.stats().ticks, 1);
        assert_eq!(alphas.borrow().len(), 1); // no render after stop
        assert!(!game.stats().running);
    }

    #[test]
    fn start_is_noop_while_running_and_resets_when_stopped() {
        let world = World::new();
        let mut game = GameLoop::new(world, Schedule::new(), STEP, |_, _| {});
        let base = Instant::now();
        game.start_at(base);
        game.frame_at(base + Duration::from_millis(7));

        // start() while Running: accumulator untouched.
        game.start_at(base + Duration::from_millis(7));
        game.frame_at(base + Duration::from_millis(10));
        assert_eq!(game.stats().ticks, 1); // 7 + 3 ms banked

        // Stop, restart: the accumulator resets, old fraction is gone.
        game.stop();
        game.start_at(base + Duration::from_millis(100));
        game.frame_at(base + Duration::from_millis(109));
        assert_eq!(game.stats().ticks, 1); // 9 ms banked, still no tick
    }

    #[test]
    fn overruns_are_counted_and_bounded() {
        let world = World::new();
        let mut game = GameLoop::new(world, movement_schedule(), STEP, |_, _| {})
            .with_max_frame_delta(Duration::from_secs(1))
            .with_max_ticks_per_frame(3);
        let base = Instant::now();
        game.start_at(base);

        // 100 ms owes 10 ticks: 3 run, 7 dropped, one overrun counted.
        game.frame_at(base + Duration::from_millis(100));
        let stats = game.stats();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.overruns, 1);

        // A calm frame afterwards is back to normal.
        game.frame_at(base + Duration::from_millis(110));
        assert_eq!(game.stats().ticks, 4);
        assert_eq!(game.stats().overruns, 1);
    }

    #[test]
    fn in_tick_stop_request_takes_effect_after_the_frame() {
        let mut world = World::new();
        world.create([Position(Vec2::ZERO).wrap()]).unwrap();
        let mut schedule = Schedule::new();
        schedule.add_system(
            |world: &mut World, _dt: f32| -> Result<(), EcsError> {
                world.request_stop();
                Ok(())
            },
            0,
        );

        let (alphas, render) = probe();
        let mut game = GameLoop::new(world, schedule, STEP, render);
        let base = Instant::now();
        game.start_at(base);

        // The frame that runs the requesting tick still completes,
        // including its render...
        game.frame_at(base + Duration::from_millis(10));
        assert_eq!(game.stats().ticks, 1);
        assert_eq!(alphas.borrow().len(), 1);
        assert!(!game.stats().running);

        // ...and nothing runs afterwards.
        game.frame_at(base + Duration::from_millis(20));
        assert_eq!(game.stats().ticks, 1);
        assert_eq!(alphas.borrow().len(), 1);
    }

    #[test]
    fn render_callback_can_request_stop() {
        let world = World::new();
        let mut game = GameLoop::new(world, Schedule::new(), STEP, |world: &World, _| {
            world.request_stop();
        });
        let base = Instant::now();
        game.start_at(base);
        game.frame_at(base + Duration::from_millis(10));
        assert!(!game.stats().running);
        let ticks_before = game.stats().ticks;
        game.frame_at(base + Duration::from_millis(20));
        assert_eq!(game.stats().ticks, ticks_before);
    }

    #[test]
    fn in_tick_pause_request_freezes_the_next_frame() {
        let mut world = World::new();
        world.create([Position(Vec2::ZERO).wrap()]).unwrap();
        let mut schedule = Schedule::new();
        schedule.add_system(
            |world: &mut World, _dt: f32| -> Result<(), EcsError> {
                world.request_pause(true);
                Ok(())
            },
            0,
        );

        let mut game = GameLoop::new(world, schedule, STEP, |_, _| {});
        let base = Instant::now();
        game.start_at(base);
        game.frame_at(base + Duration::from_millis(10));
        assert_eq!(game.stats().ticks, 1);

        game.frame_at(base + Duration::from_millis(20));
        assert_eq!(game.stats().ticks, 1); // paused, no further ticks
        assert!(!game.stats().running);
    }
}
