//! # System — Scheduled Simulation Logic
//!
//! A system is a fallible function over the world: query some entities, read
//! and write their components, return `Ok` or bubble a store error up with
//! `?`. The [`Schedule`] runs every registered system once per tick.
//!
//! ## Ordering
//!
//! Systems run in ascending priority; equal priorities run in registration
//! order. The tie-break is an explicit sequence number, never the iteration
//! order of some unordered collection, because replaying a recorded session
//! (and asserting anything in a test) needs the same order every time.
//!
//! ## One bad system must not freeze the game
//!
//! A system that returns `Err` is wrapped as
//! [`SystemExecutionError`] with its position and captured name, handed to
//! the schedule's error sink, and the remaining systems still run. That
//! system's effect for the tick is simply missing; from the player's side
//! nothing visible happens. The default sink logs through `log::error!`; a
//! test (or an embedding with its own error boundary) injects its own via
//! [`set_error_handler`](Schedule::set_error_handler).
//!
//! ## Comparison
//!
//! - **hecs**: no built-in system concept at all; scheduling is your
//!   problem.
//! - **bevy_ecs**: parameter injection, parallel execution, run conditions.
//! Far more machinery than one game needs.

use crate::error::{EcsError, SystemExecutionError};

use super::world::World;

/// A unit of simulation logic, run once per tick with the fixed delta.
///
/// Any `FnMut(&mut World, f32) -> Result<(), EcsError>` qualifies, so
/// closures and free functions register directly.
pub trait System {
    fn run(&mut self, world: &mut World, dt: f32) -> Result<(), EcsError>;
}

impl<F: FnMut(&mut World, f32) -> Result<(), EcsError>> System for F {
    fn run(&mut self, world: &mut World, dt: f32) -> Result<(), EcsError> {
        (self)(world, dt)
    }
}

struct Entry {
    priority: i32,
    /// Registration sequence, the tie-break for equal priorities.
    seq: u64,
    /// Short name captured at registration, for error reports and timings.
    name: String,
    system: Box<dyn System>,
}

/// Wall-clock cost of one system during the most recent tick.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone)]
pub struct SystemTiming {
    pub name: String,
    pub duration_us: f64,
}

/// The ordered list of systems driven by the fixed-timestep loop.
pub struct Schedule {
    /// Kept sorted by `(priority, seq)`.
    systems: Vec<Entry>,
    next_seq: u64,
    error_sink: Box<dyn FnMut(&SystemExecutionError)>,
    /// Per-system timings from the most recent tick.
    #[cfg(feature = "diagnostics")]
    timings: Vec<SystemTiming>,
}

impl Schedule {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            next_seq: 0,
            error_sink: Box::new(|err| log::error!("{err}")),
            #[cfg(feature = "diagnostics")]
            timings: Vec::new(),
        }
    }

    /// Register a system. Lower priorities run first; ties run in
    /// registration order.
    pub fn add_system<S: System + 'static>(&mut self, system: S, priority: i32) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.systems.push(Entry {
            priority,
            seq,
            name: short_system_name(std::any::type_name::<S>()),
            system: Box::new(system),
        });
        self.systems.sort_by_key(|entry| (entry.priority, entry.seq));
    }

    /// Replace the error sink that receives each [`SystemExecutionError`].
    pub fn set_error_handler(&mut self, sink: impl FnMut(&SystemExecutionError) + 'static) {
        self.error_sink = Box::new(sink);
    }

    /// Run one tick: drain the world's deferred commands, then every system
    /// in order, all with the same `dt`. Errors are reported and skipped
    /// over; the tick always completes.
    pub fn run_tick(&mut self, world: &mut World, dt: f32) {
        world.apply_commands();

        #[cfg(feature = "diagnostics")]
        self.timings.clear();

        for (index, entry) in self.systems.iter_mut().enumerate() {
            #[cfg(feature = "diagnostics")]
            let started = std::time::Instant::now();

            if let Err(cause) = entry.system.run(world, dt) {
                let err = SystemExecutionError {
                    index,
                    name: entry.name.clone(),
                    cause,
                };
                (self.error_sink)(&err);
            }

            #[cfg(feature = "diagnostics")]
            self.timings.push(SystemTiming {
                name: entry.name.clone(),
                duration_us: started.elapsed().as_secs_f64() * 1_000_000.0,
            });
        }
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Per-system timings from the most recent tick.
    #[cfg(feature = "diagnostics")]
    pub fn timings(&self) -> &[SystemTiming] {
        &self.timings
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the module path from a fully-qualified type name, keeping the last
/// meaningful segment (`game::movement_system` → `movement_system`,
/// `{{closure}}` → `<closure>`).
fn short_system_name(full: &str) -> String {
    let name = full.rsplit("::").next().unwrap_or(full);
    if name.contains("closure") {
        "<closure>".to_string()
    } else {
        name.to_string()
    }
}
