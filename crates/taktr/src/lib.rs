//! # Taktr — Deterministic Simulation Substrate
//!
//! The core a real-time game sits on: an entity/component store with a
//! closed component vocabulary, cached membership queries, per-component
//! update subscriptions, a priority-ordered system schedule, and a
//! fixed-timestep loop that decouples simulation rate from display refresh
//! with bounded catch-up.
//!
//! Rendering, input, UI, combat rules, and persistence live outside; they
//! talk to this crate through [`World`](ecs::World), [`Schedule`](ecs::Schedule),
//! and [`GameLoop`](runner::GameLoop), and observe mutations through
//! subscriptions. Start with `use taktr::prelude::*`.

pub mod ecs;
pub mod error;
pub mod prelude;
pub mod runner;
pub mod time;

#[cfg(feature = "diagnostics")]
pub mod diag;
