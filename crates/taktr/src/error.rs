//! # Error Taxonomy
//!
//! Every failure the substrate can report, in one place. The split follows
//! who is responsible for handling it:
//!
//! - [`EcsError`] — store-level failures. Returned synchronously to the
//!   immediate caller (usually a system), which must decide what to do; the
//!   store itself never suppresses or logs them.
//! - [`SystemExecutionError`] — a system failed during a tick. Caught at the
//!   scheduler boundary, reported through the schedule's error sink, and the
//!   rest of the tick still runs.
//! - [`SchedulerOverrun`] — the loop owed more ticks than the per-frame cap
//!   allows. A warning condition surfaced through [`LoopStats`], never a hard
//!   failure: the simulation falls behind wall-clock time instead of
//!   freezing the frame.
//!
//! [`LoopStats`]: crate::time::LoopStats

use thiserror::Error;

use crate::ecs::component::ComponentKind;
use crate::ecs::entity::Entity;

/// A store-level operation referenced state that does not exist, or tried to
/// create state that already does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The entity is dead, stale, or was never created.
    #[error("unknown or stale entity {0}")]
    UnknownEntity(Entity),

    /// `attach` on a kind the entity already has. Use `update` to replace a
    /// value, or `detach` first.
    #[error("entity {entity} already has a {kind:?} component")]
    DuplicateComponent {
        /// Entity that was targeted.
        entity: Entity,
        /// Kind that was already attached.
        kind: ComponentKind,
    },

    /// `update` on a kind the entity does not currently have.
    #[error("entity {entity} has no {kind:?} component")]
    MissingComponent {
        /// Entity that was targeted.
        entity: Entity,
        /// Kind that was absent.
        kind: ComponentKind,
    },
}

/// A system returned an error during a tick.
///
/// Produced by [`Schedule::run_tick`](crate::ecs::system::Schedule::run_tick)
/// and handed to the schedule's error sink. Carries the system's position and
/// captured name so logs identify the offender without a debugger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("system #{index} `{name}` failed: {cause}")]
pub struct SystemExecutionError {
    /// Position of the system in priority order for this tick.
    pub index: usize,
    /// Short name captured at registration.
    pub name: String,
    /// The store error the system bubbled up.
    #[source]
    pub cause: EcsError,
}

/// More ticks were owed in one host frame than the catch-up cap allows.
///
/// The loop drops the excess whole ticks, counts the event in
/// [`LoopStats::overruns`](crate::time::LoopStats::overruns), and logs this
/// at warn level. From the player's side it shows up as slowdown, not a
/// crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("simulation overrun: {owed} ticks dropped (cap {cap} per frame)")]
pub struct SchedulerOverrun {
    /// Whole ticks that were due but discarded this frame.
    pub owed: u32,
    /// The per-frame tick cap that was hit.
    pub cap: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::entity::Entity;

    #[test]
    fn display_is_stable() {
        let e = Entity::from_raw_parts(3, 1);
        assert_eq!(
            EcsError::UnknownEntity(e).to_string(),
            "unknown or stale entity 3v1"
        );
        assert_eq!(
            EcsError::DuplicateComponent {
                entity: e,
                kind: ComponentKind::Health,
            }
            .to_string(),
            "entity 3v1 already has a Health component"
        );
        assert_eq!(
            EcsError::MissingComponent {
                entity: e,
                kind: ComponentKind::Velocity,
            }
            .to_string(),
            "entity 3v1 has no Velocity component"
        );
    }

    #[test]
    fn system_error_names_the_offender() {
        let err = SystemExecutionError {
            index: 2,
            name: "movement".to_string(),
            cause: EcsError::UnknownEntity(Entity::from_raw_parts(0, 0)),
        };
        assert_eq!(
            err.to_string(),
            "system #2 `movement` failed: unknown or stale entity 0v0"
        );
    }

    #[test]
    fn overrun_reports_dropped_ticks() {
        let warn = SchedulerOverrun { owed: 7, cap: 5 };
        assert_eq!(
            warn.to_string(),
            "simulation overrun: 7 ticks dropped (cap 5 per frame)"
        );
    }
}
