//! One-stop import for embedding code: `use taktr::prelude::*;`.

pub use crate::ecs::component::{
    Collider, Component, ComponentKind, ComponentValue, Health, KindSet, Lifetime, Position,
    Sprite, Velocity,
};
pub use crate::ecs::entity::Entity;
pub use crate::ecs::subscription::Subscription;
pub use crate::ecs::system::{Schedule, System};
pub use crate::ecs::world::{Command, CommandQueue, World};
pub use crate::error::{EcsError, SchedulerOverrun, SystemExecutionError};
pub use crate::runner::GameLoop;
pub use crate::time::{FixedTimestep, LoopStats};
