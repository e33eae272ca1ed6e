//! # Stratum
//!
//! Archetype-based Entity-Component-System runtime for simulations and game
//! loops that update tens to hundreds of thousands of heterogeneous
//! entities per frame.
//!
//! ## Design Goals
//! - Archetype storage: entities grouped by their exact component set, one
//!   dense column per component type, iterated at near-memory-bandwidth
//! - Versioned 64-bit entity handles with stale-handle detection
//! - Constant-time tag flips decoupled from archetype transitions
//! - Deferred typed events and templated spawning as thin satellites of the
//!   storage core
//!
//! Worlds are single-threaded and `Send`: a host wanting parallelism runs
//! one world per thread rather than sharing one.
//!
//! ## Quick start
//! ```
//! use stratum::prelude::*;
//!
//! #[derive(Clone, Copy, Default)]
//! struct Position { x: f32, y: f32 }
//! #[derive(Clone, Copy, Default)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut world = World::new();
//! let entity = world.add_entity();
//! world.add_component(entity, Position { x: 1.0, y: 2.0 }).unwrap();
//! world.add_component(entity, Velocity { dx: 0.5, dy: 0.0 }).unwrap();
//!
//! for entity in world.entities_with_components2::<Position, Velocity>() {
//!     let velocity = *world.get_component::<Velocity>(entity).unwrap();
//!     let position = world.get_component_mut::<Position>(entity).unwrap();
//!     position.x += velocity.dx;
//!     position.y += velocity.dy;
//! }
//! ```

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::world::{World, WorldConfig};

pub use engine::entity::{Entity, EntityRecord};

pub use engine::component::{
    Component, ComponentDesc, ComponentRegistry, Tag, TagDesc, TagRegistry,
};

pub use engine::archetype::Archetype;

pub use engine::query::{ComponentQueryIter, TagQueryIter};

pub use engine::event::{Event, EventSink};

pub use engine::prefab::{component_init, PrefabInitializer, SpawnOverrides};

pub use engine::error::{
    ColumnError, EcsError, EcsResult, MigrationError, RegistryError, RegistryKind,
};

pub use engine::types::{
    ArchetypeId, ComponentId, EntityId, Mask, RowId, TagId, Version, COMPONENT_CAP, TAG_CAP,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude (Optional but recommended)
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used types.
///
/// Import with:
/// ```rust
/// use stratum::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        component_init, EcsError, EcsResult, Entity, SpawnOverrides, World, WorldConfig,
    };
}
