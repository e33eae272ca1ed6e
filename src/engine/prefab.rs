//! Named entity templates with per-spawn overrides.
//!
//! A prefab is a named, ordered list of component initializers captured at
//! registration time. Spawning walks the initializers in declaration order;
//! each one attaches its component type to the fresh entity, using a value
//! from the spawn's override set if present, else the default captured at
//! registration.
//!
//! Overrides are keyed by the component's [`TypeId`], never by stringified
//! type name, so same-named types in different modules cannot collide.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::component::Component;
use crate::engine::entity::Entity;
use crate::engine::error::EcsResult;
use crate::engine::world::World;

/// One step of a prefab: attaches a single component type to a spawned
/// entity.
///
/// Implementations capture the concrete component type and its default
/// value; [`component_init`] builds the standard adapter.
pub trait PrefabInitializer: Send + Sync {
    /// Component type name, for diagnostics.
    fn component_name(&self) -> &'static str;

    /// Attaches the component to `entity`, consuming a matching override
    /// from `overrides` if one was supplied.
    fn apply(&self, world: &mut World, entity: Entity, overrides: &mut SpawnOverrides)
        -> EcsResult<()>;
}

struct ComponentInit<T> {
    default: T,
}

impl<T: Component + Clone> PrefabInitializer for ComponentInit<T> {
    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn apply(
        &self,
        world: &mut World,
        entity: Entity,
        overrides: &mut SpawnOverrides,
    ) -> EcsResult<()> {
        let value = overrides.take::<T>().unwrap_or_else(|| self.default.clone());
        world.add_component(entity, value)?;
        Ok(())
    }
}

/// Builds the standard initializer: attach `T`, defaulting to `default`,
/// overridable per spawn.
pub fn component_init<T: Component + Clone>(default: T) -> Box<dyn PrefabInitializer> {
    Box::new(ComponentInit { default })
}

/// Per-spawn component value overrides, keyed by component type.
///
/// Setting a value for a type already present replaces it; each override is
/// consumed by at most one initializer.
#[derive(Default)]
pub struct SpawnOverrides {
    values: Vec<(TypeId, Box<dyn Any + Send>)>,
}

impl SpawnOverrides {
    /// Creates an empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`SpawnOverrides::set`].
    pub fn with<T: Component>(mut self, value: T) -> Self {
        self.set(value);
        self
    }

    /// Stores `value` as the override for type `T`, replacing any previous
    /// override of the same type.
    pub fn set<T: Component>(&mut self, value: T) {
        let type_id = TypeId::of::<T>();
        if let Some(slot) = self.values.iter_mut().find(|(id, _)| *id == type_id) {
            slot.1 = Box::new(value);
        } else {
            self.values.push((type_id, Box::new(value)));
        }
    }

    /// Removes and returns the override for type `T`, if present.
    pub fn take<T: Component>(&mut self) -> Option<T> {
        let position = self.values.iter().position(|(id, _)| *id == TypeId::of::<T>())?;
        let (_, value) = self.values.swap_remove(position);
        value.downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Number of overrides not yet consumed.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no overrides remain.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Named prefab storage.
///
/// Registering a name twice replaces the previous template; spawns started
/// earlier keep the template they resolved (the initializer list is shared
/// by `Arc`).
#[derive(Default)]
pub struct PrefabRegistry {
    by_name: HashMap<String, Arc<[Box<dyn PrefabInitializer>]>>,
}

impl PrefabRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `initializers` under `name`, replacing any previous prefab
    /// with that name.
    pub fn register(&mut self, name: impl Into<String>, initializers: Vec<Box<dyn PrefabInitializer>>) {
        let name = name.into();
        tracing::debug!(prefab = %name, components = initializers.len(), "registered prefab");
        self.by_name.insert(name, initializers.into());
    }

    /// The initializer list for `name`, if registered.
    pub fn get(&self, name: &str) -> Option<Arc<[Box<dyn PrefabInitializer>]>> {
        self.by_name.get(name).cloned()
    }

    /// Number of registered prefabs.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if no prefabs are registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
