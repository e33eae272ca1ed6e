//! Component and tag type registries.
//!
//! A registry assigns a stable, dense id to each distinct Rust type on first
//! registration and remembers the metadata the storage engine needs: the
//! element size, the type name, and a factory for allocating empty columns
//! of that type.
//!
//! ## Design
//! - Component types are keyed by [`TypeId`], not by stringified name, so
//!   same-named types in different modules never collide.
//! - Ids are assigned sequentially (`0, 1, 2, …`) and are stable for the
//!   world's lifetime; there is no unregistration.
//! - Each world owns its registries. The 64-type limits are per world, and
//!   two worlds may assign the same type different ids.
//! - Tags live in an independent id space and carry no storage beyond the
//!   per-entity bitmask, so their descriptors record identity only.
//!
//! ## Invariants
//! - Every entry in `by_type` has a matching descriptor at `by_id[id]`.
//! - `by_id.len() == next unassigned id` in each registry.
//! - A registered component always has a column factory installed.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::mem::{align_of, size_of};

use crate::engine::error::{RegistryError, RegistryKind};
use crate::engine::storage::{Column, ColumnStorage};
use crate::engine::types::{ComponentId, TagId, COMPONENT_CAP, TAG_CAP};

/// Data attached to entities and stored in archetype columns.
///
/// The bounds encode the storage contract: `Default` provides the
/// deterministic value appended by default-initialised rows, and
/// `Send + Sync + 'static` lets worlds move across threads (worlds are
/// sharded for parallelism, never shared).
///
/// Implemented automatically for every eligible type.
pub trait Component: Default + Send + Sync + 'static {}

impl<T: Default + Send + Sync + 'static> Component for T {}

/// Marker types stored as one bit of an entity's tag bitmask.
///
/// Tags carry no data; any `'static` type can serve as one. Implemented
/// automatically.
pub trait Tag: 'static {}

impl<T: 'static> Tag for T {}

/// Factory allocating an empty, type-erased column for a component id.
pub type ColumnFactory = fn() -> Box<dyn Column>;

fn new_column_storage<T: Component>() -> Box<dyn Column> {
    Box::new(ColumnStorage::<T>::new())
}

/// Describes a registered component type.
///
/// `ComponentDesc` is `Copy` and safe to clone freely for diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ComponentDesc {
    /// Dense id assigned by the registry.
    pub component_id: ComponentId,
    /// Rust type name for diagnostics.
    pub name: &'static str,
    /// Runtime identity of the component type.
    pub type_id: TypeId,
    /// Size of the component type in bytes; fixed at registration.
    pub size: usize,
    /// Alignment of the component type in bytes.
    pub align: usize,
}

impl ComponentDesc {
    fn of<T: Component>(component_id: ComponentId) -> Self {
        Self {
            component_id,
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            size: size_of::<T>(),
            align: align_of::<T>(),
        }
    }

    /// Returns `true` if this descriptor refers to type `T`.
    #[inline]
    pub fn matches_type<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl std::fmt::Display for ComponentDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ComponentDesc {{ id: {}, name: {}, size: {}, align: {} }}",
            self.component_id, self.name, self.size, self.align
        )
    }
}

/// Describes a registered tag type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TagDesc {
    /// Dense id assigned by the registry.
    pub tag_id: TagId,
    /// Rust type name for diagnostics.
    pub name: &'static str,
    /// Runtime identity of the tag type.
    pub type_id: TypeId,
}

/// World-owned mapping between component types and dense ids.
#[derive(Default)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentId>,
    by_id: Vec<ComponentDesc>,
    factories: Vec<ColumnFactory>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers component type `T` and returns its id, assigning the next
    /// free id on first registration.
    ///
    /// ## Errors
    /// - `CapacityExceeded` if 64 component ids are already in use.
    /// - `ZeroSized` if `T` has no bytes to store (use a tag instead).
    pub fn register<T: Component>(&mut self) -> Result<ComponentId, RegistryError> {
        let type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return Ok(existing);
        }

        if size_of::<T>() == 0 {
            return Err(RegistryError::ZeroSized { type_id, name: type_name::<T>() });
        }

        if self.by_id.len() >= COMPONENT_CAP {
            return Err(RegistryError::CapacityExceeded {
                kind: RegistryKind::Component,
                cap: COMPONENT_CAP,
            });
        }

        let id = self.by_id.len() as ComponentId;
        self.by_type.insert(type_id, id);
        self.by_id.push(ComponentDesc::of::<T>(id));
        self.factories.push(new_column_storage::<T>);
        tracing::debug!(id, name = type_name::<T>(), "registered component type");
        Ok(id)
    }

    /// Returns the id for `T`, if registered.
    #[inline]
    pub fn lookup<T: 'static>(&self) -> Option<ComponentId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the descriptor for `component_id`, if assigned.
    #[inline]
    pub fn description(&self, component_id: ComponentId) -> Option<&ComponentDesc> {
        self.by_id.get(component_id as usize)
    }

    /// Byte size recorded when `component_id` was assigned.
    #[inline]
    pub fn size_of_id(&self, component_id: ComponentId) -> Option<usize> {
        self.description(component_id).map(|d| d.size)
    }

    /// Allocates an empty column for `component_id`.
    pub fn new_column(&self, component_id: ComponentId) -> Option<Box<dyn Column>> {
        self.factories.get(component_id as usize).map(|factory| factory())
    }

    /// Number of assigned component ids.
    #[inline]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if no component types are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// World-owned mapping between tag types and dense ids.
#[derive(Default)]
pub struct TagRegistry {
    by_type: HashMap<TypeId, TagId>,
    by_id: Vec<TagDesc>,
}

impl TagRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers tag type `T` and returns its id, assigning the next free id
    /// on first registration.
    ///
    /// ## Errors
    /// `CapacityExceeded` if 64 tag ids are already in use.
    pub fn register<T: Tag>(&mut self) -> Result<TagId, RegistryError> {
        let type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return Ok(existing);
        }

        if self.by_id.len() >= TAG_CAP {
            return Err(RegistryError::CapacityExceeded { kind: RegistryKind::Tag, cap: TAG_CAP });
        }

        let id = self.by_id.len() as TagId;
        self.by_type.insert(type_id, id);
        self.by_id.push(TagDesc { tag_id: id, name: type_name::<T>(), type_id });
        tracing::debug!(id, name = type_name::<T>(), "registered tag type");
        Ok(id)
    }

    /// Returns the id for `T`, if registered.
    #[inline]
    pub fn lookup<T: 'static>(&self) -> Option<TagId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the descriptor for `tag_id`, if assigned.
    #[inline]
    pub fn description(&self, tag_id: TagId) -> Option<&TagDesc> {
        self.by_id.get(tag_id as usize)
    }

    /// Number of assigned tag ids.
    #[inline]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if no tag types are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
