//! The world: front door to the storage engine.
//!
//! A [`World`] aggregates the component and tag registries, the archetype
//! index, the entity table, the event bus, and the prefab registry, and
//! exposes every public operation: entity lifecycle, component add/remove
//! with archetype migration, the tag layer, queries, events, and spawning.
//!
//! ## Borrow rules
//!
//! Component access hands out borrows into column storage. A `&mut T`
//! returned by [`World::add_component`] (or a `&T` from
//! [`World::get_component`]) is valid until the next world operation:
//! archetype migration and column growth move component data, so the borrow
//! checker forces the re-fetch that raw interior pointers would merely
//! document as a convention.
//!
//! ## Threading
//!
//! A world is single-threaded: every operation runs to completion on the
//! calling thread, and nothing blocks. `World` is `Send`, so hosts wanting
//! parallelism run one world per thread (sharding); a world is never shared.

use crate::engine::archetype::{migrate_row, Archetype, ArchetypeIndex};
use crate::engine::component::{Component, ComponentRegistry, Tag, TagRegistry};
use crate::engine::entity::{Entity, EntityTable};
use crate::engine::error::{EcsError, EcsResult};
use crate::engine::event::{Event, EventBus};
use crate::engine::prefab::{PrefabInitializer, PrefabRegistry, SpawnOverrides};
use crate::engine::query::{ComponentQueryIter, TagQueryIter};
use crate::engine::types::{
    ArchetypeId, ComponentId, Mask, RowId, DEFAULT_GROW_STEP, DEFAULT_INITIAL_CAPACITY,
    EMPTY_ARCHETYPE,
};

/// Builds a query mask from looked-up component ids; `None` if any type was
/// never registered (such a query can match nothing).
fn query_mask(ids: &[Option<ComponentId>]) -> Option<Mask> {
    let mut mask = Mask::EMPTY;
    for id in ids {
        mask.set((*id)?);
    }
    Some(mask)
}

/// World construction parameters.
#[derive(Clone, Copy, Debug)]
pub struct WorldConfig {
    /// Entity slots reserved up front.
    pub initial_capacity: usize,
    /// Entity slots added each time the table's high-water mark is reached.
    pub grow_step: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { initial_capacity: DEFAULT_INITIAL_CAPACITY, grow_step: DEFAULT_GROW_STEP }
    }
}

/// Container for entities, their components and tags, and the deferred
/// event and prefab subsystems.
///
/// Dropping a world releases every archetype column and any undispatched
/// event values.
pub struct World {
    components: ComponentRegistry,
    tags: TagRegistry,
    archetypes: ArchetypeIndex,
    entities: EntityTable,
    events: EventBus,
    prefabs: PrefabRegistry,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates a world with the default configuration (1000 entity slots,
    /// growing by 1000).
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates a world with explicit capacity parameters.
    pub fn with_config(config: WorldConfig) -> Self {
        tracing::debug!(
            initial_capacity = config.initial_capacity,
            grow_step = config.grow_step,
            "initialising world"
        );
        let components = ComponentRegistry::new();
        let archetypes = ArchetypeIndex::new(&components);
        Self {
            components,
            tags: TagRegistry::new(),
            archetypes,
            entities: EntityTable::new(config.initial_capacity, config.grow_step),
            events: EventBus::new(),
            prefabs: PrefabRegistry::new(),
        }
    }

    // ── Entity lifecycle ────────────────────────────────────────────────

    /// Creates a fresh entity in the empty archetype and returns its handle.
    ///
    /// Recycles the most recently freed id if one exists; the handle's
    /// version is always one greater than any previously issued handle for
    /// the same id.
    pub fn add_entity(&mut self) -> Entity {
        let entity = self.entities.allocate();
        let empty = self
            .archetypes
            .archetype_mut(EMPTY_ARCHETYPE)
            .expect("empty archetype exists from world construction");
        let row = empty.append(entity.id());
        if let Some(record) = self.entities.record_by_id_mut(entity.id()) {
            record.row = row;
        }
        entity
    }

    /// Frees `entity`: removes its archetype row, clears its tags, and
    /// recycles its id.
    ///
    /// Returns `false` (and does nothing) if the handle is already stale.
    /// The slot's version is bumped by the *next* allocation, not here.
    pub fn free_entity(&mut self, entity: Entity) -> bool {
        let Some(record) = self.entities.record(entity) else {
            return false;
        };
        let Some(archetype_id) = record.archetype else {
            return false;
        };
        let row = record.row;

        let displaced = match self.archetypes.archetype_mut(archetype_id) {
            Some(archetype) => match archetype.remove_row(row) {
                Ok(displaced) => displaced,
                Err(error) => {
                    debug_assert!(false, "free_entity row removal failed: {error}");
                    return false;
                }
            },
            None => return false,
        };

        if let Some(displaced_id) = displaced {
            if let Some(neighbour) = self.entities.record_by_id_mut(displaced_id) {
                neighbour.row = row;
            }
        }

        self.entities.release(entity)
    }

    /// Returns `true` if `entity` refers to a live slot.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_live(entity)
    }

    // ── Components ──────────────────────────────────────────────────────

    /// Attaches component `value` to `entity`, migrating it to the archetype
    /// carrying its extended component set.
    ///
    /// If the entity already carries `T`, the existing row is assigned in
    /// place and no migration happens. Returns a borrow of the stored value;
    /// it is invalidated by the next world operation (migration or column
    /// growth may move the data), so re-fetch with [`World::get_component`]
    /// after structural changes.
    ///
    /// ## Errors
    /// - `Registry` if `T` is the 65th distinct component type.
    /// - `StaleEntity` if the handle refers to a freed slot (debug builds
    ///   assert).
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> EcsResult<&mut T> {
        let component_id = self.components.register::<T>()?;

        let Some(record) = self.entities.record(entity) else {
            debug_assert!(false, "add_component on a dead entity handle");
            return Err(EcsError::StaleEntity);
        };
        let source_id = record.archetype.ok_or(EcsError::StaleEntity)?;
        let source_row = record.row;
        let source_mask = self
            .archetypes
            .archetype(source_id)
            .ok_or(EcsError::Internal("entity record points at a missing archetype"))?
            .mask();

        if source_mask.has(component_id) {
            // Already present: assignment in place, mask unchanged.
            let archetype = self
                .archetypes
                .archetype_mut(source_id)
                .ok_or(EcsError::Internal("entity record points at a missing archetype"))?;
            archetype.write(component_id, source_row, value)?;
            return archetype
                .get_mut::<T>(component_id, source_row)
                .ok_or(EcsError::Internal("component absent immediately after assignment"));
        }

        let destination_mask = source_mask.with(component_id);
        let destination_id = self.archetypes.get_or_create(destination_mask, &self.components)?;

        let (source, destination) = self.archetypes.pair_mut(source_id, destination_id);
        let (destination_row, displaced) = migrate_row(source, destination, source_row)?;

        if let Some(displaced_id) = displaced {
            if let Some(neighbour) = self.entities.record_by_id_mut(displaced_id) {
                neighbour.row = source_row;
            }
        }
        {
            let record = self
                .entities
                .record_mut(entity)
                .ok_or(EcsError::Internal("migrated entity lost its record"))?;
            record.archetype = Some(destination_id);
            record.row = destination_row;
        }

        let destination = self
            .archetypes
            .archetype_mut(destination_id)
            .ok_or(EcsError::Internal("destination archetype vanished"))?;
        destination.write(component_id, destination_row, value)?;
        destination
            .get_mut::<T>(component_id, destination_row)
            .ok_or(EcsError::Internal("component absent immediately after add"))
    }

    /// [`World::add_component`] with `T`'s default value.
    pub fn add_component_default<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        self.add_component(entity, T::default())
    }

    /// Borrows `entity`'s `T` component, or `None` if the entity is dead or
    /// does not carry `T`.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        let component_id = self.components.lookup::<T>()?;
        let record = self.entities.record(entity)?;
        let archetype = self.archetypes.archetype(record.archetype?)?;
        archetype.get::<T>(component_id, record.row)
    }

    /// Mutable variant of [`World::get_component`]. The borrow is
    /// invalidated by the next world operation.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let component_id = self.components.lookup::<T>()?;
        let record = self.entities.record(entity)?;
        let archetype_id = record.archetype?;
        let row = record.row;
        self.archetypes.archetype_mut(archetype_id)?.get_mut::<T>(component_id, row)
    }

    /// Returns `true` if `entity` is live and carries `T`.
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        let Some(component_id) = self.components.lookup::<T>() else {
            return false;
        };
        let Some(record) = self.entities.record(entity) else {
            return false;
        };
        record
            .archetype
            .and_then(|id| self.archetypes.archetype(id))
            .is_some_and(|archetype| archetype.contains(component_id))
    }

    /// Detaches component `T` from `entity`, migrating it to the archetype
    /// carrying its reduced component set. The removed value is dropped.
    ///
    /// Removing a component the entity does not carry (including from the
    /// empty archetype) is a silent no-op.
    ///
    /// ## Errors
    /// `StaleEntity` if the handle refers to a freed slot (debug builds
    /// assert).
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> EcsResult<()> {
        let Some(component_id) = self.components.lookup::<T>() else {
            return Ok(()); // never registered, so no entity carries it
        };

        let Some(record) = self.entities.record(entity) else {
            debug_assert!(false, "remove_component on a dead entity handle");
            return Err(EcsError::StaleEntity);
        };
        let source_id = record.archetype.ok_or(EcsError::StaleEntity)?;
        let source_row = record.row;
        let source_mask = self
            .archetypes
            .archetype(source_id)
            .ok_or(EcsError::Internal("entity record points at a missing archetype"))?
            .mask();

        if !source_mask.has(component_id) {
            return Ok(());
        }

        let destination_mask = source_mask.without(component_id);
        let destination_id = self.archetypes.get_or_create(destination_mask, &self.components)?;

        let (source, destination) = self.archetypes.pair_mut(source_id, destination_id);
        let (destination_row, displaced) = migrate_row(source, destination, source_row)?;

        if let Some(displaced_id) = displaced {
            if let Some(neighbour) = self.entities.record_by_id_mut(displaced_id) {
                neighbour.row = source_row;
            }
        }
        let record = self
            .entities
            .record_mut(entity)
            .ok_or(EcsError::Internal("migrated entity lost its record"))?;
        record.archetype = Some(destination_id);
        record.row = destination_row;
        Ok(())
    }

    // ── Tags ────────────────────────────────────────────────────────────

    /// Sets tag `T`'s bit on `entity`. Constant time; no archetype
    /// migration.
    ///
    /// ## Errors
    /// - `Registry` if `T` is the 65th distinct tag type.
    /// - `StaleEntity` if the handle refers to a freed slot.
    pub fn add_tag<T: Tag>(&mut self, entity: Entity) -> EcsResult<()> {
        let tag_id = self.tags.register::<T>()?;
        let Some(record) = self.entities.record_mut(entity) else {
            debug_assert!(false, "add_tag on a dead entity handle");
            return Err(EcsError::StaleEntity);
        };
        record.tags.set(tag_id);
        Ok(())
    }

    /// Clears tag `T`'s bit on `entity`. Clearing a tag that is not set (or
    /// was never registered) is a silent no-op.
    pub fn remove_tag<T: Tag>(&mut self, entity: Entity) -> EcsResult<()> {
        let Some(tag_id) = self.tags.lookup::<T>() else {
            return Ok(());
        };
        let Some(record) = self.entities.record_mut(entity) else {
            debug_assert!(false, "remove_tag on a dead entity handle");
            return Err(EcsError::StaleEntity);
        };
        record.tags.clear(tag_id);
        Ok(())
    }

    /// Returns `true` if `entity` is live and carries tag `T`.
    pub fn has_tag<T: Tag>(&self, entity: Entity) -> bool {
        let Some(tag_id) = self.tags.lookup::<T>() else {
            return false;
        };
        self.entities
            .record(entity)
            .is_some_and(|record| record.tags.has(tag_id))
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Iterates live entities carrying component `A`, in archetype-creation
    /// order and in-archetype row order.
    pub fn with_component<A: Component>(&self) -> ComponentQueryIter<'_> {
        let mask = query_mask(&[self.components.lookup::<A>()]);
        ComponentQueryIter::new(&self.archetypes, &self.entities, mask)
    }

    /// Iterates live entities carrying both `A` and `B`.
    pub fn with_components2<A: Component, B: Component>(&self) -> ComponentQueryIter<'_> {
        let mask =
            query_mask(&[self.components.lookup::<A>(), self.components.lookup::<B>()]);
        ComponentQueryIter::new(&self.archetypes, &self.entities, mask)
    }

    /// Iterates live entities carrying `A`, `B`, and `C`.
    pub fn with_components3<A: Component, B: Component, C: Component>(
        &self,
    ) -> ComponentQueryIter<'_> {
        let mask = query_mask(&[
            self.components.lookup::<A>(),
            self.components.lookup::<B>(),
            self.components.lookup::<C>(),
        ]);
        ComponentQueryIter::new(&self.archetypes, &self.entities, mask)
    }

    /// Iterates live entities carrying `A`, `B`, `C`, and `D`.
    pub fn with_components4<A: Component, B: Component, C: Component, D: Component>(
        &self,
    ) -> ComponentQueryIter<'_> {
        let mask = query_mask(&[
            self.components.lookup::<A>(),
            self.components.lookup::<B>(),
            self.components.lookup::<C>(),
            self.components.lookup::<D>(),
        ]);
        ComponentQueryIter::new(&self.archetypes, &self.entities, mask)
    }

    /// Iterates live entities whose tag bitmask contains `T`'s bit, scanning
    /// the entity table by id.
    pub fn with_tag<T: Tag>(&self) -> TagQueryIter<'_> {
        TagQueryIter::new(&self.entities, self.tags.lookup::<T>())
    }

    /// Iterates live entities carrying component `C` *and* tag `T`.
    pub fn with_component_tag<C: Component, T: Tag>(&self) -> ComponentQueryIter<'_> {
        let mask = query_mask(&[self.components.lookup::<C>()]);
        ComponentQueryIter::new(&self.archetypes, &self.entities, mask)
            .filtered_by_tag(self.tags.lookup::<T>())
    }

    /// Materialised [`World::with_component`]; useful for chained
    /// composition at the cost of an allocation.
    pub fn entities_with_component<A: Component>(&self) -> Vec<Entity> {
        self.with_component::<A>().collect()
    }

    /// Materialised [`World::with_components2`].
    pub fn entities_with_components2<A: Component, B: Component>(&self) -> Vec<Entity> {
        self.with_components2::<A, B>().collect()
    }

    /// Materialised [`World::with_components3`].
    pub fn entities_with_components3<A: Component, B: Component, C: Component>(
        &self,
    ) -> Vec<Entity> {
        self.with_components3::<A, B, C>().collect()
    }

    /// Materialised [`World::with_components4`].
    pub fn entities_with_components4<A: Component, B: Component, C: Component, D: Component>(
        &self,
    ) -> Vec<Entity> {
        self.with_components4::<A, B, C, D>().collect()
    }

    /// Materialised [`World::with_tag`].
    pub fn entities_with_tag<T: Tag>(&self) -> Vec<Entity> {
        self.with_tag::<T>().collect()
    }

    /// Materialised [`World::with_component_tag`].
    pub fn entities_with_component_tag<C: Component, T: Tag>(&self) -> Vec<Entity> {
        self.with_component_tag::<C, T>().collect()
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Registers a listener for event type `E`, invoked at dispatch for
    /// every queued `E` in send order.
    pub fn register_listener<E: Event>(&mut self, handler: impl FnMut(&E) + Send + 'static) {
        self.events.register_listener(handler);
    }

    /// Queues an owned copy of `event` for the next dispatch. Listeners are
    /// not invoked here.
    pub fn send_event<E: Event>(&mut self, event: E) {
        self.events.send(event);
    }

    /// Delivers every queued event to its listeners and empties all queues,
    /// including queues of types with no listeners.
    pub fn dispatch_event_queue(&mut self) {
        self.events.dispatch();
    }

    /// Number of queued, undispatched events of type `E`.
    pub fn pending_events<E: Event>(&self) -> usize {
        self.events.pending::<E>()
    }

    /// Drops all undispatched events without invoking listeners.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    // ── Prefabs ─────────────────────────────────────────────────────────

    /// Registers a named prefab: an ordered list of component initializers
    /// applied to every entity spawned from it.
    pub fn register_prefab(
        &mut self,
        name: impl Into<String>,
        initializers: Vec<Box<dyn PrefabInitializer>>,
    ) {
        self.prefabs.register(name, initializers);
    }

    /// Spawns an entity from prefab `name` with no overrides.
    pub fn spawn(&mut self, name: &str) -> EcsResult<Entity> {
        self.spawn_with(name, SpawnOverrides::new())
    }

    /// Spawns an entity from prefab `name`, letting `overrides` replace
    /// initializer defaults per component type.
    ///
    /// Initializers run in declaration order; each consumes its override if
    /// one was supplied. Unused overrides are dropped.
    ///
    /// ## Errors
    /// `UnknownPrefab` if `name` was never registered (the world is left
    /// unchanged).
    pub fn spawn_with(&mut self, name: &str, mut overrides: SpawnOverrides) -> EcsResult<Entity> {
        let Some(initializers) = self.prefabs.get(name) else {
            return Err(EcsError::UnknownPrefab { name: name.to_string() });
        };

        let entity = self.add_entity();
        for initializer in initializers.iter() {
            initializer.apply(self, entity, &mut overrides)?;
        }
        Ok(entity)
    }

    // ── Introspection ───────────────────────────────────────────────────

    /// Number of live entities.
    pub fn live_entities(&self) -> usize {
        self.entities.live_count()
    }

    /// Entity slots currently allocated.
    pub fn entity_capacity(&self) -> usize {
        self.entities.capacity()
    }

    /// Number of archetypes created so far (the empty archetype included).
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// The archetype at `id`, if created.
    pub fn archetype(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.archetype(id)
    }

    /// All archetypes in creation order.
    pub fn archetypes(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    /// The `(archetype, row)` placement of a live entity.
    pub fn location_of(&self, entity: Entity) -> Option<(ArchetypeId, RowId)> {
        let record = self.entities.record(entity)?;
        record.archetype.map(|archetype| (archetype, record.row))
    }

    /// The component registry (id assignments, sizes, descriptors).
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// The tag registry.
    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }
}
