//! Entity identity, lifecycle, and the dense entity table.
//!
//! ## Entity model
//! An [`Entity`] is a compact, versioned handle: the upper 32 bits are a
//! dense id indexing the world's entity table, the lower 32 bits a version
//! counter. A handle is *live* iff its version matches the slot's current
//! version **and** the slot currently owns an archetype row. Freed slots
//! keep their version; the *next* allocation bumps it, so a freed handle's
//! version is always distinct from its successor's.
//!
//! ## Table model
//! The table is a dense vector of [`EntityRecord`]s indexed by entity id.
//! Slot 0 is reserved and never issued, so id `0` can serve as a null-ish
//! sentinel in host code. Freed ids are recycled LIFO through a free stack.
//! When the high-water mark reaches the allocated length, the table grows by
//! a fixed `grow_step`; existing records are preserved.
//!
//! ## Invariants
//! - `records[id].version` equals the version of the most recently issued
//!   handle for `id`.
//! - `archetype` is `Some` iff the entity is placed in an archetype row;
//!   freed slots are `None`.
//! - Ids on the free stack are freed and not reachable from any archetype.

use std::fmt;

use crate::engine::types::{
    ArchetypeId, EntityBits, EntityId, Mask, RowId, Version, EMPTY_ARCHETYPE, ID_BITS, VERSION_MASK,
};

/// Opaque, versioned identifier for an entity.
///
/// Handles are by-value, freely copyable, and cheap to compare; they own
/// nothing. Two handles with the same id but different versions refer to
/// different lifetimes of the same table slot and never compare equal.

#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity(EntityBits);

#[inline]
pub(crate) const fn make_entity(id: EntityId, version: Version) -> Entity {
    Entity(((id as EntityBits) << ID_BITS) | (version as EntityBits))
}

impl Entity {
    /// Reconstructs a handle from its packed representation.
    #[inline]
    pub const fn from_bits(bits: EntityBits) -> Self {
        Entity(bits)
    }

    /// Returns the packed 64-bit representation.
    #[inline]
    pub const fn bits(self) -> EntityBits {
        self.0
    }

    /// Returns the dense table id encoded in this handle.
    #[inline]
    pub const fn id(self) -> EntityId {
        (self.0 >> ID_BITS) as EntityId
    }

    /// Returns the version counter encoded in this handle.
    #[inline]
    pub const fn version(self) -> Version {
        (self.0 & VERSION_MASK) as Version
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity(id: {}, version: {})", self.id(), self.version())
    }
}

/// Per-slot bookkeeping for one entity id.
///
/// `row` is meaningful only while `archetype` is `Some`; it is reset to 0
/// when the entity is freed.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityRecord {
    /// Version of the most recently issued handle; 0 means never used.
    pub version: Version,
    /// Archetype currently owning the entity, `None` once freed.
    pub archetype: Option<ArchetypeId>,
    /// Row within the owning archetype's columns.
    pub row: RowId,
    /// Per-entity tag bitmask, independent of the archetype.
    pub tags: Mask,
}

/// Dense entity table with LIFO id recycling and fixed-step growth.
pub struct EntityTable {
    records: Vec<EntityRecord>,
    free_store: Vec<EntityId>,
    next_id: EntityId,
    grow_step: usize,
    live: usize,
}

impl EntityTable {
    /// Creates a table with `initial_capacity` usable slots (ids
    /// `1..=initial_capacity`), growing by `grow_step` slots on demand.
    pub fn new(initial_capacity: usize, grow_step: usize) -> Self {
        Self {
            records: vec![EntityRecord::default(); initial_capacity + 1],
            free_store: Vec::new(),
            next_id: 1,
            grow_step: grow_step.max(1),
            live: 0,
        }
    }

    /// Number of usable entity slots currently allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.records.len() - 1
    }

    /// Number of live entities.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// One past the highest id ever issued; tag scans iterate `1..high_water()`.
    #[inline]
    pub fn high_water(&self) -> EntityId {
        self.next_id
    }

    /// Allocates an entity slot and returns the fresh handle.
    ///
    /// Reuses the most recently freed id if one is available, otherwise
    /// bumps the high-water mark, extending the table by `grow_step` slots
    /// when it is full. The slot's version is incremented, its archetype set
    /// to the empty archetype, and its tag mask cleared. The caller places
    /// the entity into the empty archetype and records the row.
    pub fn allocate(&mut self) -> Entity {
        let id = match self.free_store.pop() {
            Some(id) => id,
            None => {
                if self.next_id as usize >= self.records.len() {
                    let grown = self.records.len() + self.grow_step;
                    self.records.resize(grown, EntityRecord::default());
                }
                let id = self.next_id;
                self.next_id += 1;
                id
            }
        };

        let record = &mut self.records[id as usize];
        record.version = record.version.wrapping_add(1);
        record.archetype = Some(EMPTY_ARCHETYPE);
        record.row = 0;
        record.tags = Mask::EMPTY;
        self.live += 1;
        make_entity(id, record.version)
    }

    /// Marks the slot behind `entity` as freed and recycles its id.
    ///
    /// The slot's version is *not* incremented here; the next allocation of
    /// this id does that. Returns `false` if the handle was already stale.
    /// The caller removes the entity's archetype row before calling this.
    pub fn release(&mut self, entity: Entity) -> bool {
        let id = entity.id();
        let Some(record) = self.records.get_mut(id as usize) else {
            return false;
        };
        if record.version != entity.version() || record.archetype.is_none() {
            return false;
        }

        record.archetype = None;
        record.row = 0;
        record.tags = Mask::EMPTY;
        self.free_store.push(id);
        self.live -= 1;
        true
    }

    /// Returns `true` if `entity` refers to a live slot.
    #[inline]
    pub fn is_live(&self, entity: Entity) -> bool {
        match self.records.get(entity.id() as usize) {
            Some(record) => record.version == entity.version() && record.archetype.is_some(),
            None => false,
        }
    }

    /// Returns the record for a live handle, or `None` if stale.
    #[inline]
    pub fn record(&self, entity: Entity) -> Option<&EntityRecord> {
        self.records
            .get(entity.id() as usize)
            .filter(|record| record.version == entity.version() && record.archetype.is_some())
    }

    /// Mutable variant of [`EntityTable::record`].
    #[inline]
    pub fn record_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        self.records
            .get_mut(entity.id() as usize)
            .filter(|record| record.version == entity.version() && record.archetype.is_some())
    }

    /// Direct slot access by id, regardless of liveness.
    ///
    /// Used by archetype maintenance when a swap-remove displaces a
    /// neighbouring entity whose handle is not at hand.
    #[inline]
    pub fn record_by_id_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.records.get_mut(id as usize)
    }

    /// Read-only slot access by id, regardless of liveness.
    #[inline]
    pub fn record_by_id(&self, id: EntityId) -> Option<&EntityRecord> {
        self.records.get(id as usize)
    }

    /// Reconstructs the current handle for a live slot id.
    #[inline]
    pub fn handle_for(&self, id: EntityId) -> Option<Entity> {
        self.records.get(id as usize).and_then(|record| {
            record.archetype.map(|_| make_entity(id, record.version))
        })
    }
}
