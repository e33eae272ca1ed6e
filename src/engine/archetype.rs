//! Archetypes, the archetype index, and row migration.
//!
//! An archetype stores every entity that carries exactly one combination of
//! component types. Component data lives in one dense column per type; the
//! columns of an archetype always agree on length, and row `r` of every
//! column belongs to the entity at position `r` of the archetype's entity
//! list. Iterating an archetype is therefore a linear walk over parallel
//! arrays.
//!
//! ## The archetype graph
//!
//! [`ArchetypeIndex`] maps each observed component mask to an archetype,
//! creating archetypes lazily the first time a mask appears. Archetype order
//! is creation order and is never compacted; queries rely on it being
//! stable. The empty archetype (mask 0, no columns) is created eagerly and
//! pinned at index 0 so freshly created entities always have a home.
//!
//! ## Migration
//!
//! Moving an entity between archetypes is a three-phase protocol over the
//! source row:
//!
//! 1. **Transfer** every component present in both masks from the source
//!    columns to the destination columns (append + swap-fill in one move).
//! 2. **Default-fill** every component present only in the destination.
//! 3. **Discard** every component present only in the source (swap-remove).
//!
//! All column operations must agree on the destination row and on whether
//! the source's tail row was displaced; disagreement is reported as a
//! [`MigrationError`] and indicates an engine bug. The entity lists are
//! updated last, and the displaced tail entity (if any) is reported to the
//! caller so its record can be repointed.
//!
//! ## Invariants
//! - `mask.len() == component_ids.len() == columns.len()`, ids strictly
//!   ascending and matching the mask's set bits.
//! - All columns share `count == entities.len()`.
//! - For every listed entity id, the entity table points back at this
//!   archetype and the id's list position.

use std::collections::HashMap;

use crate::engine::component::{Component, ComponentRegistry};
use crate::engine::error::{EcsError, EcsResult, MigrationError};
use crate::engine::storage::{Column, ColumnStorage};
use crate::engine::types::{ArchetypeId, ComponentId, EntityId, Mask, RowId};

/// Entities sharing one exact component-type combination, stored columnar.
pub struct Archetype {
    mask: Mask,
    component_ids: Vec<ComponentId>,
    columns: Vec<Box<dyn Column>>,
    entities: Vec<EntityId>,
}

impl Archetype {
    /// Creates an empty archetype for `mask`, allocating one column per set
    /// bit in ascending component-id order.
    ///
    /// ## Errors
    /// `MissingColumn` if a mask bit has no registered factory; the index
    /// only ever builds archetypes from registered ids, so this surfaces an
    /// engine bug rather than caller misuse.
    pub fn new(mask: Mask, registry: &ComponentRegistry) -> EcsResult<Self> {
        let component_ids: Vec<ComponentId> = mask.iter().collect();
        let mut columns = Vec::with_capacity(component_ids.len());
        for &component_id in &component_ids {
            let column = registry
                .new_column(component_id)
                .ok_or(MigrationError::MissingColumn { component_id })?;
            columns.push(column);
        }

        Ok(Self { mask, component_ids, columns, entities: Vec::new() })
    }

    /// The component mask identifying this archetype.
    #[inline]
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Component ids in this archetype, strictly ascending.
    #[inline]
    pub fn component_ids(&self) -> &[ComponentId] {
        &self.component_ids
    }

    /// Entity ids occupying this archetype, in insertion order (as modified
    /// by swap-removes).
    #[inline]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Number of entities (and live rows in every column).
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if no entities occupy this archetype.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns `true` if `component_id` is part of this archetype's mask.
    #[inline]
    pub fn contains(&self, component_id: ComponentId) -> bool {
        self.mask.has(component_id)
    }

    /// Returns `true` if this archetype carries every component in `query`.
    #[inline]
    pub fn matches(&self, query: Mask) -> bool {
        self.mask.contains_all(query)
    }

    #[inline]
    fn column_index(&self, component_id: ComponentId) -> Option<usize> {
        self.component_ids.binary_search(&component_id).ok()
    }

    /// The column backing `component_id`, or `None` if the id is not in the
    /// mask.
    #[inline]
    pub fn column_for(&self, component_id: ComponentId) -> Option<&dyn Column> {
        self.column_index(component_id).map(|index| self.columns[index].as_ref())
    }

    /// Mutable variant of [`Archetype::column_for`].
    #[inline]
    pub fn column_for_mut(&mut self, component_id: ComponentId) -> Option<&mut dyn Column> {
        let index = self.column_index(component_id)?;
        Some(self.columns[index].as_mut())
    }

    /// Live row count of the column backing `component_id`.
    #[inline]
    pub fn column_len(&self, component_id: ComponentId) -> Option<usize> {
        self.column_for(component_id).map(|column| column.count())
    }

    /// The entity id at `row`, if in range.
    #[inline]
    pub fn entity_at(&self, row: RowId) -> Option<EntityId> {
        self.entities.get(row as usize).copied()
    }

    /// Typed read of one component value.
    #[inline]
    pub fn get<T: Component>(&self, component_id: ComponentId, row: RowId) -> Option<&T> {
        self.column_for(component_id)?
            .as_any()
            .downcast_ref::<ColumnStorage<T>>()?
            .get(row)
    }

    /// Typed mutable read of one component value.
    #[inline]
    pub fn get_mut<T: Component>(&mut self, component_id: ComponentId, row: RowId) -> Option<&mut T> {
        self.column_for_mut(component_id)?
            .as_any_mut()
            .downcast_mut::<ColumnStorage<T>>()?
            .get_mut(row)
    }

    /// Typed overwrite of one component value, dropping the previous one.
    ///
    /// The caller resolves `component_id` from the registry entry for `T`,
    /// so a missing column or diverging element type is an engine bug.
    pub fn write<T: Component>(
        &mut self,
        component_id: ComponentId,
        row: RowId,
        value: T,
    ) -> EcsResult<()> {
        let column = self
            .column_for_mut(component_id)
            .ok_or(EcsError::Internal("write addressed a component outside the mask"))?;
        let column = column
            .as_any_mut()
            .downcast_mut::<ColumnStorage<T>>()
            .ok_or(EcsError::Internal("column element type diverged from its registry id"))?;
        column.write(row, value)?;
        Ok(())
    }

    /// Appends `entity_id` with default-constructed component rows.
    ///
    /// Every column grows by one default element; the new row index equals
    /// the entity's position in the id list.
    pub fn append(&mut self, entity_id: EntityId) -> RowId {
        let row = self.entities.len() as RowId;
        self.entities.push(entity_id);
        for column in &mut self.columns {
            let column_row = column.push_default();
            debug_assert_eq!(column_row, row, "column desynchronised from entity list");
        }
        row
    }

    /// Removes row `row` from every column and the entity list.
    ///
    /// Returns the id of the tail entity that was moved into `row`, if any;
    /// the caller must repoint that entity's record at the new row.
    pub fn remove_row(&mut self, row: RowId) -> EcsResult<Option<EntityId>> {
        let index = row as usize;
        if index >= self.entities.len() {
            return Err(EcsError::Internal("remove_row addressed a dead row"));
        }

        let expected_moved = index != self.entities.len() - 1;
        for (position, column) in self.columns.iter_mut().enumerate() {
            let moved = column
                .swap_remove(row)
                .map_err(|source_error| MigrationError::TransferFailed {
                    component_id: self.component_ids[position],
                    source_error,
                })?;
            if moved != expected_moved {
                return Err(MigrationError::InconsistentSwapInfo.into());
            }
        }

        self.entities.swap_remove(index);
        Ok(self.entities.get(index).copied())
    }
}

/// Moves the entity at `source_row` from `source` into `destination`.
///
/// Implements the three-phase protocol described in the module docs.
/// Returns the destination row and the id of the source-tail entity
/// displaced into `source_row`, if any. Component values present in both
/// masks are preserved; destination-only components start at their default.
///
/// The caller guarantees the archetypes are distinct and `source_row` is
/// live.
pub(crate) fn migrate_row(
    source: &mut Archetype,
    destination: &mut Archetype,
    source_row: RowId,
) -> EcsResult<(RowId, Option<EntityId>)> {
    let source_index = source_row as usize;
    if source_index >= source.entities.len() {
        return Err(EcsError::Internal("migration addressed a dead source row"));
    }

    let destination_row = destination.entities.len() as RowId;
    let expected_moved = source_index != source.entities.len() - 1;

    // Phase 1: move rows shared by both masks, destination order.
    for position in 0..destination.component_ids.len() {
        let component_id = destination.component_ids[position];
        if !source.mask.has(component_id) {
            continue;
        }

        let source_column = source
            .column_for_mut(component_id)
            .ok_or(MigrationError::MissingColumn { component_id })?;
        let (landed, moved) = destination.columns[position]
            .transfer_row(source_column, source_row)
            .map_err(|source_error| MigrationError::TransferFailed { component_id, source_error })?;

        if landed != destination_row {
            return Err(MigrationError::RowMisalignment {
                expected: destination_row,
                got: landed,
                component_id,
            }
            .into());
        }
        if moved != expected_moved {
            return Err(MigrationError::InconsistentSwapInfo.into());
        }
    }

    // Phase 2: default-fill components only the destination carries.
    for position in 0..destination.component_ids.len() {
        let component_id = destination.component_ids[position];
        if source.mask.has(component_id) {
            continue;
        }

        let landed = destination.columns[position].push_default();
        if landed != destination_row {
            return Err(MigrationError::RowMisalignment {
                expected: destination_row,
                got: landed,
                component_id,
            }
            .into());
        }
    }

    // Phase 3: discard components only the source carries.
    for position in 0..source.component_ids.len() {
        let component_id = source.component_ids[position];
        if destination.mask.has(component_id) {
            continue;
        }

        let moved = source.columns[position]
            .swap_remove(source_row)
            .map_err(|source_error| MigrationError::TransferFailed { component_id, source_error })?;
        if moved != expected_moved {
            return Err(MigrationError::InconsistentSwapInfo.into());
        }
    }

    let entity_id = source.entities.swap_remove(source_index);
    destination.entities.push(entity_id);
    debug_assert_eq!(destination.entities.len() as RowId, destination_row + 1);

    Ok((destination_row, source.entities.get(source_index).copied()))
}

/// Creation-ordered archetype storage with lazy mask resolution.
///
/// ## Invariants
/// - The empty archetype is at index 0 from construction onward.
/// - `by_mask` and the archetype vector agree; archetypes are never removed
///   or reordered.
pub struct ArchetypeIndex {
    archetypes: Vec<Archetype>,
    by_mask: HashMap<u64, ArchetypeId>,
}

impl ArchetypeIndex {
    /// Creates the index holding only the empty archetype.
    pub fn new(registry: &ComponentRegistry) -> Self {
        let empty = Archetype::new(Mask::EMPTY, registry)
            .expect("empty archetype has no columns to allocate");
        let mut by_mask = HashMap::new();
        by_mask.insert(Mask::EMPTY.bits(), 0);
        Self { archetypes: vec![empty], by_mask }
    }

    /// Number of archetypes observed so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Returns `true` if only the empty archetype exists.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.archetypes.len() == 1
    }

    /// The archetype at `id`.
    #[inline]
    pub fn archetype(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id as usize)
    }

    /// Mutable variant of [`ArchetypeIndex::archetype`].
    #[inline]
    pub fn archetype_mut(&mut self, id: ArchetypeId) -> Option<&mut Archetype> {
        self.archetypes.get_mut(id as usize)
    }

    /// All archetypes in creation order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    /// The archetype id for `mask`, if one was already created.
    #[inline]
    pub fn get(&self, mask: Mask) -> Option<ArchetypeId> {
        self.by_mask.get(&mask.bits()).copied()
    }

    /// Resolves `mask` to an archetype id, creating the archetype on first
    /// observation.
    pub fn get_or_create(
        &mut self,
        mask: Mask,
        registry: &ComponentRegistry,
    ) -> EcsResult<ArchetypeId> {
        if let Some(id) = self.get(mask) {
            return Ok(id);
        }

        if self.archetypes.len() > ArchetypeId::MAX as usize {
            return Err(EcsError::Internal("archetype id space exhausted"));
        }

        let id = self.archetypes.len() as ArchetypeId;
        self.archetypes.push(Archetype::new(mask, registry)?);
        self.by_mask.insert(mask.bits(), id);
        tracing::debug!(id, mask = mask.bits(), "created archetype");
        Ok(id)
    }

    /// Borrows two distinct archetypes mutably at once.
    ///
    /// Used by migration, which writes to the destination while draining the
    /// source. Panics if `a == b`; transitions always involve two masks.
    pub fn pair_mut(&mut self, a: ArchetypeId, b: ArchetypeId) -> (&mut Archetype, &mut Archetype) {
        assert!(a != b, "source and destination archetype must differ");
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.archetypes.split_at_mut(high as usize);
        let low_ref = &mut head[low as usize];
        let high_ref = &mut tail[0];
        if a < b {
            (low_ref, high_ref)
        } else {
            (high_ref, low_ref)
        }
    }
}
