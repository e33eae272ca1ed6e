//! Query iterators over archetype storage.
//!
//! Queries yield live [`Entity`] handles; component access goes back through
//! the world (`get_component` / `get_component_mut`) using the yielded
//! handle. Two iterator shapes exist:
//!
//! - [`ComponentQueryIter`] walks archetypes in creation order, visiting
//!   every archetype whose mask is a superset of the query mask, and yields
//!   each row in its current in-archetype order. An optional tag filter
//!   additionally tests the per-entity tag bit.
//! - [`TagQueryIter`] ignores archetypes entirely and scans the entity table
//!   from id 1 to the high-water mark, yielding live entities whose tag
//!   bitmask contains the tag bit.
//!
//! ## Iterator–mutation discipline
//! Iterators borrow the world shared, so structural mutation (`add_entity`,
//! `free_entity`, component add/remove) during iteration is rejected at
//! compile time. Mutating component *values* between pulls, via handles
//! collected from the materialising variants, is fine.

use crate::engine::archetype::ArchetypeIndex;
use crate::engine::entity::{Entity, EntityTable};
use crate::engine::types::{ArchetypeId, EntityId, Mask, RowId, TagId};

/// Streaming iterator over entities matching a component mask, optionally
/// filtered by one tag bit.
pub struct ComponentQueryIter<'w> {
    archetypes: &'w ArchetypeIndex,
    entities: &'w EntityTable,
    mask: Mask,
    tag: Option<TagId>,
    archetype_cursor: usize,
    row_cursor: usize,
    exhausted: bool,
}

impl<'w> ComponentQueryIter<'w> {
    /// A query naming a type no archetype can contain (`mask` is `None`)
    /// matches nothing.
    pub(crate) fn new(
        archetypes: &'w ArchetypeIndex,
        entities: &'w EntityTable,
        mask: Option<Mask>,
    ) -> Self {
        Self {
            archetypes,
            entities,
            mask: mask.unwrap_or(Mask::EMPTY),
            tag: None,
            archetype_cursor: 0,
            row_cursor: 0,
            exhausted: mask.is_none(),
        }
    }

    /// Adds a per-entity tag-bit filter; an unresolved tag (`None`) matches
    /// nothing.
    pub(crate) fn filtered_by_tag(mut self, tag: Option<TagId>) -> Self {
        match tag {
            Some(tag_id) => self.tag = Some(tag_id),
            None => self.exhausted = true,
        }
        self
    }
}

impl Iterator for ComponentQueryIter<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        if self.exhausted {
            return None;
        }

        loop {
            if self.archetype_cursor > ArchetypeId::MAX as usize {
                return None;
            }
            let archetype = self.archetypes.archetype(self.archetype_cursor as ArchetypeId)?;

            if !archetype.matches(self.mask) {
                self.archetype_cursor += 1;
                self.row_cursor = 0;
                continue;
            }

            let Some(entity_id) = archetype.entity_at(self.row_cursor as RowId) else {
                self.archetype_cursor += 1;
                self.row_cursor = 0;
                continue;
            };
            self.row_cursor += 1;

            if let Some(tag_id) = self.tag {
                let tagged = self
                    .entities
                    .record_by_id(entity_id)
                    .is_some_and(|record| record.tags.has(tag_id));
                if !tagged {
                    continue;
                }
            }

            match self.entities.handle_for(entity_id) {
                Some(entity) => return Some(entity),
                None => {
                    debug_assert!(false, "archetype listed an entity with no live record");
                    continue;
                }
            }
        }
    }
}

/// Streaming iterator over live entities carrying one tag bit.
///
/// Scans the entity table by id rather than by archetype; entities with no
/// components at all are still visited.
pub struct TagQueryIter<'w> {
    entities: &'w EntityTable,
    tag: Option<TagId>,
    cursor: EntityId,
}

impl<'w> TagQueryIter<'w> {
    pub(crate) fn new(entities: &'w EntityTable, tag: Option<TagId>) -> Self {
        Self { entities, tag, cursor: 1 }
    }
}

impl Iterator for TagQueryIter<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let tag_id = self.tag?;

        while self.cursor < self.entities.high_water() {
            let id = self.cursor;
            self.cursor += 1;

            let Some(record) = self.entities.record_by_id(id) else {
                continue;
            };
            // Strict liveness: freed-but-unreused slots are skipped.
            if record.archetype.is_none() || !record.tags.has(tag_id) {
                continue;
            }

            return self.entities.handle_for(id);
        }
        None
    }
}
