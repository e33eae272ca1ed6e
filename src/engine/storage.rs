//! Type-erased columnar component storage.
//!
//! Each archetype owns one column per component type in its mask. A column is
//! a dense, contiguous array of one element type with an explicit live count;
//! rows are addressed by index and are identical across all columns of an
//! archetype.
//!
//! ## Memory model
//!
//! [`ColumnStorage<T>`] manages its buffer by hand: a slab of
//! `MaybeUninit<T>` slots whose length is the capacity, plus a `count` of
//! initialised elements. Growth allocates [`COLUMN_MIN_CAPACITY`] slots the
//! first time and doubles afterwards. Only slots below `count` are ever
//! treated as initialised.
//!
//! Elements are *moved*, never byte-copied: swap-remove reads the removed
//! value out and drops it, transfers between columns read out of the source
//! and write into the destination. Components may therefore own heap
//! resources without double-free or leak.
//!
//! ## Type erasure
//!
//! Archetypes store columns as `Box<dyn Column>`. The [`Column`] trait
//! exposes the untyped surface migration needs (append-default, swap-remove,
//! cross-column transfer, dynamic write); typed access goes through
//! `as_any` downcasts to the concrete [`ColumnStorage<T>`].
//!
//! ## Invariants
//! - `count <= capacity` at all times.
//! - Slots in `[0, count)` are initialised; slots in `[count, capacity)` are
//!   not and are never read.
//! - `element_type_id` never changes after construction.

use std::any::{type_name, Any, TypeId};
use std::mem::MaybeUninit;

use crate::engine::component::Component;
use crate::engine::error::{ColumnError, RowOutOfBoundsError, TypeMismatchError};
use crate::engine::types::{RowId, COLUMN_MIN_CAPACITY};

/// Untyped surface of a component column.
///
/// ## Purpose
/// Lets archetypes hold heterogeneous columns uniformly and lets the
/// migration protocol operate on rows without knowing element types.
///
/// ## Contract
/// All columns of one archetype report the same `count` after any archetype
/// operation; the archetype layer is responsible for calling these methods
/// in lock step across its columns.

pub trait Column: Any + Send + Sync {
    /// Number of live rows.
    fn count(&self) -> usize;

    /// Allocated row capacity.
    fn capacity(&self) -> usize;

    /// Runtime identity of the element type.
    fn element_type_id(&self) -> TypeId;

    /// Element type name for diagnostics.
    fn element_type_name(&self) -> &'static str;

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Appends a default-constructed row and returns its index.
    fn push_default(&mut self) -> RowId;

    /// Removes row `row` by moving the last row into it.
    ///
    /// Returns `true` if a tail row was moved into `row` (i.e. `row` was not
    /// the last row), `false` otherwise.
    fn swap_remove(&mut self, row: RowId) -> Result<bool, ColumnError>;

    /// Overwrites row `row` with a dynamically typed value, dropping the
    /// previous element.
    fn write_dyn(&mut self, row: RowId, value: Box<dyn Any>) -> Result<(), ColumnError>;

    /// Moves row `source_row` out of `source` and appends it to `self`.
    ///
    /// The source column is swap-filled exactly as in [`Column::swap_remove`],
    /// but the moved value is not dropped; it lands in this column. Returns
    /// the destination row and whether the source's tail row was displaced.
    fn transfer_row(
        &mut self,
        source: &mut dyn Column,
        source_row: RowId,
    ) -> Result<(RowId, bool), ColumnError>;
}

/// Dense typed storage for one component type.
///
/// See the module docs for the memory model. All `unsafe` in this type is
/// justified by the `count` invariant: reads and drops touch only
/// initialised slots.

pub struct ColumnStorage<T> {
    slots: Vec<MaybeUninit<T>>,
    count: usize,
}

impl<T> Default for ColumnStorage<T> {
    fn default() -> Self {
        Self { slots: Vec::new(), count: 0 }
    }
}

impl<T: Component> ColumnStorage<T> {
    /// Creates an empty column with no allocation.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn ensure_capacity(&mut self) {
        if self.count == self.slots.len() {
            let new_capacity = if self.slots.is_empty() {
                COLUMN_MIN_CAPACITY
            } else {
                self.slots.len() * 2
            };
            self.slots.resize_with(new_capacity, MaybeUninit::uninit);
        }
    }

    #[inline]
    fn bounds_check(&self, row: RowId) -> Result<usize, ColumnError> {
        let index = row as usize;
        if index >= self.count {
            return Err(RowOutOfBoundsError { row, count: self.count }.into());
        }
        Ok(index)
    }

    /// Appends `value` and returns its row index.
    pub fn push(&mut self, value: T) -> RowId {
        self.ensure_capacity();
        let row = self.count;
        self.slots[row].write(value);
        self.count += 1;
        row as RowId
    }

    /// Returns the element at `row`, if live.
    #[inline]
    pub fn get(&self, row: RowId) -> Option<&T> {
        let index = row as usize;
        if index >= self.count {
            return None;
        }
        Some(unsafe { self.slots[index].assume_init_ref() })
    }

    /// Returns the element at `row` mutably, if live.
    #[inline]
    pub fn get_mut(&mut self, row: RowId) -> Option<&mut T> {
        let index = row as usize;
        if index >= self.count {
            return None;
        }
        Some(unsafe { self.slots[index].assume_init_mut() })
    }

    /// Overwrites row `row` with `value`, dropping the previous element.
    pub fn write(&mut self, row: RowId, value: T) -> Result<(), ColumnError> {
        let index = self.bounds_check(row)?;
        let old = std::mem::replace(&mut self.slots[index], MaybeUninit::new(value));
        unsafe { old.assume_init() };
        Ok(())
    }

    /// Reads the value at `row` out of the column, swap-filling the hole.
    ///
    /// Returns the value and whether the tail row was moved into `row`. The
    /// live count shrinks by one; the moved-out value is now owned by the
    /// caller.
    fn take(&mut self, row: RowId) -> Result<(T, bool), ColumnError> {
        let index = self.bounds_check(row)?;
        let last = self.count - 1;
        let value = unsafe { self.slots[index].assume_init_read() };
        let moved = index != last;
        if moved {
            let tail = unsafe { self.slots[last].assume_init_read() };
            self.slots[index].write(tail);
        }
        self.count = last;
        Ok((value, moved))
    }
}

impl<T: Component> Column for ColumnStorage<T> {
    fn count(&self) -> usize {
        self.count
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn element_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn element_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn push_default(&mut self) -> RowId {
        self.push(T::default())
    }

    fn swap_remove(&mut self, row: RowId) -> Result<bool, ColumnError> {
        let (removed, moved) = self.take(row)?;
        drop(removed);
        Ok(moved)
    }

    fn write_dyn(&mut self, row: RowId, value: Box<dyn Any>) -> Result<(), ColumnError> {
        match value.downcast::<T>() {
            Ok(v) => self.write(row, *v),
            Err(value) => Err(TypeMismatchError {
                expected: TypeId::of::<T>(),
                actual: value.as_ref().type_id(),
            }
            .into()),
        }
    }

    fn transfer_row(
        &mut self,
        source: &mut dyn Column,
        source_row: RowId,
    ) -> Result<(RowId, bool), ColumnError> {
        let actual = source.element_type_id();
        let source = source
            .as_any_mut()
            .downcast_mut::<ColumnStorage<T>>()
            .ok_or(TypeMismatchError { expected: TypeId::of::<T>(), actual })?;

        let (value, moved) = source.take(source_row)?;
        let destination_row = self.push(value);
        Ok((destination_row, moved))
    }
}

impl<T> Drop for ColumnStorage<T> {
    fn drop(&mut self) {
        for slot in &mut self.slots[..self.count] {
            unsafe { slot.assume_init_drop() };
        }
    }
}
