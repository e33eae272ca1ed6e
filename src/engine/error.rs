//! Error types for the storage engine and its satellite subsystems.
//!
//! This module declares focused, composable error types used across the
//! registry, column storage, archetype migration, and spawn pipeline. Each
//! error carries enough context to make failures actionable while remaining
//! small and cheap to pass around or convert into the aggregate [`EcsError`].
//!
//! ## Goals
//! * **Specificity:** Each error type models a single failure mode (registry
//!   capacity exhausted, row addressed out of bounds, column type mismatch,
//!   misaligned migration).
//! * **Ergonomics:** All errors implement [`std::error::Error`] and
//!   [`fmt::Display`], and provide `From<T>` conversions into [`EcsError`]
//!   so call sites can use `?` throughout.
//! * **Actionability:** Structured fields (offending ids, expected vs.
//!   actual types, row counts) make logs useful without reproducing the
//!   failure.
//!
//! ## Classification
//! * `Registry` capacity errors are fatal for the world: the caller cannot
//!   recover within it.
//! * `UnknownPrefab` is recoverable; it fails only the offending `spawn`.
//! * `Migration` errors and [`EcsError::Internal`] indicate violated internal
//!   invariants, i.e. an implementation bug rather than caller misuse.
//! * Misuse of dead handles is reported as [`EcsError::StaleEntity`]; debug
//!   builds additionally assert.
//!
//! ## Display vs. Debug
//! * [`fmt::Display`] is short, imperative, and log-friendly.
//! * [`fmt::Debug`] (derived) retains full structure for diagnostics.

use std::any::TypeId;
use std::fmt;

use crate::engine::types::{ComponentId, RowId};

/// Result alias used across the engine.
pub type EcsResult<T> = Result<T, EcsError>;

/// Identifies which dense id space a registry error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    /// The component id space (limit 64 per world).
    Component,
    /// The tag id space (limit 64 per world).
    Tag,
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryKind::Component => f.write_str("component"),
            RegistryKind::Tag => f.write_str("tag"),
        }
    }
}

/// Errors raised by the component and tag registries.
///
/// ### Variants
/// * `CapacityExceeded` — a 65th distinct type was registered in one id
///   space. Fatal for the world.
/// * `ZeroSized` — the type has no bytes to store; tags are the mechanism
///   for zero-sized markers, so component registration rejects them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// All dense ids in the given space are in use.
    CapacityExceeded {
        /// Which id space overflowed.
        kind: RegistryKind,
        /// The fixed limit of that space.
        cap: usize,
    },

    /// Attempted to register a zero-sized type as a component.
    ZeroSized {
        /// Runtime identity of the offending type.
        type_id: TypeId,
        /// Type name for diagnostics.
        name: &'static str,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::CapacityExceeded { kind, cap } => {
                write!(f, "{kind} type limit reached (capacity {cap})")
            }
            RegistryError::ZeroSized { name, .. } => {
                write!(f, "zero-sized type {name} cannot be a component; use a tag")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Returned when a row index addresses a column outside its live range.
///
/// ### Fields
/// * `row` — the row that was addressed.
/// * `count` — the number of live rows at the time of the access.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowOutOfBoundsError {
    /// Offending row index.
    pub row: RowId,
    /// Live rows in the column when the access happened.
    pub count: usize,
}

impl fmt::Display for RowOutOfBoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} out of bounds (count {})", self.row, self.count)
    }
}

impl std::error::Error for RowOutOfBoundsError {}

/// Returned when a column write or transfer involves the wrong element type.
///
/// This is a logic error surfaced by type-erased storage when component ids
/// diverge from the concrete types behind them (e.g. writing `Velocity` into
/// a `Position` column).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatchError {
    /// Element type the destination column declares.
    pub expected: TypeId,
    /// Type that was actually provided.
    pub actual: TypeId,
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "column type mismatch: expected {:?}, actual {:?}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for TypeMismatchError {}

/// Aggregate error for column (component storage) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnError {
    /// A row index addressed storage outside the live range.
    OutOfBounds(RowOutOfBoundsError),

    /// The dynamic type of a value did not match the column element type.
    TypeMismatch(TypeMismatchError),
}

impl fmt::Display for ColumnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnError::OutOfBounds(e) => write!(f, "{e}"),
            ColumnError::TypeMismatch(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ColumnError {}

impl From<RowOutOfBoundsError> for ColumnError {
    fn from(e: RowOutOfBoundsError) -> Self {
        ColumnError::OutOfBounds(e)
    }
}

impl From<TypeMismatchError> for ColumnError {
    fn from(e: TypeMismatchError) -> Self {
        ColumnError::TypeMismatch(e)
    }
}

/// Errors that can occur while moving an entity's row between archetypes.
///
/// ## Context
/// Raised by the three-phase migration in `archetype` when transferring
/// component rows during add/remove operations. These generally indicate
/// violated internal invariants rather than recoverable conditions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationError {
    /// A component id in the mask had no backing column.
    MissingColumn {
        /// Component whose column was absent.
        component_id: ComponentId,
    },

    /// Failed to transfer a component row between columns.
    TransferFailed {
        /// Component being transferred.
        component_id: ComponentId,
        /// Underlying column error.
        source_error: ColumnError,
    },

    /// Component columns disagreed on the destination row.
    RowMisalignment {
        /// Row the first column landed on.
        expected: RowId,
        /// Row a later column landed on.
        got: RowId,
        /// Component whose column was misaligned.
        component_id: ComponentId,
    },

    /// Swap-remove operations yielded inconsistent displacement metadata.
    InconsistentSwapInfo,
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationError::MissingColumn { component_id } => {
                write!(f, "component {component_id} has no backing column")
            }
            MigrationError::TransferFailed { component_id, source_error } => {
                write!(f, "failed to transfer component {component_id}: {source_error}")
            }
            MigrationError::RowMisalignment { expected, got, component_id } => {
                write!(
                    f,
                    "component {component_id} storage misaligned: expected row {expected}, got {got}"
                )
            }
            MigrationError::InconsistentSwapInfo => {
                f.write_str("swap-remove produced inconsistent displacement metadata")
            }
        }
    }
}

impl std::error::Error for MigrationError {}

/// Top-level error for world operations.
///
/// `From<T>` conversions allow `?` from every subsystem:
/// ```ignore
/// fn grow(world: &mut World, entity: Entity) -> EcsResult<()> {
///     world.add_component(entity, Health { current: 10, max: 10 })?; // Registry/Migration -> EcsError
///     Ok(())
/// }
/// ```

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// A registry rejected a type registration.
    Registry(RegistryError),

    /// A column operation failed.
    Column(ColumnError),

    /// An archetype migration failed partway.
    Migration(MigrationError),

    /// `spawn` named a prefab that was never registered. Recoverable.
    UnknownPrefab {
        /// The name that failed to resolve.
        name: String,
    },

    /// An operation was given a handle to a freed or reused entity slot.
    StaleEntity,

    /// An internal invariant did not hold; indicates an implementation bug.
    Internal(&'static str),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::Registry(e) => write!(f, "{e}"),
            EcsError::Column(e) => write!(f, "{e}"),
            EcsError::Migration(e) => write!(f, "{e}"),
            EcsError::UnknownPrefab { name } => write!(f, "unknown prefab '{name}'"),
            EcsError::StaleEntity => f.write_str("stale or dead entity handle"),
            EcsError::Internal(what) => write!(f, "internal invariant violated: {what}"),
        }
    }
}

impl std::error::Error for EcsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EcsError::Registry(e) => Some(e),
            EcsError::Column(e) => Some(e),
            EcsError::Migration(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RegistryError> for EcsError {
    fn from(e: RegistryError) -> Self {
        EcsError::Registry(e)
    }
}

impl From<ColumnError> for EcsError {
    fn from(e: ColumnError) -> Self {
        EcsError::Column(e)
    }
}

impl From<MigrationError> for EcsError {
    fn from(e: MigrationError) -> Self {
        EcsError::Migration(e)
    }
}
