//! Hierarchical position engine.
//!
//! # Responsibility
//! - Assign, shift and rewrite the integer `position` of columns within a
//!   board and cards within a column.
//! - Run every mutation as one atomic, write-locked SQLite transaction.
//!
//! # Invariants
//! - Per parent, living children hold positions exactly `{0, .., n-1}`,
//!   before and after every operation.
//! - A child's parent changes only through `move_to`.
//! - Parent existence is re-checked inside the transaction; services check
//!   it too, but the engine does not trust that check.

mod engine;
mod error;
mod family;

pub(crate) use engine::{run, LoggedFailure};
pub use engine::{Compaction, Placement, PositionEngine, Relocation, Slot};
pub use error::{PositionError, PositionResult};
pub use family::{CardAttrs, CardsInColumn, ColumnAttrs, ColumnsInBoard, OrderedFamily};

/// Engine for columns ordered within a board.
pub type ColumnPositions = PositionEngine<ColumnsInBoard>;

/// Engine for cards ordered within a column.
pub type CardPositions = PositionEngine<CardsInColumn>;
