//! Error types for malformed engine input.
//!
//! Timeouts, proven-unsolvable boards, missing hints and cancellation are
//! ordinary results and never show up here.

use thiserror::Error;

use crate::pieces::{Cell, PieceId};

/// The piece catalog handed to the engine is inconsistent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog contains no pieces")]
    Empty,
    #[error("piece {name:?} has no orientations")]
    NoOrientations { name: String },
    #[error("orientation {orientation} of piece {name:?} repeats offset {offset:?}")]
    RepeatedOffset {
        name: String,
        orientation: usize,
        offset: Cell,
    },
    #[error("piece name {0:?} appears more than once")]
    DuplicateName(String),
}

/// A container could not be built from the given cells.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerError {
    #[error("container has no cells")]
    Empty,
}

/// A placement was rejected while committing it to a board.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("unknown piece id {0}")]
    UnknownPiece(PieceId),
    #[error("piece {piece} has no orientation {orientation}")]
    UnknownOrientation { piece: PieceId, orientation: usize },
    #[error("placement cells do not match anchor {anchor:?} plus orientation offsets")]
    InconsistentCells { anchor: Cell },
    #[error("cell {0:?} lies outside the container")]
    OutsideContainer(Cell),
    #[error("cell {0:?} is already occupied")]
    Occupied(Cell),
}

/// A board already violates the inventory policy it is checked under.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("piece {0} is placed more than once under the one-of-each policy")]
    ReusedPiece(PieceId),
    #[error("pieces {first} and {second} both appear under the single-type policy")]
    MixedTypes { first: PieceId, second: PieceId },
    #[error("inventory covers {actual} pieces but the catalog has {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Top-level error returned by engine entry points.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error("background worker is no longer running")]
    WorkerGone,
}
