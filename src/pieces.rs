//! Lattice cells, piece catalog and placements.
//!
//! Every piece covers exactly four lattice cells. A catalog is loaded once
//! and treated as read-only; orientations are stored normalized so the
//! minimum offset on each axis is zero.

use rustc_hash::FxHashSet;

use crate::error::{BoardError, CatalogError};
use crate::geometry::normalize_to_origin;

/// An `(i, j, k)` lattice site.
pub type Cell = (i32, i32, i32);

/// Dense index of a piece type in its catalog.
pub type PieceId = usize;

/// Number of cells covered by every piece.
pub const CELLS_PER_PIECE: usize = 4;

/// One symmetry-reduced variant of a piece, as offsets from its anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Orientation {
    offsets: [Cell; CELLS_PER_PIECE],
}

impl Orientation {
    #[inline]
    pub fn offsets(&self) -> &[Cell; CELLS_PER_PIECE] {
        &self.offsets
    }

    /// Resolves the orientation at `anchor` into absolute cells.
    #[inline]
    pub fn resolve(&self, anchor: Cell) -> [Cell; CELLS_PER_PIECE] {
        self.offsets
            .map(|(di, dj, dk)| (anchor.0 + di, anchor.1 + dj, anchor.2 + dk))
    }
}

/// A piece type: a name plus its distinct orientations.
#[derive(Clone, Debug)]
pub struct Piece {
    name: String,
    orientations: Vec<Orientation>,
}

impl Piece {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn orientations(&self) -> &[Orientation] {
        &self.orientations
    }
}

/// Raw catalog input as supplied by the geometry provider.
#[derive(Clone, Debug)]
pub struct PieceSpec {
    pub name: String,
    pub orientations: Vec<[Cell; CELLS_PER_PIECE]>,
}

/// The read-only set of piece types available to a puzzle.
#[derive(Clone, Debug)]
pub struct PieceCatalog {
    pieces: Vec<Piece>,
}

impl PieceCatalog {
    /// Validates the supplied pieces and removes duplicate orientations.
    ///
    /// Two orientations are duplicates when they coincide after translation.
    pub fn new(specs: Vec<PieceSpec>) -> Result<Self, CatalogError> {
        if specs.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut names = FxHashSet::default();
        let mut pieces = Vec::with_capacity(specs.len());
        for spec in specs {
            if !names.insert(spec.name.clone()) {
                return Err(CatalogError::DuplicateName(spec.name));
            }
            if spec.orientations.is_empty() {
                return Err(CatalogError::NoOrientations { name: spec.name });
            }

            let mut orientations = Vec::with_capacity(spec.orientations.len());
            for (index, offsets) in spec.orientations.iter().enumerate() {
                let mut seen = FxHashSet::default();
                if let Some(&offset) = offsets.iter().find(|&&offset| !seen.insert(offset)) {
                    return Err(CatalogError::RepeatedOffset {
                        name: spec.name,
                        orientation: index,
                        offset,
                    });
                }
                orientations.push(Orientation {
                    offsets: normalize_to_origin(*offsets),
                });
            }

            // keep first occurrence so orientation indices stay stable
            let mut unique = FxHashSet::default();
            orientations.retain(|orientation| unique.insert(*orientation));

            pieces.push(Piece {
                name: spec.name,
                orientations,
            });
        }

        Ok(Self { pieces })
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id)
    }

    pub fn pieces(&self) -> impl Iterator<Item = (PieceId, &Piece)> {
        self.pieces.iter().enumerate()
    }

    /// Looks up a piece by name.
    pub fn find(&self, name: &str) -> Option<PieceId> {
        self.pieces.iter().position(|piece| piece.name == name)
    }

    /// Builds the placement of `piece` in `orientation` at `anchor`.
    pub fn place(
        &self,
        piece: PieceId,
        orientation: usize,
        anchor: Cell,
    ) -> Result<Placement, BoardError> {
        let resolved = self
            .pieces
            .get(piece)
            .ok_or(BoardError::UnknownPiece(piece))?
            .orientations
            .get(orientation)
            .ok_or(BoardError::UnknownOrientation { piece, orientation })?
            .resolve(anchor);

        Ok(Placement {
            piece,
            orientation,
            anchor,
            cells: resolved,
        })
    }

    /// Checks that a placement received from a collaborator agrees with
    /// this catalog's geometry.
    pub fn validate(&self, placement: &Placement) -> Result<(), BoardError> {
        let expected = self.place(placement.piece, placement.orientation, placement.anchor)?;
        if expected.cells != placement.cells {
            return Err(BoardError::InconsistentCells {
                anchor: placement.anchor,
            });
        }
        Ok(())
    }
}

/// A piece placed at concrete lattice cells.
///
/// Uses a fixed-size array to avoid heap allocation in the search loops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Placement {
    pub piece: PieceId,
    pub orientation: usize,
    pub anchor: Cell,
    pub cells: [Cell; CELLS_PER_PIECE],
}

impl Placement {
    #[inline]
    pub fn covers(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }
}

/// The eight tetracubes on the cubic lattice, chiral screws kept apart.
///
/// Coordinates are normalized so the minimum coordinates are at the origin.
pub const TETRACUBES: &[(&str, [Cell; CELLS_PER_PIECE])] = &[
    // straight bar
    ("I", [(0, 0, 0), (1, 0, 0), (2, 0, 0), (3, 0, 0)]),
    // 2x2 square
    ("O", [(0, 0, 0), (1, 0, 0), (0, 1, 0), (1, 1, 0)]),
    ("L", [(0, 0, 0), (1, 0, 0), (2, 0, 0), (0, 1, 0)]),
    ("T", [(0, 0, 0), (1, 0, 0), (2, 0, 0), (1, 1, 0)]),
    ("S", [(0, 0, 0), (1, 0, 0), (1, 1, 0), (2, 1, 0)]),
    // 3d corner pieces
    ("A", [(0, 0, 0), (1, 0, 0), (0, 1, 0), (1, 0, 1)]),
    ("B", [(0, 0, 0), (1, 0, 0), (0, 1, 0), (0, 0, 1)]),
    ("C", [(0, 0, 0), (1, 0, 0), (0, 1, 0), (0, 1, 1)]),
];
