//! Cubic-lattice rotations, catalog building and shape matching.
//!
//! A cube has 24 possible orientations in 3D space (the rotation group of a cube).
//! These are the 6 ways to choose which face points up, times 4 rotations around
//! the vertical axis. The engine itself is lattice-agnostic; these helpers
//! build catalogs for the cubic lattice and match freeform cell groups
//! against any catalog.

use crate::error::CatalogError;
use crate::pieces::{Cell, PieceCatalog, PieceId, PieceSpec, CELLS_PER_PIECE, TETRACUBES};

/// All 24 rotation functions for a cube.
///
/// Organized as 6 face-up choices x 4 rotations around vertical:
/// - Rotations 0-3: +Z face up
/// - Rotations 4-7: +Y face up
/// - Rotations 8-11: -Z face up
/// - Rotations 12-15: -Y face up
/// - Rotations 16-19: +X face up
/// - Rotations 20-23: -X face up
pub const ROTATIONS: [fn(Cell) -> Cell; 24] = [
    // +Z face up (identity orientation), rotate around Z axis
    |(x, y, z)| (x, y, z),
    |(x, y, z)| (-y, x, z),
    |(x, y, z)| (-x, -y, z),
    |(x, y, z)| (y, -x, z),
    // +Y face up
    |(x, y, z)| (x, -z, y),
    |(x, y, z)| (z, x, y),
    |(x, y, z)| (-x, z, y),
    |(x, y, z)| (-z, -x, y),
    // -Z face up
    |(x, y, z)| (x, -y, -z),
    |(x, y, z)| (y, x, -z),
    |(x, y, z)| (-x, y, -z),
    |(x, y, z)| (-y, -x, -z),
    // -Y face up
    |(x, y, z)| (x, z, -y),
    |(x, y, z)| (-z, x, -y),
    |(x, y, z)| (-x, -z, -y),
    |(x, y, z)| (z, -x, -y),
    // +X face up
    |(x, y, z)| (z, y, -x),
    |(x, y, z)| (-y, z, -x),
    |(x, y, z)| (-z, -y, -x),
    |(x, y, z)| (y, -z, -x),
    // -X face up
    |(x, y, z)| (-z, y, x),
    |(x, y, z)| (-y, -z, x),
    |(x, y, z)| (z, -y, x),
    |(x, y, z)| (y, z, x),
];

/// Generates all unique orientations of a piece.
///
/// Applies all 24 rotations, and the mirrored shape's rotations when
/// `with_reflections` is set, normalizes each result, then removes
/// duplicates. Symmetric pieces have fewer than 24 orientations.
pub fn all_orientations(
    piece: &[Cell; CELLS_PER_PIECE],
    with_reflections: bool,
) -> Vec<[Cell; CELLS_PER_PIECE]> {
    let mut sources = vec![*piece];
    if with_reflections {
        sources.push((*piece).map(|(x, y, z)| (-x, y, z)));
    }

    let mut orientations: Vec<[Cell; CELLS_PER_PIECE]> = sources
        .iter()
        .flat_map(|source| {
            ROTATIONS
                .iter()
                .map(move |rotate| normalize_to_origin((*source).map(rotate)))
        })
        .collect();

    // remove duplicate orientations (symmetric pieces produce duplicates)
    orientations.sort();
    orientations.dedup();
    orientations
}

/// Translates cells so the minimum x, y, z values are all zero, then sorts.
///
/// Two cell groups that differ only by translation normalize identically.
pub(crate) fn normalize_to_origin(mut cells: [Cell; CELLS_PER_PIECE]) -> [Cell; CELLS_PER_PIECE] {
    let (min_x, min_y, min_z) = min_corner(&cells);

    for (x, y, z) in &mut cells {
        *x -= min_x;
        *y -= min_y;
        *z -= min_z;
    }

    cells.sort();
    cells
}

/// Per-axis minimum of a cell group.
fn min_corner(cells: &[Cell]) -> Cell {
    cells.iter().fold((i32::MAX, i32::MAX, i32::MAX), |acc, &(x, y, z)| {
        (acc.0.min(x), acc.1.min(y), acc.2.min(z))
    })
}

/// Builds a catalog from named canonical shapes using cubic rotations.
pub fn catalog_from_shapes(
    shapes: &[(&str, [Cell; CELLS_PER_PIECE])],
    with_reflections: bool,
) -> Result<PieceCatalog, CatalogError> {
    let specs = shapes
        .iter()
        .map(|(name, shape)| PieceSpec {
            name: (*name).to_string(),
            orientations: all_orientations(shape, with_reflections),
        })
        .collect();
    PieceCatalog::new(specs)
}

/// The eight tetracubes, rotations only.
pub fn tetracube_catalog() -> PieceCatalog {
    // TETRACUBES is a fixed table of well-formed shapes
    catalog_from_shapes(TETRACUBES, false).expect("built-in tetracube table is well formed")
}

/// Result of matching a freeform cell group to the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapeMatch {
    pub piece: PieceId,
    pub orientation: usize,
    pub anchor: Cell,
}

/// Identifies which piece and orientation a group of cells forms, if any.
///
/// The anchor is the per-axis minimum corner, matching the normalized
/// offsets stored in the catalog.
pub fn match_shape(catalog: &PieceCatalog, cells: &[Cell]) -> Option<ShapeMatch> {
    let group: [Cell; CELLS_PER_PIECE] = cells.try_into().ok()?;
    let anchor = min_corner(&group);
    let normalized = normalize_to_origin(group);

    catalog.pieces().find_map(|(piece, shape)| {
        shape
            .orientations()
            .iter()
            .position(|orientation| *orientation.offsets() == normalized)
            .map(|orientation| ShapeMatch {
                piece,
                orientation,
                anchor,
            })
    })
}
