//! Container and board representation.
//!
//! A container is an immutable set of lattice cells, interned into dense
//! indices so hot loops can use flat occupancy vectors. A board is a
//! container plus the placements committed so far, in commit order.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{BoardError, ContainerError};
use crate::pieces::{Cell, PieceCatalog, Placement, CELLS_PER_PIECE};

/// The fixed boundary of a puzzle.
#[derive(Clone, Debug)]
pub struct Container {
    /// Cells in sorted order; a cell's position here is its dense index.
    cells: Vec<Cell>,
    index: FxHashMap<Cell, usize>,
}

impl Container {
    /// Builds a container from arbitrary cells, ignoring duplicates.
    pub fn new(cells: impl IntoIterator<Item = Cell>) -> Result<Self, ContainerError> {
        let mut cells: Vec<Cell> = cells.into_iter().collect();
        cells.sort_unstable();
        cells.dedup();
        if cells.is_empty() {
            return Err(ContainerError::Empty);
        }

        let index = cells
            .iter()
            .enumerate()
            .map(|(position, &cell)| (cell, position))
            .collect();
        Ok(Self { cells, index })
    }

    /// An `x` by `y` by `z` box with its minimum corner at the origin.
    pub fn cuboid(x: i32, y: i32, z: i32) -> Result<Self, ContainerError> {
        Self::new(
            (0..x).flat_map(|i| (0..y).flat_map(move |j| (0..z).map(move |k| (i, j, k)))),
        )
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        self.index.contains_key(&cell)
    }

    #[inline]
    pub fn index_of(&self, cell: Cell) -> Option<usize> {
        self.index.get(&cell).copied()
    }

    /// Minimum and maximum corner of the bounding box.
    pub fn bounds(&self) -> (Cell, Cell) {
        self.cells.iter().fold(
            (self.cells[0], self.cells[0]),
            |(low, high), &(x, y, z)| {
                (
                    (low.0.min(x), low.1.min(y), low.2.min(z)),
                    (high.0.max(x), high.1.max(y), high.2.max(z)),
                )
            },
        )
    }
}

/// A snapshot of committed, non-overlapping placements.
///
/// Only the caller mutates a board, by inserting placements; engine entry
/// points take `&Board` and work on private copies.
#[derive(Clone, Debug)]
pub struct Board {
    container: Arc<Container>,
    placements: Vec<Placement>,
    occupied: Vec<bool>,
    empty_count: usize,
}

impl Board {
    pub fn new(container: Arc<Container>) -> Self {
        let empty_count = container.len();
        Self {
            occupied: vec![false; empty_count],
            container,
            placements: Vec::new(),
            empty_count,
        }
    }

    /// Rebuilds a board from a list of committed placements.
    pub fn with_placements(
        container: Arc<Container>,
        catalog: &PieceCatalog,
        placements: impl IntoIterator<Item = Placement>,
    ) -> Result<Self, BoardError> {
        let mut board = Self::new(container);
        for placement in placements {
            board.place(catalog, placement)?;
        }
        Ok(board)
    }

    /// Commits a placement after checking geometry, bounds and overlap.
    pub fn place(&mut self, catalog: &PieceCatalog, placement: Placement) -> Result<(), BoardError> {
        catalog.validate(&placement)?;
        let indices = self.free_indices(&placement)?;
        for index in indices {
            self.occupied[index] = true;
        }
        self.empty_count -= indices.len();
        self.placements.push(placement);
        Ok(())
    }

    /// Returns a copy of this board with one more placement.
    pub fn with(&self, catalog: &PieceCatalog, placement: Placement) -> Result<Self, BoardError> {
        let mut next = self.clone();
        next.place(catalog, placement)?;
        Ok(next)
    }

    /// Container indices of the cells of `placement`, all of them free.
    fn free_indices(&self, placement: &Placement) -> Result<[usize; CELLS_PER_PIECE], BoardError> {
        let mut indices = [0; CELLS_PER_PIECE];
        for (slot, &cell) in indices.iter_mut().zip(&placement.cells) {
            let index = self
                .container
                .index_of(cell)
                .ok_or(BoardError::OutsideContainer(cell))?;
            if self.occupied[index] {
                return Err(BoardError::Occupied(cell));
            }
            *slot = index;
        }
        Ok(indices)
    }

    /// Fails when a placement does not belong to `catalog`.
    pub fn check_catalog(&self, catalog: &PieceCatalog) -> Result<(), BoardError> {
        self.placements
            .iter()
            .try_for_each(|placement| catalog.validate(placement))
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub(crate) fn occupancy(&self) -> &[bool] {
        &self.occupied
    }

    /// True when `cell` is inside the container and not yet covered.
    #[inline]
    pub fn is_free(&self, cell: Cell) -> bool {
        self.container
            .index_of(cell)
            .is_some_and(|index| !self.occupied[index])
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.container
            .index_of(cell)
            .is_some_and(|index| self.occupied[index])
    }

    /// Empty cells in container order.
    pub fn empty_cells(&self) -> Vec<Cell> {
        self.container
            .cells()
            .iter()
            .zip(&self.occupied)
            .filter(|(_, &occupied)| !occupied)
            .map(|(&cell, _)| cell)
            .collect()
    }

    pub fn empty_count(&self) -> usize {
        self.empty_count
    }

    pub fn is_complete(&self) -> bool {
        self.empty_count == 0
    }
}

/// Display character for the placement with 1-based commit number `number`.
fn placement_char(number: usize) -> char {
    const SYMBOLS: &[u8] = b"123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    SYMBOLS
        .get(number - 1)
        .map_or('#', |&symbol| char::from(symbol))
}

/// Formats a board as a human-readable string.
///
/// Displays z-slices of the bounding box side by side. Placements are
/// numbered in commit order, empty container cells show as '.', cells
/// outside the container as '-'.
pub fn format_board(board: &Board) -> String {
    let container = board.container();
    let mut owner: FxHashMap<Cell, char> = FxHashMap::default();
    for (number, placement) in board.placements().iter().enumerate() {
        for &cell in &placement.cells {
            owner.insert(cell, placement_char(number + 1));
        }
    }

    let ((min_x, min_y, min_z), (max_x, max_y, max_z)) = container.bounds();
    let width = (max_x - min_x + 1) as usize;

    // header: z=min_z, ..., z=max_z
    let header: Vec<String> = (min_z..=max_z)
        .map(|z| format!("{:<width$}", format!("z={z}")))
        .collect();
    let mut output = header.join("  ").trim_end().to_string();
    output.push('\n');

    // rows from top (max y) to bottom
    for y in (min_y..=max_y).rev() {
        let slices: Vec<String> = (min_z..=max_z)
            .map(|z| {
                (min_x..=max_x)
                    .map(|x| match owner.get(&(x, y, z)) {
                        Some(&symbol) => symbol,
                        None if container.contains((x, y, z)) => '.',
                        None => '-',
                    })
                    .collect()
            })
            .collect();
        output.push_str(&slices.join("  "));
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{match_shape, tetracube_catalog};

    fn placement_of(catalog: &PieceCatalog, cells: &[Cell]) -> Placement {
        let found = match_shape(catalog, cells).unwrap();
        catalog.place(found.piece, found.orientation, found.anchor).unwrap()
    }

    #[test]
    fn test_container_deduplicates_and_indexes() {
        let container = Container::new(vec![(1, 0, 0), (0, 0, 0), (1, 0, 0)]).unwrap();
        assert_eq!(container.len(), 2);
        assert_eq!(container.index_of((0, 0, 0)), Some(0));
        assert_eq!(container.index_of((1, 0, 0)), Some(1));
        assert_eq!(container.index_of((2, 0, 0)), None);
        assert_eq!(Container::new(vec![]).unwrap_err(), ContainerError::Empty);
        assert_eq!(Container::cuboid(2, 3, 4).unwrap().len(), 24);
    }

    #[test]
    fn test_place_tracks_empty_cells() {
        let catalog = tetracube_catalog();
        let container = Arc::new(Container::cuboid(4, 2, 1).unwrap());
        let mut board = Board::new(container);
        let bar = placement_of(&catalog, &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (3, 0, 0)]);

        board.place(&catalog, bar).unwrap();
        assert_eq!(board.empty_count(), 4);
        assert_eq!(board.empty_cells(), vec![(0, 1, 0), (1, 1, 0), (2, 1, 0), (3, 1, 0)]);
        assert!(board.is_occupied((2, 0, 0)));
        assert!(board.is_free((2, 1, 0)));
        assert!(!board.is_free((9, 9, 9)));
    }

    #[test]
    fn test_place_rejects_overlap_and_out_of_bounds() {
        let catalog = tetracube_catalog();
        let container = Arc::new(Container::cuboid(4, 2, 1).unwrap());
        let mut board = Board::new(container);
        let bar = placement_of(&catalog, &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (3, 0, 0)]);
        board.place(&catalog, bar).unwrap();

        assert_eq!(board.place(&catalog, bar), Err(BoardError::Occupied((0, 0, 0))));
        let outside = placement_of(&catalog, &[(1, 1, 0), (2, 1, 0), (3, 1, 0), (4, 1, 0)]);
        assert_eq!(
            board.place(&catalog, outside),
            Err(BoardError::OutsideContainer((4, 1, 0)))
        );
        assert_eq!(board.placements().len(), 1);
        assert_eq!(board.empty_count(), 4);
    }

    #[test]
    fn test_rejected_placement_leaves_occupancy_untouched() {
        let catalog = tetracube_catalog();
        let mut board = Board::new(Arc::new(Container::cuboid(4, 2, 1).unwrap()));
        let hanging = placement_of(&catalog, &[(2, 0, 0), (3, 0, 0), (4, 0, 0), (5, 0, 0)]);

        assert_eq!(
            board.place(&catalog, hanging),
            Err(BoardError::OutsideContainer((4, 0, 0)))
        );
        assert!(board.is_free((2, 0, 0)));
        assert!(board.is_free((3, 0, 0)));
        assert_eq!(board.empty_count(), 8);

        let square = placement_of(&catalog, &[(2, 0, 0), (3, 0, 0), (2, 1, 0), (3, 1, 0)]);
        board.place(&catalog, square).unwrap();
        assert_eq!(board.empty_count(), board.empty_cells().len());
        assert_eq!(board.empty_count(), 4);
    }

    #[test]
    fn test_format_board_snapshot() {
        let catalog = tetracube_catalog();
        let container = Arc::new(Container::cuboid(4, 2, 2).unwrap());
        let board = Board::with_placements(
            container,
            &catalog,
            vec![
                placement_of(&catalog, &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (3, 0, 0)]),
                placement_of(&catalog, &[(0, 0, 1), (1, 0, 1), (0, 1, 1), (1, 1, 1)]),
            ],
        )
        .unwrap();

        insta::assert_snapshot!(format_board(&board), @r"
        z=0   z=1
        ....  22..
        1111  22..
        ");
    }
}
