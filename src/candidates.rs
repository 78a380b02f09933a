//! Enumeration of currently legal placements.
//!
//! Output order is stable: catalog order, then orientation order, then
//! container cell order. Seeded searches rely on this to be reproducible.

use log::trace;
use thiserror::Error;

use crate::board::Board;
use crate::geometry::match_shape;
use crate::inventory::Inventory;
use crate::pieces::{Cell, PieceCatalog, Placement, CELLS_PER_PIECE};

/// Why a player-selected cell group cannot be placed.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("a piece covers exactly 4 cells, got {0}")]
    WrongCellCount(usize),
    #[error("the selected cells do not form a catalog piece")]
    NotACatalogShape,
    #[error("cell {0:?} lies outside the container")]
    OutsideContainer(Cell),
    #[error("cell {0:?} is already occupied")]
    Occupied(Cell),
    #[error("no copies of this piece remain")]
    PieceUnavailable,
}

#[inline]
fn translate(cell: Cell, by: Cell, sign: i32) -> Cell {
    (cell.0 + sign * by.0, cell.1 + sign * by.1, cell.2 + sign * by.2)
}

/// Every legal placement on `board` allowed by `inventory`.
pub fn candidates(catalog: &PieceCatalog, board: &Board, inventory: &Inventory) -> Vec<Placement> {
    let empty = board.empty_cells();
    let mut found = Vec::new();

    for piece in inventory.available() {
        let Some(shape) = catalog.piece(piece) else {
            continue;
        };
        for (orientation_index, orientation) in shape.orientations().iter().enumerate() {
            // the cell holding the first offset identifies each placement once
            let lead = orientation.offsets()[0];
            for &cell in &empty {
                let anchor = translate(cell, lead, -1);
                let cells = orientation.resolve(anchor);
                if cells.iter().all(|&cell| board.is_free(cell)) {
                    found.push(Placement {
                        piece,
                        orientation: orientation_index,
                        anchor,
                        cells,
                    });
                }
            }
        }
    }

    trace!("{} candidates over {} empty cells", found.len(), empty.len());
    found
}

/// Legal placements that cover `target`.
///
/// Empty when `target` is outside the container or already occupied.
pub fn covering(
    catalog: &PieceCatalog,
    board: &Board,
    inventory: &Inventory,
    target: Cell,
) -> Vec<Placement> {
    let mut found = Vec::new();
    if !board.is_free(target) {
        return found;
    }

    for piece in inventory.available() {
        let Some(shape) = catalog.piece(piece) else {
            continue;
        };
        for (orientation_index, orientation) in shape.orientations().iter().enumerate() {
            for &offset in orientation.offsets() {
                let anchor = translate(target, offset, -1);
                let cells = orientation.resolve(anchor);
                if cells.iter().all(|&cell| board.is_free(cell)) {
                    found.push(Placement {
                        piece,
                        orientation: orientation_index,
                        anchor,
                        cells,
                    });
                }
            }
        }
    }

    found
}

/// Turns a freeform group of selected cells into a legal placement.
///
/// Groups that are not a catalog shape are rejected here and never reach
/// a solver.
pub fn placement_for_cells(
    catalog: &PieceCatalog,
    board: &Board,
    inventory: &Inventory,
    cells: &[Cell],
) -> Result<Placement, Rejection> {
    if cells.len() != CELLS_PER_PIECE {
        return Err(Rejection::WrongCellCount(cells.len()));
    }
    for &cell in cells {
        if !board.container().contains(cell) {
            return Err(Rejection::OutsideContainer(cell));
        }
        if board.is_occupied(cell) {
            return Err(Rejection::Occupied(cell));
        }
    }

    let found = match_shape(catalog, cells).ok_or(Rejection::NotACatalogShape)?;
    if !inventory.allows(found.piece) {
        return Err(Rejection::PieceUnavailable);
    }
    catalog
        .place(found.piece, found.orientation, found.anchor)
        .map_err(|_| Rejection::NotACatalogShape)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rustc_hash::FxHashSet;

    use super::*;
    use crate::board::Container;
    use crate::geometry::tetracube_catalog;
    use crate::inventory::InventoryPolicy;

    fn line_board(length: i32) -> Board {
        Board::new(Arc::new(Container::cuboid(length, 1, 1).unwrap()))
    }

    #[test]
    fn test_candidates_in_a_line() {
        let catalog = tetracube_catalog();
        let board = line_board(6);
        let inventory = Inventory::full(InventoryPolicy::Unlimited, &catalog);

        let found = candidates(&catalog, &board, &inventory);
        // only the bar fits, at x = 0, 1, 2
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|placement| placement.piece == 0));
        let anchors: Vec<Cell> = found.iter().map(|placement| placement.anchor).collect();
        assert_eq!(anchors, vec![(0, 0, 0), (1, 0, 0), (2, 0, 0)]);
    }

    #[test]
    fn test_candidates_are_legal_and_distinct() {
        let catalog = tetracube_catalog();
        let container = Arc::new(Container::cuboid(3, 3, 2).unwrap());
        let mut board = Board::new(container);
        let elbow = placement_for_cells(
            &catalog,
            &board,
            &Inventory::full(InventoryPolicy::OneOfEach, &catalog),
            &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (2, 1, 0)],
        )
        .unwrap();
        board.place(&catalog, elbow).unwrap();
        let inventory = Inventory::for_board(InventoryPolicy::OneOfEach, &catalog, &board).unwrap();

        let found = candidates(&catalog, &board, &inventory);
        assert!(!found.is_empty());
        assert!(found.iter().all(|placement| placement.piece != elbow.piece));
        assert!(found
            .iter()
            .all(|placement| placement.cells.iter().all(|&cell| board.is_free(cell))));
        // one piece never repeats a cell set
        let per_piece: FxHashSet<(usize, [Cell; 4])> =
            found.iter().map(|placement| (placement.piece, placement.cells)).collect();
        assert_eq!(per_piece.len(), found.len());
    }

    #[test]
    fn test_covering_contains_target() {
        let catalog = tetracube_catalog();
        let board = line_board(8);
        let inventory = Inventory::full(InventoryPolicy::Unlimited, &catalog);

        let found = covering(&catalog, &board, &inventory, (5, 0, 0));
        let anchors: Vec<Cell> = found.iter().map(|placement| placement.anchor).collect();
        assert_eq!(anchors.len(), 3);
        assert!(found.iter().all(|placement| placement.covers((5, 0, 0))));
        assert!(covering(&catalog, &board, &inventory, (9, 0, 0)).is_empty());
    }

    #[test]
    fn test_non_catalog_group_is_rejected() {
        let catalog = tetracube_catalog();
        let container = Container::new(vec![
            (0, 0, 0),
            (1, 0, 0),
            (2, 0, 0),
            (3, 0, 0),
            (0, 0, 5),
            (1, 0, 5),
            (0, 1, 5),
            (1, 1, 5),
        ])
        .unwrap();
        let board = Board::new(Arc::new(container));
        let inventory = Inventory::full(InventoryPolicy::OneOfEach, &catalog);

        assert_eq!(
            placement_for_cells(&catalog, &board, &inventory, &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (0, 0, 5)]),
            Err(Rejection::NotACatalogShape)
        );
        assert_eq!(
            placement_for_cells(&catalog, &board, &inventory, &[(0, 0, 0), (1, 0, 0)]),
            Err(Rejection::WrongCellCount(2))
        );
        assert_eq!(
            placement_for_cells(&catalog, &board, &inventory, &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (4, 0, 0)]),
            Err(Rejection::OutsideContainer((4, 0, 0)))
        );
        let bar = placement_for_cells(
            &catalog,
            &board,
            &inventory,
            &[(3, 0, 0), (2, 0, 0), (1, 0, 0), (0, 0, 0)],
        )
        .unwrap();
        assert_eq!(catalog.piece(bar.piece).unwrap().name(), "I");

        let spent = inventory.after(bar.piece);
        let mut other = Board::new(board.container().clone());
        other.place(&catalog, bar).unwrap();
        assert_eq!(
            placement_for_cells(&catalog, &other, &spent, &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (3, 0, 0)]),
            Err(Rejection::Occupied((0, 0, 0)))
        );
    }
}
