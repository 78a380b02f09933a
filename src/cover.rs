//! Maps a board and inventory onto an exact-cover instance.
//!
//! Primary columns are the empty cells, secondary columns are the piece
//! types that may be used at most once, and every legal candidate becomes
//! one row.

use log::debug;
use rustc_hash::FxHashMap;

use crate::board::Board;
use crate::candidates::candidates;
use crate::control::Ticker;
use crate::dlx::{Matrix, Stop};
use crate::inventory::{Inventory, Remaining};
use crate::pieces::{PieceCatalog, PieceId, Placement, CELLS_PER_PIECE};

/// Outcome of an exact-cover search over the empty part of a board.
#[derive(Clone, Debug)]
pub struct CoverReport {
    /// Placements completing the board in the first cover found.
    pub completion: Option<Vec<Placement>>,
    pub count: usize,
    pub stop: Stop,
    /// Number of legal candidates the instance was built from.
    pub candidates: usize,
}

impl CoverReport {
    fn finished(completion: Option<Vec<Placement>>, count: usize) -> Self {
        Self {
            completion,
            count,
            stop: Stop::Exhausted,
            candidates: 0,
        }
    }
}

/// Counts covers of the empty cells up to `limit`.
///
/// An exclusive inventory is split into one instance per piece type, all
/// sharing the ticker's budget.
pub fn find_covers(
    catalog: &PieceCatalog,
    board: &Board,
    inventory: &Inventory,
    limit: usize,
    ticker: &mut Ticker<'_>,
    seed: Option<u64>,
) -> CoverReport {
    if board.is_complete() {
        return CoverReport::finished(Some(Vec::new()), 1);
    }
    // every placement covers exactly four cells
    if board.empty_count() % CELLS_PER_PIECE != 0 {
        debug!("parity: {} empty cells cannot be covered", board.empty_count());
        return CoverReport::finished(None, 0);
    }

    if !inventory.is_exclusive() {
        return search_instance(catalog, board, inventory, limit, ticker, seed);
    }

    let mut merged = CoverReport::finished(None, 0);
    for piece in inventory.available() {
        let restricted = inventory.restricted_to(piece);
        let report = search_instance(
            catalog,
            board,
            &restricted,
            limit - merged.count,
            ticker,
            seed,
        );

        merged.count += report.count;
        merged.candidates += report.candidates;
        if merged.completion.is_none() {
            merged.completion = report.completion;
        }
        if let Stop::Interrupted(_) = report.stop {
            merged.stop = report.stop;
            return merged;
        }
        if merged.count >= limit {
            merged.stop = Stop::LimitReached;
            return merged;
        }
    }
    merged
}

fn search_instance(
    catalog: &PieceCatalog,
    board: &Board,
    inventory: &Inventory,
    limit: usize,
    ticker: &mut Ticker<'_>,
    seed: Option<u64>,
) -> CoverReport {
    let rows = candidates(catalog, board, inventory);

    let cell_columns: FxHashMap<_, usize> = board
        .empty_cells()
        .into_iter()
        .enumerate()
        .map(|(column, cell)| (cell, column))
        .collect();
    let primary = cell_columns.len();
    let piece_columns: FxHashMap<PieceId, usize> = inventory
        .counts()
        .iter()
        .enumerate()
        .filter(|(_, &count)| count == Remaining::Once)
        .enumerate()
        .map(|(offset, (piece, _))| (piece, primary + offset))
        .collect();

    let mut matrix = Matrix::new(primary, piece_columns.len());
    if let Some(seed) = seed {
        matrix = matrix.shuffled(seed);
    }
    let mut columns = Vec::with_capacity(CELLS_PER_PIECE + 1);
    for placement in &rows {
        columns.clear();
        columns.extend(placement.cells.iter().filter_map(|cell| cell_columns.get(cell)));
        columns.extend(piece_columns.get(&placement.piece));
        matrix.add_row(&columns);
    }
    debug!(
        "exact cover instance: {} rows, {} primary and {} secondary columns",
        matrix.rows(),
        primary,
        piece_columns.len()
    );

    let report = matrix.search(limit, ticker);
    CoverReport {
        completion: report
            .first
            .map(|chosen| chosen.into_iter().map(|row| rows[row]).collect()),
        count: report.count,
        stop: report.stop,
        candidates: rows.len(),
    }
}
