//! Unguided full-board search.
//!
//! Backtracking with an explicit stack over a private working copy of the
//! board. Every frame holds the candidates for the most constrained empty
//! cell; a frame with no options is a dead end and is popped on the next
//! step, which undoes the parent's placement.

use std::time::Duration;

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::Board;
use crate::candidates::candidates;
use crate::config::{AutoSolveConfig, ShuffleMode};
use crate::control::{Budget, CancelToken, Interrupt};
use crate::error::EngineError;
use crate::inventory::{Inventory, Remaining};
use crate::pieces::{PieceCatalog, PieceId, Placement, CELLS_PER_PIECE};

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    SolutionFound,
    /// The whole tree of an attempt was visited; no completion exists.
    Exhausted,
    TimedOut,
    Cancelled,
}

impl From<Interrupt> for StopReason {
    fn from(interrupt: Interrupt) -> Self {
        match interrupt {
            Interrupt::TimedOut => StopReason::TimedOut,
            Interrupt::Cancelled => StopReason::Cancelled,
        }
    }
}

/// Periodic snapshot of a running search.
#[derive(Clone, Debug, PartialEq)]
pub struct Progress {
    /// Placements on the working board, starting ones included.
    pub placed: usize,
    pub best_placed: usize,
    pub nodes: u64,
    pub elapsed: Duration,
    pub restart_count: usize,
    /// Current placements, starting ones first.
    pub stack: Vec<Placement>,
}

/// Final statistics of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub success: bool,
    pub stop_reason: StopReason,
    pub nodes: u64,
    pub elapsed: Duration,
    pub restart_count: usize,
    pub best_placed: usize,
    /// Full solution with the starting placements first.
    pub solution: Option<Vec<Placement>>,
}

/// A starting-board candidate with its cells as dense container indices.
struct Candidate {
    placement: Placement,
    cells: [usize; CELLS_PER_PIECE],
}

/// Candidates plus, for each container cell, the candidates covering it.
struct CandidateIndex {
    candidates: Vec<Candidate>,
    by_cell: Vec<Vec<usize>>,
}

impl CandidateIndex {
    fn build(catalog: &PieceCatalog, board: &Board, inventory: &Inventory) -> Self {
        let container = board.container();
        let mut by_cell = vec![Vec::new(); container.len()];
        let mut indexed = Vec::new();

        for placement in candidates(catalog, board, inventory) {
            let mut cells = [0; CELLS_PER_PIECE];
            let resolved = placement
                .cells
                .iter()
                .zip(cells.iter_mut())
                .all(|(&cell, slot)| match container.index_of(cell) {
                    Some(index) => {
                        *slot = index;
                        true
                    }
                    None => false,
                });
            if !resolved {
                continue;
            }
            for &cell in &cells {
                by_cell[cell].push(indexed.len());
            }
            indexed.push(Candidate { placement, cells });
        }

        Self {
            candidates: indexed,
            by_cell,
        }
    }
}

/// Mutable occupancy and inventory of the working copy.
struct Working {
    occupied: Vec<bool>,
    empty: usize,
    remaining: Vec<Remaining>,
    exclusive: bool,
    locked: Option<PieceId>,
    /// Path length at which `locked` was set.
    lock_depth: usize,
    path: Vec<usize>,
}

impl Working {
    fn new(board: &Board, inventory: &Inventory) -> Self {
        Self {
            occupied: board.occupancy().to_vec(),
            empty: board.empty_count(),
            remaining: inventory.counts().to_vec(),
            exclusive: inventory.is_exclusive(),
            locked: None,
            lock_depth: 0,
            path: Vec::new(),
        }
    }

    #[inline]
    fn fits(&self, candidate: &Candidate) -> bool {
        let piece = candidate.placement.piece;
        self.remaining[piece].is_available()
            && self.locked.map_or(true, |locked| locked == piece)
            && candidate.cells.iter().all(|&cell| !self.occupied[cell])
    }

    fn place(&mut self, index: usize, candidate: &Candidate) {
        for &cell in &candidate.cells {
            self.occupied[cell] = true;
        }
        self.empty -= CELLS_PER_PIECE;

        let piece = candidate.placement.piece;
        if self.remaining[piece] == Remaining::Once {
            self.remaining[piece] = Remaining::Zero;
        }
        if self.exclusive && self.locked.is_none() {
            self.locked = Some(piece);
            self.lock_depth = self.path.len();
        }
        self.path.push(index);
    }

    fn unplace(&mut self, candidate: &Candidate) {
        self.path.pop();
        for &cell in &candidate.cells {
            self.occupied[cell] = false;
        }
        self.empty += CELLS_PER_PIECE;

        // a placed piece left at zero was a single copy
        let piece = candidate.placement.piece;
        if self.remaining[piece] == Remaining::Zero {
            self.remaining[piece] = Remaining::Once;
        }
        if self.locked.is_some() && self.lock_depth == self.path.len() {
            self.locked = None;
        }
    }
}

/// One level of the search stack.
struct Frame {
    options: Vec<usize>,
    next: usize,
    /// The option currently applied to the working copy.
    placed: Option<usize>,
}

pub struct AutoSolver<'c> {
    catalog: &'c PieceCatalog,
    config: AutoSolveConfig,
}

impl<'c> AutoSolver<'c> {
    pub fn new(catalog: &'c PieceCatalog, config: AutoSolveConfig) -> Self {
        Self { catalog, config }
    }

    /// Searches for a full solution extending `board`.
    ///
    /// `progress` receives a snapshot every `progress_interval` nodes. The
    /// caller's board is never modified.
    pub fn run<R: Rng + ?Sized>(
        &self,
        board: &Board,
        inventory: &Inventory,
        rng: &mut R,
        cancel: &CancelToken,
        mut progress: impl FnMut(Progress),
    ) -> Result<Summary, EngineError> {
        board.check_catalog(self.catalog)?;
        inventory.check_catalog(self.catalog)?;

        let budget = Budget::new(self.config.timeout, cancel.clone());
        let mut ticker = budget.ticker();
        let index = CandidateIndex::build(self.catalog, board, inventory);
        let mut work = Working::new(board, inventory);
        let start = board.placements();
        let snapshot = |work: &Working| -> Vec<Placement> {
            start
                .iter()
                .copied()
                .chain(work.path.iter().map(|&i| index.candidates[i].placement))
                .collect()
        };

        let mut best = 0;
        let mut restarts = 0;
        let mut attempt_nodes = 0;
        debug!(
            "auto-solve: {} empty cells, {} candidates",
            work.empty,
            index.candidates.len()
        );

        let stop = if work.empty % CELLS_PER_PIECE != 0 {
            StopReason::Exhausted
        } else if work.empty == 0 {
            StopReason::SolutionFound
        } else {
            let mut stack = vec![self.frame(&index, &work, rng)];
            loop {
                if let Err(interrupt) = ticker.tick() {
                    break StopReason::from(interrupt);
                }
                attempt_nodes += 1;

                if self.config.progress_interval > 0
                    && ticker.nodes() % self.config.progress_interval == 0
                {
                    progress(Progress {
                        placed: start.len() + work.path.len(),
                        best_placed: start.len() + best,
                        nodes: ticker.nodes(),
                        elapsed: budget.elapsed(),
                        restart_count: restarts,
                        stack: snapshot(&work),
                    });
                }

                if self.should_restart(attempt_nodes, restarts) {
                    while let Some(frame) = stack.pop() {
                        if let Some(applied) = frame.placed {
                            work.unplace(&index.candidates[applied]);
                        }
                    }
                    restarts += 1;
                    attempt_nodes = 0;
                    debug!("restart {restarts} after {} nodes", ticker.nodes());
                    stack.push(self.frame(&index, &work, rng));
                    continue;
                }

                let Some(frame) = stack.last_mut() else {
                    break StopReason::Exhausted;
                };
                if let Some(previous) = frame.placed.take() {
                    work.unplace(&index.candidates[previous]);
                }
                let Some(&choice) = frame.options.get(frame.next) else {
                    stack.pop();
                    continue;
                };
                frame.next += 1;
                frame.placed = Some(choice);
                work.place(choice, &index.candidates[choice]);
                best = best.max(work.path.len());

                if work.empty == 0 {
                    break StopReason::SolutionFound;
                }
                let child = self.frame(&index, &work, rng);
                stack.push(child);
            }
        };

        let success = stop == StopReason::SolutionFound;
        let summary = Summary {
            success,
            stop_reason: stop,
            nodes: ticker.nodes(),
            elapsed: budget.elapsed(),
            restart_count: restarts,
            best_placed: start.len() + best,
            solution: success.then(|| snapshot(&work)),
        };
        info!(
            "auto-solve {:?} after {} nodes, {} restarts, {:?}",
            summary.stop_reason, summary.nodes, summary.restart_count, summary.elapsed
        );
        Ok(summary)
    }

    fn should_restart(&self, attempt_nodes: u64, restarts: usize) -> bool {
        self.config.shuffle == ShuffleMode::Random
            && self
                .config
                .restart_nodes
                .is_some_and(|limit| attempt_nodes >= limit)
            && self
                .config
                .max_restarts
                .map_or(true, |limit| restarts < limit)
    }

    /// Options for the empty cell with the fewest fitting candidates.
    fn frame<R: Rng + ?Sized>(&self, index: &CandidateIndex, work: &Working, rng: &mut R) -> Frame {
        let mut best: Option<(usize, usize)> = None;
        for (cell, &occupied) in work.occupied.iter().enumerate() {
            if occupied {
                continue;
            }
            let fitting = index.by_cell[cell]
                .iter()
                .filter(|&&candidate| work.fits(&index.candidates[candidate]))
                .count();
            if best.map_or(true, |(_, count)| fitting < count) {
                best = Some((cell, fitting));
                if fitting == 0 {
                    break;
                }
            }
        }

        let mut options: Vec<usize> = match best {
            Some((cell, count)) if count > 0 => index.by_cell[cell]
                .iter()
                .copied()
                .filter(|&candidate| work.fits(&index.candidates[candidate]))
                .collect(),
            _ => Vec::new(),
        };
        if self.config.shuffle == ShuffleMode::Random && work.empty >= self.config.tail_size {
            options.shuffle(rng);
        }

        Frame {
            options,
            next: 0,
            placed: None,
        }
    }
}
