//! Solvability oracle.
//!
//! Answers whether the empty part of a board can still be covered under an
//! inventory. Only an exhaustive search may answer [`Verdict::Unsolvable`];
//! running out of time yields [`Verdict::Unknown`], which callers treat as
//! "allow, but not guaranteed".

use std::fmt;
use std::time::Duration;

use log::debug;
use rustc_hash::FxHashSet;

use crate::board::Board;
use crate::candidates::candidates;
use crate::config::OracleConfig;
use crate::control::{Budget, CancelToken, Interrupt, Outcome};
use crate::cover::find_covers;
use crate::dlx::Stop;
use crate::error::EngineError;
use crate::inventory::{Inventory, InventoryPolicy};
use crate::pieces::{PieceCatalog, Placement, CELLS_PER_PIECE};

/// Number of solutions found, possibly truncated at the enumeration cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolutionCount {
    Exact(usize),
    AtLeast(usize),
}

impl fmt::Display for SolutionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionCount::Exact(count) => write!(f, "{count}"),
            SolutionCount::AtLeast(count) => write!(f, "{count}+"),
        }
    }
}

/// Classified answer of a solvability check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// At least one completion exists; `solutions` is absent for
    /// existence-only checks.
    Solvable { solutions: Option<SolutionCount> },
    /// The whole search space was exhausted without a completion.
    Unsolvable,
    /// The budget ran out before either proof was found.
    Unknown,
}

impl Verdict {
    /// Only a proof of unsolvability may justify rejecting a move.
    pub fn blocks_move(&self) -> bool {
        matches!(self, Verdict::Unsolvable)
    }

    pub fn is_solvable(&self) -> bool {
        matches!(self, Verdict::Solvable { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Solvable { .. } => "solvable",
            Verdict::Unsolvable => "unsolvable",
            Verdict::Unknown => "unknown",
        }
    }
}

/// Everything a check reports back to the session layer.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckReport {
    pub verdict: Verdict,
    pub empty_cell_count: usize,
    pub elapsed: Duration,
    pub valid_next_moves: usize,
    /// log10 upper bound on the number of ordered move sequences left.
    pub estimated_search_space: f64,
    pub timed_out: bool,
    pub threshold_skipped: bool,
    pub witness_reused: bool,
}

impl CheckReport {
    pub fn compute_time_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

/// A full solution of the container, cached to answer later checks cheaply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness {
    policy: InventoryPolicy,
    placements: Vec<Placement>,
}

impl Witness {
    pub fn new(policy: InventoryPolicy, placements: Vec<Placement>) -> Self {
        Self { policy, placements }
    }

    pub fn policy(&self) -> InventoryPolicy {
        self.policy
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// The witness placements still missing from `board`.
    ///
    /// Any board whose placements are a subset of the witness qualifies,
    /// including one that lost a placement since the witness was found:
    /// the missing placements are exactly the ones that refill it.
    pub fn remainder(&self, board: &Board, inventory: &Inventory) -> Option<Vec<Placement>> {
        if self.policy != inventory.policy() {
            return None;
        }
        let own: FxHashSet<&Placement> = self.placements.iter().collect();
        if !board.placements().iter().all(|placement| own.contains(placement)) {
            return None;
        }

        let placed: FxHashSet<&Placement> = board.placements().iter().collect();
        let remainder: Vec<Placement> = self
            .placements
            .iter()
            .filter(|placement| !placed.contains(placement))
            .copied()
            .collect();

        let fits = remainder.len() * CELLS_PER_PIECE == board.empty_count()
            && remainder.iter().all(|placement| {
                inventory.allows(placement.piece)
                    && placement.cells.iter().all(|&cell| board.is_free(cell))
            });
        fits.then_some(remainder)
    }
}

/// Result of [`Oracle::check`] plus the witness to keep for the next call.
#[derive(Clone, Debug)]
pub struct Checked {
    pub outcome: Outcome<CheckReport>,
    pub witness: Option<Witness>,
}

/// Time-boxed solvability checks over a fixed catalog.
pub struct Oracle<'c> {
    catalog: &'c PieceCatalog,
    config: OracleConfig,
}

impl<'c> Oracle<'c> {
    pub fn new(catalog: &'c PieceCatalog, config: OracleConfig) -> Self {
        Self { catalog, config }
    }

    /// Checks whether `board` can still be completed under `inventory`.
    ///
    /// `witness` is the value returned by the previous check on the same
    /// board history; pass `None` after a reset or policy change. The
    /// returned witness replaces it.
    ///
    /// Fails only when the board or inventory do not belong to the catalog.
    pub fn check(
        &self,
        board: &Board,
        inventory: &Inventory,
        witness: Option<Witness>,
        cancel: &CancelToken,
    ) -> Result<Checked, EngineError> {
        board.check_catalog(self.catalog)?;
        inventory.check_catalog(self.catalog)?;

        let budget = Budget::new(self.config.timeout, cancel.clone());
        let empty_cell_count = board.empty_count();
        let valid_next_moves = candidates(self.catalog, board, inventory).len();
        let remaining_pieces = empty_cell_count / CELLS_PER_PIECE;

        let mut report = CheckReport {
            verdict: Verdict::Unknown,
            empty_cell_count,
            elapsed: Duration::ZERO,
            valid_next_moves,
            estimated_search_space: remaining_pieces as f64
                * (valid_next_moves.max(1) as f64).log10(),
            timed_out: false,
            threshold_skipped: false,
            witness_reused: false,
        };

        if empty_cell_count % CELLS_PER_PIECE != 0 {
            debug!("parity: {empty_cell_count} empty cells");
            report.verdict = Verdict::Unsolvable;
            report.elapsed = budget.elapsed();
            return Ok(Checked {
                outcome: Outcome::Completed(report),
                witness: witness.filter(|_| self.config.use_witness),
            });
        }

        let witness = if self.config.use_witness { witness } else { None };
        if let Some(cached) = witness {
            if cached.remainder(board, inventory).is_some() {
                debug!("witness still covers the board");
                report.verdict = Verdict::Solvable { solutions: None };
                report.witness_reused = true;
                report.elapsed = budget.elapsed();
                return Ok(Checked {
                    outcome: Outcome::Completed(report),
                    witness: Some(cached),
                });
            }
            debug!("witness invalidated");
        }

        if self.config.assume_empty_board_solvable
            && empty_cell_count == board.container().len()
            && !inventory.is_empty()
        {
            report.verdict = Verdict::Solvable { solutions: None };
            report.elapsed = budget.elapsed();
            return Ok(Checked {
                outcome: Outcome::Completed(report),
                witness: None,
            });
        }

        let existence_only = self
            .config
            .count_threshold
            .is_some_and(|threshold| empty_cell_count > threshold);
        let limit = if existence_only {
            1
        } else {
            self.config.enumeration_cap
        };

        let mut ticker = budget.ticker();
        let covers = find_covers(
            self.catalog,
            board,
            inventory,
            limit,
            &mut ticker,
            self.config.seed,
        );
        report.elapsed = budget.elapsed();
        report.threshold_skipped = existence_only;

        if covers.stop == Stop::Interrupted(Interrupt::Cancelled) {
            return Ok(Checked {
                outcome: Outcome::Cancelled,
                witness: None,
            });
        }
        report.timed_out = covers.stop == Stop::Interrupted(Interrupt::TimedOut);
        report.verdict = match (covers.count, covers.stop) {
            (0, Stop::Exhausted) => Verdict::Unsolvable,
            (0, _) => Verdict::Unknown,
            (_, _) if existence_only => Verdict::Solvable { solutions: None },
            (count, Stop::Exhausted) => Verdict::Solvable {
                solutions: Some(SolutionCount::Exact(count)),
            },
            (count, _) => Verdict::Solvable {
                solutions: Some(SolutionCount::AtLeast(count)),
            },
        };
        debug!(
            "check: {} after {} nodes in {:?}",
            report.verdict.label(),
            ticker.nodes(),
            report.elapsed
        );

        let witness = covers.completion.map(|completion| {
            let mut placements = board.placements().to_vec();
            placements.extend(completion);
            Witness::new(inventory.policy(), placements)
        });
        Ok(Checked {
            outcome: Outcome::Completed(report),
            witness,
        })
    }
}
