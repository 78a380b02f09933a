//! Query budgets and search tuning.
//!
//! Every value has a default suited to interactive play; the demo binary
//! overrides them from command-line flags.

use std::time::Duration;

/// Budget and behaviour of solvability checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleConfig {
    /// Wall-clock limit for one check; `None` waits for a proof.
    pub timeout: Option<Duration>,
    /// Stop counting solutions after this many and report "at least".
    pub enumeration_cap: usize,
    /// Above this many empty cells only existence is checked.
    pub count_threshold: Option<usize>,
    /// Reuse a cached full solution when the board still agrees with it.
    pub use_witness: bool,
    /// Treat an untouched board with pieces left as solvable without searching.
    pub assume_empty_board_solvable: bool,
    /// Seed for shuffling row order; `None` keeps the deterministic order.
    pub seed: Option<u64>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_millis(2_000)),
            enumeration_cap: 1_000,
            count_threshold: Some(40),
            use_witness: true,
            assume_empty_board_solvable: true,
            seed: None,
        }
    }
}

/// Budget for hint queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HintConfig {
    /// Shared by all candidates tried in one query.
    pub timeout: Option<Duration>,
    pub seed: Option<u64>,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_millis(5_000)),
            seed: None,
        }
    }
}

/// Candidate ordering used by the auto-solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShuffleMode {
    /// Catalog order; exhaustive and reproducible.
    Stable,
    /// Seeded random order at every branch.
    Random,
}

/// Tuning of unguided full-board search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutoSolveConfig {
    pub timeout: Option<Duration>,
    pub shuffle: ShuffleMode,
    /// Below this many empty cells the ordering falls back to stable.
    pub tail_size: usize,
    /// Nodes an attempt may spend before a randomized restart.
    pub restart_nodes: Option<u64>,
    /// Upper bound on restarts; `None` restarts until the timeout.
    pub max_restarts: Option<usize>,
    /// Nodes between two progress snapshots.
    pub progress_interval: u64,
    pub seed: u64,
}

impl Default for AutoSolveConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(60)),
            shuffle: ShuffleMode::Random,
            tail_size: 20,
            restart_nodes: Some(200_000),
            max_restarts: None,
            progress_interval: 10_000,
            seed: 0,
        }
    }
}

/// All engine settings in one place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub oracle: OracleConfig,
    pub hint: HintConfig,
    pub auto_solve: AutoSolveConfig,
}
