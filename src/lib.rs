//! Packing Puzzle Engine
//!
//! Solvability checks, hints and automatic solving for puzzles where
//! four-cell pieces are packed into a container of lattice cells.

pub mod autosolve;
pub mod board;
pub mod candidates;
pub mod config;
pub mod control;
pub mod cover;
pub mod dlx;
pub mod error;
pub mod geometry;
pub mod hint;
pub mod inventory;
pub mod oracle;
pub mod pieces;
pub mod worker;

pub use autosolve::{AutoSolver, Progress, StopReason, Summary};
pub use board::{format_board, Board, Container};
pub use config::{AutoSolveConfig, EngineConfig, HintConfig, OracleConfig, ShuffleMode};
pub use control::{CancelToken, Outcome};
pub use error::EngineError;
pub use hint::{Hint, HintEngine, NoHintReason};
pub use inventory::{Inventory, InventoryPolicy, Remaining};
pub use oracle::{CheckReport, Checked, Oracle, SolutionCount, Verdict, Witness};
pub use pieces::{Cell, PieceCatalog, PieceId, PieceSpec, Placement};
pub use worker::{AutoSolveTask, QueryWorker};
