//! Packing Puzzle Demo
//!
//! Runs solvability checks, hints and automatic solving on an empty cuboid
//! container with the eight tetracubes.

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use packer::geometry::tetracube_catalog;
use packer::{
    format_board, AutoSolveConfig, AutoSolveTask, Board, CancelToken, Cell, Container,
    EngineConfig, EngineError, Hint, HintConfig, HintEngine, Inventory, InventoryPolicy, Oracle,
    OracleConfig, Outcome, PieceCatalog, ShuffleMode, Summary,
};

/// Checks, hints and solves tetracube packings of a cuboid.
#[derive(Parser)]
#[command(name = "packer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    puzzle: PuzzleArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct PuzzleArgs {
    /// Container size along x, y and z.
    #[arg(long, value_parser = parse_cell, default_value = "4,4,2", global = true)]
    dims: Cell,

    #[arg(long, value_enum, default_value_t = Policy::Unlimited, global = true)]
    policy: Policy,

    /// Wall-clock budget in milliseconds; 0 means unlimited.
    #[arg(long, default_value_t = 2_000, global = true)]
    timeout_ms: u64,

    #[arg(long, default_value_t = 0, global = true)]
    seed: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Report whether the empty container can be filled.
    Check {
        /// Search even when the board is untouched.
        #[arg(long)]
        no_fast_path: bool,
    },
    /// Suggest a placement through one cell.
    Hint {
        #[arg(long, value_parser = parse_cell)]
        at: Cell,
    },
    /// Fill the container automatically.
    Solve {
        #[arg(long, value_enum, default_value_t = Shuffle::Random)]
        shuffle: Shuffle,
        /// Empty cells below which the ordering turns stable.
        #[arg(long, default_value_t = 20)]
        tail: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    OneOfEach,
    Unlimited,
    Single,
}

impl From<Policy> for InventoryPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::OneOfEach => InventoryPolicy::OneOfEach,
            Policy::Unlimited => InventoryPolicy::Unlimited,
            Policy::Single => InventoryPolicy::Single,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Shuffle {
    Stable,
    Random,
}

fn parse_cell(text: &str) -> Result<Cell, String> {
    let parts: Vec<i32> = text
        .split(',')
        .map(|part| part.trim().parse::<i32>().map_err(|e| e.to_string()))
        .collect::<Result<_, _>>()?;
    match parts[..] {
        [x, y, z] => Ok((x, y, z)),
        _ => Err(format!("expected x,y,z but got '{text}'")),
    }
}

impl PuzzleArgs {
    fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    fn board(&self) -> Result<Board, EngineError> {
        let (x, y, z) = self.dims;
        Ok(Board::new(Arc::new(Container::cuboid(x, y, z)?)))
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), EngineError> {
    let catalog = tetracube_catalog();
    let board = cli.puzzle.board()?;
    let inventory = Inventory::full(cli.puzzle.policy.into(), &catalog);

    match cli.command {
        Command::Check { no_fast_path } => {
            run_check(&cli.puzzle, &catalog, &board, &inventory, no_fast_path)
        }
        Command::Hint { at } => run_hint(&cli.puzzle, &catalog, &board, &inventory, at),
        Command::Solve { shuffle, tail } => {
            let config = AutoSolveConfig {
                timeout: cli.puzzle.timeout(),
                shuffle: match shuffle {
                    Shuffle::Stable => ShuffleMode::Stable,
                    Shuffle::Random => ShuffleMode::Random,
                },
                tail_size: tail,
                seed: cli.puzzle.seed,
                ..AutoSolveConfig::default()
            };
            let summary = solve(Arc::new(catalog.clone()), config, &board, inventory)?;
            print!("{}", describe_summary(&catalog, &board, &summary)?);
            Ok(())
        }
    }
}

fn run_check(
    args: &PuzzleArgs,
    catalog: &PieceCatalog,
    board: &Board,
    inventory: &Inventory,
    no_fast_path: bool,
) -> Result<(), EngineError> {
    let config = OracleConfig {
        timeout: args.timeout(),
        assume_empty_board_solvable: !no_fast_path,
        seed: Some(args.seed),
        ..OracleConfig::default()
    };
    let checked = Oracle::new(catalog, config).check(board, inventory, None, &CancelToken::new())?;
    let Outcome::Completed(report) = checked.outcome else {
        println!("cancelled");
        return Ok(());
    };

    let solutions = match report.verdict {
        packer::Verdict::Solvable {
            solutions: Some(count),
        } => format!(" ({count} solutions)"),
        _ => String::new(),
    };
    println!("{}{solutions}", report.verdict.label());
    println!(
        "{} empty cells, {} next moves, search space ~1e{:.1}, {} ms",
        report.empty_cell_count,
        report.valid_next_moves,
        report.estimated_search_space,
        report.compute_time_ms()
    );
    if let Some(witness) = checked.witness {
        let solved = Board::with_placements(
            board.container().clone(),
            catalog,
            witness.placements().iter().copied(),
        )?;
        print!("{}", format_board(&solved));
    }
    Ok(())
}

fn run_hint(
    args: &PuzzleArgs,
    catalog: &PieceCatalog,
    board: &Board,
    inventory: &Inventory,
    at: Cell,
) -> Result<(), EngineError> {
    let config = HintConfig {
        timeout: args.timeout(),
        seed: Some(args.seed),
    };
    let hint = HintEngine::new(catalog, config).hint(board, inventory, at, &CancelToken::new())?;

    match hint {
        Outcome::Completed(Hint::Found { placement, .. }) => {
            let name = catalog
                .piece(placement.piece)
                .map_or("?", |piece| piece.name());
            println!("place {name} on {:?}", placement.cells);
            print!("{}", format_board(&board.with(catalog, placement)?));
        }
        Outcome::Completed(Hint::NoHint(reason)) => println!("no hint: {reason:?}"),
        Outcome::Completed(Hint::TimedOut) => println!("no hint found in time"),
        Outcome::Cancelled => println!("cancelled"),
    }
    Ok(())
}

/// Runs an auto-solve in the background, logging its progress.
fn solve(
    catalog: Arc<PieceCatalog>,
    config: AutoSolveConfig,
    board: &Board,
    inventory: Inventory,
) -> Result<Summary, EngineError> {
    let config = EngineConfig {
        auto_solve: config,
        ..EngineConfig::default()
    };
    let task = AutoSolveTask::spawn(catalog, &config, board.clone(), inventory, 16);
    let progress = task.progress().clone();
    while !task.is_finished() {
        if let Ok(snapshot) = progress.recv_timeout(Duration::from_millis(200)) {
            info!(
                "{} placed (best {}), {} nodes, {} restarts",
                snapshot.placed, snapshot.best_placed, snapshot.nodes, snapshot.restart_count
            );
        }
    }
    task.join()
}

fn describe_summary(
    catalog: &PieceCatalog,
    board: &Board,
    summary: &Summary,
) -> Result<String, EngineError> {
    let mut output = format!(
        "{:?} after {} nodes, {} restarts, best {} placed\n",
        summary.stop_reason, summary.nodes, summary.restart_count, summary.best_placed
    );
    if let Some(solution) = &summary.solution {
        let solved =
            Board::with_placements(board.container().clone(), catalog, solution.iter().copied())?;
        output.push_str(&format_board(&solved));
    }
    Ok(output)
}
