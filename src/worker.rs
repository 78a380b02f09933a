//! Background execution of engine queries.
//!
//! [`QueryWorker`] serves oracle checks and hints for one board on a
//! dedicated thread. Submitting a query cancels the one in flight, and
//! replies to superseded tickets are dropped before they reach the caller.
//! [`AutoSolveTask`] runs one auto-solve on its own thread and streams
//! progress through a bounded channel.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::autosolve::{AutoSolver, Progress, Summary};
use crate::board::Board;
use crate::config::EngineConfig;
use crate::control::{CancelToken, Outcome};
use crate::error::EngineError;
use crate::hint::{Hint, HintEngine};
use crate::inventory::Inventory;
use crate::oracle::{Checked, Oracle, Witness};
use crate::pieces::{Cell, PieceCatalog};

/// Identifies one submitted query; later tickets compare greater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// A query over a board snapshot.
#[derive(Clone, Debug)]
pub enum Query {
    Check {
        board: Board,
        inventory: Inventory,
        witness: Option<Witness>,
    },
    Hint {
        board: Board,
        inventory: Inventory,
        anchor: Cell,
    },
}

#[derive(Debug)]
pub enum Answer {
    Check(Checked),
    Hint(Outcome<Hint>),
}

#[derive(Debug)]
pub struct Reply {
    pub ticket: Ticket,
    pub answer: Result<Answer, EngineError>,
}

struct Request {
    ticket: Ticket,
    query: Query,
    cancel: CancelToken,
}

/// Serves queries one at a time on a background thread.
pub struct QueryWorker {
    requests: Option<Sender<Request>>,
    replies: Receiver<Reply>,
    handle: Option<thread::JoinHandle<()>>,
    in_flight: Option<CancelToken>,
    pending: Option<Ticket>,
    next_ticket: u64,
}

impl QueryWorker {
    pub fn spawn(catalog: Arc<PieceCatalog>, config: EngineConfig) -> Self {
        let (requests, inbox) = unbounded::<Request>();
        let (outbox, replies) = unbounded::<Reply>();

        let handle = thread::spawn(move || {
            let oracle = Oracle::new(&catalog, config.oracle);
            let hints = HintEngine::new(&catalog, config.hint);

            while let Ok(request) = inbox.recv() {
                if request.cancel.is_cancelled() {
                    trace!("skipping superseded query {:?}", request.ticket);
                    continue;
                }
                let answer = match request.query {
                    Query::Check {
                        board,
                        inventory,
                        witness,
                    } => oracle
                        .check(&board, &inventory, witness, &request.cancel)
                        .map(Answer::Check),
                    Query::Hint {
                        board,
                        inventory,
                        anchor,
                    } => hints
                        .hint(&board, &inventory, anchor, &request.cancel)
                        .map(Answer::Hint),
                };
                let reply = Reply {
                    ticket: request.ticket,
                    answer,
                };
                if outbox.send(reply).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: Some(requests),
            replies,
            handle: Some(handle),
            in_flight: None,
            pending: None,
            next_ticket: 0,
        }
    }

    /// Queues `query`, cancelling the query submitted before it.
    pub fn submit(&mut self, query: Query) -> Result<Ticket, EngineError> {
        if let Some(previous) = self.in_flight.take() {
            previous.cancel();
        }
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;

        let cancel = CancelToken::new();
        let request = Request {
            ticket,
            query,
            cancel: cancel.clone(),
        };
        self.requests
            .as_ref()
            .ok_or(EngineError::WorkerGone)?
            .send(request)
            .map_err(|_| EngineError::WorkerGone)?;

        self.in_flight = Some(cancel);
        self.pending = Some(ticket);
        Ok(ticket)
    }

    /// Cancels the query in flight; its reply will never be surfaced.
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.pending = None;
    }

    pub fn pending(&self) -> Option<Ticket> {
        self.pending
    }

    /// Blocks until the reply to the latest ticket arrives.
    ///
    /// Returns `None` when nothing is pending.
    pub fn recv_latest(&mut self) -> Result<Option<Reply>, EngineError> {
        while let Some(pending) = self.pending {
            let reply = self.replies.recv().map_err(|_| EngineError::WorkerGone)?;
            if reply.ticket == pending {
                return Ok(self.accept(reply));
            }
            debug!("discarding stale reply {:?}", reply.ticket);
        }
        Ok(None)
    }

    /// Like [`QueryWorker::recv_latest`] but never blocks.
    pub fn try_recv_latest(&mut self) -> Result<Option<Reply>, EngineError> {
        while let Some(pending) = self.pending {
            let reply = match self.replies.try_recv() {
                Ok(reply) => reply,
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => return Err(EngineError::WorkerGone),
            };
            if reply.ticket == pending {
                return Ok(self.accept(reply));
            }
            debug!("discarding stale reply {:?}", reply.ticket);
        }
        Ok(None)
    }

    fn accept(&mut self, reply: Reply) -> Option<Reply> {
        self.pending = None;
        self.in_flight = None;
        Some(reply)
    }
}

impl Drop for QueryWorker {
    fn drop(&mut self) {
        self.cancel();
        // closing the request channel ends the thread loop
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// An auto-solve running on its own thread with its own board copy.
///
/// Dropping the task cancels the search and waits for the thread.
pub struct AutoSolveTask {
    cancel: CancelToken,
    progress: Receiver<Progress>,
    handle: Option<thread::JoinHandle<Result<Summary, EngineError>>>,
}

impl AutoSolveTask {
    /// Starts the search with `config.auto_solve`; at most `capacity` unread
    /// progress snapshots are kept, newer ones are dropped while the channel
    /// is full.
    pub fn spawn(
        catalog: Arc<PieceCatalog>,
        config: &EngineConfig,
        board: Board,
        inventory: Inventory,
        capacity: usize,
    ) -> Self {
        let cancel = CancelToken::new();
        let (sender, progress) = bounded::<Progress>(capacity.max(1));

        let token = cancel.clone();
        let config = config.auto_solve.clone();
        let handle = thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(config.seed);
            AutoSolver::new(&catalog, config).run(&board, &inventory, &mut rng, &token, |snapshot| {
                let _ = sender.try_send(snapshot);
            })
        });

        Self {
            cancel,
            progress,
            handle: Some(handle),
        }
    }

    pub fn progress(&self) -> &Receiver<Progress> {
        &self.progress
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// Waits for the search to end and returns its summary.
    pub fn join(mut self) -> Result<Summary, EngineError> {
        let handle = self.handle.take().ok_or(EngineError::WorkerGone)?;
        handle.join().map_err(|_| EngineError::WorkerGone)?
    }
}

impl Drop for AutoSolveTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel.cancel();
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::autosolve::StopReason;
    use crate::board::Container;
    use crate::config::{AutoSolveConfig, OracleConfig, ShuffleMode};
    use crate::geometry::tetracube_catalog;
    use crate::inventory::InventoryPolicy;

    fn check_query(catalog: &PieceCatalog, dims: (i32, i32, i32)) -> Query {
        let board = Board::new(Arc::new(Container::cuboid(dims.0, dims.1, dims.2).unwrap()));
        Query::Check {
            inventory: Inventory::full(InventoryPolicy::Unlimited, catalog),
            board,
            witness: None,
        }
    }

    /// A search with no deadline that cannot succeed on a 5x5x4 box under
    /// one copy of each piece.
    fn unbounded_search() -> EngineConfig {
        EngineConfig {
            auto_solve: AutoSolveConfig {
                timeout: None,
                shuffle: ShuffleMode::Stable,
                progress_interval: 1_000,
                ..AutoSolveConfig::default()
            },
            ..EngineConfig::default()
        }
    }

    fn exhaustive() -> EngineConfig {
        EngineConfig {
            oracle: OracleConfig {
                timeout: None,
                count_threshold: None,
                assume_empty_board_solvable: false,
                ..OracleConfig::default()
            },
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_worker_answers_check() {
        let catalog = Arc::new(tetracube_catalog());
        let mut worker = QueryWorker::spawn(catalog.clone(), exhaustive());

        let ticket = worker.submit(check_query(&catalog, (8, 1, 1))).unwrap();
        let reply = worker.recv_latest().unwrap().unwrap();
        assert_eq!(reply.ticket, ticket);
        let Ok(Answer::Check(checked)) = reply.answer else {
            panic!("expected a check answer");
        };
        let report = checked.outcome.completed().unwrap();
        assert!(report.verdict.is_solvable());
        assert!(worker.recv_latest().unwrap().is_none());
    }

    #[test]
    fn test_superseded_replies_are_discarded() {
        let catalog = Arc::new(tetracube_catalog());
        let mut worker = QueryWorker::spawn(catalog.clone(), exhaustive());

        let first = worker.submit(check_query(&catalog, (4, 4, 4))).unwrap();
        let second = worker.submit(check_query(&catalog, (4, 1, 1))).unwrap();
        assert!(second > first);

        let reply = worker.recv_latest().unwrap().unwrap();
        assert_eq!(reply.ticket, second);
        let Ok(Answer::Check(checked)) = reply.answer else {
            panic!("expected a check answer");
        };
        assert_eq!(checked.outcome.completed().unwrap().empty_cell_count, 4);
    }

    #[test]
    fn test_worker_hint_and_cancel() {
        let catalog = Arc::new(tetracube_catalog());
        let mut worker = QueryWorker::spawn(catalog.clone(), exhaustive());
        assert!(worker.try_recv_latest().unwrap().is_none());

        let board = Board::new(Arc::new(Container::cuboid(8, 1, 1).unwrap()));
        let query = Query::Hint {
            inventory: Inventory::full(InventoryPolicy::Unlimited, &catalog),
            board,
            anchor: (5, 0, 0),
        };
        worker.submit(query.clone()).unwrap();
        worker.cancel();
        assert_eq!(worker.pending(), None);
        assert!(worker.recv_latest().unwrap().is_none());

        worker.submit(query).unwrap();
        let reply = worker.recv_latest().unwrap().unwrap();
        assert!(matches!(
            reply.answer,
            Ok(Answer::Hint(Outcome::Completed(Hint::Found { .. })))
        ));
    }

    #[test]
    fn test_auto_solve_task_finds_solution() {
        let catalog = Arc::new(tetracube_catalog());
        let board = Board::new(Arc::new(Container::cuboid(2, 2, 4).unwrap()));
        let inventory = Inventory::full(InventoryPolicy::OneOfEach, &catalog);
        let config = EngineConfig {
            auto_solve: AutoSolveConfig {
                timeout: None,
                progress_interval: 1,
                ..AutoSolveConfig::default()
            },
            ..EngineConfig::default()
        };

        let task = AutoSolveTask::spawn(catalog, &config, board, inventory, 2);
        let summary = task.join().unwrap();
        assert!(summary.success);
        assert_eq!(summary.solution.map(|solution| solution.len()), Some(4));
    }

    #[test]
    fn test_cancelled_auto_solve_task() {
        let catalog = Arc::new(tetracube_catalog());
        // far more cells than one copy of each piece can cover
        let board = Board::new(Arc::new(Container::cuboid(5, 5, 4).unwrap()));
        let inventory = Inventory::full(InventoryPolicy::OneOfEach, &catalog);
        let config = unbounded_search();

        let task = AutoSolveTask::spawn(catalog, &config, board.clone(), inventory, 4);
        task.cancel();
        let backlog = task.progress().clone();
        let summary = task.join().unwrap();

        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert!(backlog.try_iter().count() <= 4);
        assert!(board.placements().is_empty());
    }

    #[test]
    fn test_dropped_auto_solve_task_stops_searching() {
        let catalog = Arc::new(tetracube_catalog());
        let board = Board::new(Arc::new(Container::cuboid(5, 5, 4).unwrap()));
        let inventory = Inventory::full(InventoryPolicy::OneOfEach, &catalog);

        let task = AutoSolveTask::spawn(catalog, &unbounded_search(), board, inventory, 4);
        let backlog = task.progress().clone();
        thread::sleep(Duration::from_millis(50));
        drop(task);

        // the search thread has exited and released its sender
        assert!(backlog.try_iter().count() <= 4);
        assert_eq!(backlog.try_recv(), Err(TryRecvError::Disconnected));
    }
}
