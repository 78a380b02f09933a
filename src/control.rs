//! Cooperative search control: deadlines, cancellation and node counting.
//!
//! Searches never get preempted. They call [`Ticker::tick`] once per node,
//! and every `CHECK_INTERVAL` nodes the ticker compares the clock with the
//! deadline and polls the cancellation token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Nodes visited between two budget checks.
const CHECK_INTERVAL: u64 = 256;

/// Shared flag used to abandon a running search.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Why a search stopped before finishing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interrupt {
    TimedOut,
    Cancelled,
}

/// Result of a background computation that may have been cancelled.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }
}

/// Wall-clock limit plus cancellation for one query.
#[derive(Clone, Debug)]
pub struct Budget {
    started: Instant,
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl Budget {
    /// Starts the clock now; `None` means no time limit.
    pub fn new(timeout: Option<Duration>, cancel: CancelToken) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: timeout.map(|limit| started + limit),
            cancel,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None, CancelToken::new())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Checks the token first so cancellation wins over an expired clock.
    pub fn check(&self) -> Result<(), Interrupt> {
        if self.cancel.is_cancelled() {
            return Err(Interrupt::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupt::TimedOut),
            _ => Ok(()),
        }
    }

    pub fn ticker(&self) -> Ticker<'_> {
        Ticker {
            budget: self,
            nodes: 0,
        }
    }
}

/// Counts search nodes and enforces a [`Budget`] periodically.
#[derive(Debug)]
pub struct Ticker<'a> {
    budget: &'a Budget,
    nodes: u64,
}

impl Ticker<'_> {
    /// Records one node; the first node of a search is always checked.
    #[inline]
    pub fn tick(&mut self) -> Result<(), Interrupt> {
        let due = self.nodes % CHECK_INTERVAL == 0;
        self.nodes += 1;
        if due {
            self.budget.check()
        } else {
            Ok(())
        }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }
}
