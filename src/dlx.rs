//! Knuth's Algorithm X over a dancing-links matrix.
//!
//! Nodes live in side tables (`left`, `right`, `up`, `down`, `column`,
//! `row`) indexed by node number, which keeps cover/uncover O(1) without
//! unsafe pointers. Node 0 is the root of the list of active primary
//! columns; nodes `1..=columns` are column headers. Secondary columns are
//! never linked into the root list, so they may stay uncovered, but a row
//! that uses one still removes every other row competing for it.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::control::{Interrupt, Ticker};

const ROOT: usize = 0;

/// How a search over the matrix ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stop {
    /// The whole search tree was visited.
    Exhausted,
    /// The requested number of solutions was reached.
    LimitReached,
    Interrupted(Interrupt),
}

/// Solutions found by [`Matrix::search`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchReport {
    /// Row indices of the first solution, in the order they were chosen.
    pub first: Option<Vec<usize>>,
    pub count: usize,
    pub stop: Stop,
}

enum Flow {
    Continue,
    Done,
}

/// Mutable search state threaded through the recursion.
struct Walk<'t, 'b> {
    ticker: &'t mut Ticker<'b>,
    limit: usize,
    count: usize,
    first: Option<Vec<usize>>,
    partial: Vec<usize>,
}

/// A sparse exact-cover matrix.
pub struct Matrix {
    left: Vec<usize>,
    right: Vec<usize>,
    up: Vec<usize>,
    down: Vec<usize>,
    /// Header node of every node; headers point at themselves.
    column: Vec<usize>,
    /// Row index of every node; meaningless for headers.
    row: Vec<usize>,
    /// Active node count per header, indexed by header node.
    size: Vec<usize>,
    columns: usize,
    rows: usize,
    rng: Option<StdRng>,
}

impl Matrix {
    /// Creates a matrix with `primary` columns that must be covered exactly
    /// once and `secondary` columns that may be covered at most once.
    ///
    /// Column numbers `0..primary` are primary, the rest secondary.
    pub fn new(primary: usize, secondary: usize) -> Self {
        let columns = primary + secondary;
        let headers = columns + 1;
        let mut matrix = Self {
            left: Vec::with_capacity(headers),
            right: Vec::with_capacity(headers),
            up: (0..headers).collect(),
            down: (0..headers).collect(),
            column: (0..headers).collect(),
            row: vec![usize::MAX; headers],
            size: vec![0; headers],
            columns,
            rows: 0,
            rng: None,
        };

        // root plus primary headers form one circular list
        for node in 0..=primary {
            matrix.left.push(if node == 0 { primary } else { node - 1 });
            matrix.right.push(if node == primary { 0 } else { node + 1 });
        }
        // secondary headers are self-linked
        for node in primary + 1..headers {
            matrix.left.push(node);
            matrix.right.push(node);
        }

        matrix
    }

    /// Shuffles row order at every branch using a seeded generator.
    pub fn shuffled(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Appends a row covering the given distinct columns; returns its index.
    pub fn add_row(&mut self, columns: &[usize]) -> usize {
        let row = self.rows;
        self.rows += 1;

        let first = self.left.len();
        for (offset, &col) in columns.iter().enumerate() {
            debug_assert!(col < self.columns, "column {col} out of range");
            let header = col + 1;
            let node = first + offset;

            // horizontal: circular list of this row's nodes
            let last = first + columns.len() - 1;
            self.left.push(if node == first { last } else { node - 1 });
            self.right.push(if node == last { first } else { node + 1 });

            // vertical: append at the bottom of the column
            let above = self.up[header];
            self.up.push(above);
            self.down.push(header);
            self.down[above] = node;
            self.up[header] = node;

            self.column.push(header);
            self.row.push(row);
            self.size[header] += 1;
        }

        row
    }

    /// Searches for exact covers until `limit` solutions have been counted,
    /// the tree is exhausted, or the ticker's budget runs out.
    ///
    /// The matrix is fully restored afterwards, whatever the outcome.
    pub fn search(&mut self, limit: usize, ticker: &mut Ticker<'_>) -> SearchReport {
        let mut walk = Walk {
            ticker,
            limit: limit.max(1),
            count: 0,
            first: None,
            partial: Vec::new(),
        };

        let stop = match self.descend(&mut walk) {
            Ok(Flow::Continue) => Stop::Exhausted,
            Ok(Flow::Done) => Stop::LimitReached,
            Err(interrupt) => Stop::Interrupted(interrupt),
        };

        SearchReport {
            first: walk.first,
            count: walk.count,
            stop,
        }
    }

    fn descend(&mut self, walk: &mut Walk<'_, '_>) -> Result<Flow, Interrupt> {
        walk.ticker.tick()?;

        if self.right[ROOT] == ROOT {
            walk.count += 1;
            if walk.first.is_none() {
                walk.first = Some(walk.partial.iter().map(|&node| self.row[node]).collect());
            }
            return Ok(if walk.count >= walk.limit {
                Flow::Done
            } else {
                Flow::Continue
            });
        }

        let column = self.choose_column();
        if self.size[column] == 0 {
            return Ok(Flow::Continue);
        }

        self.cover(column);

        let mut branches = Vec::with_capacity(self.size[column]);
        let mut node = self.down[column];
        while node != column {
            branches.push(node);
            node = self.down[node];
        }
        if let Some(rng) = self.rng.as_mut() {
            branches.shuffle(rng);
        }

        let mut flow = Ok(Flow::Continue);
        for node in branches {
            walk.partial.push(node);

            let mut other = self.right[node];
            while other != node {
                self.cover(self.column[other]);
                other = self.right[other];
            }

            flow = self.descend(walk);

            // uncover in reverse order
            let mut other = self.left[node];
            while other != node {
                self.uncover(self.column[other]);
                other = self.left[other];
            }

            walk.partial.pop();
            if !matches!(flow, Ok(Flow::Continue)) {
                break;
            }
        }

        self.uncover(column);
        flow
    }

    /// Picks the active primary column with the fewest rows.
    fn choose_column(&self) -> usize {
        let mut best = self.right[ROOT];
        let mut header = self.right[best];
        while header != ROOT && self.size[best] > 0 {
            if self.size[header] < self.size[best] {
                best = header;
            }
            header = self.right[header];
        }
        best
    }

    fn cover(&mut self, header: usize) {
        let (left, right) = (self.left[header], self.right[header]);
        self.right[left] = right;
        self.left[right] = left;

        let mut node = self.down[header];
        while node != header {
            let mut other = self.right[node];
            while other != node {
                let (up, down) = (self.up[other], self.down[other]);
                self.down[up] = down;
                self.up[down] = up;
                self.size[self.column[other]] -= 1;
                other = self.right[other];
            }
            node = self.down[node];
        }
    }

    fn uncover(&mut self, header: usize) {
        let mut node = self.up[header];
        while node != header {
            let mut other = self.left[node];
            while other != node {
                let (up, down) = (self.up[other], self.down[other]);
                self.size[self.column[other]] += 1;
                self.down[up] = other;
                self.up[down] = other;
                other = self.left[other];
            }
            node = self.up[node];
        }

        let (left, right) = (self.left[header], self.right[header]);
        self.right[left] = header;
        self.left[right] = header;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::control::{Budget, CancelToken};

    /// The example from Knuth's "Dancing Links" paper, columns A..G.
    fn knuth_matrix() -> Matrix {
        let mut matrix = Matrix::new(7, 0);
        matrix.add_row(&[2, 4, 5]);
        matrix.add_row(&[0, 3, 6]);
        matrix.add_row(&[1, 2, 5]);
        matrix.add_row(&[0, 3]);
        matrix.add_row(&[1, 6]);
        matrix.add_row(&[3, 4, 6]);
        matrix
    }

    fn sorted(rows: Option<Vec<usize>>) -> Vec<usize> {
        let mut rows = rows.unwrap();
        rows.sort_unstable();
        rows
    }

    #[test]
    fn test_knuth_example_has_unique_cover() {
        let budget = Budget::unlimited();
        let mut matrix = knuth_matrix();
        let report = matrix.search(usize::MAX, &mut budget.ticker());

        assert_eq!(report.count, 1);
        assert_eq!(report.stop, Stop::Exhausted);
        assert_eq!(sorted(report.first), vec![0, 3, 4]);
    }

    #[test]
    fn test_shuffled_search_finds_same_cover() {
        let budget = Budget::unlimited();
        for seed in 0..8 {
            let mut matrix = knuth_matrix().shuffled(seed);
            let report = matrix.search(usize::MAX, &mut budget.ticker());
            assert_eq!(sorted(report.first), vec![0, 3, 4], "seed {seed}");
        }
    }

    #[test]
    fn test_secondary_column_allows_at_most_one_use() {
        let budget = Budget::unlimited();
        let mut matrix = Matrix::new(2, 1);
        matrix.add_row(&[0, 2]);
        matrix.add_row(&[1, 2]);
        matrix.add_row(&[0]);
        matrix.add_row(&[1]);

        let report = matrix.search(usize::MAX, &mut budget.ticker());
        assert_eq!(report.count, 3);
        assert_eq!(report.stop, Stop::Exhausted);

        let capped = matrix.search(2, &mut budget.ticker());
        assert_eq!(capped.count, 2);
        assert_eq!(capped.stop, Stop::LimitReached);
    }

    #[test]
    fn test_uncoverable_column_exhausts_without_solutions() {
        let budget = Budget::unlimited();
        let mut matrix = Matrix::new(3, 0);
        matrix.add_row(&[0, 1]);
        matrix.add_row(&[1, 2]);

        let report = matrix.search(usize::MAX, &mut budget.ticker());
        assert_eq!(report.count, 0);
        assert_eq!(report.first, None);
        assert_eq!(report.stop, Stop::Exhausted);
    }

    #[test]
    fn test_matrix_without_primary_columns_has_empty_cover() {
        let budget = Budget::unlimited();
        let mut matrix = Matrix::new(0, 2);
        let report = matrix.search(usize::MAX, &mut budget.ticker());
        assert_eq!(report.count, 1);
        assert_eq!(report.first, Some(vec![]));
    }

    #[test]
    fn test_interrupted_search_restores_matrix() {
        let mut matrix = knuth_matrix();
        let expired = Budget::new(Some(Duration::ZERO), CancelToken::new());
        let report = matrix.search(usize::MAX, &mut expired.ticker());
        assert_eq!(report.stop, Stop::Interrupted(Interrupt::TimedOut));
        assert_eq!(report.count, 0);

        let budget = Budget::unlimited();
        let report = matrix.search(usize::MAX, &mut budget.ticker());
        assert_eq!(sorted(report.first), vec![0, 3, 4]);
    }
}
