//! Suggests one placement through a chosen cell that keeps the board
//! completable.

use log::debug;

use crate::board::Board;
use crate::candidates::covering;
use crate::config::HintConfig;
use crate::control::{Budget, CancelToken, Interrupt, Outcome};
use crate::cover::find_covers;
use crate::dlx::Stop;
use crate::error::EngineError;
use crate::inventory::Inventory;
use crate::oracle::Witness;
use crate::pieces::{Cell, PieceCatalog, Placement};

/// Why no hint could be given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoHintReason {
    OutsideContainer,
    AnchorOccupied,
    /// No remaining piece fits through the anchor at all.
    NoCandidates,
    /// Every piece through the anchor was proven to block completion.
    NoCompletion,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hint {
    /// `placement` covers the anchor and `witness` completes the board
    /// with it.
    Found {
        placement: Placement,
        witness: Witness,
    },
    NoHint(NoHintReason),
    /// The budget ran out before any candidate was confirmed.
    TimedOut,
}

pub struct HintEngine<'c> {
    catalog: &'c PieceCatalog,
    config: HintConfig,
}

impl<'c> HintEngine<'c> {
    pub fn new(catalog: &'c PieceCatalog, config: HintConfig) -> Self {
        Self { catalog, config }
    }

    /// Finds a placement covering `anchor` after which the board can still
    /// be completed.
    ///
    /// Candidates are tried in order and share one deadline.
    pub fn hint(
        &self,
        board: &Board,
        inventory: &Inventory,
        anchor: Cell,
        cancel: &CancelToken,
    ) -> Result<Outcome<Hint>, EngineError> {
        board.check_catalog(self.catalog)?;
        inventory.check_catalog(self.catalog)?;

        if !board.container().contains(anchor) {
            return Ok(Outcome::Completed(Hint::NoHint(
                NoHintReason::OutsideContainer,
            )));
        }
        if board.is_occupied(anchor) {
            return Ok(Outcome::Completed(Hint::NoHint(NoHintReason::AnchorOccupied)));
        }

        let tried = covering(self.catalog, board, inventory, anchor);
        if tried.is_empty() {
            return Ok(Outcome::Completed(Hint::NoHint(NoHintReason::NoCandidates)));
        }
        debug!("hint at {anchor:?}: {} candidates", tried.len());

        let budget = Budget::new(self.config.timeout, cancel.clone());
        let mut ticker = budget.ticker();
        for placement in tried {
            let next = board.with(self.catalog, placement)?;
            let rest = inventory.after(placement.piece);
            let report = find_covers(self.catalog, &next, &rest, 1, &mut ticker, self.config.seed);

            if let Some(completion) = report.completion {
                let mut placements = next.placements().to_vec();
                placements.extend(completion);
                debug!("hint found after {} nodes", ticker.nodes());
                return Ok(Outcome::Completed(Hint::Found {
                    placement,
                    witness: Witness::new(inventory.policy(), placements),
                }));
            }
            match report.stop {
                Stop::Interrupted(Interrupt::Cancelled) => return Ok(Outcome::Cancelled),
                // the deadline is shared, so later candidates cannot run either
                Stop::Interrupted(Interrupt::TimedOut) => {
                    return Ok(Outcome::Completed(Hint::TimedOut))
                }
                Stop::Exhausted | Stop::LimitReached => {}
            }
        }

        Ok(Outcome::Completed(Hint::NoHint(NoHintReason::NoCompletion)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::board::Container;
    use crate::geometry::tetracube_catalog;
    use crate::inventory::InventoryPolicy;

    fn generous() -> HintConfig {
        HintConfig {
            timeout: None,
            seed: None,
        }
    }

    fn ask(catalog: &PieceCatalog, board: &Board, policy: InventoryPolicy, anchor: Cell) -> Hint {
        let inventory = Inventory::for_board(policy, catalog, board).unwrap();
        HintEngine::new(catalog, generous())
            .hint(board, &inventory, anchor, &CancelToken::new())
            .unwrap()
            .completed()
            .unwrap()
    }

    #[test]
    fn test_hint_in_a_line() {
        let catalog = tetracube_catalog();
        let board = Board::new(Arc::new(Container::cuboid(8, 1, 1).unwrap()));

        let Hint::Found { placement, witness } =
            ask(&catalog, &board, InventoryPolicy::Unlimited, (5, 0, 0))
        else {
            panic!("expected a hint");
        };
        assert_eq!(placement.piece, catalog.find("I").unwrap());
        assert_eq!(placement.anchor, (4, 0, 0));
        assert_eq!(placement.cells, [(4, 0, 0), (5, 0, 0), (6, 0, 0), (7, 0, 0)]);
        assert!(witness.placements().contains(&placement));
        assert_eq!(witness.placements().len(), 2);
    }

    #[test]
    fn test_hint_always_covers_anchor() {
        let catalog = tetracube_catalog();
        let board = Board::new(Arc::new(Container::cuboid(2, 2, 4).unwrap()));

        for &anchor in board.container().cells() {
            match ask(&catalog, &board, InventoryPolicy::OneOfEach, anchor) {
                Hint::Found { placement, witness } => {
                    assert!(placement.covers(anchor), "{anchor:?}");
                    let completed = Board::with_placements(
                        board.container().clone(),
                        &catalog,
                        witness.placements().iter().copied(),
                    )
                    .unwrap();
                    assert!(completed.is_complete());
                }
                other => panic!("no hint at {anchor:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_hint_reasons() {
        let catalog = tetracube_catalog();
        let mut board = Board::new(Arc::new(Container::cuboid(8, 1, 1).unwrap()));

        assert_eq!(
            ask(&catalog, &board, InventoryPolicy::OneOfEach, (8, 0, 0)),
            Hint::NoHint(NoHintReason::OutsideContainer)
        );

        let bar = catalog.place(catalog.find("I").unwrap(), 2, (0, 0, 0)).unwrap();
        assert!(bar.covers((3, 0, 0)));
        board.place(&catalog, bar).unwrap();
        assert_eq!(
            ask(&catalog, &board, InventoryPolicy::OneOfEach, (1, 0, 0)),
            Hint::NoHint(NoHintReason::AnchorOccupied)
        );
        // the only bar is spent and nothing else fits a line
        assert_eq!(
            ask(&catalog, &board, InventoryPolicy::OneOfEach, (5, 0, 0)),
            Hint::NoHint(NoHintReason::NoCandidates)
        );
    }

    #[test]
    fn test_hint_without_completion() {
        let catalog = tetracube_catalog();
        let board = Board::new(Arc::new(Container::cuboid(9, 1, 1).unwrap()));
        assert_eq!(
            ask(&catalog, &board, InventoryPolicy::Unlimited, (0, 0, 0)),
            Hint::NoHint(NoHintReason::NoCompletion)
        );
    }

    #[test]
    fn test_two_group_hints() {
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

        for (anchor, name) in [((2, 0, 0), "I"), ((1, 1, 5), "O")] {
            let Hint::Found { placement, .. } =
                ask(&catalog, &board, InventoryPolicy::OneOfEach, anchor)
            else {
                panic!("expected a hint at {anchor:?}");
            };
            assert_eq!(catalog.piece(placement.piece).unwrap().name(), name);
        }
    }

    #[test]
    fn test_expired_budget_is_timed_out() {
        let catalog = tetracube_catalog();
        let board = Board::new(Arc::new(Container::cuboid(4, 4, 4).unwrap()));
        let inventory = Inventory::full(InventoryPolicy::Unlimited, &catalog);
        let engine = HintEngine::new(
            &catalog,
            HintConfig {
                timeout: Some(Duration::ZERO),
                seed: None,
            },
        );

        let hint = engine
            .hint(&board, &inventory, (0, 0, 0), &CancelToken::new())
            .unwrap();
        assert_eq!(hint, Outcome::Completed(Hint::TimedOut));
    }

    #[test]
    fn test_cancelled_hint() {
        let catalog = tetracube_catalog();
        let board = Board::new(Arc::new(Container::cuboid(4, 4, 4).unwrap()));
        let inventory = Inventory::full(InventoryPolicy::Unlimited, &catalog);
        let token = CancelToken::new();
        token.cancel();

        let hint = HintEngine::new(&catalog, generous())
            .hint(&board, &inventory, (0, 0, 0), &token)
            .unwrap();
        assert!(hint.is_cancelled());
    }
}
