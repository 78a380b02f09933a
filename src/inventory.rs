//! Inventory policies and per-piece remaining counts.

use crate::board::Board;
use crate::error::InventoryError;
use crate::pieces::{PieceCatalog, PieceId};

/// How often each piece type may be used in a solution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InventoryPolicy {
    /// Each piece type at most once.
    OneOfEach,
    /// Any piece type arbitrarily often.
    Unlimited,
    /// One piece type, fixed by the first placement, arbitrarily often.
    Single,
}

/// Remaining uses of one piece type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Remaining {
    Zero,
    Once,
    Unlimited,
}

impl Remaining {
    #[inline]
    pub fn is_available(self) -> bool {
        self != Remaining::Zero
    }
}

/// Remaining counts for every piece in a catalog.
///
/// An exclusive inventory lets every listed piece be used, but a solution
/// may only use one of them. This is the state of the single-type policy
/// before its first placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inventory {
    policy: InventoryPolicy,
    remaining: Vec<Remaining>,
    exclusive: bool,
}

impl Inventory {
    /// The inventory of an untouched board.
    pub fn full(policy: InventoryPolicy, catalog: &PieceCatalog) -> Self {
        let count = match policy {
            InventoryPolicy::OneOfEach => Remaining::Once,
            InventoryPolicy::Unlimited | InventoryPolicy::Single => Remaining::Unlimited,
        };
        Self {
            policy,
            remaining: vec![count; catalog.len()],
            exclusive: policy == InventoryPolicy::Single,
        }
    }

    /// Derives the remaining counts after the placements already on `board`.
    pub fn for_board(
        policy: InventoryPolicy,
        catalog: &PieceCatalog,
        board: &Board,
    ) -> Result<Self, InventoryError> {
        let mut inventory = Self::full(policy, catalog);
        for placement in board.placements() {
            inventory = inventory.checked_after(placement.piece)?;
        }
        Ok(inventory)
    }

    /// Builds an inventory from explicit counts supplied by the session layer.
    ///
    /// Under `Single` with several types still open, solutions are limited
    /// to one type as with [`Inventory::full`].
    pub fn from_counts(
        policy: InventoryPolicy,
        catalog: &PieceCatalog,
        remaining: Vec<Remaining>,
    ) -> Result<Self, InventoryError> {
        if remaining.len() != catalog.len() {
            return Err(InventoryError::SizeMismatch {
                expected: catalog.len(),
                actual: remaining.len(),
            });
        }
        let open = remaining.iter().filter(|count| count.is_available()).count();
        Ok(Self {
            exclusive: policy == InventoryPolicy::Single && open > 1,
            policy,
            remaining,
        })
    }

    pub fn policy(&self) -> InventoryPolicy {
        self.policy
    }

    /// Fails when the counts were built for a different catalog.
    pub fn check_catalog(&self, catalog: &PieceCatalog) -> Result<(), InventoryError> {
        if self.remaining.len() == catalog.len() {
            Ok(())
        } else {
            Err(InventoryError::SizeMismatch {
                expected: catalog.len(),
                actual: self.remaining.len(),
            })
        }
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    pub fn remaining(&self, piece: PieceId) -> Remaining {
        self.remaining.get(piece).copied().unwrap_or(Remaining::Zero)
    }

    #[inline]
    pub fn allows(&self, piece: PieceId) -> bool {
        self.remaining(piece).is_available()
    }

    /// True when no piece can be placed at all.
    pub fn is_empty(&self) -> bool {
        !self.remaining.iter().any(|count| count.is_available())
    }

    /// Piece ids with at least one remaining use, in catalog order.
    pub fn available(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.remaining
            .iter()
            .enumerate()
            .filter(|(_, count)| count.is_available())
            .map(|(piece, _)| piece)
    }

    /// Per-piece counts, indexed by piece id.
    pub fn counts(&self) -> &[Remaining] {
        &self.remaining
    }

    /// The inventory after one more use of `piece`.
    ///
    /// The caller must have checked `allows(piece)`.
    pub fn after(&self, piece: PieceId) -> Self {
        let mut next = self.clone();
        if next.exclusive {
            next = next.restricted_to(piece);
        }
        if let Some(count) = next.remaining.get_mut(piece) {
            if *count == Remaining::Once {
                *count = Remaining::Zero;
            }
        }
        next
    }

    fn checked_after(self, piece: PieceId) -> Result<Self, InventoryError> {
        if self.allows(piece) {
            return Ok(self.after(piece));
        }
        match self.policy {
            InventoryPolicy::Single => {
                let first = self.available().next().unwrap_or(piece);
                Err(InventoryError::MixedTypes {
                    first,
                    second: piece,
                })
            }
            _ => Err(InventoryError::ReusedPiece(piece)),
        }
    }

    /// Keeps only `piece` available and lifts exclusivity.
    pub fn restricted_to(&self, piece: PieceId) -> Self {
        let remaining = self
            .remaining
            .iter()
            .enumerate()
            .map(|(id, &count)| if id == piece { count } else { Remaining::Zero })
            .collect();
        Self {
            policy: self.policy,
            remaining,
            exclusive: false,
        }
    }
}
