//! Order resolution.
//!
//! One resolver per phase: movement (Kruijswijk guess-and-check with
//! paradox backup rules), retreat, and adjustment. Every resolver takes the
//! board by reference and returns a new board plus one verdict per
//! submitted order.

pub mod build;
pub mod kruijswijk;
pub mod phase;
pub mod relationship;
pub mod retreat;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::board::{BoardError, BoardState, Order, Phase, PlayerId, ProvinceGraph, ProvinceId};

pub use build::{resolve_builds, suggest_disbands, AdjustmentIssue, AdjustmentSummary, BuildOutcome};
pub use kruijswijk::{
    resolve_movement, AdjudicableOrder, DislodgedUnit, MovementOutcome, OrderKind, Resolution,
    ResolutionState, Resolver,
};
pub use phase::{advance_state, needs_build_phase, next_phase, update_sc_ownership};
pub use relationship::check_relationship;
pub use retreat::{resolve_retreats, RetreatOutcome};

/// Why an order was ruled illegal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IllegalReason {
    /// Submitted in a phase it does not belong to.
    WrongPhase,
    NoUnit,
    NotOwner,
    /// The destination cannot be reached from the unit's location.
    Unreachable,
    /// The unit type cannot stand on the destination's terrain.
    WrongTerrain,
    /// A fleet move to a split-coast province reaches more than one coast.
    AmbiguousCoast,
    NoConvoyRoute,
    UnmatchedSupport,
    UnmatchedConvoy,
    SupportIntoOwnProvince,
    HoldSupportForMove,
    NotConvoyable,
    InvalidCore,
    NotDislodged,
    InvalidRetreat,
    InvalidBuild,
    InvalidDisband,
    /// The player has no adjustment to make this phase.
    NoAdjustment,
    /// More adjustments than the player's delta allows.
    ExcessAdjustment,
    /// A build when disbands are due, or the reverse.
    OppositeAdjustment,
    InvalidRelationship,
}

/// The verdict for one submitted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Succeeds,
    /// Legal, but lost the resolution contest.
    Fails,
    /// Structurally impossible; the unit held instead.
    Illegal(IllegalReason),
}

impl Verdict {
    pub fn is_success(self) -> bool {
        self == Verdict::Succeeds
    }

    pub fn is_illegal(self) -> bool {
        matches!(self, Verdict::Illegal(_))
    }
}

/// A submitted order paired with its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderVerdict {
    pub order: Order,
    pub player: PlayerId,
    pub verdict: Verdict,
}

/// Conditions that abort a phase before any order is resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdjudicationError {
    #[error("invalid board: {0}")]
    InvalidBoard(#[from] BoardError),

    #[error("order names unknown province {0}")]
    UnknownProvince(ProvinceId),

    #[error("order submitted by unknown {0}")]
    UnknownPlayer(PlayerId),

    #[error("more than one order for the unit at {0}")]
    DuplicateOrder(ProvinceId),

    #[error("board is in the {found:?} phase, resolver expects {expected:?}")]
    PhaseMismatch { expected: Phase, found: Phase },
}

/// Checks the board and submissions before a resolver touches them.
pub(crate) fn check_submissions(
    graph: &ProvinceGraph,
    board: &BoardState,
    orders: &[(Order, PlayerId)],
    expected: Phase,
) -> Result<(), AdjudicationError> {
    if board.turn.phase != expected {
        return Err(AdjudicationError::PhaseMismatch {
            expected,
            found: board.turn.phase,
        });
    }
    board.validate(graph)?;

    let mut acting = BTreeSet::new();
    for (order, player) in orders {
        if !board.has_player(*player) {
            return Err(AdjudicationError::UnknownPlayer(*player));
        }
        if let Some(p) = order.provinces().into_iter().find(|&p| !graph.contains(p)) {
            return Err(AdjudicationError::UnknownProvince(p));
        }
        if order.phase() != Some(expected) {
            continue;
        }
        if let Some(unit) = order.unit() {
            if !acting.insert(unit) {
                return Err(AdjudicationError::DuplicateOrder(unit));
            }
        }
    }
    Ok(())
}

/// Verdict for orders that do not belong to the phase being resolved.
pub(crate) fn out_of_phase_verdict(board: &BoardState, order: &Order, player: PlayerId) -> Verdict {
    match *order {
        Order::Relationship { kind, target } => check_relationship(board, player, kind, target),
        _ => Verdict::Illegal(IllegalReason::WrongPhase),
    }
}
