//! Relationship orders.
//!
//! Vassal and liege declarations are checked for legality only. What a
//! legal declaration does to the diplomatic state is up to the game layer.

use crate::board::{BoardState, PlayerId, RelationshipKind};

use super::{IllegalReason, Verdict};

/// Checks a relationship order issued by `issuer` against the registry.
pub fn check_relationship(
    board: &BoardState,
    issuer: PlayerId,
    kind: RelationshipKind,
    target: PlayerId,
) -> Verdict {
    let (Some(from), Some(to)) = (board.player(issuer), board.player(target)) else {
        return Verdict::Illegal(IllegalReason::InvalidRelationship);
    };
    let legal = issuer != target
        && match kind {
            RelationshipKind::Defect => from.liege.is_some(),
            RelationshipKind::Disown => to.liege == Some(issuer),
            RelationshipKind::Vassalize | RelationshipKind::Liege | RelationshipKind::DualMonarchy => true,
        };
    if legal {
        Verdict::Succeeds
    } else {
        Verdict::Illegal(IllegalReason::InvalidRelationship)
    }
}
