//! Order types for all phases.
//!
//! Orders arrive already parsed and target-resolved: every unit is named by
//! the province it stands in, every destination by a [`Location`]. The
//! engine never sees free text.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::province::{Location, ProvinceId};
use super::state::Phase;
use super::unit::UnitType;

/// Diplomatic relationship orders. They name a player instead of a province.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Vassalize,
    Liege,
    DualMonarchy,
    Disown,
    Defect,
}

/// An order covering all three phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Order {
    /// `A vie H`
    Hold { unit: ProvinceId },

    /// Claims the supply center the unit stands on.
    Core { unit: ProvinceId },

    /// `A bud - rum`, `F nrg - stp/nc`, or `A lon - bel via convoy`
    Move {
        unit: ProvinceId,
        dest: Location,
        #[serde(default)]
        via_convoy: bool,
    },

    /// `A tyr S A vie`
    SupportHold { unit: ProvinceId, supported: ProvinceId },

    /// `A gal S A bud - rum`
    SupportMove {
        unit: ProvinceId,
        supported: ProvinceId,
        dest: Location,
    },

    /// `F mao C A bre - spa`
    Convoy {
        unit: ProvinceId,
        convoyed_from: ProvinceId,
        convoyed_to: ProvinceId,
    },

    /// `A vie R boh`
    Retreat { unit: ProvinceId, dest: Location },

    /// `F tri D` during a retreat phase.
    RetreatDisband { unit: ProvinceId },

    /// `A vie B` or `F stp/sc B`
    Build { location: Location, unit_type: UnitType },

    /// `A war D` during an adjustment phase.
    Disband { unit: ProvinceId },

    /// Voluntarily skips `count` builds.
    Waive { count: u8 },

    Relationship { kind: RelationshipKind, target: PlayerId },
}

impl Order {
    /// The phase this order belongs to, or `None` for orders valid in any phase.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Order::Hold { .. }
            | Order::Core { .. }
            | Order::Move { .. }
            | Order::SupportHold { .. }
            | Order::SupportMove { .. }
            | Order::Convoy { .. } => Some(Phase::Movement),
            Order::Retreat { .. } | Order::RetreatDisband { .. } => Some(Phase::Retreat),
            Order::Build { .. } | Order::Disband { .. } | Order::Waive { .. } => Some(Phase::Build),
            Order::Relationship { .. } => None,
        }
    }

    /// The province of the acting unit, for orders that have one.
    pub fn unit(&self) -> Option<ProvinceId> {
        match *self {
            Order::Hold { unit }
            | Order::Core { unit }
            | Order::Move { unit, .. }
            | Order::SupportHold { unit, .. }
            | Order::SupportMove { unit, .. }
            | Order::Convoy { unit, .. }
            | Order::Retreat { unit, .. }
            | Order::RetreatDisband { unit }
            | Order::Disband { unit } => Some(unit),
            Order::Build { .. } | Order::Waive { .. } | Order::Relationship { .. } => None,
        }
    }

    /// Every province the order mentions.
    pub fn provinces(&self) -> Vec<ProvinceId> {
        match *self {
            Order::Hold { unit }
            | Order::Core { unit }
            | Order::RetreatDisband { unit }
            | Order::Disband { unit } => vec![unit],
            Order::Move { unit, dest, .. } | Order::Retreat { unit, dest } => vec![unit, dest.province],
            Order::SupportHold { unit, supported } => vec![unit, supported],
            Order::SupportMove { unit, supported, dest } => vec![unit, supported, dest.province],
            Order::Convoy {
                unit,
                convoyed_from,
                convoyed_to,
            } => vec![unit, convoyed_from, convoyed_to],
            Order::Build { location, .. } => vec![location.province],
            Order::Waive { .. } | Order::Relationship { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::province::Coast;

    #[test]
    fn phases_by_variant() {
        let p = ProvinceId(1);
        assert_eq!(Order::Core { unit: p }.phase(), Some(Phase::Movement));
        assert_eq!(Order::RetreatDisband { unit: p }.phase(), Some(Phase::Retreat));
        assert_eq!(Order::Waive { count: 1 }.phase(), Some(Phase::Build));
        let rel = Order::Relationship {
            kind: RelationshipKind::Defect,
            target: PlayerId(0),
        };
        assert_eq!(rel.phase(), None);
    }

    #[test]
    fn acting_unit() {
        let p = ProvinceId(4);
        let mv = Order::Move {
            unit: p,
            dest: Location::new(ProvinceId(5)),
            via_convoy: false,
        };
        assert_eq!(mv.unit(), Some(p));
        let build = Order::Build {
            location: Location::new(p),
            unit_type: UnitType::Army,
        };
        assert_eq!(build.unit(), None);
        assert_eq!(build.provinces(), vec![p]);
    }

    #[test]
    fn serde_uses_tagged_form() {
        let order = Order::Move {
            unit: ProvinceId(3),
            dest: Location::with_coast(ProvinceId(9), Coast::North),
            via_convoy: false,
        };
        let json = serde_json::to_string(&order).unwrap();
        assert!(json.contains("\"type\":\"move\""));
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(back, order);

        let parsed: Order = serde_json::from_str(r#"{"type":"move","unit":1,"dest":{"province":2}}"#).unwrap();
        assert_eq!(
            parsed,
            Order::Move {
                unit: ProvinceId(1),
                dest: Location::new(ProvinceId(2)),
                via_convoy: false
            }
        );
    }
}
