//! Unit types and ownership.
//!
//! Represents armies and fleets, their owning player, and their current
//! location on the board.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::province::Location;

/// The type of a military unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Army,
    Fleet,
}

impl UnitType {
    /// Returns the uppercase abbreviation used in order notation.
    pub const fn abbr(self) -> char {
        match self {
            UnitType::Army => 'A',
            UnitType::Fleet => 'F',
        }
    }
}

/// A military unit on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub unit_type: UnitType,
    pub owner: PlayerId,
    pub location: Location,
    /// Legal retreat destinations. Present only while dislodged; an empty set
    /// means the unit has nowhere to go.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retreat_options: Option<BTreeSet<Location>>,
}

impl Unit {
    pub fn new(unit_type: UnitType, owner: PlayerId, location: Location) -> Self {
        Unit {
            unit_type,
            owner,
            location,
            retreat_options: None,
        }
    }

    pub fn is_army(&self) -> bool {
        self.unit_type == UnitType::Army
    }

    pub fn is_fleet(&self) -> bool {
        self.unit_type == UnitType::Fleet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::province::ProvinceId;

    #[test]
    fn new_unit_is_not_dislodged() {
        let u = Unit::new(UnitType::Fleet, PlayerId(2), Location::new(ProvinceId(5)));
        assert!(u.is_fleet());
        assert!(!u.is_army());
        assert!(u.retreat_options.is_none());
    }

    #[test]
    fn unit_type_abbreviations() {
        assert_eq!(UnitType::Army.abbr(), 'A');
        assert_eq!(UnitType::Fleet.abbr(), 'F');
    }
}
