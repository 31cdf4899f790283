//! Province identity, terrain, coasts, and locations.
//!
//! Only static map data lives here. Ownership, cores, and units belong to
//! [`BoardState`](super::state::BoardState) so a single graph can serve any
//! number of boards.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense index of a province within its [`ProvinceGraph`](super::ProvinceGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvinceId(pub u16);

impl ProvinceId {
    /// Returns the index into per-province tables.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProvinceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The terrain kind of a province.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Land,
    Island,
    Sea,
    /// Never entered by units. Kept in the graph so coastline topology
    /// around it stays intact.
    Impassible,
}

impl Terrain {
    pub const fn is_passable(self) -> bool {
        !matches!(self, Terrain::Impassible)
    }

    /// Armies may stand on land and islands.
    pub const fn army_can_occupy(self) -> bool {
        matches!(self, Terrain::Land | Terrain::Island)
    }
}

/// A named coast of a multi-coast province.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Coast {
    #[serde(rename = "nc")]
    North,
    #[serde(rename = "sc")]
    South,
    #[serde(rename = "ec")]
    East,
    #[serde(rename = "wc")]
    West,
}

impl Coast {
    pub const ALL: [Coast; 4] = [Coast::North, Coast::South, Coast::East, Coast::West];

    /// Returns the two-letter abbreviation (`nc`, `sc`, `ec`, `wc`).
    pub const fn abbr(self) -> &'static str {
        match self {
            Coast::North => "nc",
            Coast::South => "sc",
            Coast::East => "ec",
            Coast::West => "wc",
        }
    }

    /// Parses a coast from its two-letter abbreviation.
    pub fn from_abbr(s: &str) -> Option<Coast> {
        match s {
            "nc" => Some(Coast::North),
            "sc" => Some(Coast::South),
            "ec" => Some(Coast::East),
            "wc" => Some(Coast::West),
            _ => None,
        }
    }
}

impl fmt::Display for Coast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbr())
    }
}

/// A location on the board: a province with an optional coast specifier.
///
/// The coast is only meaningful for fleets in multi-coast provinces; the
/// graph normalizes it away everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub province: ProvinceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coast: Option<Coast>,
}

impl Location {
    /// Creates a location without a coast.
    pub const fn new(province: ProvinceId) -> Self {
        Self { province, coast: None }
    }

    /// Creates a location with a coast specifier.
    pub const fn with_coast(province: ProvinceId, coast: Coast) -> Self {
        Self { province, coast: Some(coast) }
    }
}

impl From<ProvinceId> for Location {
    fn from(province: ProvinceId) -> Self {
        Location::new(province)
    }
}

/// Fleet adjacency of a province.
///
/// Multi-coast provinces carry one set per coast, assigned explicitly by the
/// map definition. Everything else has a flat set or none at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FleetAdjacency {
    /// Landlocked: fleets can neither enter nor leave.
    Inland,
    Single(BTreeSet<Location>),
    Coasts(BTreeMap<Coast, BTreeSet<Location>>),
}

impl FleetAdjacency {
    pub fn is_coastal(&self) -> bool {
        !matches!(self, FleetAdjacency::Inland)
    }

    pub fn is_multi_coast(&self) -> bool {
        matches!(self, FleetAdjacency::Coasts(_))
    }

    /// Returns the fleet neighbours of one coast, or of the whole province when
    /// `coast` is `None` and the province has a single coastline.
    pub fn for_coast(&self, coast: Option<Coast>) -> Option<&BTreeSet<Location>> {
        match (self, coast) {
            (FleetAdjacency::Single(set), None) => Some(set),
            (FleetAdjacency::Coasts(map), Some(c)) => map.get(&c),
            _ => None,
        }
    }

    /// Returns the named coasts, empty unless multi-coast.
    pub fn coasts(&self) -> Vec<Coast> {
        match self {
            FleetAdjacency::Coasts(map) => map.keys().copied().collect(),
            _ => Vec::new(),
        }
    }
}

/// Static metadata for one province.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub abbr: String,
    pub name: String,
    pub terrain: Terrain,
    pub supply_center: bool,
    /// Passable neighbours.
    pub adjacent: BTreeSet<ProvinceId>,
    /// Impassible neighbours, consulted only when deriving coastlines.
    pub impassible_adjacent: BTreeSet<ProvinceId>,
    pub fleet: FleetAdjacency,
}

impl Province {
    /// Iterates over every neighbour, passable or not.
    pub fn neighbors(&self) -> impl Iterator<Item = ProvinceId> + '_ {
        self.adjacent.iter().chain(self.impassible_adjacent.iter()).copied()
    }
}
