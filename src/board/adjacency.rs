//! Province graph: map definitions, adjacency, and movement queries.
//!
//! A [`ProvinceGraph`] is built once per map from a [`MapDefinition`] and is
//! read-only afterwards. Land adjacency comes straight from the definition;
//! fleet adjacency of single-coast land provinces is derived from it by the
//! coastal connectivity rules in [`super::coastal`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::coastal::{detect_coastal_connection, CoastalConnectivity};
use super::province::{Coast, FleetAdjacency, Location, Province, ProvinceId, Terrain};
use super::unit::UnitType;

/// Errors raised while building a graph from a map definition.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("duplicate province abbreviation '{0}'")]
    DuplicateProvince(String),

    #[error("unknown province '{0}'")]
    UnknownProvince(String),

    #[error("invalid location '{0}'")]
    InvalidLocation(String),

    #[error("province '{0}' is adjacent to itself")]
    SelfAdjacent(String),

    #[error("province '{0}' declares coasts but is not land")]
    CoastsOnNonLand(String),

    #[error("coast '{coast}' of '{province}' lists '{neighbor}', which is not adjacent")]
    CoastNotAdjacent {
        province: String,
        coast: Coast,
        neighbor: String,
    },

    #[error("map has {0} provinces, more than a graph can index")]
    TooManyProvinces(usize),

    #[error("malformed map definition: {0}")]
    Json(#[from] serde_json::Error),
}

/// One province as written in a map definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvinceDefinition {
    pub abbr: String,
    pub name: String,
    pub terrain: Terrain,
    #[serde(default)]
    pub supply_center: bool,
    /// Explicit per-coast fleet adjacency, keyed by coast. Entries are
    /// location names such as `"mao"` or `"bul/sc"`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub coasts: BTreeMap<Coast, Vec<String>>,
    /// Neighbouring coasts this province must never be fleet-connected to,
    /// even when the derived topology says otherwise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nonadjacent_coasts: Vec<String>,
}

/// A complete map: provinces plus undirected adjacency pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub name: String,
    pub provinces: Vec<ProvinceDefinition>,
    pub adjacencies: Vec<(String, String)>,
}

impl MapDefinition {
    /// Parses a map definition from JSON.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The province graph consumed by every resolver.
#[derive(Debug, Clone)]
pub struct ProvinceGraph {
    name: String,
    provinces: Vec<Province>,
    by_abbr: HashMap<String, ProvinceId>,
    connectivity: CoastalConnectivity,
}

impl ProvinceGraph {
    /// Builds the graph, deriving fleet adjacency for coastal land provinces.
    pub fn from_definition(def: &MapDefinition) -> Result<Self, MapError> {
        if def.provinces.len() > u16::MAX as usize {
            return Err(MapError::TooManyProvinces(def.provinces.len()));
        }

        let mut by_abbr = HashMap::with_capacity(def.provinces.len());
        let mut provinces = Vec::with_capacity(def.provinces.len());
        for (i, pd) in def.provinces.iter().enumerate() {
            let key = pd.abbr.to_ascii_lowercase();
            if by_abbr.insert(key, ProvinceId(i as u16)).is_some() {
                return Err(MapError::DuplicateProvince(pd.abbr.clone()));
            }
            provinces.push(Province {
                abbr: pd.abbr.clone(),
                name: pd.name.clone(),
                terrain: pd.terrain,
                supply_center: pd.supply_center,
                adjacent: BTreeSet::new(),
                impassible_adjacent: BTreeSet::new(),
                fleet: FleetAdjacency::Inland,
            });
        }

        let lookup = |name: &str| -> Result<ProvinceId, MapError> {
            by_abbr
                .get(&name.to_ascii_lowercase())
                .copied()
                .ok_or_else(|| MapError::UnknownProvince(name.to_string()))
        };

        for (a, b) in &def.adjacencies {
            let (a_id, b_id) = (lookup(a)?, lookup(b)?);
            if a_id == b_id {
                return Err(MapError::SelfAdjacent(a.clone()));
            }
            link(&mut provinces, a_id, b_id);
            link(&mut provinces, b_id, a_id);
        }

        // Explicit coasts first: seas need them to know which coast they touch.
        for (i, pd) in def.provinces.iter().enumerate() {
            if pd.coasts.is_empty() {
                continue;
            }
            if pd.terrain != Terrain::Land {
                return Err(MapError::CoastsOnNonLand(pd.abbr.clone()));
            }
            let mut map = BTreeMap::new();
            for (&coast, names) in &pd.coasts {
                let mut set = BTreeSet::new();
                for name in names {
                    let loc = parse_location(&by_abbr, name)?;
                    if !provinces[i].adjacent.contains(&loc.province) {
                        return Err(MapError::CoastNotAdjacent {
                            province: pd.abbr.clone(),
                            coast,
                            neighbor: name.clone(),
                        });
                    }
                    set.insert(loc);
                }
                map.insert(coast, set);
            }
            provinces[i].fleet = FleetAdjacency::Coasts(map);
        }

        for i in 0..provinces.len() {
            if provinces[i].fleet.is_multi_coast() {
                continue;
            }
            let fleet = match provinces[i].terrain {
                Terrain::Sea | Terrain::Island => {
                    FleetAdjacency::Single(open_water_set(&provinces, ProvinceId(i as u16)))
                }
                Terrain::Land => {
                    let set: BTreeSet<Location> = provinces[i]
                        .adjacent
                        .iter()
                        .filter(|q| {
                            matches!(provinces[q.index()].terrain, Terrain::Sea | Terrain::Island)
                        })
                        .map(|&q| Location::new(q))
                        .collect();
                    if set.is_empty() {
                        FleetAdjacency::Inland
                    } else {
                        FleetAdjacency::Single(set)
                    }
                }
                Terrain::Impassible => FleetAdjacency::Inland,
            };
            provinces[i].fleet = fleet;
        }

        let mut excluded: BTreeSet<(ProvinceId, Location)> = BTreeSet::new();
        for (i, pd) in def.provinces.iter().enumerate() {
            for name in &pd.nonadjacent_coasts {
                excluded.insert((ProvinceId(i as u16), parse_location(&by_abbr, name)?));
            }
        }

        let candidates = coastal_candidates(&provinces, &excluded);
        let decisions: Vec<((ProvinceId, ProvinceId, Option<Coast>), bool)> = candidates
            .par_iter()
            .map(|&(p1, p2, coast)| {
                ((p1, p2, coast), detect_coastal_connection(&provinces, p1, p2, coast))
            })
            .collect();

        let mut connectivity = CoastalConnectivity::default();
        for &((p1, p2, coast), connected) in &decisions {
            connectivity.record(p1, p2, coast, connected);
            if !connected {
                continue;
            }
            if let FleetAdjacency::Single(set) = &mut provinces[p1.index()].fleet {
                set.insert(Location { province: p2, coast });
            }
        }

        Ok(ProvinceGraph {
            name: def.name.clone(),
            provinces,
            by_abbr,
            connectivity,
        })
    }

    /// Parses and builds a graph from a JSON map definition.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Self::from_definition(&MapDefinition::from_json(json)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.provinces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.provinces.is_empty()
    }

    /// Iterates over all province ids in index order.
    pub fn ids(&self) -> impl Iterator<Item = ProvinceId> {
        (0..self.provinces.len() as u16).map(ProvinceId)
    }

    pub fn contains(&self, id: ProvinceId) -> bool {
        id.index() < self.provinces.len()
    }

    /// Returns the province with the given id.
    ///
    /// Panics on an id from another graph; callers validate ids first.
    pub fn province(&self, id: ProvinceId) -> &Province {
        &self.provinces[id.index()]
    }

    /// Looks up a province by abbreviation (case-insensitive).
    pub fn id(&self, abbr: &str) -> Option<ProvinceId> {
        self.by_abbr.get(&abbr.to_ascii_lowercase()).copied()
    }

    /// Parses `"abbr"` or `"abbr/coast"` into a location.
    pub fn location(&self, name: &str) -> Option<Location> {
        parse_location(&self.by_abbr, name).ok()
    }

    /// Cached coastal-connectivity decisions made while building the graph.
    pub fn connectivity(&self) -> &CoastalConnectivity {
        &self.connectivity
    }

    pub fn terrain(&self, id: ProvinceId) -> Terrain {
        self.provinces[id.index()].terrain
    }

    pub fn is_supply_center(&self, id: ProvinceId) -> bool {
        self.provinces[id.index()].supply_center
    }

    pub fn is_multi_coast(&self, id: ProvinceId) -> bool {
        self.provinces[id.index()].fleet.is_multi_coast()
    }

    pub fn coasts(&self, id: ProvinceId) -> Vec<Coast> {
        self.provinces[id.index()].fleet.coasts()
    }

    /// Passable land adjacency between two provinces.
    pub fn is_adjacent(&self, a: ProvinceId, b: ProvinceId) -> bool {
        self.provinces[a.index()].adjacent.contains(&b)
    }

    /// Drops a coast the province does not have.
    pub fn normalize(&self, loc: Location) -> Location {
        match loc.coast {
            Some(c) if self.coasts(loc.province).contains(&c) => loc,
            _ => Location::new(loc.province),
        }
    }

    /// Returns true if an army can move directly from `from` to `to`.
    pub fn army_can_reach(&self, from: ProvinceId, to: ProvinceId) -> bool {
        self.is_adjacent(from, to) && self.terrain(to).army_can_occupy()
    }

    /// Returns true if a fleet can move directly between two exact locations.
    ///
    /// Multi-coast endpoints must name their coast. The edge may be recorded
    /// on either side.
    pub fn fleet_can_reach(&self, from: Location, to: Location) -> bool {
        let from_set = self.provinces[from.province.index()].fleet.for_coast(from.coast);
        let to_set = self.provinces[to.province.index()].fleet.for_coast(to.coast);
        match (from_set, to_set) {
            (Some(fs), Some(ts)) => fs.contains(&to) || ts.contains(&from),
            _ => false,
        }
    }

    /// Every location of `to` a fleet at `from` can reach directly.
    pub fn fleet_coasts_reaching(&self, from: Location, to: ProvinceId) -> Vec<Location> {
        if self.is_multi_coast(to) {
            self.coasts(to)
                .into_iter()
                .map(|c| Location::with_coast(to, c))
                .filter(|&loc| self.fleet_can_reach(from, loc))
                .collect()
        } else {
            let loc = Location::new(to);
            if self.fleet_can_reach(from, loc) {
                vec![loc]
            } else {
                Vec::new()
            }
        }
    }

    /// Whether a unit at `from` could move into `to`, ignoring coasts on
    /// the destination. This is the reach test for supports.
    pub fn can_reach_province(&self, unit_type: UnitType, from: Location, to: ProvinceId) -> bool {
        match unit_type {
            UnitType::Army => self.army_can_reach(from.province, to),
            UnitType::Fleet => !self.fleet_coasts_reaching(from, to).is_empty(),
        }
    }

    /// All locations a unit at `from` can move to in one step.
    pub fn moves_from(&self, unit_type: UnitType, from: Location) -> Vec<Location> {
        let mut out = Vec::new();
        for &q in &self.provinces[from.province.index()].adjacent {
            match unit_type {
                UnitType::Army => {
                    if self.terrain(q).army_can_occupy() {
                        out.push(Location::new(q));
                    }
                }
                UnitType::Fleet => out.extend(self.fleet_coasts_reaching(from, q)),
            }
        }
        out
    }
}

fn link(provinces: &mut [Province], from: ProvinceId, to: ProvinceId) {
    if provinces[to.index()].terrain.is_passable() {
        provinces[from.index()].adjacent.insert(to);
    } else {
        provinces[from.index()].impassible_adjacent.insert(to);
    }
}

/// Fleet set of a sea or island: every passable neighbour, with the matching
/// coast for multi-coast neighbours that list this province.
fn open_water_set(provinces: &[Province], id: ProvinceId) -> BTreeSet<Location> {
    let mut set = BTreeSet::new();
    for &q in &provinces[id.index()].adjacent {
        match &provinces[q.index()].fleet {
            FleetAdjacency::Coasts(map) => {
                for (&coast, coast_set) in map {
                    if coast_set.contains(&Location::new(id)) {
                        set.insert(Location::with_coast(q, coast));
                    }
                }
            }
            _ => {
                set.insert(Location::new(q));
            }
        }
    }
    set
}

/// Land-to-land pairs whose fleet connection must be decided by topology.
fn coastal_candidates(
    provinces: &[Province],
    excluded: &BTreeSet<(ProvinceId, Location)>,
) -> Vec<(ProvinceId, ProvinceId, Option<Coast>)> {
    let mut out = Vec::new();
    for (i, p1) in provinces.iter().enumerate() {
        let p1_id = ProvinceId(i as u16);
        if p1.terrain != Terrain::Land || !matches!(p1.fleet, FleetAdjacency::Single(_)) {
            continue;
        }
        for &p2_id in &p1.adjacent {
            let p2 = &provinces[p2_id.index()];
            if p2.terrain != Terrain::Land || !p2.fleet.is_coastal() {
                continue;
            }
            let coasts: Vec<Option<Coast>> = if p2.fleet.is_multi_coast() {
                p2.fleet.coasts().into_iter().map(Some).collect()
            } else {
                vec![None]
            };
            for coast in coasts {
                let target = Location { province: p2_id, coast };
                if excluded.contains(&(p1_id, target)) {
                    continue;
                }
                out.push((p1_id, p2_id, coast));
            }
        }
    }
    out
}

fn parse_location(by_abbr: &HashMap<String, ProvinceId>, name: &str) -> Result<Location, MapError> {
    let (prov, coast) = match name.split_once('/') {
        Some((p, c)) => {
            let coast = Coast::from_abbr(&c.to_ascii_lowercase())
                .ok_or_else(|| MapError::InvalidLocation(name.to_string()))?;
            (p, Some(coast))
        }
        None => (name, None),
    };
    let province = by_abbr
        .get(&prov.to_ascii_lowercase())
        .copied()
        .ok_or_else(|| MapError::UnknownProvince(prov.to_string()))?;
    Ok(Location { province, coast })
}
