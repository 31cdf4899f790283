//! Coastal connectivity ("ring detection").
//!
//! Two coastal land provinces that border each other are fleet-adjacent only
//! if their shared coastline actually touches a common body of water. The
//! test looks for a tripoint: a sea or island that both provinces touch. The
//! provinces surrounding the three of them are merged into connected groups;
//! a single group enclosing all three means the coastline runs unbroken past
//! the tripoint, two groups mean the provinces face opposite shores.

use std::collections::{BTreeMap, BTreeSet};

use super::province::{Coast, Location, Province, ProvinceId, Terrain};

/// Connectivity decisions recorded once at load time, keyed by
/// `(from, to, coast of to)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoastalConnectivity {
    decisions: BTreeMap<(ProvinceId, ProvinceId, Option<Coast>), bool>,
}

impl CoastalConnectivity {
    pub(crate) fn record(&mut self, from: ProvinceId, to: ProvinceId, coast: Option<Coast>, connected: bool) {
        self.decisions.insert((from, to, coast), connected);
    }

    /// Returns the cached decision, or `None` if the pair was never a candidate.
    pub fn get(&self, from: ProvinceId, to: ProvinceId, coast: Option<Coast>) -> Option<bool> {
        self.decisions.get(&(from, to, coast)).copied()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(ProvinceId, ProvinceId, Option<Coast>), &bool)> {
        self.decisions.iter()
    }
}

/// Decides whether a fleet can sail from `p1` to `p2` (at `coast`, for
/// multi-coast `p2`) along their shared coastline.
///
/// `p1` must have a single fleet set. An ambiguous ring count is logged and
/// the next tripoint is tried; with no tripoint left the answer is `false`.
pub(crate) fn detect_coastal_connection(
    provinces: &[Province],
    p1: ProvinceId,
    p2: ProvinceId,
    coast: Option<Coast>,
) -> bool {
    let (Some(s1), Some(s2)) = (
        provinces[p1.index()].fleet.for_coast(None),
        provinces[p2.index()].fleet.for_coast(coast),
    ) else {
        return false;
    };

    let tripoints: BTreeSet<ProvinceId> = s1
        .intersection(s2)
        .map(|loc: &Location| loc.province)
        .filter(|t| provinces[t.index()].terrain != Terrain::Land)
        .collect();

    for t in tripoints {
        let degree = |id: ProvinceId| provinces[id.index()].adjacent.len();
        if degree(t).min(degree(p1)).min(degree(p2)) == 2 {
            return true;
        }

        let rings = count_rings(provinces, p1, p2, t);
        match rings {
            1 => return true,
            2 => {}
            _ => tracing::warn!(
                from = %provinces[p1.index()].abbr,
                to = %provinces[p2.index()].abbr,
                coast = ?coast,
                tripoint = %provinces[t.index()].abbr,
                rings,
                "expected one or two rings around tripoint"
            ),
        }
    }

    false
}

/// Counts groups of surrounding provinces that touch all of `p1`, `p2`, `t`.
fn count_rings(provinces: &[Province], p1: ProvinceId, p2: ProvinceId, t: ProvinceId) -> usize {
    let seeds: Vec<ProvinceId> = [p1, p2, t]
        .iter()
        .flat_map(|&id| provinces[id.index()].neighbors())
        .filter(|id| *id != p1 && *id != p2 && *id != t)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let slot: BTreeMap<ProvinceId, usize> = seeds.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let mut sets = DisjointSet::new(seeds.len());
    for (i, &id) in seeds.iter().enumerate() {
        for n in provinces[id.index()].neighbors() {
            if let Some(&j) = slot.get(&n) {
                sets.union(i, j);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<ProvinceId>> = BTreeMap::new();
    for (i, &id) in seeds.iter().enumerate() {
        groups.entry(sets.find(i)).or_default().push(id);
    }

    groups
        .values()
        .filter(|members| {
            [p1, p2, t].iter().all(|target| {
                members
                    .iter()
                    .any(|m| provinces[m.index()].neighbors().any(|n| n == *target))
            })
        })
        .count()
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        DisjointSet { parent: (0..n).collect() }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}
