//! Game state representation.
//!
//! Holds the complete snapshot of a game at a given point in time: the turn,
//! the player registry, and per-province ownership, cores, and units.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::adjacency::ProvinceGraph;
use super::player::{Player, PlayerId};
use super::province::{Location, ProvinceId};
use super::unit::{Unit, UnitType};

/// The season of a game turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Fall,
}

/// The phase within a game turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Movement,
    Retreat,
    Build,
}

/// Year, season, and phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    pub year: u16,
    pub season: Season,
    pub phase: Phase,
}

impl Turn {
    pub const fn new(year: u16, season: Season, phase: Phase) -> Self {
        Turn { year, season, phase }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} {:?}", self.season, self.year, self.phase)
    }
}

/// Invariant violations in a board snapshot. These abort adjudication.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("board has {found} provinces, map has {expected}")]
    ProvinceCount { expected: usize, found: usize },

    #[error("unit in slot {slot} claims to stand in {claimed}")]
    MisplacedUnit { slot: ProvinceId, claimed: ProvinceId },

    #[error("unit at {0} carries a coast its province does not have")]
    InvalidCoast(ProvinceId),

    #[error("unit at {0} stands on terrain it cannot occupy")]
    InvalidTerrain(ProvinceId),

    #[error("{0} is not a registered player")]
    UnknownPlayer(PlayerId),
}

/// Dynamic state of one province.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvinceState {
    pub owner: Option<PlayerId>,
    /// Full sovereign claim; grants build rights.
    pub core: Option<PlayerId>,
    /// Partial claim awaiting a second core order.
    pub half_core: Option<PlayerId>,
    pub unit: Option<Unit>,
    pub dislodged: Option<Unit>,
}

/// Complete board state at a point in time.
///
/// `provinces` is indexed by [`ProvinceId`] and always has one entry per
/// province of the graph the board was created for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    pub turn: Turn,
    pub players: Vec<Player>,
    pub provinces: Vec<ProvinceState>,
}

impl BoardState {
    /// Creates an empty board with no units or ownership.
    pub fn empty(graph: &ProvinceGraph, turn: Turn, players: Vec<Player>) -> Self {
        BoardState {
            turn,
            players,
            provinces: vec![ProvinceState::default(); graph.len()],
        }
    }

    pub fn province(&self, id: ProvinceId) -> &ProvinceState {
        &self.provinces[id.index()]
    }

    pub fn province_mut(&mut self, id: ProvinceId) -> &mut ProvinceState {
        &mut self.provinces[id.index()]
    }

    pub fn unit_at(&self, id: ProvinceId) -> Option<&Unit> {
        self.provinces.get(id.index()).and_then(|p| p.unit.as_ref())
    }

    pub fn dislodged_at(&self, id: ProvinceId) -> Option<&Unit> {
        self.provinces.get(id.index()).and_then(|p| p.dislodged.as_ref())
    }

    /// Places a unit on the board. Returns false if the province is already occupied.
    pub fn place_unit(&mut self, location: Location, owner: PlayerId, unit_type: UnitType) -> bool {
        let slot = &mut self.provinces[location.province.index()];
        if slot.unit.is_some() {
            return false;
        }
        slot.unit = Some(Unit::new(unit_type, owner, location));
        true
    }

    pub fn set_owner(&mut self, id: ProvinceId, owner: Option<PlayerId>) {
        self.provinces[id.index()].owner = owner;
    }

    pub fn set_core(&mut self, id: ProvinceId, core: Option<PlayerId>) {
        self.provinces[id.index()].core = core;
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.index())
    }

    pub fn has_player(&self, id: PlayerId) -> bool {
        id.index() < self.players.len()
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        (0..self.players.len() as u16).map(PlayerId)
    }

    /// Iterates over active (non-dislodged) units.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.provinces.iter().filter_map(|p| p.unit.as_ref())
    }

    pub fn dislodged_units(&self) -> impl Iterator<Item = &Unit> {
        self.provinces.iter().filter_map(|p| p.dislodged.as_ref())
    }

    pub fn unit_count(&self, player: PlayerId) -> usize {
        self.units().filter(|u| u.owner == player).count()
    }

    /// Counts the supply centers owned by `player`.
    pub fn supply_center_count(&self, graph: &ProvinceGraph, player: PlayerId) -> usize {
        graph
            .ids()
            .filter(|&id| graph.is_supply_center(id) && self.province(id).owner == Some(player))
            .count()
    }

    /// Checks the snapshot against the graph it is meant for.
    pub fn validate(&self, graph: &ProvinceGraph) -> Result<(), BoardError> {
        if self.provinces.len() != graph.len() {
            return Err(BoardError::ProvinceCount {
                expected: graph.len(),
                found: self.provinces.len(),
            });
        }

        for (id, ps) in graph.ids().zip(&self.provinces) {
            for claim in [ps.owner, ps.core, ps.half_core].into_iter().flatten() {
                if !self.has_player(claim) {
                    return Err(BoardError::UnknownPlayer(claim));
                }
            }
            for unit in [&ps.unit, &ps.dislodged].into_iter().flatten() {
                if unit.location.province != id {
                    return Err(BoardError::MisplacedUnit {
                        slot: id,
                        claimed: unit.location.province,
                    });
                }
                if !self.has_player(unit.owner) {
                    return Err(BoardError::UnknownPlayer(unit.owner));
                }
                check_unit_placement(graph, unit)?;
            }
        }

        for p in &self.players {
            if let Some(liege) = p.liege {
                if !self.has_player(liege) {
                    return Err(BoardError::UnknownPlayer(liege));
                }
            }
        }
        Ok(())
    }
}

fn check_unit_placement(graph: &ProvinceGraph, unit: &Unit) -> Result<(), BoardError> {
    let id = unit.location.province;
    let ok = match unit.unit_type {
        UnitType::Army => graph.terrain(id).army_can_occupy(),
        UnitType::Fleet => graph.province(id).fleet.is_coastal(),
    };
    if !ok {
        return Err(BoardError::InvalidTerrain(id));
    }

    let coast_ok = match unit.location.coast {
        None => unit.is_army() || !graph.is_multi_coast(id),
        Some(c) => unit.is_fleet() && graph.coasts(id).contains(&c),
    };
    if !coast_ok {
        return Err(BoardError::InvalidCoast(id));
    }
    Ok(())
}
