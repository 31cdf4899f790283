//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use arbiter::board::{BoardState, Location, Order, Phase, PlayerId, ProvinceGraph, ProvinceId, Season, Turn, UnitType};
use arbiter::maps::classic;
use arbiter::resolve::{resolve_movement, resolve_retreats, MovementOutcome, OrderVerdict, RetreatOutcome, Verdict};

/// An empty classic board in Spring 1901 plus the orders given so far.
pub struct Game {
    pub graph: ProvinceGraph,
    pub board: BoardState,
    pub orders: Vec<(Order, PlayerId)>,
}

impl Game {
    pub fn new() -> Self {
        let graph = classic::graph();
        let board = BoardState::empty(&graph, Turn::new(1901, Season::Spring, Phase::Movement), classic::players());
        Game {
            graph,
            board,
            orders: Vec::new(),
        }
    }

    pub fn id(&self, name: &str) -> ProvinceId {
        self.graph.id(name).unwrap_or_else(|| panic!("unknown province {name}"))
    }

    pub fn loc(&self, name: &str) -> Location {
        self.graph.location(name).unwrap_or_else(|| panic!("unknown location {name}"))
    }

    pub fn army(&mut self, player: PlayerId, at: &str) {
        let loc = self.loc(at);
        assert!(self.board.place_unit(loc, player, UnitType::Army), "{at} occupied");
    }

    pub fn fleet(&mut self, player: PlayerId, at: &str) {
        let loc = self.loc(at);
        assert!(self.board.place_unit(loc, player, UnitType::Fleet), "{at} occupied");
    }

    pub fn order(&mut self, player: PlayerId, order: Order) {
        self.orders.push((order, player));
    }

    pub fn hold(&mut self, player: PlayerId, at: &str) {
        let unit = self.id(at);
        self.order(player, Order::Hold { unit });
    }

    pub fn mv(&mut self, player: PlayerId, from: &str, to: &str) {
        self.move_with(player, from, to, false);
    }

    pub fn mv_convoy(&mut self, player: PlayerId, from: &str, to: &str) {
        self.move_with(player, from, to, true);
    }

    fn move_with(&mut self, player: PlayerId, from: &str, to: &str, via_convoy: bool) {
        let (unit, dest) = (self.id(from), self.loc(to));
        self.order(player, Order::Move { unit, dest, via_convoy });
    }

    pub fn support_hold(&mut self, player: PlayerId, at: &str, supported: &str) {
        let (unit, supported) = (self.id(at), self.id(supported));
        self.order(player, Order::SupportHold { unit, supported });
    }

    pub fn support_move(&mut self, player: PlayerId, at: &str, from: &str, to: &str) {
        let (unit, supported, dest) = (self.id(at), self.id(from), self.loc(to));
        self.order(player, Order::SupportMove { unit, supported, dest });
    }

    pub fn convoy(&mut self, player: PlayerId, at: &str, from: &str, to: &str) {
        let (unit, convoyed_from, convoyed_to) = (self.id(at), self.id(from), self.id(to));
        self.order(
            player,
            Order::Convoy {
                unit,
                convoyed_from,
                convoyed_to,
            },
        );
    }

    pub fn resolve(&self) -> MovementOutcome {
        resolve_movement(&self.graph, &self.board, &self.orders).expect("movement resolves")
    }

    pub fn retreat(&self, from: &str, to: &str) -> Order {
        Order::Retreat {
            unit: self.id(from),
            dest: self.loc(to),
        }
    }

    /// Runs the retreat phase that follows `out`.
    pub fn resolve_retreats(&self, out: &MovementOutcome, orders: &[(Order, PlayerId)]) -> RetreatOutcome {
        let mut board = out.board.clone();
        board.turn = Turn::new(1901, Season::Spring, Phase::Retreat);
        resolve_retreats(&self.graph, &board, orders).expect("retreats resolve")
    }
}

/// The verdict of the order given to the unit at `at`.
pub fn verdict(verdicts: &[OrderVerdict], g: &Game, at: &str) -> Verdict {
    let p = g.id(at);
    verdicts
        .iter()
        .find(|v| v.order.unit() == Some(p))
        .map(|v| v.verdict)
        .unwrap_or_else(|| panic!("no order for {at}"))
}

pub fn is_dislodged(out: &MovementOutcome, g: &Game, at: &str) -> bool {
    out.dislodged.iter().any(|d| d.province == g.id(at))
}

pub fn retreat_options(out: &MovementOutcome, g: &Game, at: &str) -> Vec<Location> {
    out.dislodged
        .iter()
        .find(|d| d.province == g.id(at))
        .map(|d| d.retreat_options.iter().copied().collect())
        .unwrap_or_else(|| panic!("{at} was not dislodged"))
}
