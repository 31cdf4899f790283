//! Kruijswijk guess-and-check resolution of the movement phase.
//!
//! Every unit on the board gets one [`AdjudicableOrder`] in a flat arena;
//! supports and convoys point back at the order they back by index.
//! Resolution is demand driven: [`Resolver::resolve`] recurses into the
//! orders a decision depends on and records on `dep_list` every order whose
//! *guessed* value was consulted. An order that ends up depending on its own
//! guess is adjudicated under both guesses. If the two runs agree the answer
//! stands; otherwise the cycle is a paradox and the backup rule settles it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::board::{
    BoardState, Location, Order, Phase, PlayerId, ProvinceGraph, ProvinceId, Terrain, Unit, UnitType,
};

use super::{check_submissions, out_of_phase_verdict, AdjudicationError, IllegalReason, OrderVerdict, Verdict};

/// Where an order stands in the guess-and-check process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    Guessing,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Succeeds,
    Fails,
}

impl Resolution {
    pub fn succeeded(self) -> bool {
        self == Resolution::Succeeds
    }

    fn from_bool(ok: bool) -> Self {
        if ok {
            Resolution::Succeeds
        } else {
            Resolution::Fails
        }
    }
}

/// The behaviour an order has during resolution. Illegal orders are
/// downgraded to `Hold` before resolution starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Hold,
    Core,
    Move,
    SupportHold,
    SupportMove,
    Convoy,
}

/// One unit's order for the phase, in resolvable form.
#[derive(Debug, Clone)]
pub struct AdjudicableOrder {
    pub player: PlayerId,
    pub unit_type: UnitType,
    pub location: Location,
    pub kind: OrderKind,
    /// Where the unit ends up on success; its own location for non-moves.
    /// For supports and convoys, the province the backed unit is headed to.
    pub destination: Location,
    /// For supports and convoys, the backed unit's location. Otherwise the
    /// unit's own location.
    pub source: Location,
    pub via_convoy: bool,
    /// The move travels by sea rather than across a land border.
    pub convoyed: bool,
    /// Minimal fleet chains that could carry a convoyed move, shortest first.
    pub routes: Vec<Vec<usize>>,
    pub state: ResolutionState,
    pub resolution: Resolution,
    /// Set on illegal moves: the unit still holds but cannot receive support.
    pub not_supportable: bool,
    /// Where an illegal move was headed before it was demoted to a hold.
    pub intended: Option<Location>,
    pub is_valid: bool,
    pub illegal: Option<IllegalReason>,
    /// Support orders backing this one.
    pub supports: Vec<usize>,
    /// Convoy orders carrying this one.
    pub convoys: Vec<usize>,
    /// An order was submitted for this unit.
    pub ordered: bool,
}

impl AdjudicableOrder {
    /// The default order for a unit nobody gave orders to.
    pub fn hold(unit: &Unit) -> Self {
        AdjudicableOrder {
            player: unit.owner,
            unit_type: unit.unit_type,
            location: unit.location,
            kind: OrderKind::Hold,
            destination: unit.location,
            source: unit.location,
            via_convoy: false,
            convoyed: false,
            routes: Vec::new(),
            state: ResolutionState::Unresolved,
            resolution: Resolution::Fails,
            not_supportable: false,
            intended: None,
            is_valid: true,
            illegal: None,
            supports: Vec::new(),
            convoys: Vec::new(),
            ordered: false,
        }
    }

    fn is_move(&self) -> bool {
        self.kind == OrderKind::Move
    }
}

/// A unit forced out of its province.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DislodgedUnit {
    pub province: ProvinceId,
    pub unit_type: UnitType,
    pub owner: PlayerId,
    pub attacker_from: ProvinceId,
    pub retreat_options: BTreeSet<Location>,
}

/// Everything a movement phase produces.
#[derive(Debug, Clone)]
pub struct MovementOutcome {
    /// One entry per submitted order, in submission order.
    pub verdicts: Vec<OrderVerdict>,
    pub dislodged: Vec<DislodgedUnit>,
    /// Provinces left vacant by a standoff. Nobody may retreat there.
    pub contested: BTreeSet<ProvinceId>,
    pub board: BoardState,
    /// Units left without orders, per owner.
    pub missing: BTreeMap<PlayerId, usize>,
}

enum Attachment {
    Decided(Verdict),
    Unit(usize),
}

/// Movement-phase resolver for one board and one order set.
pub struct Resolver<'a> {
    graph: &'a ProvinceGraph,
    board: &'a BoardState,
    orders: Vec<AdjudicableOrder>,
    /// Province index to arena index of the unit standing there.
    lookup: Vec<Option<usize>>,
    moves_into: Vec<Vec<usize>>,
    dep_list: Vec<usize>,
    submitted: Vec<(Order, PlayerId, Attachment)>,
}

impl<'a> Resolver<'a> {
    /// Wraps every unit and runs the legality passes. Submissions are
    /// assumed to have passed [`check_submissions`].
    pub fn new(graph: &'a ProvinceGraph, board: &'a BoardState, submissions: &[(Order, PlayerId)]) -> Self {
        let mut orders = Vec::new();
        let mut lookup = vec![None; graph.len()];
        for (ps, slot) in board.provinces.iter().zip(lookup.iter_mut()) {
            if let Some(unit) = &ps.unit {
                *slot = Some(orders.len());
                orders.push(AdjudicableOrder::hold(unit));
            }
        }

        let mut resolver = Resolver {
            graph,
            board,
            orders,
            lookup,
            moves_into: vec![Vec::new(); graph.len()],
            dep_list: Vec::new(),
            submitted: Vec::with_capacity(submissions.len()),
        };
        for &(order, player) in submissions {
            let attachment = resolver.attach(order, player);
            resolver.submitted.push((order, player, attachment));
        }

        resolver.check_moves();
        resolver.check_convoys();
        resolver.find_routes();
        // A convoy whose army lost its route has nothing left to carry.
        resolver.check_convoys();
        resolver.check_supports();
        resolver.check_cores();
        resolver.link();
        resolver
    }

    pub fn orders(&self) -> &[AdjudicableOrder] {
        &self.orders
    }

    /// Arena index of the unit standing in `province`.
    pub fn order_at(&self, province: ProvinceId) -> Option<usize> {
        self.lookup.get(province.index()).copied().flatten()
    }

    /// Resolves every order.
    pub fn resolve_all(&mut self) {
        for i in 0..self.orders.len() {
            self.resolve(i);
        }
    }

    fn attach(&mut self, order: Order, player: PlayerId) -> Attachment {
        if order.phase() != Some(Phase::Movement) {
            return Attachment::Decided(out_of_phase_verdict(self.board, &order, player));
        }
        let Some(idx) = order.unit().and_then(|p| self.order_at(p)) else {
            return Attachment::Decided(Verdict::Illegal(IllegalReason::NoUnit));
        };
        if self.orders[idx].player != player {
            return Attachment::Decided(Verdict::Illegal(IllegalReason::NotOwner));
        }

        let located = |p: ProvinceId| self.board.unit_at(p).map_or(Location::new(p), |u| u.location);
        let o = &self.orders[idx];
        let (kind, destination, source, via_convoy) = match order {
            Order::Core { .. } => (OrderKind::Core, o.location, o.location, false),
            Order::Move { dest, via_convoy, .. } => (OrderKind::Move, dest, o.location, via_convoy),
            Order::SupportHold { supported, .. } => {
                let at = located(supported);
                (OrderKind::SupportHold, at, at, false)
            }
            Order::SupportMove { supported, dest, .. } => {
                (OrderKind::SupportMove, dest, located(supported), false)
            }
            Order::Convoy {
                convoyed_from,
                convoyed_to,
                ..
            } => (
                OrderKind::Convoy,
                Location::new(convoyed_to),
                located(convoyed_from),
                false,
            ),
            _ => (OrderKind::Hold, o.location, o.location, false),
        };

        let o = &mut self.orders[idx];
        o.kind = kind;
        o.destination = destination;
        o.source = source;
        o.via_convoy = via_convoy;
        o.ordered = true;
        Attachment::Unit(idx)
    }

    fn invalidate(&mut self, i: usize, reason: IllegalReason) {
        let o = &mut self.orders[i];
        o.not_supportable = o.is_move();
        o.intended = o.is_move().then_some(o.destination);
        o.kind = OrderKind::Hold;
        o.is_valid = false;
        o.illegal = Some(reason);
        o.destination = o.location;
        o.source = o.location;
        o.convoyed = false;
        o.routes.clear();
    }

    fn check_moves(&mut self) {
        for i in 0..self.orders.len() {
            if !self.orders[i].is_move() {
                continue;
            }
            match self.move_target(&self.orders[i]) {
                Ok((dest, convoyed)) => {
                    let o = &mut self.orders[i];
                    o.destination = dest;
                    o.convoyed = convoyed;
                }
                Err(reason) => self.invalidate(i, reason),
            }
        }
    }

    /// Exact destination of a move and whether it needs a convoy.
    fn move_target(&self, o: &AdjudicableOrder) -> Result<(Location, bool), IllegalReason> {
        let graph = self.graph;
        let from = o.location.province;
        let to = o.destination.province;
        if from == to {
            return Err(IllegalReason::Unreachable);
        }

        match o.unit_type {
            UnitType::Army => {
                if !graph.terrain(to).army_can_occupy() {
                    return Err(IllegalReason::WrongTerrain);
                }
                let dest = Location::new(to);
                if !o.via_convoy && graph.army_can_reach(from, to) {
                    return Ok((dest, false));
                }
                let coastal = |p: ProvinceId| graph.province(p).fleet.is_coastal();
                if coastal(from) && coastal(to) {
                    Ok((dest, true))
                } else {
                    Err(IllegalReason::Unreachable)
                }
            }
            UnitType::Fleet => {
                if o.via_convoy {
                    return Err(IllegalReason::NotConvoyable);
                }
                if !graph.province(to).fleet.is_coastal() {
                    return Err(IllegalReason::WrongTerrain);
                }
                let reachable = graph.fleet_coasts_reaching(o.location, to);
                match o.destination.coast {
                    Some(coast) if graph.is_multi_coast(to) => {
                        let wanted = Location::with_coast(to, coast);
                        if reachable.contains(&wanted) {
                            Ok((wanted, false))
                        } else {
                            Err(IllegalReason::Unreachable)
                        }
                    }
                    _ => match reachable.as_slice() {
                        [only] => Ok((*only, false)),
                        [] => Err(IllegalReason::Unreachable),
                        _ => Err(IllegalReason::AmbiguousCoast),
                    },
                }
            }
        }
    }

    fn check_convoys(&mut self) {
        for i in 0..self.orders.len() {
            if self.orders[i].kind != OrderKind::Convoy {
                continue;
            }
            if let Some(reason) = self.convoy_problem(i) {
                self.invalidate(i, reason);
            }
        }
    }

    fn convoy_problem(&self, i: usize) -> Option<IllegalReason> {
        let o = &self.orders[i];
        if o.unit_type != UnitType::Fleet || self.graph.terrain(o.location.province) != Terrain::Sea {
            return Some(IllegalReason::NotConvoyable);
        }
        let Some(a) = self.order_at(o.source.province) else {
            return Some(IllegalReason::UnmatchedConvoy);
        };
        let army = &self.orders[a];
        let matched = army.unit_type == UnitType::Army
            && army.is_move()
            && army.convoyed
            && army.destination.province == o.destination.province;
        (!matched).then_some(IllegalReason::UnmatchedConvoy)
    }

    fn find_routes(&mut self) {
        for i in 0..self.orders.len() {
            let o = &self.orders[i];
            if !o.is_move() || !o.convoyed {
                continue;
            }
            let (from, to) = (o.location.province, o.destination.province);
            let fleets: Vec<(usize, ProvinceId)> = self
                .orders
                .iter()
                .enumerate()
                .filter(|(_, c)| {
                    c.kind == OrderKind::Convoy && c.source.province == from && c.destination.province == to
                })
                .map(|(j, c)| (j, c.location.province))
                .collect();

            let routes = convoy_routes(self.graph, from, to, &fleets);
            if routes.is_empty() {
                self.invalidate(i, IllegalReason::NoConvoyRoute);
            } else {
                self.orders[i].routes = routes;
            }
        }
    }

    fn check_supports(&mut self) {
        for i in 0..self.orders.len() {
            if !matches!(self.orders[i].kind, OrderKind::SupportHold | OrderKind::SupportMove) {
                continue;
            }
            if let Some(reason) = self.support_problem(i) {
                self.invalidate(i, reason);
            }
        }
    }

    fn support_problem(&self, i: usize) -> Option<IllegalReason> {
        let o = &self.orders[i];
        let target = o.destination.province;
        if target == o.location.province {
            return Some(IllegalReason::SupportIntoOwnProvince);
        }
        if !self.graph.can_reach_province(o.unit_type, o.location, target) {
            return Some(IllegalReason::Unreachable);
        }
        let Some(s) = self.order_at(o.source.province) else {
            return Some(IllegalReason::UnmatchedSupport);
        };
        let supported = &self.orders[s];
        match o.kind {
            OrderKind::SupportHold => supported.is_move().then_some(IllegalReason::HoldSupportForMove),
            _ => {
                // Support for a move that was thrown out still names it; it just fails.
                let headed = match supported.intended {
                    Some(dest) if supported.not_supportable => dest,
                    _ => supported.destination,
                };
                let matched = (supported.is_move() || supported.not_supportable) && headed.province == target;
                (!matched).then_some(IllegalReason::UnmatchedSupport)
            }
        }
    }

    fn check_cores(&mut self) {
        for i in 0..self.orders.len() {
            let o = &self.orders[i];
            if o.kind != OrderKind::Core {
                continue;
            }
            let p = o.location.province;
            let ps = self.board.province(p);
            if !self.graph.is_supply_center(p) || ps.owner != Some(o.player) || ps.core == Some(o.player) {
                self.invalidate(i, IllegalReason::InvalidCore);
            }
        }
    }

    fn link(&mut self) {
        for i in 0..self.orders.len() {
            let o = &self.orders[i];
            let (kind, dest, source) = (o.kind, o.destination.province, o.source.province);
            match kind {
                OrderKind::Move => self.moves_into[dest.index()].push(i),
                OrderKind::SupportHold | OrderKind::SupportMove => {
                    if let Some(s) = self.order_at(source) {
                        self.orders[s].supports.push(i);
                    }
                }
                OrderKind::Convoy => {
                    if let Some(a) = self.order_at(source) {
                        self.orders[a].convoys.push(i);
                    }
                }
                OrderKind::Hold | OrderKind::Core => {}
            }
        }
    }

    /// Resolves order `i`, guessing through dependency cycles.
    pub fn resolve(&mut self, i: usize) -> Resolution {
        match self.orders[i].state {
            ResolutionState::Resolved => return self.orders[i].resolution,
            ResolutionState::Guessing => {
                if !self.dep_list.contains(&i) {
                    self.dep_list.push(i);
                }
                return self.orders[i].resolution;
            }
            ResolutionState::Unresolved => {}
        }

        let mark = self.dep_list.len();
        self.guess(i, Resolution::Fails);
        let first = self.adjudicate(i);

        if self.dep_list.len() == mark {
            // No guess was consulted.
            if self.orders[i].state != ResolutionState::Resolved {
                self.settle(i, first);
            }
            return self.orders[i].resolution;
        }

        if self.dep_list[mark] != i {
            // Part of a cycle opened further up the stack.
            self.dep_list.push(i);
            self.orders[i].resolution = first;
            return first;
        }

        self.reset_from(mark);
        self.guess(i, Resolution::Succeeds);
        let second = self.adjudicate(i);

        if first == second {
            self.reset_from(mark);
            self.settle(i, first);
            return first;
        }

        self.backup_rule(mark, i);
        self.resolve(i)
    }

    fn guess(&mut self, i: usize, r: Resolution) {
        let o = &mut self.orders[i];
        o.state = ResolutionState::Guessing;
        o.resolution = r;
    }

    fn settle(&mut self, i: usize, r: Resolution) {
        let o = &mut self.orders[i];
        o.state = ResolutionState::Resolved;
        o.resolution = r;
    }

    fn reset_from(&mut self, mark: usize) {
        for k in mark..self.dep_list.len() {
            let j = self.dep_list[k];
            self.orders[j].state = ResolutionState::Unresolved;
        }
        self.dep_list.truncate(mark);
    }

    /// Settles a cycle whose two guesses disagree.
    fn backup_rule(&mut self, mark: usize, i: usize) {
        let mut cycle: Vec<usize> = self.dep_list.drain(mark..).collect();
        if !cycle.contains(&i) {
            cycle.push(i);
        }

        if cycle.iter().all(|&c| self.orders[c].is_move()) {
            tracing::debug!(orders = cycle.len(), "circular movement");
            for &c in &cycle {
                self.settle(c, Resolution::Succeeds);
            }
            return;
        }

        if cycle.iter().any(|&c| self.orders[c].kind == OrderKind::Convoy) {
            // Szykman: the convoys in the paradox fail, everything else is redone.
            tracing::debug!(orders = cycle.len(), "convoy paradox");
            for &c in &cycle {
                if self.orders[c].kind == OrderKind::Convoy {
                    self.settle(c, Resolution::Fails);
                } else {
                    self.orders[c].state = ResolutionState::Unresolved;
                }
            }
            return;
        }

        tracing::debug!(orders = cycle.len(), "unresolvable cycle, failing every order in it");
        for &c in &cycle {
            self.settle(c, Resolution::Fails);
        }
    }

    fn adjudicate(&mut self, i: usize) -> Resolution {
        match self.orders[i].kind {
            OrderKind::Hold => Resolution::Succeeds,
            OrderKind::Core => Resolution::from_bool(!self.is_attacked(i)),
            OrderKind::Move => self.adjudicate_move(i),
            OrderKind::SupportHold | OrderKind::SupportMove => self.adjudicate_support(i),
            OrderKind::Convoy => Resolution::from_bool(!self.is_dislodged(i)),
        }
    }

    fn adjudicate_move(&mut self, i: usize) -> Resolution {
        let attack = self.attack_strength(i);
        if attack == 0 {
            return Resolution::Fails;
        }
        let dest = self.orders[i].destination.province;

        let opposing = match self.head_to_head(i) {
            Some(j) => self.defend_strength(j),
            None => self.hold_strength(dest),
        };
        if attack <= opposing {
            return Resolution::Fails;
        }

        for k in 0..self.moves_into[dest.index()].len() {
            let m = self.moves_into[dest.index()][k];
            if m != i && attack <= self.prevent_strength(m) {
                return Resolution::Fails;
            }
        }
        Resolution::Succeeds
    }

    fn adjudicate_support(&mut self, i: usize) -> Resolution {
        let o = &self.orders[i];
        let (player, here) = (o.player, o.location.province);
        let (target, backed) = (o.destination.province, o.source.province);

        if let Some(s) = self.order_at(backed) {
            if self.orders[s].not_supportable {
                return Resolution::Fails;
            }
        }

        for k in 0..self.moves_into[here.index()].len() {
            let m = self.moves_into[here.index()][k];
            let attacker = &self.orders[m];
            let origin = attacker.location.province;
            if attacker.player == player || origin == target || origin == backed {
                continue;
            }
            if self.path_ok(m) {
                return Resolution::Fails;
            }
        }

        Resolution::from_bool(!self.is_dislodged(i))
    }

    /// A successful move into the unit's province.
    fn is_dislodged(&mut self, i: usize) -> bool {
        let here = self.orders[i].location.province.index();
        for k in 0..self.moves_into[here].len() {
            let m = self.moves_into[here][k];
            if self.resolve(m).succeeded() {
                return true;
            }
        }
        false
    }

    /// Any move into the unit's province that can actually get there.
    fn is_attacked(&mut self, i: usize) -> bool {
        let here = self.orders[i].location.province.index();
        for k in 0..self.moves_into[here].len() {
            let m = self.moves_into[here][k];
            if self.path_ok(m) {
                return true;
            }
        }
        false
    }

    fn path_ok(&mut self, i: usize) -> bool {
        if !self.orders[i].convoyed {
            return true;
        }
        for r in 0..self.orders[i].routes.len() {
            let mut open = true;
            for k in 0..self.orders[i].routes[r].len() {
                let c = self.orders[i].routes[r][k];
                if !self.resolve(c).succeeded() {
                    open = false;
                    break;
                }
            }
            if open {
                return true;
            }
        }
        false
    }

    /// The unit `i` is swapping places with over land, if any.
    fn head_to_head(&self, i: usize) -> Option<usize> {
        let o = &self.orders[i];
        if !o.is_move() || o.convoyed {
            return None;
        }
        let j = self.order_at(o.destination.province)?;
        let other = &self.orders[j];
        (other.is_move() && !other.convoyed && other.destination.province == o.location.province).then_some(j)
    }

    fn count_supports(&mut self, i: usize, excluded: Option<PlayerId>) -> u32 {
        let mut n = 0;
        for k in 0..self.orders[i].supports.len() {
            let s = self.orders[i].supports[k];
            if excluded == Some(self.orders[s].player) {
                continue;
            }
            if self.resolve(s).succeeded() {
                n += 1;
            }
        }
        n
    }

    fn attack_strength(&mut self, i: usize) -> u32 {
        if !self.path_ok(i) {
            return 0;
        }
        let Some(j) = self.order_at(self.orders[i].destination.province) else {
            return 1 + self.count_supports(i, None);
        };
        if self.orders[j].is_move() && self.head_to_head(i) != Some(j) && self.resolve(j).succeeded() {
            return 1 + self.count_supports(i, None);
        }
        let defender = self.orders[j].player;
        if defender == self.orders[i].player {
            return 0;
        }
        1 + self.count_supports(i, Some(defender))
    }

    fn hold_strength(&mut self, province: ProvinceId) -> u32 {
        let Some(j) = self.order_at(province) else {
            return 0;
        };
        if self.orders[j].is_move() {
            return if self.resolve(j).succeeded() { 0 } else { 1 };
        }
        if self.orders[j].not_supportable {
            return 1;
        }
        1 + self.count_supports(j, None)
    }

    fn defend_strength(&mut self, i: usize) -> u32 {
        1 + self.count_supports(i, None)
    }

    fn prevent_strength(&mut self, i: usize) -> u32 {
        if !self.path_ok(i) {
            return 0;
        }
        if let Some(j) = self.head_to_head(i) {
            if self.resolve(j).succeeded() {
                return 0;
            }
        }
        1 + self.count_supports(i, None)
    }

    /// Resolves everything and applies the results to a copy of the board.
    pub fn into_outcome(mut self) -> MovementOutcome {
        self.resolve_all();
        let n = self.orders.len();

        let mut dislodged_by: Vec<Option<usize>> = vec![None; n];
        for i in 0..n {
            let o = &self.orders[i];
            if !o.is_move() || !o.resolution.succeeded() {
                continue;
            }
            if let Some(j) = self.order_at(o.destination.province) {
                let stayed = !(self.orders[j].is_move() && self.orders[j].resolution.succeeded());
                if stayed {
                    dislodged_by[j] = Some(i);
                }
            }
        }

        let mut occupied = vec![false; self.graph.len()];
        for o in &self.orders {
            let p = if o.is_move() && o.resolution.succeeded() {
                o.destination.province
            } else {
                o.location.province
            };
            occupied[p.index()] = true;
        }

        let mut contested = BTreeSet::new();
        for p in self.graph.ids() {
            if occupied[p.index()] {
                continue;
            }
            for k in 0..self.moves_into[p.index()].len() {
                let m = self.moves_into[p.index()][k];
                if !self.orders[m].resolution.succeeded() && self.prevent_strength(m) > 0 {
                    contested.insert(p);
                    break;
                }
            }
        }

        let mut dislodged = Vec::new();
        for (j, by) in dislodged_by.iter().enumerate() {
            let Some(a) = *by else { continue };
            let (unit, attacker) = (&self.orders[j], &self.orders[a]);
            let retreat_options: BTreeSet<Location> = self
                .graph
                .moves_from(unit.unit_type, unit.location)
                .into_iter()
                .filter(|loc| {
                    let q = loc.province;
                    !occupied[q.index()]
                        && !contested.contains(&q)
                        && (attacker.convoyed || q != attacker.location.province)
                })
                .collect();
            dislodged.push(DislodgedUnit {
                province: unit.location.province,
                unit_type: unit.unit_type,
                owner: unit.player,
                attacker_from: attacker.location.province,
                retreat_options,
            });
        }

        let board = self.apply(&dislodged);
        let verdicts = self.verdicts();

        let mut missing = BTreeMap::new();
        for o in self.orders.iter().filter(|o| !o.ordered) {
            *missing.entry(o.player).or_insert(0) += 1;
        }

        tracing::debug!(
            orders = self.submitted.len(),
            units = n,
            dislodged = dislodged.len(),
            contested = contested.len(),
            "movement resolved"
        );

        MovementOutcome {
            verdicts,
            dislodged,
            contested,
            board,
            missing,
        }
    }

    fn apply(&self, dislodged: &[DislodgedUnit]) -> BoardState {
        let mut board = self.board.clone();
        for ps in &mut board.provinces {
            ps.dislodged = None;
        }

        let mut arrivals = Vec::new();
        for o in self.orders.iter().filter(|o| o.is_move() && o.resolution.succeeded()) {
            if let Some(mut unit) = board.province_mut(o.location.province).unit.take() {
                unit.location = o.destination;
                arrivals.push(unit);
            }
        }
        for d in dislodged {
            let slot = board.province_mut(d.province);
            if let Some(mut unit) = slot.unit.take() {
                unit.retreat_options = Some(d.retreat_options.clone());
                slot.dislodged = Some(unit);
            }
        }
        for unit in arrivals {
            let p = unit.location.province;
            board.province_mut(p).unit = Some(unit);
        }

        for o in self.orders.iter() {
            if o.kind != OrderKind::Core || !o.resolution.succeeded() {
                continue;
            }
            let ps = board.province_mut(o.location.province);
            if ps.half_core == Some(o.player) {
                ps.core = Some(o.player);
                ps.half_core = None;
            } else {
                ps.half_core = Some(o.player);
            }
        }
        board
    }

    fn verdicts(&self) -> Vec<OrderVerdict> {
        self.submitted
            .iter()
            .map(|(order, player, attachment)| {
                let verdict = match *attachment {
                    Attachment::Decided(v) => v,
                    Attachment::Unit(i) => match self.orders[i].illegal {
                        Some(reason) => Verdict::Illegal(reason),
                        None if self.orders[i].resolution.succeeded() => Verdict::Succeeds,
                        None => Verdict::Fails,
                    },
                };
                OrderVerdict {
                    order: *order,
                    player: *player,
                    verdict,
                }
            })
            .collect()
    }
}

/// Every minimal chain of convoying fleets linking `from` to `to`, shortest
/// first. A chain that contains another chain's fleets is dropped.
fn convoy_routes(
    graph: &ProvinceGraph,
    from: ProvinceId,
    to: ProvinceId,
    fleets: &[(usize, ProvinceId)],
) -> Vec<Vec<usize>> {
    let mut found = Vec::new();
    let mut path = Vec::new();
    for &(idx, at) in fleets {
        if graph.is_adjacent(from, at) {
            extend_route(graph, to, fleets, (idx, at), &mut path, &mut found);
        }
    }

    found.sort_by(|a: &Vec<usize>, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    let mut minimal: Vec<Vec<usize>> = Vec::new();
    for route in found {
        let fleets: BTreeSet<usize> = route.iter().copied().collect();
        if minimal.iter().any(|m| m.iter().all(|f| fleets.contains(f))) {
            continue;
        }
        minimal.push(route);
    }
    minimal
}

fn extend_route(
    graph: &ProvinceGraph,
    to: ProvinceId,
    fleets: &[(usize, ProvinceId)],
    step: (usize, ProvinceId),
    path: &mut Vec<usize>,
    found: &mut Vec<Vec<usize>>,
) {
    path.push(step.0);
    if graph.is_adjacent(step.1, to) {
        found.push(path.clone());
    } else {
        for &(idx, at) in fleets {
            if !path.contains(&idx) && graph.is_adjacent(step.1, at) {
                extend_route(graph, to, fleets, (idx, at), path, found);
            }
        }
    }
    path.pop();
}

/// Resolves a movement phase.
///
/// Each `(Order, PlayerId)` pair is an order issued by that player. Units
/// without orders hold. Returns one verdict per submitted order together
/// with the resulting board, on which dislodged units sit in their
/// province's dislodged slot with their retreat options filled in.
pub fn resolve_movement(
    graph: &ProvinceGraph,
    board: &BoardState,
    orders: &[(Order, PlayerId)],
) -> Result<MovementOutcome, AdjudicationError> {
    check_submissions(graph, board, orders, Phase::Movement)?;
    Ok(Resolver::new(graph, board, orders).into_outcome())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Season, Turn};
    use crate::maps::classic::{self, AUSTRIA, ENGLAND, FRANCE, GERMANY, ITALY, RUSSIA, TURKEY};

    struct Game {
        graph: ProvinceGraph,
        board: BoardState,
        orders: Vec<(Order, PlayerId)>,
    }

    impl Game {
        fn new() -> Self {
            let graph = classic::graph();
            let board = BoardState::empty(
                &graph,
                Turn::new(1901, Season::Spring, Phase::Movement),
                classic::players(),
            );
            Game {
                graph,
                board,
                orders: Vec::new(),
            }
        }

        fn id(&self, name: &str) -> ProvinceId {
            self.graph.id(name).unwrap()
        }

        fn loc(&self, name: &str) -> Location {
            self.graph.location(name).unwrap()
        }

        fn unit(&mut self, player: PlayerId, unit_type: UnitType, at: &str) -> ProvinceId {
            let loc = self.loc(at);
            assert!(self.board.place_unit(loc, player, unit_type));
            loc.province
        }

        fn army(&mut self, player: PlayerId, at: &str) -> ProvinceId {
            self.unit(player, UnitType::Army, at)
        }

        fn fleet(&mut self, player: PlayerId, at: &str) -> ProvinceId {
            self.unit(player, UnitType::Fleet, at)
        }

        fn order(&mut self, player: PlayerId, order: Order) {
            self.orders.push((order, player));
        }

        fn hold(&mut self, player: PlayerId, at: &str) {
            let unit = self.id(at);
            self.order(player, Order::Hold { unit });
        }

        fn mv(&mut self, player: PlayerId, from: &str, to: &str) {
            let (unit, dest) = (self.id(from), self.loc(to));
            self.order(
                player,
                Order::Move {
                    unit,
                    dest,
                    via_convoy: false,
                },
            );
        }

        fn support_hold(&mut self, player: PlayerId, at: &str, supported: &str) {
            let (unit, supported) = (self.id(at), self.id(supported));
            self.order(player, Order::SupportHold { unit, supported });
        }

        fn support_move(&mut self, player: PlayerId, at: &str, from: &str, to: &str) {
            let (unit, supported, dest) = (self.id(at), self.id(from), self.loc(to));
            self.order(player, Order::SupportMove { unit, supported, dest });
        }

        fn convoy(&mut self, player: PlayerId, at: &str, from: &str, to: &str) {
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

        fn run(&self) -> MovementOutcome {
            resolve_movement(&self.graph, &self.board, &self.orders).unwrap()
        }
    }

    fn verdict(outcome: &MovementOutcome, g: &Game, at: &str) -> Verdict {
        let p = g.id(at);
        outcome
            .verdicts
            .iter()
            .find(|v| v.order.unit() == Some(p))
            .map(|v| v.verdict)
            .unwrap_or_else(|| panic!("no order for {at}"))
    }

    fn is_dislodged(outcome: &MovementOutcome, g: &Game, at: &str) -> bool {
        outcome.dislodged.iter().any(|d| d.province == g.id(at))
    }

    #[test]
    fn simple_move_succeeds() {
        let mut g = Game::new();
        g.army(AUSTRIA, "vie");
        g.mv(AUSTRIA, "vie", "gal");
        let out = g.run();
        assert_eq!(verdict(&out, &g, "vie"), Verdict::Succeeds);
        assert!(out.board.unit_at(g.id("gal")).is_some());
        assert!(out.board.unit_at(g.id("vie")).is_none());
    }

    #[test]
    fn equal_strength_bounces_and_contests() {
        let mut g = Game::new();
        g.army(AUSTRIA, "vie");
        g.army(RUSSIA, "war");
        g.mv(AUSTRIA, "vie", "gal");
        g.mv(RUSSIA, "war", "gal");
        let out = g.run();
        assert_eq!(verdict(&out, &g, "vie"), Verdict::Fails);
        assert_eq!(verdict(&out, &g, "war"), Verdict::Fails);
        assert!(out.contested.contains(&g.id("gal")));
    }

    #[test]
    fn supported_hold_blocks_supported_attack() {
        let mut g = Game::new();
        g.army(AUSTRIA, "tri");
        g.fleet(AUSTRIA, "adr");
        g.army(ITALY, "ven");
        g.army(ITALY, "tyr");
        g.mv(AUSTRIA, "tri", "ven");
        g.support_move(AUSTRIA, "adr", "tri", "ven");
        g.hold(ITALY, "ven");
        g.support_hold(ITALY, "tyr", "ven");
        let out = g.run();
        assert_eq!(verdict(&out, &g, "tri"), Verdict::Fails);
        assert_eq!(verdict(&out, &g, "adr"), Verdict::Succeeds);
        assert_eq!(verdict(&out, &g, "tyr"), Verdict::Succeeds);
        assert!(!is_dislodged(&out, &g, "ven"));
    }

    #[test]
    fn attack_cuts_support_of_mutual_holders() {
        let mut g = Game::new();
        g.army(GERMANY, "ber");
        g.fleet(GERMANY, "kie");
        g.army(RUSSIA, "pru");
        g.fleet(RUSSIA, "bal");
        g.support_hold(GERMANY, "ber", "kie");
        g.support_hold(GERMANY, "kie", "ber");
        g.mv(RUSSIA, "pru", "ber");
        g.support_move(RUSSIA, "bal", "pru", "ber");
        let out = g.run();
        assert_eq!(verdict(&out, &g, "pru"), Verdict::Fails);
        assert_eq!(verdict(&out, &g, "kie"), Verdict::Succeeds);
        assert_eq!(verdict(&out, &g, "ber"), Verdict::Fails);
        assert!(out.dislodged.is_empty());
    }

    #[test]
    fn fleet_into_inland_is_illegal_and_unsupportable() {
        let mut g = Game::new();
        g.fleet(ENGLAND, "lon");
        g.fleet(ENGLAND, "nth");
        g.army(FRANCE, "wal");
        g.mv(ENGLAND, "lon", "bur");
        g.support_hold(ENGLAND, "nth", "lon");
        g.mv(FRANCE, "wal", "lon");
        let out = g.run();
        assert_eq!(
            verdict(&out, &g, "lon"),
            Verdict::Illegal(IllegalReason::WrongTerrain)
        );
        assert_eq!(verdict(&out, &g, "nth"), Verdict::Fails);
        assert_eq!(verdict(&out, &g, "wal"), Verdict::Fails);
    }

    #[test]
    fn support_for_an_impossible_move_fails() {
        let mut g = Game::new();
        g.fleet(ENGLAND, "lon");
        g.army(ENGLAND, "pic");
        g.army(FRANCE, "wal");
        g.fleet(FRANCE, "eng");
        g.mv(ENGLAND, "lon", "bur");
        g.support_move(ENGLAND, "pic", "lon", "bur");
        g.mv(FRANCE, "wal", "lon");
        g.support_move(FRANCE, "eng", "wal", "lon");
        let out = g.run();
        assert_eq!(
            verdict(&out, &g, "lon"),
            Verdict::Illegal(IllegalReason::WrongTerrain)
        );
        assert_eq!(verdict(&out, &g, "pic"), Verdict::Fails);
        assert_eq!(verdict(&out, &g, "wal"), Verdict::Succeeds);
        assert!(is_dislodged(&out, &g, "lon"));

        // Support naming a destination the move never asked for is still unmatched.
        let mut g = Game::new();
        g.fleet(ENGLAND, "lon");
        g.army(ENGLAND, "pic");
        g.mv(ENGLAND, "lon", "bur");
        g.support_move(ENGLAND, "pic", "lon", "bel");
        let out = g.run();
        assert_eq!(
            verdict(&out, &g, "pic"),
            Verdict::Illegal(IllegalReason::UnmatchedSupport)
        );
    }

    #[test]
    fn three_way_rotation() {
        let mut g = Game::new();
        g.fleet(TURKEY, "ank");
        g.army(TURKEY, "con");
        g.army(TURKEY, "smy");
        g.mv(TURKEY, "ank", "con");
        g.mv(TURKEY, "con", "smy");
        g.mv(TURKEY, "smy", "ank");
        let out = g.run();
        for p in ["ank", "con", "smy"] {
            assert_eq!(verdict(&out, &g, p), Verdict::Succeeds);
        }
        assert!(out.board.unit_at(g.id("ank")).unwrap().is_army());
    }

    #[test]
    fn swap_without_convoy_bounces() {
        let mut g = Game::new();
        g.army(ITALY, "rom");
        g.army(ITALY, "ven");
        g.mv(ITALY, "rom", "ven");
        g.mv(ITALY, "ven", "rom");
        let out = g.run();
        assert_eq!(verdict(&out, &g, "rom"), Verdict::Fails);
        assert_eq!(verdict(&out, &g, "ven"), Verdict::Fails);
    }

    #[test]
    fn convoy_carries_army() {
        let mut g = Game::new();
        g.army(ENGLAND, "lon");
        g.fleet(ENGLAND, "nth");
        g.mv(ENGLAND, "lon", "nwy");
        g.convoy(ENGLAND, "nth", "lon", "nwy");
        let out = g.run();
        assert_eq!(verdict(&out, &g, "lon"), Verdict::Succeeds);
        assert_eq!(verdict(&out, &g, "nth"), Verdict::Succeeds);
        assert!(out.board.unit_at(g.id("nwy")).is_some());
    }

    #[test]
    fn convoy_without_fleet_has_no_route() {
        let mut g = Game::new();
        g.army(ENGLAND, "lon");
        g.mv(ENGLAND, "lon", "nwy");
        let out = g.run();
        assert_eq!(
            verdict(&out, &g, "lon"),
            Verdict::Illegal(IllegalReason::NoConvoyRoute)
        );
    }

    #[test]
    fn ambiguous_coast_is_illegal() {
        let mut g = Game::new();
        g.fleet(FRANCE, "mao");
        g.mv(FRANCE, "mao", "spa");
        let out = g.run();
        assert_eq!(
            verdict(&out, &g, "mao"),
            Verdict::Illegal(IllegalReason::AmbiguousCoast)
        );
    }

    #[test]
    fn single_reachable_coast_is_inferred() {
        let mut g = Game::new();
        g.fleet(FRANCE, "gas");
        g.mv(FRANCE, "gas", "spa");
        let out = g.run();
        assert_eq!(verdict(&out, &g, "gas"), Verdict::Succeeds);
        assert_eq!(out.board.unit_at(g.id("spa")).unwrap().location, g.loc("spa/nc"));
    }

    #[test]
    fn dislodged_unit_gets_retreat_options() {
        let mut g = Game::new();
        g.army(AUSTRIA, "tri");
        g.army(AUSTRIA, "tyr");
        g.army(ITALY, "ven");
        g.army(ITALY, "rom");
        g.mv(AUSTRIA, "tri", "ven");
        g.support_move(AUSTRIA, "tyr", "tri", "ven");
        g.hold(ITALY, "ven");
        g.hold(ITALY, "rom");
        let out = g.run();
        assert!(is_dislodged(&out, &g, "ven"));
        let dislodged = out.board.dislodged_at(g.id("ven")).unwrap();
        let options = dislodged.retreat_options.as_ref().unwrap();
        assert!(options.contains(&g.loc("pie")));
        assert!(options.contains(&g.loc("apu")));
        assert!(!options.contains(&g.loc("tri")));
        assert!(!options.contains(&g.loc("rom")));
        assert!(!options.contains(&g.loc("tyr")));
    }

    #[test]
    fn core_order_builds_half_then_full_core() {
        let mut g = Game::new();
        g.army(AUSTRIA, "ser");
        let ser = g.id("ser");
        g.board.set_owner(ser, Some(AUSTRIA));
        g.order(AUSTRIA, Order::Core { unit: ser });
        let out = g.run();
        assert_eq!(verdict(&out, &g, "ser"), Verdict::Succeeds);
        assert_eq!(out.board.province(ser).half_core, Some(AUSTRIA));

        g.board = out.board;
        let out = g.run();
        assert_eq!(out.board.province(ser).core, Some(AUSTRIA));
        assert_eq!(out.board.province(ser).half_core, None);
    }

    #[test]
    fn core_fails_under_attack_and_needs_ownership() {
        let mut g = Game::new();
        g.army(AUSTRIA, "ser");
        g.army(TURKEY, "bul");
        let ser = g.id("ser");
        g.board.set_owner(ser, Some(AUSTRIA));
        g.order(AUSTRIA, Order::Core { unit: ser });
        g.mv(TURKEY, "bul", "ser");
        let out = g.run();
        assert_eq!(verdict(&out, &g, "ser"), Verdict::Fails);
        assert_eq!(out.board.province(ser).half_core, None);

        let mut g = Game::new();
        g.army(AUSTRIA, "ser");
        let ser = g.id("ser");
        g.order(AUSTRIA, Order::Core { unit: ser });
        let out = g.run();
        assert_eq!(
            verdict(&out, &g, "ser"),
            Verdict::Illegal(IllegalReason::InvalidCore)
        );
    }

    #[test]
    fn orders_for_missing_or_foreign_units() {
        let mut g = Game::new();
        g.army(AUSTRIA, "vie");
        g.army(AUSTRIA, "bud");
        g.hold(AUSTRIA, "gal");
        g.hold(RUSSIA, "vie");
        let out = g.run();
        assert_eq!(verdict(&out, &g, "gal"), Verdict::Illegal(IllegalReason::NoUnit));
        assert_eq!(verdict(&out, &g, "vie"), Verdict::Illegal(IllegalReason::NotOwner));
        assert_eq!(out.missing.get(&AUSTRIA), Some(&2));
    }

    #[test]
    fn retreat_order_in_movement_phase_is_wrong_phase() {
        let mut g = Game::new();
        g.army(AUSTRIA, "vie");
        let (unit, dest) = (g.id("vie"), g.loc("boh"));
        g.order(AUSTRIA, Order::Retreat { unit, dest });
        let out = g.run();
        assert_eq!(out.verdicts[0].verdict, Verdict::Illegal(IllegalReason::WrongPhase));
    }

    #[test]
    fn convoy_paradox_fails_the_convoy() {
        // English support in London is attacked by a convoyed army whose
        // convoy is itself under attack from the supported fleet.
        let mut g = Game::new();
        g.fleet(ENGLAND, "lon");
        g.fleet(ENGLAND, "wal");
        g.army(FRANCE, "bre");
        g.fleet(FRANCE, "eng");
        g.support_move(ENGLAND, "lon", "wal", "eng");
        g.mv(ENGLAND, "wal", "eng");
        g.mv(FRANCE, "bre", "lon");
        g.convoy(FRANCE, "eng", "bre", "lon");
        let out = g.run();
        assert_eq!(verdict(&out, &g, "eng"), Verdict::Fails);
        assert_eq!(verdict(&out, &g, "bre"), Verdict::Fails);
        assert_eq!(verdict(&out, &g, "lon"), Verdict::Succeeds);
        assert_eq!(verdict(&out, &g, "wal"), Verdict::Succeeds);
        assert!(is_dislodged(&out, &g, "eng"));
    }

    /// Pandin's paradox: the convoy is cut by a fleet whose own move
    /// depends on the convoyed army failing.
    fn pandin() -> Game {
        let mut g = Game::new();
        g.fleet(ENGLAND, "lon");
        g.fleet(ENGLAND, "wal");
        g.army(FRANCE, "bre");
        g.fleet(FRANCE, "eng");
        g.fleet(GERMANY, "nth");
        g.fleet(GERMANY, "bel");
        g.support_move(ENGLAND, "lon", "wal", "eng");
        g.mv(ENGLAND, "wal", "eng");
        g.mv(FRANCE, "bre", "lon");
        g.convoy(FRANCE, "eng", "bre", "lon");
        g.support_move(GERMANY, "nth", "bel", "eng");
        g.mv(GERMANY, "bel", "eng");
        g
    }

    fn by_unit(out: &MovementOutcome) -> BTreeMap<ProvinceId, Verdict> {
        out.verdicts
            .iter()
            .filter_map(|v| v.order.unit().map(|p| (p, v.verdict)))
            .collect()
    }

    #[test]
    fn paradoxes_resolve_the_same_every_time() {
        let mut g = pandin();
        let first = g.run();
        let second = g.run();
        assert_eq!(first.verdicts, second.verdicts);
        assert_eq!(first.dislodged, second.dislodged);
        assert_eq!(first.board, second.board);

        assert_eq!(verdict(&first, &g, "eng"), Verdict::Fails);
        assert_eq!(verdict(&first, &g, "bre"), Verdict::Fails);
        assert_eq!(verdict(&first, &g, "wal"), Verdict::Fails);
        assert_eq!(verdict(&first, &g, "bel"), Verdict::Fails);
        assert!(first.dislodged.is_empty());

        g.orders.reverse();
        let reversed = g.run();
        assert_eq!(by_unit(&first), by_unit(&reversed));
        assert_eq!(first.board, reversed.board);
    }
}
