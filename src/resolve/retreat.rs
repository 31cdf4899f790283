//! Retreat-phase resolution.
//!
//! Dislodged units may retreat to one of the options recorded for them by
//! the movement resolver, or disband. Two or more retreats into the same
//! province all fail and those units disband. Unordered dislodged units
//! disband as well.

use std::collections::BTreeMap;

use crate::board::{BoardState, Location, Order, Phase, PlayerId, ProvinceGraph, ProvinceId, Unit};

use super::{check_submissions, out_of_phase_verdict, AdjudicationError, IllegalReason, OrderVerdict, Verdict};

/// Everything a retreat phase produces.
#[derive(Debug, Clone)]
pub struct RetreatOutcome {
    pub verdicts: Vec<OrderVerdict>,
    pub board: BoardState,
    /// Units removed from the board, as they stood when dislodged.
    pub disbanded: Vec<Unit>,
    /// Dislodged units left without orders, per owner.
    pub missing: BTreeMap<PlayerId, usize>,
}

/// The option a retreat order picks, inferring the coast when only one of
/// the destination's coasts is open.
fn pick_option(unit: &Unit, dest: Location) -> Result<Location, IllegalReason> {
    let Some(options) = unit.retreat_options.as_ref() else {
        return Err(IllegalReason::InvalidRetreat);
    };
    if dest.coast.is_some() {
        return options.get(&dest).copied().ok_or(IllegalReason::InvalidRetreat);
    }
    let mut matching = options.iter().filter(|o| o.province == dest.province);
    match (matching.next(), matching.next()) {
        (Some(&only), None) => Ok(only),
        (Some(_), Some(_)) => Err(IllegalReason::AmbiguousCoast),
        _ => Err(IllegalReason::InvalidRetreat),
    }
}

/// Resolves the retreat phase.
pub fn resolve_retreats(
    graph: &ProvinceGraph,
    board: &BoardState,
    orders: &[(Order, PlayerId)],
) -> Result<RetreatOutcome, AdjudicationError> {
    check_submissions(graph, board, orders, Phase::Retreat)?;

    let mut verdicts: Vec<Verdict> = Vec::with_capacity(orders.len());
    let mut ordered = vec![false; graph.len()];
    // (submission index, dislodged province, destination)
    let mut retreats: Vec<(usize, ProvinceId, Location)> = Vec::new();

    for (i, &(order, player)) in orders.iter().enumerate() {
        if order.phase() != Some(Phase::Retreat) {
            verdicts.push(out_of_phase_verdict(board, &order, player));
            continue;
        }
        let Some(p) = order.unit() else {
            verdicts.push(Verdict::Illegal(IllegalReason::WrongPhase));
            continue;
        };
        let Some(unit) = board.dislodged_at(p) else {
            let reason = if board.unit_at(p).is_some() {
                IllegalReason::NotDislodged
            } else {
                IllegalReason::NoUnit
            };
            verdicts.push(Verdict::Illegal(reason));
            continue;
        };
        if unit.owner != player {
            verdicts.push(Verdict::Illegal(IllegalReason::NotOwner));
            continue;
        }
        ordered[p.index()] = true;

        let verdict = match order {
            Order::Retreat { dest, .. } => match pick_option(unit, dest) {
                Ok(loc) => {
                    retreats.push((i, p, loc));
                    Verdict::Succeeds
                }
                Err(reason) => Verdict::Illegal(reason),
            },
            _ => Verdict::Succeeds,
        };
        verdicts.push(verdict);
    }

    let mut arrivals: BTreeMap<ProvinceId, usize> = BTreeMap::new();
    for &(_, _, loc) in &retreats {
        *arrivals.entry(loc.province).or_insert(0) += 1;
    }

    let mut next = board.clone();
    let mut moved = vec![false; graph.len()];
    for &(i, from, loc) in &retreats {
        if arrivals[&loc.province] > 1 {
            verdicts[i] = Verdict::Fails;
            continue;
        }
        if let Some(mut unit) = next.province_mut(from).dislodged.take() {
            unit.location = loc;
            unit.retreat_options = None;
            next.province_mut(loc.province).unit = Some(unit);
            moved[from.index()] = true;
        }
    }

    let mut disbanded = Vec::new();
    let mut missing = BTreeMap::new();
    for p in graph.ids() {
        if let Some(mut unit) = next.province_mut(p).dislodged.take() {
            if !ordered[p.index()] {
                *missing.entry(unit.owner).or_insert(0) += 1;
            }
            unit.retreat_options = None;
            disbanded.push(unit);
        }
    }

    tracing::debug!(
        retreated = moved.iter().filter(|&&m| m).count(),
        disbanded = disbanded.len(),
        "retreats resolved"
    );

    let verdicts = orders
        .iter()
        .zip(verdicts)
        .map(|(&(order, player), verdict)| OrderVerdict { order, player, verdict })
        .collect();

    Ok(RetreatOutcome {
        verdicts,
        board: next,
        disbanded,
        missing,
    })
}
