//! Adjustment-phase resolution.
//!
//! At the end of a game year each player's delta (owned supply centers
//! minus units) decides whether they build, disband, or sit out. Builds
//! beyond the allowance are rejected and unspent allowance is recorded as
//! implicit waives. A player who disbands too few units is reported, not
//! corrected: [`suggest_disbands`] ranks candidates for whoever settles it.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::adjudicator::RuleSet;
use crate::board::{BoardState, Location, Order, Phase, PlayerId, ProvinceGraph, ProvinceId, UnitType};

use super::{check_submissions, out_of_phase_verdict, AdjudicationError, IllegalReason, OrderVerdict, Verdict};

/// Per-player tally of the adjustment phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentSummary {
    pub player: PlayerId,
    /// Owned supply centers minus units at the start of the phase.
    pub delta: i32,
    pub built: usize,
    pub disbanded: usize,
    pub waived: usize,
    /// Build allowance left unused without an explicit waive.
    pub implicit_waives: usize,
}

/// Problems a game master has to look at. They do not abort the phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdjustmentIssue {
    /// Fewer disbands than the player owes. Nothing was removed for them.
    MissingDisbands { player: PlayerId, missing: usize },
    /// The player submitted both builds and disbands.
    MixedAdjustments { player: PlayerId },
}

/// Everything an adjustment phase produces.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub verdicts: Vec<OrderVerdict>,
    pub board: BoardState,
    /// Players with a non-zero delta.
    pub summaries: BTreeMap<PlayerId, AdjustmentSummary>,
    pub issues: Vec<AdjustmentIssue>,
}

/// Where a build would put the unit, or why it cannot go there.
fn build_site(
    graph: &ProvinceGraph,
    board: &BoardState,
    rules: &RuleSet,
    player: PlayerId,
    location: Location,
    unit_type: UnitType,
) -> Result<Location, IllegalReason> {
    let p = location.province;
    let ps = board.province(p);
    if !graph.is_supply_center(p) || ps.owner != Some(player) || ps.unit.is_some() {
        return Err(IllegalReason::InvalidBuild);
    }
    if !rules.build_anywhere && ps.core != Some(player) {
        return Err(IllegalReason::InvalidBuild);
    }

    match unit_type {
        UnitType::Army if graph.terrain(p).army_can_occupy() => Ok(Location::new(p)),
        UnitType::Fleet if graph.is_multi_coast(p) => match location.coast {
            Some(c) if graph.coasts(p).contains(&c) => Ok(location),
            _ => Err(IllegalReason::InvalidBuild),
        },
        UnitType::Fleet if graph.province(p).fleet.is_coastal() => Ok(Location::new(p)),
        _ => Err(IllegalReason::InvalidBuild),
    }
}

/// Resolves the adjustment phase.
pub fn resolve_builds(
    graph: &ProvinceGraph,
    board: &BoardState,
    orders: &[(Order, PlayerId)],
    rules: &RuleSet,
) -> Result<BuildOutcome, AdjudicationError> {
    check_submissions(graph, board, orders, Phase::Build)?;

    let mut summaries: BTreeMap<PlayerId, AdjustmentSummary> = board
        .player_ids()
        .map(|player| {
            let delta = board.supply_center_count(graph, player) as i32 - board.unit_count(player) as i32;
            let summary = AdjustmentSummary {
                player,
                delta,
                built: 0,
                disbanded: 0,
                waived: 0,
                implicit_waives: 0,
            };
            (player, summary)
        })
        .collect();

    let mut next = board.clone();
    let mut used: BTreeSet<ProvinceId> = BTreeSet::new();
    let mut builders: BTreeSet<PlayerId> = BTreeSet::new();
    let mut disbanders: BTreeSet<PlayerId> = BTreeSet::new();
    let mut verdicts = Vec::with_capacity(orders.len());

    for &(order, player) in orders {
        if order.phase() != Some(Phase::Build) {
            verdicts.push(OrderVerdict {
                order,
                player,
                verdict: out_of_phase_verdict(board, &order, player),
            });
            continue;
        }

        match order {
            Order::Disband { .. } => disbanders.insert(player),
            _ => builders.insert(player),
        };

        let Some(s) = summaries.get_mut(&player) else {
            continue;
        };
        let verdict = if s.delta == 0 {
            Verdict::Illegal(IllegalReason::NoAdjustment)
        } else {
            match order {
                Order::Build { location, unit_type } if s.delta > 0 => {
                    let remaining = s.delta as usize - s.built - s.waived;
                    if remaining == 0 {
                        Verdict::Illegal(IllegalReason::ExcessAdjustment)
                    } else if used.contains(&location.province) {
                        Verdict::Illegal(IllegalReason::InvalidBuild)
                    } else {
                        match build_site(graph, board, rules, player, location, unit_type) {
                            Ok(site) => {
                                used.insert(site.province);
                                next.place_unit(site, player, unit_type);
                                s.built += 1;
                                Verdict::Succeeds
                            }
                            Err(reason) => Verdict::Illegal(reason),
                        }
                    }
                }
                Order::Waive { count } if s.delta > 0 => {
                    let remaining = s.delta as usize - s.built - s.waived;
                    if usize::from(count) > remaining {
                        Verdict::Illegal(IllegalReason::ExcessAdjustment)
                    } else {
                        s.waived += usize::from(count);
                        Verdict::Succeeds
                    }
                }
                Order::Disband { unit } if s.delta < 0 => {
                    let owes = s.delta.unsigned_abs() as usize;
                    if board.unit_at(unit).map(|u| u.owner) != Some(player) {
                        Verdict::Illegal(IllegalReason::InvalidDisband)
                    } else if s.disbanded >= owes {
                        Verdict::Illegal(IllegalReason::ExcessAdjustment)
                    } else {
                        next.province_mut(unit).unit = None;
                        s.disbanded += 1;
                        Verdict::Succeeds
                    }
                }
                _ => Verdict::Illegal(IllegalReason::OppositeAdjustment),
            }
        };
        verdicts.push(OrderVerdict { order, player, verdict });
    }

    let mut issues = Vec::new();
    for player in builders.intersection(&disbanders) {
        issues.push(AdjustmentIssue::MixedAdjustments { player: *player });
    }
    for s in summaries.values_mut() {
        if s.delta > 0 {
            s.implicit_waives = s.delta as usize - s.built - s.waived;
        } else if s.delta < 0 {
            let missing = s.delta.unsigned_abs() as usize - s.disbanded;
            if missing > 0 {
                tracing::warn!(player = %s.player, missing, "player disbanded too few units");
                issues.push(AdjustmentIssue::MissingDisbands {
                    player: s.player,
                    missing,
                });
            }
        }
    }
    summaries.retain(|_, s| s.delta != 0);

    tracing::debug!(
        players = summaries.len(),
        issues = issues.len(),
        "adjustments resolved"
    );

    Ok(BuildOutcome {
        verdicts,
        board: next,
        summaries,
        issues,
    })
}

/// Ranks up to `count` of the player's units for disbanding: farthest from
/// the player's cored centers first, ties broken by higher province id.
pub fn suggest_disbands(graph: &ProvinceGraph, board: &BoardState, player: PlayerId, count: usize) -> Vec<ProvinceId> {
    let distance = distance_from_cores(graph, board, player);
    let mut units: Vec<(usize, ProvinceId)> = board
        .units()
        .filter(|u| u.owner == player)
        .map(|u| (distance[u.location.province.index()], u.location.province))
        .collect();
    units.sort_by(|a, b| b.cmp(a));
    units.into_iter().take(count).map(|(_, p)| p).collect()
}

/// Breadth-first distance from the nearest province cored by `player`,
/// across every passable border. Unreachable provinces get `usize::MAX`.
fn distance_from_cores(graph: &ProvinceGraph, board: &BoardState, player: PlayerId) -> Vec<usize> {
    let mut distance = vec![usize::MAX; graph.len()];
    let mut queue = VecDeque::new();
    for p in graph.ids() {
        if board.province(p).core == Some(player) {
            distance[p.index()] = 0;
            queue.push_back(p);
        }
    }
    while let Some(p) = queue.pop_front() {
        let d = distance[p.index()] + 1;
        for &q in &graph.province(p).adjacent {
            if distance[q.index()] == usize::MAX {
                distance[q.index()] = d;
                queue.push_back(q);
            }
        }
    }
    distance
}
