//! Adjudicator facade.
//!
//! Dispatches a board to the resolver for its phase, advances the result to
//! the next phase, and tallies per-player order counts for reporting.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::board::{BoardState, Order, Phase, PlayerId, ProvinceGraph, ProvinceId, Unit};
use crate::resolve::{
    advance_state, resolve_builds, resolve_movement, resolve_retreats, AdjudicationError, AdjustmentIssue,
    AdjustmentSummary, DislodgedUnit, OrderVerdict,
};

/// Variant rules that change adjudication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Builds may go on any owned, vacant supply center, cored or not.
    pub build_anywhere: bool,
    /// Skip an adjustment phase in which no player has anything to do.
    pub skip_empty_phases: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet {
            build_anywhere: false,
            skip_empty_phases: true,
        }
    }
}

impl RuleSet {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Orders a player submitted and units they left without orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCounts {
    pub submitted: usize,
    pub missing: usize,
}

/// The result of adjudicating one phase.
#[derive(Debug, Clone)]
pub struct Adjudication {
    /// The resolved board, already advanced to the next phase.
    pub board: BoardState,
    pub verdicts: Vec<OrderVerdict>,
    pub dislodged: Vec<DislodgedUnit>,
    pub contested: BTreeSet<ProvinceId>,
    /// Units removed after failing or skipping their retreat.
    pub disbanded: Vec<Unit>,
    pub adjustments: BTreeMap<PlayerId, AdjustmentSummary>,
    pub issues: Vec<AdjustmentIssue>,
    pub counts: BTreeMap<PlayerId, OrderCounts>,
}

impl Adjudication {
    fn empty(board: BoardState, verdicts: Vec<OrderVerdict>) -> Self {
        Adjudication {
            board,
            verdicts,
            dislodged: Vec::new(),
            contested: BTreeSet::new(),
            disbanded: Vec::new(),
            adjustments: BTreeMap::new(),
            issues: Vec::new(),
            counts: BTreeMap::new(),
        }
    }
}

/// Adjudicates phases on one map under one rule set.
pub struct Adjudicator<'g> {
    graph: &'g ProvinceGraph,
    rules: RuleSet,
}

impl<'g> Adjudicator<'g> {
    pub fn new(graph: &'g ProvinceGraph, rules: RuleSet) -> Self {
        Adjudicator { graph, rules }
    }

    pub fn graph(&self) -> &'g ProvinceGraph {
        self.graph
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Resolves the board's current phase and advances it.
    pub fn adjudicate(
        &self,
        board: &BoardState,
        orders: &[(Order, PlayerId)],
    ) -> Result<Adjudication, AdjudicationError> {
        let graph = self.graph;
        let (mut result, missing, has_dislodgements) = match board.turn.phase {
            Phase::Movement => {
                let out = resolve_movement(graph, board, orders)?;
                let has_dislodgements = !out.dislodged.is_empty();
                let mut result = Adjudication::empty(out.board, out.verdicts);
                result.dislodged = out.dislodged;
                result.contested = out.contested;
                (result, out.missing, has_dislodgements)
            }
            Phase::Retreat => {
                let out = resolve_retreats(graph, board, orders)?;
                let mut result = Adjudication::empty(out.board, out.verdicts);
                result.disbanded = out.disbanded;
                (result, out.missing, false)
            }
            Phase::Build => {
                let out = resolve_builds(graph, board, orders, &self.rules)?;
                let missing = out
                    .issues
                    .iter()
                    .filter_map(|issue| match *issue {
                        AdjustmentIssue::MissingDisbands { player, missing } => Some((player, missing)),
                        AdjustmentIssue::MixedAdjustments { .. } => None,
                    })
                    .collect();
                let mut result = Adjudication::empty(out.board, out.verdicts);
                result.adjustments = out.summaries;
                result.issues = out.issues;
                (result, missing, false)
            }
        };

        let mut counts: BTreeMap<PlayerId, OrderCounts> =
            board.player_ids().map(|p| (p, OrderCounts::default())).collect();
        for (_, player) in orders {
            if let Some(c) = counts.get_mut(player) {
                c.submitted += 1;
            }
        }
        for (player, n) in missing {
            if let Some(c) = counts.get_mut(&player) {
                c.missing = n;
            }
        }
        result.counts = counts;

        advance_state(graph, &mut result.board, has_dislodgements, &self.rules);
        tracing::debug!(
            from = %board.turn,
            to = %result.board.turn,
            orders = orders.len(),
            "phase adjudicated"
        );
        Ok(result)
    }

    /// Adjudicates independent boards in parallel. Results come back in
    /// input order.
    pub fn adjudicate_many(
        &self,
        jobs: &[(BoardState, Vec<(Order, PlayerId)>)],
    ) -> Vec<Result<Adjudication, AdjudicationError>> {
        jobs.par_iter()
            .map(|(board, orders)| self.adjudicate(board, orders))
            .collect()
    }
}
