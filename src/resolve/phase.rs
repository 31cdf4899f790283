//! Phase sequencing.
//!
//! Determines the next phase in the game year and advances the board to it.

use crate::adjudicator::RuleSet;
use crate::board::{BoardState, Phase, ProvinceGraph, Season, Turn};

/// Computes the next (season, phase) given the current turn and whether dislodgements occurred.
///
/// Phase flow:
/// - Spring Movement -> Spring Retreat (if dislodged) OR Fall Movement
/// - Spring Retreat  -> Fall Movement
/// - Fall Movement   -> Fall Retreat (if dislodged) OR Fall Build
/// - Fall Retreat    -> Fall Build
/// - Fall Build      -> Spring Movement (next year)
pub fn next_phase(turn: Turn, has_dislodgements: bool) -> (Season, Phase) {
    match turn.phase {
        Phase::Movement if has_dislodgements => (turn.season, Phase::Retreat),
        Phase::Movement | Phase::Retreat => after_movement(turn.season),
        Phase::Build => (Season::Spring, Phase::Movement),
    }
}

fn after_movement(season: Season) -> (Season, Phase) {
    match season {
        Season::Spring => (Season::Fall, Phase::Movement),
        Season::Fall => (Season::Fall, Phase::Build),
    }
}

/// Returns true if any player's supply centers and units differ in number.
pub fn needs_build_phase(graph: &ProvinceGraph, board: &BoardState) -> bool {
    board
        .player_ids()
        .any(|p| board.supply_center_count(graph, p) != board.unit_count(p))
}

/// Hands every occupied supply center to the occupying unit's owner.
/// Unoccupied centers keep their owner.
pub fn update_sc_ownership(graph: &ProvinceGraph, board: &mut BoardState) {
    for id in graph.ids().filter(|&id| graph.is_supply_center(id)) {
        let ps = board.province_mut(id);
        if let Some(unit) = &ps.unit {
            ps.owner = Some(unit.owner);
        }
    }
}

/// Advances the board to the next phase.
///
/// Updates supply center ownership after Fall movement or retreat, skips an
/// adjustment phase nobody needs when the rules say so, bumps the year on
/// entering Spring, and clears dislodged units unless a retreat phase follows.
pub fn advance_state(graph: &ProvinceGraph, board: &mut BoardState, has_dislodgements: bool, rules: &RuleSet) {
    let turn = board.turn;
    let (mut season, mut phase) = next_phase(turn, has_dislodgements);

    if turn.season == Season::Fall && turn.phase != Phase::Build {
        update_sc_ownership(graph, board);
    }

    if phase == Phase::Build && rules.skip_empty_phases && !needs_build_phase(graph, board) {
        tracing::debug!(year = turn.year, "no adjustments due, skipping build phase");
        (season, phase) = (Season::Spring, Phase::Movement);
    }

    if season == Season::Spring && phase == Phase::Movement {
        board.turn.year += 1;
    }
    board.turn.season = season;
    board.turn.phase = phase;

    if phase != Phase::Retreat {
        for ps in &mut board.provinces {
            ps.dislodged = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Location, Unit, UnitType};
    use crate::maps::classic::{self, AUSTRIA, TURKEY};

    fn at(phase: Phase, season: Season) -> Turn {
        Turn::new(1901, season, phase)
    }

    fn keep_build() -> RuleSet {
        RuleSet {
            skip_empty_phases: false,
            ..RuleSet::default()
        }
    }

    #[test]
    fn phase_flow() {
        use Phase::*;
        use Season::*;
        assert_eq!(next_phase(at(Movement, Spring), false), (Fall, Movement));
        assert_eq!(next_phase(at(Movement, Spring), true), (Spring, Retreat));
        assert_eq!(next_phase(at(Retreat, Spring), false), (Fall, Movement));
        assert_eq!(next_phase(at(Movement, Fall), false), (Fall, Build));
        assert_eq!(next_phase(at(Movement, Fall), true), (Fall, Retreat));
        assert_eq!(next_phase(at(Retreat, Fall), false), (Fall, Build));
        assert_eq!(next_phase(at(Build, Fall), false), (Spring, Movement));
    }

    #[test]
    fn full_year_cycle() {
        let graph = classic::graph();
        let mut board = classic::starting_board(&graph);

        advance_state(&graph, &mut board, false, &keep_build());
        assert_eq!(board.turn, Turn::new(1901, Season::Fall, Phase::Movement));

        advance_state(&graph, &mut board, false, &keep_build());
        assert_eq!(board.turn, Turn::new(1901, Season::Fall, Phase::Build));

        advance_state(&graph, &mut board, false, &keep_build());
        assert_eq!(board.turn, Turn::new(1902, Season::Spring, Phase::Movement));
    }

    #[test]
    fn balanced_board_skips_build_phase() {
        let graph = classic::graph();
        let mut board = classic::starting_board(&graph);
        board.turn = Turn::new(1901, Season::Fall, Phase::Movement);
        advance_state(&graph, &mut board, false, &RuleSet::default());
        assert_eq!(board.turn, Turn::new(1902, Season::Spring, Phase::Movement));
    }

    #[test]
    fn fall_movement_captures_centers() {
        let graph = classic::graph();
        let mut board = classic::starting_board(&graph);
        board.turn = Turn::new(1901, Season::Fall, Phase::Movement);
        let bul = graph.id("bul").unwrap();
        let con = graph.id("con").unwrap();
        board.province_mut(con).unit = None;
        board.place_unit(Location::new(bul), TURKEY, UnitType::Army);

        advance_state(&graph, &mut board, false, &RuleSet::default());
        assert_eq!(board.province(bul).owner, Some(TURKEY));
        // Turkey now has more centers than units, so builds are due.
        assert_eq!(board.turn.phase, Phase::Build);
    }

    #[test]
    fn spring_movement_leaves_centers_alone() {
        let graph = classic::graph();
        let mut board = classic::starting_board(&graph);
        let bul = graph.id("bul").unwrap();
        board.place_unit(Location::new(bul), TURKEY, UnitType::Army);
        advance_state(&graph, &mut board, false, &RuleSet::default());
        assert_eq!(board.province(bul).owner, None);
    }

    #[test]
    fn dislodged_units_survive_only_into_retreat() {
        let graph = classic::graph();
        let mut board = classic::starting_board(&graph);
        let ser = graph.id("ser").unwrap();
        board.province_mut(ser).dislodged = Some(Unit::new(UnitType::Army, AUSTRIA, Location::new(ser)));

        let mut retreat = board.clone();
        advance_state(&graph, &mut retreat, true, &RuleSet::default());
        assert_eq!(retreat.turn.phase, Phase::Retreat);
        assert!(retreat.dislodged_at(ser).is_some());

        advance_state(&graph, &mut board, false, &RuleSet::default());
        assert!(board.dislodged_at(ser).is_none());
    }

    #[test]
    fn needs_build_phase_detects_mismatch() {
        let graph = classic::graph();
        let mut board = classic::starting_board(&graph);
        assert!(!needs_build_phase(&graph, &board));
        board.province_mut(graph.id("vie").unwrap()).unit = None;
        assert!(needs_build_phase(&graph, &board));
    }
}
