//! The standard seven-player map and its 1901 starting position.
//!
//! Fleet adjacency for single-coast provinces is derived at load time; only
//! the three split-coast provinces list their coasts, and Gascony carries
//! the one override the topology cannot infer (it does not reach Spain's
//! south coast).

use std::collections::BTreeMap;

use crate::board::{
    BoardState, Coast, MapDefinition, Phase, Player, PlayerId, ProvinceDefinition, ProvinceGraph,
    Season, Terrain, Turn, UnitType,
};

pub const AUSTRIA: PlayerId = PlayerId(0);
pub const ENGLAND: PlayerId = PlayerId(1);
pub const FRANCE: PlayerId = PlayerId(2);
pub const GERMANY: PlayerId = PlayerId(3);
pub const ITALY: PlayerId = PlayerId(4);
pub const RUSSIA: PlayerId = PlayerId(5);
pub const TURKEY: PlayerId = PlayerId(6);

const PLAYERS: [(&str, &str); 7] = [
    ("Austria", "#c48f85"),
    ("England", "#2e2ec2"),
    ("France", "#3f9fd8"),
    ("Germany", "#6c4b37"),
    ("Italy", "#4ba14b"),
    ("Russia", "#a0a0a0"),
    ("Turkey", "#d8c13f"),
];

const HOME_CENTERS: [(PlayerId, &[&str]); 7] = [
    (AUSTRIA, &["bud", "tri", "vie"]),
    (ENGLAND, &["edi", "lon", "lvp"]),
    (FRANCE, &["bre", "mar", "par"]),
    (GERMANY, &["ber", "kie", "mun"]),
    (ITALY, &["nap", "rom", "ven"]),
    (RUSSIA, &["mos", "sev", "stp", "war"]),
    (TURKEY, &["ank", "con", "smy"]),
];

const STARTING_UNITS: [(PlayerId, UnitType, &str); 22] = [
    (AUSTRIA, UnitType::Army, "vie"),
    (AUSTRIA, UnitType::Army, "bud"),
    (AUSTRIA, UnitType::Fleet, "tri"),
    (ENGLAND, UnitType::Fleet, "lon"),
    (ENGLAND, UnitType::Fleet, "edi"),
    (ENGLAND, UnitType::Army, "lvp"),
    (FRANCE, UnitType::Fleet, "bre"),
    (FRANCE, UnitType::Army, "par"),
    (FRANCE, UnitType::Army, "mar"),
    (GERMANY, UnitType::Fleet, "kie"),
    (GERMANY, UnitType::Army, "ber"),
    (GERMANY, UnitType::Army, "mun"),
    (ITALY, UnitType::Fleet, "nap"),
    (ITALY, UnitType::Army, "rom"),
    (ITALY, UnitType::Army, "ven"),
    (RUSSIA, UnitType::Fleet, "stp/sc"),
    (RUSSIA, UnitType::Army, "mos"),
    (RUSSIA, UnitType::Army, "war"),
    (RUSSIA, UnitType::Fleet, "sev"),
    (TURKEY, UnitType::Fleet, "ank"),
    (TURKEY, UnitType::Army, "con"),
    (TURKEY, UnitType::Army, "smy"),
];

const COASTS: [(&str, Coast, &[&str]); 6] = [
    ("bul", Coast::East, &["bla", "con", "rum"]),
    ("bul", Coast::South, &["aeg", "con", "gre"]),
    ("spa", Coast::North, &["gas", "mao", "por"]),
    ("spa", Coast::South, &["gol", "mao", "mar", "por", "wes"]),
    ("stp", Coast::North, &["bar", "nwy"]),
    ("stp", Coast::South, &["bot", "fin", "lvn"]),
];

/// Returns the map definition.
pub fn definition() -> MapDefinition {
    let provinces = PROVINCES
        .iter()
        .map(|&(abbr, name, terrain, supply_center)| {
            let mut coasts = BTreeMap::new();
            for &(p, coast, list) in &COASTS {
                if p == abbr {
                    coasts.insert(coast, list.iter().map(|s| s.to_string()).collect());
                }
            }
            let nonadjacent_coasts = if abbr == "gas" { vec!["spa/sc".to_string()] } else { Vec::new() };
            ProvinceDefinition {
                abbr: abbr.to_string(),
                name: name.to_string(),
                terrain,
                supply_center,
                coasts,
                nonadjacent_coasts,
            }
        })
        .collect();

    MapDefinition {
        name: "classic".to_string(),
        provinces,
        adjacencies: ADJACENCIES.iter().map(|&(a, b)| (a.to_string(), b.to_string())).collect(),
    }
}

/// Builds the province graph.
pub fn graph() -> ProvinceGraph {
    ProvinceGraph::from_definition(&definition()).expect("bundled classic map is well-formed")
}

/// The seven players in standard order.
pub fn players() -> Vec<Player> {
    PLAYERS.iter().map(|&(name, color)| Player::new(name, color)).collect()
}

/// Spring 1901: home centers owned and cored, 22 units in place.
pub fn starting_board(graph: &ProvinceGraph) -> BoardState {
    let mut board = BoardState::empty(graph, Turn::new(1901, Season::Spring, Phase::Movement), players());
    for &(player, centers) in &HOME_CENTERS {
        for id in centers.iter().filter_map(|abbr| graph.id(abbr)) {
            board.set_owner(id, Some(player));
            board.set_core(id, Some(player));
        }
    }
    for &(player, unit_type, name) in &STARTING_UNITS {
        if let Some(loc) = graph.location(name) {
            board.place_unit(loc, player, unit_type);
        }
    }
    board
}

const PROVINCES: &[(&str, &str, Terrain, bool)] = &[
    ("adr", "Adriatic Sea", Terrain::Sea, false),
    ("aeg", "Aegean Sea", Terrain::Sea, false),
    ("alb", "Albania", Terrain::Land, false),
    ("ank", "Ankara", Terrain::Land, true),
    ("apu", "Apulia", Terrain::Land, false),
    ("arm", "Armenia", Terrain::Land, false),
    ("bal", "Baltic Sea", Terrain::Sea, false),
    ("bar", "Barents Sea", Terrain::Sea, false),
    ("bel", "Belgium", Terrain::Land, true),
    ("ber", "Berlin", Terrain::Land, true),
    ("bla", "Black Sea", Terrain::Sea, false),
    ("boh", "Bohemia", Terrain::Land, false),
    ("bot", "Gulf of Bothnia", Terrain::Sea, false),
    ("bre", "Brest", Terrain::Land, true),
    ("bud", "Budapest", Terrain::Land, true),
    ("bul", "Bulgaria", Terrain::Land, true),
    ("bur", "Burgundy", Terrain::Land, false),
    ("cly", "Clyde", Terrain::Land, false),
    ("con", "Constantinople", Terrain::Land, true),
    ("den", "Denmark", Terrain::Land, true),
    ("eas", "Eastern Mediterranean", Terrain::Sea, false),
    ("edi", "Edinburgh", Terrain::Land, true),
    ("eng", "English Channel", Terrain::Sea, false),
    ("fin", "Finland", Terrain::Land, false),
    ("gal", "Galicia", Terrain::Land, false),
    ("gas", "Gascony", Terrain::Land, false),
    ("gol", "Gulf of Lyon", Terrain::Sea, false),
    ("gre", "Greece", Terrain::Land, true),
    ("hel", "Heligoland Bight", Terrain::Sea, false),
    ("hol", "Holland", Terrain::Land, true),
    ("ion", "Ionian Sea", Terrain::Sea, false),
    ("iri", "Irish Sea", Terrain::Sea, false),
    ("kie", "Kiel", Terrain::Land, true),
    ("lon", "London", Terrain::Land, true),
    ("lvn", "Livonia", Terrain::Land, false),
    ("lvp", "Liverpool", Terrain::Land, true),
    ("mao", "Mid-Atlantic Ocean", Terrain::Sea, false),
    ("mar", "Marseilles", Terrain::Land, true),
    ("mos", "Moscow", Terrain::Land, true),
    ("mun", "Munich", Terrain::Land, true),
    ("naf", "North Africa", Terrain::Land, false),
    ("nao", "North Atlantic Ocean", Terrain::Sea, false),
    ("nap", "Naples", Terrain::Land, true),
    ("nrg", "Norwegian Sea", Terrain::Sea, false),
    ("nth", "North Sea", Terrain::Sea, false),
    ("nwy", "Norway", Terrain::Land, true),
    ("par", "Paris", Terrain::Land, true),
    ("pic", "Picardy", Terrain::Land, false),
    ("pie", "Piedmont", Terrain::Land, false),
    ("por", "Portugal", Terrain::Land, true),
    ("pru", "Prussia", Terrain::Land, false),
    ("rom", "Rome", Terrain::Land, true),
    ("ruh", "Ruhr", Terrain::Land, false),
    ("rum", "Rumania", Terrain::Land, true),
    ("ser", "Serbia", Terrain::Land, true),
    ("sev", "Sevastopol", Terrain::Land, true),
    ("sil", "Silesia", Terrain::Land, false),
    ("ska", "Skagerrak", Terrain::Sea, false),
    ("smy", "Smyrna", Terrain::Land, true),
    ("spa", "Spain", Terrain::Land, true),
    ("stp", "St. Petersburg", Terrain::Land, true),
    ("swe", "Sweden", Terrain::Land, true),
    ("swi", "Switzerland", Terrain::Impassible, false),
    ("syr", "Syria", Terrain::Land, false),
    ("tri", "Trieste", Terrain::Land, true),
    ("tun", "Tunisia", Terrain::Land, true),
    ("tus", "Tuscany", Terrain::Land, false),
    ("tyr", "Tyrolia", Terrain::Land, false),
    ("tys", "Tyrrhenian Sea", Terrain::Sea, false),
    ("ukr", "Ukraine", Terrain::Land, false),
    ("ven", "Venice", Terrain::Land, true),
    ("vie", "Vienna", Terrain::Land, true),
    ("wal", "Wales", Terrain::Land, false),
    ("war", "Warsaw", Terrain::Land, true),
    ("wes", "Western Mediterranean", Terrain::Sea, false),
    ("yor", "Yorkshire", Terrain::Land, false),
];

const ADJACENCIES: &[(&str, &str)] = &[
    ("adr", "alb"), ("adr", "apu"), ("adr", "ion"), ("adr", "tri"), ("adr", "ven"),
    ("aeg", "bul"), ("aeg", "con"), ("aeg", "eas"), ("aeg", "gre"), ("aeg", "ion"),
    ("aeg", "smy"), ("alb", "gre"), ("alb", "ion"), ("alb", "ser"), ("alb", "tri"),
    ("ank", "arm"), ("ank", "bla"), ("ank", "con"), ("ank", "smy"), ("apu", "ion"),
    ("apu", "nap"), ("apu", "rom"), ("apu", "ven"), ("arm", "bla"), ("arm", "sev"),
    ("arm", "smy"), ("arm", "syr"), ("bal", "ber"), ("bal", "bot"), ("bal", "den"),
    ("bal", "kie"), ("bal", "lvn"), ("bal", "pru"), ("bal", "swe"), ("bar", "nrg"),
    ("bar", "nwy"), ("bar", "stp"), ("bel", "bur"), ("bel", "eng"), ("bel", "hol"),
    ("bel", "nth"), ("bel", "pic"), ("bel", "ruh"), ("ber", "kie"), ("ber", "mun"),
    ("ber", "pru"), ("ber", "sil"), ("bla", "bul"), ("bla", "con"), ("bla", "rum"),
    ("bla", "sev"), ("boh", "gal"), ("boh", "mun"), ("boh", "sil"), ("boh", "tyr"),
    ("boh", "vie"), ("bot", "fin"), ("bot", "lvn"), ("bot", "stp"), ("bot", "swe"),
    ("bre", "eng"), ("bre", "gas"), ("bre", "mao"), ("bre", "par"), ("bre", "pic"),
    ("bud", "gal"), ("bud", "rum"), ("bud", "ser"), ("bud", "tri"), ("bud", "vie"),
    ("bul", "con"), ("bul", "gre"), ("bul", "rum"), ("bul", "ser"), ("bur", "gas"),
    ("bur", "mar"), ("bur", "mun"), ("bur", "par"), ("bur", "pic"), ("bur", "ruh"),
    ("bur", "swi"), ("cly", "edi"), ("cly", "lvp"), ("cly", "nao"), ("cly", "nrg"),
    ("con", "smy"), ("den", "hel"), ("den", "kie"), ("den", "nth"), ("den", "ska"),
    ("den", "swe"), ("eas", "ion"), ("eas", "smy"), ("eas", "syr"), ("edi", "lvp"),
    ("edi", "nrg"), ("edi", "nth"), ("edi", "yor"), ("eng", "iri"), ("eng", "lon"),
    ("eng", "mao"), ("eng", "nth"), ("eng", "pic"), ("eng", "wal"), ("fin", "nwy"),
    ("fin", "stp"), ("fin", "swe"), ("gal", "rum"), ("gal", "sil"), ("gal", "ukr"),
    ("gal", "vie"), ("gal", "war"), ("gas", "mao"), ("gas", "mar"), ("gas", "par"),
    ("gas", "spa"), ("gol", "mar"), ("gol", "pie"), ("gol", "spa"), ("gol", "tus"),
    ("gol", "tys"), ("gol", "wes"), ("gre", "ion"), ("gre", "ser"), ("hel", "hol"),
    ("hel", "kie"), ("hel", "nth"), ("hol", "nth"), ("hol", "ruh"), ("ion", "nap"),
    ("ion", "tun"), ("ion", "tys"), ("iri", "lvp"), ("iri", "mao"), ("iri", "nao"),
    ("iri", "wal"), ("kie", "mun"), ("kie", "ruh"), ("lon", "nth"), ("lon", "wal"),
    ("lon", "yor"), ("lvn", "mos"), ("lvn", "pru"), ("lvn", "stp"), ("lvn", "war"),
    ("lvp", "nao"), ("lvp", "wal"), ("lvp", "yor"), ("mao", "naf"), ("mao", "nao"),
    ("mao", "por"), ("mao", "spa"), ("mao", "wes"), ("mar", "pie"), ("mar", "spa"),
    ("mar", "swi"), ("mos", "sev"), ("mos", "stp"), ("mos", "ukr"), ("mos", "war"),
    ("mun", "ruh"), ("mun", "sil"), ("mun", "swi"), ("mun", "tyr"), ("naf", "tun"),
    ("naf", "wes"), ("nao", "nrg"), ("nap", "rom"), ("nap", "tys"), ("nrg", "nth"),
    ("nrg", "nwy"), ("nth", "nwy"), ("nth", "ska"), ("nth", "yor"), ("nwy", "ska"),
    ("nwy", "stp"), ("nwy", "swe"), ("par", "pic"), ("pie", "swi"), ("pie", "tus"),
    ("pie", "tyr"), ("pie", "ven"), ("por", "spa"), ("pru", "sil"), ("pru", "war"),
    ("rom", "tus"), ("rom", "tys"), ("rom", "ven"), ("rum", "ser"), ("rum", "sev"),
    ("rum", "ukr"), ("ser", "tri"), ("sev", "ukr"), ("sil", "war"), ("ska", "swe"),
    ("smy", "syr"), ("spa", "wes"), ("swi", "tyr"), ("tri", "tyr"), ("tri", "ven"),
    ("tri", "vie"), ("tun", "tys"), ("tun", "wes"), ("tus", "tys"), ("tus", "ven"),
    ("tyr", "ven"), ("tyr", "vie"), ("tys", "wes"), ("ukr", "war"), ("wal", "yor"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Location;

    #[test]
    fn builds_without_warnings_or_errors() {
        let g = graph();
        assert_eq!(g.len(), 76);
        assert_eq!(g.ids().filter(|&id| g.is_supply_center(id)).count(), 34);
    }

    #[test]
    fn split_coasts_are_explicit() {
        let g = graph();
        let spa = g.id("spa").unwrap();
        assert_eq!(g.coasts(spa), vec![Coast::North, Coast::South]);
        let mao = Location::new(g.id("mao").unwrap());
        assert!(g.fleet_can_reach(mao, Location::with_coast(spa, Coast::North)));
        assert!(g.fleet_can_reach(mao, Location::with_coast(spa, Coast::South)));
        // A coast must be named.
        assert!(!g.fleet_can_reach(mao, Location::new(spa)));
    }

    #[test]
    fn gascony_reaches_only_the_north_coast_of_spain() {
        let g = graph();
        let gas = Location::new(g.id("gas").unwrap());
        let spa = g.id("spa").unwrap();
        assert_eq!(g.fleet_coasts_reaching(gas, spa), vec![Location::with_coast(spa, Coast::North)]);
        assert_eq!(g.connectivity().get(gas.province, spa, Some(Coast::North)), Some(true));
        assert_eq!(g.connectivity().get(gas.province, spa, Some(Coast::South)), None);
    }

    #[test]
    fn starting_position() {
        let g = graph();
        let board = starting_board(&g);
        assert!(board.validate(&g).is_ok());
        assert_eq!(board.units().count(), 22);
        for p in board.player_ids() {
            assert_eq!(board.supply_center_count(&g, p), board.unit_count(p));
        }
        let stp = board.unit_at(g.id("stp").unwrap()).unwrap();
        assert_eq!(stp.location.coast, Some(Coast::South));
    }
}
