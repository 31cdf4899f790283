//! Arbiter adjudication library.
//!
//! Resolves simultaneous orders for Diplomacy-style variants: the map graph
//! with its derived coastlines, the board and order model, and one resolver
//! per phase behind the [`Adjudicator`] facade.

pub mod adjudicator;
pub mod board;
pub mod maps;
pub mod resolve;

pub use adjudicator::{Adjudication, Adjudicator, OrderCounts, RuleSet};
pub use board::{BoardState, Location, Order, PlayerId, ProvinceGraph, ProvinceId, UnitType};
pub use resolve::{AdjudicationError, IllegalReason, OrderVerdict, Verdict};
