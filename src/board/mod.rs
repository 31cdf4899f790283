//! Board representation and game-state types.
//!
//! Contains the map graph with its derived coastlines, provinces, units,
//! players, orders, and the overall game state.

pub mod adjacency;
pub mod coastal;
pub mod order;
pub mod player;
pub mod province;
pub mod state;
pub mod unit;

pub use adjacency::{MapDefinition, MapError, ProvinceDefinition, ProvinceGraph};
pub use coastal::CoastalConnectivity;
pub use order::{Order, RelationshipKind};
pub use player::{Player, PlayerId};
pub use province::{Coast, FleetAdjacency, Location, Province, ProvinceId, Terrain};
pub use state::{BoardError, BoardState, Phase, ProvinceState, Season, Turn};
pub use unit::{Unit, UnitType};
