//! Core types: entities, zones, players, state, RNG.
//!
//! These are the game-agnostic building blocks the resolution pipeline
//! mutates. Games configure meaning (state keys, zone IDs, event names)
//! rather than extending the core.

pub mod entity;
pub mod player;
pub mod rng;
pub mod state;

pub use entity::{EntityId, ZoneId};
pub use player::{PlayerId, PlayerMap};
pub use rng::{GameRng, GameRngState};
pub use state::{EventRecord, GameState};
