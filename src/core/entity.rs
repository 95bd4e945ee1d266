//! Entity and zone identification.
//!
//! Every card, token, or attachment referenced by an event payload has a
//! unique `EntityId`. Zones (hand, deck, play area, discard...) are
//! game-defined and referenced by opaque `ZoneId`s; the engine never
//! interprets either.

use serde::{Deserialize, Serialize};

/// Unique identifier for a game entity (card, token, attachment).
///
/// The engine treats entity IDs as opaque. Games allocate them via
/// [`GameState::alloc_entity`](crate::core::GameState::alloc_entity).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create a new entity ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Opaque zone identifier. Games define what zones exist.
///
/// Event payloads carry the zone a card originated from so that abilities
/// triggering off the move (e.g. "when a creature leaves your hand") can
/// inspect it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

impl ZoneId {
    /// Create a new zone ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Zone({})", self.0)
    }
}
