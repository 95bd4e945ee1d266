//! # ccg-events
//!
//! An event-resolution engine for turn-based card games.
//!
//! Every state mutation is modelled as an [`Event`] and resolved through an
//! [`EventWindow`], a fixed ten-phase pipeline that brackets execution with
//! interrupt and reaction trigger windows, re-checks validity as the world
//! changes, and chains follow-up abilities. Windows nest: an ability resolved
//! inside one window may open another, which drains completely before the
//! outer window continues.
//!
//! ## Design Principles
//!
//! 1. **Explicit Scheduling**: No coroutines or implicit globals. Open
//!    windows live on a stack owned by [`Game`], and
//!    [`Game::advance`] runs exactly one step per call so a server loop
//!    stays in control between steps.
//!
//! 2. **Deterministic Resolution**: Handler execution uses a stable sort on
//!    event `order`; simultaneous ability responses resolve by priority,
//!    then registration order. Same inputs, same resolution sequence.
//!
//! 3. **Validity Is Re-Checked, Never Assumed**: Event conditions run again
//!    before each handler and once in the parent when a nested window
//!    completes. Collected ability responses are re-validated at the moment
//!    they resolve.
//!
//! ## Modules
//!
//! - `core`: Entity and player IDs, game state, RNG
//! - `events`: Events, event windows, subscriber registries
//! - `abilities`: Triggered abilities, registry, trigger windows
//! - `pipeline`: The cooperative step queue windows are built on
//! - `game`: The game context and window-stack driver

pub mod abilities;
pub mod core;
pub mod events;
pub mod game;
pub mod pipeline;

// Re-export commonly used types
pub use crate::core::{
    EntityId, EventRecord, GameRng, GameRngState, GameState, PlayerId, PlayerMap, ZoneId,
};

pub use crate::events::{
    Event, EventId, EventListeners, EventName, EventPayload, EventWindow, ReactionId,
    ReactionRegistry, ThenAbility, WindowId, WindowPhase,
};

pub use crate::abilities::{
    AbilityContext, AbilityId, AbilityPhase, AbilityRegistry, AbilityScope, TriggeredAbility,
    TriggeredAbilityWindow,
};

pub use crate::pipeline::{Pipeline, StepStatus};

pub use crate::game::{Game, PipelineStatus, StateChecker};
