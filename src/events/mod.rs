//! Events, event windows, and the subscriber registries.
//!
//! An [`Event`] is a proposed state mutation; an [`EventWindow`] carries a
//! batch of them through the fixed ten-phase resolution pipeline. The
//! registries in [`reactions`] serve the pipeline's notification phases.

mod event;
mod reactions;
mod window;

pub use event::{
    Event, EventCondition, EventHandler, EventId, EventName, EventPayload, PreResolutionEffect,
};
pub use reactions::{
    ConstantReactionFn, EventListenerFn, EventListeners, ReactionId, ReactionRegistry,
};
pub use window::{EventWindow, ThenAbility, WindowId, WindowPhase};
