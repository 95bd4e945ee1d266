//! Triggered abilities: definitions, registry, and the trigger windows.
//!
//! Abilities respond to events during the interrupt and reaction phases that
//! bracket a batch's execution. The engine provides the machinery (matching,
//! ordering, re-validation, resolution scoping) while games supply the
//! actual effects as closures.
//!
//! ## Key Components
//!
//! - [`TriggeredAbility`]: one ability definition (phase, event names,
//!   predicate, effect)
//! - [`AbilityRegistry`]: storage and per-event-name lookup
//! - [`AbilityContext`]: a pending resolution carrying its trigger events
//! - [`AbilityScope`]: what an effect sees while resolving
//! - [`TriggeredAbilityWindow`]: the continuable interrupt/reaction step

mod ability;
mod registry;
mod window;

pub use ability::{
    AbilityCondition, AbilityContext, AbilityEffect, AbilityId, AbilityPhase, AbilityScope,
    TriggeredAbility,
};
pub use registry::AbilityRegistry;
pub use window::TriggeredAbilityWindow;
