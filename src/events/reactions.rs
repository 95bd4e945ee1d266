//! Constant-reaction and event-listener registries.
//!
//! Two subscriber registries keyed by event name, queried synchronously.
//! There is no implicit global event bus.
//!
//! [`ReactionRegistry`] serves phase 8 of the window pipeline: constant
//! (passive-style) reactions are notified once per event in the batch,
//! cancelled events included, outside the interrupt/reaction priority
//! system. A reaction may hand back an [`AbilityContext`] to resolve, which
//! the window queues before the reaction window opens.
//!
//! [`EventListeners`] serves phase 5: plain listeners notified after each
//! event's handler actually executed (cancelled events are never emitted).

use rustc_hash::FxHashMap;

use crate::abilities::AbilityContext;
use crate::core::GameState;

use super::event::{Event, EventName};

/// Unique identifier for a registered constant reaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReactionId(pub u32);

impl ReactionId {
    /// Create a new reaction ID.
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

impl std::fmt::Display for ReactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reaction({})", self.0)
    }
}

/// A constant reaction's response to a notification.
///
/// Returning `Some` asks the window to resolve that ability context before
/// the reaction window opens.
pub type ConstantReactionFn = Box<dyn FnMut(&mut GameState, &Event) -> Option<AbilityContext>>;

struct ConstantReaction {
    id: ReactionId,
    name: String,
    handler: ConstantReactionFn,
}

/// Registry of constant reactions, keyed by event name.
#[derive(Default)]
pub struct ReactionRegistry {
    by_event: FxHashMap<EventName, Vec<ConstantReaction>>,
    next_id: u32,
}

impl ReactionRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_event: FxHashMap::default(),
            next_id: 1,
        }
    }

    /// Register a constant reaction for an event name.
    pub fn register(
        &mut self,
        event_name: EventName,
        name: impl Into<String>,
        handler: impl FnMut(&mut GameState, &Event) -> Option<AbilityContext> + 'static,
    ) -> ReactionId {
        let id = ReactionId::new(self.next_id);
        self.next_id += 1;
        self.by_event.entry(event_name).or_default().push(ConstantReaction {
            id,
            name: name.into(),
            handler: Box::new(handler),
        });
        id
    }

    /// Unregister a constant reaction. Returns true if it existed.
    pub fn unregister(&mut self, id: ReactionId) -> bool {
        let mut removed = false;
        self.by_event.retain(|_, reactions| {
            let before = reactions.len();
            reactions.retain(|r| r.id != id);
            removed |= reactions.len() != before;
            !reactions.is_empty()
        });
        removed
    }

    /// Notify every reaction registered for the event's name.
    ///
    /// Returns the ability contexts the reactions asked to resolve, in
    /// registration order.
    pub fn notify(&mut self, state: &mut GameState, event: &Event) -> Vec<AbilityContext> {
        let Some(reactions) = self.by_event.get_mut(&event.name()) else {
            return Vec::new();
        };

        let mut contexts = Vec::new();
        for reaction in reactions {
            if let Some(context) = (reaction.handler)(state, event) {
                tracing::trace!(
                    reaction = %reaction.id,
                    name = %reaction.name,
                    event = %event.name(),
                    "constant reaction queued a resolution"
                );
                contexts.push(context);
            }
        }
        contexts
    }

    /// Total registered reaction count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_event.values().map(Vec::len).sum()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_event.is_empty()
    }
}

impl std::fmt::Debug for ReactionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionRegistry")
            .field("reactions", &self.len())
            .finish()
    }
}

/// A listener invoked after an event's handler executed.
pub type EventListenerFn = Box<dyn FnMut(&mut GameState, &Event)>;

/// Registry of post-execution listeners, keyed by event name.
#[derive(Default)]
pub struct EventListeners {
    by_event: FxHashMap<EventName, Vec<EventListenerFn>>,
}

impl EventListeners {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a listener to an event name.
    pub fn on(
        &mut self,
        event_name: EventName,
        listener: impl FnMut(&mut GameState, &Event) + 'static,
    ) {
        self.by_event.entry(event_name).or_default().push(Box::new(listener));
    }

    /// Notify every listener subscribed to the event's name.
    pub fn emit(&mut self, state: &mut GameState, event: &Event) {
        if let Some(listeners) = self.by_event.get_mut(&event.name()) {
            for listener in listeners {
                listener(state, event);
            }
        }
    }

    /// Number of listeners for an event name.
    #[must_use]
    pub fn listener_count(&self, event_name: EventName) -> usize {
        self.by_event.get(&event_name).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListeners")
            .field("event_names", &self.by_event.len())
            .finish()
    }
}
