//! Proposed game-state mutations.
//!
//! An [`Event`] is a single proposed state change: a name, a structured
//! payload, a stable ordering key, a cancellation flag, and the closures that
//! decide whether it is still legal, what happens just before it resolves,
//! and the mutation itself. Events do nothing on their own; an
//! [`EventWindow`](super::EventWindow) carries a batch of them through the
//! fixed resolution phases.
//!
//! Cancellation is the only way an event fails. `check_condition` is
//! idempotent and is called repeatedly across phases because an earlier event
//! in the same batch may have invalidated a later one.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{EntityId, GameState, PlayerId, ZoneId};

use super::window::WindowId;

/// Identifier of a state-change type.
///
/// Games declare their event vocabulary as constants:
///
/// ```
/// use ccg_events::events::EventName;
///
/// pub const ON_CARD_PLAYED: EventName = EventName::new("onCardPlayed");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventName(pub &'static str);

impl EventName {
    /// Create a new event name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Get the name string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Identifier of an event within its owning window.
///
/// Assigned by [`EventWindow::add_event`](super::EventWindow::add_event);
/// then-abilities reference their trigger events by these IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub u32);

impl EventId {
    /// Create a new event ID.
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

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event({})", self.0)
    }
}

/// Structured event data.
///
/// A declared record rather than a duck-typed bag: handlers and conditions
/// read the fields they need and ignore the rest. The shape covers the
/// payloads actions actually build (the card played, the player playing it,
/// where it came from, how much of something happened).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// The card or token the event is about.
    pub card: Option<EntityId>,

    /// A second entity affected by the event (duel target, attachment host).
    pub target: Option<EntityId>,

    /// The player associated with the event.
    pub player: Option<PlayerId>,

    /// The zone the card originated from.
    pub origin: Option<ZoneId>,

    /// Numeric values (damage amount, honor delta...). Games define indices.
    pub values: SmallVec<[i64; 2]>,

    /// String tags for game-specific filtering.
    pub tags: Vec<String>,
}

impl EventPayload {
    /// Create an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the subject card (builder pattern).
    #[must_use]
    pub fn with_card(mut self, card: EntityId) -> Self {
        self.card = Some(card);
        self
    }

    /// Set the target entity (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the associated player (builder pattern).
    #[must_use]
    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    /// Set the origin zone (builder pattern).
    #[must_use]
    pub fn with_origin(mut self, origin: ZoneId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Add a numeric value (builder pattern).
    #[must_use]
    pub fn with_value(mut self, value: i64) -> Self {
        self.values.push(value);
        self
    }

    /// Add a tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Get a value by index, or a default.
    #[must_use]
    pub fn value(&self, index: usize, default: i64) -> i64 {
        self.values.get(index).copied().unwrap_or(default)
    }

    /// Check if the payload has a specific tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// The mutation an event applies at the execute phase.
pub type EventHandler = Box<dyn FnMut(&mut GameState, &EventPayload)>;

/// Re-evaluates whether the event is still legal given current state.
pub type EventCondition = Box<dyn Fn(&GameState, &EventPayload) -> bool>;

/// Effect applied strictly before execution (cost markers and the like),
/// order-independent across events by contract.
pub type PreResolutionEffect = Box<dyn FnMut(&mut GameState, &EventPayload)>;

/// A single proposed, possibly-cancelled unit of game-state mutation.
pub struct Event {
    name: EventName,
    payload: EventPayload,
    order: i32,
    cancelled: bool,
    handler: Option<EventHandler>,
    condition: Option<EventCondition>,
    pre_resolution: Option<PreResolutionEffect>,
    id: Option<EventId>,
    window: Option<WindowId>,
}

impl Event {
    /// Create a new event with default order 0 and no handler.
    ///
    /// An event without a handler is a legal no-op: it still participates in
    /// condition checks, trigger windows, and notifications.
    #[must_use]
    pub fn new(name: EventName) -> Self {
        Self {
            name,
            payload: EventPayload::default(),
            order: 0,
            cancelled: false,
            handler: None,
            condition: None,
            pre_resolution: None,
            id: None,
            window: None,
        }
    }

    /// Set the payload (builder pattern).
    #[must_use]
    pub fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = payload;
        self
    }

    /// Set the subject card on the payload (builder pattern).
    #[must_use]
    pub fn with_card(mut self, card: EntityId) -> Self {
        self.payload.card = Some(card);
        self
    }

    /// Set the associated player on the payload (builder pattern).
    #[must_use]
    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.payload.player = Some(player);
        self
    }

    /// Set the resolution order key (builder pattern).
    ///
    /// Events execute in ascending `order`; equal keys resolve in insertion
    /// order (the sort is stable by contract). Default is 0.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Set the mutation handler (builder pattern).
    #[must_use]
    pub fn with_handler(
        mut self,
        handler: impl FnMut(&mut GameState, &EventPayload) + 'static,
    ) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Set the legality condition (builder pattern).
    #[must_use]
    pub fn with_condition(
        mut self,
        condition: impl Fn(&GameState, &EventPayload) -> bool + 'static,
    ) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    /// Set the pre-resolution effect (builder pattern).
    #[must_use]
    pub fn with_pre_resolution(
        mut self,
        effect: impl FnMut(&mut GameState, &EventPayload) + 'static,
    ) -> Self {
        self.pre_resolution = Some(Box::new(effect));
        self
    }

    /// The event's name.
    #[must_use]
    pub fn name(&self) -> EventName {
        self.name
    }

    /// The event's payload.
    #[must_use]
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// The resolution order key.
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Whether the event has been cancelled.
    #[must_use]
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// The ID assigned by the owning window, if added to one.
    #[must_use]
    pub fn id(&self) -> Option<EventId> {
        self.id
    }

    /// The owning window, if added to one.
    #[must_use]
    pub fn window(&self) -> Option<WindowId> {
        self.window
    }

    /// Whether a mutation handler is attached.
    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Cancel the event.
    ///
    /// Cancellation is cooperative: it never aborts an in-flight handler,
    /// it only excludes the event from execution and then-ability chaining
    /// at the points where the pipeline checks the flag.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            self.cancelled = true;
            tracing::debug!(name = %self.name, "event cancelled");
        }
    }

    /// Re-evaluate the legality condition, cancelling on failure.
    ///
    /// Idempotent: a cancelled event stays cancelled and an event without a
    /// condition stays live no matter how often this runs.
    pub fn check_condition(&mut self, state: &GameState) {
        if self.cancelled {
            return;
        }
        if let Some(condition) = &self.condition {
            if !condition(state, &self.payload) {
                self.cancel();
            }
        }
    }

    /// Apply the pre-resolution effect, if any. Skipped once cancelled.
    pub fn pre_resolution_effect(&mut self, state: &mut GameState) {
        if self.cancelled {
            return;
        }
        if let Some(effect) = self.pre_resolution.as_mut() {
            effect(state, &self.payload);
        }
    }

    /// Apply the mutation handler.
    ///
    /// Never runs for a cancelled event. The pipeline calls this exactly once
    /// per event, at the execute phase.
    pub fn execute_handler(&mut self, state: &mut GameState) {
        if self.cancelled {
            return;
        }
        if let Some(handler) = self.handler.as_mut() {
            handler(state, &self.payload);
        }
    }

    /// One-time association with the owning window.
    ///
    /// Panics if the event already belongs to a window.
    pub(crate) fn set_window(&mut self, window: WindowId, id: EventId) {
        assert!(
            self.window.is_none(),
            "event {} already belongs to {}",
            self.name,
            self.window.expect("window set")
        );
        self.window = Some(window);
        self.id = Some(id);
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("order", &self.order)
            .field("cancelled", &self.cancelled)
            .field("has_handler", &self.handler.is_some())
            .field("id", &self.id)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
