//! Triggered-ability definitions.
//!
//! A [`TriggeredAbility`] watches for named events during one of the two
//! trigger phases that bracket execution: `Interrupt` (before an event batch
//! resolves, able to cancel it) or `Reaction` (after). Its effect is an
//! arbitrary closure over an [`AbilityScope`], which exposes the shared game
//! state, the enclosing window's events, and the ability to open nested
//! event windows, which is the source of the pipeline's re-entrancy.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{GameState, PlayerId};
use crate::events::{Event, EventId, EventName};

/// Unique identifier for a registered ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityId(pub u32);

impl AbilityId {
    /// Create a new ability ID.
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

impl std::fmt::Display for AbilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ability({})", self.0)
    }
}

/// The two trigger phases bracketing an event batch's execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityPhase {
    /// Before the batch resolves; may cancel events.
    Interrupt,
    /// After the batch resolved.
    Reaction,
}

impl std::fmt::Display for AbilityPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbilityPhase::Interrupt => f.write_str("interrupt"),
            AbilityPhase::Reaction => f.write_str("reaction"),
        }
    }
}

/// A pending ability resolution.
///
/// Carries the ability to resolve, the choosing player, and the trigger
/// events (`pre_events`, first one the primary trigger). Built by the
/// triggered-ability window, by then-ability chaining, and by constant
/// reactions; resolved through
/// [`Game::resolve_ability`](crate::game::Game::resolve_ability).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbilityContext {
    /// The ability being resolved.
    pub ability: AbilityId,

    /// The player making choices for the resolution.
    pub player: Option<PlayerId>,

    /// IDs of the trigger events within the enclosing window.
    pub pre_events: SmallVec<[EventId; 2]>,
}

impl AbilityContext {
    /// Create a context with no trigger events.
    #[must_use]
    pub fn new(ability: AbilityId, player: Option<PlayerId>) -> Self {
        Self {
            ability,
            player,
            pre_events: SmallVec::new(),
        }
    }

    /// Set the trigger events (builder pattern).
    #[must_use]
    pub fn with_pre_events(mut self, events: impl IntoIterator<Item = EventId>) -> Self {
        self.pre_events = events.into_iter().collect();
        self
    }

    /// The primary trigger event, if any.
    #[must_use]
    pub fn pre_event(&self) -> Option<EventId> {
        self.pre_events.first().copied()
    }
}

/// What an ability effect sees while resolving.
///
/// The slice of events is the *enclosing* window's batch, so an interrupt
/// resolution can cancel the very events it responded to. Nested windows
/// requested via [`open_window`](AbilityScope::open_window) are pushed after
/// the effect returns and drain to completion before the enclosing window's
/// pipeline advances.
pub struct AbilityScope<'a> {
    /// The shared game state.
    pub state: &'a mut GameState,
    events: &'a mut [Event],
    context: &'a AbilityContext,
    opened: &'a mut Vec<Vec<Event>>,
}

impl<'a> AbilityScope<'a> {
    pub(crate) fn new(
        state: &'a mut GameState,
        events: &'a mut [Event],
        context: &'a AbilityContext,
        opened: &'a mut Vec<Vec<Event>>,
    ) -> Self {
        Self {
            state,
            events,
            context,
            opened,
        }
    }

    /// The resolution context.
    #[must_use]
    pub fn context(&self) -> &AbilityContext {
        self.context
    }

    /// The enclosing window's events.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        self.events
    }

    /// Look up an enclosing event by ID.
    #[must_use]
    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id() == Some(id))
    }

    /// The primary trigger event, if it is still in the window.
    #[must_use]
    pub fn pre_event(&self) -> Option<&Event> {
        self.context.pre_event().and_then(|id| self.event(id))
    }

    /// Cancel an enclosing event.
    ///
    /// Returns false if no event with that ID is in the window.
    pub fn cancel_event(&mut self, id: EventId) -> bool {
        match self.events.iter_mut().find(|e| e.id() == Some(id)) {
            Some(event) => {
                event.cancel();
                true
            }
            None => false,
        }
    }

    /// Request a nested event window for the given batch.
    pub fn open_window(&mut self, events: Vec<Event>) {
        self.opened.push(events);
    }
}

/// The work an ability performs when it resolves.
pub type AbilityEffect = Box<dyn FnMut(AbilityScope<'_>)>;

/// Extra trigger predicate beyond matching the event name.
pub type AbilityCondition = Box<dyn Fn(&GameState, &Event) -> bool>;

/// A triggered-ability definition.
pub struct TriggeredAbility {
    pub(crate) id: AbilityId,

    /// Human-readable name (for debugging and logs).
    pub name: String,

    /// Which trigger phase this ability belongs to.
    pub phase: AbilityPhase,

    /// Event names this ability listens for.
    pub event_names: SmallVec<[EventName; 1]>,

    /// The player who controls (and resolves) this ability.
    pub controller: Option<PlayerId>,

    /// Resolution priority among simultaneously eligible abilities
    /// (higher resolves first; ID ties are stable).
    pub priority: i32,

    /// Is this ability currently active?
    pub enabled: bool,

    /// How many times can this ability fire? `None` = unlimited.
    pub uses_remaining: Option<u32>,

    condition: Option<AbilityCondition>,
    effect: AbilityEffect,
}

impl TriggeredAbility {
    /// Create a new ability.
    ///
    /// The ID is assigned when the ability is registered.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        phase: AbilityPhase,
        event_name: EventName,
        effect: impl FnMut(AbilityScope<'_>) + 'static,
    ) -> Self {
        Self {
            id: AbilityId(0),
            name: name.into(),
            phase,
            event_names: SmallVec::from_elem(event_name, 1),
            controller: None,
            priority: 0,
            enabled: true,
            uses_remaining: None,
            condition: None,
            effect: Box::new(effect),
        }
    }

    /// Create an ability resolved only through explicit chaining.
    ///
    /// A chained ability listens for no event names, so trigger windows never
    /// collect it; it runs only where its ID is handed to the engine
    /// directly (then-ability registration, constant reactions). Keeping
    /// chained effects out of the trigger index is what stops a then-ability
    /// from also firing as an ordinary reaction to its own trigger events.
    #[must_use]
    pub fn chained(name: impl Into<String>, effect: impl FnMut(AbilityScope<'_>) + 'static) -> Self {
        Self {
            id: AbilityId(0),
            name: name.into(),
            phase: AbilityPhase::Reaction,
            event_names: SmallVec::new(),
            controller: None,
            priority: 0,
            enabled: true,
            uses_remaining: None,
            condition: None,
            effect: Box::new(effect),
        }
    }

    /// Listen for an additional event name (builder pattern).
    #[must_use]
    pub fn also_on(mut self, event_name: EventName) -> Self {
        if !self.event_names.contains(&event_name) {
            self.event_names.push(event_name);
        }
        self
    }

    /// Set the trigger predicate (builder pattern).
    #[must_use]
    pub fn with_condition(
        mut self,
        condition: impl Fn(&GameState, &Event) -> bool + 'static,
    ) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    /// Set the controller (builder pattern).
    #[must_use]
    pub fn with_controller(mut self, controller: PlayerId) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Set the resolution priority (builder pattern).
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set limited uses (builder pattern).
    #[must_use]
    pub fn with_uses(mut self, uses: u32) -> Self {
        self.uses_remaining = Some(uses);
        self
    }

    /// The registered ID.
    #[must_use]
    pub fn id(&self) -> AbilityId {
        self.id
    }

    /// True when the ability listens for no event names and therefore only
    /// resolves through explicit chaining.
    #[must_use]
    pub fn is_chained(&self) -> bool {
        self.event_names.is_empty()
    }

    /// Check if this ability can fire (enabled and has uses).
    #[must_use]
    pub fn can_fire(&self) -> bool {
        self.enabled && self.uses_remaining.map_or(true, |u| u > 0)
    }

    /// Evaluate the trigger predicate against a candidate event.
    #[must_use]
    pub fn matches(&self, state: &GameState, event: &Event) -> bool {
        if !self.event_names.contains(&event.name()) {
            return false;
        }
        match &self.condition {
            Some(condition) => condition(state, event),
            None => true,
        }
    }

    /// Consume one use.
    pub(crate) fn note_use(&mut self) {
        if let Some(uses) = self.uses_remaining.as_mut() {
            *uses = uses.saturating_sub(1);
        }
    }

    /// Run the effect.
    pub(crate) fn execute(&mut self, scope: AbilityScope<'_>) {
        (self.effect)(scope);
    }
}

impl std::fmt::Debug for TriggeredAbility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggeredAbility")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("event_names", &self.event_names)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .field("uses_remaining", &self.uses_remaining)
            .finish_non_exhaustive()
    }
}
