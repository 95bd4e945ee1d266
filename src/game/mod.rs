//! The game context: state, registries, and the window-stack driver.
//!
//! [`Game`] owns the single shared [`GameState`], the ability and
//! subscriber registries, and an explicit stack of open event windows. The
//! top of the stack is the *current* window; nesting is the stack itself,
//! pushed when a resolution opens a window and popped when a window's last
//! phase runs. Windows therefore form a strict stack: a nested window drains
//! to completion before its parent advances, and arbitrarily deep recursion
//! cannot corrupt the parent chain.
//!
//! Execution is single-threaded and cooperative. [`Game::advance`] runs
//! exactly one step of the top window and returns, so an outer server loop
//! can interleave per-turn bookkeeping (or serve a player prompt) between
//! steps; [`Game::run_until_idle`] is the plain draining loop.

use crate::abilities::{AbilityContext, AbilityId, AbilityRegistry, AbilityScope, TriggeredAbility};
use crate::core::GameState;
use crate::events::{
    Event, EventListeners, EventName, EventWindow, ReactionId, ReactionRegistry, WindowId,
    WindowPhase,
};

/// Global consistency pass invoked at phase 6 of every window.
///
/// Receives whether any event in the batch carried a handler (so cleanup of
/// destroyed cards and the like knows whether anything actually happened)
/// and the full batch for context. Supplied by the embedding game.
pub type StateChecker = Box<dyn FnMut(&mut GameState, bool, &[Event])>;

/// Result of one driver step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStatus {
    /// One step of the identified window ran.
    Advanced {
        /// The window that advanced.
        window: WindowId,
        /// The phase that executed.
        phase: WindowPhase,
    },
    /// No windows are open.
    Idle,
}

/// The game context driving event resolution.
pub struct Game {
    /// The shared game state mutated by event handlers.
    pub state: GameState,
    abilities: AbilityRegistry,
    constant_reactions: ReactionRegistry,
    listeners: EventListeners,
    state_check: Option<StateChecker>,
    windows: Vec<EventWindow>,
    next_window_id: u32,
}

impl Game {
    /// Create a game context for `player_count` players with a fixed seed.
    #[must_use]
    pub fn new(player_count: usize, seed: u64) -> Self {
        Self {
            state: GameState::new(player_count, seed),
            abilities: AbilityRegistry::new(),
            constant_reactions: ReactionRegistry::new(),
            listeners: EventListeners::new(),
            state_check: None,
            windows: Vec::new(),
            next_window_id: 1,
        }
    }

    // === Registries & Hooks ===

    /// Register a triggered ability.
    pub fn register_ability(&mut self, ability: TriggeredAbility) -> AbilityId {
        self.abilities.register(ability)
    }

    /// The ability registry.
    #[must_use]
    pub fn abilities(&self) -> &AbilityRegistry {
        &self.abilities
    }

    /// The ability registry, mutably.
    pub fn abilities_mut(&mut self) -> &mut AbilityRegistry {
        &mut self.abilities
    }

    /// Register a constant reaction for an event name.
    pub fn register_constant_reaction(
        &mut self,
        event_name: EventName,
        name: impl Into<String>,
        handler: impl FnMut(&mut GameState, &Event) -> Option<AbilityContext> + 'static,
    ) -> ReactionId {
        self.constant_reactions.register(event_name, name, handler)
    }

    /// Unregister a constant reaction.
    pub fn unregister_constant_reaction(&mut self, id: ReactionId) -> bool {
        self.constant_reactions.unregister(id)
    }

    /// Subscribe a listener notified after events of this name execute.
    pub fn on_event(
        &mut self,
        event_name: EventName,
        listener: impl FnMut(&mut GameState, &Event) + 'static,
    ) {
        self.listeners.on(event_name, listener);
    }

    /// Install the global state-consistency check run at phase 6.
    pub fn set_state_checker(
        &mut self,
        checker: impl FnMut(&mut GameState, bool, &[Event]) + 'static,
    ) {
        self.state_check = Some(Box::new(checker));
    }

    // === Windows ===

    /// Open an event window over a batch of events and push it onto the
    /// window stack. Already-cancelled events are dropped on entry.
    ///
    /// The window runs through [`advance`](Game::advance); opening only
    /// schedules it.
    pub fn open_event_window(&mut self, events: impl IntoIterator<Item = Event>) -> WindowId {
        let id = WindowId::new(self.next_window_id);
        self.next_window_id += 1;

        let mut window = EventWindow::new(id);
        for event in events {
            if event.cancelled() {
                tracing::debug!(name = %event.name(), "pre-cancelled event dropped at window open");
                continue;
            }
            window.add_event(event);
        }

        tracing::debug!(
            window = %id,
            events = window.events().len(),
            depth = self.windows.len(),
            "event window opened"
        );
        self.windows.push(window);
        id
    }

    /// The currently active window (top of the stack), if any.
    #[must_use]
    pub fn current_window(&self) -> Option<&EventWindow> {
        self.windows.last()
    }

    /// The currently active window, mutably.
    pub fn current_window_mut(&mut self) -> Option<&mut EventWindow> {
        self.windows.last_mut()
    }

    /// Look up an open window by ID.
    #[must_use]
    pub fn window(&self, id: WindowId) -> Option<&EventWindow> {
        self.windows.iter().find(|w| w.id() == id)
    }

    /// Look up an open window by ID, mutably.
    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut EventWindow> {
        self.windows.iter_mut().find(|w| w.id() == id)
    }

    /// Number of open windows.
    #[must_use]
    pub fn window_depth(&self) -> usize {
        self.windows.len()
    }

    /// Register a then-ability on an open window.
    ///
    /// The ability must have been registered via
    /// [`TriggeredAbility::chained`]; an ability that also listens for event
    /// names would be collected by the trigger windows and resolve a second
    /// time there, even when the chain was dropped over a cancelled trigger.
    ///
    /// Panics if the ability is not a registered chained ability, or if the
    /// window is not open; both are bugs in the calling action or ability.
    pub fn add_then_ability(
        &mut self,
        window: WindowId,
        events: impl IntoIterator<Item = crate::events::EventId>,
        ability: AbilityId,
        player: Option<crate::core::PlayerId>,
    ) {
        assert!(
            self.abilities
                .get(ability)
                .is_some_and(TriggeredAbility::is_chained),
            "then-ability {ability} must be registered as a chained ability"
        );
        let window = self
            .window_mut(window)
            .unwrap_or_else(|| panic!("then-ability registered on a window that is not open"));
        window.add_then_ability(events, ability, player);
    }

    // === Driver ===

    /// Run exactly one step of the top window.
    ///
    /// A window popped for its step is re-inserted *below* any windows the
    /// step opened, so nested windows drain first.
    pub fn advance(&mut self) -> PipelineStatus {
        let Some(mut window) = self.windows.pop() else {
            return PipelineStatus::Idle;
        };
        let depth = self.windows.len();
        let id = window.id();

        let phase = window.advance_one(self);

        if window.is_complete() {
            debug_assert_eq!(phase, WindowPhase::ResetCurrentWindow);
            tracing::debug!(window = %id, "event window complete");
        } else {
            self.windows.insert(depth, window);
        }

        PipelineStatus::Advanced { window: id, phase }
    }

    /// Drain every open window to completion.
    pub fn run_until_idle(&mut self) {
        while let PipelineStatus::Advanced { .. } = self.advance() {}
    }

    // === Resolution entry points ===

    /// Resolve an ability context against the current window.
    ///
    /// This is the entry point then-abilities, constant reactions, and
    /// trigger windows all funnel through; external collaborators may call
    /// it directly as well (with no window open, the effect sees an empty
    /// event batch). Windows opened by the effect nest above the current
    /// one.
    pub fn resolve_ability(&mut self, context: AbilityContext) {
        if let Some(mut window) = self.windows.pop() {
            let depth = self.windows.len();
            self.resolve_ability_in(&mut window, context);
            self.windows.insert(depth, window);
        } else {
            let mut no_events: [Event; 0] = [];
            self.resolve_ability_over(&mut no_events, context);
        }
    }

    pub(crate) fn resolve_ability_in(&mut self, window: &mut EventWindow, context: AbilityContext) {
        self.resolve_ability_over(window.events_mut(), context);
    }

    fn resolve_ability_over(&mut self, events: &mut [Event], context: AbilityContext) {
        let mut opened: Vec<Vec<Event>> = Vec::new();

        {
            let Some(ability) = self.abilities.get_mut(context.ability) else {
                tracing::warn!(ability = %context.ability, "resolving an unregistered ability");
                return;
            };
            if !ability.can_fire() {
                return;
            }
            ability.note_use();
            tracing::debug!(ability = %ability.id(), name = %ability.name, "ability resolving");

            let scope = AbilityScope::new(&mut self.state, events, &context, &mut opened);
            ability.execute(scope);
        }

        for batch in opened {
            self.open_event_window(batch);
        }
    }

    // === Pipeline collaborators ===

    /// Phase 5: record and broadcast an executed event.
    pub(crate) fn emit(&mut self, event: &Event) {
        self.listeners.emit(&mut self.state, event);
    }

    /// Phase 6: run the installed state checker, if any.
    pub(crate) fn run_state_check(&mut self, had_handler: bool, events: &[Event]) {
        if let Some(check) = self.state_check.as_mut() {
            check(&mut self.state, had_handler, events);
        }
    }

    /// Phase 8: notify constant reactions for one event.
    pub(crate) fn notify_constant_reactions(&mut self, event: &Event) -> Vec<AbilityContext> {
        self.constant_reactions.notify(&mut self.state, event)
    }

    /// Phase 10: a completed window hands control back; the new top of the
    /// stack re-checks its event conditions exactly once, because the
    /// child's resolution may have invalidated them.
    pub(crate) fn check_parent_window(&mut self) {
        if let Some(parent) = self.windows.last_mut() {
            parent.check_event_condition(&self.state);
            tracing::debug!(window = %parent.id(), "parent window conditions re-checked");
        }
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("abilities", &self.abilities.len())
            .field("constant_reactions", &self.constant_reactions.len())
            .field("window_depth", &self.windows.len())
            .finish_non_exhaustive()
    }
}
