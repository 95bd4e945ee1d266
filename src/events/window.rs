//! The event window: orchestrator of the ten-phase resolution pipeline.
//!
//! A window owns one batch of [`Event`]s and carries it through a fixed
//! sequence of phases:
//!
//! 1.  set current window
//! 2.  check event conditions
//! 3.  open the interrupt window
//! 4.  pre-resolution effects
//! 5.  execute handlers (stable `order` sort, conditions re-checked per event)
//! 6.  check game state
//! 7.  check then-abilities
//! 8.  constant reactions
//! 9.  open the reaction window
//! 10. reset current window
//!
//! No phase is ever skipped or reordered, and a window with zero surviving
//! events still runs all ten (the trigger windows simply open over nothing).
//! Phases 3 and 9 inject a [`TriggeredAbilityWindow`] step whose resolutions
//! may push nested event windows; the window stack in
//! [`Game`](crate::game::Game) guarantees those drain completely before this
//! window's pipeline advances.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::abilities::{AbilityContext, AbilityId, AbilityPhase, TriggeredAbilityWindow};
use crate::core::{EventRecord, GameState, PlayerId};
use crate::game::Game;
use crate::pipeline::{Pipeline, StepStatus};

use super::event::{Event, EventId};

/// Unique identifier for an event window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u32);

impl WindowId {
    /// Create a new window ID.
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

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Window({})", self.0)
    }
}

/// The phase a single driver step executed.
///
/// The ten fixed phases appear exactly once per window in the order above;
/// `AbilityWindow` and `AbilityResolution` are the injected steps serving
/// phases 3/7/8/9 and may appear any number of times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WindowPhase {
    SetCurrentWindow,
    CheckEventCondition,
    OpenInterruptWindow,
    PreResolutionEffects,
    ExecuteHandlers,
    CheckGameState,
    CheckThenAbilities,
    ConstantReactions,
    OpenReactionWindow,
    ResetCurrentWindow,
    /// A triggered-ability window collecting or resolving one response.
    AbilityWindow,
    /// A queued then-ability or constant-reaction resolution.
    AbilityResolution,
}

impl WindowPhase {
    /// True for the ten fixed phases (not the injected sub-steps).
    #[must_use]
    pub fn is_fixed(self) -> bool {
        !matches!(self, WindowPhase::AbilityWindow | WindowPhase::AbilityResolution)
    }
}

impl std::fmt::Display for WindowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WindowPhase::SetCurrentWindow => "setCurrentWindow",
            WindowPhase::CheckEventCondition => "checkEventCondition",
            WindowPhase::OpenInterruptWindow => "openInterruptWindow",
            WindowPhase::PreResolutionEffects => "preResolutionEffects",
            WindowPhase::ExecuteHandlers => "executeHandlers",
            WindowPhase::CheckGameState => "checkGameState",
            WindowPhase::CheckThenAbilities => "checkThenAbilities",
            WindowPhase::ConstantReactions => "triggerConstantReactions",
            WindowPhase::OpenReactionWindow => "openReactionWindow",
            WindowPhase::ResetCurrentWindow => "resetCurrentWindow",
            WindowPhase::AbilityWindow => "abilityWindow",
            WindowPhase::AbilityResolution => "abilityResolution",
        };
        f.write_str(name)
    }
}

/// A chained ability that resolves after execution only if its *entire*
/// trigger event set survived uncancelled (all-or-nothing).
#[derive(Clone, Debug)]
pub struct ThenAbility {
    /// Trigger events within the owning window; the first is primary.
    pub events: SmallVec<[EventId; 2]>,
    /// The ability to resolve.
    pub ability: AbilityId,
    /// The player resolving it.
    pub player: Option<PlayerId>,
}

/// One step of a window's pipeline.
#[derive(Debug)]
enum WindowStep {
    SetCurrentWindow,
    CheckEventCondition,
    OpenWindow(AbilityPhase),
    PreResolutionEffects,
    ExecuteHandlers,
    CheckGameState,
    CheckThenAbilities,
    ConstantReactions,
    ResetCurrentWindow,
    /// Injected by `OpenWindow` when the batch is non-empty.
    AbilityWindow(TriggeredAbilityWindow),
    /// Injected by then-ability chaining and constant reactions.
    ResolveAbility(AbilityContext),
}

/// The orchestrator for one batch of events.
#[derive(Debug)]
pub struct EventWindow {
    id: WindowId,
    events: Vec<Event>,
    then_abilities: Vec<ThenAbility>,
    pipeline: Pipeline<WindowStep>,
    /// The window that was current when this one reached phase 1.
    previous: Option<WindowId>,
    next_event_id: u32,
    executed: bool,
}

impl EventWindow {
    pub(crate) fn new(id: WindowId) -> Self {
        let mut pipeline = Pipeline::new();
        pipeline.initialise([
            WindowStep::SetCurrentWindow,
            WindowStep::CheckEventCondition,
            WindowStep::OpenWindow(AbilityPhase::Interrupt),
            WindowStep::PreResolutionEffects,
            WindowStep::ExecuteHandlers,
            WindowStep::CheckGameState,
            WindowStep::CheckThenAbilities,
            WindowStep::ConstantReactions,
            WindowStep::OpenWindow(AbilityPhase::Reaction),
            WindowStep::ResetCurrentWindow,
        ]);

        Self {
            id,
            events: Vec::new(),
            then_abilities: Vec::new(),
            pipeline,
            previous: None,
            next_event_id: 0,
            executed: false,
        }
    }

    /// This window's ID.
    #[must_use]
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// The window that was current when this one started, if any.
    #[must_use]
    pub fn previous(&self) -> Option<WindowId> {
        self.previous
    }

    /// The batch, in insertion order until the execute phase sorts it.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Look up an event by ID.
    #[must_use]
    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id() == Some(id))
    }

    /// Registered then-abilities not yet checked.
    #[must_use]
    pub fn then_abilities(&self) -> &[ThenAbility] {
        &self.then_abilities
    }

    /// True once every phase has run.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pipeline.is_complete()
    }

    pub(crate) fn events_mut(&mut self) -> &mut [Event] {
        &mut self.events
    }

    /// Add an event to the batch, assigning its ID and window association.
    ///
    /// Panics if the execute phase has already run; events joining a batch
    /// that late is a bug in an action or ability, not a game situation.
    pub fn add_event(&mut self, mut event: Event) -> EventId {
        assert!(
            !self.executed,
            "{}: cannot add events after the execute phase",
            self.id
        );
        let id = EventId::new(self.next_event_id);
        self.next_event_id += 1;
        event.set_window(self.id, id);
        self.events.push(event);
        id
    }

    /// Remove an event from the batch before execution.
    ///
    /// Panics if the execute phase has already run.
    pub fn remove_event(&mut self, id: EventId) -> Option<Event> {
        assert!(
            !self.executed,
            "{}: cannot remove events after the execute phase",
            self.id
        );
        let position = self.events.iter().position(|e| e.id() == Some(id))?;
        Some(self.events.remove(position))
    }

    /// Register a chained ability over trigger events of this window.
    ///
    /// The ability resolves at phase 7 only if none of the trigger events
    /// has been cancelled by then. The ID is expected to name a chained
    /// registration; [`Game::add_then_ability`](crate::game::Game::add_then_ability)
    /// enforces that.
    pub fn add_then_ability(
        &mut self,
        events: impl IntoIterator<Item = EventId>,
        ability: AbilityId,
        player: Option<PlayerId>,
    ) {
        self.then_abilities.push(ThenAbility {
            events: events.into_iter().collect(),
            ability,
            player,
        });
    }

    /// Re-evaluate every event's condition.
    ///
    /// Called at phase 2, per event again during phase 5, and once on this
    /// window when a nested child completes (the child's resolution may have
    /// invalidated events here).
    pub fn check_event_condition(&mut self, state: &GameState) {
        for event in &mut self.events {
            event.check_condition(state);
        }
    }

    /// Run exactly one pending step. Returns the phase that executed.
    pub(crate) fn advance_one(&mut self, game: &mut Game) -> WindowPhase {
        let step = self
            .pipeline
            .next_step()
            .expect("advancing a completed event window");

        match step {
            WindowStep::SetCurrentWindow => {
                self.previous = game.current_window().map(EventWindow::id);
                tracing::debug!(
                    window = %self.id,
                    previous = ?self.previous,
                    events = self.events.len(),
                    "window became current"
                );
                WindowPhase::SetCurrentWindow
            }
            WindowStep::CheckEventCondition => {
                self.check_event_condition(&game.state);
                WindowPhase::CheckEventCondition
            }
            WindowStep::OpenWindow(phase) => {
                // An empty batch opens no trigger window, but the phase still runs.
                if !self.events.is_empty() {
                    self.pipeline
                        .queue_front(WindowStep::AbilityWindow(TriggeredAbilityWindow::new(phase)));
                }
                match phase {
                    AbilityPhase::Interrupt => WindowPhase::OpenInterruptWindow,
                    AbilityPhase::Reaction => WindowPhase::OpenReactionWindow,
                }
            }
            WindowStep::PreResolutionEffects => {
                for event in &mut self.events {
                    event.pre_resolution_effect(&mut game.state);
                }
                WindowPhase::PreResolutionEffects
            }
            WindowStep::ExecuteHandlers => {
                self.execute_handlers(game);
                WindowPhase::ExecuteHandlers
            }
            WindowStep::CheckGameState => {
                let had_handler = self.events.iter().any(Event::has_handler);
                game.run_state_check(had_handler, &self.events);
                WindowPhase::CheckGameState
            }
            WindowStep::CheckThenAbilities => {
                self.check_then_abilities();
                WindowPhase::CheckThenAbilities
            }
            WindowStep::ConstantReactions => {
                let mut contexts = Vec::new();
                for index in 0..self.events.len() {
                    contexts.extend(game.notify_constant_reactions(&self.events[index]));
                }
                self.pipeline
                    .queue_front_all(contexts.into_iter().map(WindowStep::ResolveAbility));
                WindowPhase::ConstantReactions
            }
            WindowStep::ResolveAbility(context) => {
                game.resolve_ability_in(self, context);
                WindowPhase::AbilityResolution
            }
            WindowStep::AbilityWindow(mut window) => {
                if window.advance(game, self) == StepStatus::Processing {
                    self.pipeline.queue_front(WindowStep::AbilityWindow(window));
                }
                WindowPhase::AbilityWindow
            }
            WindowStep::ResetCurrentWindow => {
                game.check_parent_window();
                tracing::debug!(window = %self.id, "window reset");
                WindowPhase::ResetCurrentWindow
            }
        }
    }

    /// Phase 5: stable sort by `order`, then per event re-check the
    /// condition (an earlier event in the same batch may have fizzled it),
    /// apply the handler, and notify listeners.
    fn execute_handlers(&mut self, game: &mut Game) {
        self.events.sort_by_key(Event::order);

        for index in 0..self.events.len() {
            let event = &mut self.events[index];
            event.check_condition(&game.state);
            if event.cancelled() {
                continue;
            }
            event.execute_handler(&mut game.state);
            tracing::debug!(name = %self.events[index].name(), window = %self.id, "event executed");

            let record = EventRecord {
                name: self.events[index].name().as_str().to_string(),
                turn: game.state.turn_number,
                player: self.events[index].payload().player,
            };
            game.state.record_event(record);
            game.emit(&self.events[index]);
        }

        self.executed = true;
    }

    /// Phase 7: queue a resolution for every then-ability whose entire
    /// trigger set survived; drop the rest entirely.
    fn check_then_abilities(&mut self) {
        let then_abilities = std::mem::take(&mut self.then_abilities);
        let mut contexts = Vec::new();

        for then in then_abilities {
            let survived = then
                .events
                .iter()
                .all(|&id| self.event(id).is_some_and(|e| !e.cancelled()));

            if survived {
                contexts.push(
                    AbilityContext::new(then.ability, then.player).with_pre_events(then.events),
                );
            } else {
                tracing::debug!(
                    ability = %then.ability,
                    window = %self.id,
                    "then-ability dropped, trigger event cancelled"
                );
            }
        }

        self.pipeline
            .queue_front_all(contexts.into_iter().map(WindowStep::ResolveAbility));
    }
}
