//! Ability registry.
//!
//! Holds interrupt/reaction ability definitions keyed by event name and
//! finds the ones eligible to respond to a window's surviving events.
//! Games register abilities at startup or when cards enter play.

use rustc_hash::FxHashMap;

use crate::core::GameState;
use crate::events::{Event, EventName};

use super::ability::{AbilityContext, AbilityId, AbilityPhase, TriggeredAbility};

/// Registry for triggered abilities with lookup by event name.
#[derive(Debug, Default)]
pub struct AbilityRegistry {
    abilities: FxHashMap<AbilityId, TriggeredAbility>,
    by_event: FxHashMap<EventName, Vec<AbilityId>>,
    next_id: u32,
}

impl AbilityRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            abilities: FxHashMap::default(),
            by_event: FxHashMap::default(),
            next_id: 1,
        }
    }

    /// Register an ability, assigning and returning its ID.
    pub fn register(&mut self, mut ability: TriggeredAbility) -> AbilityId {
        let id = AbilityId::new(self.next_id);
        self.next_id += 1;
        ability.id = id;

        for event_name in &ability.event_names {
            self.by_event.entry(*event_name).or_default().push(id);
        }

        tracing::debug!(ability = %id, name = %ability.name, phase = %ability.phase, "ability registered");
        self.abilities.insert(id, ability);
        id
    }

    /// Unregister an ability (e.g. its card left play).
    pub fn unregister(&mut self, id: AbilityId) -> Option<TriggeredAbility> {
        let ability = self.abilities.remove(&id)?;
        for event_name in &ability.event_names {
            if let Some(ids) = self.by_event.get_mut(event_name) {
                ids.retain(|&aid| aid != id);
                if ids.is_empty() {
                    self.by_event.remove(event_name);
                }
            }
        }
        Some(ability)
    }

    /// Get an ability by ID.
    #[must_use]
    pub fn get(&self, id: AbilityId) -> Option<&TriggeredAbility> {
        self.abilities.get(&id)
    }

    /// Get a mutable ability by ID.
    pub fn get_mut(&mut self, id: AbilityId) -> Option<&mut TriggeredAbility> {
        self.abilities.get_mut(&id)
    }

    /// Enable or disable an ability.
    pub fn set_enabled(&mut self, id: AbilityId, enabled: bool) {
        if let Some(ability) = self.abilities.get_mut(&id) {
            ability.enabled = enabled;
        }
    }

    /// Total registered ability count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Iterate all registered abilities.
    pub fn iter(&self) -> impl Iterator<Item = &TriggeredAbility> {
        self.abilities.values()
    }

    /// Collect resolution contexts for every ability of the given phase that
    /// is eligible against the given events.
    ///
    /// One context per (ability, event) pair, over uncancelled events only.
    /// Ordered by priority descending, then ability ID, then event position
    /// in the batch, so simultaneous eligibility resolves deterministically.
    #[must_use]
    pub fn eligible(
        &self,
        phase: AbilityPhase,
        events: &[Event],
        state: &GameState,
    ) -> Vec<AbilityContext> {
        let mut results: Vec<(i32, AbilityId, usize, AbilityContext)> = Vec::new();

        for (position, event) in events.iter().enumerate() {
            if event.cancelled() {
                continue;
            }
            let Some(event_id) = event.id() else {
                continue;
            };
            let Some(ability_ids) = self.by_event.get(&event.name()) else {
                continue;
            };

            for &ability_id in ability_ids {
                let Some(ability) = self.abilities.get(&ability_id) else {
                    continue;
                };
                if ability.phase != phase || !ability.can_fire() {
                    continue;
                }
                if !ability.matches(state, event) {
                    continue;
                }

                let player = ability.controller.or(event.payload().player);
                results.push((
                    ability.priority,
                    ability_id,
                    position,
                    AbilityContext::new(ability_id, player).with_pre_events([event_id]),
                ));
            }
        }

        results.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| a.1 .0.cmp(&b.1 .0))
                .then_with(|| a.2.cmp(&b.2))
        });

        results.into_iter().map(|(_, _, _, context)| context).collect()
    }

    /// Re-check a previously collected context.
    ///
    /// An earlier resolution in the same window may have cancelled the
    /// trigger event or exhausted the ability, so eligibility is validated
    /// again immediately before each resolution.
    #[must_use]
    pub fn is_eligible(
        &self,
        context: &AbilityContext,
        events: &[Event],
        state: &GameState,
    ) -> bool {
        let Some(ability) = self.abilities.get(&context.ability) else {
            return false;
        };
        if !ability.can_fire() {
            return false;
        }

        for &event_id in &context.pre_events {
            let Some(event) = events.iter().find(|e| e.id() == Some(event_id)) else {
                return false;
            };
            if event.cancelled() {
                return false;
            }
        }

        match context.pre_event() {
            Some(primary) => events
                .iter()
                .find(|e| e.id() == Some(primary))
                .is_some_and(|event| ability.matches(state, event)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventWindow;
    use crate::events::WindowId;

    const ON_CARD_PLAYED: EventName = EventName::new("onCardPlayed");
    const ON_CARD_LEAVES: EventName = EventName::new("onCardLeavesPlay");

    fn window_with(events: Vec<Event>) -> EventWindow {
        let mut window = EventWindow::new(WindowId::new(1));
        for event in events {
            window.add_event(event);
        }
        window
    }

    #[test]
    fn test_register_assigns_ids() {
        let mut registry = AbilityRegistry::new();
        let a = registry.register(TriggeredAbility::new(
            "A",
            AbilityPhase::Interrupt,
            ON_CARD_PLAYED,
            |_| {},
        ));
        let b = registry.register(TriggeredAbility::new(
            "B",
            AbilityPhase::Reaction,
            ON_CARD_PLAYED,
            |_| {},
        ));

        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(a).unwrap().name, "A");
    }

    #[test]
    fn test_unregister_cleans_index() {
        let mut registry = AbilityRegistry::new();
        let id = registry.register(TriggeredAbility::new(
            "A",
            AbilityPhase::Reaction,
            ON_CARD_PLAYED,
            |_| {},
        ));

        assert!(registry.unregister(id).is_some());
        assert!(registry.is_empty());

        let state = GameState::new(2, 42);
        let window = window_with(vec![Event::new(ON_CARD_PLAYED)]);
        assert!(registry
            .eligible(AbilityPhase::Reaction, window.events(), &state)
            .is_empty());
    }

    #[test]
    fn test_eligible_filters_phase_and_name() {
        let state = GameState::new(2, 42);
        let mut registry = AbilityRegistry::new();
        let interrupt = registry.register(TriggeredAbility::new(
            "Interrupt",
            AbilityPhase::Interrupt,
            ON_CARD_PLAYED,
            |_| {},
        ));
        registry.register(TriggeredAbility::new(
            "WrongName",
            AbilityPhase::Interrupt,
            ON_CARD_LEAVES,
            |_| {},
        ));
        registry.register(TriggeredAbility::new(
            "Reaction",
            AbilityPhase::Reaction,
            ON_CARD_PLAYED,
            |_| {},
        ));

        let window = window_with(vec![Event::new(ON_CARD_PLAYED)]);
        let contexts = registry.eligible(AbilityPhase::Interrupt, window.events(), &state);

        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].ability, interrupt);
    }

    #[test]
    fn test_chained_ability_never_collected() {
        let state = GameState::new(2, 42);
        let mut registry = AbilityRegistry::new();
        registry.register(TriggeredAbility::chained("Delayed", |_| {}));

        let window = window_with(vec![Event::new(ON_CARD_PLAYED)]);
        assert!(registry
            .eligible(AbilityPhase::Interrupt, window.events(), &state)
            .is_empty());
        assert!(registry
            .eligible(AbilityPhase::Reaction, window.events(), &state)
            .is_empty());
    }

    #[test]
    fn test_eligible_skips_cancelled_events() {
        let state = GameState::new(2, 42);
        let mut registry = AbilityRegistry::new();
        registry.register(TriggeredAbility::new(
            "A",
            AbilityPhase::Reaction,
            ON_CARD_PLAYED,
            |_| {},
        ));

        let mut window = window_with(vec![Event::new(ON_CARD_PLAYED)]);
        window.events_mut()[0].cancel();

        assert!(registry
            .eligible(AbilityPhase::Reaction, window.events(), &state)
            .is_empty());
    }

    #[test]
    fn test_eligible_priority_ordering() {
        let state = GameState::new(2, 42);
        let mut registry = AbilityRegistry::new();
        let low = registry.register(
            TriggeredAbility::new("Low", AbilityPhase::Reaction, ON_CARD_PLAYED, |_| {})
                .with_priority(1),
        );
        let high = registry.register(
            TriggeredAbility::new("High", AbilityPhase::Reaction, ON_CARD_PLAYED, |_| {})
                .with_priority(10),
        );

        let window = window_with(vec![Event::new(ON_CARD_PLAYED)]);
        let contexts = registry.eligible(AbilityPhase::Reaction, window.events(), &state);

        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0].ability, high);
        assert_eq!(contexts[1].ability, low);
    }

    #[test]
    fn test_is_eligible_rechecks_cancellation() {
        let state = GameState::new(2, 42);
        let mut registry = AbilityRegistry::new();
        registry.register(TriggeredAbility::new(
            "A",
            AbilityPhase::Reaction,
            ON_CARD_PLAYED,
            |_| {},
        ));

        let mut window = window_with(vec![Event::new(ON_CARD_PLAYED)]);
        let contexts = registry.eligible(AbilityPhase::Reaction, window.events(), &state);
        assert_eq!(contexts.len(), 1);
        assert!(registry.is_eligible(&contexts[0], window.events(), &state));

        window.events_mut()[0].cancel();
        assert!(!registry.is_eligible(&contexts[0], window.events(), &state));
    }

    #[test]
    fn test_exhausted_uses_not_eligible() {
        let state = GameState::new(2, 42);
        let mut registry = AbilityRegistry::new();
        let id = registry.register(
            TriggeredAbility::new("Once", AbilityPhase::Reaction, ON_CARD_PLAYED, |_| {})
                .with_uses(1),
        );

        let window = window_with(vec![Event::new(ON_CARD_PLAYED)]);
        assert_eq!(
            registry
                .eligible(AbilityPhase::Reaction, window.events(), &state)
                .len(),
            1
        );

        registry.get_mut(id).unwrap().note_use();
        assert!(registry
            .eligible(AbilityPhase::Reaction, window.events(), &state)
            .is_empty());
    }
}
