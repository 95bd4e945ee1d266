//! Triggered-ability window.
//!
//! A continuable step injected into an event window's pipeline at the
//! interrupt and reaction phases. The first advance collects every eligible
//! ability response for the window's surviving events; each further advance
//! resolves exactly one of them, re-validating eligibility at the moment of
//! resolution because an earlier response may have cancelled the trigger
//! event or exhausted the ability.
//!
//! A resolution may open nested event windows of arbitrary depth; those
//! drain to completion before this window is advanced again, so recursion
//! needs no special handling here.

use std::collections::VecDeque;

use crate::events::EventWindow;
use crate::game::Game;
use crate::pipeline::StepStatus;

use super::ability::{AbilityContext, AbilityPhase};

/// One interrupt or reaction window over an event batch.
#[derive(Debug)]
pub struct TriggeredAbilityWindow {
    phase: AbilityPhase,
    /// `None` until the collection advance has run.
    pending: Option<VecDeque<AbilityContext>>,
}

impl TriggeredAbilityWindow {
    /// Create a window for the given trigger phase.
    #[must_use]
    pub(crate) fn new(phase: AbilityPhase) -> Self {
        Self {
            phase,
            pending: None,
        }
    }

    /// The trigger phase this window serves.
    #[must_use]
    pub fn phase(&self) -> AbilityPhase {
        self.phase
    }

    /// Responses collected and not yet resolved. Zero before collection.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.as_ref().map_or(0, VecDeque::len)
    }

    /// Advance by one step: collect on the first call, then resolve one
    /// response per call until none remain.
    pub(crate) fn advance(&mut self, game: &mut Game, window: &mut EventWindow) -> StepStatus {
        match self.pending.as_mut() {
            None => {
                let contexts = game
                    .abilities()
                    .eligible(self.phase, window.events(), &game.state);
                tracing::debug!(
                    window = %window.id(),
                    phase = %self.phase,
                    responses = contexts.len(),
                    "triggered-ability window collected"
                );
                self.pending = Some(contexts.into());
                StepStatus::Processing
            }
            Some(pending) => {
                let Some(context) = pending.pop_front() else {
                    return StepStatus::Complete;
                };

                if game
                    .abilities()
                    .is_eligible(&context, window.events(), &game.state)
                {
                    game.resolve_ability_in(window, context);
                } else {
                    tracing::debug!(
                        ability = %context.ability,
                        phase = %self.phase,
                        "collected response no longer eligible"
                    );
                }
                StepStatus::Processing
            }
        }
    }
}
