//! Cooperative step pipeline.
//!
//! A `Pipeline<S>` is a FIFO of deferred steps belonging to one logical unit
//! of work (an event window, an ability window). The defining property is
//! that a running step may queue further steps *in front of* the remaining
//! ones, so work it schedules completes before the pipeline considers itself
//! finished. That is how an interrupt window injects itself between two
//! fixed phases, and how an ability resolved inside it injects yet more work,
//! without the orchestrator knowing about recursion.
//!
//! The pipeline is drained one step at a time by an outer driver loop
//! ([`Game::advance`](crate::game::Game::advance)); control returns to the
//! driver between steps. There are no threads and no blocking: "concurrency"
//! is purely the logical interleaving of nested pipelines.

use std::collections::VecDeque;

/// Status of a continuable step.
///
/// A step returning `Processing` is re-queued at the front and advanced
/// again on the next driver call; `Complete` drops it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    /// The step finished; the pipeline moves on.
    Complete,
    /// The step has more work; advance it again.
    Processing,
}

/// FIFO of deferred steps with front insertion.
#[derive(Debug)]
pub struct Pipeline<S> {
    steps: VecDeque<S>,
}

impl<S> Default for Pipeline<S> {
    fn default() -> Self {
        Self {
            steps: VecDeque::new(),
        }
    }
}

impl<S> Pipeline<S> {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the initial step sequence.
    pub fn initialise(&mut self, steps: impl IntoIterator<Item = S>) {
        self.steps.extend(steps);
    }

    /// Take the next step to run.
    pub fn next_step(&mut self) -> Option<S> {
        self.steps.pop_front()
    }

    /// Queue a step to run before everything currently pending.
    ///
    /// Also used to put a `Processing` step back at the front.
    pub fn queue_front(&mut self, step: S) {
        self.steps.push_front(step);
    }

    /// Queue several steps to run next, preserving their order.
    pub fn queue_front_all(&mut self, steps: impl IntoIterator<Item = S>) {
        let mut pending: Vec<S> = steps.into_iter().collect();
        while let Some(step) = pending.pop() {
            self.steps.push_front(step);
        }
    }

    /// Queue a step after everything currently pending.
    pub fn queue_back(&mut self, step: S) {
        self.steps.push_back(step);
    }

    /// Number of pending steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when no steps remain.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.steps.is_empty()
    }
}
