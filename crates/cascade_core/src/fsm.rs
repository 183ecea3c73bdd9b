//! State machine runtime
//!
//! Interaction states are plain enums that implement [`StateTransitions`]:
//! a pure `(state, event) -> Option<state>` table. [`Machine`] wraps the
//! current state, applies events and keeps a short transition history for
//! debugging.
//!
//! Side effects (timers, controller requests) are not part of the table.
//! The owner inspects the returned transition and performs them, which keeps
//! the table testable in isolation.

use std::collections::VecDeque;
use std::fmt::Debug;

/// Number of transitions retained by [`Machine::history`]
pub const HISTORY_LIMIT: usize = 32;

/// Trait for state types that map events to transitions
///
/// # Example
///
/// ```
/// use cascade_core::fsm::{Machine, StateTransitions};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Button {
///     Idle,
///     Hovered,
/// }
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Pointer {
///     Enter,
///     Leave,
/// }
///
/// impl StateTransitions for Button {
///     type Event = Pointer;
///
///     fn on_event(&self, event: Pointer) -> Option<Self> {
///         match (self, event) {
///             (Button::Idle, Pointer::Enter) => Some(Button::Hovered),
///             (Button::Hovered, Pointer::Leave) => Some(Button::Idle),
///             _ => None,
///         }
///     }
/// }
///
/// let mut machine = Machine::new(Button::Idle);
/// assert_eq!(machine.send(Pointer::Enter), Some(Button::Hovered));
/// assert_eq!(machine.send(Pointer::Enter), None);
/// ```
pub trait StateTransitions: Clone + Copy + PartialEq + Eq + Debug + 'static {
    /// Event type accepted by the table
    type Event: Clone + Copy + Debug;

    /// Handle an event and return the new state, or None if no transition
    fn on_event(&self, event: Self::Event) -> Option<Self>;
}

/// A state machine instance
#[derive(Clone, Debug)]
pub struct Machine<S: StateTransitions> {
    current: S,
    history: VecDeque<(S, S::Event, S)>,
}

impl<S: StateTransitions> Machine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            history: VecDeque::new(),
        }
    }

    /// Get the current state
    pub fn current(&self) -> S {
        self.current
    }

    /// Check if we're in a specific state
    pub fn is_in(&self, state: S) -> bool {
        self.current == state
    }

    /// Check if an event would trigger a transition from the current state
    pub fn can_send(&self, event: S::Event) -> bool {
        self.current.on_event(event).is_some()
    }

    /// Apply an event. Returns the new state if a transition happened.
    pub fn send(&mut self, event: S::Event) -> Option<S> {
        let from = self.current;
        let to = from.on_event(event)?;

        tracing::trace!(?from, ?event, ?to, "state transition");
        self.current = to;

        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back((from, event, to));
        Some(to)
    }

    /// Recent transitions, oldest first
    pub fn history(&self) -> impl Iterator<Item = &(S, S::Event, S)> {
        self.history.iter()
    }

    /// Clear transition history
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Idle,
        Hovered,
        Pressed,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Input {
        Enter,
        Leave,
        Down,
        Up,
    }

    impl StateTransitions for Phase {
        type Event = Input;

        fn on_event(&self, event: Input) -> Option<Self> {
            match (self, event) {
                (Phase::Idle, Input::Enter) => Some(Phase::Hovered),
                (Phase::Hovered, Input::Leave) => Some(Phase::Idle),
                (Phase::Hovered, Input::Down) => Some(Phase::Pressed),
                (Phase::Pressed, Input::Up) => Some(Phase::Hovered),
                _ => None,
            }
        }
    }

    #[test]
    fn test_simple_transitions() {
        let mut machine = Machine::new(Phase::Idle);

        assert_eq!(machine.send(Input::Enter), Some(Phase::Hovered));
        assert_eq!(machine.send(Input::Down), Some(Phase::Pressed));
        assert_eq!(machine.send(Input::Up), Some(Phase::Hovered));
        assert_eq!(machine.send(Input::Leave), Some(Phase::Idle));
        assert!(machine.is_in(Phase::Idle));
    }

    #[test]
    fn test_invalid_event_no_transition() {
        let mut machine = Machine::new(Phase::Idle);

        assert!(!machine.can_send(Input::Down));
        assert_eq!(machine.send(Input::Down), None);
        assert_eq!(machine.current(), Phase::Idle);
        assert_eq!(machine.history().count(), 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut machine = Machine::new(Phase::Idle);
        for _ in 0..HISTORY_LIMIT {
            machine.send(Input::Enter);
            machine.send(Input::Leave);
        }

        assert_eq!(machine.history().count(), HISTORY_LIMIT);
        let last = machine.history().last().copied();
        assert_eq!(last, Some((Phase::Hovered, Input::Leave, Phase::Idle)));

        machine.clear_history();
        assert_eq!(machine.history().count(), 0);
    }
}
