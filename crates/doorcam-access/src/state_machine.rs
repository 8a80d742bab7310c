//! Access control state machine.
//!
//! Tracks where the credential-to-actuation flow currently stands, enforces
//! the legal transitions, and carries the monotonic deadline used by the
//! cooldown state.
//!
//! # States
//!
//! - `Idle`: polling the reader
//! - `TokenDetected`: a token is in the field
//! - `IdentifierExtracted`: raw bytes read and normalized
//! - `AwaitingAuthorization`: round trip to the remote service
//! - `DoorOpen`: approved, actuator pulsing
//! - `Rejected`: denied or transport failure, no actuation
//! - `Cooldown`: detections ignored until the deadline passes
//!
//! # Valid Transitions
//!
//! - Idle → TokenDetected → IdentifierExtracted → AwaitingAuthorization
//! - TokenDetected → Idle (extraction failed)
//! - AwaitingAuthorization → DoorOpen | Rejected
//! - DoorOpen → Cooldown → Idle
//! - Rejected → Cooldown | Idle
//!
//! # Examples
//!
//! ```
//! use doorcam_access::{AccessState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), AccessState::Idle);
//!
//! machine.transition_to(AccessState::TokenDetected).unwrap();
//! assert!(machine.transition_to(AccessState::DoorOpen).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::{AccessError, Result};

/// Maximum number of state transitions kept in history.
///
/// One scan walks through at most six transitions, so this covers the last
/// dozen or so scans.
const MAX_HISTORY_SIZE: usize = 64;

/// Phase of the access control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    /// Polling the reader for a token.
    Idle,

    /// A token is in the field, identifier not read yet.
    TokenDetected,

    /// Identifier read and normalized.
    IdentifierExtracted,

    /// Waiting for the remote authorization round trip.
    AwaitingAuthorization,

    /// Approved, actuator pulse in progress.
    DoorOpen,

    /// Denied, no actuation.
    Rejected,

    /// Debounce dead-time, new detections are ignored.
    Cooldown,
}

impl fmt::Display for AccessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            AccessState::Idle => "Idle",
            AccessState::TokenDetected => "TokenDetected",
            AccessState::IdentifierExtracted => "IdentifierExtracted",
            AccessState::AwaitingAuthorization => "AwaitingAuthorization",
            AccessState::DoorOpen => "DoorOpen",
            AccessState::Rejected => "Rejected",
            AccessState::Cooldown => "Cooldown",
        };
        write!(f, "{}", state_str)
    }
}

impl AccessState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorcam_access::AccessState;
    ///
    /// assert!(AccessState::Idle.can_transition_to(&AccessState::TokenDetected));
    /// assert!(!AccessState::Idle.can_transition_to(&AccessState::DoorOpen));
    /// ```
    pub fn can_transition_to(&self, target: &AccessState) -> bool {
        matches!(
            (self, target),
            (AccessState::Idle, AccessState::TokenDetected)
                | (
                    AccessState::TokenDetected,
                    AccessState::IdentifierExtracted | AccessState::Idle
                )
                | (AccessState::IdentifierExtracted, AccessState::AwaitingAuthorization)
                | (
                    AccessState::AwaitingAuthorization,
                    AccessState::DoorOpen | AccessState::Rejected
                )
                | (AccessState::DoorOpen, AccessState::Cooldown)
                | (AccessState::Rejected, AccessState::Cooldown | AccessState::Idle)
                | (AccessState::Cooldown, AccessState::Idle)
        )
    }

    /// State entered when a deadline set on this state expires.
    fn timeout_state(&self) -> Option<AccessState> {
        match self {
            AccessState::Cooldown => Some(AccessState::Idle),
            _ => None,
        }
    }
}

/// A single state transition with timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: AccessState,
    pub to: AccessState,
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: AccessState, to: AccessState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }
}

/// State machine for the access control flow.
///
/// Deadlines use [`tokio::time::Instant`], so they follow a paused test
/// clock.
#[derive(Debug)]
pub struct StateMachine {
    current_state: AccessState,

    /// When the current state was entered.
    state_entered_at: Instant,

    /// History of state transitions (limited to MAX_HISTORY_SIZE).
    history: VecDeque<StateTransition>,

    /// Optional timeout for the current state.
    current_timeout: Option<Duration>,
}

impl StateMachine {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self {
            current_state: AccessState::Idle,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            current_timeout: None,
        }
    }

    pub fn current_state(&self) -> AccessState {
        self.current_state
    }

    /// Get the time elapsed in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Check if the current state has timed out.
    pub fn has_timed_out(&self) -> bool {
        self.current_timeout
            .is_some_and(|timeout| self.time_in_current_state() >= timeout)
    }

    /// Remaining time before timeout, `None` if no timeout or already expired.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.current_timeout.and_then(|timeout| {
            let elapsed = self.time_in_current_state();
            timeout.checked_sub(elapsed).filter(|left| !left.is_zero())
        })
    }

    /// Set a timeout for the current state, measured from when it was entered.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.current_timeout = Some(timeout);
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidStateTransition`] if the requested
    /// transition is not valid for the current state. The machine is left
    /// unchanged.
    pub fn transition_to(&mut self, new_state: AccessState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(AccessError::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.perform_state_change(transition);
        Ok(transition)
    }

    /// Move on if the current state's deadline has passed.
    ///
    /// Returns `Ok(None)` if nothing expired or the state has no timeout
    /// successor.
    pub fn check_and_handle_timeout(&mut self) -> Result<Option<StateTransition>> {
        if !self.has_timed_out() {
            return Ok(None);
        }

        let Some(timeout_state) = self.current_state.timeout_state() else {
            return Ok(None);
        };

        self.transition_to(timeout_state).map(Some)
    }

    /// Force the machine back to Idle regardless of the current state.
    pub fn reset(&mut self) -> StateTransition {
        let transition = StateTransition::new(self.current_state, AccessState::Idle);
        self.perform_state_change(transition);
        transition
    }

    fn perform_state_change(&mut self, transition: StateTransition) {
        self.current_state = transition.to;
        self.state_entered_at = transition.timestamp;
        self.current_timeout = None;

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ALL_STATES: [AccessState; 7] = [
        AccessState::Idle,
        AccessState::TokenDetected,
        AccessState::IdentifierExtracted,
        AccessState::AwaitingAuthorization,
        AccessState::DoorOpen,
        AccessState::Rejected,
        AccessState::Cooldown,
    ];

    fn machine_in(path: &[AccessState]) -> StateMachine {
        let mut machine = StateMachine::new();
        for state in path {
            machine.transition_to(*state).unwrap();
        }
        machine
    }

    #[test]
    fn test_new_machine_starts_idle() {
        let machine = StateMachine::new();
        assert_eq!(machine.current_state(), AccessState::Idle);
        assert!(machine.history().is_empty());
    }

    #[rstest]
    #[case(AccessState::Idle, AccessState::TokenDetected)]
    #[case(AccessState::TokenDetected, AccessState::IdentifierExtracted)]
    #[case(AccessState::TokenDetected, AccessState::Idle)]
    #[case(AccessState::IdentifierExtracted, AccessState::AwaitingAuthorization)]
    #[case(AccessState::AwaitingAuthorization, AccessState::DoorOpen)]
    #[case(AccessState::AwaitingAuthorization, AccessState::Rejected)]
    #[case(AccessState::DoorOpen, AccessState::Cooldown)]
    #[case(AccessState::Rejected, AccessState::Cooldown)]
    #[case(AccessState::Rejected, AccessState::Idle)]
    #[case(AccessState::Cooldown, AccessState::Idle)]
    fn test_valid_transitions(#[case] from: AccessState, #[case] to: AccessState) {
        assert!(from.can_transition_to(&to));
    }

    #[test]
    fn test_transition_table_is_closed() {
        // Exactly the ten transitions above are legal
        let legal = ALL_STATES
            .iter()
            .flat_map(|from| ALL_STATES.iter().map(move |to| (from, to)))
            .filter(|(from, to)| from.can_transition_to(to))
            .count();
        assert_eq!(legal, 10);
    }

    #[rstest]
    #[case(AccessState::Idle, AccessState::DoorOpen)]
    #[case(AccessState::Idle, AccessState::AwaitingAuthorization)]
    #[case(AccessState::TokenDetected, AccessState::AwaitingAuthorization)]
    #[case(AccessState::IdentifierExtracted, AccessState::DoorOpen)]
    #[case(AccessState::DoorOpen, AccessState::Idle)]
    #[case(AccessState::Cooldown, AccessState::TokenDetected)]
    #[case(AccessState::Idle, AccessState::Idle)]
    fn test_invalid_transitions(#[case] from: AccessState, #[case] to: AccessState) {
        assert!(!from.can_transition_to(&to));
    }

    #[test]
    fn test_invalid_transition_leaves_machine_unchanged() {
        let mut machine = StateMachine::new();
        let result = machine.transition_to(AccessState::DoorOpen);

        assert!(matches!(
            result,
            Err(AccessError::InvalidStateTransition { .. })
        ));
        assert_eq!(machine.current_state(), AccessState::Idle);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_complete_approved_flow() {
        let machine = machine_in(&[
            AccessState::TokenDetected,
            AccessState::IdentifierExtracted,
            AccessState::AwaitingAuthorization,
            AccessState::DoorOpen,
            AccessState::Cooldown,
            AccessState::Idle,
        ]);

        assert_eq!(machine.current_state(), AccessState::Idle);
        assert_eq!(machine.history().len(), 6);

        let last: Vec<_> = machine.history().iter().rev().take(2).collect();
        assert_eq!(last[0].to, AccessState::Idle);
        assert_eq!(last[1].to, AccessState::Cooldown);
    }

    #[test]
    fn test_denied_flow_goes_straight_to_idle() {
        let machine = machine_in(&[
            AccessState::TokenDetected,
            AccessState::IdentifierExtracted,
            AccessState::AwaitingAuthorization,
            AccessState::Rejected,
            AccessState::Idle,
        ]);
        assert_eq!(machine.current_state(), AccessState::Idle);
    }

    #[test]
    fn test_history_size_limit() {
        let mut machine = StateMachine::new();
        for _ in 0..MAX_HISTORY_SIZE {
            machine.transition_to(AccessState::TokenDetected).unwrap();
            machine.transition_to(AccessState::Idle).unwrap();
        }

        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
        assert_eq!(
            machine.history().back().map(|t| t.to),
            Some(AccessState::Idle)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_deadline() {
        let mut machine = machine_in(&[
            AccessState::TokenDetected,
            AccessState::IdentifierExtracted,
            AccessState::AwaitingAuthorization,
            AccessState::DoorOpen,
            AccessState::Cooldown,
        ]);
        machine.set_timeout(Duration::from_millis(3000));

        tokio::time::advance(Duration::from_millis(2999)).await;
        assert!(!machine.has_timed_out());
        assert_eq!(machine.time_remaining(), Some(Duration::from_millis(1)));
        assert!(machine.check_and_handle_timeout().unwrap().is_none());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(machine.has_timed_out());
        assert_eq!(machine.time_remaining(), None);

        let transition = machine.check_and_handle_timeout().unwrap().unwrap();
        assert_eq!(transition.from, AccessState::Cooldown);
        assert_eq!(transition.to, AccessState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_cleared_on_transition() {
        let mut machine = StateMachine::new();
        machine.set_timeout(Duration::from_millis(10));
        machine.transition_to(AccessState::TokenDetected).unwrap();

        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(!machine.has_timed_out());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_without_successor_is_ignored() {
        let mut machine = StateMachine::new();
        machine.set_timeout(Duration::from_millis(10));

        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(machine.has_timed_out());
        assert!(machine.check_and_handle_timeout().unwrap().is_none());
        assert_eq!(machine.current_state(), AccessState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_in_state_restarts_on_transition() {
        let mut machine = StateMachine::new();
        tokio::time::advance(Duration::from_millis(100)).await;
        machine.transition_to(AccessState::TokenDetected).unwrap();

        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(machine.time_in_current_state(), Duration::from_millis(250));
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut machine = machine_in(&[
            AccessState::TokenDetected,
            AccessState::IdentifierExtracted,
        ]);

        let transition = machine.reset();
        assert_eq!(transition.from, AccessState::IdentifierExtracted);
        assert_eq!(machine.current_state(), AccessState::Idle);
    }

    #[rstest]
    #[case(AccessState::Idle, "Idle")]
    #[case(AccessState::AwaitingAuthorization, "AwaitingAuthorization")]
    #[case(AccessState::DoorOpen, "DoorOpen")]
    #[case(AccessState::Cooldown, "Cooldown")]
    fn test_state_display(#[case] state: AccessState, #[case] expected: &str) {
        assert_eq!(state.to_string(), expected);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&AccessState::DoorOpen).unwrap();
        assert_eq!(json, r#""door_open""#);

        let state: AccessState = serde_json::from_str(r#""token_detected""#).unwrap();
        assert_eq!(state, AccessState::TokenDetected);
    }
}
