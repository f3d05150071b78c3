//! Lock controller state machine.
//!
//! This module provides the state set of the lock appliance and the table of
//! legal transitions between states. The [`Controller`](crate::Controller)
//! decides *when* to move; this module guarantees it only ever moves along
//! an edge of the table and keeps a bounded history of every move.
//!
//! # States
//!
//! - `Standby`: idle screen with the wall clock, doorbell available
//! - `AwaitingPassword`: collecting up to six digits
//! - `AdminMenu`: admin options 1-5
//! - `Unlocking`: motor engaged for the unlock hold time
//! - `EnrollPassword`: collecting a new user password
//! - `Locked`: keypad disabled until the lockout countdown ends
//! - `FingerprintCapture`: waiting for, or showing, a fingerprint capture
//!
//! # Valid Transitions
//!
//! - Standby → AwaitingPassword
//! - AwaitingPassword → AdminMenu / Unlocking / FingerprintCapture / Locked
//! - AdminMenu → EnrollPassword / AwaitingPassword
//! - EnrollPassword → AdminMenu
//! - Unlocking → Standby
//! - Locked → Standby
//! - FingerprintCapture → FingerprintCapture / AwaitingPassword / Locked
//!
//! # Examples
//!
//! ```
//! use doorlock_controller::{StateMachine, ControllerState};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), ControllerState::Standby);
//!
//! machine.transition_to(ControllerState::AwaitingPassword, "unlock requested", 0).unwrap();
//! assert_eq!(machine.current_state(), ControllerState::AwaitingPassword);
//!
//! // Standby is only reachable through a timer expiry
//! assert!(machine.transition_to(ControllerState::Standby, "nope", 1).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use doorlock_core::constants::TRANSITION_HISTORY_SIZE;
use doorlock_core::{Error, Result};

/// Operating states of the lock appliance.
///
/// Exactly one state is active at any time. Entering a state clears the
/// password buffer and the admin selection; the controller enforces that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// Idle screen, waiting for OK (unlock) or Cancel (doorbell).
    #[default]
    Standby,

    /// Collecting a password from the keypad.
    AwaitingPassword,

    /// Admin menu, waiting for an option and OK.
    AdminMenu,

    /// Door open, motor engaged until the unlock countdown ends.
    Unlocking,

    /// Collecting a new six-digit user password.
    EnrollPassword,

    /// Too many failures, keypad disabled until the lockout countdown ends.
    Locked,

    /// Fingerprint mode: prompt, then the capture result.
    FingerprintCapture,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            ControllerState::Standby => "Standby",
            ControllerState::AwaitingPassword => "AwaitingPassword",
            ControllerState::AdminMenu => "AdminMenu",
            ControllerState::Unlocking => "Unlocking",
            ControllerState::EnrollPassword => "EnrollPassword",
            ControllerState::Locked => "Locked",
            ControllerState::FingerprintCapture => "FingerprintCapture",
        };
        write!(f, "{}", state_str)
    }
}

impl ControllerState {
    /// Check if transition to target state is valid from this state.
    ///
    /// `FingerprintCapture → FingerprintCapture` is a real edge: a capture
    /// re-enters the state to show its result.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_controller::ControllerState;
    ///
    /// assert!(ControllerState::Standby.can_transition_to(&ControllerState::AwaitingPassword));
    /// assert!(!ControllerState::Standby.can_transition_to(&ControllerState::Unlocking));
    /// ```
    pub fn can_transition_to(&self, target: &ControllerState) -> bool {
        use ControllerState::*;

        matches!(
            (self, target),
            (Standby, AwaitingPassword)
                | (AwaitingPassword, AdminMenu | Unlocking | FingerprintCapture | Locked)
                | (AdminMenu, EnrollPassword | AwaitingPassword)
                | (EnrollPassword, AdminMenu)
                | (Unlocking, Standby)
                | (Locked, Standby)
                | (FingerprintCapture, FingerprintCapture | AwaitingPassword | Locked)
        )
    }

    /// Whether keypad input is processed in this state.
    ///
    /// The keypad is disabled while locked out and while the door is open.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_controller::ControllerState;
    ///
    /// assert!(ControllerState::AwaitingPassword.accepts_keypad());
    /// assert!(!ControllerState::Locked.accepts_keypad());
    /// assert!(!ControllerState::Unlocking.accepts_keypad());
    /// ```
    pub fn accepts_keypad(&self) -> bool {
        !matches!(self, ControllerState::Locked | ControllerState::Unlocking)
    }

    /// Whether digits typed in this state go into the password buffer.
    pub fn collects_digits(&self) -> bool {
        matches!(
            self,
            ControllerState::AwaitingPassword | ControllerState::EnrollPassword
        )
    }

    /// State code used by the lock firmware, shown in the LCD status bar.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_controller::ControllerState;
    ///
    /// assert_eq!(ControllerState::Standby.firmware_code(), "State4");
    /// assert_eq!(ControllerState::AwaitingPassword.firmware_code(), "State0");
    /// ```
    pub fn firmware_code(&self) -> &'static str {
        match self {
            ControllerState::AwaitingPassword => "State0",
            ControllerState::AdminMenu => "State1",
            ControllerState::Unlocking => "State2",
            ControllerState::EnrollPassword => "State3",
            ControllerState::Standby => "State4",
            ControllerState::Locked => "State_Locked",
            ControllerState::FingerprintCapture => "State_Fingerprint",
        }
    }
}

/// Represents a single state transition.
///
/// `at` is the controller uptime in seconds (ticks since power-on) when the
/// transition happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: ControllerState,

    /// The state transitioned to.
    pub to: ControllerState,

    /// Why the controller moved.
    pub reason: String,

    /// Uptime in seconds.
    pub at: u64,
}

impl StateTransition {
    /// Create a new state transition record.
    pub fn new(
        from: ControllerState,
        to: ControllerState,
        reason: impl Into<String>,
        at: u64,
    ) -> Self {
        Self {
            from,
            to,
            reason: reason.into(),
            at,
        }
    }

    /// Whether the transition re-entered the state it left.
    pub fn is_self_transition(&self) -> bool {
        self.from == self.to
    }
}

/// State holder enforcing the transition table.
///
/// # Thread Safety
///
/// This struct is not thread-safe. The runtime crate gives the
/// owning controller to a single task.
#[derive(Debug, Clone)]
pub struct StateMachine {
    /// Current state of the lock.
    current_state: ControllerState,

    /// Uptime when the current state was entered.
    entered_at: u64,

    /// History of state transitions (limited to TRANSITION_HISTORY_SIZE).
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a new state machine in the Standby state.
    pub fn new() -> Self {
        Self {
            current_state: ControllerState::Standby,
            entered_at: 0,
            history: VecDeque::with_capacity(TRANSITION_HISTORY_SIZE),
        }
    }

    /// Get the current state of the machine.
    pub fn current_state(&self) -> ControllerState {
        self.current_state
    }

    /// Uptime at which the current state was entered.
    pub fn entered_at(&self) -> u64 {
        self.entered_at
    }

    /// Seconds spent in the current state at uptime `now`.
    pub fn secs_in_current_state(&self, now: u64) -> u64 {
        now.saturating_sub(self.entered_at)
    }

    /// Get the transition history, ordered from oldest to newest.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Get the last N state transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the table has no edge from
    /// the current state to `new_state`. The machine is left unchanged.
    pub fn transition_to(
        &mut self,
        new_state: ControllerState,
        reason: impl Into<String>,
        now: u64,
    ) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state, reason, now);
        self.perform_state_change(transition.clone());

        Ok(transition)
    }

    /// Force the machine back to Standby regardless of the current state.
    ///
    /// Used by the full simulator reset; bypasses the transition table.
    pub fn reset(&mut self, reason: impl Into<String>, now: u64) -> StateTransition {
        let transition =
            StateTransition::new(self.current_state, ControllerState::Standby, reason, now);
        self.perform_state_change(transition.clone());
        transition
    }

    fn perform_state_change(&mut self, transition: StateTransition) {
        self.current_state = transition.to;
        self.entered_at = transition.at;

        self.history.push_back(transition);
        if self.history.len() > TRANSITION_HISTORY_SIZE {
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
    use ControllerState::*;

    const ALL_STATES: [ControllerState; 7] = [
        Standby,
        AwaitingPassword,
        AdminMenu,
        Unlocking,
        EnrollPassword,
        Locked,
        FingerprintCapture,
    ];

    #[test]
    fn test_new_machine_starts_standby() {
        let machine = StateMachine::new();
        assert_eq!(machine.current_state(), Standby);
        assert!(machine.history().is_empty());
    }

    #[rstest]
    #[case(Standby, AwaitingPassword)]
    #[case(AwaitingPassword, AdminMenu)]
    #[case(AwaitingPassword, Unlocking)]
    #[case(AwaitingPassword, FingerprintCapture)]
    #[case(AwaitingPassword, Locked)]
    #[case(AdminMenu, EnrollPassword)]
    #[case(AdminMenu, AwaitingPassword)]
    #[case(EnrollPassword, AdminMenu)]
    #[case(Unlocking, Standby)]
    #[case(Locked, Standby)]
    #[case(FingerprintCapture, FingerprintCapture)]
    #[case(FingerprintCapture, AwaitingPassword)]
    #[case(FingerprintCapture, Locked)]
    fn test_valid_edges(#[case] from: ControllerState, #[case] to: ControllerState) {
        assert!(from.can_transition_to(&to));
    }

    #[test]
    fn test_edge_count() {
        let edges = ALL_STATES
            .iter()
            .flat_map(|from| ALL_STATES.iter().map(move |to| (from, to)))
            .filter(|(from, to)| from.can_transition_to(to))
            .count();
        assert_eq!(edges, 13);
    }

    #[rstest]
    #[case(Standby, Unlocking)]
    #[case(Standby, Standby)]
    #[case(Locked, AwaitingPassword)]
    #[case(Unlocking, AwaitingPassword)]
    #[case(EnrollPassword, AwaitingPassword)]
    #[case(AdminMenu, Unlocking)]
    fn test_invalid_edges(#[case] from: ControllerState, #[case] to: ControllerState) {
        assert!(!from.can_transition_to(&to));
    }

    #[test]
    fn test_invalid_transition_leaves_state() {
        let mut machine = StateMachine::new();
        let result = machine.transition_to(Locked, "bad", 3);

        assert!(matches!(
            result,
            Err(Error::InvalidStateTransition { .. })
        ));
        assert_eq!(machine.current_state(), Standby);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_transition_records_reason_and_uptime() {
        let mut machine = StateMachine::new();
        let transition = machine
            .transition_to(AwaitingPassword, "unlock requested", 7)
            .unwrap();

        assert_eq!(transition.from, Standby);
        assert_eq!(transition.to, AwaitingPassword);
        assert_eq!(transition.reason, "unlock requested");
        assert_eq!(machine.entered_at(), 7);
        assert_eq!(machine.secs_in_current_state(10), 3);
    }

    #[test]
    fn test_self_transition_flag() {
        let mut machine = StateMachine::new();
        machine.transition_to(AwaitingPassword, "a", 0).unwrap();
        machine.transition_to(FingerprintCapture, "b", 0).unwrap();
        let again = machine.transition_to(FingerprintCapture, "c", 1).unwrap();
        assert!(again.is_self_transition());
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut machine = StateMachine::new();
        machine.transition_to(AwaitingPassword, "a", 0).unwrap();
        machine.transition_to(Locked, "b", 1).unwrap();

        let transition = machine.reset("simulator reset", 2);
        assert_eq!(transition.from, Locked);
        assert_eq!(machine.current_state(), Standby);
    }

    #[test]
    fn test_history_size_limit() {
        let mut machine = StateMachine::new();
        for i in 0..(TRANSITION_HISTORY_SIZE as u64 + 10) {
            machine.transition_to(AwaitingPassword, "in", i).unwrap();
            machine.transition_to(AdminMenu, "admin", i).unwrap();
            machine.transition_to(AwaitingPassword, "out", i).unwrap();
            machine.transition_to(Unlocking, "open", i).unwrap();
            machine.transition_to(Standby, "close", i).unwrap();
        }
        assert_eq!(machine.history().len(), TRANSITION_HISTORY_SIZE);
    }

    #[test]
    fn test_last_transitions() {
        let mut machine = StateMachine::new();
        machine.transition_to(AwaitingPassword, "1", 0).unwrap();
        machine.transition_to(AdminMenu, "2", 0).unwrap();
        machine.transition_to(EnrollPassword, "3", 0).unwrap();

        let last = machine.last_transitions(2);
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].reason, "2");
        assert_eq!(last[1].reason, "3");
        assert_eq!(machine.last_transitions(10).len(), 3);
    }

    #[test]
    fn test_keypad_disabled_states() {
        let disabled: Vec<_> = ALL_STATES
            .iter()
            .filter(|s| !s.accepts_keypad())
            .collect();
        assert_eq!(disabled, vec![&Unlocking, &Locked]);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&FingerprintCapture).unwrap();
        assert_eq!(json, "\"fingerprint_capture\"");
        let back: ControllerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FingerprintCapture);
    }
}
