//! Property-based tests for controller invariants.
//!
//! These tests drive the controller with random event sequences and check
//! that the lock invariants hold after every single event, whatever the
//! order of keys, ticks and injected fingerprint readings.

use proptest::prelude::*;

use doorlock_controller::{Controller, ControllerState, Event};
use doorlock_core::constants::{MAX_ERRORS, PASSWORD_LENGTH};
use doorlock_core::{Digit, FingerprintOutcome, FingerprintReading, KeypadInput, Password};

/// One step of a random session.
#[derive(Debug, Clone)]
enum Step {
    Event(Event),
    Inject(FingerprintReading),
}

fn keypad_input() -> impl Strategy<Value = KeypadInput> {
    prop_oneof![
        4 => (0u8..=9).prop_map(|d| KeypadInput::Digit(Digit::new(d).unwrap())),
        2 => Just(KeypadInput::Confirm),
        1 => Just(KeypadInput::Cancel),
        1 => Just(KeypadInput::SwitchToFingerprint),
        1 => Just(KeypadInput::Hash),
    ]
}

fn fingerprint_reading() -> impl Strategy<Value = FingerprintReading> {
    let outcome = prop_oneof![
        Just(FingerprintOutcome::Match),
        Just(FingerprintOutcome::NoMatch),
        Just(FingerprintOutcome::NoFinger),
        Just(FingerprintOutcome::Error),
    ];
    (outcome, any::<u8>()).prop_map(|(outcome, id)| FingerprintReading::new(outcome, id))
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        8 => keypad_input().prop_map(|k| Step::Event(Event::Key(k))),
        3 => Just(Step::Event(Event::Tick)),
        1 => fingerprint_reading().prop_map(Step::Inject),
    ]
}

fn password() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9]{6}").unwrap()
}

fn seeded() -> Controller {
    let mut controller = Controller::default();
    controller.seed_credentials();
    controller
}

fn apply(controller: &mut Controller, step: &Step) {
    match step {
        Step::Event(event) => {
            controller.handle(*event);
        }
        Step::Inject(reading) => controller.inject_fingerprint(*reading),
    }
}

fn type_password(controller: &mut Controller, password: &str) {
    for c in password.chars() {
        controller.press(KeypadInput::from_char(c).unwrap());
    }
    controller.press(KeypadInput::Confirm);
}

proptest! {
    /// Property: the error counter stays below the maximum outside `Locked`.
    #[test]
    fn prop_error_count_bounded(steps in prop::collection::vec(step(), 0..200)) {
        let mut controller = seeded();
        for step in &steps {
            apply(&mut controller, step);
            if controller.state() != ControllerState::Locked {
                prop_assert!(controller.error_count() < MAX_ERRORS);
            } else {
                prop_assert_eq!(controller.error_count(), MAX_ERRORS);
            }
        }
    }

    /// Property: the buffer never exceeds six digits and is empty right
    /// after any state transition.
    #[test]
    fn prop_buffer_bounded_and_cleared(steps in prop::collection::vec(step(), 0..200)) {
        let mut controller = seeded();
        for step in &steps {
            let before = controller.history().len();
            apply(&mut controller, step);

            prop_assert!(controller.input().len() <= PASSWORD_LENGTH);
            if controller.history().len() != before {
                prop_assert!(controller.input().is_empty());
            }
            if !controller.state().collects_digits() {
                prop_assert!(controller.input().is_empty());
            }
        }
    }

    /// Property: the motor is engaged exactly while `Unlocking`, and only the
    /// admin menu holds a selection.
    #[test]
    fn prop_peripherals_follow_state(steps in prop::collection::vec(step(), 0..200)) {
        let mut controller = seeded();
        for step in &steps {
            apply(&mut controller, step);
            let state = controller.state();
            prop_assert_eq!(controller.motor_engaged(), state == ControllerState::Unlocking);
            if state != ControllerState::AdminMenu {
                prop_assert!(controller.admin_selection().is_none());
            }
        }
    }

    /// Property: scheduled transitions only exist in `FingerprintCapture`.
    #[test]
    fn prop_no_stale_scheduled_transitions(steps in prop::collection::vec(step(), 0..200)) {
        let mut controller = seeded();
        for step in &steps {
            apply(&mut controller, step);
            if controller.state() != ControllerState::FingerprintCapture {
                prop_assert!(controller.pending_transitions().is_empty());
            }
            prop_assert!(controller.pending_transitions().len() <= 1);
        }
    }

    /// Property: every recorded transition is an edge of the table.
    #[test]
    fn prop_history_follows_table(steps in prop::collection::vec(step(), 0..200)) {
        let mut controller = seeded();
        for step in &steps {
            apply(&mut controller, step);
        }
        for transition in controller.history() {
            prop_assert!(transition.from.can_transition_to(&transition.to));
        }
    }

    /// Property: Cancel in `Standby` never changes state, however often.
    #[test]
    fn prop_standby_cancel_idempotent(presses in 1usize..20) {
        let mut controller = seeded();
        for _ in 0..presses {
            controller.press(KeypadInput::Cancel);
            prop_assert_eq!(controller.state(), ControllerState::Standby);
        }
        prop_assert!(controller.history().is_empty());
    }

    /// Property: the log never exceeds its capacity.
    #[test]
    fn prop_log_capped(steps in prop::collection::vec(step(), 0..400)) {
        let mut controller = seeded();
        for step in &steps {
            apply(&mut controller, step);
        }
        prop_assert!(controller.log().len() <= controller.log().capacity());
    }

    /// Property: an enrolled password authenticates, when it differs from
    /// the admin password.
    #[test]
    fn prop_enrolled_password_unlocks(candidate in password()) {
        prop_assume!(candidate != "123456");

        let mut controller = Controller::default();
        controller.press(KeypadInput::Confirm);
        type_password(&mut controller, "123456");
        controller.press(KeypadInput::digit(1).unwrap());
        controller.press(KeypadInput::Confirm);
        prop_assert_eq!(controller.state(), ControllerState::EnrollPassword);

        type_password(&mut controller, &candidate);
        prop_assert_eq!(controller.state(), ControllerState::AdminMenu);
        prop_assert!(controller.credentials().find(&Password::new(&candidate).unwrap()).is_some());

        controller.press(KeypadInput::Cancel);
        prop_assert_eq!(controller.state(), ControllerState::AwaitingPassword);
        type_password(&mut controller, &candidate);
        prop_assert_eq!(controller.state(), ControllerState::Unlocking);
    }

    /// Property: a password that was never enrolled is rejected.
    #[test]
    fn prop_unknown_password_rejected(candidate in password()) {
        prop_assume!(!["123456", "111111", "222222"].contains(&candidate.as_str()));

        let mut controller = seeded();
        controller.press(KeypadInput::Confirm);
        type_password(&mut controller, &candidate);
        prop_assert_eq!(controller.state(), ControllerState::AwaitingPassword);
        prop_assert_eq!(controller.error_count(), 1);
    }

    /// Property: every LCD line is 16 ASCII characters in every reachable state.
    #[test]
    fn prop_display_fits(steps in prop::collection::vec(step(), 0..100)) {
        let mut controller = seeded();
        for step in &steps {
            apply(&mut controller, step);
            let snapshot = controller.snapshot();
            for line in snapshot.display.lines() {
                prop_assert_eq!(line.chars().count(), 16);
                prop_assert!(line.is_ascii());
            }
        }
    }
}
