//! Door-lock controller crate.
//!
//! This crate holds the control core of the lock appliance: the finite
//! state machine, the credential store, the event log, the timers that
//! drive automatic transitions, the simulated peripherals and the pure
//! function that derives the LCD content from all of the above.
//!
//! # Example
//!
//! ```
//! use doorlock_controller::{Controller, ControllerState};
//! use doorlock_core::KeypadInput;
//!
//! let mut controller = Controller::default();
//! controller.seed_credentials();
//!
//! controller.press(KeypadInput::Confirm);
//! for c in "111111".chars() {
//!     controller.press(KeypadInput::from_char(c).unwrap());
//! }
//! controller.press(KeypadInput::Confirm);
//!
//! assert_eq!(controller.state(), ControllerState::Unlocking);
//! assert!(controller.snapshot().motor_engaged);
//! ```

pub mod controller;
pub mod credentials;
pub mod display;
pub mod event_log;
pub mod peripherals;
pub mod schedule;
pub mod snapshot;
pub mod state_machine;

pub use controller::{Controller, Dispatch, Event};
pub use credentials::{Credential, CredentialStore};
pub use display::{Alignment, DisplayInputs, LcdFrame, align_text, derive_lines, truncate_text};
pub use event_log::{EventLog, LogEntry, LogKind};
pub use peripherals::{Buzzer, BuzzerPattern, FingerprintSensor, Motor};
pub use schedule::{Countdown, CountdownKind, ScheduledTransition, Scheduler, TimerToken};
pub use snapshot::Snapshot;
pub use state_machine::{ControllerState, StateMachine, StateTransition};
