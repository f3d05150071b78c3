//! The lock controller.
//!
//! [`Controller`] owns every piece of mutable lock state: the state machine,
//! the password buffer, the admin selection, the error counter, the active
//! countdown, the scheduled transitions, the credential store, the event log
//! and the peripherals. It is driven by exactly two kinds of input,
//! keypad presses and the 1 Hz tick, and processes them one at a time.
//!
//! Views never mutate the controller. They read a [`Snapshot`], which is
//! recomputed on demand, so the LCD always reflects the current state.
//!
//! # Failure Handling
//!
//! Authentication failures are not errors. Every failure goes through
//! `record_error`, which bumps the error counter, sounds a short beep and,
//! once the configured maximum is reached, forces `Locked` and arms the
//! lockout countdown.

use std::collections::VecDeque;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

use doorlock_core::constants::{PASSWORD_LENGTH, SEED_PASSWORDS};
use doorlock_core::{
    AdminOption, Digit, FingerprintReading, KeypadInput, LockConfig, Password, Result,
};

use crate::credentials::CredentialStore;
use crate::display::{DisplayInputs, derive_lines};
use crate::event_log::{EventLog, LogEntry, LogKind};
use crate::peripherals::{Buzzer, BuzzerPattern, FingerprintSensor, Motor};
use crate::schedule::{Countdown, CountdownKind, ScheduledTransition, Scheduler};
use crate::snapshot::Snapshot;
use crate::state_machine::{ControllerState, StateMachine, StateTransition};

/// Input delivered to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A keypad key was pressed.
    Key(KeypadInput),

    /// One second elapsed.
    Tick,
}

impl From<KeypadInput> for Event {
    fn from(key: KeypadInput) -> Self {
        Event::Key(key)
    }
}

/// What the controller did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The event changed state, buffer, selection, counter or log.
    Accepted,

    /// The event had no effect in the current state.
    Ignored,
}

impl Dispatch {
    pub fn is_accepted(self) -> bool {
        matches!(self, Dispatch::Accepted)
    }
}

/// Door-lock control core.
///
/// # Examples
///
/// ```
/// use doorlock_controller::{Controller, ControllerState};
/// use doorlock_core::KeypadInput;
///
/// let mut controller = Controller::default();
///
/// // Cancel in standby rings the doorbell and stays put
/// controller.press(KeypadInput::Cancel);
/// assert_eq!(controller.state(), ControllerState::Standby);
/// assert!(controller.snapshot().buzzer_active);
/// ```
#[derive(Debug, Clone)]
pub struct Controller {
    config: LockConfig,
    machine: StateMachine,

    /// Password buffer, at most `PASSWORD_LENGTH` digits.
    input: Vec<Digit>,

    /// Admin menu selection; only ever set in `AdminMenu`.
    selection: Option<AdminOption>,

    error_count: u8,

    /// Unlock hold or lockout countdown; at most one is active.
    countdown: Option<Countdown>,

    scheduler: Scheduler,
    credentials: CredentialStore,
    log: EventLog,
    motor: Motor,
    buzzer: Buzzer,
    sensor: FingerprintSensor,

    /// Seconds since power-on, advanced by `Tick`.
    uptime: u64,
}

impl Controller {
    /// Create a controller in `Standby` with an empty credential store.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration fails validation.
    pub fn new(config: LockConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: LockConfig) -> Self {
        Self {
            machine: StateMachine::new(),
            input: Vec::with_capacity(PASSWORD_LENGTH),
            selection: None,
            error_count: 0,
            countdown: None,
            scheduler: Scheduler::default(),
            credentials: CredentialStore::new(config.max_users),
            log: EventLog::new(config.log_capacity),
            motor: Motor::default(),
            buzzer: Buzzer::default(),
            sensor: FingerprintSensor::default(),
            uptime: 0,
            config,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> ControllerState {
        self.machine.current_state()
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn error_count(&self) -> u8 {
        self.error_count
    }

    /// Digits currently in the password buffer.
    pub fn input(&self) -> &[Digit] {
        &self.input
    }

    pub fn admin_selection(&self) -> Option<AdminOption> {
        self.selection
    }

    pub fn countdown(&self) -> Option<Countdown> {
        self.countdown
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Transition history, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        self.machine.history()
    }

    /// Scheduled transitions not yet fired or voided.
    pub fn pending_transitions(&self) -> &[ScheduledTransition] {
        self.scheduler.pending()
    }

    pub fn uptime(&self) -> u64 {
        self.uptime
    }

    pub fn motor_engaged(&self) -> bool {
        self.motor.is_engaged()
    }

    pub fn buzzer(&self) -> &Buzzer {
        &self.buzzer
    }

    /// Seconds left on the countdown of the given kind, zero if none.
    pub fn seconds_remaining(&self, kind: CountdownKind) -> u32 {
        self.countdown
            .filter(|c| c.kind() == kind)
            .map_or(0, |c| c.remaining())
    }

    // ------------------------------------------------------------------
    // Event processing
    // ------------------------------------------------------------------

    /// Process one event.
    pub fn handle(&mut self, event: Event) -> Dispatch {
        match event {
            Event::Key(key) => self.press(key),
            Event::Tick => self.tick(),
        }
    }

    /// Process one keypad press.
    pub fn press(&mut self, key: KeypadInput) -> Dispatch {
        let state = self.state();
        if !state.accepts_keypad() {
            debug!("Keypad disabled in {}, ignoring {}", state, key);
            return Dispatch::Ignored;
        }

        match state {
            ControllerState::Standby => self.on_standby(key),
            ControllerState::AwaitingPassword => self.on_awaiting_password(key),
            ControllerState::AdminMenu => self.on_admin_menu(key),
            ControllerState::EnrollPassword => self.on_enroll(key),
            ControllerState::FingerprintCapture => self.on_fingerprint(key),
            ControllerState::Unlocking | ControllerState::Locked => Dispatch::Ignored,
        }
    }

    /// Advance the clock by one second.
    ///
    /// Decrements the active countdown, fires its expiry, then fires any
    /// scheduled transition that has come due for the current state.
    pub fn tick(&mut self) -> Dispatch {
        self.uptime += 1;

        if let Some(countdown) = self.countdown.as_mut()
            && countdown.tick()
        {
            let kind = countdown.kind();
            self.countdown = None;
            self.on_countdown_expired(kind);
        }

        loop {
            let current = self.state();
            let Some(due) = self.scheduler.take_due(self.uptime, current) else {
                break;
            };
            debug!("Scheduled transition {} fired", due.token.as_u64());
            self.transition_to(due.target, &due.reason);
        }

        Dispatch::Accepted
    }

    /// Set the reading the next fingerprint capture will report.
    pub fn inject_fingerprint(&mut self, reading: FingerprintReading) {
        debug!(
            "Fingerprint reading injected: {} (id {})",
            reading.outcome, reading.template_id
        );
        self.sensor.inject(reading);
    }

    // ------------------------------------------------------------------
    // Admin shortcuts
    // ------------------------------------------------------------------

    /// Replace the credential store with the built-in test users.
    pub fn seed_credentials(&mut self) -> usize {
        let passwords = SEED_PASSWORDS
            .iter()
            .filter_map(|p| Password::new(p).ok());
        self.seed_with(passwords)
    }

    /// Replace the credential store with `passwords`.
    ///
    /// Returns how many were stored; extras beyond `max_users` are dropped.
    pub fn seed_with<I>(&mut self, passwords: I) -> usize
    where
        I: IntoIterator<Item = Password>,
    {
        let stored = self.credentials.seed(passwords);
        info!("Credential store seeded with {} users", stored);
        self.record("Pre-loaded test users", LogKind::Note);
        stored
    }

    /// Power-cycle the simulator.
    ///
    /// Back to `Standby` with no errors, no users, no timers, motor off,
    /// and a log holding only the reset entry.
    pub fn reset(&mut self) {
        self.scheduler.cancel_all();
        self.countdown = None;
        self.motor.disengage();
        self.buzzer.silence();
        self.input.clear();
        self.selection = None;
        self.error_count = 0;
        self.credentials.clear();
        self.machine.reset("simulator reset", self.uptime);
        self.log.clear();
        self.record("Simulator reset", LogKind::Note);
        info!("Simulator reset");
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Snapshot using the local wall clock.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_at(Local::now().naive_local())
    }

    /// Snapshot with an explicit wall-clock time for the standby screen.
    pub fn snapshot_at(&self, now: NaiveDateTime) -> Snapshot {
        let inputs = DisplayInputs {
            state: self.state(),
            input: &self.input,
            admin_selection: self.selection,
            countdown: self.countdown,
            error_count: self.error_count,
            last_log: self.log.latest(),
            store_full: self.credentials.is_full(),
            now,
        };

        Snapshot {
            state: self.state(),
            state_code: self.state().firmware_code().to_string(),
            display: derive_lines(&inputs),
            motor_engaged: self.motor.is_engaged(),
            buzzer_active: self.buzzer.is_active(),
            error_count: self.error_count,
            lockout_seconds_remaining: self.seconds_remaining(CountdownKind::Lockout),
            unlock_seconds_remaining: self.seconds_remaining(CountdownKind::Unlock),
            input_len: self.input.len(),
            admin_selection: self.selection,
            user_count: self.credentials.len(),
            uptime: self.uptime,
            logs: self.log.to_vec(),
        }
    }

    // ------------------------------------------------------------------
    // Per-state key handling
    // ------------------------------------------------------------------

    fn on_standby(&mut self, key: KeypadInput) -> Dispatch {
        match key {
            KeypadInput::Confirm => {
                self.transition_to(ControllerState::AwaitingPassword, "unlock requested");
                Dispatch::Accepted
            }
            KeypadInput::Cancel => {
                self.sound(BuzzerPattern::Doorbell);
                Dispatch::Accepted
            }
            _ => Dispatch::Ignored,
        }
    }

    fn on_awaiting_password(&mut self, key: KeypadInput) -> Dispatch {
        match key {
            KeypadInput::Digit(digit) => self.push_digit(digit),
            KeypadInput::Confirm => {
                self.check_password();
                Dispatch::Accepted
            }
            KeypadInput::Cancel => {
                self.input.clear();
                Dispatch::Accepted
            }
            KeypadInput::SwitchToFingerprint => {
                self.transition_to(ControllerState::FingerprintCapture, "switch to fingerprint");
                Dispatch::Accepted
            }
            KeypadInput::Hash => Dispatch::Ignored,
        }
    }

    fn check_password(&mut self) {
        let Ok(candidate) = Password::from_digits(&self.input) else {
            debug!("Password too short ({} digits)", self.input.len());
            self.input.clear();
            self.record_error();
            return;
        };

        if candidate == self.config.admin_password {
            self.error_count = 0;
            info!("Admin password accepted");
            self.transition_to(ControllerState::AdminMenu, "admin login");
            return;
        }

        if let Some(id) = self.credentials.find(&candidate).map(|c| c.id) {
            self.error_count = 0;
            info!("User {} authenticated, unlocking", id);
            self.transition_to(ControllerState::Unlocking, &format!("password ok (user {id})"));
            self.countdown = Some(Countdown::new(
                CountdownKind::Unlock,
                self.config.unlock_hold_secs,
            ));
            self.motor.engage();
            return;
        }

        debug!("Password rejected");
        self.input.clear();
        self.record_error();
    }

    fn on_admin_menu(&mut self, key: KeypadInput) -> Dispatch {
        match key {
            KeypadInput::Digit(digit) => match AdminOption::from_u8(digit.as_u8()) {
                Ok(option) => {
                    self.selection = Some(option);
                    Dispatch::Accepted
                }
                Err(_) => Dispatch::Ignored,
            },
            KeypadInput::Confirm => match self.selection {
                Some(option) => {
                    self.run_admin_option(option);
                    Dispatch::Accepted
                }
                None => Dispatch::Ignored,
            },
            KeypadInput::Cancel => {
                self.transition_to(ControllerState::AwaitingPassword, "admin exit");
                Dispatch::Accepted
            }
            KeypadInput::SwitchToFingerprint | KeypadInput::Hash => Dispatch::Ignored,
        }
    }

    fn run_admin_option(&mut self, option: AdminOption) {
        info!("Admin option {} selected", option);
        match option {
            AdminOption::AddPassword => {
                self.transition_to(ControllerState::EnrollPassword, "add password");
            }
            AdminOption::ClearFingerprints => {
                self.transition_to(ControllerState::AwaitingPassword, "fingerprint db cleared");
            }
            AdminOption::DeletePasswords => {
                self.credentials.clear();
                self.transition_to(ControllerState::AwaitingPassword, "password db cleared");
            }
            AdminOption::AddFingerprint => {
                self.transition_to(ControllerState::AwaitingPassword, "enroll fingerprint (sim)");
            }
            AdminOption::ViewLogs => {
                self.record("Viewed logs", LogKind::Note);
            }
        }
    }

    fn on_enroll(&mut self, key: KeypadInput) -> Dispatch {
        match key {
            KeypadInput::Digit(digit) => self.push_digit(digit),
            KeypadInput::Confirm => {
                self.finish_enrollment();
                Dispatch::Accepted
            }
            KeypadInput::Cancel => {
                self.transition_to(ControllerState::AdminMenu, "enrollment canceled");
                Dispatch::Accepted
            }
            KeypadInput::SwitchToFingerprint | KeypadInput::Hash => Dispatch::Ignored,
        }
    }

    fn finish_enrollment(&mut self) {
        let Ok(password) = Password::from_digits(&self.input) else {
            self.transition_to(ControllerState::AdminMenu, "canceled: insufficient length");
            return;
        };

        match self.credentials.enroll(password) {
            Ok(id) => {
                info!("Enrolled user {}", id);
                self.transition_to(ControllerState::AdminMenu, &format!("added user {id}"));
            }
            Err(e) => {
                warn!("Enrollment rejected: {}", e);
                self.transition_to(ControllerState::AdminMenu, "user list full");
            }
        }
    }

    fn on_fingerprint(&mut self, key: KeypadInput) -> Dispatch {
        match key {
            KeypadInput::Confirm => {
                let reading = self.sensor.capture();
                self.process_capture(reading);
                Dispatch::Accepted
            }
            KeypadInput::Cancel => {
                self.transition_to(ControllerState::AwaitingPassword, "fingerprint canceled");
                Dispatch::Accepted
            }
            _ => Dispatch::Ignored,
        }
    }

    fn process_capture(&mut self, reading: FingerprintReading) {
        let failed = LogKind::CaptureFailed {
            outcome: reading.outcome,
        };

        if reading.outcome.is_match() {
            self.error_count = 0;
            info!("Fingerprint matched template {}", reading.template_id);
            self.transition_to(ControllerState::FingerprintCapture, "fingerprint captured");
            self.record(
                &format!("Capture success (ID {})", reading.template_id),
                LogKind::CaptureSucceeded {
                    template_id: reading.template_id,
                },
            );
            self.schedule_settle();
            return;
        }

        if self.record_error() {
            self.record(&format!("Capture failed: {}", reading.outcome), failed);
            return;
        }

        self.transition_to(ControllerState::FingerprintCapture, "fingerprint captured");
        self.record(&format!("Capture failed: {}", reading.outcome), failed);
        self.schedule_settle();
    }

    fn schedule_settle(&mut self) {
        let due_at = self.uptime + u64::from(self.config.fingerprint_settle_secs);
        self.scheduler.schedule(
            ControllerState::FingerprintCapture,
            ControllerState::AwaitingPassword,
            "finger logic done",
            due_at,
        );
    }

    fn push_digit(&mut self, digit: Digit) -> Dispatch {
        if self.input.len() >= PASSWORD_LENGTH {
            return Dispatch::Ignored;
        }
        self.input.push(digit);
        Dispatch::Accepted
    }

    // ------------------------------------------------------------------
    // Shared procedures
    // ------------------------------------------------------------------

    /// Count one authentication failure. Returns `true` if it locked the
    /// keypad.
    fn record_error(&mut self) -> bool {
        self.error_count = self.error_count.saturating_add(1);
        self.sound(BuzzerPattern::Beep);

        if self.error_count < self.config.max_errors {
            debug!("Authentication failure {}/{}", self.error_count, self.config.max_errors);
            return false;
        }

        warn!(
            "{} consecutive failures, keypad locked for {}s",
            self.error_count, self.config.lock_time_secs
        );
        self.transition_to(ControllerState::Locked, "exceeded max errors");
        self.countdown = Some(Countdown::new(
            CountdownKind::Lockout,
            self.config.lock_time_secs,
        ));
        true
    }

    fn on_countdown_expired(&mut self, kind: CountdownKind) {
        match kind {
            CountdownKind::Unlock => {
                info!("Unlock hold elapsed, door locked");
                self.transition_to(ControllerState::Standby, "door auto-locked");
            }
            CountdownKind::Lockout => {
                self.error_count = 0;
                info!("Lockout ended");
                self.transition_to(ControllerState::Standby, "lockout ended");
            }
        }
    }

    /// Move to `target` along a table edge.
    ///
    /// Entering any state clears the buffer and selection, voids scheduled
    /// transitions and drops the countdown. The motor is only engaged in
    /// `Unlocking`; callers arm countdowns after this returns.
    fn transition_to(&mut self, target: ControllerState, reason: &str) {
        let transition = match self.machine.transition_to(target, reason, self.uptime) {
            Ok(transition) => transition,
            Err(e) => {
                warn!("Refusing transition ({}): {}", reason, e);
                return;
            }
        };

        self.input.clear();
        self.selection = None;
        let voided = self.scheduler.cancel_all();
        if voided > 0 {
            debug!("Voided {} scheduled transition(s)", voided);
        }
        self.countdown = None;
        if target != ControllerState::Unlocking {
            self.motor.disengage();
        }

        debug!("{} -> {} ({})", transition.from, transition.to, reason);
        self.record(
            &format!("Transition: {reason}"),
            LogKind::Transition {
                from: transition.from,
                to: transition.to,
            },
        );
    }

    fn sound(&mut self, pattern: BuzzerPattern) {
        self.buzzer.trigger(pattern);
        let text = match pattern {
            BuzzerPattern::Beep => "Buzzer: beep",
            BuzzerPattern::Doorbell => "Buzzer: ding-dong",
        };
        self.record(text, LogKind::Buzzer { pattern });
    }

    fn record(&mut self, event: &str, kind: LogKind) {
        let entry = LogEntry::new(event, self.state(), self.error_count, kind);
        self.log.push(entry);
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::build(LockConfig::default())
    }
}
