//! Core constants for the door-lock controller.
//!
//! This module defines the fixed parameters of the lock appliance: password
//! format, credential capacity, lockout policy, timer durations, buzzer
//! pulse lengths and LCD geometry. Every other crate reads these values
//! either directly or through [`LockConfig`](crate::LockConfig), whose
//! defaults are built from them.
//!
//! # Usage
//!
//! ```
//! use doorlock_core::constants::*;
//!
//! assert_eq!(PASSWORD_LENGTH, 6);
//! assert_eq!(MAX_ERRORS, 3);
//!
//! use std::time::Duration;
//! let beep = Duration::from_millis(BEEP_PULSE_MS);
//! assert!(beep < Duration::from_millis(DOORBELL_PULSE_MS));
//! ```

// ============================================================================
// Credentials
// ============================================================================

/// Number of digits in every password, user or admin.
///
/// A `Confirm` with fewer digits in the buffer counts as a failed attempt.
pub const PASSWORD_LENGTH: usize = 6;

/// Factory administrator password.
///
/// Entering this password in `AwaitingPassword` opens the admin menu. It is
/// checked before the credential store, so a user credential equal to it can
/// never unlock the door.
pub const ADMIN_PASSWORD: &str = "123456";

/// Capacity of the credential store.
pub const MAX_USERS: usize = 10;

/// Largest credential store a configuration may ask for.
pub const MAX_USERS_LIMIT: usize = 1000;

/// Passwords written by the "pre-load test users" admin shortcut.
///
/// # Examples
///
/// ```
/// use doorlock_core::constants::{SEED_PASSWORDS, PASSWORD_LENGTH};
///
/// assert!(SEED_PASSWORDS.iter().all(|p| p.len() == PASSWORD_LENGTH));
/// ```
pub const SEED_PASSWORDS: [&str; 2] = ["111111", "222222"];

// ============================================================================
// Lockout Policy
// ============================================================================

/// Consecutive authentication failures that trigger a lockout.
pub const MAX_ERRORS: u8 = 3;

/// Lockout duration in seconds (one minute).
pub const LOCK_TIME_SECS: u32 = 60;

// ============================================================================
// Timers
// ============================================================================

/// Seconds the motor stays engaged after a successful unlock.
pub const UNLOCK_HOLD_SECS: u32 = 5;

/// Seconds the fingerprint result stays on screen before the controller
/// returns to password entry.
///
/// Models the sensor processing latency of the capture module.
pub const FINGERPRINT_SETTLE_SECS: u32 = 10;

/// Clock period in milliseconds (the controller expects one tick per second).
pub const TICK_PERIOD_MS: u64 = 1000;

// ============================================================================
// Buzzer
// ============================================================================

/// Length of the error beep pulse.
pub const BEEP_PULSE_MS: u64 = 200;

/// Length of the doorbell ("ding-dong") pulse.
pub const DOORBELL_PULSE_MS: u64 = 1000;

// ============================================================================
// Fingerprint Sensor
// ============================================================================

/// Template id reported before anything is injected.
pub const DEFAULT_TEMPLATE_ID: u8 = 1;

// ============================================================================
// Event Log
// ============================================================================

/// Maximum number of log entries retained, newest first.
pub const LOG_CAPACITY: usize = 50;

/// Largest log a configuration may ask for.
pub const LOG_CAPACITY_LIMIT: usize = 10_000;

/// Maximum number of state transitions kept in the controller history.
pub const TRANSITION_HISTORY_SIZE: usize = 100;

// ============================================================================
// Display
// ============================================================================

/// Number of text lines on the LCD.
pub const LCD_LINES: usize = 4;

/// Number of characters per LCD line.
pub const LCD_COLUMNS: usize = 16;

/// Placeholder used to show unfilled password positions.
pub const INPUT_PLACEHOLDER: char = '_';

/// Mask character used while enrolling a new password.
pub const INPUT_MASK: char = '*';

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_password_format() {
        assert_eq!(ADMIN_PASSWORD.len(), PASSWORD_LENGTH);
        assert!(ADMIN_PASSWORD.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_seed_passwords_fit_store() {
        assert!(SEED_PASSWORDS.len() <= MAX_USERS);
        assert!(!SEED_PASSWORDS.contains(&ADMIN_PASSWORD));
    }

    #[test]
    fn test_pulse_lengths_below_tick() {
        assert!(BEEP_PULSE_MS < TICK_PERIOD_MS);
        assert!(DOORBELL_PULSE_MS <= TICK_PERIOD_MS);
    }
}
