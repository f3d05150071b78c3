//! Simulated peripherals driven by the controller.
//!
//! None of these hold control logic. The motor is a flag that mirrors the
//! `Unlocking` state, the buzzer is a fire-and-forget timed pulse, and the
//! fingerprint sensor only stores the reading the operator injected.
//!
//! Buzzer pulses are timed on the tokio clock, which follows the runtime's
//! paused time in tests and falls back to the system clock elsewhere.

use std::time::Duration;

use tokio::time::Instant;

use serde::{Deserialize, Serialize};

use doorlock_core::FingerprintReading;
use doorlock_core::constants::{BEEP_PULSE_MS, DOORBELL_PULSE_MS};

/// Door lock motor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Motor {
    engaged: bool,
}

impl Motor {
    pub fn engage(&mut self) {
        self.engaged = true;
    }

    pub fn disengage(&mut self) {
        self.engaged = false;
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }
}

/// Sound pattern played by the buzzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuzzerPattern {
    /// Short error beep.
    Beep,
    /// Doorbell "ding-dong".
    Doorbell,
}

impl BuzzerPattern {
    /// How long the buzzer stays active for this pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use doorlock_controller::BuzzerPattern;
    ///
    /// assert_eq!(BuzzerPattern::Beep.pulse(), Duration::from_millis(200));
    /// assert_eq!(BuzzerPattern::Doorbell.pulse(), Duration::from_millis(1000));
    /// ```
    pub fn pulse(self) -> Duration {
        match self {
            BuzzerPattern::Beep => Duration::from_millis(BEEP_PULSE_MS),
            BuzzerPattern::Doorbell => Duration::from_millis(DOORBELL_PULSE_MS),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuzzerPattern::Beep => "beep",
            BuzzerPattern::Doorbell => "doorbell",
        }
    }
}

/// Buzzer with a single self-clearing pulse.
///
/// A new trigger while a pulse is active restarts it; nothing is queued.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tokio::time::Instant;
/// use doorlock_controller::{Buzzer, BuzzerPattern};
///
/// let mut buzzer = Buzzer::default();
/// let start = Instant::now();
/// buzzer.trigger_at(BuzzerPattern::Beep, start);
///
/// assert!(buzzer.is_active_at(start + Duration::from_millis(100)));
/// assert!(!buzzer.is_active_at(start + Duration::from_millis(200)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Buzzer {
    /// Active pattern with its expiration time.
    pulse: Option<(BuzzerPattern, Instant)>,
}

impl Buzzer {
    /// Start a pulse now.
    pub fn trigger(&mut self, pattern: BuzzerPattern) {
        self.trigger_at(pattern, Instant::now());
    }

    /// Start a pulse at `now`.
    pub fn trigger_at(&mut self, pattern: BuzzerPattern, now: Instant) {
        self.pulse = Some((pattern, now + pattern.pulse()));
    }

    /// Whether the buzzer is sounding right now.
    pub fn is_active(&self) -> bool {
        self.is_active_at(Instant::now())
    }

    /// Whether the buzzer is sounding at `now`.
    pub fn is_active_at(&self, now: Instant) -> bool {
        self.pulse
            .is_some_and(|(_, expiration)| now < expiration)
    }

    /// When the current pulse ends, if one is still sounding.
    pub fn expires_at(&self) -> Option<Instant> {
        self.pulse
            .map(|(_, expiration)| expiration)
            .filter(|expiration| Instant::now() < *expiration)
    }

    /// Pattern of the most recent pulse, active or not.
    pub fn last_pattern(&self) -> Option<BuzzerPattern> {
        self.pulse.map(|(pattern, _)| pattern)
    }

    /// Silence the buzzer immediately.
    pub fn silence(&mut self) {
        self.pulse = None;
    }
}

/// Simulated fingerprint module.
///
/// Holds the outcome the operator wants the next capture to report.
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintSensor {
    reading: FingerprintReading,
}

impl FingerprintSensor {
    /// Set what the next capture will report.
    pub fn inject(&mut self, reading: FingerprintReading) {
        self.reading = reading;
    }

    /// Take a capture; returns a copy of the injected reading.
    pub fn capture(&self) -> FingerprintReading {
        self.reading
    }
}
