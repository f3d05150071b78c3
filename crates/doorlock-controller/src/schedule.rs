//! Countdown timers and scheduled transitions.
//!
//! Two kinds of time-driven behaviour exist in the lock:
//!
//! - A [`Countdown`] is a visible seconds counter that belongs to a state
//!   (`Unlocking` or `Locked`). It is decremented once per tick and its
//!   expiry moves the controller to `Standby`. Only one can exist at a time,
//!   which is why the controller stores a single `Option<Countdown>`.
//! - A [`ScheduledTransition`] is an entry owned by the controller: a token,
//!   a due time in uptime seconds, the state that armed it and the target.
//!   Leaving the arming state voids the entry, so a stale timer can never
//!   fire against a state it no longer matches.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ControllerState;

/// Which state a countdown belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownKind {
    /// Motor hold after a successful unlock.
    Unlock,
    /// Keypad lockout after too many failures.
    Lockout,
}

/// Seconds counter decremented once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    kind: CountdownKind,
    remaining: u32,
}

impl Countdown {
    pub fn new(kind: CountdownKind, secs: u32) -> Self {
        Self {
            kind,
            remaining: secs,
        }
    }

    pub fn kind(&self) -> CountdownKind {
        self.kind
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Consume one second. Returns `true` once the countdown reaches zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_controller::{Countdown, CountdownKind};
    ///
    /// let mut countdown = Countdown::new(CountdownKind::Unlock, 2);
    /// assert!(!countdown.tick());
    /// assert!(countdown.tick());
    /// assert_eq!(countdown.remaining(), 0);
    /// ```
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

/// Handle identifying one scheduled transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A transition the controller will perform at a given uptime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTransition {
    pub token: TimerToken,

    /// Uptime (seconds) at or after which the entry fires.
    pub due_at: u64,

    /// State that armed the entry; the entry is void outside it.
    pub armed_in: ControllerState,

    pub target: ControllerState,

    pub reason: String,
}

/// Set of pending scheduled transitions.
///
/// # Examples
///
/// ```
/// use doorlock_controller::{Scheduler, ControllerState};
///
/// let mut scheduler = Scheduler::default();
/// scheduler.schedule(
///     ControllerState::FingerprintCapture,
///     ControllerState::AwaitingPassword,
///     "finger logic done",
///     10,
/// );
///
/// assert!(scheduler.take_due(9, ControllerState::FingerprintCapture).is_none());
/// let due = scheduler.take_due(10, ControllerState::FingerprintCapture).unwrap();
/// assert_eq!(due.target, ControllerState::AwaitingPassword);
/// assert!(scheduler.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    next_token: u64,
    pending: Vec<ScheduledTransition>,
}

impl Scheduler {
    /// Arm a transition from `armed_in` to `target` at uptime `due_at`.
    pub fn schedule(
        &mut self,
        armed_in: ControllerState,
        target: ControllerState,
        reason: impl Into<String>,
        due_at: u64,
    ) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.pending.push(ScheduledTransition {
            token,
            due_at,
            armed_in,
            target,
            reason: reason.into(),
        });
        token
    }

    /// Void every pending entry. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Remove and return the earliest entry due at `now` for `current`.
    ///
    /// Due entries armed in another state are discarded on the way.
    pub fn take_due(
        &mut self,
        now: u64,
        current: ControllerState,
    ) -> Option<ScheduledTransition> {
        self.pending.retain(|entry| {
            let stale = entry.due_at <= now && entry.armed_in != current;
            if stale {
                debug!(
                    token = entry.token.as_u64(),
                    armed_in = %entry.armed_in,
                    %current,
                    "discarding stale scheduled transition"
                );
            }
            !stale
        });

        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due_at <= now)
            .min_by_key(|(_, entry)| (entry.due_at, entry.token))
            .map(|(index, _)| index)?;

        Some(self.pending.remove(index))
    }

    pub fn pending(&self) -> &[ScheduledTransition] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
