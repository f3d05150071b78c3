//! Bounded event log, newest entry first.
//!
//! This is the serial log of the lock: every transition, buzzer pulse,
//! capture result and admin action is appended here with the state and
//! error counter at the time of the event. The oldest entry is dropped once
//! the capacity is reached.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use doorlock_core::{FingerprintOutcome, TemplateId};

use crate::ControllerState;
use crate::peripherals::BuzzerPattern;

/// Structured classification of a log entry.
///
/// The display deriver matches on this instead of parsing the event text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogKind {
    /// The controller changed (or re-entered) state.
    Transition {
        from: ControllerState,
        to: ControllerState,
    },

    /// A buzzer pulse was triggered.
    Buzzer { pattern: BuzzerPattern },

    /// A fingerprint capture identified an enrolled finger.
    CaptureSucceeded { template_id: TemplateId },

    /// A fingerprint capture did not identify a finger.
    CaptureFailed { outcome: FingerprintOutcome },

    /// Any other action worth recording.
    Note,
}

/// One line of the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Wall-clock time of the event
    pub timestamp: DateTime<Utc>,

    /// Human-readable event text
    pub event: String,

    /// State the controller was in after the event
    pub state: ControllerState,

    /// Error counter at the time of the event
    pub error_count: u8,

    /// Structured classification
    pub kind: LogKind,
}

impl LogEntry {
    pub fn new(
        event: impl Into<String>,
        state: ControllerState,
        error_count: u8,
        kind: LogKind,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            event: event.into(),
            state,
            error_count,
            kind,
        }
    }

    /// Whether this entry records a successful capture.
    pub fn is_capture_success(&self) -> bool {
        matches!(self.kind, LogKind::CaptureSucceeded { .. })
    }

    /// Whether this entry records a failed capture.
    pub fn is_capture_failure(&self) -> bool {
        matches!(self.kind, LogKind::CaptureFailed { .. })
    }
}

/// Newest-first log with a fixed capacity
///
/// # Examples
///
/// ```
/// use doorlock_controller::{EventLog, LogEntry, LogKind, ControllerState};
///
/// let mut log = EventLog::new(2);
/// log.push(LogEntry::new("a", ControllerState::Standby, 0, LogKind::Note));
/// log.push(LogEntry::new("b", ControllerState::Standby, 0, LogKind::Note));
/// log.push(LogEntry::new("c", ControllerState::Standby, 0, LogKind::Note));
///
/// let events: Vec<&str> = log.iter().map(|e| e.event.as_str()).collect();
/// assert_eq!(events, vec!["c", "b"]);
/// ```
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Insert an entry at the front, evicting the oldest if full.
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Owned copy of the entries, newest first.
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(text: &str) -> LogEntry {
        LogEntry::new(text, ControllerState::Standby, 0, LogKind::Note)
    }

    #[test]
    fn test_large_capacity_allocates_lazily() {
        let mut log = EventLog::new(usize::MAX);
        log.push(note("only"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_newest_first() {
        let mut log = EventLog::new(10);
        log.push(note("first"));
        log.push(note("second"));

        assert_eq!(log.latest().unwrap().event, "second");
        assert_eq!(log.iter().last().unwrap().event, "first");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = EventLog::new(50);
        for i in 0..60 {
            log.push(note(&format!("event {i}")));
        }

        assert_eq!(log.len(), 50);
        assert_eq!(log.latest().unwrap().event, "event 59");
        assert_eq!(log.iter().last().unwrap().event, "event 10");
    }

    #[test]
    fn test_capture_classification() {
        let ok = LogEntry::new(
            "capture success",
            ControllerState::FingerprintCapture,
            0,
            LogKind::CaptureSucceeded {
                template_id: TemplateId::new(7),
            },
        );
        let failed = LogEntry::new(
            "capture failed",
            ControllerState::FingerprintCapture,
            1,
            LogKind::CaptureFailed {
                outcome: FingerprintOutcome::NoFinger,
            },
        );

        assert!(ok.is_capture_success());
        assert!(!ok.is_capture_failure());
        assert!(failed.is_capture_failure());
        assert!(!note("x").is_capture_success());
    }

    #[test]
    fn test_clear() {
        let mut log = EventLog::new(3);
        log.push(note("x"));
        log.clear();
        assert!(log.is_empty());
        assert!(log.latest().is_none());
    }

    #[test]
    fn test_entry_serialization() {
        let entry = LogEntry::new(
            "buzzer: beep",
            ControllerState::AwaitingPassword,
            1,
            LogKind::Buzzer {
                pattern: BuzzerPattern::Beep,
            },
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["state"], "awaiting_password");
        assert_eq!(json["kind"]["kind"], "buzzer");
        assert_eq!(json["kind"]["pattern"], "beep");
    }
}
