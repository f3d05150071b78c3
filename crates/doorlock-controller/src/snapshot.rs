//! Read-only projection of the controller for views.

use serde::{Deserialize, Serialize};

use doorlock_core::AdminOption;

use crate::ControllerState;
use crate::display::LcdFrame;
use crate::event_log::LogEntry;

/// Everything a view needs to render the lock, taken at one instant.
///
/// Serializes to JSON with camelCase keys so a web front end can consume it
/// directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub state: ControllerState,

    /// Firmware state code (`State0`, `State_Locked`, ...).
    pub state_code: String,

    /// Four padded LCD lines.
    pub display: LcdFrame,

    pub motor_engaged: bool,
    pub buzzer_active: bool,
    pub error_count: u8,

    /// Zero unless the controller is `Locked`.
    pub lockout_seconds_remaining: u32,

    /// Zero unless the controller is `Unlocking`.
    pub unlock_seconds_remaining: u32,

    /// Number of digits in the password buffer.
    pub input_len: usize,

    pub admin_selection: Option<AdminOption>,
    pub user_count: usize,

    /// Controller uptime in seconds.
    pub uptime: u64,

    /// Log entries, newest first.
    pub logs: Vec<LogEntry>,
}

impl Snapshot {
    /// Trimmed LCD lines, convenient for assertions and terminal output.
    pub fn lines(&self) -> Vec<&str> {
        self.display.trimmed()
    }
}
