//! Terminal rendering of the lock.

use doorlock_controller::{LogEntry, Snapshot};
use doorlock_core::constants::LCD_COLUMNS;

/// Draw the LCD in a box with a status line underneath.
pub fn render_display(snapshot: &Snapshot) -> String {
    let border = format!("+{}+", "-".repeat(LCD_COLUMNS));
    let rows = snapshot
        .display
        .lines()
        .iter()
        .map(|line| format!("|{line}|"))
        .collect::<Vec<_>>()
        .join("\n");
    let status = format!(
        "[{}] motor={} buzzer={} errors={} users={}",
        snapshot.state_code,
        on_off(snapshot.motor_engaged),
        on_off(snapshot.buzzer_active),
        snapshot.error_count,
        snapshot.user_count,
    );

    format!("{border}\n{rows}\n{border}\n{status}")
}

/// Format the newest `count` log entries, newest first.
pub fn render_logs(entries: &[LogEntry], count: usize) -> String {
    if entries.is_empty() {
        return "(log empty)".to_string();
    }

    entries
        .iter()
        .take(count)
        .map(|entry| {
            format!(
                "{} {:<18} err={} {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.state.to_string(),
                entry.error_count,
                entry.event
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
