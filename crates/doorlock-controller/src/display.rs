//! LCD content derivation for the lock display.
//!
//! The lock has a 4-line × 16-column character LCD. Its content is never
//! stored: [`derive_lines`] recomputes the four lines from the controller
//! state every time a snapshot is taken, so the screen can never disagree
//! with the state machine.
//!
//! # Character Encoding - ASCII Only
//!
//! The LCD controller has no extended character set. Every line produced
//! here is ASCII; any other character is replaced with `?` and control
//! characters are removed before alignment.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use doorlock_controller::{ControllerState, DisplayInputs, derive_lines};
//!
//! let now = NaiveDate::from_ymd_opt(2026, 10, 16)
//!     .unwrap()
//!     .and_hms_opt(9, 30, 0)
//!     .unwrap();
//! let inputs = DisplayInputs::new(ControllerState::Standby, now);
//! let frame = derive_lines(&inputs);
//!
//! assert_eq!(frame.line(1).unwrap().trim_end(), "DATE: 26-10-16");
//! assert_eq!(frame.line(2).unwrap().trim_end(), "TIME: 09:30:00");
//! ```

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use doorlock_core::constants::{
    INPUT_MASK, INPUT_PLACEHOLDER, LCD_COLUMNS, LCD_LINES, PASSWORD_LENGTH,
};
use doorlock_core::{AdminOption, Digit, Error, Result};

use crate::event_log::{LogEntry, LogKind};
use crate::schedule::{Countdown, CountdownKind};
use crate::ControllerState;

/// Text alignment options for display lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Text starts at column 0, padded with spaces on the right.
    Left,
    /// Text centered (extra space on the right if odd).
    Center,
    /// Text ends at the last column, padded with spaces on the left.
    Right,
}

/// Four padded lines of LCD text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LcdFrame {
    lines: [String; LCD_LINES],
}

impl LcdFrame {
    /// Build a frame from per-line text and alignment.
    ///
    /// Missing lines are blank; extra lines are ignored.
    pub fn from_texts(texts: &[(&str, Alignment)]) -> Self {
        let mut lines: [String; LCD_LINES] = std::array::from_fn(|_| " ".repeat(LCD_COLUMNS));
        for (slot, (text, align)) in lines.iter_mut().zip(texts) {
            *slot = align_text(&sanitize_text(text), LCD_COLUMNS, *align);
        }
        Self { lines }
    }

    /// Blank frame.
    pub fn blank() -> Self {
        Self::from_texts(&[])
    }

    /// Get text from a specific line, padded to the column width.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLine` if the index is out of bounds.
    pub fn line(&self, line: usize) -> Result<&str> {
        self.lines
            .get(line)
            .map(String::as_str)
            .ok_or(Error::InvalidLine {
                line,
                max: LCD_LINES - 1,
            })
    }

    /// All lines, padded.
    pub fn lines(&self) -> &[String; LCD_LINES] {
        &self.lines
    }

    /// All lines with trailing padding removed.
    pub fn trimmed(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.trim_end()).collect()
    }
}

impl fmt::Display for LcdFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Everything the LCD content depends on.
///
/// The wall clock is passed in so derivation stays a pure function.
#[derive(Debug, Clone)]
pub struct DisplayInputs<'a> {
    pub state: ControllerState,
    pub input: &'a [Digit],
    pub admin_selection: Option<AdminOption>,
    pub countdown: Option<Countdown>,
    pub error_count: u8,
    pub last_log: Option<&'a LogEntry>,
    pub store_full: bool,
    pub now: NaiveDateTime,
}

impl<'a> DisplayInputs<'a> {
    /// Inputs for `state` with everything else empty.
    pub fn new(state: ControllerState, now: NaiveDateTime) -> Self {
        Self {
            state,
            input: &[],
            admin_selection: None,
            countdown: None,
            error_count: 0,
            last_log: None,
            store_full: false,
            now,
        }
    }

    fn remaining(&self, kind: CountdownKind) -> u32 {
        self.countdown
            .filter(|c| c.kind() == kind)
            .map_or(0, |c| c.remaining())
    }
}

/// Derive the four LCD lines for the current controller inputs.
pub fn derive_lines(inputs: &DisplayInputs<'_>) -> LcdFrame {
    use Alignment::*;

    match inputs.state {
        ControllerState::Standby => {
            let date = format!("DATE: {}", inputs.now.format("%y-%m-%d"));
            let time = format!("TIME: {}", inputs.now.format("%H:%M:%S"));
            LcdFrame::from_texts(&[
                ("**SMART  LOCK**", Center),
                (&date, Left),
                (&time, Left),
                ("OK:OPEN C:BELL", Left),
            ])
        }
        ControllerState::AwaitingPassword => {
            let entered = render_input(inputs.input, None);
            LcdFrame::from_texts(&[
                ("FINGERPRINT LOCK", Left),
                ("ENTER PASSWORD:", Left),
                (&entered, Left),
                ("S16: FINGERPRINT", Left),
            ])
        }
        ControllerState::AdminMenu => {
            let selection = match inputs.admin_selection {
                Some(option) => format!("SELECTED: {option}"),
                None => "SELECT 1-5 + OK".to_string(),
            };
            LcdFrame::from_texts(&[
                ("1.ADD 2.CLR FP", Left),
                ("3.DEL PASSWORDS", Left),
                ("4.ADD FP 5.LOGS", Left),
                (&selection, Left),
            ])
        }
        ControllerState::Unlocking => {
            let remaining = format!("REMAINING: {}s", inputs.remaining(CountdownKind::Unlock));
            LcdFrame::from_texts(&[
                ("WELCOME", Center),
                ("MOTOR UNLOCKING", Left),
                (&remaining, Left),
            ])
        }
        ControllerState::EnrollPassword => {
            if inputs.store_full {
                LcdFrame::from_texts(&[("USER LIST FULL", Left)])
            } else {
                let masked = render_input(inputs.input, Some(INPUT_MASK));
                LcdFrame::from_texts(&[("NEW PASSWORD:", Left), (&masked, Left)])
            }
        }
        ControllerState::Locked => {
            let errors = format!("ERRORS: {}", inputs.error_count);
            let countdown = format!("COUNTDOWN: {}s", inputs.remaining(CountdownKind::Lockout));
            LcdFrame::from_texts(&[
                ("KEYPAD LOCKED", Left),
                (&errors, Left),
                (&countdown, Left),
            ])
        }
        ControllerState::FingerprintCapture => match inputs.last_log.map(|entry| entry.kind) {
            Some(LogKind::CaptureSucceeded { template_id }) => {
                let id = format!("ID:{template_id}");
                LcdFrame::from_texts(&[("WELCOME", Center), ("", Left), (&id, Left)])
            }
            Some(LogKind::CaptureFailed { .. }) => {
                LcdFrame::from_texts(&[("FINGERPRINT FAIL", Left)])
            }
            _ => LcdFrame::from_texts(&[
                ("PLACE FINGER", Left),
                ("", Left),
                ("PRESS OK TO SCAN", Left),
            ]),
        },
    }
}

/// Render the password buffer: digits (or a mask) then placeholders.
///
/// Enrollment shows only the mask characters typed so far.
fn render_input(input: &[Digit], mask: Option<char>) -> String {
    match mask {
        Some(mask) => std::iter::repeat_n(mask, input.len()).collect(),
        None => {
            let mut text: String = input.iter().map(|d| d.as_char()).collect();
            let missing = PASSWORD_LENGTH.saturating_sub(input.len());
            text.extend(std::iter::repeat_n(INPUT_PLACEHOLDER, missing));
            text
        }
    }
}

/// Truncate ASCII text to a maximum number of characters.
///
/// # Examples
///
/// ```
/// use doorlock_controller::truncate_text;
///
/// assert_eq!(truncate_text("FINGERPRINT LOCK!", 16), "FINGERPRINT LOCK");
/// assert_eq!(truncate_text("Short", 10), "Short");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Align ASCII text within a fixed width, padding with spaces.
///
/// # Examples
///
/// ```
/// use doorlock_controller::{align_text, Alignment};
///
/// assert_eq!(align_text("HELLO", 10, Alignment::Left), "HELLO     ");
/// assert_eq!(align_text("HELLO", 10, Alignment::Center), "  HELLO   ");
/// assert_eq!(align_text("HELLO", 10, Alignment::Right), "     HELLO");
/// ```
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let char_count = text.chars().count();

    if char_count >= width {
        return truncate_text(text, width);
    }

    let padding = width - char_count;

    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        Alignment::Center => {
            let left_pad = padding / 2;
            let right_pad = padding - left_pad;
            format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
        }
    }
}

/// Remove control characters and replace non-ASCII with `?`.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}
