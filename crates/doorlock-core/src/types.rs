use crate::{Result, constants::PASSWORD_LENGTH, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Single keypad digit (0-9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

impl Digit {
    /// Create a new digit with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidDigit` if the value is greater than 9.
    pub fn new(value: u8) -> Result<Self> {
        if value > 9 {
            return Err(Error::InvalidDigit(value));
        }
        Ok(Digit(value))
    }

    /// Create a digit from its ASCII character.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        c.to_digit(10).map(|d| Digit(d as u8))
    }

    /// Get the raw value.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self.0
    }

    /// Get the ASCII character for this digit.
    #[must_use]
    pub fn as_char(self) -> char {
        char::from(b'0' + self.0)
    }
}

impl TryFrom<u8> for Digit {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Digit::new(value)
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> Self {
        digit.0
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Six-digit numeric password
///
/// # Security
/// Comparison runs in constant time so that the keypad response does not
/// leak how many leading digits of a guess were correct.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Password(String);

impl Password {
    /// Create a new password with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPassword` if the value is not exactly
    /// `PASSWORD_LENGTH` ASCII digits.
    pub fn new(value: &str) -> Result<Self> {
        let len = value.chars().count();
        if len != PASSWORD_LENGTH {
            return Err(Error::invalid_password(format!(
                "must be {PASSWORD_LENGTH} digits, got {len}"
            )));
        }

        if !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::invalid_password("must contain digits only"));
        }

        Ok(Password(value.to_string()))
    }

    /// Wrap a compile-time constant without re-validating it.
    pub(crate) fn from_static(value: &'static str) -> Self {
        debug_assert!(
            value.len() == PASSWORD_LENGTH && value.bytes().all(|b| b.is_ascii_digit()),
            "Password constant must be {PASSWORD_LENGTH} digits. Got: '{value}'"
        );
        Password(value.to_string())
    }

    /// Build a password from a sequence of keypad digits.
    ///
    /// # Errors
    /// Returns `Error::InvalidPassword` if the sequence length is not
    /// `PASSWORD_LENGTH`.
    pub fn from_digits(digits: &[Digit]) -> Result<Self> {
        let value: String = digits.iter().map(|d| d.as_char()).collect();
        Password::new(&value)
    }

    /// Get the password as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Constant-time comparison implementation for Password
impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::str::FromStr for Password {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Password::new(s)
    }
}

impl TryFrom<String> for Password {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Password::new(&value)
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.0
    }
}

/// Key pressed on the lock keypad
///
/// The physical pad has digits 0-9, a `#` key that the firmware does not
/// use, an OK key, a Cancel key and the S16 key that switches to
/// fingerprint mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypadInput {
    /// Numeric digit.
    Digit(Digit),

    /// Hash key (#), not bound to any action.
    Hash,

    /// OK / confirm key.
    Confirm,

    /// Cancel key.
    Cancel,

    /// S16 key, switches password entry to fingerprint capture.
    SwitchToFingerprint,
}

impl KeypadInput {
    /// Create a digit input.
    ///
    /// # Errors
    /// Returns `Error::InvalidDigit` if the digit is greater than 9.
    pub fn digit(value: u8) -> Result<Self> {
        Ok(KeypadInput::Digit(Digit::new(value)?))
    }

    /// Map a terminal character to a key.
    ///
    /// Digits map to themselves, `o`/`k` to OK, `c`/`x` to Cancel, `f`/`s`
    /// to the S16 key and `#` to the unused hash key.
    ///
    /// # Errors
    /// Returns `Error::InvalidKey` for any other character.
    pub fn from_char(c: char) -> Result<Self> {
        if let Some(digit) = Digit::from_char(c) {
            return Ok(KeypadInput::Digit(digit));
        }
        match c.to_ascii_lowercase() {
            'o' | 'k' => Ok(KeypadInput::Confirm),
            'c' | 'x' => Ok(KeypadInput::Cancel),
            'f' | 's' => Ok(KeypadInput::SwitchToFingerprint),
            '#' => Ok(KeypadInput::Hash),
            _ => Err(Error::InvalidKey(c)),
        }
    }
}

impl fmt::Display for KeypadInput {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeypadInput::Digit(d) => write!(f, "{d}"),
            KeypadInput::Hash => write!(f, "#"),
            KeypadInput::Confirm => write!(f, "OK"),
            KeypadInput::Cancel => write!(f, "Cancel"),
            KeypadInput::SwitchToFingerprint => write!(f, "S16"),
        }
    }
}

/// Admin menu entry selected with digits 1-5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AdminOption {
    AddPassword = 1,
    ClearFingerprints = 2,
    DeletePasswords = 3,
    AddFingerprint = 4,
    ViewLogs = 5,
}

impl AdminOption {
    /// Create an admin option from its menu number.
    ///
    /// # Errors
    /// Returns `Error::InvalidMenuOption` if the value is not 1-5.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(AdminOption::AddPassword),
            2 => Ok(AdminOption::ClearFingerprints),
            3 => Ok(AdminOption::DeletePasswords),
            4 => Ok(AdminOption::AddFingerprint),
            5 => Ok(AdminOption::ViewLogs),
            _ => Err(Error::InvalidMenuOption(value)),
        }
    }

    /// Convert the option to its menu number.
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AdminOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_u8())
    }
}

/// Result reported by the fingerprint module for one capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintOutcome {
    /// Finger matched an enrolled template.
    #[default]
    Match,
    /// Finger captured but no template matched.
    NoMatch,
    /// No finger on the sensor.
    NoFinger,
    /// Capture failed inside the module.
    Error,
}

impl FingerprintOutcome {
    /// Returns `true` if the capture identified an enrolled finger.
    #[inline]
    #[must_use]
    pub fn is_match(self) -> bool {
        matches!(self, FingerprintOutcome::Match)
    }

    /// Wire name used in logs and configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FingerprintOutcome::Match => "match",
            FingerprintOutcome::NoMatch => "no_match",
            FingerprintOutcome::NoFinger => "no_finger",
            FingerprintOutcome::Error => "error",
        }
    }
}

impl fmt::Display for FingerprintOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FingerprintOutcome {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "match" => Ok(FingerprintOutcome::Match),
            "no_match" | "nomatch" => Ok(FingerprintOutcome::NoMatch),
            "no_finger" | "nofinger" => Ok(FingerprintOutcome::NoFinger),
            "error" => Ok(FingerprintOutcome::Error),
            other => Err(Error::InvalidFingerprintOutcome(other.to_string())),
        }
    }
}

/// Template slot reported by the fingerprint module (0-255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(u8);

impl TemplateId {
    #[must_use]
    pub fn new(id: u8) -> Self {
        TemplateId(id)
    }

    #[must_use]
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl From<u8> for TemplateId {
    fn from(id: u8) -> Self {
        TemplateId(id)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Simulated sensor reading injected by the operator
///
/// The controller copies it at the moment `Confirm` is processed in
/// fingerprint mode; later changes do not affect a capture already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintReading {
    pub outcome: FingerprintOutcome,
    pub template_id: TemplateId,
}

impl FingerprintReading {
    #[must_use]
    pub fn new(outcome: FingerprintOutcome, template_id: impl Into<TemplateId>) -> Self {
        Self {
            outcome,
            template_id: template_id.into(),
        }
    }
}

impl Default for FingerprintReading {
    fn default() -> Self {
        Self::new(
            FingerprintOutcome::Match,
            crate::constants::DEFAULT_TEMPLATE_ID,
        )
    }
}
