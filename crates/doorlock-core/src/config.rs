use crate::{
    Result,
    constants::{
        ADMIN_PASSWORD, FINGERPRINT_SETTLE_SECS, LOCK_TIME_SECS, LOG_CAPACITY,
        LOG_CAPACITY_LIMIT, MAX_ERRORS, MAX_USERS, MAX_USERS_LIMIT, UNLOCK_HOLD_SECS,
    },
    error::Error,
    types::Password,
};
use serde::{Deserialize, Serialize};

/// Lock controller configuration
///
/// Every field has a default taken from [`crate::constants`], so a config
/// file only needs the keys it overrides.
///
/// # Examples
///
/// ```
/// use doorlock_core::LockConfig;
///
/// let config = LockConfig::default()
///     .max_users(4)
///     .lock_time_secs(30);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_users, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Password that opens the admin menu
    pub admin_password: Password,

    /// Capacity of the credential store
    pub max_users: usize,

    /// Failures that trigger a lockout
    pub max_errors: u8,

    /// Lockout duration in seconds
    pub lock_time_secs: u32,

    /// Seconds the motor stays engaged after an unlock
    pub unlock_hold_secs: u32,

    /// Seconds a fingerprint result stays on screen
    pub fingerprint_settle_secs: u32,

    /// Number of log entries retained
    pub log_capacity: usize,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            admin_password: Password::from_static(ADMIN_PASSWORD),
            max_users: MAX_USERS,
            max_errors: MAX_ERRORS,
            lock_time_secs: LOCK_TIME_SECS,
            unlock_hold_secs: UNLOCK_HOLD_SECS,
            fingerprint_settle_secs: FINGERPRINT_SETTLE_SECS,
            log_capacity: LOG_CAPACITY,
        }
    }
}

impl LockConfig {
    /// Set the admin password
    pub fn admin_password(mut self, password: Password) -> Self {
        self.admin_password = password;
        self
    }

    /// Set the credential store capacity
    pub fn max_users(mut self, max: usize) -> Self {
        self.max_users = max;
        self
    }

    /// Set the number of failures that trigger a lockout
    pub fn max_errors(mut self, max: u8) -> Self {
        self.max_errors = max;
        self
    }

    /// Set the lockout duration
    pub fn lock_time_secs(mut self, secs: u32) -> Self {
        self.lock_time_secs = secs;
        self
    }

    /// Set the unlock hold duration
    pub fn unlock_hold_secs(mut self, secs: u32) -> Self {
        self.unlock_hold_secs = secs;
        self
    }

    /// Set the fingerprint settle delay
    pub fn fingerprint_settle_secs(mut self, secs: u32) -> Self {
        self.fingerprint_settle_secs = secs;
        self
    }

    /// Set the log capacity
    pub fn log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    /// Check that every limit is usable.
    ///
    /// # Errors
    /// Returns `Error::Config` if a capacity, threshold or timer is zero, or
    /// if a capacity is above its limit. A zero timer would fire in the same
    /// tick that armed it.
    pub fn validate(&self) -> Result<()> {
        if self.max_users == 0 {
            return Err(Error::config("max_users must be at least 1"));
        }
        if self.max_users > MAX_USERS_LIMIT {
            return Err(Error::config(format!(
                "max_users must be at most {MAX_USERS_LIMIT}"
            )));
        }
        if self.max_errors == 0 {
            return Err(Error::config("max_errors must be at least 1"));
        }
        if self.lock_time_secs == 0 {
            return Err(Error::config("lock_time_secs must be at least 1"));
        }
        if self.unlock_hold_secs == 0 {
            return Err(Error::config("unlock_hold_secs must be at least 1"));
        }
        if self.fingerprint_settle_secs == 0 {
            return Err(Error::config("fingerprint_settle_secs must be at least 1"));
        }
        if self.log_capacity == 0 {
            return Err(Error::config("log_capacity must be at least 1"));
        }
        if self.log_capacity > LOG_CAPACITY_LIMIT {
            return Err(Error::config(format!(
                "log_capacity must be at most {LOG_CAPACITY_LIMIT}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_matches_constants() {
        let config = LockConfig::default();
        assert_eq!(config.admin_password.as_str(), ADMIN_PASSWORD);
        assert_eq!(config.max_users, MAX_USERS);
        assert_eq!(config.max_errors, MAX_ERRORS);
        assert_eq!(config.lock_time_secs, LOCK_TIME_SECS);
        assert_eq!(config.unlock_hold_secs, UNLOCK_HOLD_SECS);
        assert_eq!(config.fingerprint_settle_secs, FINGERPRINT_SETTLE_SECS);
        assert_eq!(config.log_capacity, LOG_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(LockConfig::default().max_users(0))]
    #[case(LockConfig::default().max_errors(0))]
    #[case(LockConfig::default().lock_time_secs(0))]
    #[case(LockConfig::default().unlock_hold_secs(0))]
    #[case(LockConfig::default().fingerprint_settle_secs(0))]
    #[case(LockConfig::default().log_capacity(0))]
    fn test_validate_rejects_zero(#[case] config: LockConfig) {
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[rstest]
    #[case(LockConfig::default().max_users(MAX_USERS_LIMIT + 1))]
    #[case(LockConfig::default().max_users(usize::MAX))]
    #[case(LockConfig::default().log_capacity(LOG_CAPACITY_LIMIT + 1))]
    #[case(LockConfig::default().log_capacity(usize::MAX))]
    fn test_validate_rejects_oversized(#[case] config: LockConfig) {
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_accepts_limits() {
        let config = LockConfig::default()
            .max_users(MAX_USERS_LIMIT)
            .log_capacity(LOG_CAPACITY_LIMIT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_oversized_json_capacity_rejected() {
        let config: LockConfig =
            serde_json::from_str(r#"{"log_capacity": 18446744073709551615}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LockConfig =
            serde_json::from_str(r#"{"max_users": 3, "admin_password": "999999"}"#).unwrap();
        assert_eq!(config.max_users, 3);
        assert_eq!(config.admin_password.as_str(), "999999");
        assert_eq!(config.lock_time_secs, LOCK_TIME_SECS);
    }

    #[test]
    fn test_json_rejects_bad_password() {
        let result = serde_json::from_str::<LockConfig>(r#"{"admin_password": "12"}"#);
        assert!(result.is_err());
    }
}
