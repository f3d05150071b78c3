//! In-memory credential store.
//!
//! The lock keeps up to `max_users` six-digit passwords. Records are only
//! ever appended; the admin menu can wipe the whole list, and the operator
//! can replace it with a seed list. Ids are assigned as `len + 1` at
//! insertion, so they restart from 1 after a clear.

use serde::{Deserialize, Serialize};

use doorlock_core::{Error, Password, Result};

/// One enrolled user password
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Sequential id (1-based)
    pub id: u32,

    /// Enrolled password
    pub password: Password,
}

/// Bounded, append-only list of credentials
///
/// # Examples
///
/// ```
/// use doorlock_controller::CredentialStore;
/// use doorlock_core::Password;
///
/// let mut store = CredentialStore::new(2);
/// let pw = Password::new("111111").unwrap();
///
/// let id = store.enroll(pw.clone()).unwrap();
/// assert_eq!(id, 1);
/// assert_eq!(store.find(&pw).map(|c| c.id), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct CredentialStore {
    users: Vec<Credential>,
    capacity: usize,
}

impl CredentialStore {
    /// Create an empty store holding at most `capacity` users.
    pub fn new(capacity: usize) -> Self {
        Self {
            users: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.users.len() >= self.capacity
    }

    /// Append a credential and return its id.
    ///
    /// # Errors
    /// Returns `Error::StoreFull` when the store already holds `capacity`
    /// users; the store is left unchanged.
    pub fn enroll(&mut self, password: Password) -> Result<u32> {
        if self.is_full() {
            return Err(Error::StoreFull {
                capacity: self.capacity,
            });
        }

        let id = self.users.len() as u32 + 1;
        self.users.push(Credential { id, password });
        Ok(id)
    }

    /// Find the first credential with this password.
    pub fn find(&self, password: &Password) -> Option<&Credential> {
        self.users.iter().find(|c| &c.password == password)
    }

    /// Remove every credential.
    pub fn clear(&mut self) {
        self.users.clear();
    }

    /// Replace the contents with `passwords`, ids 1..n.
    ///
    /// Passwords beyond the capacity are dropped. Returns how many were
    /// stored.
    pub fn seed<I>(&mut self, passwords: I) -> usize
    where
        I: IntoIterator<Item = Password>,
    {
        self.users.clear();
        for password in passwords.into_iter().take(self.capacity) {
            let id = self.users.len() as u32 + 1;
            self.users.push(Credential { id, password });
        }
        self.users.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.users.iter()
    }
}
