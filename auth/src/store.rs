//! Storage abstractions for accounts and two-factor challenges.
//!
//! The auth core talks to its state only through [`UserStore`] and
//! [`ChallengeStore`]. The in-memory implementations keep everything for the
//! lifetime of the process and are what the API binary and the tests use.
//!
//! Both stores are safe to share between threads:
//!
//! - [`UserStore::insert`] checks email uniqueness and inserts under one
//!   write lock, so two concurrent signups for the same address cannot both
//!   succeed
//! - [`ChallengeStore::remove`] is an atomic take, so at most one caller can
//!   consume a given challenge

use std::collections::HashMap;
use std::sync::RwLock;

use time::OffsetDateTime;
use tracing::debug;

use crate::errors::StoreError;
use crate::types::{TwoFactorChallenge, User, normalize_email};

/// Account storage.
pub trait UserStore: Send + Sync {
    /// Inserts a new account.
    ///
    /// Fails with [`StoreError::ConstraintViolation`] without modifying the
    /// store when an account with the same email (case-insensitive) exists.
    fn insert(&self, user: User) -> Result<(), StoreError>;

    /// Finds an account by email, case-insensitively.
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Finds an account by identifier.
    fn find_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Number of stored accounts.
    fn len(&self) -> Result<usize, StoreError>;
}

/// Two-factor challenge storage keyed by challenge identifier.
pub trait ChallengeStore: Send + Sync {
    fn insert(&self, challenge: TwoFactorChallenge) -> Result<(), StoreError>;

    fn get(&self, challenge_id: &str) -> Result<Option<TwoFactorChallenge>, StoreError>;

    /// Removes and returns a challenge. Returns `None` if it was already gone.
    fn remove(&self, challenge_id: &str) -> Result<Option<TwoFactorChallenge>, StoreError>;

    /// Drops every challenge expired at `now`, returning how many were removed.
    fn purge_expired(&self, now: OffsetDateTime) -> Result<usize, StoreError>;

    /// Number of stored challenges, live or not yet purged.
    fn len(&self) -> Result<usize, StoreError>;
}

#[derive(Debug, Default)]
struct UserIndex {
    by_id: HashMap<String, User>,
    // normalized email -> user id
    by_email: HashMap<String, String>,
}

/// Process-memory account store.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<UserIndex>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn insert(&self, user: User) -> Result<(), StoreError> {
        let mut index = self
            .inner
            .write()
            .map_err(|_| StoreError::LockPoisoned("users"))?;

        let email_key = user.email_key();
        if index.by_email.contains_key(&email_key) {
            return Err(StoreError::ConstraintViolation(
                "email already registered".to_string(),
            ));
        }

        debug!(user_id = %user.id, "Inserting user");
        index.by_email.insert(email_key, user.id.clone());
        index.by_id.insert(user.id.clone(), user);
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let index = self
            .inner
            .read()
            .map_err(|_| StoreError::LockPoisoned("users"))?;

        Ok(index
            .by_email
            .get(&normalize_email(email))
            .and_then(|id| index.by_id.get(id))
            .cloned())
    }

    fn find_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let index = self
            .inner
            .read()
            .map_err(|_| StoreError::LockPoisoned("users"))?;

        Ok(index.by_id.get(user_id).cloned())
    }

    fn len(&self) -> Result<usize, StoreError> {
        let index = self
            .inner
            .read()
            .map_err(|_| StoreError::LockPoisoned("users"))?;

        Ok(index.by_id.len())
    }
}

/// Process-memory challenge store.
#[derive(Debug, Default)]
pub struct InMemoryChallengeStore {
    challenges: RwLock<HashMap<String, TwoFactorChallenge>>,
}

impl InMemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChallengeStore for InMemoryChallengeStore {
    fn insert(&self, challenge: TwoFactorChallenge) -> Result<(), StoreError> {
        let mut challenges = self
            .challenges
            .write()
            .map_err(|_| StoreError::LockPoisoned("challenges"))?;

        challenges.insert(challenge.challenge_id.clone(), challenge);
        Ok(())
    }

    fn get(&self, challenge_id: &str) -> Result<Option<TwoFactorChallenge>, StoreError> {
        let challenges = self
            .challenges
            .read()
            .map_err(|_| StoreError::LockPoisoned("challenges"))?;

        Ok(challenges.get(challenge_id).cloned())
    }

    fn remove(&self, challenge_id: &str) -> Result<Option<TwoFactorChallenge>, StoreError> {
        let mut challenges = self
            .challenges
            .write()
            .map_err(|_| StoreError::LockPoisoned("challenges"))?;

        Ok(challenges.remove(challenge_id))
    }

    fn purge_expired(&self, now: OffsetDateTime) -> Result<usize, StoreError> {
        let mut challenges = self
            .challenges
            .write()
            .map_err(|_| StoreError::LockPoisoned("challenges"))?;

        let before = challenges.len();
        challenges.retain(|_, challenge| !challenge.is_expired_at(now));
        Ok(before - challenges.len())
    }

    fn len(&self) -> Result<usize, StoreError> {
        let challenges = self
            .challenges
            .read()
            .map_err(|_| StoreError::LockPoisoned("challenges"))?;

        Ok(challenges.len())
    }
}
