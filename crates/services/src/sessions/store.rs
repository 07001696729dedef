use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use quiz_core::model::UserId;
use storage::repository::StorageError;

use super::session::QuizSession;

/// Keyed storage for in-progress sessions, one per user.
///
/// Only the owning user's requests touch their entry, so implementations need
/// no ordering beyond per-key consistency.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store the user's session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn put(&self, session: QuizSession) -> Result<(), StorageError>;

    /// Fetch a copy of the user's session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get(&self, user_id: UserId) -> Result<Option<QuizSession>, StorageError>;

    /// Remove the user's session, returning it if there was one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn remove(&self, user_id: UserId) -> Result<Option<QuizSession>, StorageError>;

    /// Remove every session whose last activity is before `cutoff`.
    ///
    /// Exhausted sessions are kept: their result has not been recorded yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn remove_inactive_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<UserId>, StorageError>;
}

/// Process-local session store.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<UserId, QuizSession>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently held.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<UserId, QuizSession>>, StorageError> {
        self.sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, session: QuizSession) -> Result<(), StorageError> {
        self.lock()?.insert(session.user_id(), session);
        Ok(())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<QuizSession>, StorageError> {
        Ok(self.lock()?.get(&user_id).cloned())
    }

    async fn remove(&self, user_id: UserId) -> Result<Option<QuizSession>, StorageError> {
        Ok(self.lock()?.remove(&user_id))
    }

    async fn remove_inactive_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<UserId>, StorageError> {
        let mut guard = self.lock()?;
        let expired: Vec<UserId> = guard
            .values()
            .filter(|s| s.last_activity() < cutoff && !s.is_exhausted())
            .map(QuizSession::user_id)
            .collect();
        for user_id in &expired {
            guard.remove(user_id);
        }
        Ok(expired)
    }
}
