//! Session persistence port.

use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use uuid::Uuid;

use super::session::SessionSnapshot;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// Stores completed sessions.
pub trait SessionRepository: Send + Sync {
    /// Insert or replace the snapshot with the same id.
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), RepositoryError>;

    fn find(&self, id: Uuid) -> Result<Option<SessionSnapshot>, RepositoryError>;

    /// All stored sessions, oldest first.
    fn list(&self) -> Result<Vec<SessionSnapshot>, RepositoryError>;
}

/// Process-local repository.
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<Vec<SessionSnapshot>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        match sessions.iter_mut().find(|s| s.id == snapshot.id) {
            Some(existing) => *existing = snapshot.clone(),
            None => sessions.push(snapshot.clone()),
        }
        Ok(())
    }

    fn find(&self, id: Uuid) -> Result<Option<SessionSnapshot>, RepositoryError> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        Ok(sessions.iter().find(|s| s.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<SessionSnapshot>, RepositoryError> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        Ok(sessions.clone())
    }
}
