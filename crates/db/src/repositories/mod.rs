use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use homeworth_core::domain::session::{SessionId, SessionState};

pub mod memory;
pub mod session;

pub use memory::InMemorySessionRepository;
pub use session::SqlSessionRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Keyed storage for conversation state.
///
/// Callers serialize access per session id; implementations only need to make
/// each individual call atomic.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionState>, RepositoryError>;
    async fn save(&self, id: &SessionId, state: &SessionState) -> Result<(), RepositoryError>;
    /// Returns whether a stored session was removed.
    async fn delete(&self, id: &SessionId) -> Result<bool, RepositoryError>;
    /// Removes every session last saved before `cutoff`; returns how many went.
    async fn purge_idle(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError>;

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
