use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use homeworth_core::domain::session::{SessionId, SessionState};

use super::{RepositoryError, SessionRepository};

struct StoredSession {
    state: SessionState,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, StoredSession>>,
}

impl InMemorySessionRepository {
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionState>, RepositoryError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&id.0).map(|stored| stored.state.clone()))
    }

    async fn save(&self, id: &SessionId, state: &SessionState) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(id.0.clone(), StoredSession { state: state.clone(), updated_at: Utc::now() });
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(&id.0).is_some())
    }

    async fn purge_idle(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| stored.updated_at >= cutoff);
        Ok((before - sessions.len()) as u64)
    }
}
