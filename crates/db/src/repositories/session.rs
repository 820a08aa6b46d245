use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use homeworth_core::domain::session::{SessionId, SessionState};
use homeworth_core::flows::ConversationPhase;

use super::{RepositoryError, SessionRepository};
use crate::DbPool;

/// SQLite-backed session store; state is kept as a JSON document per id.
pub struct SqlSessionRepository {
    pool: DbPool,
}

impl SqlSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionRepository for SqlSessionRepository {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionState>, RepositoryError> {
        let row = sqlx::query("SELECT state_json FROM dialogue_sessions WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| state_from_row(id, &row)).transpose()
    }

    async fn save(&self, id: &SessionId, state: &SessionState) -> Result<(), RepositoryError> {
        let state_json = serde_json::to_string(state).map_err(|error| {
            RepositoryError::Decode(format!("encode session '{}': {error}", id.0))
        })?;
        let now = timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO dialogue_sessions (id, state_json, phase, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                state_json = excluded.state_json,
                phase = excluded.phase,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id.0)
        .bind(state_json)
        .bind(ConversationPhase::of(state).as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM dialogue_sessions WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_idle(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM dialogue_sessions WHERE updated_at < ?")
            .bind(timestamp(cutoff))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Fixed-width UTC form so `updated_at` orders correctly as text.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn state_from_row(id: &SessionId, row: &SqliteRow) -> Result<SessionState, RepositoryError> {
    let raw: String = row.try_get("state_json")?;
    serde_json::from_str(&raw).map_err(|error| {
        RepositoryError::Decode(format!("invalid state for session '{}': {error}", id.0))
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use sqlx::Row;

    use homeworth_core::domain::session::{SessionId, SessionState};
    use homeworth_core::domain::slot::{GuestFrequency, SlotKey, SlotValue, YesNo};

    use super::SqlSessionRepository;
    use crate::repositories::{RepositoryError, SessionRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    type TestResult<T> = Result<T, String>;

    async fn setup_pool() -> TestResult<DbPool> {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .map_err(|error| format!("connect test pool: {error}"))?;
        migrations::run_pending(&pool).await.map_err(|error| format!("run migrations: {error}"))?;
        Ok(pool)
    }

    fn estimated_state() -> SessionState {
        let mut state = SessionState::new();
        state.insert(SlotKey::FamilySize, SlotValue::Count(4));
        state.insert(SlotKey::GuestFrequency, SlotValue::Guests(GuestFrequency::Rarely));
        state.insert(SlotKey::ElderlyMembers, SlotValue::Answer(YesNo::No));
        state.insert(SlotKey::Basement, SlotValue::Answer(YesNo::Yes));
        state.insert(SlotKey::BsmtFullBath, SlotValue::Count(1));
        state.insert(SlotKey::BsmtHalfBath, SlotValue::Count(0));
        state.insert(SlotKey::GrLivArea, SlotValue::Area(1500));
        state.insert(SlotKey::BedroomAbvGr, SlotValue::Count(3));
        state.insert(SlotKey::FullBath, SlotValue::Count(2));
        state.insert(SlotKey::HalfBath, SlotValue::Count(1));
        state.predicted_price = Some(Decimal::new(19_000_000, 2));
        state
    }

    #[tokio::test]
    async fn sql_session_repo_round_trip_and_upsert() -> TestResult<()> {
        let pool = setup_pool().await?;
        let repo = SqlSessionRepository::new(pool.clone());
        let id = SessionId("sess-sql-1".to_owned());

        let mut state = SessionState::new();
        state.insert(SlotKey::FamilySize, SlotValue::Count(2));
        repo.save(&id, &state).await.map_err(|error| error.to_string())?;

        let estimated = estimated_state();
        repo.save(&id, &estimated).await.map_err(|error| error.to_string())?;

        let loaded = repo.load(&id).await.map_err(|error| error.to_string())?;
        assert_eq!(loaded, Some(estimated));

        let row = sqlx::query("SELECT COUNT(*) AS count, MAX(phase) AS phase FROM dialogue_sessions")
            .fetch_one(&pool)
            .await
            .map_err(|error| error.to_string())?;
        assert_eq!(row.get::<i64, _>("count"), 1);
        assert_eq!(row.get::<String, _>("phase"), "awaiting_interest");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_session_loads_as_none_and_delete_is_reported() -> TestResult<()> {
        let pool = setup_pool().await?;
        let repo = SqlSessionRepository::new(pool);
        let id = SessionId("sess-sql-2".to_owned());

        assert_eq!(repo.load(&id).await.map_err(|error| error.to_string())?, None);

        repo.save(&id, &SessionState::new()).await.map_err(|error| error.to_string())?;
        assert!(repo.delete(&id).await.map_err(|error| error.to_string())?);
        assert!(!repo.delete(&id).await.map_err(|error| error.to_string())?);
        repo.ping().await.map_err(|error| error.to_string())
    }

    #[tokio::test]
    async fn purge_idle_removes_sessions_untouched_since_the_cutoff() -> TestResult<()> {
        let pool = setup_pool().await?;
        sqlx::query(
            "INSERT INTO dialogue_sessions (id, state_json, phase, created_at, updated_at)
             VALUES ('sess-stale', '{}', 'greeting', '2026-01-01T00:00:00.000000Z', '2026-01-01T00:00:00.000000Z')",
        )
        .execute(&pool)
        .await
        .map_err(|error| error.to_string())?;

        let repo = SqlSessionRepository::new(pool);
        let fresh = SessionId("sess-fresh".to_owned());
        repo.save(&fresh, &SessionState::new()).await.map_err(|error| error.to_string())?;

        let cutoff = Utc::now() - Duration::minutes(30);
        let purged = repo.purge_idle(cutoff).await.map_err(|error| error.to_string())?;

        assert_eq!(purged, 1);
        assert_eq!(
            repo.load(&SessionId("sess-stale".to_owned())).await.map_err(|error| error.to_string())?,
            None
        );
        assert!(repo.load(&fresh).await.map_err(|error| error.to_string())?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_state_surfaces_decode_error() -> TestResult<()> {
        let pool = setup_pool().await?;
        sqlx::query(
            "INSERT INTO dialogue_sessions (id, state_json, phase, created_at, updated_at)
             VALUES ('sess-bad', '{not json', 'greeting', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .map_err(|error| error.to_string())?;

        let repo = SqlSessionRepository::new(pool);
        let result = repo.load(&SessionId("sess-bad".to_owned())).await;

        assert!(matches!(result, Err(RepositoryError::Decode(ref message)) if message.contains("sess-bad")));
        Ok(())
    }
}
