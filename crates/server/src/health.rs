use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use homeworth_db::SessionRepository;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    pub sessions: Arc<dyn SessionRepository>,
    pub model_version: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub model: HealthCheck,
    pub session_store: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let session_store = match state.sessions.ping().await {
        Ok(()) => HealthCheck { status: "ready", detail: "session store reachable".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("session store failed: {error}") }
        }
    };
    let ready = session_store.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "homeworth-server runtime initialized".to_string(),
        },
        model: HealthCheck {
            status: "ready",
            detail: format!("price model `{}` loaded", state.model_version),
        },
        session_store,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use homeworth_db::{connect_with_settings, InMemorySessionRepository, SqlSessionRepository};

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_returns_ready_for_in_memory_store() {
        let state = HealthState {
            sessions: Arc::new(InMemorySessionRepository::default()),
            model_version: "baseline-1".to_string(),
        };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.session_store.status, "ready");
        assert!(payload.model.detail.contains("baseline-1"));
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_database_is_unavailable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        pool.close().await;

        let state = HealthState {
            sessions: Arc::new(SqlSessionRepository::new(pool)),
            model_version: "baseline-1".to_string(),
        };
        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.session_store.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
