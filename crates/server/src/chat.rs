use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use homeworth_core::audit::{AuditContext, AuditEvent, AuditSink};
use homeworth_core::domain::session::SessionId;
use homeworth_core::errors::{ApplicationError, InterfaceError};
use homeworth_db::SessionRepository;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{error, info};

use crate::bootstrap::SharedEngine;

#[derive(Clone)]
pub struct ChatState {
    pub engine: SharedEngine,
    pub sessions: Arc<dyn SessionRepository>,
    pub locks: Arc<SessionLocks>,
}

impl ChatState {
    pub fn new(engine: SharedEngine, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { engine, sessions, locks: Arc::new(SessionLocks::default()) }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub response: String,
    pub phase: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub correlation_id: String,
    pub session_id: String,
}

#[derive(Debug)]
pub struct ApiError {
    interface: InterfaceError,
    session_id: SessionId,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.interface {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.interface.user_message(),
            correlation_id: self.interface.correlation_id().to_string(),
            session_id: self.session_id.0,
        };
        (status, Json(body)).into_response()
    }
}

/// One async mutex per live session id.
///
/// Entries are dropped once no request holds or waits on them.
#[derive(Default)]
pub struct SessionLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub async fn acquire(&self, id: &SessionId) -> SessionGuard<'_> {
        let lock = {
            let mut locks = match self.inner.lock() {
                Ok(locks) => locks,
                Err(poisoned) => poisoned.into_inner(),
            };
            locks.entry(id.0.clone()).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        SessionGuard { locks: self, key: id.0.clone(), guard: Some(guard) }
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(locks) => locks.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, key: &str) {
        let mut locks = match self.inner.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        };
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }
}

pub struct SessionGuard<'a> {
    locks: &'a SessionLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.key);
    }
}

/// Forwards dialogue audit events to the structured log.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        info!(
            event_name = %event.event_type,
            correlation_id = %event.correlation_id,
            session_id = event.session_id.as_ref().map(|id| id.0.as_str()).unwrap_or("unknown"),
            category = ?event.category,
            outcome = ?event.outcome,
            metadata = ?event.metadata,
            "dialogue audit event"
        );
    }
}

pub fn router(state: ChatState) -> Router {
    Router::new().route("/chatbot", post(chatbot)).with_state(state)
}

pub async fn chatbot(
    State(state): State<ChatState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .map(SessionId)
        .unwrap_or_else(SessionId::generate);

    if request.message.trim().is_empty() {
        let interface = InterfaceError::bad_request("message must not be empty", &correlation_id);
        info!(
            event_name = "dialogue.http.turn_rejected",
            correlation_id = %correlation_id,
            session_id = %session_id,
            "chat turn rejected"
        );
        return Err(ApiError { interface, session_id });
    }

    let _guard = state.locks.acquire(&session_id).await;

    let fail = |error: ApplicationError| {
        let interface = error.into_interface(correlation_id.clone());
        error!(
            event_name = "dialogue.http.turn_failed",
            correlation_id = %correlation_id,
            session_id = %session_id,
            error = %interface,
            "chat turn failed"
        );
        ApiError { interface, session_id: session_id.clone() }
    };

    let state_before = state
        .sessions
        .load(&session_id)
        .await
        .map_err(|error| fail(ApplicationError::Persistence(error.to_string())))?
        .unwrap_or_default();

    let audit = AuditContext::new(Some(session_id.clone()), correlation_id.clone(), "http");
    let turn = state
        .engine
        .handle_with_audit(&state_before, &request.message, &TracingAuditSink, &audit)
        .map_err(|error| fail(ApplicationError::from(error)))?;

    state
        .sessions
        .save(&session_id, &turn.state)
        .await
        .map_err(|error| fail(ApplicationError::Persistence(error.to_string())))?;

    let phase = turn.phase().as_str();
    info!(
        event_name = "dialogue.http.turn_completed",
        correlation_id = %correlation_id,
        session_id = %session_id,
        phase,
        "chat turn completed"
    );

    Ok(Json(ChatResponse { session_id: session_id.0.clone(), response: turn.reply, phase }))
}
