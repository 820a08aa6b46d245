use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use homeworth_db::{RepositoryError, SessionRepository};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Removes sessions idle for longer than `idle_ttl`.
pub async fn sweep_once(
    sessions: &dyn SessionRepository,
    idle_ttl: Duration,
) -> Result<u64, RepositoryError> {
    let cutoff = chrono::Duration::from_std(idle_ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    sessions.purge_idle(cutoff).await
}

/// A quarter of the ttl, clamped to 1..=300 seconds.
pub fn sweep_period(idle_ttl: Duration) -> Duration {
    Duration::from_secs((idle_ttl.as_secs() / 4).clamp(1, 300))
}

pub fn spawn(sessions: Arc<dyn SessionRepository>, idle_ttl: Duration) -> JoinHandle<()> {
    let period = sweep_period(idle_ttl);
    info!(
        event_name = "system.sessions.sweeper_started",
        correlation_id = "bootstrap",
        idle_ttl_secs = idle_ttl.as_secs(),
        period_secs = period.as_secs(),
        "idle session sweeper started"
    );

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match sweep_once(sessions.as_ref(), idle_ttl).await {
                Ok(0) => debug!(event_name = "system.sessions.swept", purged = 0u64),
                Ok(purged) => info!(
                    event_name = "system.sessions.swept",
                    correlation_id = "sweeper",
                    purged,
                    "purged idle sessions"
                ),
                Err(error) => warn!(
                    event_name = "system.sessions.sweep_failed",
                    correlation_id = "sweeper",
                    error = %error,
                    "idle session sweep failed"
                ),
            }
        }
    })
}
