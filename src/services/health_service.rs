use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness, pinging the quiz store so connectivity issues surface in logs.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_quiz_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "quiz store health ping failed");
            }
        }
        Err(_) => warn!("quiz store unavailable, serving in degraded mode"),
    }

    HealthResponse::from_degraded(state.is_degraded().await)
}
