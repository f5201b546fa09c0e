//! Health reporting backing the `/healthcheck` route.

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the backend currently has a storage connection.
pub async fn healthcheck(state: &SharedState) -> HealthResponse {
    if state.is_degraded().await {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
