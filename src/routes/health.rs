use crate::error::AppResult;
use crate::routes::types::{HealthCheckResponse, HealthStatus, StoreTestResponse};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use super::AppState;

/// Liveness probe for uptime pingers
pub async fn root() -> &'static str {
    "Backend is running!"
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let start = std::time::Instant::now();
    let backend = state.repository.backend().to_string();

    let store = match tokio::time::timeout(StdDuration::from_secs(5), state.repository.ping()).await
    {
        Ok(Ok(())) => HealthStatus {
            backend,
            status: "healthy".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
        Ok(Err(e)) => {
            tracing::warn!("Store ping failed: {}", e);
            HealthStatus {
                backend,
                status: "unhealthy".to_string(),
                latency_ms: None,
            }
        }
        Err(_) => HealthStatus {
            backend,
            status: "unhealthy".to_string(),
            latency_ms: None,
        },
    };

    let overall_status = if store.status == "healthy" {
        "ok"
    } else {
        "degraded"
    };

    let response = HealthCheckResponse {
        status: overall_status.to_string(),
        store,
        timestamp: chrono::Utc::now(),
    };

    Ok(Json(response))
}

/// Document counts, proving the store can be read end to end
pub async fn store_test(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let counts = state.repository.count().await?;

    Ok(Json(StoreTestResponse {
        users: counts.users,
        recipes: counts.recipes,
        store: "working".to_string(),
    }))
}
