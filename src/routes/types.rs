use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub store: HealthStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Individual health status
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub backend: String,
    pub status: String,
    pub latency_ms: Option<u64>,
}

/// Document counts returned by `/api/test`
#[derive(Debug, Serialize)]
pub struct StoreTestResponse {
    pub users: i64,
    pub recipes: i64,
    pub store: String,
}
