//! System information and metrics endpoint handlers

use axum::extract::State;

use crate::api::models::{StatusResponse, SystemInfoResponse, SystemMetricsResponse};
use crate::api::response;
use crate::api::routes::AppState;

/// GET /api/v1/system/info
pub async fn system_info() -> impl axum::response::IntoResponse {
    let info = SystemInfoResponse {
        version: crate::version::VERSION.to_string(),
        rust_version: env!("CARGO_PKG_RUST_VERSION").to_string(),
    };
    response::ok(info)
}

/// GET /api/v1/system/metrics
pub async fn system_metrics(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let pool = state.db.pool();

    let total_sessions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pipeline_sessions")
        .fetch_one(pool)
        .await
        .unwrap_or(0);
    let active_sessions: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pipeline_sessions WHERE status = 'processing'")
            .fetch_one(pool)
            .await
            .unwrap_or(0);
    let total_executions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM execution_records")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    let metrics = SystemMetricsResponse {
        total_sessions,
        active_sessions,
        total_executions,
        registered_agents: state.runtime.health().len(),
    };

    response::ok(metrics)
}

/// GET /api/status
pub async fn status(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let db_status = match state.db.health_check().await {
        Ok(_) => "connected".to_string(),
        Err(_) => "disconnected".to_string(),
    };

    let status = StatusResponse {
        name: "qa-orchestrator".to_string(),
        uuid: state.instance_id.clone(),
        version: crate::version::VERSION.to_string(),
        status: "running".to_string(),
        connected_clients: state.broadcast.tx.receiver_count() as u32,
        database: db_status,
    };

    response::ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_info_response() {
        let info = SystemInfoResponse {
            version: "1.0.0".to_string(),
            rust_version: "1.75".to_string(),
        };
        assert_eq!(info.version, "1.0.0");
    }
}
