//! API route definitions
//!
//! Defines all API routes and their associated handler functions.

use axum::{routing::get, Router};
use std::sync::Arc;

use qa_core_agent_runtime::Runtime;
use qa_core_bus::SharedBus;

use crate::api::{handlers, ws::BroadcastState};
use crate::db::DatabaseConnection;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub bus: SharedBus,
    pub runtime: Arc<Runtime>,
    pub broadcast: Arc<BroadcastState>,
    pub instance_id: String,
}

/// Build the complete API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoints
        .route("/health", get(handlers::health))
        .route("/api/v1/system/health", get(handlers::health_detailed))
        .route("/api/v1/system/info", get(handlers::system_info))
        .route("/api/v1/system/metrics", get(handlers::system_metrics))
        .route("/api/status", get(handlers::status))
        // Pipeline entry points
        .route("/api/v1/parse", axum::routing::post(handlers::submit_parse))
        .route(
            "/api/v1/ui-analysis",
            axum::routing::post(handlers::submit_ui_analysis),
        )
        .route(
            "/api/v1/execute",
            axum::routing::post(handlers::submit_execution),
        )
        // Real-time updates
        .route("/ws", get(crate::api::ws::ws_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core_agent_runtime::Runtime;
    use qa_core_bus::MessageBus;
    use qa_core_utils::new_id;

    async fn test_state() -> AppState {
        let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        let bus = Arc::new(MessageBus::new());
        let runtime = Arc::new(Runtime::new(bus.clone()));
        AppState {
            db,
            bus,
            runtime,
            broadcast: Arc::new(BroadcastState::new()),
            instance_id: new_id(),
        }
    }

    #[tokio::test]
    async fn test_router_creation() {
        let state = test_state().await;
        let _router = create_router(state);
    }
}
