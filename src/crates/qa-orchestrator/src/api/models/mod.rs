//! API data transfer objects (DTOs) and response models
//!
//! Provides request/response structures for API endpoints with validation.

use qa_core_utils::{DocumentFormat, ExecutionConfig, ParseOutput, ScriptArtifact};
use serde::{Deserialize, Serialize};

/// Request body for `POST /api/v1/parse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitParseRequest {
    /// Raw document bytes, base64-agnostic — callers post UTF-8 text or a
    /// JSON-escaped byte array depending on `format`.
    pub document: Vec<u8>,
    pub format: DocumentFormat,
    pub session_id: Option<String>,
}

/// Request body for `POST /api/v1/ui-analysis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitUiAnalysisRequest {
    pub payload: ParseOutput,
    pub session_id: Option<String>,
}

/// Request body for `POST /api/v1/execute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitExecutionRequest {
    pub scripts: Vec<ScriptArtifact>,
    #[serde(default)]
    pub config: ExecutionConfig,
    pub session_id: Option<String>,
}

/// Response returned by every `submit_*` endpoint: the bus accepted the
/// message and the caller can now track progress by `session_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub session_id: String,
}

/// System health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(status: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            database: database.into(),
            version: crate::version::VERSION.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// System info response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfoResponse {
    pub version: String,
    pub rust_version: String,
}

/// System metrics response, aggregated from the execution/session tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetricsResponse {
    pub total_sessions: i64,
    pub active_sessions: i64,
    pub total_executions: i64,
    pub registered_agents: usize,
}

/// Server status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub name: String,
    pub uuid: String,
    pub version: String,
    pub status: String,
    pub connected_clients: u32,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response() {
        let health = HealthResponse::new("ok", "connected");
        assert_eq!(health.status, "ok");
        assert_eq!(health.database, "connected");
        assert!(!health.version.is_empty());
        assert!(!health.timestamp.is_empty());
    }

    #[test]
    fn test_system_metrics_response() {
        let metrics = SystemMetricsResponse {
            total_sessions: 100,
            active_sessions: 10,
            total_executions: 500,
            registered_agents: 9,
        };
        assert_eq!(metrics.total_sessions, 100);
        assert_eq!(metrics.registered_agents, 9);
    }
}
