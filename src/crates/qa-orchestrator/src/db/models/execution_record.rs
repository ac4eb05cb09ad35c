//! Execution record row for database persistence.
//!
//! Mirrors `qa_core_utils::ExecutionRecord`, with the complex fields
//! (`config`, `environment`, `logs`, `artifacts`) stored as JSON-string
//! TEXT columns, following the teacher's own timestamp-as-ISO8601-TEXT
//! convention for SQLite.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use qa_core_utils::{ExecutionRecord, ExecutionStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExecutionRecordRow {
    pub execution_id: String,
    pub script_id: String,
    pub status: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_ms: Option<i64>,
    pub return_code: Option<i32>,
    pub config: String,
    pub environment: String,
    pub logs: String,
    pub artifacts: String,
    pub report_path: Option<String>,
    pub error: Option<String>,
}

impl ExecutionRecordRow {
    pub fn from_record(record: &ExecutionRecord) -> Self {
        Self {
            execution_id: record.execution_id.clone(),
            script_id: record.script_id.clone(),
            status: record.status.to_string(),
            start_time: record.start_time.to_rfc3339(),
            end_time: record.end_time.map(|t| t.to_rfc3339()),
            duration_ms: record.duration_ms,
            return_code: record.return_code,
            config: record.config.to_string(),
            environment: serde_json::to_string(&record.environment).unwrap_or_default(),
            logs: serde_json::to_string(&record.logs).unwrap_or_default(),
            artifacts: serde_json::to_string(&record.artifacts).unwrap_or_default(),
            report_path: record.report_path.as_ref().map(|p| p.display().to_string()),
            error: record.error.clone(),
        }
    }

    pub fn status_enum(&self) -> ExecutionStatus {
        match self.status.as_str() {
            "pending" => ExecutionStatus::Pending,
            "running" => ExecutionStatus::Running,
            "completed" => ExecutionStatus::Completed,
            "failed" => ExecutionStatus::Failed,
            _ => ExecutionStatus::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_round_trips_status() {
        let mut record = ExecutionRecord::new("script-1", serde_json::json!({}));
        record.mark_running().unwrap();
        record
            .transition(ExecutionStatus::Failed, Some(1), None, Some("boom".into()))
            .unwrap();

        let row = ExecutionRecordRow::from_record(&record);
        assert_eq!(row.status, "failed");
        assert!(matches!(row.status_enum(), ExecutionStatus::Failed));
        assert_eq!(row.error.as_deref(), Some("boom"));
    }
}
